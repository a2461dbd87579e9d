//! Unbuffered relay of upstream bodies to the client.
//!
//! The upstream byte stream is moved into the response body. When the client
//! goes away, hyper drops the body, which drops the upstream stream and closes
//! the upstream connection; a slow client throttles the upstream read through
//! ordinary backpressure.

use axum::body::Body;
use futures::StreamExt;

/// Tracks one relay and logs how it ended.
struct RelayGuard {
    host: String,
    relayed: u64,
    finished: bool,
}

impl Drop for RelayGuard {
    fn drop(&mut self) {
        if self.finished {
            tracing::debug!(host = %self.host, bytes = self.relayed, "Relay complete");
        } else {
            tracing::info!(
                host = %self.host,
                bytes = self.relayed,
                "Relay stopped before upstream body ended"
            );
        }
    }
}

/// Stream an upstream response body through without buffering it.
pub fn relay_body(response: reqwest::Response) -> Body {
    let guard = RelayGuard {
        host: response.url().host_str().unwrap_or("-").to_string(),
        relayed: 0,
        finished: false,
    };

    let stream = async_stream::stream! {
        let mut guard = guard;
        let mut chunks = response.bytes_stream();

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => {
                    guard.relayed += bytes.len() as u64;
                    yield Ok(bytes);
                }
                Err(e) => {
                    let e = e.without_url();
                    tracing::warn!(host = %guard.host, "Upstream body failed: {}", e);
                    yield Err(e);
                    return;
                }
            }
        }

        guard.finished = true;
    };

    Body::from_stream(stream)
}
