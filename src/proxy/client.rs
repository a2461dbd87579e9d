use bytes::BytesMut;
use futures::StreamExt;
use reqwest::Client;

use super::headers::UpstreamRequest;
use crate::{Error, Result, config::UpstreamConfig};

/// HTTP client for proxying requests to upstream servers.
#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    config: UpstreamConfig,
}

impl ProxyClient {
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        // No overall timeout: media bodies may stream for as long as the
        // client keeps reading.
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()
            .map_err(|e| Error::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: UpstreamConfig) -> Self {
        Self { client, config }
    }

    /// Shape the outbound request for `url`.
    pub fn prepare(
        &self,
        url: &str,
        range: Option<&axum::http::HeaderValue>,
    ) -> Result<UpstreamRequest> {
        UpstreamRequest::new(url, range, &self.config)
    }

    /// Send the request and hand back the response with its body unread.
    ///
    /// Anything other than a success status is returned as
    /// [`Error::UpstreamStatus`] so the body is never parsed.
    pub async fn send(&self, request: &UpstreamRequest) -> Result<reqwest::Response> {
        tracing::debug!(
            host = %request.host,
            restricted = request.restricted,
            range = ?request.range,
            "Fetching upstream"
        );

        let response = self
            .client
            .get(request.url.clone())
            .headers(request.headers.clone())
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() && status.as_u16() != 206 {
            return Err(Error::UpstreamStatus {
                host: request.host.clone(),
                status,
            });
        }

        Ok(response)
    }

    /// Buffer a text body, refusing anything beyond `limit` bytes.
    pub async fn read_text(response: reqwest::Response, limit: usize) -> Result<String> {
        let host = response.url().host_str().unwrap_or("-").to_string();

        if let Some(length) = response.content_length()
            && length > limit as u64
        {
            return Err(Error::RewriteFailure(format!(
                "{host}: playlist of {length} bytes exceeds {limit}"
            )));
        }

        let mut body = BytesMut::new();
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            if body.len() + chunk.len() > limit {
                return Err(Error::RewriteFailure(format!(
                    "{host}: playlist exceeds {limit} bytes"
                )));
            }
            body.extend_from_slice(&chunk);
        }

        String::from_utf8(body.to_vec())
            .map_err(|e| Error::RewriteFailure(format!("{host}: invalid UTF-8: {e}")))
    }
}
