use axum::http::{HeaderMap, HeaderValue, header};
use url::Url;

use crate::{Error, Result, config::UpstreamConfig};

/// ICY metadata request flag expected by the restricted upstream.
pub const ICY_METADATA: &str = "icy-metadata";

/// Everything derived from one client request before it goes upstream.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub url: Url,
    pub host: String,
    pub restricted: bool,
    pub range: Option<HeaderValue>,
    pub headers: HeaderMap,
}

impl UpstreamRequest {
    /// Build the outbound request for a verified upstream URL.
    ///
    /// Credentials only ever come from `config`; the only client header that
    /// crosses over is `Range`, verbatim.
    pub fn new(url: &str, range: Option<&HeaderValue>, config: &UpstreamConfig) -> Result<Self> {
        let url = Url::parse(url)?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidUrl(format!("{url}: missing host")))?
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

        let restricted = match &config.restricted {
            Some(restricted) if restricted.pattern.matches(&host) => {
                headers.insert(
                    header::AUTHORIZATION,
                    header_value(&format!("Basic {}", restricted.access_token))?,
                );
                headers.insert(header::USER_AGENT, header_value(&restricted.user_agent)?);
                headers.insert(ICY_METADATA, HeaderValue::from_static("1"));
                true
            }
            _ => false,
        };

        if let Some(range) = range {
            headers.insert(header::RANGE, range.clone());
        }

        Ok(Self {
            url,
            host,
            restricted,
            range: range.cloned(),
            headers,
        })
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|e| Error::Internal(format!("invalid configured header value: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::RestrictedUpstream,
        proxy::{HostMatch, HostPattern},
    };

    fn restricted_config() -> UpstreamConfig {
        UpstreamConfig {
            restricted: Some(RestrictedUpstream {
                pattern: HostPattern::new("media.example", HostMatch::Suffix),
                access_token: "dXNlcjpwYXNz".to_string(),
                user_agent: "Player/1.0".to_string(),
            }),
            ..UpstreamConfig::default()
        }
    }

    #[test]
    fn test_always_requests_identity_and_ranges() {
        let request =
            UpstreamRequest::new("https://cdn.example/a.ts", None, &UpstreamConfig::default())
                .unwrap();

        assert_eq!(request.headers[header::ACCEPT_ENCODING], "identity");
        assert_eq!(request.headers[header::ACCEPT_RANGES], "bytes");
        assert!(request.headers.get(header::RANGE).is_none());
    }

    #[test]
    fn test_forwards_range_verbatim() {
        let range = HeaderValue::from_static("bytes=1000-1999");
        let request =
            UpstreamRequest::new("https://cdn.example/a.mp4", Some(&range), &UpstreamConfig::default())
                .unwrap();

        assert_eq!(request.headers[header::RANGE], "bytes=1000-1999");
        assert_eq!(request.range, Some(range));
    }

    #[test]
    fn test_injects_credentials_for_restricted_host() {
        let request =
            UpstreamRequest::new("https://edge.media.example/v.mp4", None, &restricted_config())
                .unwrap();

        assert!(request.restricted);
        assert_eq!(request.host, "edge.media.example");
        assert_eq!(request.headers[header::AUTHORIZATION], "Basic dXNlcjpwYXNz");
        assert_eq!(request.headers[header::USER_AGENT], "Player/1.0");
        assert_eq!(request.headers[ICY_METADATA], "1");
    }

    #[test]
    fn test_never_injects_credentials_for_other_hosts() {
        for url in [
            "https://cdn.example/v.mp4",
            "https://media.example.attacker.net/v.mp4",
        ] {
            let request = UpstreamRequest::new(url, None, &restricted_config()).unwrap();

            assert!(!request.restricted);
            assert!(request.headers.get(header::AUTHORIZATION).is_none());
            assert!(request.headers.get(header::USER_AGENT).is_none());
            assert!(request.headers.get(ICY_METADATA).is_none());
        }
    }

    #[test]
    fn test_rejects_url_without_host() {
        assert!(UpstreamRequest::new("data:,hello", None, &UpstreamConfig::default()).is_err());
    }
}
