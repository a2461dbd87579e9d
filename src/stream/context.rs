use chrono::{DateTime, Utc};
use std::time::Duration;
use url::Url;

use crate::{Error, Result, token::TokenCodec};

/// Path prefix under which tokens are served.
pub const STREAM_PATH_PREFIX: &str = "/stream/";

/// Proxy-relative path for a token.
pub fn stream_path(token: &str) -> String {
    format!("{STREAM_PATH_PREFIX}{token}")
}

/// Context for transforming a playlist.
#[derive(Debug, Clone)]
pub struct TransformContext {
    /// Directory of the playlist's own URL; relative references resolve here.
    pub base_url: Url,

    /// Lifetime of every token minted for this playlist.
    pub token_ttl: Duration,

    /// Issue instant shared by every token minted for this playlist.
    pub issued_at: DateTime<Utc>,

    codec: TokenCodec,
}

impl TransformContext {
    pub fn new(playlist_url: &Url, codec: TokenCodec, token_ttl: Duration) -> Result<Self> {
        Ok(Self {
            base_url: playlist_url.join(".")?,
            token_ttl,
            issued_at: Utc::now(),
            codec,
        })
    }

    /// Pin the issue instant (for deterministic output).
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.issued_at = now;
        self
    }

    /// Resolve a reference against the playlist directory.
    ///
    /// Returns `None` for text that does not resolve to an HTTP(S) URL, such
    /// as `data:` or `skd:` key URIs; those lines are left alone.
    pub fn resolve_url(&self, reference: &str) -> Option<Url> {
        let resolved = self.base_url.join(reference).ok()?;
        matches!(resolved.scheme(), "http" | "https").then_some(resolved)
    }

    /// Mint a token for `target` and return its `/stream/{token}` path.
    pub fn build_stream_path(&self, target: &Url) -> Result<String> {
        let token = self
            .codec
            .issue_at(target.as_str(), self.token_ttl, self.issued_at)
            .map_err(|e| Error::RewriteFailure(e.to_string()))?;
        Ok(stream_path(&token))
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> TransformContext {
        TransformContext::new(
            &Url::parse("https://origin.example/show/playlist.m3u8?sig=abc").unwrap(),
            TokenCodec::test_codec(),
            Duration::from_secs(60),
        )
        .unwrap()
    }

    #[test]
    fn test_base_url_drops_last_segment() {
        assert_eq!(context().base_url.as_str(), "https://origin.example/show/");
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let ctx = context();

        assert_eq!(
            ctx.resolve_url("segment1.ts").unwrap().as_str(),
            "https://origin.example/show/segment1.ts"
        );
        assert_eq!(
            ctx.resolve_url("../keys/k.bin").unwrap().as_str(),
            "https://origin.example/keys/k.bin"
        );
        assert_eq!(
            ctx.resolve_url("/root.ts").unwrap().as_str(),
            "https://origin.example/root.ts"
        );
        assert_eq!(
            ctx.resolve_url("https://other.example/x.ts").unwrap().as_str(),
            "https://other.example/x.ts"
        );
    }

    #[test]
    fn test_resolve_skips_non_http_schemes() {
        let ctx = context();

        assert!(ctx.resolve_url("skd://key-id").is_none());
        assert!(ctx.resolve_url("data:text/plain;base64,AAAA").is_none());
    }

    #[test]
    fn test_build_stream_path_round_trips() {
        let ctx = context();
        let target = Url::parse("https://origin.example/show/segment1.ts").unwrap();

        let path = ctx.build_stream_path(&target).unwrap();
        let token = path.strip_prefix(STREAM_PATH_PREFIX).unwrap();

        assert_eq!(ctx.codec().verify(token).unwrap(), target.as_str());
    }
}
