//! Process configuration, read once from the environment at startup.

use anyhow::{Context, bail};
use axum::http::HeaderValue;
use std::time::Duration;

use crate::proxy::{HostMatch, HostPattern};

/// Default TTL for tokens minted while rewriting playlists.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Default cap on a buffered playlist body.
pub const DEFAULT_MAX_MANIFEST_BYTES: usize = 8 * 1024 * 1024;

/// Credentials injected into requests for the restricted upstream.
#[derive(Clone)]
pub struct RestrictedUpstream {
    pub pattern: HostPattern,
    /// Pre-encoded Basic credential.
    pub access_token: String,
    pub user_agent: String,
}

impl std::fmt::Debug for RestrictedUpstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestrictedUpstream")
            .field("pattern", &self.pattern)
            .field("access_token", &"[REDACTED]")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Settings for the outbound client.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub restricted: Option<RestrictedUpstream>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            restricted: None,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub signing_key: Vec<u8>,
    pub allowed_origin: HeaderValue,
    pub token_ttl: Duration,
    pub max_manifest_bytes: usize,
    pub upstream: UpstreamConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("signing_key", &"[REDACTED]")
            .field("allowed_origin", &self.allowed_origin)
            .field("token_ttl", &self.token_ttl)
            .field("max_manifest_bytes", &self.max_manifest_bytes)
            .field("upstream", &self.upstream)
            .finish()
    }
}

impl Config {
    /// Minimal configuration around a signing key; everything else defaulted.
    pub fn new(signing_key: impl Into<Vec<u8>>) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            signing_key: signing_key.into(),
            allowed_origin: HeaderValue::from_static("*"),
            token_ttl: DEFAULT_TOKEN_TTL,
            max_manifest_bytes: DEFAULT_MAX_MANIFEST_BYTES,
            upstream: UpstreamConfig::default(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let Some(key) = var("REELGATE_SIGNING_KEY") else {
            bail!("REELGATE_SIGNING_KEY must be set to a non-empty secret");
        };
        // Try to decode as hex first, fall back to using the string as bytes
        let signing_key = hex::decode(&key).unwrap_or_else(|_| key.into_bytes());

        let mut config = Self::new(signing_key);

        if let Some(host) = var("HOST") {
            config.host = host;
        }
        if let Some(port) = var("PORT") {
            config.port = port.parse().context("PORT must be a port number")?;
        }

        if let Some(origin) = var("ALLOWED_ORIGIN") {
            config.allowed_origin = HeaderValue::from_str(&origin)
                .context("ALLOWED_ORIGIN is not a valid header value")?;
        }

        if let Some(ttl) = var("TOKEN_TTL_SECS") {
            let secs: u64 = ttl.parse().context("TOKEN_TTL_SECS must be whole seconds")?;
            if secs == 0 {
                bail!("TOKEN_TTL_SECS must be greater than zero");
            }
            config.token_ttl = Duration::from_secs(secs);
        }

        if let Some(max) = var("MAX_MANIFEST_BYTES") {
            config.max_manifest_bytes = max.parse().context("MAX_MANIFEST_BYTES must be a byte count")?;
        }

        if let Some(secs) = var("UPSTREAM_CONNECT_TIMEOUT_SECS") {
            config.upstream.connect_timeout = Duration::from_secs(
                secs.parse().context("UPSTREAM_CONNECT_TIMEOUT_SECS must be whole seconds")?,
            );
        }
        if let Some(secs) = var("UPSTREAM_READ_TIMEOUT_SECS") {
            config.upstream.read_timeout = Duration::from_secs(
                secs.parse().context("UPSTREAM_READ_TIMEOUT_SECS must be whole seconds")?,
            );
        }

        if let Some(pattern) = var("RESTRICTED_HOST_PATTERN") {
            let mode = match var("RESTRICTED_HOST_MATCH") {
                Some(mode) => mode.parse::<HostMatch>()?,
                None => HostMatch::default(),
            };
            let access_token = var("RESTRICTED_ACCESS_TOKEN")
                .context("RESTRICTED_ACCESS_TOKEN is required with RESTRICTED_HOST_PATTERN")?;
            let user_agent = var("RESTRICTED_USER_AGENT")
                .context("RESTRICTED_USER_AGENT is required with RESTRICTED_HOST_PATTERN")?;
            HeaderValue::from_str(&format!("Basic {access_token}"))
                .context("RESTRICTED_ACCESS_TOKEN is not a valid header value")?;
            HeaderValue::from_str(&user_agent)
                .context("RESTRICTED_USER_AGENT is not a valid header value")?;

            if mode == HostMatch::Contains {
                tracing::warn!(
                    "RESTRICTED_HOST_MATCH=contains: any host containing {:?} receives credentials",
                    pattern
                );
            }

            config.upstream.restricted = Some(RestrictedUpstream {
                pattern: HostPattern::new(pattern, mode),
                access_token,
                user_agent,
            });
        } else {
            tracing::info!("RESTRICTED_HOST_PATTERN is not set, credential injection is disabled");
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
