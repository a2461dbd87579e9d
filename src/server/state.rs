use std::sync::Arc;

use crate::{Result, config::Config, proxy::ProxyClient, token::TokenCodec};

/// Shared application state. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub codec: TokenCodec,
    pub client: ProxyClient,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            codec: TokenCodec::new(config.signing_key.clone()),
            client: ProxyClient::new(config.upstream.clone())?,
            config: Arc::new(config),
        })
    }
}
