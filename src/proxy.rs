pub mod client;
pub mod headers;
pub mod host;
pub mod relay;

pub use client::ProxyClient;
pub use headers::UpstreamRequest;
pub use host::{HostMatch, HostPattern};
pub use relay::relay_body;
