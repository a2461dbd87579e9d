pub mod config;
pub mod error;
pub mod hls;
pub mod logging;
pub mod proxy;
pub mod server;
pub mod stream;
pub mod token;

pub use config::Config;
pub use error::Error;
pub use token::{TokenCodec, TokenError};
pub type Result<T> = std::result::Result<T, Error>;
