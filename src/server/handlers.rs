pub mod stream;

pub use stream::{handle_missing_token, handle_preflight, handle_stream};
