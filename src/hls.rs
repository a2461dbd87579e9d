pub mod attribute;
pub mod media_type;

pub use attribute::{Attribute, attributes, uri_span};
pub use media_type::{BodyKind, PLAYLIST_CONTENT_TYPE};
