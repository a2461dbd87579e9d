pub mod classifier;
pub mod context;
pub mod rewriter;
pub mod rules;

pub use classifier::{LineClassifier, LineKind, ManifestLine};
pub use context::{STREAM_PATH_PREFIX, TransformContext, stream_path};
pub use rewriter::PlaylistRewriter;
