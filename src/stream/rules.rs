pub mod media_uri;
pub mod uri_attribute;

use super::{classifier::ManifestLine, context::TransformContext};
use crate::Result;

pub use media_uri::MediaUriRewriteRule;
pub use uri_attribute::UriAttributeRewriteRule;

/// Trait for transform rules.
///
/// Rules see one line at a time and must return exactly one line, so the
/// playlist keeps its shape.
pub trait TransformRule: Send + Sync {
    /// Check if this rule should be applied.
    fn matches(&self, line: &ManifestLine<'_>) -> bool;

    /// Transform the line.
    fn transform(&self, line: &ManifestLine<'_>, context: &TransformContext) -> Result<String>;
}

/// Create default set of transform rules.
pub fn default_rules() -> Vec<Box<dyn TransformRule>> {
    vec![
        Box::new(UriAttributeRewriteRule),
        Box::new(MediaUriRewriteRule),
    ]
}
