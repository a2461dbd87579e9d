use super::{ManifestLine, TransformContext, TransformRule};
use crate::{Result, stream::classifier::LineKind};

/// Rule for replacing segment and variant playlist references with
/// `/stream/{token}` paths.
pub struct MediaUriRewriteRule;

impl TransformRule for MediaUriRewriteRule {
    fn matches(&self, line: &ManifestLine<'_>) -> bool {
        matches!(line.kind, LineKind::MediaUri { .. })
    }

    fn transform(&self, line: &ManifestLine<'_>, context: &TransformContext) -> Result<String> {
        let Some(uri) = line.uri() else {
            return Ok(line.raw.to_string());
        };

        // Resolve relative URL
        let Some(resolved) = context.resolve_url(uri) else {
            tracing::debug!("Leaving unresolvable playlist line untouched");
            return Ok(line.raw.to_string());
        };

        context.build_stream_path(&resolved)
    }
}
