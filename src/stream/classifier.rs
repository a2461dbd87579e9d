use std::ops::Range;

use crate::hls::uri_span;

/// How a playlist line is treated during rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Empty or whitespace-only.
    Blank,
    /// A tag or comment without a `URI` attribute.
    Comment,
    /// A tag carrying `URI="..."` (`#EXT-X-KEY`, `#EXT-X-MAP`, `#EXT-X-MEDIA`, ...).
    /// The span covers the quoted value only.
    DirectiveWithUri { uri: Range<usize> },
    /// A segment or variant playlist reference; the span covers the trimmed line.
    MediaUri { uri: Range<usize> },
}

/// One line of a playlist together with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLine<'a> {
    pub raw: &'a str,
    pub kind: LineKind,
}

impl<'a> ManifestLine<'a> {
    /// The URI text that needs rewriting, if any.
    pub fn uri(&self) -> Option<&'a str> {
        match &self.kind {
            LineKind::DirectiveWithUri { uri } | LineKind::MediaUri { uri } => {
                Some(&self.raw[uri.clone()])
            }
            LineKind::Blank | LineKind::Comment => None,
        }
    }

    /// Tag name without the leading `#`, e.g. `EXT-X-KEY`.
    pub fn tag(&self) -> Option<&'a str> {
        let body = self.raw.trim_start().strip_prefix('#')?;
        let end = body.find(':').unwrap_or(body.len());
        Some(body[..end].trim_end())
    }

    pub fn needs_rewrite(&self) -> bool {
        self.uri().is_some()
    }
}

/// Classifier for playlist lines.
pub struct LineClassifier;

impl LineClassifier {
    /// Classify a line from an HLS playlist.
    pub fn classify(line: &str) -> ManifestLine<'_> {
        let trimmed = line.trim();

        let kind = if trimmed.is_empty() {
            LineKind::Blank
        } else if trimmed.starts_with('#') {
            match uri_span(line) {
                Some(uri) => LineKind::DirectiveWithUri { uri },
                None => LineKind::Comment,
            }
        } else {
            let start = line.len() - line.trim_start().len();
            LineKind::MediaUri {
                uri: start..start + trimmed.len(),
            }
        };

        ManifestLine { raw: line, kind }
    }
}
