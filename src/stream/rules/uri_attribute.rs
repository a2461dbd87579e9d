use super::{ManifestLine, TransformContext, TransformRule};
use crate::{Result, stream::classifier::LineKind};

/// Rule for rewriting the `URI="..."` attribute of tags such as
/// `#EXT-X-KEY`, `#EXT-X-MAP` and `#EXT-X-MEDIA`.
///
/// Only the quoted value changes; every other attribute stays byte-identical.
pub struct UriAttributeRewriteRule;

impl TransformRule for UriAttributeRewriteRule {
    fn matches(&self, line: &ManifestLine<'_>) -> bool {
        matches!(line.kind, LineKind::DirectiveWithUri { .. })
    }

    fn transform(&self, line: &ManifestLine<'_>, context: &TransformContext) -> Result<String> {
        let LineKind::DirectiveWithUri { uri } = &line.kind else {
            return Ok(line.raw.to_string());
        };

        let Some(resolved) = context.resolve_url(&line.raw[uri.clone()]) else {
            tracing::debug!(tag = ?line.tag(), "Leaving non-HTTP URI attribute untouched");
            return Ok(line.raw.to_string());
        };

        let proxied = context.build_stream_path(&resolved)?;

        let mut result = String::with_capacity(line.raw.len() + proxied.len());
        result.push_str(&line.raw[..uri.start]);
        result.push_str(&proxied);
        result.push_str(&line.raw[uri.end..]);

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        stream::{LineClassifier, context::STREAM_PATH_PREFIX},
        token::TokenCodec,
    };
    use std::time::Duration;
    use url::Url;

    fn create_test_context() -> TransformContext {
        TransformContext::new(
            &Url::parse("https://origin.example/show/playlist.m3u8").unwrap(),
            TokenCodec::test_codec(),
            Duration::from_secs(60),
        )
        .unwrap()
    }

    fn token_in(line: &str) -> &str {
        let start = line.find(STREAM_PATH_PREFIX).unwrap() + STREAM_PATH_PREFIX.len();
        let end = start + line[start..].find('"').unwrap();
        &line[start..end]
    }

    #[test]
    fn test_matches_directive_only() {
        let rule = UriAttributeRewriteRule;

        assert!(rule.matches(&LineClassifier::classify(r#"#EXT-X-MAP:URI="init.mp4""#)));
        assert!(!rule.matches(&LineClassifier::classify("#EXTINF:6.0,")));
        assert!(!rule.matches(&LineClassifier::classify("segment.ts")));
    }

    #[test]
    fn test_rewrites_key_uri_keeping_method() {
        let rule = UriAttributeRewriteRule;
        let context = create_test_context();
        let line = LineClassifier::classify(r#"#EXT-X-KEY:METHOD=AES-128,URI="key.bin""#);

        let result = rule.transform(&line, &context).unwrap();

        assert!(result.starts_with(r#"#EXT-X-KEY:METHOD=AES-128,URI="/stream/"#));
        assert!(result.ends_with('"'));
        assert_eq!(
            context.codec().verify(token_in(&result)).unwrap(),
            "https://origin.example/show/key.bin"
        );
    }

    #[test]
    fn test_rewrites_map_keeping_byterange() {
        let rule = UriAttributeRewriteRule;
        let context = create_test_context();
        let line = LineClassifier::classify(r#"#EXT-X-MAP:URI="init.mp4",BYTERANGE="617@0""#);

        let result = rule.transform(&line, &context).unwrap();

        assert!(result.starts_with(r#"#EXT-X-MAP:URI="/stream/"#));
        assert!(result.ends_with(r#"",BYTERANGE="617@0""#));
        assert_eq!(
            context.codec().verify(token_in(&result)).unwrap(),
            "https://origin.example/show/init.mp4"
        );
    }

    #[test]
    fn test_leaves_skd_key_untouched() {
        let rule = UriAttributeRewriteRule;
        let context = create_test_context();
        let raw = r#"#EXT-X-KEY:METHOD=SAMPLE-AES,URI="skd://key-id",KEYFORMAT="com.apple.streamingkeydelivery""#;

        let result = rule
            .transform(&LineClassifier::classify(raw), &context)
            .unwrap();

        assert_eq!(result, raw);
    }
}
