use super::{
    classifier::LineClassifier,
    context::TransformContext,
    rules::TransformRule,
};
use crate::Result;

/// Rewrites a whole playlist so every HTTP(S) reference points back through
/// `/stream/{token}`.
///
/// Lines are rewritten independently and reassembled in their original order;
/// the output always has the same number of lines as the input.
pub struct PlaylistRewriter {
    context: TransformContext,
    rules: Vec<Box<dyn TransformRule>>,
}

impl PlaylistRewriter {
    pub fn new(context: TransformContext, rules: Vec<Box<dyn TransformRule>>) -> Self {
        Self { context, rules }
    }

    /// Process entire playlist content and return transformed content.
    pub fn process(&self, input: &str) -> Result<String> {
        // Carriage returns would otherwise be echoed into every rewritten line.
        let normalized = input.replace('\r', "");

        let mut rewritten = 0usize;
        let output = normalized
            .split('\n')
            .map(|line| {
                let (line, changed) = self.process_line(line)?;
                rewritten += usize::from(changed);
                Ok(line)
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            lines = output.len(),
            rewritten,
            base = %self.context.base_url,
            "Rewrote playlist"
        );

        Ok(output.join("\n"))
    }

    /// Process a single line; the flag reports whether a rule rewrote it.
    pub fn process_line(&self, line: &str) -> Result<(String, bool)> {
        let classified = LineClassifier::classify(line);

        // Find first matching rule and apply it
        for rule in &self.rules {
            if rule.matches(&classified) {
                let result = rule.transform(&classified, &self.context)?;
                let changed = result != line;
                return Ok((result, changed));
            }
        }

        // Default: passthrough
        Ok((line.to_string(), false))
    }

    /// Get context (for inspection/testing).
    pub fn context(&self) -> &TransformContext {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        stream::{context::STREAM_PATH_PREFIX, rules},
        token::TokenCodec,
    };
    use chrono::{DateTime, Utc};
    use std::time::Duration;
    use url::Url;

    const MEDIA_PLAYLIST: &str = "#EXTM3U\n\
        #EXT-X-VERSION:3\n\
        #EXT-X-TARGETDURATION:6\n\
        #EXT-X-MEDIA-SEQUENCE:0\n\
        #EXT-X-KEY:METHOD=AES-128,URI=\"key.bin\",IV=0x00000000000000000000000000000001\n\
        #EXTINF:6.0,\n\
        segment1.ts\n\
        \n\
        #EXTINF:6.0,\n\
        https://cdn.example/other/segment2.ts\n\
        #EXT-X-ENDLIST\n";

    fn create_rewriter() -> PlaylistRewriter {
        let context = TransformContext::new(
            &Url::parse("https://origin.example/show/playlist.m3u8").unwrap(),
            TokenCodec::test_codec(),
            Duration::from_secs(60),
        )
        .unwrap();
        PlaylistRewriter::new(context, rules::default_rules())
    }

    fn verify(rewriter: &PlaylistRewriter, path: &str) -> String {
        let token = path.strip_prefix(STREAM_PATH_PREFIX).unwrap();
        rewriter.context().codec().verify(token).unwrap()
    }

    #[test]
    fn test_passthrough_without_rules() {
        let context = create_rewriter().context().clone();
        let rewriter = PlaylistRewriter::new(context, vec![]);

        let input = "#EXTM3U\n#EXT-X-VERSION:3\n#EXTINF:6.0,\nsegment.ts";
        assert_eq!(rewriter.process(input).unwrap(), input);
    }

    #[test]
    fn test_line_count_and_order_preserved() {
        let rewriter = create_rewriter();
        let output = rewriter.process(MEDIA_PLAYLIST).unwrap();

        let input_lines: Vec<&str> = MEDIA_PLAYLIST.split('\n').collect();
        let output_lines: Vec<&str> = output.split('\n').collect();
        assert_eq!(input_lines.len(), output_lines.len());

        for (input, output) in input_lines.iter().zip(&output_lines) {
            if input.starts_with('#') && !input.contains("URI=") || input.is_empty() {
                assert_eq!(input, output);
            }
        }
        assert!(output.ends_with("#EXT-X-ENDLIST\n"));
    }

    #[test]
    fn test_comment_passthrough() {
        let rewriter = create_rewriter();
        let output = rewriter.process(MEDIA_PLAYLIST).unwrap();

        assert_eq!(output.split('\n').next(), Some("#EXTM3U"));
    }

    #[test]
    fn test_segments_rewritten() {
        let rewriter = create_rewriter();
        let output = rewriter.process(MEDIA_PLAYLIST).unwrap();
        let lines: Vec<&str> = output.split('\n').collect();

        assert_eq!(
            verify(&rewriter, lines[6]),
            "https://origin.example/show/segment1.ts"
        );
        assert_eq!(
            verify(&rewriter, lines[9]),
            "https://cdn.example/other/segment2.ts"
        );
    }

    #[test]
    fn test_key_directive_rewritten_in_place() {
        let rewriter = create_rewriter();
        let output = rewriter.process(MEDIA_PLAYLIST).unwrap();
        let key_line = output.split('\n').nth(4).unwrap();

        let prefix = "#EXT-X-KEY:METHOD=AES-128,URI=\"";
        let suffix = "\",IV=0x00000000000000000000000000000001";
        assert!(key_line.starts_with(prefix));
        assert!(key_line.ends_with(suffix));

        let path = &key_line[prefix.len()..key_line.len() - suffix.len()];
        assert_eq!(verify(&rewriter, path), "https://origin.example/show/key.bin");
    }

    #[test]
    fn test_carriage_returns_removed() {
        let rewriter = create_rewriter();
        let output = rewriter
            .process("#EXTM3U\r\n#EXTINF:6.0,\r\nsegment1.ts\r\n")
            .unwrap();

        assert!(!output.contains('\r'));
        assert_eq!(output.split('\n').count(), 4);
        assert!(output.starts_with("#EXTM3U\n#EXTINF:6.0,\n/stream/"));
    }

    #[test]
    fn test_master_playlist_variants_rewritten() {
        let rewriter = create_rewriter();
        let input = "#EXTM3U\n\
            #EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aud\",NAME=\"English, US\",URI=\"audio/en.m3u8\"\n\
            #EXT-X-STREAM-INF:BANDWIDTH=1280000,AUDIO=\"aud\"\n\
            720p/index.m3u8";
        let output = rewriter.process(input).unwrap();
        let lines: Vec<&str> = output.split('\n').collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("NAME=\"English, US\",URI=\"/stream/"));
        assert_eq!(lines[2], "#EXT-X-STREAM-INF:BANDWIDTH=1280000,AUDIO=\"aud\"");
        assert_eq!(
            verify(&rewriter, lines[3]),
            "https://origin.example/show/720p/index.m3u8"
        );
    }

    #[test]
    fn test_deterministic_for_fixed_instant() {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let context = create_rewriter().context().clone().at(now);

        let first = PlaylistRewriter::new(context.clone(), rules::default_rules())
            .process(MEDIA_PLAYLIST)
            .unwrap();
        let second = PlaylistRewriter::new(context, rules::default_rules())
            .process(MEDIA_PLAYLIST)
            .unwrap();

        assert_eq!(first, second);
    }
}
