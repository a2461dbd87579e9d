use url::Url;

/// MIME type served for rewritten playlists.
pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// How an upstream response body is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// HLS playlist text, buffered and rewritten.
    Playlist,
    /// Anything else, relayed untouched.
    Media,
}

impl BodyKind {
    /// Decide from the upstream `Content-Type` and the requested URL.
    ///
    /// Covers `application/vnd.apple.mpegurl`, `application/x-mpegURL` and
    /// `audio/mpegurl`, plus any URL whose path ends in `.m3u8`.
    pub fn detect(content_type: Option<&str>, url: &Url) -> Self {
        let by_type = content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("mpegurl"));
        let by_path = url.path().to_ascii_lowercase().ends_with(".m3u8");

        if by_type || by_path {
            Self::Playlist
        } else {
            Self::Media
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Playlist => "playlist",
            Self::Media => "media",
        }
    }
}
