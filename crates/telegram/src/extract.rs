use std::sync::LazyLock;

use regex::Regex;

/// Canonical 11-character YouTube video identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoId(String);

impl VideoId {
    /// Length of every canonical video id.
    pub const LEN: usize = 11;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical link shapes: `watch?v=`, `/embed/`, `/v/`, `/e/`, `youtu.be/`.
#[allow(clippy::expect_used)]
static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:https?://)?(?:www\.)?(?:youtube\.com/(?:[^/\s]+/\S+/|(?:v|e(?:mbed)?)/|\S*?[?&]v=)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .expect("video id pattern is valid")
});

/// Extract a canonical video id from free-form text.
///
/// Tries the structured link shapes first, then falls back to reading a `v`
/// query parameter from any URL-shaped token. Returns `None` for anything
/// unrecognizable; never panics on malformed input.
pub fn extract_video_id(text: &str) -> Option<VideoId> {
    if let Some(caps) = VIDEO_ID_RE.captures(text) {
        return caps.get(1).map(|m| VideoId(m.as_str().to_string()));
    }

    // Fallback: a URL whose `v` parameter carries the id but whose shape the
    // pattern above doesn't cover.
    for token in text.split_whitespace() {
        let Ok(parsed) = url::Url::parse(token) else {
            continue;
        };
        let id = parsed
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned());
        if let Some(id) = id
            && id.len() == VideoId::LEN
            && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Some(VideoId(id));
        }
    }

    None
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("https://www.youtube.com/watch?v=dQw4w9WgXcQ")]
    #[case("http://youtube.com/watch?v=dQw4w9WgXcQ&feature=share")]
    #[case("https://youtu.be/dQw4w9WgXcQ")]
    #[case("https://www.youtube.com/embed/dQw4w9WgXcQ")]
    #[case("https://www.youtube.com/v/dQw4w9WgXcQ")]
    #[case("youtube.com/watch?v=dQw4w9WgXcQ")]
    #[case("check this out https://youtu.be/dQw4w9WgXcQ please")]
    fn extracts_canonical_id(#[case] input: &str) {
        let id = extract_video_id(input).expect("should extract");
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[rstest]
    #[case("not a link")]
    #[case("")]
    #[case("https://example.com/watch?v=dQw4w9WgXcQ-too-long")]
    #[case("https://vimeo.com/12345678")]
    #[case("youtu.be/short")]
    fn rejects_non_matching(#[case] input: &str) {
        assert!(extract_video_id(input).is_none());
    }

    #[test]
    fn fallback_reads_v_query_parameter() {
        // Host the primary pattern does not cover; the `v` parameter still
        // carries a well-formed id.
        let input = "https://www.youtube-nocookie.com/watch?v=dQw4w9WgXcQ";
        let id = extract_video_id(input).expect("fallback should extract");
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn fallback_rejects_wrong_length_v_parameter() {
        assert!(extract_video_id("https://www.youtube-nocookie.com/x?v=short").is_none());
    }

    #[test]
    fn underscore_and_dash_ids_survive() {
        let id = extract_video_id("https://youtu.be/a_b-C_d-E_f").unwrap();
        assert_eq!(id.as_str(), "a_b-C_d-E_f");
    }
}
