use crate::extract::VideoId;

/// A thumbnail resolution tier, ordered highest fidelity first.
///
/// Addresses are a pure function of the video id: YouTube publishes every
/// tier under a fixed naming convention, so no lookup call is needed to
/// enumerate candidates. Only the upper tiers are guaranteed to exist for
/// popular videos; delivery walks the ladder until one sticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailVariant {
    /// 1280x720, missing for many older/low-res uploads.
    MaxRes,
    /// 640x480.
    Sd,
    /// 480x360, present for effectively every video.
    Hq,
    /// 320x180.
    Mq,
}

impl ThumbnailVariant {
    /// All tiers, highest fidelity first. Delivery fallback iterates this
    /// order and stops at the first confirmed send.
    pub const fn ordered() -> [Self; 4] {
        [Self::MaxRes, Self::Sd, Self::Hq, Self::Mq]
    }

    fn file_stem(self) -> &'static str {
        match self {
            Self::MaxRes => "maxresdefault",
            Self::Sd => "sddefault",
            Self::Hq => "hqdefault",
            Self::Mq => "mqdefault",
        }
    }

    /// Human-readable label for buttons and captions.
    pub fn label(self) -> &'static str {
        match self {
            Self::MaxRes => "HD",
            Self::Sd => "SD",
            Self::Hq => "HQ",
            Self::Mq => "MQ",
        }
    }

    /// Deterministic artifact address for this tier.
    pub fn url(self, id: &VideoId) -> String {
        format!("https://img.youtube.com/vi/{id}/{}.jpg", self.file_stem())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::extract::extract_video_id};

    fn id() -> VideoId {
        extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap()
    }

    #[test]
    fn tiers_are_ordered_highest_first() {
        assert_eq!(
            ThumbnailVariant::ordered(),
            [
                ThumbnailVariant::MaxRes,
                ThumbnailVariant::Sd,
                ThumbnailVariant::Hq,
                ThumbnailVariant::Mq,
            ]
        );
    }

    #[test]
    fn url_follows_naming_convention() {
        assert_eq!(
            ThumbnailVariant::MaxRes.url(&id()),
            "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
        );
        assert_eq!(
            ThumbnailVariant::Hq.url(&id()),
            "https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
        );
    }

    #[test]
    fn urls_parse() {
        for tier in ThumbnailVariant::ordered() {
            assert!(url::Url::parse(&tier.url(&id())).is_ok());
        }
    }
}
