//! Built-in filter seed set.

/// A seed filter installed by the `defaults` command or on first run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultFilter {
    /// Match pattern.
    pub pattern: &'static str,
    /// Action dispatched on a rate-limited match.
    pub action: &'static str,
    /// One-line description for listings.
    pub description: &'static str,
}

/// Media-control mappings for the common avatar parameter addresses.
pub const DEFAULT_FILTERS: &[DefaultFilter] = &[
    DefaultFilter {
        pattern: "/avatar/parameters/MediaPlay",
        action: "@media-play",
        description: "Media play/pause control",
    },
    DefaultFilter {
        pattern: "/avatar/parameters/MediaStop",
        action: "@media-stop",
        description: "Media stop control",
    },
    DefaultFilter {
        pattern: "/avatar/parameters/MediaNext",
        action: "@media-next",
        description: "Media next track",
    },
    DefaultFilter {
        pattern: "/avatar/parameters/MediaPrev",
        action: "@media-prev",
        description: "Media previous track",
    },
    DefaultFilter {
        pattern: "/avatar/parameters/MuteSelf",
        action: "@media-play",
        description: "Toggle self mute (mapped to play/pause)",
    },
    DefaultFilter {
        pattern: "/avatar/parameters/Voice",
        action: "@media-play",
        description: "Voice activation (mapped to play/pause)",
    },
    DefaultFilter {
        pattern: "/avatar/parameters/GestureLeft",
        action: "@media-prev",
        description: "Left gesture (previous track)",
    },
    DefaultFilter {
        pattern: "/avatar/parameters/GestureRight",
        action: "@media-next",
        description: "Right gesture (next track)",
    },
];
