use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for one video overlay, assigned at creation and never
/// reused within a process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WidgetId(u64);

impl WidgetId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The underlying player's actual condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Preparing,
    Prepared,
    Playing,
    Paused,
    Completed,
    Error,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Preparing => "preparing",
            PlaybackState::Prepared => "prepared",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Completed => "completed",
            PlaybackState::Error => "error",
        }
    }
}

/// The state a caller intends to reach, independent of whether the player is
/// ready for it yet. A start issued while the asset is still opening is
/// remembered here and honored once preparation completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Idle,
    Playing,
    Paused,
    Completed,
    Error,
}

impl TargetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetState::Idle => "idle",
            TargetState::Playing => "playing",
            TargetState::Paused => "paused",
            TargetState::Completed => "completed",
            TargetState::Error => "error",
        }
    }
}

/// Source kind as carried across the engine bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    FileAsset,
    Url,
}

impl SourceKind {
    /// Stable code used across the engine bridge.
    pub fn bridge_code(&self) -> i32 {
        match self {
            SourceKind::FileAsset => 0,
            SourceKind::Url => 1,
        }
    }

    pub fn from_bridge_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(SourceKind::FileAsset),
            1 => Some(SourceKind::Url),
            _ => None,
        }
    }
}

/// Where a widget's media comes from: a path inside the engine's asset
/// bundle, or an arbitrary location (URL or absolute file path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Asset(String),
    Url(String),
}

const ASSET_ROOT: &str = "assets/";

impl MediaSource {
    /// Builds a source from the bridge's (kind, path) pair, applying the
    /// engine's asset-path rules: an `assets/` prefix is stripped, and a
    /// stripped path that still starts with `/` is an absolute location
    /// rather than a bundle asset.
    pub fn from_kind(kind: SourceKind, path: &str) -> Self {
        match kind {
            SourceKind::Url => MediaSource::Url(path.to_string()),
            SourceKind::FileAsset => {
                let path = path.strip_prefix(ASSET_ROOT).unwrap_or(path);
                if path.starts_with('/') {
                    MediaSource::Url(path.to_string())
                } else {
                    MediaSource::Asset(path.to_string())
                }
            }
        }
    }

    pub fn location(&self) -> &str {
        match self {
            MediaSource::Asset(path) => path,
            MediaSource::Url(url) => url,
        }
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSource::Asset(path) => write!(f, "asset:{}", path),
            MediaSource::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Integer rectangle in host surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width, self.height, self.left, self.top
        )
    }
}
