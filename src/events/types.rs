use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::player::types::WidgetId;

/// Playback notifications surfaced to the embedding engine.
///
/// The numeric codes are part of the bridge contract and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoEventKind {
    Playing,
    Paused,
    Stopped,
    Completed,
}

impl VideoEventKind {
    /// Stable code used across the engine bridge.
    pub fn bridge_code(&self) -> i32 {
        match self {
            VideoEventKind::Playing => 0,
            VideoEventKind::Paused => 1,
            VideoEventKind::Stopped => 2,
            VideoEventKind::Completed => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoEventKind::Playing => "playing",
            VideoEventKind::Paused => "paused",
            VideoEventKind::Stopped => "stopped",
            VideoEventKind::Completed => "completed",
        }
    }
}

/// One outbound event, tagged with the widget that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoEvent {
    pub widget: WidgetId,
    pub kind: VideoEventKind,
    pub timestamp: DateTime<Utc>,
}

impl VideoEvent {
    pub fn new(widget: WidgetId, kind: VideoEventKind) -> Self {
        Self {
            widget,
            kind,
            timestamp: Utc::now(),
        }
    }
}
