use thiserror::Error;

/// Playback failures reported to widget owners.
///
/// These travel through channels and are handed to registered error
/// handlers, so they are cheap to clone and carry no backtraces.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VideoError {
    #[error("failed to open media source: {0}")]
    SourceOpen(String),

    #[error("playback failed (code {code})")]
    Playback { code: i32 },
}
