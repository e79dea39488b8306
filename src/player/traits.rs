use std::time::Duration;
use tokio::sync::mpsc;
use tracing::trace;

use super::types::{MediaSource, Rect, WidgetId};
use crate::utils::errors::VideoError;

/// Asynchronous feedback from a platform player or host surface. Signals are
/// queued onto the registry's control task, so producers may fire them from
/// any thread.
#[derive(Debug, Clone)]
pub enum WidgetSignal {
    /// The player finished opening the source and knows its natural size.
    /// A zero dimension means the size is not (yet) known.
    Prepared { width: i32, height: i32 },
    /// The decoded frame size changed after preparation.
    VideoSizeChanged { width: i32, height: i32 },
    /// Playback ran off the end of the media.
    PlaybackCompleted,
    /// The player hit an unrecoverable error.
    PlaybackError(VideoError),
    /// Download progress for streamed sources, in percent.
    BufferingUpdate { percent: i32 },
    /// The host surface can accept a player from now on.
    SurfaceReady,
    /// The host surface was resized.
    SurfaceChanged { width: i32, height: i32 },
    /// The host surface is gone; any attached player must let go of it.
    SurfaceLost,
    /// The user dismissed the error notice shown for this widget.
    ErrorNoticeAcknowledged,
}

impl WidgetSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetSignal::Prepared { .. } => "prepared",
            WidgetSignal::VideoSizeChanged { .. } => "video-size-changed",
            WidgetSignal::PlaybackCompleted => "playback-completed",
            WidgetSignal::PlaybackError(_) => "playback-error",
            WidgetSignal::BufferingUpdate { .. } => "buffering-update",
            WidgetSignal::SurfaceReady => "surface-ready",
            WidgetSignal::SurfaceChanged { .. } => "surface-changed",
            WidgetSignal::SurfaceLost => "surface-lost",
            WidgetSignal::ErrorNoticeAcknowledged => "error-notice-acknowledged",
        }
    }
}

/// Sends signals for one specific widget back to the registry. Cloneable and
/// thread-safe; sending never blocks. Signals that arrive after the widget
/// or the registry is gone are discarded.
#[derive(Clone)]
pub struct SignalSender {
    widget: WidgetId,
    tx: mpsc::UnboundedSender<(WidgetId, WidgetSignal)>,
}

impl SignalSender {
    pub(crate) fn new(
        widget: WidgetId,
        tx: mpsc::UnboundedSender<(WidgetId, WidgetSignal)>,
    ) -> Self {
        Self { widget, tx }
    }

    pub fn widget(&self) -> WidgetId {
        self.widget
    }

    pub fn send(&self, signal: WidgetSignal) {
        if self.tx.send((self.widget, signal)).is_err() {
            trace!(widget = %self.widget, "registry is gone, dropping signal");
        }
    }
}

/// Creates platform players. One factory serves every widget in a registry.
pub trait PlayerFactory: Send + Sync {
    /// Opens `source` and starts asynchronous preparation. The returned
    /// backend is live immediately for control calls, but playback state
    /// progress (`Prepared`, errors, completion) arrives through `signals`.
    fn open(
        &self,
        widget: WidgetId,
        source: &MediaSource,
        signals: SignalSender,
    ) -> Result<Box<dyn PlayerBackend>, VideoError>;
}

/// Control surface of one open platform player.
///
/// Calls are only issued while the owning widget is in a playback-capable
/// state, so implementations do not need their own state guards. Dropping
/// the backend releases the underlying resource and cancels outstanding
/// callbacks.
pub trait PlayerBackend: Send {
    fn start(&mut self);
    fn pause(&mut self);
    fn seek_to(&mut self, position: Duration);
    fn position(&self) -> Duration;
    /// Total media length, if the backend knows it yet.
    fn duration(&self) -> Option<Duration>;
    fn is_playing(&self) -> bool;
}

/// Provides the on-screen region a widget renders into.
pub trait SurfaceHost: Send {
    /// Creates the surface for a new widget. The host reports readiness and
    /// teardown through `signals` (`SurfaceReady`, `SurfaceChanged`,
    /// `SurfaceLost`, and `ErrorNoticeAcknowledged` for error notices).
    fn create_surface(&mut self, widget: WidgetId, signals: SignalSender)
    -> Box<dyn OverlaySurface>;
}

/// One widget's region on screen. Dropped together with its widget.
pub trait OverlaySurface: Send {
    /// Positions the surface; `rect` is the final visible rectangle, already
    /// aspect-corrected.
    fn apply_rect(&mut self, rect: Rect);
    fn set_visible(&mut self, visible: bool);
    /// Tells the user playback failed. Hosts that render a notice send
    /// `ErrorNoticeAcknowledged` once it is dismissed.
    fn show_error_notice(&mut self, error: &VideoError);
}
