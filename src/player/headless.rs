use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};
use url::Url;

use super::traits::{
    OverlaySurface, PlayerBackend, PlayerFactory, SignalSender, SurfaceHost, WidgetSignal,
};
use super::types::{MediaSource, Rect, WidgetId};
use crate::config::HeadlessConfig;
use crate::utils::errors::VideoError;

/// Nominal frame size reported for simulated streams.
const SIMULATED_WIDTH: i32 = 640;
const SIMULATED_HEIGHT: i32 = 360;

/// Creates clock-driven players with no real decoding behind them. Useful
/// for exercising widget lifecycles in demos and on machines without a
/// media stack.
pub struct HeadlessFactory {
    prepare_delay: Duration,
    default_duration: Duration,
}

impl HeadlessFactory {
    pub fn new(config: &HeadlessConfig) -> Self {
        Self {
            prepare_delay: Duration::from_millis(config.prepare_delay_ms),
            default_duration: Duration::from_millis(config.default_duration_ms),
        }
    }
}

impl PlayerFactory for HeadlessFactory {
    fn open(
        &self,
        widget: WidgetId,
        source: &MediaSource,
        signals: SignalSender,
    ) -> Result<Box<dyn PlayerBackend>, VideoError> {
        validate_source(source)?;
        debug!(widget = %widget, %source, "opening simulated player");
        Ok(Box::new(HeadlessPlayer::open(
            self.prepare_delay,
            self.default_duration,
            signals,
        )))
    }
}

fn validate_source(source: &MediaSource) -> Result<(), VideoError> {
    match source {
        MediaSource::Asset(path) => {
            if path.is_empty() {
                Err(VideoError::SourceOpen("empty asset path".to_string()))
            } else {
                Ok(())
            }
        }
        MediaSource::Url(location) => {
            // Absolute local paths are legal locations but not parseable URLs.
            if location.starts_with('/') {
                Ok(())
            } else {
                Url::parse(location)
                    .map(|_| ())
                    .map_err(|error| VideoError::SourceOpen(format!("{location}: {error}")))
            }
        }
    }
}

/// Simulated player: position is derived from the clock while playing, and
/// timer tasks stand in for the platform's prepare and completion callbacks.
pub struct HeadlessPlayer {
    duration: Duration,
    playing: bool,
    base_position: Duration,
    started_at: Option<Instant>,
    signals: SignalSender,
    prepare_task: JoinHandle<()>,
    completion_task: Option<JoinHandle<()>>,
}

impl HeadlessPlayer {
    fn open(prepare_delay: Duration, duration: Duration, signals: SignalSender) -> Self {
        let prepare_task = tokio::spawn({
            let signals = signals.clone();
            async move {
                tokio::time::sleep(prepare_delay).await;
                signals.send(WidgetSignal::BufferingUpdate { percent: 100 });
                signals.send(WidgetSignal::Prepared {
                    width: SIMULATED_WIDTH,
                    height: SIMULATED_HEIGHT,
                });
            }
        });
        Self {
            duration,
            playing: false,
            base_position: Duration::ZERO,
            started_at: None,
            signals,
            prepare_task,
            completion_task: None,
        }
    }

    fn current_position(&self) -> Duration {
        let elapsed = self
            .started_at
            .map_or(Duration::ZERO, |started| started.elapsed());
        (self.base_position + elapsed).min(self.duration)
    }

    fn schedule_completion(&mut self) {
        self.cancel_completion();
        let remaining = self.duration.saturating_sub(self.current_position());
        let signals = self.signals.clone();
        self.completion_task = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            signals.send(WidgetSignal::PlaybackCompleted);
        }));
    }

    fn cancel_completion(&mut self) {
        if let Some(task) = self.completion_task.take() {
            task.abort();
        }
    }
}

impl PlayerBackend for HeadlessPlayer {
    fn start(&mut self) {
        if !self.playing {
            self.playing = true;
            self.started_at = Some(Instant::now());
            self.schedule_completion();
        }
    }

    fn pause(&mut self) {
        if self.playing {
            self.base_position = self.current_position();
            self.playing = false;
            self.started_at = None;
            self.cancel_completion();
        }
    }

    fn seek_to(&mut self, position: Duration) {
        self.base_position = position.min(self.duration);
        if self.playing {
            self.started_at = Some(Instant::now());
            self.schedule_completion();
        }
    }

    fn position(&self) -> Duration {
        self.current_position()
    }

    fn duration(&self) -> Option<Duration> {
        Some(self.duration)
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

impl Drop for HeadlessPlayer {
    fn drop(&mut self) {
        self.prepare_task.abort();
        self.cancel_completion();
    }
}

/// Surface host with no compositor behind it: surfaces are ready the moment
/// they are created, geometry is only logged, and error notices are
/// acknowledged on the spot since there is nobody to click them away.
pub struct HeadlessSurfaceHost;

impl SurfaceHost for HeadlessSurfaceHost {
    fn create_surface(
        &mut self,
        widget: WidgetId,
        signals: SignalSender,
    ) -> Box<dyn OverlaySurface> {
        signals.send(WidgetSignal::SurfaceReady);
        Box::new(HeadlessSurface { widget, signals })
    }
}

struct HeadlessSurface {
    widget: WidgetId,
    signals: SignalSender,
}

impl OverlaySurface for HeadlessSurface {
    fn apply_rect(&mut self, rect: Rect) {
        debug!(widget = %self.widget, %rect, "surface rect");
    }

    fn set_visible(&mut self, visible: bool) {
        trace!(widget = %self.widget, visible, "surface visibility");
    }

    fn show_error_notice(&mut self, error: &VideoError) {
        warn!(widget = %self.widget, %error, "playback error notice");
        self.signals.send(WidgetSignal::ErrorNoticeAcknowledged);
    }
}
