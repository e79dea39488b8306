use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::events::sink::{EventDispatcher, EventEmitter, EventSink};
use crate::player::traits::{PlayerFactory, SignalSender, SurfaceHost, WidgetSignal};
use crate::player::types::{MediaSource, PlaybackState, Rect, SourceKind, WidgetId};
use crate::player::widget::VideoWidget;
use crate::utils::errors::VideoError;

/// Commands that can be sent to the video registry.
///
/// Control commands are fire-and-forget and never fail toward the caller;
/// queries answer through a oneshot channel.
#[derive(Debug)]
pub enum VideoCommand {
    /// Register a new widget under a pre-allocated id
    Create { id: WidgetId },
    /// Tear a widget down and forget its id
    Remove { id: WidgetId },
    /// Replace the widget's media source
    SetSource { id: WidgetId, source: MediaSource },
    /// Move and resize the widget
    SetRect { id: WidgetId, rect: Rect },
    /// Toggle full-screen geometry
    SetFullScreen {
        id: WidgetId,
        enabled: bool,
        width: i32,
        height: i32,
    },
    /// Start or resume-from-pause playback
    Start { id: WidgetId },
    /// Pause playback
    Pause { id: WidgetId },
    /// Reopen the current source
    Resume { id: WidgetId },
    /// Stop playback and release the player
    Stop { id: WidgetId },
    /// Rewind to the beginning and play
    Restart { id: WidgetId },
    /// Seek to a millisecond position
    Seek { id: WidgetId, position_ms: u32 },
    /// Show or hide the widget
    SetVisible { id: WidgetId, visible: bool },
    /// Toggle aspect-ratio preservation
    SetKeepAspectRatio { id: WidgetId, keep: bool },
    /// Accepted for bridge compatibility; has no effect
    SetSkipEnabled { id: WidgetId, enabled: bool },
    /// Get current position
    Position {
        id: WidgetId,
        respond_to: oneshot::Sender<Duration>,
    },
    /// Get media duration
    GetDuration {
        id: WidgetId,
        respond_to: oneshot::Sender<Option<Duration>>,
    },
    /// Get whether playback is running
    IsPlaying {
        id: WidgetId,
        respond_to: oneshot::Sender<bool>,
    },
    /// Get the widget's playback state
    GetState {
        id: WidgetId,
        respond_to: oneshot::Sender<Option<PlaybackState>>,
    },
    /// Get buffering progress in percent
    BufferPercent {
        id: WidgetId,
        respond_to: oneshot::Sender<i32>,
    },
    /// Get the number of live widgets
    WidgetCount { respond_to: oneshot::Sender<usize> },
}

/// Callback consulted when a widget hits a playback error. Returning true
/// means the error was handled; otherwise the widget shows its own notice.
pub type ErrorHandler = Box<dyn FnMut(WidgetId, &VideoError) -> bool + Send>;

/// Owns every widget and processes all control on a single task.
///
/// Widgets are only ever touched from `run()`, which also re-marshals
/// player and surface feedback onto the same task. That serialization is
/// what keeps each widget's state machine free of locks.
pub struct VideoRegistry {
    widgets: HashMap<WidgetId, VideoWidget>,
    commands: mpsc::UnboundedReceiver<VideoCommand>,
    signals: mpsc::UnboundedReceiver<(WidgetId, WidgetSignal)>,
    signal_sender: mpsc::UnboundedSender<(WidgetId, WidgetSignal)>,
    factory: Arc<dyn PlayerFactory>,
    host: Box<dyn SurfaceHost>,
    events: EventEmitter,
    error_handler: Option<ErrorHandler>,
    default_keep_aspect: bool,
}

impl VideoRegistry {
    /// Creates the registry alongside its bridge and the event dispatcher.
    /// Both the registry and the dispatcher still need to be spawned.
    pub fn new(
        factory: Arc<dyn PlayerFactory>,
        host: Box<dyn SurfaceHost>,
        sink: Box<dyn EventSink>,
        config: &Config,
    ) -> (VideoBridge, VideoRegistry, EventDispatcher) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (events, dispatcher) = EventDispatcher::new(sink);

        let registry = VideoRegistry {
            widgets: HashMap::new(),
            commands: command_rx,
            signals: signal_rx,
            signal_sender: signal_tx,
            factory,
            host,
            events,
            error_handler: None,
            default_keep_aspect: config.playback.keep_aspect_ratio,
        };
        let bridge = VideoBridge {
            sender: command_tx,
            next_id: Arc::new(AtomicU64::new(0)),
        };

        (bridge, registry, dispatcher)
    }

    /// Installs the error callback consulted before any notice is shown.
    pub fn set_error_handler(&mut self, handler: ErrorHandler) {
        self.error_handler = Some(handler);
    }

    /// Runs the control loop until every bridge has been dropped.
    pub async fn run(mut self) {
        debug!("video registry control loop started");

        loop {
            tokio::select! {
                // Feedback is drained before new commands so every command
                // sees the state the platform has already reported.
                biased;

                signal = self.signals.recv() => {
                    // Cannot close while we hold a sender, but guard anyway.
                    if let Some((id, signal)) = signal {
                        self.handle_signal(id, signal);
                    }
                }
                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => break,
                    }
                }
            }
        }

        debug!("video registry control loop terminated");
    }

    fn handle_command(&mut self, command: VideoCommand) {
        match command {
            VideoCommand::Create { id } => {
                trace!(widget = %id, "creating widget");
                let signals = SignalSender::new(id, self.signal_sender.clone());
                let surface = self.host.create_surface(id, signals.clone());
                let widget = VideoWidget::new(
                    id,
                    surface,
                    self.factory.clone(),
                    signals,
                    self.events.clone(),
                    self.default_keep_aspect,
                );
                self.widgets.insert(id, widget);
                debug!(widget = %id, total = self.widgets.len(), "widget created");
            }
            VideoCommand::Remove { id } => {
                trace!(widget = %id, "removing widget");
                match self.widgets.remove(&id) {
                    Some(mut widget) => {
                        widget.shutdown();
                        debug!(widget = %id, total = self.widgets.len(), "widget removed");
                    }
                    None => trace!(widget = %id, "widget already gone"),
                }
            }
            VideoCommand::SetSource { id, source } => {
                trace!(widget = %id, %source, "setting source");
                let error = self
                    .widgets
                    .get_mut(&id)
                    .and_then(|widget| widget.set_source(source));
                if let Some(error) = error {
                    self.handle_widget_error(id, error);
                }
            }
            VideoCommand::SetRect { id, rect } => {
                trace!(widget = %id, %rect, "setting rect");
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.set_rect(rect);
                }
            }
            VideoCommand::SetFullScreen {
                id,
                enabled,
                width,
                height,
            } => {
                trace!(widget = %id, enabled, "setting full screen");
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.set_full_screen(enabled, width, height);
                }
            }
            VideoCommand::Start { id } => {
                trace!(widget = %id, "start");
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.start();
                }
            }
            VideoCommand::Pause { id } => {
                trace!(widget = %id, "pause");
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.pause();
                }
            }
            VideoCommand::Resume { id } => {
                trace!(widget = %id, "resume");
                let error = self
                    .widgets
                    .get_mut(&id)
                    .and_then(|widget| widget.resume());
                if let Some(error) = error {
                    self.handle_widget_error(id, error);
                }
            }
            VideoCommand::Stop { id } => {
                trace!(widget = %id, "stop");
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.stop();
                }
            }
            VideoCommand::Restart { id } => {
                trace!(widget = %id, "restart");
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.restart();
                }
            }
            VideoCommand::Seek { id, position_ms } => {
                trace!(widget = %id, position_ms, "seek");
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.seek_to_ms(position_ms);
                }
            }
            VideoCommand::SetVisible { id, visible } => {
                trace!(widget = %id, visible, "setting visibility");
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.set_visible(visible);
                }
            }
            VideoCommand::SetKeepAspectRatio { id, keep } => {
                trace!(widget = %id, keep, "setting keep aspect ratio");
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.set_keep_aspect_ratio(keep);
                }
            }
            VideoCommand::SetSkipEnabled { id, enabled } => {
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.set_skip_enabled(enabled);
                }
            }
            VideoCommand::Position { id, respond_to } => {
                let position = self
                    .widgets
                    .get(&id)
                    .map_or(Duration::ZERO, |widget| widget.position());
                let _ = respond_to.send(position);
            }
            VideoCommand::GetDuration { id, respond_to } => {
                let duration = self
                    .widgets
                    .get_mut(&id)
                    .and_then(|widget| widget.duration());
                let _ = respond_to.send(duration);
            }
            VideoCommand::IsPlaying { id, respond_to } => {
                let playing = self
                    .widgets
                    .get(&id)
                    .is_some_and(|widget| widget.is_playing());
                let _ = respond_to.send(playing);
            }
            VideoCommand::GetState { id, respond_to } => {
                let state = self.widgets.get(&id).map(|widget| widget.playback_state());
                let _ = respond_to.send(state);
            }
            VideoCommand::BufferPercent { id, respond_to } => {
                let percent = self
                    .widgets
                    .get(&id)
                    .map_or(0, |widget| widget.buffer_percent());
                let _ = respond_to.send(percent);
            }
            VideoCommand::WidgetCount { respond_to } => {
                let _ = respond_to.send(self.widgets.len());
            }
        }
    }

    fn handle_signal(&mut self, id: WidgetId, signal: WidgetSignal) {
        if !self.widgets.contains_key(&id) {
            trace!(widget = %id, signal = signal.as_str(), "discarding signal for unknown widget");
            return;
        }
        trace!(widget = %id, signal = signal.as_str(), "handling signal");

        match signal {
            WidgetSignal::Prepared { width, height } => {
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.on_prepared(width, height);
                }
            }
            WidgetSignal::VideoSizeChanged { width, height } => {
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.on_video_size_changed(width, height);
                }
            }
            WidgetSignal::PlaybackCompleted => {
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.on_completion();
                }
            }
            WidgetSignal::PlaybackError(error) => {
                // Errors from a player that was already released belong to a
                // finished session.
                if self.widgets.get(&id).is_some_and(VideoWidget::has_player) {
                    self.handle_widget_error(id, error);
                } else {
                    trace!(widget = %id, "discarding stale playback error");
                }
            }
            WidgetSignal::BufferingUpdate { percent } => {
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.on_buffering_update(percent);
                }
            }
            WidgetSignal::SurfaceReady => {
                let error = self
                    .widgets
                    .get_mut(&id)
                    .and_then(|widget| widget.on_surface_ready());
                if let Some(error) = error {
                    self.handle_widget_error(id, error);
                }
            }
            WidgetSignal::SurfaceChanged { width, height } => {
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.on_surface_changed(width, height);
                }
            }
            WidgetSignal::SurfaceLost => {
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.on_surface_lost();
                }
            }
            WidgetSignal::ErrorNoticeAcknowledged => {
                if let Some(widget) = self.widgets.get_mut(&id) {
                    widget.acknowledge_error_notice();
                }
            }
        }
    }

    /// Common error path for open failures and playback error signals: the
    /// widget enters the error state, the registered handler gets the first
    /// say, and only an unhandled error surfaces as a user-facing notice.
    fn handle_widget_error(&mut self, id: WidgetId, error: VideoError) {
        warn!(widget = %id, %error, "widget playback error");
        if let Some(widget) = self.widgets.get_mut(&id) {
            widget.mark_error();
        } else {
            return;
        }

        let handled = match self.error_handler.as_mut() {
            Some(handler) => handler(id, &error),
            None => false,
        };
        if !handled
            && let Some(widget) = self.widgets.get_mut(&id)
        {
            widget.show_error_notice(&error);
        }
    }
}

/// Cloneable, thread-safe entry point for issuing commands to the registry.
///
/// Ids are allocated on the calling thread so `create_widget` can hand one
/// back without waiting for the control task.
#[derive(Debug, Clone)]
pub struct VideoBridge {
    sender: mpsc::UnboundedSender<VideoCommand>,
    next_id: Arc<AtomicU64>,
}

impl VideoBridge {
    /// Registers a new widget and returns its id immediately; construction
    /// happens asynchronously on the control task.
    pub fn create_widget(&self) -> WidgetId {
        let id = WidgetId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.send(VideoCommand::Create { id });
        id
    }

    pub fn remove_widget(&self, id: WidgetId) {
        self.send(VideoCommand::Remove { id });
    }

    /// Replaces the widget's source with the bridge's (kind, path) pair,
    /// applying the engine's asset-path normalization.
    pub fn set_source(&self, id: WidgetId, kind: SourceKind, path: &str) {
        self.send(VideoCommand::SetSource {
            id,
            source: MediaSource::from_kind(kind, path),
        });
    }

    /// Replaces the widget's source with an already-built value.
    pub fn set_media_source(&self, id: WidgetId, source: MediaSource) {
        self.send(VideoCommand::SetSource { id, source });
    }

    pub fn set_rect(&self, id: WidgetId, left: i32, top: i32, width: i32, height: i32) {
        self.send(VideoCommand::SetRect {
            id,
            rect: Rect::new(left, top, width, height),
        });
    }

    pub fn set_full_screen(&self, id: WidgetId, enabled: bool, width: i32, height: i32) {
        self.send(VideoCommand::SetFullScreen {
            id,
            enabled,
            width,
            height,
        });
    }

    pub fn start(&self, id: WidgetId) {
        self.send(VideoCommand::Start { id });
    }

    pub fn pause(&self, id: WidgetId) {
        self.send(VideoCommand::Pause { id });
    }

    /// Reopens the current source from scratch.
    pub fn resume(&self, id: WidgetId) {
        self.send(VideoCommand::Resume { id });
    }

    pub fn stop(&self, id: WidgetId) {
        self.send(VideoCommand::Stop { id });
    }

    pub fn restart(&self, id: WidgetId) {
        self.send(VideoCommand::Restart { id });
    }

    pub fn seek(&self, id: WidgetId, position_ms: u32) {
        self.send(VideoCommand::Seek { id, position_ms });
    }

    pub fn set_visible(&self, id: WidgetId, visible: bool) {
        self.send(VideoCommand::SetVisible { id, visible });
    }

    pub fn set_keep_aspect_ratio(&self, id: WidgetId, keep: bool) {
        self.send(VideoCommand::SetKeepAspectRatio { id, keep });
    }

    /// Accepted for bridge compatibility; has no effect.
    pub fn set_skip_enabled(&self, id: WidgetId, enabled: bool) {
        self.send(VideoCommand::SetSkipEnabled { id, enabled });
    }

    /// Get current position. Zero for unknown widgets or outside playback.
    pub async fn position(&self, id: WidgetId) -> Result<Duration> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(VideoCommand::Position { id, respond_to })
            .map_err(|_| anyhow::anyhow!("Video registry disconnected"))?;
        response
            .await
            .map_err(|_| anyhow::anyhow!("Failed to receive response from video registry"))
    }

    /// Get media duration, if the widget's player knows it.
    pub async fn duration(&self, id: WidgetId) -> Result<Option<Duration>> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(VideoCommand::GetDuration { id, respond_to })
            .map_err(|_| anyhow::anyhow!("Video registry disconnected"))?;
        response
            .await
            .map_err(|_| anyhow::anyhow!("Failed to receive response from video registry"))
    }

    pub async fn is_playing(&self, id: WidgetId) -> Result<bool> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(VideoCommand::IsPlaying { id, respond_to })
            .map_err(|_| anyhow::anyhow!("Video registry disconnected"))?;
        response
            .await
            .map_err(|_| anyhow::anyhow!("Failed to receive response from video registry"))
    }

    /// Get the widget's playback state, or None for an unknown widget.
    pub async fn playback_state(&self, id: WidgetId) -> Result<Option<PlaybackState>> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(VideoCommand::GetState { id, respond_to })
            .map_err(|_| anyhow::anyhow!("Video registry disconnected"))?;
        response
            .await
            .map_err(|_| anyhow::anyhow!("Failed to receive response from video registry"))
    }

    pub async fn buffer_percent(&self, id: WidgetId) -> Result<i32> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(VideoCommand::BufferPercent { id, respond_to })
            .map_err(|_| anyhow::anyhow!("Video registry disconnected"))?;
        response
            .await
            .map_err(|_| anyhow::anyhow!("Failed to receive response from video registry"))
    }

    pub async fn widget_count(&self) -> Result<usize> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(VideoCommand::WidgetCount { respond_to })
            .map_err(|_| anyhow::anyhow!("Video registry disconnected"))?;
        response
            .await
            .map_err(|_| anyhow::anyhow!("Failed to receive response from video registry"))
    }

    /// Control commands are fire-and-forget by contract: after shutdown
    /// they are dropped with a warning rather than surfaced as errors.
    fn send(&self, command: VideoCommand) {
        if self.sender.send(command).is_err() {
            warn!("video registry is gone, dropping command");
        }
    }
}
