use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

use super::layout;
use super::traits::{OverlaySurface, PlayerBackend, PlayerFactory, SignalSender};
use super::types::{MediaSource, PlaybackState, Rect, TargetState, WidgetId};
use crate::events::sink::EventEmitter;
use crate::events::types::VideoEventKind;
use crate::utils::errors::VideoError;

/// One video overlay: a platform player, the surface it renders into, and
/// the state machine tying them together.
///
/// The widget tracks two states. `playback_state` is where the player
/// actually is; `target_state` is where the caller wants it to be. Control
/// calls always record the target, but only act immediately when the player
/// is in a playback-capable state; otherwise the action is carried out once
/// preparation completes. All methods run on the registry's control task.
pub struct VideoWidget {
    id: WidgetId,
    playback_state: PlaybackState,
    target_state: TargetState,
    source: Option<MediaSource>,
    /// Millisecond position to apply once seeking becomes possible.
    /// Zero means no seek is pending.
    pending_seek_ms: u32,
    natural_size: (i32, i32),
    requested_rect: Rect,
    full_screen: bool,
    full_screen_size: (i32, i32),
    keep_aspect_ratio: bool,
    visible: bool,
    needs_resume: bool,
    /// Whether playback had already run off the end when the surface was
    /// last torn down. Gates the automatic restart on surface changes.
    reached_end: bool,
    error_notice_pending: bool,
    buffer_percent: i32,
    duration_hint: Option<Duration>,
    surface_ready: bool,
    player: Option<Box<dyn PlayerBackend>>,
    surface: Box<dyn OverlaySurface>,
    factory: Arc<dyn PlayerFactory>,
    signals: SignalSender,
    events: EventEmitter,
}

impl VideoWidget {
    pub(crate) fn new(
        id: WidgetId,
        surface: Box<dyn OverlaySurface>,
        factory: Arc<dyn PlayerFactory>,
        signals: SignalSender,
        events: EventEmitter,
        keep_aspect_ratio: bool,
    ) -> Self {
        Self {
            id,
            playback_state: PlaybackState::Idle,
            target_state: TargetState::Idle,
            source: None,
            pending_seek_ms: 0,
            natural_size: (0, 0),
            requested_rect: Rect::default(),
            full_screen: false,
            full_screen_size: (0, 0),
            keep_aspect_ratio,
            visible: true,
            needs_resume: false,
            reached_end: false,
            error_notice_pending: false,
            buffer_percent: 0,
            duration_hint: None,
            surface_ready: false,
            player: None,
            surface,
            factory,
            signals,
            events,
        }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    /// Replaces the media source and begins opening it. Any pending seek and
    /// the known natural size belong to the old source and are discarded.
    pub fn set_source(&mut self, source: MediaSource) -> Option<VideoError> {
        debug!(widget = %self.id, source = %source, "setting media source");
        self.source = Some(source);
        self.pending_seek_ms = 0;
        self.natural_size = (0, 0);
        self.open_video()
    }

    /// Opens the current source if both a source and a ready surface exist;
    /// otherwise the open is retried when the missing piece arrives. Returns
    /// the error when the platform refuses the source.
    fn open_video(&mut self) -> Option<VideoError> {
        if !self.surface_ready {
            trace!(widget = %self.id, "open deferred until the surface is ready");
            return None;
        }
        let Some(source) = self.source.clone() else {
            trace!(widget = %self.id, "open deferred until a source is set");
            return None;
        };

        // Keep the target state: a start() may already be queued behind
        // this open.
        self.release(false);
        self.buffer_percent = 0;
        self.duration_hint = None;

        match self.factory.open(self.id, &source, self.signals.clone()) {
            Ok(player) => {
                self.player = Some(player);
                self.playback_state = PlaybackState::Preparing;
                debug!(widget = %self.id, source = %source, "preparing");
                None
            }
            Err(error) => {
                warn!(widget = %self.id, %error, "failed to open media source");
                self.playback_state = PlaybackState::Error;
                self.target_state = TargetState::Error;
                Some(error)
            }
        }
    }

    pub fn start(&mut self) {
        if self.is_in_playback_state() {
            if let Some(player) = self.player.as_mut() {
                player.start();
            }
            self.playback_state = PlaybackState::Playing;
            self.events.emit(self.id, VideoEventKind::Playing);
        }
        self.target_state = TargetState::Playing;
    }

    pub fn pause(&mut self) {
        if self.is_in_playback_state() && self.backend_is_playing() {
            if let Some(player) = self.player.as_mut() {
                player.pause();
            }
            self.playback_state = PlaybackState::Paused;
            self.events.emit(self.id, VideoEventKind::Paused);
        }
        self.target_state = TargetState::Paused;
    }

    /// Stops and releases the player. Only reported (and only effective)
    /// when playback is actually running.
    pub fn stop(&mut self) {
        if self.is_in_playback_state() && self.backend_is_playing() {
            self.stop_playback();
            self.events.emit(self.id, VideoEventKind::Stopped);
        }
    }

    /// Rewinds to the beginning and plays. No event is reported; callers
    /// treat this as a continuation, not a state change.
    pub fn restart(&mut self) {
        if self.is_in_playback_state() {
            if let Some(player) = self.player.as_mut() {
                player.seek_to(Duration::ZERO);
                player.start();
            }
            self.playback_state = PlaybackState::Playing;
            self.target_state = TargetState::Playing;
        }
    }

    /// Reopens the current source from scratch.
    pub fn resume(&mut self) -> Option<VideoError> {
        debug!(widget = %self.id, "resume requested");
        self.open_video()
    }

    /// Seeks when possible; otherwise remembers the position and applies it
    /// once the player reaches a seekable state.
    pub fn seek_to_ms(&mut self, position_ms: u32) {
        if self.is_in_playback_state() {
            trace!(widget = %self.id, position_ms, "seeking");
            if let Some(player) = self.player.as_mut() {
                player.seek_to(Duration::from_millis(u64::from(position_ms)));
            }
            self.pending_seek_ms = 0;
        } else {
            self.pending_seek_ms = position_ms;
        }
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.requested_rect = rect;
        self.fix_size();
    }

    pub fn set_full_screen(&mut self, enabled: bool, width: i32, height: i32) {
        if self.full_screen != enabled {
            self.full_screen = enabled;
            if width != 0 && height != 0 {
                self.full_screen_size = (width, height);
            }
            self.fix_size();
        }
    }

    pub fn set_keep_aspect_ratio(&mut self, keep: bool) {
        self.keep_aspect_ratio = keep;
        self.fix_size();
    }

    /// Accepted for bridge compatibility; toggling it has no effect.
    pub fn set_skip_enabled(&mut self, enabled: bool) {
        trace!(widget = %self.id, enabled, "skip toggled");
    }

    /// Hiding a playing widget records where it was so that showing it again
    /// can pick playback back up. The backend itself is not paused here; if
    /// the host also tears down the surface, `on_surface_lost` releases it.
    pub fn set_visible(&mut self, visible: bool) {
        debug!(widget = %self.id, visible, "setting visibility");
        if visible {
            self.fix_size();
            if self.needs_resume {
                self.start();
                self.needs_resume = false;
            }
            self.visible = true;
            self.surface.set_visible(true);
        } else {
            self.needs_resume = self.is_playing();
            if self.needs_resume {
                self.pending_seek_ms = self.position().as_millis() as u32;
            }
            self.visible = false;
            self.surface.set_visible(false);
        }
    }

    /// Recomputes the visible rectangle from the current bounds and natural
    /// size and pushes it to the surface.
    pub fn fix_size(&mut self) {
        let bounds = if self.full_screen {
            Rect::new(0, 0, self.full_screen_size.0, self.full_screen_size.1)
        } else {
            self.requested_rect
        };
        let visible = layout::fit_rect(self.natural_size, bounds, self.keep_aspect_ratio);
        trace!(widget = %self.id, rect = %visible, "applying surface rect");
        self.surface.apply_rect(visible);
    }

    /// The player finished opening its source.
    pub fn on_prepared(&mut self, width: i32, height: i32) {
        if self.playback_state != PlaybackState::Preparing {
            trace!(widget = %self.id, "ignoring stale prepared signal");
            return;
        }
        debug!(widget = %self.id, width, height, "prepared");
        self.playback_state = PlaybackState::Prepared;
        self.natural_size = (width, height);

        // The pending seek is consumed exactly once; seek_to_ms clears it
        // now that seeking is possible.
        let seek_to_position = self.pending_seek_ms;
        if seek_to_position != 0 {
            self.seek_to_ms(seek_to_position);
        }

        if width != 0 && height != 0 {
            self.fix_size();
        }
        if self.target_state == TargetState::Playing {
            self.start();
        }
    }

    pub fn on_video_size_changed(&mut self, width: i32, height: i32) {
        trace!(widget = %self.id, width, height, "video size changed");
        self.natural_size = (width, height);
    }

    /// Playback ran off the end: the player is released and the completion
    /// is reported. The released player leaves both states at idle, which is
    /// what lets a later `start()` trigger a fresh open-and-play cycle.
    pub fn on_completion(&mut self) {
        if self.player.is_none() {
            trace!(widget = %self.id, "ignoring stale completion signal");
            return;
        }
        debug!(widget = %self.id, "playback completed");
        self.playback_state = PlaybackState::Completed;
        self.target_state = TargetState::Completed;
        self.release(true);
        self.events.emit(self.id, VideoEventKind::Completed);
    }

    /// Moves both states to error. The player is kept around so that the
    /// position and buffer queries keep answering while the failure is
    /// being reported.
    pub fn mark_error(&mut self) {
        self.playback_state = PlaybackState::Error;
        self.target_state = TargetState::Error;
    }

    /// Asks the surface to tell the user playback failed. The host answers
    /// with `ErrorNoticeAcknowledged` once the notice is dismissed.
    pub fn show_error_notice(&mut self, error: &VideoError) {
        self.error_notice_pending = true;
        self.surface.show_error_notice(error);
    }

    /// The user dismissed the error notice. There is nobody left to handle
    /// the failure, so at least report that the video is over.
    pub fn acknowledge_error_notice(&mut self) {
        if self.error_notice_pending {
            self.error_notice_pending = false;
            self.events.emit(self.id, VideoEventKind::Completed);
        } else {
            trace!(widget = %self.id, "ignoring stray error notice acknowledgment");
        }
    }

    pub fn on_buffering_update(&mut self, percent: i32) {
        trace!(widget = %self.id, percent, "buffering");
        self.buffer_percent = percent;
    }

    /// The surface can accept a player from now on; a deferred open (source
    /// set before the surface existed) proceeds here.
    pub fn on_surface_ready(&mut self) -> Option<VideoError> {
        debug!(widget = %self.id, "surface ready");
        self.surface_ready = true;
        self.open_video()
    }

    /// The surface was resized. When the new size matches the video and the
    /// widget was interrupted mid-playback, playback picks back up from the
    /// recorded position.
    pub fn on_surface_changed(&mut self, width: i32, height: i32) {
        trace!(widget = %self.id, width, height, "surface changed");
        let valid_state = self.target_state == TargetState::Playing || !self.reached_end;
        let size_matches = self.natural_size == (width, height);
        if self.player.is_some() && valid_state && size_matches {
            if self.pending_seek_ms != 0 {
                self.seek_to_ms(self.pending_seek_ms);
            }
            self.start();
        }
    }

    /// The surface is gone. A playing widget records its position (and
    /// whether it had already reached the end) before the player is
    /// released, so a later surface can restore it.
    pub fn on_surface_lost(&mut self) {
        debug!(widget = %self.id, "surface lost");
        self.surface_ready = false;
        if self.playback_state == PlaybackState::Playing {
            let position = self.position();
            self.reached_end = self.duration().is_some_and(|d| d == position);
            self.pending_seek_ms = position.as_millis() as u32;
        }
        self.release(true);
    }

    /// Releases the player unconditionally. Called when the widget is being
    /// removed from the registry.
    pub fn shutdown(&mut self) {
        debug!(widget = %self.id, "shutting down");
        self.stop_playback();
    }

    pub fn position(&self) -> Duration {
        if !self.is_in_playback_state() {
            return Duration::ZERO;
        }
        self.player
            .as_ref()
            .map_or(Duration::ZERO, |player| player.position())
    }

    /// Total media length. Cached after the first successful answer and
    /// forgotten whenever the widget leaves a playback-capable state.
    pub fn duration(&mut self) -> Option<Duration> {
        if !self.is_in_playback_state() {
            self.duration_hint = None;
            return None;
        }
        if self.duration_hint.is_none() {
            self.duration_hint = self.player.as_ref().and_then(|player| player.duration());
        }
        self.duration_hint
    }

    pub fn is_playing(&self) -> bool {
        self.is_in_playback_state() && self.backend_is_playing()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback_state
    }

    pub fn target_state(&self) -> TargetState {
        self.target_state
    }

    /// Latest buffering report; reads zero while no player is open.
    pub fn buffer_percent(&self) -> i32 {
        if self.player.is_none() {
            return 0;
        }
        self.buffer_percent
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn has_player(&self) -> bool {
        self.player.is_some()
    }

    /// Whether control calls can act on the player right now.
    fn is_in_playback_state(&self) -> bool {
        self.player.is_some()
            && !matches!(
                self.playback_state,
                PlaybackState::Error | PlaybackState::Idle | PlaybackState::Preparing
            )
    }

    fn backend_is_playing(&self) -> bool {
        self.player
            .as_ref()
            .is_some_and(|player| player.is_playing())
    }

    /// Drops the player, falling back to idle. The target state survives
    /// unless `clear_target` is set, so an interrupted play intent can be
    /// honored after the next prepare.
    fn release(&mut self, clear_target: bool) {
        if self.player.take().is_some() {
            self.playback_state = PlaybackState::Idle;
            if clear_target {
                self.target_state = TargetState::Idle;
            }
        }
    }

    fn stop_playback(&mut self) {
        if self.player.take().is_some() {
            self.playback_state = PlaybackState::Idle;
            self.target_state = TargetState::Idle;
        }
    }
}
