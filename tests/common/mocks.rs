use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use vidlay::{
    EventSink, MediaSource, OverlaySurface, PlayerBackend, PlayerFactory, Rect, SignalSender,
    SurfaceHost, VideoError, VideoEvent, WidgetId, WidgetSignal,
};

/// Event sink that forwards every delivered event into a channel the test
/// side holds, preserving dispatch order.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<VideoEvent>,
}

impl ChannelSink {
    pub fn new() -> (Box<dyn EventSink>, mpsc::UnboundedReceiver<VideoEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Box::new(Self { tx }), rx)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn deliver(&mut self, event: VideoEvent) {
        let _ = self.tx.send(event);
    }
}

/// Observable state of a single mock player instance.
#[derive(Default)]
pub struct PlayerProbe {
    starts: AtomicUsize,
    pauses: AtomicUsize,
    seeks: Mutex<Vec<Duration>>,
    playing: AtomicBool,
    position: Mutex<Duration>,
    duration: Mutex<Option<Duration>>,
    released: AtomicBool,
}

impl PlayerProbe {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.seeks.lock().unwrap().clone()
    }

    pub fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub fn set_position(&self, position: Duration) {
        *self.position.lock().unwrap() = position;
    }

    pub fn set_duration(&self, duration: Duration) {
        *self.duration.lock().unwrap() = Some(duration);
    }
}

/// Everything the factory captured for one `open` call. The stored
/// `SignalSender` lets tests play the platform role and report preparation,
/// completion, or errors back into the registry.
#[derive(Clone)]
pub struct MockPlayerSession {
    pub widget: WidgetId,
    pub source: MediaSource,
    pub probe: Arc<PlayerProbe>,
    pub signals: SignalSender,
}

#[derive(Default)]
struct MockFactoryState {
    fail_next: AtomicBool,
    sessions: Mutex<Vec<MockPlayerSession>>,
}

/// Player factory that records every open and hands back probe-backed
/// players. Clones share state, so the harness can keep one copy while the
/// registry owns another.
#[derive(Clone, Default)]
pub struct MockFactory {
    state: Arc<MockFactoryState>,
}

impl MockFactory {
    /// Makes the next `open` call fail with a source error.
    pub fn fail_next(&self) {
        self.state.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn opens(&self) -> usize {
        self.state.sessions.lock().unwrap().len()
    }

    pub fn session(&self, index: usize) -> MockPlayerSession {
        self.state.sessions.lock().unwrap()[index].clone()
    }
}

impl PlayerFactory for MockFactory {
    fn open(
        &self,
        widget: WidgetId,
        source: &MediaSource,
        signals: SignalSender,
    ) -> Result<Box<dyn PlayerBackend>, VideoError> {
        if self.state.fail_next.swap(false, Ordering::SeqCst) {
            return Err(VideoError::SourceOpen(source.location().to_string()));
        }
        let probe = Arc::new(PlayerProbe::default());
        self.state.sessions.lock().unwrap().push(MockPlayerSession {
            widget,
            source: source.clone(),
            probe: probe.clone(),
            signals,
        });
        Ok(Box::new(MockPlayer { probe }))
    }
}

struct MockPlayer {
    probe: Arc<PlayerProbe>,
}

impl PlayerBackend for MockPlayer {
    fn start(&mut self) {
        self.probe.starts.fetch_add(1, Ordering::SeqCst);
        self.probe.playing.store(true, Ordering::SeqCst);
    }

    fn pause(&mut self) {
        self.probe.pauses.fetch_add(1, Ordering::SeqCst);
        self.probe.playing.store(false, Ordering::SeqCst);
    }

    fn seek_to(&mut self, position: Duration) {
        self.probe.seeks.lock().unwrap().push(position);
        *self.probe.position.lock().unwrap() = position;
    }

    fn position(&self) -> Duration {
        *self.probe.position.lock().unwrap()
    }

    fn duration(&self) -> Option<Duration> {
        *self.probe.duration.lock().unwrap()
    }

    fn is_playing(&self) -> bool {
        self.probe.playing.load(Ordering::SeqCst)
    }
}

impl Drop for MockPlayer {
    fn drop(&mut self) {
        self.probe.released.store(true, Ordering::SeqCst);
        self.probe.playing.store(false, Ordering::SeqCst);
    }
}

/// Observable state of a single mock overlay surface.
#[derive(Default)]
pub struct SurfaceProbe {
    rects: Mutex<Vec<Rect>>,
    visibility: Mutex<Vec<bool>>,
    notices: Mutex<Vec<VideoError>>,
    dropped: AtomicBool,
}

impl SurfaceProbe {
    pub fn rects(&self) -> Vec<Rect> {
        self.rects.lock().unwrap().clone()
    }

    pub fn last_rect(&self) -> Option<Rect> {
        self.rects.lock().unwrap().last().copied()
    }

    pub fn visibility(&self) -> Vec<bool> {
        self.visibility.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<VideoError> {
        self.notices.lock().unwrap().clone()
    }

    pub fn dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }
}

/// Captured state for one `create_surface` call, signal channel included so
/// tests can report surface lifecycle transitions themselves.
#[derive(Clone)]
pub struct MockSurfaceSession {
    pub widget: WidgetId,
    pub probe: Arc<SurfaceProbe>,
    pub signals: SignalSender,
}

struct MockHostState {
    auto_ready: AtomicBool,
    sessions: Mutex<Vec<MockSurfaceSession>>,
}

impl Default for MockHostState {
    fn default() -> Self {
        Self {
            auto_ready: AtomicBool::new(true),
            sessions: Mutex::new(Vec::new()),
        }
    }
}

/// Surface host that records every created surface. By default each surface
/// reports ready immediately, matching a platform view that is already
/// attached; `set_auto_ready(false)` lets a test drive that transition.
#[derive(Clone, Default)]
pub struct MockSurfaceHost {
    state: Arc<MockHostState>,
}

impl MockSurfaceHost {
    pub fn set_auto_ready(&self, auto_ready: bool) {
        self.state.auto_ready.store(auto_ready, Ordering::SeqCst);
    }

    pub fn session(&self, index: usize) -> MockSurfaceSession {
        self.state.sessions.lock().unwrap()[index].clone()
    }
}

impl SurfaceHost for MockSurfaceHost {
    fn create_surface(
        &mut self,
        widget: WidgetId,
        signals: SignalSender,
    ) -> Box<dyn OverlaySurface> {
        let probe = Arc::new(SurfaceProbe::default());
        if self.state.auto_ready.load(Ordering::SeqCst) {
            signals.send(WidgetSignal::SurfaceReady);
        }
        self.state.sessions.lock().unwrap().push(MockSurfaceSession {
            widget,
            probe: probe.clone(),
            signals,
        });
        Box::new(MockSurface { probe })
    }
}

struct MockSurface {
    probe: Arc<SurfaceProbe>,
}

impl OverlaySurface for MockSurface {
    fn apply_rect(&mut self, rect: Rect) {
        self.probe.rects.lock().unwrap().push(rect);
    }

    fn set_visible(&mut self, visible: bool) {
        self.probe.visibility.lock().unwrap().push(visible);
    }

    fn show_error_notice(&mut self, error: &VideoError) {
        self.probe.notices.lock().unwrap().push(error.clone());
    }
}

impl Drop for MockSurface {
    fn drop(&mut self) {
        self.probe.dropped.store(true, Ordering::SeqCst);
    }
}
