pub mod mocks;

use mocks::{ChannelSink, MockFactory, MockPlayerSession, MockSurfaceHost, MockSurfaceSession};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use vidlay::{
    Config, ErrorHandler, VideoBridge, VideoEvent, VideoEventKind, VideoRegistry, WidgetId,
};

/// A registry plus dispatcher running on mock platform pieces, with handles
/// for driving commands and observing what the platform side saw.
pub struct TestHarness {
    pub bridge: VideoBridge,
    pub factory: MockFactory,
    pub host: MockSurfaceHost,
    events: mpsc::UnboundedReceiver<VideoEvent>,
    _registry: JoinHandle<()>,
    _dispatcher: JoinHandle<()>,
}

impl TestHarness {
    pub fn spawn() -> Self {
        Self::build(Config::default(), None)
    }

    pub fn spawn_with_config(config: Config) -> Self {
        Self::build(config, None)
    }

    pub fn spawn_with_error_handler(handler: ErrorHandler) -> Self {
        Self::build(Config::default(), Some(handler))
    }

    fn build(config: Config, handler: Option<ErrorHandler>) -> Self {
        let factory = MockFactory::default();
        let host = MockSurfaceHost::default();
        let (sink, events) = ChannelSink::new();
        let (bridge, mut registry, dispatcher) = VideoRegistry::new(
            Arc::new(factory.clone()),
            Box::new(host.clone()),
            sink,
            &config,
        );
        if let Some(handler) = handler {
            registry.set_error_handler(handler);
        }
        let registry_task = tokio::spawn(registry.run());
        let dispatcher_task = tokio::spawn(dispatcher.run());

        Self {
            bridge,
            factory,
            host,
            events,
            _registry: registry_task,
            _dispatcher: dispatcher_task,
        }
    }

    /// Waits until the registry has processed every command sent so far,
    /// along with any feedback those commands produced. Works because the
    /// control loop drains feedback before answering a later query.
    pub async fn flush(&self) {
        let _ = self
            .bridge
            .widget_count()
            .await
            .expect("video registry stopped");
    }

    /// The recorded player open at `index`, once the registry is caught up.
    pub async fn player_session(&self, index: usize) -> MockPlayerSession {
        self.flush().await;
        self.factory.session(index)
    }

    /// The recorded surface at `index`, once the registry is caught up.
    pub async fn surface_session(&self, index: usize) -> MockSurfaceSession {
        self.flush().await;
        self.host.session(index)
    }

    pub async fn next_event(&mut self) -> VideoEvent {
        tokio::time::timeout(Duration::from_secs(2), self.events.recv())
            .await
            .expect("Timed out waiting for video event")
            .expect("Event dispatcher shut down")
    }

    pub async fn expect_event(&mut self, widget: WidgetId, kind: VideoEventKind) {
        let event = self.next_event().await;
        assert_eq!(event.widget, widget, "event for wrong widget: {:?}", event);
        assert_eq!(event.kind, kind, "unexpected event kind: {:?}", event);
    }

    /// Asserts nothing has been dispatched beyond what the test consumed.
    pub async fn assert_no_events(&mut self) {
        self.flush().await;
        tokio::task::yield_now().await;
        assert!(
            self.events.try_recv().is_err(),
            "expected no further video events"
        );
    }
}
