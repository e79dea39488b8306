use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::types::{VideoEvent, VideoEventKind};
use crate::player::types::WidgetId;

/// Destination for outbound events. The embedding engine registers exactly
/// one sink; delivery order matches emission order for each widget.
#[async_trait]
pub trait EventSink: Send {
    async fn deliver(&mut self, event: VideoEvent);
}

/// Cloneable producer half handed to widgets. Emission never blocks; if the
/// dispatcher is gone the event is dropped with a warning.
#[derive(Clone)]
pub struct EventEmitter {
    tx: mpsc::UnboundedSender<VideoEvent>,
}

impl EventEmitter {
    pub(crate) fn new(tx: mpsc::UnboundedSender<VideoEvent>) -> Self {
        Self { tx }
    }

    pub fn emit(&self, widget: WidgetId, kind: VideoEventKind) {
        trace!(widget = %widget, event = kind.as_str(), "emitting video event");
        if self.tx.send(VideoEvent::new(widget, kind)).is_err() {
            warn!(widget = %widget, event = kind.as_str(), "event dispatcher is gone, dropping event");
        }
    }
}

/// Drains emitted events on its own task and forwards them to the sink one
/// at a time, which preserves per-widget ordering end to end.
pub struct EventDispatcher {
    rx: mpsc::UnboundedReceiver<VideoEvent>,
    sink: Box<dyn EventSink>,
}

impl EventDispatcher {
    pub fn new(sink: Box<dyn EventSink>) -> (EventEmitter, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EventEmitter::new(tx), Self { rx, sink })
    }

    /// Runs until every emitter has been dropped and the queue is drained.
    pub async fn run(mut self) {
        debug!("event dispatcher started");
        while let Some(event) = self.rx.recv().await {
            self.sink.deliver(event).await;
        }
        debug!("event dispatcher stopped");
    }
}
