use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

use vidlay::{
    Config, EventSink, HeadlessFactory, HeadlessSurfaceHost, SourceKind, VideoEvent, VideoRegistry,
};

/// Prints every outbound event; stands in for the engine's callback.
struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    async fn deliver(&mut self, event: VideoEvent) {
        info!(
            widget = %event.widget,
            event = event.kind.as_str(),
            code = event.kind.bridge_code(),
            "video event"
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter("vidlay=debug")
        .init();

    info!("Starting vidlay demo");

    let config = Config::load()?;
    let factory = Arc::new(HeadlessFactory::new(&config.headless));
    let (bridge, registry, dispatcher) = VideoRegistry::new(
        factory,
        Box::new(HeadlessSurfaceHost),
        Box::new(LogSink),
        &config,
    );

    let registry_task = tokio::spawn(registry.run());
    let dispatcher_task = tokio::spawn(dispatcher.run());

    // Walk one widget through a full lifecycle against the simulated stack.
    let widget = bridge.create_widget();
    bridge.set_rect(widget, 0, 0, 1280, 720);
    bridge.set_keep_aspect_ratio(widget, true);
    bridge.set_source(widget, SourceKind::FileAsset, "assets/intro/clip.mp4");
    bridge.start(widget);

    sleep(Duration::from_millis(600)).await;
    let position = bridge.position(widget).await?;
    let duration = bridge.duration(widget).await?;
    info!(?position, ?duration, "mid-playback query");

    bridge.pause(widget);
    sleep(Duration::from_millis(200)).await;
    bridge.seek(widget, 1_000);
    bridge.start(widget);

    sleep(Duration::from_millis(300)).await;
    bridge.set_visible(widget, false);
    sleep(Duration::from_millis(100)).await;
    bridge.set_visible(widget, true);

    sleep(Duration::from_millis(300)).await;
    bridge.stop(widget);
    bridge.remove_widget(widget);

    // Dropping the bridge shuts the registry down; the dispatcher follows
    // once the last emitter is gone.
    drop(bridge);
    registry_task.await?;
    dispatcher_task.await?;

    info!("Demo finished");
    Ok(())
}
