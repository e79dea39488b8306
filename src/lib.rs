// Per-widget video playback for engine overlays: a handle-addressed registry
// owns each widget's playback state machine, marshals all control onto one
// task, and reports events back through a single ordered dispatcher.

pub mod config;
pub mod events;
pub mod player;
pub mod registry;
pub mod utils;

pub use config::Config;
pub use events::{EventDispatcher, EventSink, VideoEvent, VideoEventKind};
pub use player::{
    HeadlessFactory, HeadlessSurfaceHost, MediaSource, OverlaySurface, PlaybackState,
    PlayerBackend, PlayerFactory, Rect, SignalSender, SourceKind, SurfaceHost, TargetState,
    WidgetId, WidgetSignal,
};
pub use registry::{ErrorHandler, VideoBridge, VideoCommand, VideoRegistry};
pub use utils::VideoError;
