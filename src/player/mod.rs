pub mod headless;
pub mod layout;
pub mod traits;
pub mod types;
pub mod widget;

pub use headless::{HeadlessFactory, HeadlessPlayer, HeadlessSurfaceHost};
pub use traits::{
    OverlaySurface, PlayerBackend, PlayerFactory, SignalSender, SurfaceHost, WidgetSignal,
};
pub use types::{MediaSource, PlaybackState, Rect, SourceKind, TargetState, WidgetId};
pub use widget::VideoWidget;
