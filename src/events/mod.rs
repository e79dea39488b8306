pub mod sink;
pub mod types;

pub use sink::{EventDispatcher, EventEmitter, EventSink};
pub use types::{VideoEvent, VideoEventKind};
