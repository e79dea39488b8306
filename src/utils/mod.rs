pub mod errors;

pub use errors::VideoError;
