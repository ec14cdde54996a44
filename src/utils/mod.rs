pub mod duration;
pub mod error;
pub mod logging;
pub mod string_utils;

pub use duration::parse_duration;
pub use error::*;
pub use string_utils::preview;
