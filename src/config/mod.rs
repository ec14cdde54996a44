pub mod settings;

pub use settings::{CliOverrides, Settings};
