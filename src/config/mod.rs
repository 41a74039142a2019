//! Configuration: TOML file plus built-in defaults.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{Config, DemoSettings, LoaderSettings, Target};
