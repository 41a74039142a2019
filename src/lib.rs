pub mod cards;
pub mod config;
pub mod loader;
pub mod logging;
pub mod mvi;
