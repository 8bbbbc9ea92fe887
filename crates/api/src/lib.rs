//! Quack tool surface: request validation, response shaping, and the HTTP
//! binding used by the `quack` binary.

pub mod app;
pub mod config;
pub mod tools;

pub use config::Config;
pub use tools::QuackTools;
