pub mod config;
pub mod directory;
pub mod engine;
#[cfg(feature = "gpio")]
pub mod gpio;
pub mod mailer;
pub mod models;
pub mod service;
pub mod signal;
pub mod watcher;
