use crate::models::SignalLevel;
use thiserror::Error;

/// A sensor fault is fatal: the daemon cannot do its job without the
/// alarm contact, so these errors terminate the process instead of being
/// retried.
#[derive(Debug, Error)]
pub enum SensorError {
    #[cfg(feature = "gpio")]
    #[error("gpio error: {0}")]
    Gpio(#[from] rppal::gpio::Error),
    #[error("signal source failed: {0}")]
    Background(String),
}

/// The monitored hardware line.
///
/// `read` samples the current level and may be called concurrently with a
/// pending `wait_for_edge` (the re-alert cycle takes fresh reads while the
/// watcher is blocked on the next edge).
#[async_trait::async_trait]
pub trait SignalSource {
    async fn read(&self) -> Result<SignalLevel, SensorError>;

    /// Blocks until the line reports any edge. Spurious wakes are allowed;
    /// the watcher re-reads the level before acting.
    async fn wait_for_edge(&self) -> Result<(), SensorError>;
}
