use crate::models::{SignalLevel, TransitionEvent};
use crate::signal::{SensorError, SignalSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info};

/// Watches the alarm contact and emits one [`TransitionEvent`] per genuine
/// stable level change. Contact bounce is settled by sleeping a short
/// debounce window after each edge and re-reading before comparing against
/// the last stable level.
pub struct Watcher<S> {
    source: Arc<S>,
    debounce: Duration,
}

impl<S: SignalSource> Watcher<S> {
    pub fn new(source: Arc<S>, debounce: Duration) -> Self {
        Self { source, debounce }
    }

    /// Runs until the signal source faults (fatal) or the receiver side of
    /// `events` is dropped (shutdown). The watcher is the only task that
    /// suspends on the edge wait; it holds the single "last stable level"
    /// cell as a local.
    pub async fn run(
        self,
        events: mpsc::Sender<TransitionEvent>,
    ) -> Result<(), SensorError> {
        let mut last_stable = self.source.read().await?;
        info!(level = ?last_stable, "initial signal level");

        // A process restart during an ongoing alarm must re-raise it.
        if last_stable == SignalLevel::High
            && events
                .send(TransitionEvent::now(SignalLevel::High))
                .await
                .is_err()
        {
            return Ok(());
        }

        loop {
            debug!("monitoring for signal edges");
            self.source.wait_for_edge().await?;

            time::sleep(self.debounce).await;

            let level = self.source.read().await?;
            if level == last_stable {
                // Bounce or spurious wake; the settled level never changed.
                continue;
            }

            last_stable = level;
            info!(level = ?level, "stable signal level changed");
            if events.send(TransitionEvent::now(level)).await.is_err() {
                return Ok(());
            }
        }
    }
}
