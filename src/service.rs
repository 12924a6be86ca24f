use crate::directory::SiteDirectory;
use crate::engine::EscalationEngine;
use crate::mailer::Mailer;
use crate::signal::{SensorError, SignalSource};
use crate::watcher::Watcher;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Wires the watcher to the escalation engine and runs until the signal
/// source faults. Each transition spawns its own flow task, so a flow stuck
/// in a re-alert cycle or the IT retry loop never delays detection of the
/// next transition.
pub async fn run<S, D, M>(
    watcher: Watcher<S>,
    engine: Arc<EscalationEngine<S, D, M>>,
) -> Result<(), SensorError>
where
    S: SignalSource + Send + Sync + 'static,
    D: SiteDirectory + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let (events, mut transitions) = mpsc::channel(8);
    let watcher_task = tokio::spawn(watcher.run(events));

    while let Some(transition) = transitions.recv().await {
        info!(level = ?transition.level, "spawning escalation flow");
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine.run_flow(transition).await;
        });
    }

    // The sender is gone, so the watcher loop has ended; surface its result.
    match watcher_task.await {
        Ok(result) => result,
        Err(join_error) => Err(SensorError::Background(join_error.to_string())),
    }
}
