use minus80_agent::{
    config::EscalationTimings,
    directory::CsvDirectory,
    engine::EscalationEngine,
    mailer::{DeliveryError, Mailer},
    models::SignalLevel,
    service,
    signal::{SensorError, SignalSource},
    watcher::Watcher,
};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::time::timeout;

/// Signal source replaying scripted reads and a fixed number of edge wakes,
/// then parking forever.
struct ScriptedSignal {
    reads: Mutex<VecDeque<SignalLevel>>,
    fallback: SignalLevel,
    edges: Mutex<u32>,
}

impl ScriptedSignal {
    fn new(reads: Vec<SignalLevel>, fallback: SignalLevel, edges: u32) -> Self {
        Self {
            reads: Mutex::new(reads.into()),
            fallback,
            edges: Mutex::new(edges),
        }
    }
}

#[async_trait::async_trait]
impl SignalSource for ScriptedSignal {
    async fn read(&self) -> Result<SignalLevel, SensorError> {
        let mut reads = self
            .reads
            .lock()
            .map_err(|error| SensorError::Background(error.to_string()))?;
        Ok(reads.pop_front().unwrap_or(self.fallback))
    }

    async fn wait_for_edge(&self) -> Result<(), SensorError> {
        {
            let mut edges = self
                .edges
                .lock()
                .map_err(|error| SensorError::Background(error.to_string()))?;
            if *edges > 0 {
                *edges -= 1;
                return Ok(());
            }
        }
        std::future::pending().await
    }
}

struct FaultySignal;

#[async_trait::async_trait]
impl SignalSource for FaultySignal {
    async fn read(&self) -> Result<SignalLevel, SensorError> {
        Err(SensorError::Background("alarm contact unreadable".to_owned()))
    }

    async fn wait_for_edge(&self) -> Result<(), SensorError> {
        Err(SensorError::Background("alarm contact unreadable".to_owned()))
    }
}

#[derive(Clone, Default)]
struct MockMailer {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockMailer {
    fn sent(&self) -> Vec<(String, String)> {
        match self.sent.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait::async_trait]
impl Mailer for MockMailer {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        _body: &str,
    ) -> Result<(), DeliveryError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|error| DeliveryError::Transport(error.to_string()))?;
        sent.push((recipient.to_owned(), subject.to_owned()));
        Ok(())
    }
}

fn roster() -> Option<NamedTempFile> {
    let mut file = match NamedTempFile::new() {
        Ok(file) => file,
        Err(_) => return None,
    };
    if file
        .write_all(b"IP,Location,Email\n10.0.0.5,LGRT 3,x@y.edu\n")
        .is_err()
    {
        return None;
    }
    Some(file)
}

fn test_timings() -> EscalationTimings {
    EscalationTimings {
        realert_step: Duration::from_secs(10),
        alarm_window: Duration::from_secs(60),
        it_retry_interval: Duration::from_secs(300),
    }
}

#[tokio::test(start_paused = true)]
async fn startup_alarm_flows_through_to_one_primary_notification() {
    let file = match roster() {
        Some(file) => file,
        None => return,
    };

    // Already alarmed at startup; the first fresh re-alert read recovers.
    let source = Arc::new(ScriptedSignal::new(
        vec![SignalLevel::High],
        SignalLevel::Low,
        0,
    ));
    let mailer = MockMailer::default();

    let watcher = Watcher::new(Arc::clone(&source), Duration::from_millis(5));
    let engine = Arc::new(EscalationEngine::new(
        source,
        CsvDirectory::new(file.path()),
        mailer.clone(),
        "10.0.0.5".to_owned(),
        "it@y.edu".to_owned(),
        test_timings(),
    ));

    // The service runs forever on a healthy source; give the flows time to
    // finish and then inspect what was sent.
    let ran = timeout(Duration::from_secs(120), service::run(watcher, engine)).await;
    assert!(ran.is_err());

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    let (recipient, subject) = match sent.first() {
        Some(mail) => mail.clone(),
        None => return,
    };
    assert_eq!(recipient, "x@y.edu");
    assert!(subject.starts_with("!!! -80 ALARM !!!"));
    assert!(subject.ends_with("in LGRT 3"));
}

#[tokio::test(start_paused = true)]
async fn alarm_then_recovery_produces_both_notifications() {
    let file = match roster() {
        Some(file) => file,
        None => return,
    };

    // Initial High, then one edge whose settled level is Low.
    let source = Arc::new(ScriptedSignal::new(
        vec![SignalLevel::High, SignalLevel::Low],
        SignalLevel::Low,
        1,
    ));
    let mailer = MockMailer::default();

    let watcher = Watcher::new(Arc::clone(&source), Duration::from_millis(5));
    let engine = Arc::new(EscalationEngine::new(
        source,
        CsvDirectory::new(file.path()),
        mailer.clone(),
        "10.0.0.5".to_owned(),
        "it@y.edu".to_owned(),
        test_timings(),
    ));

    let ran = timeout(Duration::from_secs(120), service::run(watcher, engine)).await;
    assert!(ran.is_err());

    let sent = mailer.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|(recipient, _)| recipient == "x@y.edu"));
    assert!(
        sent.iter()
            .any(|(_, subject)| subject.starts_with("!!! -80 ALARM !!!"))
    );
    assert!(
        sent.iter()
            .any(|(_, subject)| subject.starts_with("!!! -80 RECOVERY !!!"))
    );
}

#[tokio::test(start_paused = true)]
async fn sensor_fault_terminates_the_service() {
    let file = match roster() {
        Some(file) => file,
        None => return,
    };

    let source = Arc::new(FaultySignal);
    let mailer = MockMailer::default();

    let watcher = Watcher::new(Arc::clone(&source), Duration::from_millis(5));
    let engine = Arc::new(EscalationEngine::new(
        source,
        CsvDirectory::new(file.path()),
        mailer.clone(),
        "10.0.0.5".to_owned(),
        "it@y.edu".to_owned(),
        test_timings(),
    ));

    let ran = timeout(Duration::from_secs(5), service::run(watcher, engine)).await;
    assert!(ran.is_ok());
    if let Ok(result) = ran {
        assert!(result.is_err());
    }

    assert!(mailer.sent().is_empty());
}
