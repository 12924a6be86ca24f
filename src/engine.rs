use crate::config::EscalationTimings;
use crate::directory::SiteDirectory;
use crate::mailer::Mailer;
use crate::models::{AlarmEvent, EventStatus, SignalLevel, SiteRecord, TransitionEvent};
use crate::signal::SignalSource;
use std::sync::Arc;
use tokio::time::{self, Instant};
use tracing::{error, info};

/// Drives the full notification lifecycle for one stable signal transition:
/// roster lookup, primary notification, escalation to IT on failure, an
/// unbounded IT retry loop if the mail path itself is down, and the bounded
/// re-alert cycle while an alarm persists.
///
/// One engine is shared across flows behind an `Arc`; each flow owns its own
/// [`AlarmEvent`] and never touches another flow's state.
pub struct EscalationEngine<S, D, M> {
    source: Arc<S>,
    directory: D,
    mailer: M,
    site_key: String,
    it_recipient: String,
    timings: EscalationTimings,
}

impl<S, D, M> EscalationEngine<S, D, M>
where
    S: SignalSource + Send + Sync,
    D: SiteDirectory + Send + Sync,
    M: Mailer + Send + Sync,
{
    pub fn new(
        source: Arc<S>,
        directory: D,
        mailer: M,
        site_key: String,
        it_recipient: String,
        timings: EscalationTimings,
    ) -> Self {
        Self {
            source,
            directory,
            mailer,
            site_key,
            it_recipient,
            timings,
        }
    }

    /// Runs one escalation flow to completion. Never returns an error: every
    /// failure is either recovered by escalation or held in the IT retry
    /// loop until delivery succeeds.
    pub async fn run_flow(&self, transition: TransitionEvent) {
        let event = AlarmEvent::from(transition);
        info!(status = %event.status, "escalation flow started");

        let record = match self.directory.resolve(&self.site_key) {
            Ok(Some(record)) => record,
            Ok(None) => {
                let description = format!("No roster entry for site {}", self.site_key);
                let details = description.clone();
                self.handle_failure(&event, &details, description).await;
                return;
            }
            Err(lookup_error) => {
                self.handle_failure(
                    &event,
                    &lookup_error.to_string(),
                    "Failed to parse freezer roster".to_owned(),
                )
                .await;
                return;
            }
        };
        info!(location = %record.location, recipient = %record.recipient, "resolved roster entry");

        let delivered = self.notify_site(&event, &record).await;
        if delivered && event.status == EventStatus::Alarm {
            self.realert_cycle(&event, &record).await;
        }

        info!(status = %event.status, "escalation flow finished");
    }

    /// One primary notification attempt with its full failure branching.
    /// Returns whether the primary message was delivered.
    async fn notify_site(&self, event: &AlarmEvent, record: &SiteRecord) -> bool {
        let (subject, body) = site_message(event, &record.location);
        match self.mailer.send(&record.recipient, &subject, &body).await {
            Ok(()) => {
                info!(recipient = %record.recipient, "email sent");
                true
            }
            Err(delivery_error) => {
                let description = format!("Failure to email {}", record.recipient);
                self.handle_failure(event, &delivery_error.to_string(), description)
                    .await;
                false
            }
        }
    }

    /// Logs the failure with full detail, then alerts IT. If even the IT
    /// message cannot be delivered, falls into the unbounded retry loop.
    async fn handle_failure(&self, event: &AlarmEvent, details: &str, mut description: String) {
        error!("{description}");
        error!(details = %details, "failure details");

        let subject = format!("!!! -80 ALERT !!! {description}");
        let body = it_message_body(event, &description);

        match self.mailer.send(&self.it_recipient, &subject, &body).await {
            Ok(()) => {
                info!(recipient = %self.it_recipient, "email sent");
            }
            Err(delivery_error) => {
                description.push_str(" AND email IT team");
                error!("{description}");
                error!(
                    interval_secs = self.timings.it_retry_interval.as_secs(),
                    details = %delivery_error,
                    "attempting to email IT team until successful"
                );
                // The augmented description becomes the subject for every
                // retry, so IT sees the compounded failure at a glance.
                self.retry_it_forever(&description, &body).await;
            }
        }
    }

    /// Reattempts the same IT message at a fixed interval until it goes
    /// through. The only exit is success; a broken mail path keeps this
    /// flow alive by design without blocking any other task.
    async fn retry_it_forever(&self, subject: &str, body: &str) {
        let mut failure_count: u64 = 0;
        loop {
            time::sleep(self.timings.it_retry_interval).await;
            match self.mailer.send(&self.it_recipient, subject, body).await {
                Ok(()) => {
                    info!(recipient = %self.it_recipient, "email sent");
                    return;
                }
                Err(delivery_error) => {
                    failure_count += 1;
                    error!(
                        failure_count,
                        recipient = %self.it_recipient,
                        details = %delivery_error,
                        "failed to send email to IT team"
                    );
                }
            }
        }
    }

    /// While the alarm persists, re-send the primary notification every
    /// `realert_step` for up to `alarm_window`. Each tick takes a fresh read
    /// of the raw line rather than trusting this flow's cached status; a
    /// fresh `Low` ends the cycle immediately.
    async fn realert_cycle(&self, event: &AlarmEvent, record: &SiteRecord) {
        info!(
            window_secs = self.timings.alarm_window.as_secs(),
            step_secs = self.timings.realert_step.as_secs(),
            "alarm active, starting re-alert cycle"
        );

        let deadline = Instant::now() + self.timings.alarm_window;
        let mut alarm_cycle: u32 = 0;

        while Instant::now() < deadline {
            time::sleep(self.timings.realert_step).await;

            match self.source.read().await {
                Ok(SignalLevel::High) => {
                    alarm_cycle += 1;
                    info!(alarm_cycle, "alarm still active, re-sending notification");
                    // A failed re-send escalates on its own; the cycle
                    // keeps going either way.
                    self.notify_site(event, record).await;
                }
                Ok(SignalLevel::Low) => {
                    info!("alarm state recovered during re-alert cycle");
                    break;
                }
                Err(sensor_error) => {
                    // The watcher's own edge wait surfaces the same fault
                    // fatally; this flow just stops nagging.
                    error!(details = %sensor_error, "fresh signal read failed, ending re-alert cycle");
                    break;
                }
            }
        }

        info!(alarm_cycle, "re-alert cycle finished");
    }
}

fn site_message(event: &AlarmEvent, location: &str) -> (String, String) {
    let date = event.event_time.format("%m/%d/%Y");
    let time = event.event_time.format("%H:%M:%S");
    match event.status {
        EventStatus::Alarm => (
            format!("!!! -80 ALARM !!! Problem detected on {date} at {time} in {location}"),
            format!(
                "ALARM event detected on {date} at {time}. \nThere is a problem with the -80 in {location}."
            ),
        ),
        EventStatus::Recovery => (
            format!("!!! -80 RECOVERY !!! Recovery detected on {date} at {time} in {location}"),
            format!("RECOVERY event detected on {date} at {time} for minus 80 in {location}."),
        ),
    }
}

fn it_message_body(event: &AlarmEvent, description: &str) -> String {
    format!(
        "Minus 80 alarm status: {}. \nEvent time: {}\nError: {}.\nCheck syslog for further error details.",
        event.status,
        event.event_time.format("%d/%m/%Y %H:%M:%S"),
        description
    )
}
