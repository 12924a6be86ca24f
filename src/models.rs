use chrono::{DateTime, Local};
use std::fmt;

/// Level of the monitored alarm contact. The line is wired with a pull-up,
/// so `High` means the alarm is active and `Low` means recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalLevel {
    Low,
    High,
}

/// A confirmed stable level change, created by the watcher after the
/// debounce window and consumed by exactly one escalation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEvent {
    pub at: DateTime<Local>,
    pub level: SignalLevel,
}

impl TransitionEvent {
    pub fn now(level: SignalLevel) -> Self {
        Self {
            at: Local::now(),
            level,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Alarm,
    Recovery,
}

impl From<SignalLevel> for EventStatus {
    fn from(level: SignalLevel) -> Self {
        match level {
            SignalLevel::High => EventStatus::Alarm,
            SignalLevel::Low => EventStatus::Recovery,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Alarm => write!(f, "ALARM"),
            EventStatus::Recovery => write!(f, "RECOVERY"),
        }
    }
}

/// One alarm or recovery event. Owned by a single escalation flow for its
/// whole lifetime, which may span the full re-alert window.
#[derive(Debug, Clone)]
pub struct AlarmEvent {
    pub event_time: DateTime<Local>,
    pub status: EventStatus,
}

impl From<TransitionEvent> for AlarmEvent {
    fn from(transition: TransitionEvent) -> Self {
        Self {
            event_time: transition.at,
            status: transition.level.into(),
        }
    }
}

/// Roster entry for the monitored freezer, resolved once per event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRecord {
    pub location: String,
    pub recipient: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_derives_from_level() {
        assert_eq!(EventStatus::from(SignalLevel::High), EventStatus::Alarm);
        assert_eq!(EventStatus::from(SignalLevel::Low), EventStatus::Recovery);
    }

    #[test]
    fn status_displays_wire_words() {
        assert_eq!(EventStatus::Alarm.to_string(), "ALARM");
        assert_eq!(EventStatus::Recovery.to_string(), "RECOVERY");
    }
}
