use std::{env, num::ParseIntError, path::PathBuf, time::Duration};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub site_key: String,
    pub roster_path: PathBuf,
    pub sender: String,
    pub smtp_relay: String,
    pub smtp_password: String,
    pub it_recipient: String,
    pub gpio_pin: u8,
    pub debounce: Duration,
    pub timings: EscalationTimings,
}

/// Fixed intervals driving the escalation engine. Defaults are the
/// production values: re-alert every 10 minutes inside a 1 hour window,
/// retry the IT path every 5 minutes.
#[derive(Debug, Clone, Copy)]
pub struct EscalationTimings {
    pub realert_step: Duration,
    pub alarm_window: Duration,
    pub it_retry_interval: Duration,
}

impl Default for EscalationTimings {
    fn default() -> Self {
        Self {
            realert_step: Duration::from_secs(DEFAULT_REALERT_STEP_SECONDS),
            alarm_window: Duration::from_secs(DEFAULT_ALARM_WINDOW_SECONDS),
            it_retry_interval: Duration::from_secs(DEFAULT_IT_RETRY_SECONDS),
        }
    }
}

pub const DEFAULT_DEBOUNCE_MS: u64 = 5;
pub const DEFAULT_REALERT_STEP_SECONDS: u64 = 600;
pub const DEFAULT_ALARM_WINDOW_SECONDS: u64 = 3600;
pub const DEFAULT_IT_RETRY_SECONDS: u64 = 300;
pub const DEFAULT_GPIO_PIN: u8 = 17;
pub const DEFAULT_ROSTER_PATH: &str = "/home/pi/minus80/app/freezer_info.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing env var: {0}")]
    MissingEnv(String),
    #[error("invalid integer in env var {name}: {source}")]
    InvalidInteger { name: String, source: ParseIntError },
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let site_key = read_required("MINUS80_SITE_KEY")?;
        let roster_path = PathBuf::from(
            env::var("MINUS80_ROSTER_PATH").unwrap_or_else(|_| DEFAULT_ROSTER_PATH.to_owned()),
        );
        let sender = read_required("MINUS80_SENDER")?;
        let smtp_relay = read_required("MINUS80_SMTP_RELAY")?;
        let smtp_password = read_required("MINUS80_SMTP_PASSWORD")?;
        let it_recipient = read_required("MINUS80_IT_EMAIL")?;

        let gpio_pin = read_u8_or("MINUS80_GPIO_PIN", DEFAULT_GPIO_PIN)?;
        let debounce_ms = read_u64_or("MINUS80_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS)?;
        let realert_step = read_u64_or("MINUS80_REALERT_STEP_SECONDS", DEFAULT_REALERT_STEP_SECONDS)?;
        let alarm_window = read_u64_or("MINUS80_ALARM_WINDOW_SECONDS", DEFAULT_ALARM_WINDOW_SECONDS)?;
        let it_retry = read_u64_or("MINUS80_IT_RETRY_SECONDS", DEFAULT_IT_RETRY_SECONDS)?;

        Ok(Self {
            site_key,
            roster_path,
            sender,
            smtp_relay,
            smtp_password,
            it_recipient,
            gpio_pin,
            debounce: Duration::from_millis(debounce_ms),
            timings: EscalationTimings {
                realert_step: Duration::from_secs(realert_step),
                alarm_window: Duration::from_secs(alarm_window),
                it_retry_interval: Duration::from_secs(it_retry),
            },
        })
    }
}

fn read_required(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingEnv(name.to_owned()))
}

fn read_u64_or(name: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse::<u64>().map_err(|source| ConfigError::InvalidInteger {
            name: name.to_owned(),
            source,
        }),
        Err(_) => Ok(default),
    }
}

fn read_u8_or(name: &str, default: u8) -> Result<u8, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse::<u8>().map_err(|source| ConfigError::InvalidInteger {
            name: name.to_owned(),
            source,
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timings_are_production_values() {
        let timings = EscalationTimings::default();
        assert_eq!(timings.realert_step, Duration::from_secs(600));
        assert_eq!(timings.alarm_window, Duration::from_secs(3600));
        assert_eq!(timings.it_retry_interval, Duration::from_secs(300));
    }
}
