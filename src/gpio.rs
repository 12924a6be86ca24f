use crate::models::SignalLevel;
use crate::signal::{SensorError, SignalSource};
use rppal::gpio::{Gpio, InputPin, Level, Trigger};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task;

/// How long one blocking `poll_interrupt` call may hold the pin lock. The
/// edge wait loops over these slices so concurrent level reads from the
/// re-alert cycle get a turn at the lock in between.
const EDGE_POLL_SLICE: Duration = Duration::from_millis(250);

/// Raspberry Pi alarm contact, wired active-high with the internal pull-up
/// (the original deployment used physical pin 11, BCM 17).
#[derive(Debug, Clone)]
pub struct GpioSignalSource {
    pin: Arc<Mutex<InputPin>>,
}

impl GpioSignalSource {
    pub fn new(bcm_pin: u8) -> Result<Self, SensorError> {
        let gpio = Gpio::new()?;
        let mut pin = gpio.get(bcm_pin)?.into_input_pullup();
        // Hardware debounce stays off; the watcher settles bounce itself.
        pin.set_interrupt(Trigger::Both, None)?;
        Ok(Self {
            pin: Arc::new(Mutex::new(pin)),
        })
    }
}

fn level_of(level: Level) -> SignalLevel {
    match level {
        Level::High => SignalLevel::High,
        Level::Low => SignalLevel::Low,
    }
}

#[async_trait::async_trait]
impl SignalSource for GpioSignalSource {
    async fn read(&self) -> Result<SignalLevel, SensorError> {
        let pin = Arc::clone(&self.pin);
        task::spawn_blocking(move || {
            let guard = pin
                .lock()
                .map_err(|error| SensorError::Background(error.to_string()))?;
            Ok(level_of(guard.read()))
        })
        .await
        .map_err(|error| SensorError::Background(error.to_string()))?
    }

    async fn wait_for_edge(&self) -> Result<(), SensorError> {
        let pin = Arc::clone(&self.pin);
        task::spawn_blocking(move || {
            loop {
                let mut guard = pin
                    .lock()
                    .map_err(|error| SensorError::Background(error.to_string()))?;
                if guard.poll_interrupt(true, Some(EDGE_POLL_SLICE))?.is_some() {
                    return Ok(());
                }
                drop(guard);
            }
        })
        .await
        .map_err(|error| SensorError::Background(error.to_string()))?
    }
}
