use std::{sync::Arc, time::Duration};

use tracing::warn;

use crate::{
    relay::RelayError,
    sensor::{Reading, SensorDriver},
    service::ThermostatService,
};

// DHT22 operating envelope; anything outside is a bad read, not weather.
const MIN_PLAUSIBLE_TEMP: f32 = -40.0;
const MAX_PLAUSIBLE_TEMP: f32 = 80.0;

/// Acquires one reading per interval and forwards it to the service.
///
/// Carries no decision logic; it only decouples acquisition cadence from the
/// controller. Read failures skip the tick and leave state untouched.
pub struct SensorPoller<D: SensorDriver> {
    driver: D,
    service: Arc<ThermostatService>,
    interval: Duration,
}

impl<D: SensorDriver> SensorPoller<D> {
    pub fn new(driver: D, service: Arc<ThermostatService>, interval: Duration) -> Self {
        Self {
            driver,
            service,
            interval,
        }
    }

    pub async fn run(mut self) -> Result<(), RelayError> {
        let mut interval = tokio::time::interval(self.interval);
        loop {
            interval.tick().await;
            self.poll_once()?;
        }
    }

    /// One acquisition attempt. Only a hardware-relay failure is an error;
    /// sensor trouble is logged and the tick skipped.
    pub fn poll_once(&mut self) -> Result<(), RelayError> {
        match self.driver.read() {
            Ok(reading) if plausible(&reading) => {
                self.service.on_reading(reading.temperature, reading.humidity)
            }
            Ok(reading) => {
                warn!(
                    temperature = reading.temperature,
                    humidity = reading.humidity,
                    "discarding implausible sensor reading"
                );
                Ok(())
            }
            Err(err) => {
                warn!("sensor read failed, skipping tick: {err}");
                Ok(())
            }
        }
    }
}

fn plausible(reading: &Reading) -> bool {
    reading.temperature.is_finite()
        && reading.humidity.is_finite()
        && (MIN_PLAUSIBLE_TEMP..=MAX_PLAUSIBLE_TEMP).contains(&reading.temperature)
        && (0.0..=100.0).contains(&reading.humidity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::SimulatedRelay;
    use crate::sensor::SensorError;
    use pi_thermostat_common::{TargetMode, ThermostatConfig};

    struct ScriptedSensor {
        script: Vec<Result<Reading, SensorError>>,
    }

    impl SensorDriver for ScriptedSensor {
        fn read(&mut self) -> Result<Reading, SensorError> {
            self.script.remove(0)
        }
    }

    fn service() -> Arc<ThermostatService> {
        let config = ThermostatConfig::default();
        let relay = SimulatedRelay::open(&config).unwrap();
        Arc::new(ThermostatService::new(config, Box::new(relay)).unwrap())
    }

    fn poller(service: Arc<ThermostatService>, script: Vec<Result<Reading, SensorError>>) -> SensorPoller<ScriptedSensor> {
        SensorPoller::new(
            ScriptedSensor { script },
            service,
            Duration::from_millis(10_000),
        )
    }

    #[test]
    fn successful_reading_reaches_the_controller() {
        let service = service();
        let mut poller = poller(
            service.clone(),
            vec![Ok(Reading {
                temperature: 19.5,
                humidity: 40.0,
            })],
        );

        poller.poll_once().unwrap();
        assert_eq!(service.current_temperature(), 19.5);
        assert_eq!(service.current_humidity(), 40.0);
    }

    #[test]
    fn failed_read_skips_the_tick_and_keeps_state() {
        let service = service();
        service.set_target_temperature(22.0).unwrap();
        service.set_target_mode(TargetMode::Heat).unwrap();
        let before_temp = service.current_temperature();
        let before_mode = service.current_mode();

        let mut poller = poller(
            service.clone(),
            vec![
                Err(SensorError::Read {
                    channel: 4,
                    reason: "checksum mismatch".to_string(),
                }),
                Ok(Reading {
                    temperature: 23.5,
                    humidity: 41.0,
                }),
            ],
        );

        poller.poll_once().unwrap();
        assert_eq!(service.current_temperature(), before_temp);
        assert_eq!(service.current_mode(), before_mode);

        // Next tick recovers on its own.
        poller.poll_once().unwrap();
        assert_eq!(service.current_temperature(), 23.5);
    }

    #[test]
    fn implausible_readings_are_discarded() {
        let service = service();
        let mut poller = poller(
            service.clone(),
            vec![
                Ok(Reading {
                    temperature: f32::NAN,
                    humidity: 40.0,
                }),
                Ok(Reading {
                    temperature: 120.0,
                    humidity: 40.0,
                }),
                Ok(Reading {
                    temperature: 20.0,
                    humidity: 140.0,
                }),
            ],
        );

        for _ in 0..3 {
            poller.poll_once().unwrap();
        }
        // Cold-start value survives every bad sample.
        assert_eq!(service.current_temperature(), 21.0);
    }
}
