use std::{
    sync::OnceLock,
    time::Instant,
};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;

use pi_thermostat_common::{
    CurrentMode, DisplayUnits, RelayChannel, RelayCommand, RelayLevel, TargetMode,
    ThermostatConfig, ThermostatEngine, ThermostatStatus,
};

use crate::relay::{HardwareRelay, RelayError};

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Rejected at the property boundary; prior state retained.
    #[error(transparent)]
    Invalid(#[from] pi_thermostat_common::Error),

    /// Hardware write failed; fatal, the unit cannot operate blind.
    #[error(transparent)]
    Relay(#[from] RelayError),
}

struct Inner {
    engine: ThermostatEngine,
    relay: Box<dyn HardwareRelay>,
}

/// Mutex-guarded engine plus relay: the synchronous getter/setter surface a
/// property-exposure layer adapts to its remote protocol.
///
/// Every operation runs the engine and applies the resulting commands inside
/// one critical section, so evaluations, deferred-stop firings, and hardware
/// writes are serialized.
pub struct ThermostatService {
    name: String,
    inner: Mutex<Inner>,
}

impl ThermostatService {
    /// Drives every channel Off before the first evaluation, the same way
    /// the relay pins open LOW on the original board. A failure here is
    /// fatal: without working outputs the unit cannot safely run.
    pub fn new(config: ThermostatConfig, mut relay: Box<dyn HardwareRelay>) -> Result<Self, RelayError> {
        for channel in [RelayChannel::Fan, RelayChannel::Heat, RelayChannel::Cool] {
            relay.set_output(channel, RelayLevel::Off)?;
        }

        Ok(Self {
            name: config.name.clone(),
            inner: Mutex::new(Inner {
                engine: ThermostatEngine::new(config),
                relay,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_mode(&self) -> CurrentMode {
        self.inner.lock().engine.current_mode()
    }

    pub fn target_mode(&self) -> TargetMode {
        self.inner.lock().engine.target_mode()
    }

    pub fn current_temperature(&self) -> f32 {
        self.inner.lock().engine.current_temperature()
    }

    pub fn current_humidity(&self) -> f32 {
        self.inner.lock().engine.current_humidity()
    }

    pub fn target_temperature(&self) -> f32 {
        self.inner.lock().engine.target_temperature()
    }

    pub fn heating_threshold(&self) -> f32 {
        self.inner.lock().engine.heating_threshold()
    }

    pub fn cooling_threshold(&self) -> f32 {
        self.inner.lock().engine.cooling_threshold()
    }

    pub fn display_units(&self) -> DisplayUnits {
        self.inner.lock().engine.display_units()
    }

    pub fn set_display_units(&self, units: DisplayUnits) {
        self.inner.lock().engine.set_display_units(units);
    }

    pub fn status(&self) -> ThermostatStatus {
        self.inner.lock().engine.status(monotonic_ms())
    }

    pub fn on_reading(&self, temperature: f32, humidity: f32) -> Result<(), RelayError> {
        let mut inner = self.inner.lock();
        let commands = inner.engine.on_reading(temperature, humidity, monotonic_ms());
        apply(&mut inner, commands)
    }

    pub fn set_target_mode(&self, mode: TargetMode) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock();
        info!(mode = mode.as_str(), "target mode change");
        let commands = inner.engine.set_target_mode(mode, monotonic_ms());
        apply(&mut inner, commands)?;
        Ok(())
    }

    pub fn set_target_temperature(&self, value: f32) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock();
        info!(value, "target temperature change");
        let commands = inner.engine.set_target_temperature(value, monotonic_ms())?;
        apply(&mut inner, commands)?;
        Ok(())
    }

    pub fn set_heating_threshold(&self, value: f32) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock();
        let commands = inner.engine.set_heating_threshold(value, monotonic_ms())?;
        apply(&mut inner, commands)?;
        Ok(())
    }

    pub fn set_cooling_threshold(&self, value: f32) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock();
        let commands = inner.engine.set_cooling_threshold(value, monotonic_ms())?;
        apply(&mut inner, commands)?;
        Ok(())
    }

    /// Fires the deferred stop once its deadline passes; called from the
    /// daemon tick loop so the firing is serialized with evaluations.
    pub fn tick(&self) -> Result<(), RelayError> {
        let mut inner = self.inner.lock();
        let commands = inner.engine.tick(monotonic_ms());
        apply(&mut inner, commands)
    }

    /// Shutdown path: every channel Off, regardless of engine state.
    pub fn all_off(&self) -> Result<(), RelayError> {
        let mut inner = self.inner.lock();
        for channel in [RelayChannel::Fan, RelayChannel::Heat, RelayChannel::Cool] {
            inner.relay.set_output(channel, RelayLevel::Off)?;
        }
        Ok(())
    }
}

fn apply(inner: &mut Inner, commands: Vec<RelayCommand>) -> Result<(), RelayError> {
    for command in commands {
        info!(
            channel = command.channel.as_str(),
            level = ?command.level,
            "relay transition"
        );
        inner.relay.set_output(command.channel, command.level)?;
    }
    Ok(())
}

pub fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START
        .get_or_init(Instant::now)
        .elapsed()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};

    /// Records writes; optionally fails after a number of successful ones.
    struct RecordingRelay {
        writes: Arc<StdMutex<Vec<(RelayChannel, RelayLevel)>>>,
        fail_after: Option<usize>,
    }

    impl HardwareRelay for RecordingRelay {
        fn set_output(&mut self, channel: RelayChannel, level: RelayLevel) -> Result<(), RelayError> {
            let mut writes = self.writes.lock().unwrap();
            if let Some(limit) = self.fail_after {
                if writes.len() >= limit {
                    return Err(RelayError::Write {
                        pin: 0,
                        reason: "simulated failure".to_string(),
                    });
                }
            }
            writes.push((channel, level));
            Ok(())
        }
    }

    fn service_with_relay(
        fail_after: Option<usize>,
    ) -> (ThermostatService, Arc<StdMutex<Vec<(RelayChannel, RelayLevel)>>>) {
        let writes = Arc::new(StdMutex::new(Vec::new()));
        let relay = RecordingRelay {
            writes: writes.clone(),
            fail_after,
        };
        let service = ThermostatService::new(ThermostatConfig::default(), Box::new(relay)).unwrap();
        (service, writes)
    }

    #[test]
    fn construction_drives_all_channels_off() {
        let (_service, writes) = service_with_relay(None);
        assert_eq!(
            *writes.lock().unwrap(),
            vec![
                (RelayChannel::Fan, RelayLevel::Off),
                (RelayChannel::Heat, RelayLevel::Off),
                (RelayChannel::Cool, RelayLevel::Off),
            ]
        );
    }

    #[test]
    fn construction_fails_when_outputs_cannot_be_opened() {
        let writes = Arc::new(StdMutex::new(Vec::new()));
        let relay = RecordingRelay {
            writes,
            fail_after: Some(1),
        };
        assert!(ThermostatService::new(ThermostatConfig::default(), Box::new(relay)).is_err());
    }

    #[test]
    fn accessor_surface_round_trips() {
        let (service, writes) = service_with_relay(None);

        service.on_reading(20.0, 45.0).unwrap();
        service.set_target_temperature(22.0).unwrap();
        service.set_target_mode(TargetMode::Heat).unwrap();
        service.set_display_units(DisplayUnits::Fahrenheit);

        assert_eq!(service.current_mode(), CurrentMode::Heating);
        assert_eq!(service.target_mode(), TargetMode::Heat);
        assert_eq!(service.current_temperature(), 20.0);
        assert_eq!(service.current_humidity(), 45.0);
        assert_eq!(service.target_temperature(), 22.0);
        assert_eq!(service.display_units(), DisplayUnits::Fahrenheit);
        assert_eq!(service.name(), "Thermostat");

        // Startup all-off plus exactly one heat-on transition.
        assert_eq!(
            writes.lock().unwrap().last(),
            Some(&(RelayChannel::Heat, RelayLevel::On))
        );
        assert_eq!(writes.lock().unwrap().len(), 4);
    }

    #[test]
    fn invalid_setpoint_is_rejected_without_hardware_writes() {
        let (service, writes) = service_with_relay(None);
        let before = writes.lock().unwrap().len();

        assert!(matches!(
            service.set_target_temperature(42.0),
            Err(ServiceError::Invalid(_))
        ));
        assert!(matches!(
            service.set_heating_threshold(30.0),
            Err(ServiceError::Invalid(_))
        ));
        assert_eq!(writes.lock().unwrap().len(), before);
        assert_eq!(service.target_temperature(), 21.0);
    }

    #[test]
    fn relay_write_failure_is_surfaced() {
        // Allow the three startup writes, then fail the activation write.
        let (service, _writes) = service_with_relay(Some(3));
        service.on_reading(18.0, 45.0).unwrap();

        let result = service.set_target_mode(TargetMode::Heat);
        assert!(matches!(result, Err(ServiceError::Relay(_))));
    }
}
