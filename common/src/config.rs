use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Everything the daemon accepts from its JSON config file.
///
/// Channel numbers are raw GPIO pin identifiers; the defaults are the wiring
/// of the original Raspberry Pi build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermostatConfig {
    pub name: String,
    pub fan_channel: u8,
    pub heat_channel: u8,
    pub cool_channel: u8,
    pub sensor_channel: u8,
    pub minimum_on_off_time_ms: u64,
    pub temperature_check_interval_ms: u64,
    pub min_temp: f32,
    pub max_temp: f32,
}

impl Default for ThermostatConfig {
    fn default() -> Self {
        Self {
            name: "Thermostat".to_string(),
            fan_channel: 26,
            heat_channel: 27,
            cool_channel: 28,
            sensor_channel: 4,
            minimum_on_off_time_ms: 60_000,
            temperature_check_interval_ms: 10_000,
            min_temp: 0.0,
            max_temp: 30.0,
        }
    }
}

impl ThermostatConfig {
    /// Rejects configurations the controller cannot safely run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.minimum_on_off_time_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                name: "minimum_on_off_time_ms",
            });
        }
        if self.temperature_check_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                name: "temperature_check_interval_ms",
            });
        }
        if self.min_temp >= self.max_temp {
            return Err(ConfigError::TemperatureBounds);
        }
        if self.fan_channel == self.heat_channel
            || self.fan_channel == self.cool_channel
            || self.heat_channel == self.cool_channel
        {
            return Err(ConfigError::DuplicateChannel);
        }
        Ok(())
    }
}
