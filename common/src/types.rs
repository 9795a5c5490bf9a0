use serde::{Deserialize, Serialize};

use crate::error::Error;

/// What the unit is physically doing right now.
///
/// Numeric values match the accessory characteristic encoding
/// (OFF=0, HEAT=1, COOL=2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrentMode {
    Off,
    Heating,
    Cooling,
}

impl CurrentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Heating => "HEATING",
            Self::Cooling => "COOLING",
        }
    }

    pub fn value(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Heating => 1,
            Self::Cooling => 2,
        }
    }

    pub fn from_value(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::Heating),
            2 => Ok(Self::Cooling),
            other => Err(Error::InvalidModeValue(other)),
        }
    }

    /// The relay channel that drives this mode. `None` while off.
    pub fn channel(self) -> Option<RelayChannel> {
        match self {
            Self::Off => None,
            Self::Heating => Some(RelayChannel::Heat),
            Self::Cooling => Some(RelayChannel::Cool),
        }
    }
}

/// What the user asked for (OFF=0, HEAT=1, COOL=2, AUTO=3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetMode {
    Off,
    Heat,
    Cool,
    Auto,
}

impl TargetMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Heat => "HEAT",
            Self::Cool => "COOL",
            Self::Auto => "AUTO",
        }
    }

    pub fn value(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Heat => 1,
            Self::Cool => 2,
            Self::Auto => 3,
        }
    }

    pub fn from_value(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::Heat),
            2 => Ok(Self::Cool),
            3 => Ok(Self::Auto),
            other => Err(Error::InvalidModeValue(other)),
        }
    }
}

/// Display units are stored and surfaced but never enter the control logic
/// (CELSIUS=0, FAHRENHEIT=1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DisplayUnits {
    Celsius,
    Fahrenheit,
}

impl DisplayUnits {
    pub fn value(self) -> u8 {
        match self {
            Self::Celsius => 0,
            Self::Fahrenheit => 1,
        }
    }

    pub fn from_value(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(Self::Celsius),
            1 => Ok(Self::Fahrenheit),
            other => Err(Error::InvalidUnitsValue(other)),
        }
    }
}

/// Logical hardware output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelayChannel {
    Fan,
    Heat,
    Cool,
}

impl RelayChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fan => "FAN",
            Self::Heat => "HEAT",
            Self::Cool => "COOL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelayLevel {
    Off,
    On,
}

/// One hardware write the engine asks its caller to perform.
///
/// The engine mutates its own state and returns these; the host applies them
/// to the relay in order. A command is only ever emitted on an actual
/// activate/deactivate transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayCommand {
    pub channel: RelayChannel,
    pub level: RelayLevel,
}

impl RelayCommand {
    pub fn on(channel: RelayChannel) -> Self {
        Self {
            channel,
            level: RelayLevel::On,
        }
    }

    pub fn off(channel: RelayChannel) -> Self {
        Self {
            channel,
            level: RelayLevel::Off,
        }
    }
}

/// Serializable snapshot of the engine, logged periodically by the daemon.
#[derive(Debug, Clone, Serialize)]
pub struct ThermostatStatus {
    #[serde(rename = "currentTemp")]
    pub current_temperature: f32,
    #[serde(rename = "currentHumidity")]
    pub current_humidity: f32,
    #[serde(rename = "targetTemp")]
    pub target_temperature: f32,
    #[serde(rename = "heatingThreshold")]
    pub heating_threshold: f32,
    #[serde(rename = "coolingThreshold")]
    pub cooling_threshold: f32,
    pub mode: &'static str,
    #[serde(rename = "targetMode")]
    pub target_mode: &'static str,
    pub units: u8,
    #[serde(rename = "runningMs")]
    pub running_ms: u64,
    #[serde(rename = "stopPending")]
    pub stop_pending: bool,
    #[serde(rename = "stopRemainingMs")]
    pub stop_remaining_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mode_values_match_characteristic_encoding() {
        assert_eq!(CurrentMode::Off.value(), 0);
        assert_eq!(CurrentMode::Heating.value(), 1);
        assert_eq!(CurrentMode::Cooling.value(), 2);
        assert_eq!(TargetMode::Auto.value(), 3);

        assert_eq!(TargetMode::from_value(3).unwrap(), TargetMode::Auto);
        assert_eq!(CurrentMode::from_value(2).unwrap(), CurrentMode::Cooling);
        assert!(CurrentMode::from_value(3).is_err());
        assert!(TargetMode::from_value(4).is_err());
        assert!(DisplayUnits::from_value(2).is_err());
    }

    #[test]
    fn current_mode_maps_to_its_channel() {
        assert_eq!(CurrentMode::Heating.channel(), Some(RelayChannel::Heat));
        assert_eq!(CurrentMode::Cooling.channel(), Some(RelayChannel::Cool));
        assert_eq!(CurrentMode::Off.channel(), None);
    }

    #[test]
    fn status_serializes_with_accessory_field_names() {
        let status = ThermostatStatus {
            current_temperature: 20.5,
            current_humidity: 50.0,
            target_temperature: 22.0,
            heating_threshold: 18.0,
            cooling_threshold: 24.0,
            mode: "HEATING",
            target_mode: "HEAT",
            units: 0,
            running_ms: 1_000,
            stop_pending: false,
            stop_remaining_ms: 0,
        };

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["currentTemp"], 20.5);
        assert_eq!(json["targetMode"], "HEAT");
        assert_eq!(json["stopPending"], false);
    }
}
