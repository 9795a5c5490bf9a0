pub mod config;
pub mod error;
pub mod thermostat;
pub mod types;

pub use config::ThermostatConfig;
pub use error::{ConfigError, Error};
pub use thermostat::ThermostatEngine;
pub use types::{
    CurrentMode, DisplayUnits, RelayChannel, RelayCommand, RelayLevel, TargetMode,
    ThermostatStatus,
};
