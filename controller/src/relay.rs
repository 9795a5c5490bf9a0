use pi_thermostat_common::{RelayChannel, RelayLevel, ThermostatConfig};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to open relay output on pin {pin}: {reason}")]
    Open { pin: u8, reason: String },

    #[error("failed to write relay output on pin {pin}: {reason}")]
    Write { pin: u8, reason: String },
}

/// Logical channel → GPIO pin map, built once from configuration and owned
/// by the relay implementation.
#[derive(Debug, Clone, Copy)]
pub struct ChannelPins {
    fan: u8,
    heat: u8,
    cool: u8,
}

impl ChannelPins {
    pub fn new(config: &ThermostatConfig) -> Self {
        Self {
            fan: config.fan_channel,
            heat: config.heat_channel,
            cool: config.cool_channel,
        }
    }

    pub fn pin(&self, channel: RelayChannel) -> u8 {
        match channel {
            RelayChannel::Fan => self.fan,
            RelayChannel::Heat => self.heat,
            RelayChannel::Cool => self.cool,
        }
    }
}

/// The hardware output boundary. A write failure means the physical state is
/// unknown, so callers must treat it as fatal rather than retry.
pub trait HardwareRelay: Send {
    fn set_output(&mut self, channel: RelayChannel, level: RelayLevel) -> Result<(), RelayError>;
}

/// Stand-in for the GPIO relay board: tracks levels per channel and logs
/// transitions. A real board plugs in behind [`HardwareRelay`].
pub struct SimulatedRelay {
    pins: ChannelPins,
    levels: [(RelayChannel, RelayLevel); 3],
}

impl SimulatedRelay {
    pub fn open(config: &ThermostatConfig) -> Result<Self, RelayError> {
        let pins = ChannelPins::new(config);
        // A pin can only be claimed once.
        if pins.fan == pins.heat || pins.fan == pins.cool || pins.heat == pins.cool {
            return Err(RelayError::Open {
                pin: pins.heat,
                reason: "pin claimed by more than one channel".to_string(),
            });
        }

        Ok(Self {
            pins,
            levels: [
                (RelayChannel::Fan, RelayLevel::Off),
                (RelayChannel::Heat, RelayLevel::Off),
                (RelayChannel::Cool, RelayLevel::Off),
            ],
        })
    }

    pub fn level(&self, channel: RelayChannel) -> RelayLevel {
        self.levels
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, level)| *level)
            .unwrap_or(RelayLevel::Off)
    }
}

impl HardwareRelay for SimulatedRelay {
    fn set_output(&mut self, channel: RelayChannel, level: RelayLevel) -> Result<(), RelayError> {
        if self.level(channel) != level {
            info!(
                channel = channel.as_str(),
                pin = self.pins.pin(channel),
                level = ?level,
                "relay output"
            );
        }
        for slot in &mut self.levels {
            if slot.0 == channel {
                slot.1 = level;
            }
        }
        Ok(())
    }
}
