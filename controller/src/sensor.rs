use thiserror::Error;

/// One temperature/humidity sample, Celsius and percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub temperature: f32,
    pub humidity: f32,
}

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("sensor read failed on channel {channel}: {reason}")]
    Read { channel: u8, reason: String },
}

/// One acquisition per poll tick. Failures are transient: the poller logs
/// them and waits for the next tick.
pub trait SensorDriver: Send {
    fn read(&mut self) -> Result<Reading, SensorError>;
}

/// Synthesizes a slow drift around room temperature, with the occasional
/// dropped read a real DHT22 produces.
///
/// Hardware integration point: replace with a DHT22 driver bound to the
/// configured sensor channel.
pub struct SimulatedSensor {
    channel: u8,
    tick: u64,
}

impl SimulatedSensor {
    pub fn new(channel: u8) -> Self {
        Self { channel, tick: 0 }
    }
}

impl SensorDriver for SimulatedSensor {
    fn read(&mut self) -> Result<Reading, SensorError> {
        self.tick = self.tick.saturating_add(1);
        if self.tick % 16 == 0 {
            return Err(SensorError::Read {
                channel: self.channel,
                reason: "checksum mismatch".to_string(),
            });
        }

        Ok(Reading {
            temperature: 20.0 + ((self.tick % 8) as f32 * 0.2),
            humidity: 42.0 + ((self.tick % 6) as f32 * 0.5),
        })
    }
}
