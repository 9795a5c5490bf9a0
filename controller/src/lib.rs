pub mod host;
pub mod poller;
pub mod relay;
pub mod sensor;
pub mod service;

pub use poller::SensorPoller;
pub use relay::{ChannelPins, HardwareRelay, RelayError, SimulatedRelay};
pub use sensor::{Reading, SensorDriver, SensorError, SimulatedSensor};
pub use service::{ServiceError, ThermostatService};
