use thiserror::Error;

/// Input-validation errors surfaced at the property boundary.
///
/// A rejected write leaves the previous state in place; nothing here is
/// recoverable into a partial update.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Target temperature outside the configured [min_temp, max_temp] range.
    #[error("target temperature {actual} is out of range [{min}, {max}]")]
    TargetOutOfRange { min: f32, max: f32, actual: f32 },

    /// Threshold write that would break `heating_threshold < cooling_threshold`.
    #[error("heating threshold {heating} must stay below cooling threshold {cooling}")]
    ThresholdOrder { heating: f32, cooling: f32 },

    /// NaN or infinite temperature value.
    #[error("temperature value {0} is not finite")]
    NonFinite(f32),

    /// Numeric mode value with no enum counterpart.
    #[error("invalid mode value {0}")]
    InvalidModeValue(u8),

    /// Numeric display-units value with no enum counterpart.
    #[error("invalid display units value {0}")]
    InvalidUnitsValue(u8),
}

/// Configuration errors; fatal at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be greater than zero")]
    ZeroInterval { name: &'static str },

    #[error("min_temp must be below max_temp")]
    TemperatureBounds,

    #[error("relay channels must be distinct (fan/heat/cool)")]
    DuplicateChannel,
}
