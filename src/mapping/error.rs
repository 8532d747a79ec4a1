//! Error definitions for configuration and mapping construction

use thiserror::Error;

/// Fatal startup errors: the pipeline must not start with an inconsistent mapping
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A mapping or initial condition names a channel that does not exist
    #[error("Unknown control channel: {0}")]
    UnknownChannel(String),

    /// A button or hat mapping names a command that does not exist
    #[error("Unknown key command: {0}")]
    UnknownCommand(String),

    /// An axis mapping names a shaping function that does not exist
    #[error("Unknown shaping function: {0}")]
    UnknownShaping(String),

    /// Button keys must be decimal component indices
    #[error("Invalid button index '{key}' for device '{device}'")]
    InvalidButton { device: String, key: String },

    #[error("Invalid hat position '{key}' for device '{device}'")]
    InvalidHatPosition { device: String, key: String },

    /// Axes drive continuous channels only
    #[error("Axis '{axis}' of device '{device}' is bound to discrete channel {channel}")]
    DiscreteAxis {
        device: String,
        axis: String,
        channel: String,
    },

    #[error("Device '{0}' is mapped more than once")]
    DuplicateDevice(String),

    #[error("Invalid setting {name}: {reason}")]
    InvalidSetting { name: String, reason: String },

    #[error("Failed to read configuration file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),
}
