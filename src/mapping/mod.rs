//! Translation of raw device components into logical flight-control commands.
//!
//! The [`DeviceMappingTable`] is built from configuration at startup and is
//! immutable afterwards. Construction fails with a [`ConfigError`] when a
//! mapping names a channel, command or component that does not exist.

pub mod command;
pub mod error;
pub mod table;

pub use command::{AxisCommand, Command, KeyAction, KeyCommand, Shaping};
pub use error::ConfigError;
pub use table::{ComponentKey, DeviceMapping, DeviceMappingTable, WILDCARD_DEVICE};
