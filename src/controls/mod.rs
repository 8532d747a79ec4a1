//! Control channels, their shared state and the actuator that writes it
//!
//! ```text
//! Command + sample ──► Actuator ──► ControlStateStore ──► snapshot (integrator)
//!                         │                ▲
//!                         └── channel bounds (registry)
//! ```

pub mod actuator;
pub mod channel;
pub mod shaping;
pub mod state;

pub use actuator::{Actuator, ActuatorSettings, Edge, EdgeLatch, TrimState, PRESSED, RELEASED};
pub use channel::{ChannelClass, ControlChannel, RateClass};
pub use state::{ControlState, ControlStateReader, ControlStateStore};
