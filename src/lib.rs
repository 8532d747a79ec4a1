//! Flight-control input and actuation pipeline.
//!
//! Raw samples from joysticks, gamepads and pointers are resolved through a
//! per-device mapping table into commands, turned into bounded and
//! rate-limited channel values by the actuator, and published as whole-vector
//! snapshots for the dynamics integrator.

pub mod config;
pub mod controller;
pub mod controls;
pub mod mapping;
pub mod simulation;

pub use config::Config;
pub use controls::{Actuator, ActuatorSettings, ControlChannel, ControlState, ControlStateStore};
pub use mapping::{Command, ConfigError, DeviceMappingTable};
pub use simulation::{Integrator, PipelineError, PipelineHandle, SimulationError};
