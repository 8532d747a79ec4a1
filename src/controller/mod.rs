//! Input device subsystem
//!
//! Physically different hardware sits behind one [`DeviceAdapter`] capability
//! set. The input loop composes the adapters:
//!
//! ```text
//! gilrs ─────► GamepadAdapter ─┐
//!                              ├─► dispatch ─► Actuator ─► ControlStateStore
//! PointerEvent ► PointerAdapter┘   (mapping)
//! ```
//!
//! 1. [`gamepad`] - joysticks and gamepads through gilrs
//! 2. [`pointer`] - relative pointer devices fed by the windowing layer
//! 3. [`dispatch`] - component classification and command resolution
//! 4. [`input_loop`] - fixed-cadence polling thread with failure tracking

pub mod component;
pub mod dispatch;
pub mod gamepad;
pub mod input_loop;
pub mod pointer;

pub use component::{ComponentKind, ComponentSample, HatPosition, HAT_ID};
pub use gamepad::{GamepadAdapter, GamepadSettings};
pub use input_loop::{InputLoop, InputLoopHandle, InputLoopSettings};
pub use pointer::{PointerAdapter, PointerEvent, PointerSender};

use std::fmt;

/// Logical device class an adapter accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCategory {
    /// Joysticks and gamepads
    Stick,
    /// Mice and other relative pointers
    Pointer,
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceCategory::Stick => f.write_str("stick/gamepad"),
            DeviceCategory::Pointer => f.write_str("pointer"),
        }
    }
}

/// Connected device as enumerated by its adapter
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceHandle {
    /// Adapter-local identifier, stable while the device stays plugged in
    pub id: usize,
    /// Name used to look up the device mapping
    pub name: String,
}

impl DeviceHandle {
    pub fn new(id: usize, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' (#{})", self.name, self.id)
    }
}

/// Non-fatal device conditions. None of these stop a loop.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("No {0} device connected, continuing with trim-only controls")]
    Unavailable(DeviceCategory),

    #[error("Device {device} stopped responding: {reason}")]
    PollFailure { device: DeviceHandle, reason: String },

    #[error("Failed to initialize {category} input: {reason}")]
    Initialization {
        category: DeviceCategory,
        reason: String,
    },
}

impl DeviceError {
    pub fn poll_failure(device: &DeviceHandle, reason: impl Into<String>) -> Self {
        DeviceError::PollFailure {
            device: device.clone(),
            reason: reason.into(),
        }
    }
}

/// One class of input hardware
///
/// The input loop calls [`connected_devices`](Self::connected_devices) once per
/// cycle, then [`poll`](Self::poll) and
/// [`active_components`](Self::active_components) for every device it knows,
/// including devices that have since disappeared. Polling a device that is no
/// longer connected must fail rather than report stale samples.
pub trait DeviceAdapter: Send + fmt::Debug {
    fn category(&self) -> DeviceCategory;

    /// Devices currently connected; may pump pending host events
    fn connected_devices(&mut self) -> Vec<DeviceHandle>;

    /// Refreshes the device's component readings
    fn poll(&mut self, device: &DeviceHandle) -> Result<(), DeviceError>;

    /// Readings captured by the last successful poll
    fn active_components(
        &self,
        device: &DeviceHandle,
    ) -> Box<dyn Iterator<Item = ComponentSample> + '_>;
}
