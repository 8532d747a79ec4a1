//! Stick/gamepad adapter over gilrs
//!
//! Components reported per device:
//! - axes `x`, `y` (left stick), `rx`, `ry` (right stick), `z`, `rz` (analog triggers)
//! - buttons `0`.. in the order of [`BUTTON_ORDER`]
//! - the `pov` hat, synthesized from the d-pad

use crate::controller::component::{ComponentSample, HatPosition};
use crate::controller::{DeviceAdapter, DeviceCategory, DeviceError, DeviceHandle};
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, info, warn};

/// Button numbering used in device mappings
pub const BUTTON_ORDER: [Button; 15] = [
    Button::South,
    Button::East,
    Button::North,
    Button::West,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::Mode,
    Button::C,
    Button::Z,
    Button::LeftTrigger2,
    Button::RightTrigger2,
];

#[derive(Clone, Debug)]
pub struct GamepadSettings {
    pub joystick_deadzone: f32,
}

impl Default for GamepadSettings {
    fn default() -> Self {
        Self {
            joystick_deadzone: 0.05,
        }
    }
}

#[derive(Debug)]
pub struct GamepadAdapter {
    gilrs: Gilrs,
    settings: GamepadSettings,
    // handle id -> gilrs id, for every gamepad seen this session
    known: BTreeMap<usize, GamepadId>,
    readings: HashMap<usize, Vec<ComponentSample>>,
}

impl GamepadAdapter {
    pub fn create(settings: GamepadSettings) -> Result<Self, DeviceError> {
        info!("Initializing gilrs controller interface");
        let gilrs = Gilrs::new().map_err(|e| {
            error!("Failed to initialize gilrs: {}", e);
            DeviceError::Initialization {
                category: DeviceCategory::Stick,
                reason: e.to_string(),
            }
        })?;
        info!(
            "Gamepad adapter ready, deadzone {}",
            settings.joystick_deadzone
        );

        Ok(Self {
            gilrs,
            settings,
            known: BTreeMap::new(),
            readings: HashMap::new(),
        })
    }

    /// Drains pending gilrs events so connection state and button data are current
    fn pump_events(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => {
                    let name = self.gilrs.gamepad(id).name().to_string();
                    info!("Gamepad connected: {} ({})", name, id);
                    self.known.insert(usize::from(id), id);
                }
                EventType::Disconnected => {
                    warn!("Gamepad disconnected: {}", id);
                }
                _ => {}
            }
        }
    }

    fn sample_gamepad(&self, gamepad: &Gamepad<'_>) -> Vec<ComponentSample> {
        let deadzone = self.settings.joystick_deadzone;
        let stick = |axis: Axis| apply_deadzone(gamepad.value(axis), deadzone);
        let trigger = |button: Button| {
            let value = gamepad
                .button_data(button)
                .map(|data| data.value())
                .unwrap_or(0.0);
            apply_deadzone(value, deadzone)
        };

        let mut samples = Vec::with_capacity(6 + BUTTON_ORDER.len() + 1);
        samples.push(ComponentSample::axis("x", stick(Axis::LeftStickX)));
        // gilrs reports stick up as positive; forward is negative here
        samples.push(ComponentSample::axis("y", -stick(Axis::LeftStickY)));
        samples.push(ComponentSample::axis("rx", stick(Axis::RightStickX)));
        samples.push(ComponentSample::axis("ry", -stick(Axis::RightStickY)));
        samples.push(ComponentSample::axis("z", trigger(Button::LeftTrigger2)));
        samples.push(ComponentSample::axis("rz", trigger(Button::RightTrigger2)));

        for (index, button) in (0u16..).zip(BUTTON_ORDER) {
            samples.push(ComponentSample::button(index, gamepad.is_pressed(button)));
        }

        samples.push(ComponentSample::hat(HatPosition::from_directions(
            gamepad.is_pressed(Button::DPadUp),
            gamepad.is_pressed(Button::DPadDown),
            gamepad.is_pressed(Button::DPadLeft),
            gamepad.is_pressed(Button::DPadRight),
        )));
        samples
    }
}

impl DeviceAdapter for GamepadAdapter {
    fn category(&self) -> DeviceCategory {
        DeviceCategory::Stick
    }

    fn connected_devices(&mut self) -> Vec<DeviceHandle> {
        self.pump_events();

        let mut devices = Vec::new();
        for (id, gamepad) in self.gilrs.gamepads() {
            self.known.insert(usize::from(id), id);
            devices.push(DeviceHandle::new(usize::from(id), gamepad.name()));
        }
        devices
    }

    fn poll(&mut self, device: &DeviceHandle) -> Result<(), DeviceError> {
        self.pump_events();

        let Some(id) = self.known.get(&device.id).copied() else {
            return Err(DeviceError::poll_failure(device, "unknown gamepad"));
        };
        let Some(gamepad) = self.gilrs.connected_gamepad(id) else {
            self.readings.remove(&device.id);
            return Err(DeviceError::poll_failure(device, "gamepad disconnected"));
        };

        let samples = self.sample_gamepad(&gamepad);
        debug!("Polled {} components from {}", samples.len(), device);
        self.readings.insert(device.id, samples);
        Ok(())
    }

    fn active_components(
        &self,
        device: &DeviceHandle,
    ) -> Box<dyn Iterator<Item = ComponentSample> + '_> {
        match self.readings.get(&device.id) {
            Some(samples) => Box::new(samples.iter().cloned()),
            None => Box::new(std::iter::empty()),
        }
    }
}

/// Zeroes readings inside the deadzone and rescales the rest to keep full travel
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        value.signum() * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}
