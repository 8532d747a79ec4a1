//! Device mapping table
//!
//! Built once from the `[[devices]]` configuration entries and read-only
//! afterwards. Lookups that miss return `None`: unmapped devices and components
//! are ignored so a mapping may cover only part of a device.

use crate::config::{AxisBinding, DeviceMappingConfig};
use crate::controller::component::HatPosition;
use crate::controls::channel::ControlChannel;
use crate::mapping::command::{AxisCommand, Command, KeyCommand, Shaping};
use crate::mapping::error::ConfigError;
use std::collections::HashMap;
use tracing::debug;

/// Device name matching any device without an exact entry
pub const WILDCARD_DEVICE: &str = "*";

/// Component identifier as seen by the mapping table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKey<'a> {
    Axis(&'a str),
    Button(u16),
    Hat(HatPosition),
}

/// Mapping for one physical device
#[derive(Debug, Clone, Default)]
pub struct DeviceMapping {
    axes: HashMap<String, AxisCommand>,
    buttons: HashMap<u16, KeyCommand>,
    hat: HashMap<HatPosition, KeyCommand>,
}

impl DeviceMapping {
    pub fn from_config(config: &DeviceMappingConfig) -> Result<Self, ConfigError> {
        let mut mapping = Self::default();

        for (axis, binding) in &config.axes {
            let command = axis_command(binding)?;
            if !command.is_valid() {
                return Err(ConfigError::DiscreteAxis {
                    device: config.name.clone(),
                    axis: axis.clone(),
                    channel: command.channel.to_string(),
                });
            }
            mapping.axes.insert(axis.trim().to_ascii_lowercase(), command);
        }

        for (key, action) in &config.buttons {
            let index = key
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidButton {
                    device: config.name.clone(),
                    key: key.clone(),
                })?;
            mapping.buttons.insert(index, KeyCommand::new(action.parse()?));
        }

        for (key, action) in &config.hat {
            let position = HatPosition::parse(key)
                .filter(|position| *position != HatPosition::Center)
                .ok_or_else(|| ConfigError::InvalidHatPosition {
                    device: config.name.clone(),
                    key: key.clone(),
                })?;
            mapping.hat.insert(position, KeyCommand::new(action.parse()?));
        }

        debug!(
            "Mapped device '{}': {} axes, {} buttons, {} hat positions",
            config.name,
            mapping.axes.len(),
            mapping.buttons.len(),
            mapping.hat.len()
        );
        Ok(mapping)
    }

    pub fn axis(&self, name: &str) -> Option<AxisCommand> {
        self.axes.get(name).copied()
    }

    pub fn button(&self, index: u16) -> Option<KeyCommand> {
        self.buttons.get(&index).copied()
    }

    pub fn hat(&self, position: HatPosition) -> Option<KeyCommand> {
        self.hat.get(&position).copied()
    }

    /// Every hat-mapped command, in position order
    pub fn hat_commands(&self) -> impl Iterator<Item = (HatPosition, KeyCommand)> + '_ {
        HatPosition::ALL
            .iter()
            .filter_map(move |position| self.hat(*position).map(|command| (*position, command)))
    }

    pub fn resolve(&self, component: ComponentKey<'_>) -> Option<Command> {
        match component {
            ComponentKey::Axis(name) => self.axis(name).map(Command::Axis),
            ComponentKey::Button(index) => self.button(index).map(Command::Key),
            ComponentKey::Hat(position) => self.hat(position).map(Command::Key),
        }
    }
}

fn axis_command(binding: &AxisBinding) -> Result<AxisCommand, ConfigError> {
    match binding {
        AxisBinding::Channel(channel) => Ok(AxisCommand::new(channel.parse()?)),
        AxisBinding::Shaped {
            channel,
            shaping,
            gain,
        } => {
            let channel: ControlChannel = channel.parse()?;
            let shaping = match shaping {
                Some(name) => Shaping::parse(name, *gain)?,
                None => Shaping::default_for(channel),
            };
            Ok(AxisCommand::with_shaping(channel, shaping))
        }
    }
}

/// Immutable table of all device mappings, keyed by device name
#[derive(Debug, Clone, Default)]
pub struct DeviceMappingTable {
    devices: HashMap<String, DeviceMapping>,
}

impl DeviceMappingTable {
    /// Fails on the first entry that names an unknown channel, command or
    /// component, or on a device name given twice.
    pub fn from_config(devices: &[DeviceMappingConfig]) -> Result<Self, ConfigError> {
        let mut table = HashMap::with_capacity(devices.len());
        for config in devices {
            let mapping = DeviceMapping::from_config(config)?;
            if table.insert(config.name.clone(), mapping).is_some() {
                return Err(ConfigError::DuplicateDevice(config.name.clone()));
            }
        }
        Ok(Self { devices: table })
    }

    /// Exact entry first, then the wildcard entry
    pub fn device(&self, name: &str) -> Option<&DeviceMapping> {
        self.devices
            .get(name)
            .or_else(|| self.devices.get(WILDCARD_DEVICE))
    }

    pub fn resolve(&self, device: &str, component: ComponentKey<'_>) -> Option<Command> {
        self.device(device)?.resolve(component)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::command::KeyAction;
    use std::collections::BTreeMap;

    fn stick_config(name: &str) -> DeviceMappingConfig {
        DeviceMappingConfig {
            name: name.to_string(),
            axes: BTreeMap::from([
                ("x".to_string(), AxisBinding::Channel("aileron".to_string())),
                ("y".to_string(), AxisBinding::Channel("elevator".to_string())),
                (
                    "z".to_string(),
                    AxisBinding::Shaped {
                        channel: "throttle_1".to_string(),
                        shaping: Some("lever".to_string()),
                        gain: None,
                    },
                ),
            ]),
            buttons: BTreeMap::from([
                ("0".to_string(), "brakes".to_string()),
                ("3".to_string(), "gear_up_down".to_string()),
            ]),
            hat: BTreeMap::from([
                ("up".to_string(), "elevator_trim_down".to_string()),
                ("0.75".to_string(), "elevator_trim_up".to_string()),
            ]),
        }
    }

    #[test]
    fn resolves_each_component_kind() {
        let table = DeviceMappingTable::from_config(&[stick_config("Saitek X52")]).unwrap();

        assert_eq!(
            table.resolve("Saitek X52", ComponentKey::Axis("y")),
            Some(Command::Axis(AxisCommand::new(ControlChannel::Elevator)))
        );
        assert_eq!(
            table.resolve("Saitek X52", ComponentKey::Button(3)),
            Some(Command::Key(KeyCommand::new(KeyAction::GearUpDown)))
        );
        assert_eq!(
            table.resolve("Saitek X52", ComponentKey::Hat(HatPosition::Down)),
            Some(Command::Key(KeyCommand::new(KeyAction::ElevatorTrimUp)))
        );
    }

    #[test]
    fn unmapped_lookups_are_none() {
        let table = DeviceMappingTable::from_config(&[stick_config("Saitek X52")]).unwrap();

        assert_eq!(table.resolve("Saitek X52", ComponentKey::Axis("rz")), None);
        assert_eq!(table.resolve("Saitek X52", ComponentKey::Button(12)), None);
        assert_eq!(
            table.resolve("Saitek X52", ComponentKey::Hat(HatPosition::Left)),
            None
        );
        assert_eq!(table.resolve("Unknown Pad", ComponentKey::Button(0)), None);
    }

    #[test]
    fn wildcard_covers_unlisted_devices() {
        let table = DeviceMappingTable::from_config(&[
            stick_config(WILDCARD_DEVICE),
            DeviceMappingConfig {
                name: "Rudder Pedals".to_string(),
                axes: BTreeMap::from([(
                    "rz".to_string(),
                    AxisBinding::Channel("rudder".to_string()),
                )]),
                ..Default::default()
            },
        ])
        .unwrap();

        assert!(table.resolve("Any Gamepad", ComponentKey::Button(0)).is_some());
        assert!(table.resolve("Rudder Pedals", ComponentKey::Axis("rz")).is_some());
        // an exact entry replaces the wildcard entirely
        assert_eq!(table.resolve("Rudder Pedals", ComponentKey::Button(0)), None);
    }

    #[test]
    fn construction_rejects_unknown_names() {
        let mut config = stick_config("pad");
        config
            .axes
            .insert("rx".to_string(), AxisBinding::Channel("spoiler".to_string()));
        assert!(matches!(
            DeviceMappingTable::from_config(&[config]),
            Err(ConfigError::UnknownChannel(_))
        ));

        let mut config = stick_config("pad");
        config.buttons.insert("5".to_string(), "eject".to_string());
        assert!(matches!(
            DeviceMappingTable::from_config(&[config]),
            Err(ConfigError::UnknownCommand(_))
        ));
    }

    #[test]
    fn construction_rejects_bad_component_keys() {
        let mut config = stick_config("pad");
        config.buttons.insert("trigger".to_string(), "brakes".to_string());
        assert!(matches!(
            DeviceMappingTable::from_config(&[config]),
            Err(ConfigError::InvalidButton { .. })
        ));

        let mut config = stick_config("pad");
        config.hat.insert("center".to_string(), "brakes".to_string());
        assert!(matches!(
            DeviceMappingTable::from_config(&[config]),
            Err(ConfigError::InvalidHatPosition { .. })
        ));

        let mut config = stick_config("pad");
        config
            .axes
            .insert("slider".to_string(), AxisBinding::Channel("gear".to_string()));
        assert!(matches!(
            DeviceMappingTable::from_config(&[config]),
            Err(ConfigError::DiscreteAxis { .. })
        ));
    }

    #[test]
    fn duplicate_device_names_are_rejected() {
        assert!(matches!(
            DeviceMappingTable::from_config(&[stick_config("pad"), stick_config("pad")]),
            Err(ConfigError::DuplicateDevice(name)) if name == "pad"
        ));
    }

    #[test]
    fn hat_commands_iterate_in_position_order() {
        let table = DeviceMappingTable::from_config(&[stick_config("pad")]).unwrap();
        let positions: Vec<_> = table
            .device("pad")
            .unwrap()
            .hat_commands()
            .map(|(position, _)| position)
            .collect();
        assert_eq!(positions, vec![HatPosition::Up, HatPosition::Down]);
    }
}
