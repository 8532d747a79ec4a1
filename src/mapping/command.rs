//! Logical commands produced by the mapping table and consumed by the actuator

use crate::controls::channel::{ChannelClass, ControlChannel};
use crate::mapping::error::ConfigError;
use std::fmt::{self, Display};
use std::str::FromStr;

/// Nonlinear transform an axis command applies to its device reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shaping {
    /// Sign-preserving square, asymmetric deflection, plus trim
    Deflection,
    /// Sign-preserving square clamped to the channel
    Brake,
    /// Linear lever travel, -1 at full and +1 at the minimum stop
    Lever,
    /// Relative motion accumulated by the actuator and scaled by `gain`
    Relative { gain: f64 },
}

impl Shaping {
    /// Default gain for pointer deltas, in channel units per count
    pub const POINTER_GAIN: f64 = -1.0e-4;

    pub fn default_for(channel: ControlChannel) -> Self {
        match channel {
            ControlChannel::Elevator | ControlChannel::Aileron | ControlChannel::Rudder => {
                Shaping::Deflection
            }
            ControlChannel::BrakeLeft | ControlChannel::BrakeRight => Shaping::Brake,
            _ => Shaping::Lever,
        }
    }

    /// Parses a shaping name from configuration; `gain` only applies to `relative`
    pub fn parse(name: &str, gain: Option<f64>) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "deflection" => Ok(Shaping::Deflection),
            "brake" => Ok(Shaping::Brake),
            "lever" => Ok(Shaping::Lever),
            "relative" => Ok(Shaping::Relative {
                gain: gain.unwrap_or(Self::POINTER_GAIN),
            }),
            _ => Err(ConfigError::UnknownShaping(name.to_string())),
        }
    }
}

/// Continuous command: a target channel and how to shape the reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisCommand {
    pub channel: ControlChannel,
    pub shaping: Shaping,
}

impl AxisCommand {
    pub fn new(channel: ControlChannel) -> Self {
        Self {
            channel,
            shaping: Shaping::default_for(channel),
        }
    }

    pub fn with_shaping(channel: ControlChannel, shaping: Shaping) -> Self {
        Self { channel, shaping }
    }

    /// Discrete channels only move through key commands
    pub fn is_valid(&self) -> bool {
        self.channel.class() == ChannelClass::Continuous
    }
}

/// Action performed by a discrete command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    AileronLeft,
    AileronRight,
    AileronTrimLeft,
    AileronTrimRight,
    ElevatorUp,
    ElevatorDown,
    ElevatorTrimUp,
    ElevatorTrimDown,
    RudderLeft,
    RudderRight,
    RudderTrimLeft,
    RudderTrimRight,
    IncreaseFlaps,
    DecreaseFlaps,
    IncreaseThrottle,
    DecreaseThrottle,
    IncreasePropeller,
    DecreasePropeller,
    IncreaseMixture,
    DecreaseMixture,
    CenterControls,
    GearUp,
    GearDown,
    GearUpDown,
    Brakes,
}

impl KeyAction {
    pub const ALL: [KeyAction; 25] = [
        KeyAction::AileronLeft,
        KeyAction::AileronRight,
        KeyAction::AileronTrimLeft,
        KeyAction::AileronTrimRight,
        KeyAction::ElevatorUp,
        KeyAction::ElevatorDown,
        KeyAction::ElevatorTrimUp,
        KeyAction::ElevatorTrimDown,
        KeyAction::RudderLeft,
        KeyAction::RudderRight,
        KeyAction::RudderTrimLeft,
        KeyAction::RudderTrimRight,
        KeyAction::IncreaseFlaps,
        KeyAction::DecreaseFlaps,
        KeyAction::IncreaseThrottle,
        KeyAction::DecreaseThrottle,
        KeyAction::IncreasePropeller,
        KeyAction::DecreasePropeller,
        KeyAction::IncreaseMixture,
        KeyAction::DecreaseMixture,
        KeyAction::CenterControls,
        KeyAction::GearUp,
        KeyAction::GearDown,
        KeyAction::GearUpDown,
        KeyAction::Brakes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            KeyAction::AileronLeft => "aileron_left",
            KeyAction::AileronRight => "aileron_right",
            KeyAction::AileronTrimLeft => "aileron_trim_left",
            KeyAction::AileronTrimRight => "aileron_trim_right",
            KeyAction::ElevatorUp => "elevator_up",
            KeyAction::ElevatorDown => "elevator_down",
            KeyAction::ElevatorTrimUp => "elevator_trim_up",
            KeyAction::ElevatorTrimDown => "elevator_trim_down",
            KeyAction::RudderLeft => "rudder_left",
            KeyAction::RudderRight => "rudder_right",
            KeyAction::RudderTrimLeft => "rudder_trim_left",
            KeyAction::RudderTrimRight => "rudder_trim_right",
            KeyAction::IncreaseFlaps => "increase_flaps",
            KeyAction::DecreaseFlaps => "decrease_flaps",
            KeyAction::IncreaseThrottle => "increase_throttle",
            KeyAction::DecreaseThrottle => "decrease_throttle",
            KeyAction::IncreasePropeller => "increase_propeller",
            KeyAction::DecreasePropeller => "decrease_propeller",
            KeyAction::IncreaseMixture => "increase_mixture",
            KeyAction::DecreaseMixture => "decrease_mixture",
            KeyAction::CenterControls => "center_controls",
            KeyAction::GearUp => "gear_up",
            KeyAction::GearDown => "gear_down",
            KeyAction::GearUpDown => "gear_up_down",
            KeyAction::Brakes => "brakes",
        }
    }
}

impl Display for KeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyAction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|action| action.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownCommand(s.to_string()))
    }
}

/// Discrete command.
///
/// `relative` commands are momentary and act on pressed samples only; the others
/// are level commands that follow the held state in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCommand {
    pub action: KeyAction,
    pub relative: bool,
}

impl KeyCommand {
    pub fn new(action: KeyAction) -> Self {
        Self {
            action,
            relative: !matches!(action, KeyAction::Brakes),
        }
    }
}

impl From<KeyAction> for KeyCommand {
    fn from(action: KeyAction) -> Self {
        Self::new(action)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Axis(AxisCommand),
    Key(KeyCommand),
}
