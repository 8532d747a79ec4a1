//! Control Channel Registry
//!
//! Static definition of every controllable quantity of the aircraft together with
//! its physical travel limits, its class and the rate used for digital nudges.
//! The channel set is closed: every lookup is total and has no error path.

use crate::mapping::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Control surface deflections are in radians, everything else is normalized.
const DEG_15: f64 = 0.261_799;
const DEG_25: f64 = 0.436_332;
const DEG_30: f64 = 0.523_599;

/// Whether a channel takes any value in its range or only its end stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelClass {
    Continuous,
    Discrete,
}

/// Speed class for button and hat driven nudges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateClass {
    /// Elevator, aileron and rudder
    Surface,
    Flaps,
    /// Throttle, propeller and mixture levers
    Engine,
    /// Channels that are never nudged
    Fixed,
}

impl RateClass {
    /// Base rate in channel units per second; multiplied by the step length
    pub fn base_rate(self) -> f64 {
        match self {
            RateClass::Surface => 0.5,
            RateClass::Flaps => 0.15,
            RateClass::Engine => 0.12,
            RateClass::Fixed => 0.0,
        }
    }
}

/// One controllable quantity of the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControlChannel {
    Elevator,
    Aileron,
    Rudder,
    Flaps,
    Gear,
    BrakeLeft,
    BrakeRight,
    Throttle1,
    Throttle2,
    Throttle3,
    Throttle4,
    Propeller1,
    Propeller2,
    Propeller3,
    Propeller4,
    Mixture1,
    Mixture2,
    Mixture3,
    Mixture4,
}

impl ControlChannel {
    pub const COUNT: usize = 19;

    pub const ALL: [ControlChannel; Self::COUNT] = [
        ControlChannel::Elevator,
        ControlChannel::Aileron,
        ControlChannel::Rudder,
        ControlChannel::Flaps,
        ControlChannel::Gear,
        ControlChannel::BrakeLeft,
        ControlChannel::BrakeRight,
        ControlChannel::Throttle1,
        ControlChannel::Throttle2,
        ControlChannel::Throttle3,
        ControlChannel::Throttle4,
        ControlChannel::Propeller1,
        ControlChannel::Propeller2,
        ControlChannel::Propeller3,
        ControlChannel::Propeller4,
        ControlChannel::Mixture1,
        ControlChannel::Mixture2,
        ControlChannel::Mixture3,
        ControlChannel::Mixture4,
    ];

    /// Channels that carry a trim offset on top of the commanded deflection
    pub const TRIMMABLE: [ControlChannel; 3] = [
        ControlChannel::Elevator,
        ControlChannel::Aileron,
        ControlChannel::Rudder,
    ];

    pub const THROTTLES: [ControlChannel; 4] = [
        ControlChannel::Throttle1,
        ControlChannel::Throttle2,
        ControlChannel::Throttle3,
        ControlChannel::Throttle4,
    ];

    pub const PROPELLERS: [ControlChannel; 4] = [
        ControlChannel::Propeller1,
        ControlChannel::Propeller2,
        ControlChannel::Propeller3,
        ControlChannel::Propeller4,
    ];

    pub const MIXTURES: [ControlChannel; 4] = [
        ControlChannel::Mixture1,
        ControlChannel::Mixture2,
        ControlChannel::Mixture3,
        ControlChannel::Mixture4,
    ];

    /// Position of the channel in [`ControlChannel::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn minimum(self) -> f64 {
        match self {
            ControlChannel::Elevator => -DEG_25,
            ControlChannel::Aileron | ControlChannel::Rudder => -DEG_15,
            _ => 0.0,
        }
    }

    pub fn maximum(self) -> f64 {
        match self {
            ControlChannel::Elevator | ControlChannel::Aileron | ControlChannel::Rudder => DEG_15,
            ControlChannel::Flaps => DEG_30,
            _ => 1.0,
        }
    }

    pub fn class(self) -> ChannelClass {
        match self {
            ControlChannel::Gear => ChannelClass::Discrete,
            _ => ChannelClass::Continuous,
        }
    }

    pub fn rate_class(self) -> RateClass {
        match self {
            ControlChannel::Elevator | ControlChannel::Aileron | ControlChannel::Rudder => {
                RateClass::Surface
            }
            ControlChannel::Flaps => RateClass::Flaps,
            ControlChannel::Gear | ControlChannel::BrakeLeft | ControlChannel::BrakeRight => {
                RateClass::Fixed
            }
            _ => RateClass::Engine,
        }
    }

    pub fn is_trimmable(self) -> bool {
        Self::TRIMMABLE.contains(&self)
    }

    /// Clamps a value into `[minimum, maximum]`
    pub fn clamp(self, value: f64) -> f64 {
        value.clamp(self.minimum(), self.maximum())
    }

    pub fn contains(self, value: f64) -> bool {
        value >= self.minimum() && value <= self.maximum()
    }

    /// Name used in configuration files and logs
    pub fn name(self) -> &'static str {
        match self {
            ControlChannel::Elevator => "elevator",
            ControlChannel::Aileron => "aileron",
            ControlChannel::Rudder => "rudder",
            ControlChannel::Flaps => "flaps",
            ControlChannel::Gear => "gear",
            ControlChannel::BrakeLeft => "brake_left",
            ControlChannel::BrakeRight => "brake_right",
            ControlChannel::Throttle1 => "throttle_1",
            ControlChannel::Throttle2 => "throttle_2",
            ControlChannel::Throttle3 => "throttle_3",
            ControlChannel::Throttle4 => "throttle_4",
            ControlChannel::Propeller1 => "propeller_1",
            ControlChannel::Propeller2 => "propeller_2",
            ControlChannel::Propeller3 => "propeller_3",
            ControlChannel::Propeller4 => "propeller_4",
            ControlChannel::Mixture1 => "mixture_1",
            ControlChannel::Mixture2 => "mixture_2",
            ControlChannel::Mixture3 => "mixture_3",
            ControlChannel::Mixture4 => "mixture_4",
        }
    }
}

impl fmt::Display for ControlChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ControlChannel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|channel| channel.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownChannel(s.to_string()))
    }
}
