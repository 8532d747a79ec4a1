//! Startup configuration
//!
//! Loaded once from a TOML file before the pipeline starts and never reloaded.
//! A missing file is not an error: the built-in defaults map any gamepad and a
//! pointer device named `mouse`.
//!
//! ```toml
//! [simulation]
//! dt = 0.05
//!
//! [input]
//! poll_interval_ms = 20
//! joystick_deadzone = 0.05
//! pointer_devices = ["mouse"]
//!
//! [initial_conditions.trim]
//! elevator = -0.02
//!
//! [initial_conditions.controls]
//! flaps = 0.17
//!
//! [[devices]]
//! name = "*"
//! [devices.axes]
//! x = "aileron"
//! wheel = { channel = "throttle_1", shaping = "relative", gain = 0.025 }
//! [devices.buttons]
//! "0" = "brakes"
//! [devices.hat]
//! up = "elevator_trim_down"
//! ```

use crate::controls::actuator::{ActuatorSettings, TrimState};
use crate::controls::channel::ControlChannel;
use crate::mapping::command::Shaping;
use crate::mapping::error::ConfigError;
use crate::mapping::table::{DeviceMappingTable, WILDCARD_DEVICE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Directory below the user config dir holding our files
const APP_DIR: &str = "flightdeck";
const CONFIG_FILE: &str = "controls.toml";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub input: InputConfig,
    pub initial_conditions: InitialConditions,
    pub devices: Vec<DeviceMappingConfig>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed integrator step in seconds
    pub dt: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { dt: 0.05 }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub poll_interval_ms: u64,
    pub joystick_deadzone: f32,
    /// Pointer devices registered with the pointer adapter at startup
    pub pointer_devices: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 20,
            joystick_deadzone: 0.05,
            pointer_devices: vec!["mouse".to_string()],
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct InitialConditions {
    pub trim: TrimConfig,
    /// Channel name -> start value
    pub controls: BTreeMap<String, f64>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq)]
#[serde(default)]
pub struct TrimConfig {
    pub elevator: f64,
    pub aileron: f64,
    pub rudder: f64,
}

/// Axis binding: a bare channel name, or a table choosing the shaping
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum AxisBinding {
    Channel(String),
    Shaped {
        channel: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        shaping: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gain: Option<f64>,
    },
}

/// Mapping entry for one device name, `*` for any device
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct DeviceMappingConfig {
    pub name: String,
    #[serde(default)]
    pub axes: BTreeMap<String, AxisBinding>,
    /// Button index -> key command
    #[serde(default)]
    pub buttons: BTreeMap<String, String>,
    /// Hat position -> key command
    #[serde(default)]
    pub hat: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            input: InputConfig::default(),
            initial_conditions: InitialConditions::default(),
            devices: vec![default_gamepad(), default_pointer()],
        }
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/flightdeck/controls.toml` or the platform equivalent
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads and validates the configuration. Falls back to the defaults when
    /// the file does not exist; any other read or parse problem is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => {
                warn!("No configuration directory available, using built-in defaults");
                return Ok(Self::default());
            }
        };

        match fs::read_to_string(&path) {
            Ok(content) => {
                info!("Loading configuration from {}", path.display());
                Self::from_toml_str(&content)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "Configuration file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Read(e)),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        debug!(
            "Parsed configuration with {} device mappings",
            config.devices.len()
        );
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Checks the numeric settings and builds the mapping table once so that
    /// every naming problem surfaces before anything is spawned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.simulation.dt.is_finite() && self.simulation.dt > 0.0) {
            return Err(invalid("simulation.dt", "must be a positive number of seconds"));
        }
        if self.input.poll_interval_ms == 0 {
            return Err(invalid("input.poll_interval_ms", "must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.input.joystick_deadzone) {
            return Err(invalid("input.joystick_deadzone", "must be within [0, 1)"));
        }
        let trim = self.initial_conditions.trim;
        for (name, value) in [
            ("elevator", trim.elevator),
            ("aileron", trim.aileron),
            ("rudder", trim.rudder),
        ] {
            if !value.is_finite() {
                return Err(invalid(&format!("initial_conditions.trim.{name}"), "not finite"));
            }
        }
        self.initial_controls()?;
        self.mapping_table()?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.input.poll_interval_ms)
    }

    pub fn dt(&self) -> Duration {
        Duration::from_secs_f64(self.simulation.dt)
    }

    pub fn mapping_table(&self) -> Result<DeviceMappingTable, ConfigError> {
        DeviceMappingTable::from_config(&self.devices)
    }

    pub fn actuator_settings(&self) -> Result<ActuatorSettings, ConfigError> {
        let trim = self.initial_conditions.trim;
        Ok(ActuatorSettings {
            dt: self.simulation.dt,
            trim: TrimState::new(trim.elevator, trim.aileron, trim.rudder),
            initial_controls: self.initial_controls()?,
        })
    }

    fn initial_controls(&self) -> Result<Vec<(ControlChannel, f64)>, ConfigError> {
        self.initial_conditions
            .controls
            .iter()
            .map(|(name, value)| {
                if !value.is_finite() {
                    return Err(invalid(&format!("initial_conditions.controls.{name}"), "not finite"));
                }
                Ok((name.parse()?, *value))
            })
            .collect()
    }
}

fn invalid(name: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidSetting {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn channel(name: &str) -> AxisBinding {
    AxisBinding::Channel(name.to_string())
}

fn bindings(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(key, action)| (key.to_string(), action.to_string()))
        .collect()
}

/// Sticks fly the surfaces, triggers are toe brakes, the d-pad trims
fn default_gamepad() -> DeviceMappingConfig {
    DeviceMappingConfig {
        name: WILDCARD_DEVICE.to_string(),
        axes: BTreeMap::from([
            ("x".to_string(), channel("aileron")),
            ("y".to_string(), channel("elevator")),
            ("rx".to_string(), channel("rudder")),
            ("z".to_string(), channel("brake_left")),
            ("rz".to_string(), channel("brake_right")),
        ]),
        buttons: bindings(&[
            ("0", "brakes"),
            ("1", "gear_up_down"),
            ("2", "increase_flaps"),
            ("3", "decrease_flaps"),
            ("4", "decrease_throttle"),
            ("5", "increase_throttle"),
            ("6", "center_controls"),
        ]),
        hat: bindings(&[
            ("up", "elevator_trim_down"),
            ("down", "elevator_trim_up"),
            ("left", "aileron_trim_left"),
            ("right", "aileron_trim_right"),
        ]),
    }
}

/// Mouse motion flies the surfaces, the wheel drives the first throttle
fn default_pointer() -> DeviceMappingConfig {
    let relative = |name: &str, gain: f64| AxisBinding::Shaped {
        channel: name.to_string(),
        shaping: Some("relative".to_string()),
        gain: Some(gain),
    };
    DeviceMappingConfig {
        name: "mouse".to_string(),
        axes: BTreeMap::from([
            ("x".to_string(), relative("aileron", Shaping::POINTER_GAIN)),
            ("y".to_string(), relative("elevator", Shaping::POINTER_GAIN)),
            ("wheel".to_string(), relative("throttle_1", 0.025)),
        ]),
        buttons: bindings(&[("0", "brakes"), ("2", "center_controls")]),
        hat: BTreeMap::new(),
    }
}
