//! Device components as reported by adapters, and the dispatch rule that
//! classifies them into axes, buttons and hat switches.

use std::fmt;

/// Identifier of the hat switch component
pub const HAT_ID: &str = "pov";

/// One component reading taken during a poll
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSample {
    /// Axis name, button index or [`HAT_ID`]
    pub id: String,
    /// Normalized reading; for relative components the delta since the last poll
    pub value: f32,
    pub analog: bool,
    pub relative: bool,
}

impl ComponentSample {
    pub fn axis(id: impl Into<String>, value: f32) -> Self {
        Self {
            id: id.into(),
            value,
            analog: true,
            relative: false,
        }
    }

    pub fn relative_axis(id: impl Into<String>, delta: f32) -> Self {
        Self {
            id: id.into(),
            value: delta,
            analog: true,
            relative: true,
        }
    }

    pub fn button(index: u16, pressed: bool) -> Self {
        Self {
            id: index.to_string(),
            value: if pressed { 1.0 } else { 0.0 },
            analog: false,
            relative: false,
        }
    }

    pub fn hat(position: HatPosition) -> Self {
        Self {
            id: HAT_ID.to_string(),
            value: position.value(),
            analog: false,
            relative: false,
        }
    }
}

/// How a component is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Button(u16),
    Hat(HatPosition),
    Axis,
    RelativeAxis,
}

impl ComponentKind {
    /// Purely numeric ids are buttons, the hat id is the hat switch, and the
    /// remaining analog components are axes. Anything else is not dispatched.
    pub fn classify(sample: &ComponentSample) -> Option<Self> {
        if !sample.id.is_empty() && sample.id.bytes().all(|b| b.is_ascii_digit()) {
            return sample.id.parse().ok().map(ComponentKind::Button);
        }
        if sample.id == HAT_ID {
            return HatPosition::from_value(sample.value).map(ComponentKind::Hat);
        }
        if sample.relative {
            return Some(ComponentKind::RelativeAxis);
        }
        if sample.analog {
            return Some(ComponentKind::Axis);
        }
        None
    }
}

/// Hat switch position, encoded like a POV value: eighths of a turn starting
/// at up-left, with 0 meaning centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HatPosition {
    Center,
    UpLeft,
    Up,
    UpRight,
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
}

impl HatPosition {
    pub const ALL: [HatPosition; 9] = [
        HatPosition::Center,
        HatPosition::UpLeft,
        HatPosition::Up,
        HatPosition::UpRight,
        HatPosition::Right,
        HatPosition::DownRight,
        HatPosition::Down,
        HatPosition::DownLeft,
        HatPosition::Left,
    ];

    pub fn value(self) -> f32 {
        // variant order matches the encoding
        self as u8 as f32 * 0.125
    }

    /// Decodes a hat reading; tolerates float noise
    pub fn from_value(value: f32) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|position| (position.value() - value).abs() < 0.01)
    }

    /// Combines the four direction buttons of a d-pad
    pub fn from_directions(up: bool, down: bool, left: bool, right: bool) -> Self {
        match (up && !down, down && !up, left && !right, right && !left) {
            (true, _, true, _) => HatPosition::UpLeft,
            (true, _, _, true) => HatPosition::UpRight,
            (true, _, _, _) => HatPosition::Up,
            (_, true, true, _) => HatPosition::DownLeft,
            (_, true, _, true) => HatPosition::DownRight,
            (_, true, _, _) => HatPosition::Down,
            (_, _, true, _) => HatPosition::Left,
            (_, _, _, true) => HatPosition::Right,
            _ => HatPosition::Center,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HatPosition::Center => "center",
            HatPosition::UpLeft => "up_left",
            HatPosition::Up => "up",
            HatPosition::UpRight => "up_right",
            HatPosition::Right => "right",
            HatPosition::DownRight => "down_right",
            HatPosition::Down => "down",
            HatPosition::DownLeft => "down_left",
            HatPosition::Left => "left",
        }
    }

    /// Accepts a position name or its numeric value
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase();
        if let Some(position) = Self::ALL.iter().copied().find(|p| p.name() == key) {
            return Some(position);
        }
        key.parse::<f32>().ok().and_then(Self::from_value)
    }
}

impl fmt::Display for HatPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
