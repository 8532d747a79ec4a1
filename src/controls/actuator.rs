//! Control Actuator
//!
//! Converts a [`Command`] plus its device sample into new channel values. The
//! actuator is the single owner of all stateful control math:
//!
//! - trim offsets for elevator, aileron and rudder ([`TrimState`])
//! - edge latches for toggles and level commands ([`EdgeLatch`]), one per
//!   physical control so two controls bound to one action never re-arm each
//!   other
//! - per-channel accumulators for relative (pointer) axes
//!
//! # Data Flow
//!
//! ```text
//! (Command, sample) ──► Actuator ──► ControlStateStore ──► integrator snapshot
//!                         │
//!                   trim / latches / accumulators
//! ```
//!
//! Every write is clamped to the channel bounds; nothing here returns an error.

use crate::controller::component::HatPosition;
use crate::controls::channel::ControlChannel;
use crate::controls::shaping::{deflection, lever, signed_square};
use crate::controls::state::{ControlState, ControlStateStore};
use crate::mapping::command::{AxisCommand, Command, KeyAction, KeyCommand, Shaping};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Sample value of a digital control that is held down
pub const PRESSED: f32 = 1.0;

/// Sample value of a released digital control
pub const RELEASED: f32 = 0.0;

pub fn is_pressed(sample: f32) -> bool {
    sample >= PRESSED
}

/// Accumulated trim offsets, one per trimmable channel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrimState {
    offsets: [f64; 3],
}

impl TrimState {
    /// Offsets are clamped into their channel's bounds
    pub fn new(elevator: f64, aileron: f64, rudder: f64) -> Self {
        Self {
            offsets: [
                ControlChannel::Elevator.clamp(elevator),
                ControlChannel::Aileron.clamp(aileron),
                ControlChannel::Rudder.clamp(rudder),
            ],
        }
    }

    fn slot(channel: ControlChannel) -> Option<usize> {
        ControlChannel::TRIMMABLE
            .iter()
            .position(|trimmable| *trimmable == channel)
    }

    /// Zero for channels without trim
    pub fn offset(&self, channel: ControlChannel) -> f64 {
        Self::slot(channel).map_or(0.0, |slot| self.offsets[slot])
    }

    /// Moves the offset by `delta` within bounds and returns the change applied
    fn adjust(&mut self, channel: ControlChannel, delta: f64) -> f64 {
        let Some(slot) = Self::slot(channel) else {
            return 0.0;
        };
        let previous = self.offsets[slot];
        self.offsets[slot] = channel.clamp(previous + delta);
        self.offsets[slot] - previous
    }
}

/// Transition seen by an [`EdgeLatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
}

/// Remembers whether a physical control is held so a toggle fires once per press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeLatch {
    held: bool,
}

impl EdgeLatch {
    /// Feeds the current pressed state and reports a transition, if any
    pub fn update(&mut self, pressed: bool) -> Option<Edge> {
        match (self.held, pressed) {
            (false, true) => {
                self.held = true;
                Some(Edge::Pressed)
            }
            (true, false) => {
                self.held = false;
                Some(Edge::Released)
            }
            _ => None,
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }
}

/// Device a batch of commands came from: adapter slot and adapter-local id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceDevice {
    pub adapter: usize,
    pub id: usize,
}

/// Physical component a command was resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlOrigin {
    /// Applied directly, not through a device
    Direct,
    Axis,
    Button(u16),
    Hat(HatPosition),
}

type LatchKey = (SourceDevice, ControlOrigin, KeyAction);

/// Initial conditions handed to the actuator at construction
#[derive(Debug, Clone)]
pub struct ActuatorSettings {
    /// Fixed simulation step length in seconds
    pub dt: f64,
    pub trim: TrimState,
    /// Start values for individual channels, applied after trim
    pub initial_controls: Vec<(ControlChannel, f64)>,
}

impl Default for ActuatorSettings {
    fn default() -> Self {
        Self {
            dt: 0.05,
            trim: TrimState::default(),
            initial_controls: Vec::new(),
        }
    }
}

/// Stateful engine turning commands into channel values
#[derive(Debug)]
pub struct Actuator {
    store: Arc<ControlStateStore>,
    settings: ActuatorSettings,
    trim: TrimState,
    latches: HashMap<LatchKey, EdgeLatch>,
    relative: [f64; ControlChannel::COUNT],
}

impl Actuator {
    pub fn new(settings: ActuatorSettings) -> Self {
        info!(
            "Creating actuator with dt={}s, trim elevator={:.4} aileron={:.4} rudder={:.4}",
            settings.dt,
            settings.trim.offset(ControlChannel::Elevator),
            settings.trim.offset(ControlChannel::Aileron),
            settings.trim.offset(ControlChannel::Rudder)
        );

        let store = Arc::new(ControlStateStore::new(Self::initial_state(&settings)));
        Self {
            store,
            trim: settings.trim,
            settings,
            latches: HashMap::new(),
            relative: [0.0; ControlChannel::COUNT],
        }
    }

    /// Trim-only state the pipeline starts from
    pub fn initial_state(settings: &ActuatorSettings) -> ControlState {
        let mut state = ControlState::neutral();
        for channel in ControlChannel::TRIMMABLE {
            state.set(channel, settings.trim.offset(channel));
        }
        for (channel, value) in &settings.initial_controls {
            state.set(*channel, *value);
        }
        state
    }

    /// Shared handle to the store this actuator writes
    pub fn store(&self) -> Arc<ControlStateStore> {
        Arc::clone(&self.store)
    }

    pub fn trim(&self) -> TrimState {
        self.trim
    }

    pub fn dt(&self) -> f64 {
        self.settings.dt
    }

    /// Applies one command as its own store batch
    pub fn apply(&mut self, command: &Command, sample: f32) {
        let store = Arc::clone(&self.store);
        let source = (SourceDevice::default(), ControlOrigin::Direct);
        store.update(|state| self.actuate(state, source, command, sample));
    }

    /// Applies every command of one device pass as a single store batch
    pub fn apply_batch<I>(&mut self, device: SourceDevice, commands: I)
    where
        I: IntoIterator<Item = (ControlOrigin, Command, f32)>,
    {
        let store = Arc::clone(&self.store);
        store.update(|state| {
            for (origin, command, sample) in commands {
                self.actuate(state, (device, origin), &command, sample);
            }
        });
    }

    /// Drops the latches of a device that is gone. Channel values are kept.
    pub fn forget_device(&mut self, device: SourceDevice) {
        self.latches.retain(|(source, _, _), _| *source != device);
    }

    /// Restores trim, latches and channel values for a simulation restart
    pub fn reset(&mut self) {
        info!("Resetting actuator to initial conditions");
        self.trim = self.settings.trim;
        self.latches.clear();
        self.relative = [0.0; ControlChannel::COUNT];

        let initial = Self::initial_state(&self.settings);
        self.store.update(|state| *state = initial);
    }

    fn actuate(
        &mut self,
        state: &mut ControlState,
        source: (SourceDevice, ControlOrigin),
        command: &Command,
        sample: f32,
    ) {
        match command {
            Command::Axis(axis) => self.actuate_axis(state, axis, sample),
            Command::Key(key) => self.actuate_key(state, source, key, sample),
        }
    }

    fn latch(
        &mut self,
        source: (SourceDevice, ControlOrigin),
        action: KeyAction,
    ) -> &mut EdgeLatch {
        self.latches.entry((source.0, source.1, action)).or_default()
    }

    fn any_held(&self, action: KeyAction) -> bool {
        self.latches
            .iter()
            .any(|((_, _, latched), latch)| *latched == action && latch.is_held())
    }

    fn actuate_axis(&mut self, state: &mut ControlState, axis: &AxisCommand, sample: f32) {
        let channel = axis.channel;
        if !axis.is_valid() {
            debug!("Ignoring axis sample for discrete channel {}", channel);
            return;
        }

        let value = f64::from(sample);
        if !value.is_finite() {
            debug!("Ignoring non-finite sample for {}", channel);
            return;
        }

        match axis.shaping {
            Shaping::Deflection => {
                let shaped = signed_square(value.clamp(-1.0, 1.0));
                let deflected = deflection(channel, shaped);
                state.set(channel, deflected + self.trim.offset(channel));
            }
            Shaping::Brake => {
                state.set(channel, signed_square(value.clamp(-1.0, 1.0)));
            }
            Shaping::Lever => {
                state.set(channel, lever(channel, value.clamp(-1.0, 1.0)));
            }
            Shaping::Relative { gain } => {
                // Relative motion has no reference frame; accumulate around trim
                let base = self.trim.offset(channel);
                let accumulated = &mut self.relative[channel.index()];
                *accumulated = (*accumulated + value * gain)
                    .clamp(channel.minimum() - base, channel.maximum() - base);
                state.set(channel, base + *accumulated);
            }
        }
    }

    fn actuate_key(
        &mut self,
        state: &mut ControlState,
        source: (SourceDevice, ControlOrigin),
        key: &KeyCommand,
        sample: f32,
    ) {
        let pressed = is_pressed(sample);

        if !key.relative {
            self.level_action(state, source, key.action, pressed);
            return;
        }

        match key.action {
            KeyAction::GearUpDown => {
                let edge = self.latch(source, KeyAction::GearUpDown).update(pressed);
                if edge == Some(Edge::Pressed) {
                    self.cycle_gear(state);
                }
            }
            action if pressed => self.momentary_action(state, action),
            _ => {}
        }
    }

    /// Level commands follow the held state of the control. Brakes are
    /// released only once no control bound to them is held.
    fn level_action(
        &mut self,
        state: &mut ControlState,
        source: (SourceDevice, ControlOrigin),
        action: KeyAction,
        pressed: bool,
    ) {
        match action {
            KeyAction::Brakes => {
                let edge = self.latch(source, KeyAction::Brakes).update(pressed);
                if pressed {
                    state.set(ControlChannel::BrakeLeft, ControlChannel::BrakeLeft.maximum());
                    state.set(ControlChannel::BrakeRight, ControlChannel::BrakeRight.maximum());
                } else if edge == Some(Edge::Released) && !self.any_held(KeyAction::Brakes) {
                    state.set(ControlChannel::BrakeLeft, ControlChannel::BrakeLeft.minimum());
                    state.set(ControlChannel::BrakeRight, ControlChannel::BrakeRight.minimum());
                }
            }
            other => {
                // Momentary actions bound as level commands act while held
                if pressed {
                    self.momentary_action(state, other);
                }
            }
        }
    }

    fn momentary_action(&mut self, state: &mut ControlState, action: KeyAction) {
        use ControlChannel::*;

        match action {
            KeyAction::AileronLeft => self.nudge(state, Aileron, 1.0),
            KeyAction::AileronRight => self.nudge(state, Aileron, -1.0),
            KeyAction::ElevatorDown => self.nudge(state, Elevator, 1.0),
            KeyAction::ElevatorUp => self.nudge(state, Elevator, -1.0),
            KeyAction::RudderLeft => self.nudge(state, Rudder, -1.0),
            KeyAction::RudderRight => self.nudge(state, Rudder, 1.0),
            KeyAction::AileronTrimLeft => self.nudge_trim(state, Aileron, 1.0),
            KeyAction::AileronTrimRight => self.nudge_trim(state, Aileron, -1.0),
            KeyAction::ElevatorTrimDown => self.nudge_trim(state, Elevator, 1.0),
            KeyAction::ElevatorTrimUp => self.nudge_trim(state, Elevator, -1.0),
            KeyAction::RudderTrimLeft => self.nudge_trim(state, Rudder, 1.0),
            KeyAction::RudderTrimRight => self.nudge_trim(state, Rudder, -1.0),
            KeyAction::IncreaseFlaps => self.nudge(state, Flaps, 1.0),
            KeyAction::DecreaseFlaps => self.nudge(state, Flaps, -1.0),
            KeyAction::IncreaseThrottle => self.step_group(state, &ControlChannel::THROTTLES, 1.0),
            KeyAction::DecreaseThrottle => self.step_group(state, &ControlChannel::THROTTLES, -1.0),
            KeyAction::IncreasePropeller => {
                self.step_group(state, &ControlChannel::PROPELLERS, 1.0)
            }
            KeyAction::DecreasePropeller => {
                self.step_group(state, &ControlChannel::PROPELLERS, -1.0)
            }
            KeyAction::IncreaseMixture => self.step_group(state, &ControlChannel::MIXTURES, 1.0),
            KeyAction::DecreaseMixture => self.step_group(state, &ControlChannel::MIXTURES, -1.0),
            KeyAction::CenterControls => self.center_controls(state),
            KeyAction::GearDown => state.set(Gear, Gear.maximum()),
            KeyAction::GearUp => state.set(Gear, Gear.minimum()),
            KeyAction::GearUpDown => self.cycle_gear(state),
            KeyAction::Brakes => {
                state.set(BrakeLeft, BrakeLeft.maximum());
                state.set(BrakeRight, BrakeRight.maximum());
            }
        }
    }

    /// Rate step for one dispatch, scaled by the simulation step length
    fn rate(&self, channel: ControlChannel) -> f64 {
        channel.rate_class().base_rate() * self.settings.dt
    }

    fn nudge(&self, state: &mut ControlState, channel: ControlChannel, direction: f64) {
        let value = state.get(channel) + direction * self.rate(channel);
        state.set(channel, value);
    }

    /// Trim moves at a tenth of the surface rate and carries the surface with it
    fn nudge_trim(&mut self, state: &mut ControlState, channel: ControlChannel, direction: f64) {
        let applied = self
            .trim
            .adjust(channel, direction * self.rate(channel) / 10.0);
        if applied != 0.0 {
            state.set(channel, state.get(channel) + applied);
            debug!("Trim {} now {:.5}", channel, self.trim.offset(channel));
        }
    }

    /// Moves every lever of a group by one common step, or none of them.
    /// The step is shortened to the smallest headroom left in the group so
    /// the levers that hit a stop land on it exactly.
    fn step_group(&self, state: &mut ControlState, group: &[ControlChannel], direction: f64) {
        let headroom = |channel: &ControlChannel| {
            let bound = if direction > 0.0 {
                channel.maximum()
            } else {
                channel.minimum()
            };
            (bound, (bound - state.get(*channel)).abs())
        };

        let rate = group
            .iter()
            .map(|channel| self.rate(*channel))
            .fold(f64::INFINITY, f64::min);
        let step = group
            .iter()
            .map(|channel| headroom(channel).1)
            .fold(rate, f64::min);
        if step <= 0.0 {
            debug!("Rejecting group step: a lever is already at its stop");
            return;
        }

        let targets: Vec<_> = group
            .iter()
            .map(|channel| {
                let (bound, room) = headroom(channel);
                let target = if room <= step {
                    bound
                } else {
                    state.get(*channel) + direction * step
                };
                (*channel, target)
            })
            .collect();
        for (channel, target) in targets {
            state.set(channel, target);
        }
    }

    fn center_controls(&self, state: &mut ControlState) {
        for channel in ControlChannel::TRIMMABLE {
            state.set(channel, self.trim.offset(channel));
        }
    }

    fn cycle_gear(&self, state: &mut ControlState) {
        let gear = ControlChannel::Gear;
        let target = if state.get(gear) < 0.5 {
            gear.maximum()
        } else {
            gear.minimum()
        };
        info!("Landing gear {}", if target > 0.5 { "down" } else { "up" });
        state.set(gear, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::channel::RateClass;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn actuator(dt: f64) -> Actuator {
        Actuator::new(ActuatorSettings {
            dt,
            ..ActuatorSettings::default()
        })
    }

    fn key(action: KeyAction) -> Command {
        Command::Key(KeyCommand::new(action))
    }

    fn axis(channel: ControlChannel) -> Command {
        Command::Axis(AxisCommand::new(channel))
    }

    fn value(actuator: &Actuator, channel: ControlChannel) -> f64 {
        actuator.store().get(channel)
    }

    #[test]
    fn initial_state_is_trim_only() {
        let actuator = Actuator::new(ActuatorSettings {
            dt: 0.05,
            trim: TrimState::new(-0.02, 0.01, 0.0),
            initial_controls: vec![(ControlChannel::Gear, 1.0)],
        });
        assert!((value(&actuator, ControlChannel::Elevator) + 0.02).abs() < EPS);
        assert!((value(&actuator, ControlChannel::Aileron) - 0.01).abs() < EPS);
        assert_eq!(value(&actuator, ControlChannel::Gear), 1.0);
        assert_eq!(value(&actuator, ControlChannel::Throttle1), 0.0);
    }

    #[test]
    fn full_elevator_stick_reaches_stops() {
        let mut actuator = actuator(0.05);
        let elevator = ControlChannel::Elevator;

        actuator.apply(&axis(elevator), -1.0);
        assert!((value(&actuator, elevator) - elevator.maximum()).abs() < EPS);

        actuator.apply(&axis(elevator), 1.0);
        assert!((value(&actuator, elevator) - elevator.minimum()).abs() < EPS);
    }

    #[test]
    fn gear_toggles_once_per_press() {
        let mut actuator = actuator(0.05);
        let gear = ControlChannel::Gear;
        let cycle = key(KeyAction::GearUpDown);
        let mut toggles = 0;
        let mut last = value(&actuator, gear);

        // press, hold for many polls, release, press again
        let samples = [PRESSED; 50]
            .into_iter()
            .chain([RELEASED; 10])
            .chain([PRESSED; 25]);
        for sample in samples {
            actuator.apply(&cycle, sample);
            let current = value(&actuator, gear);
            if current != last {
                toggles += 1;
                last = current;
            }
        }
        assert_eq!(toggles, 2);
        assert_eq!(last, 0.0);
    }

    #[test]
    fn held_control_is_not_rearmed_by_an_idle_one() {
        let mut actuator = actuator(0.05);
        let first = SourceDevice { adapter: 0, id: 0 };
        let second = SourceDevice { adapter: 0, id: 1 };
        let gear = key(KeyAction::GearUpDown);
        let brakes = key(KeyAction::Brakes);

        for _ in 0..5 {
            actuator.apply_batch(
                first,
                [
                    (ControlOrigin::Button(1), gear, PRESSED),
                    (ControlOrigin::Button(0), brakes, PRESSED),
                ],
            );
            actuator.apply_batch(
                second,
                [
                    (ControlOrigin::Button(1), gear, RELEASED),
                    (ControlOrigin::Button(0), brakes, RELEASED),
                ],
            );
            // the hat position bound to gear idles in the same pass
            let hat = ControlOrigin::Hat(HatPosition::Up);
            actuator.apply_batch(first, [(hat, gear, RELEASED)]);

            assert_eq!(value(&actuator, ControlChannel::Gear), 1.0);
            assert_eq!(value(&actuator, ControlChannel::BrakeLeft), 1.0);
        }
    }

    #[test]
    fn brakes_stay_set_while_any_control_holds_them() {
        let mut actuator = actuator(0.05);
        let first = SourceDevice { adapter: 0, id: 0 };
        let mouse = SourceDevice { adapter: 1, id: 0 };
        let brakes = key(KeyAction::Brakes);

        actuator.apply_batch(first, [(ControlOrigin::Button(0), brakes, PRESSED)]);
        actuator.apply_batch(mouse, [(ControlOrigin::Button(0), brakes, PRESSED)]);
        actuator.apply_batch(mouse, [(ControlOrigin::Button(0), brakes, RELEASED)]);
        assert_eq!(value(&actuator, ControlChannel::BrakeRight), 1.0);

        actuator.apply_batch(first, [(ControlOrigin::Button(0), brakes, RELEASED)]);
        assert_eq!(value(&actuator, ControlChannel::BrakeRight), 0.0);
    }

    #[test]
    fn forgotten_device_no_longer_holds_brakes() {
        let mut actuator = actuator(0.05);
        let gone = SourceDevice { adapter: 0, id: 4 };
        let mouse = SourceDevice { adapter: 1, id: 0 };
        let brakes = key(KeyAction::Brakes);

        actuator.apply_batch(gone, [(ControlOrigin::Button(0), brakes, PRESSED)]);
        actuator.apply_batch(mouse, [(ControlOrigin::Button(0), brakes, PRESSED)]);
        actuator.forget_device(gone);
        actuator.apply_batch(mouse, [(ControlOrigin::Button(0), brakes, RELEASED)]);
        assert_eq!(value(&actuator, ControlChannel::BrakeLeft), 0.0);
    }

    #[test]
    fn gear_latch_is_per_actuator() {
        let mut first = actuator(0.05);
        let mut second = actuator(0.05);
        let cycle = key(KeyAction::GearUpDown);

        first.apply(&cycle, PRESSED);
        second.apply(&cycle, PRESSED);
        assert_eq!(value(&first, ControlChannel::Gear), 1.0);
        assert_eq!(value(&second, ControlChannel::Gear), 1.0);
    }

    #[test]
    fn nudges_scale_with_dt() {
        let elevator = ControlChannel::Elevator;
        let down = key(KeyAction::ElevatorDown);

        let mut fine = actuator(0.01);
        for _ in 0..20 {
            fine.apply(&down, PRESSED);
        }
        let mut coarse = actuator(0.02);
        for _ in 0..10 {
            coarse.apply(&down, PRESSED);
        }

        let expected = 20.0 * RateClass::Surface.base_rate() * 0.01;
        assert!((value(&fine, elevator) - expected).abs() < EPS);
        assert!((value(&coarse, elevator) - expected).abs() < EPS);
    }

    #[test]
    fn nudges_clamp_at_bounds() {
        let mut actuator = actuator(0.05);
        for _ in 0..1_000 {
            actuator.apply(&key(KeyAction::IncreaseFlaps), PRESSED);
        }
        assert_eq!(
            value(&actuator, ControlChannel::Flaps),
            ControlChannel::Flaps.maximum()
        );
    }

    #[test]
    fn released_samples_do_not_nudge() {
        let mut actuator = actuator(0.05);
        actuator.apply(&key(KeyAction::RudderRight), RELEASED);
        actuator.apply(&key(KeyAction::RudderRight), 0.5);
        assert_eq!(value(&actuator, ControlChannel::Rudder), 0.0);
    }

    #[test]
    fn throttle_group_moves_together() {
        let mut actuator = actuator(0.05);
        actuator.apply(&key(KeyAction::IncreaseThrottle), PRESSED);
        for channel in ControlChannel::THROTTLES {
            assert!((value(&actuator, channel) - RateClass::Engine.base_rate() * 0.05).abs() < EPS);
        }
    }

    #[test]
    fn throttle_group_step_is_shortened_to_the_nearest_stop() {
        let mut actuator = Actuator::new(ActuatorSettings {
            dt: 0.05,
            trim: TrimState::default(),
            initial_controls: vec![
                (ControlChannel::Throttle1, 0.5),
                (ControlChannel::Throttle2, 0.5),
                (ControlChannel::Throttle3, 0.998),
                (ControlChannel::Throttle4, 0.5),
            ],
        });
        actuator.apply(&key(KeyAction::IncreaseThrottle), PRESSED);

        assert_eq!(value(&actuator, ControlChannel::Throttle3), 1.0);
        assert!((value(&actuator, ControlChannel::Throttle1) - 0.502).abs() < EPS);
        assert!((value(&actuator, ControlChannel::Throttle4) - 0.502).abs() < EPS);

        // one lever at its stop holds the whole group
        actuator.apply(&key(KeyAction::IncreaseThrottle), PRESSED);
        assert!((value(&actuator, ControlChannel::Throttle1) - 0.502).abs() < EPS);
        assert_eq!(value(&actuator, ControlChannel::Throttle3), 1.0);
    }

    #[test]
    fn engine_buttons_reach_both_stops() {
        let mut actuator = actuator(0.05);
        let groups = [
            (
                KeyAction::IncreaseThrottle,
                KeyAction::DecreaseThrottle,
                ControlChannel::THROTTLES,
            ),
            (
                KeyAction::IncreasePropeller,
                KeyAction::DecreasePropeller,
                ControlChannel::PROPELLERS,
            ),
            (
                KeyAction::IncreaseMixture,
                KeyAction::DecreaseMixture,
                ControlChannel::MIXTURES,
            ),
        ];
        for (increase, decrease, group) in groups {
            for _ in 0..1_000 {
                actuator.apply(&key(increase), PRESSED);
            }
            for channel in group {
                assert_eq!(value(&actuator, channel), channel.maximum());
            }
            for _ in 0..1_000 {
                actuator.apply(&key(decrease), PRESSED);
            }
            for channel in group {
                assert_eq!(value(&actuator, channel), channel.minimum());
            }
        }
    }

    #[test]
    fn trim_nudge_shifts_surface_and_persists() {
        let mut actuator = actuator(0.05);
        let elevator = ControlChannel::Elevator;
        actuator.apply(&key(KeyAction::ElevatorTrimDown), PRESSED);

        let step = RateClass::Surface.base_rate() * 0.05 / 10.0;
        assert!((actuator.trim().offset(elevator) - step).abs() < EPS);
        assert!((value(&actuator, elevator) - step).abs() < EPS);

        // centered stick now rests on the trim offset
        actuator.apply(&axis(elevator), 0.0);
        assert!((value(&actuator, elevator) - step).abs() < EPS);
    }

    #[test]
    fn trim_is_clamped_to_channel() {
        let mut actuator = actuator(1.0);
        for _ in 0..1_000 {
            actuator.apply(&key(KeyAction::RudderTrimRight), PRESSED);
        }
        assert_eq!(
            actuator.trim().offset(ControlChannel::Rudder),
            ControlChannel::Rudder.minimum()
        );
    }

    #[test]
    fn center_controls_returns_to_trim() {
        let mut actuator = Actuator::new(ActuatorSettings {
            dt: 0.05,
            trim: TrimState::new(0.03, -0.01, 0.005),
            initial_controls: Vec::new(),
        });
        actuator.apply(&axis(ControlChannel::Aileron), 0.8);
        actuator.apply(&axis(ControlChannel::Rudder), -0.6);
        actuator.apply(&key(KeyAction::CenterControls), PRESSED);

        for channel in ControlChannel::TRIMMABLE {
            assert!((value(&actuator, channel) - actuator.trim().offset(channel)).abs() < EPS);
        }
    }

    #[test]
    fn brakes_follow_held_state() {
        let mut actuator = actuator(0.05);
        let brakes = key(KeyAction::Brakes);

        actuator.apply(&brakes, PRESSED);
        assert_eq!(value(&actuator, ControlChannel::BrakeLeft), 1.0);
        assert_eq!(value(&actuator, ControlChannel::BrakeRight), 1.0);

        actuator.apply(&brakes, RELEASED);
        assert_eq!(value(&actuator, ControlChannel::BrakeLeft), 0.0);

        // an idle button must not override a toe brake axis
        actuator.apply(&axis(ControlChannel::BrakeLeft), 0.5);
        actuator.apply(&brakes, RELEASED);
        assert!((value(&actuator, ControlChannel::BrakeLeft) - 0.25).abs() < EPS);
    }

    #[test]
    fn relative_axis_accumulates_and_saturates() {
        let mut actuator = actuator(0.05);
        let aileron = ControlChannel::Aileron;
        let pointer = Command::Axis(AxisCommand::with_shaping(
            aileron,
            Shaping::Relative { gain: 1.0e-3 },
        ));

        actuator.apply(&pointer, 50.0);
        actuator.apply(&pointer, 30.0);
        assert!((value(&actuator, aileron) - 0.08).abs() < EPS);

        actuator.apply(&pointer, 10_000.0);
        assert_eq!(value(&actuator, aileron), aileron.maximum());

        // saturation does not wind up: moving back responds immediately
        actuator.apply(&pointer, -100.0);
        assert!((value(&actuator, aileron) - (aileron.maximum() - 0.1)).abs() < EPS);
    }

    #[test]
    fn lever_axes_map_full_travel() {
        let mut actuator = actuator(0.05);
        actuator.apply(&axis(ControlChannel::Mixture3), -1.0);
        actuator.apply(&axis(ControlChannel::Propeller2), 1.0);
        assert_eq!(value(&actuator, ControlChannel::Mixture3), 1.0);
        assert_eq!(value(&actuator, ControlChannel::Propeller2), 0.0);
    }

    #[test]
    fn reset_restores_initial_conditions() {
        let mut actuator = actuator(0.05);
        actuator.apply(&key(KeyAction::GearUpDown), PRESSED);
        actuator.apply(&key(KeyAction::ElevatorTrimUp), PRESSED);
        actuator.apply(&key(KeyAction::IncreaseThrottle), PRESSED);

        actuator.reset();
        assert_eq!(actuator.store().snapshot(), ControlState::neutral());
        assert_eq!(actuator.trim(), TrimState::default());

        // latch cleared: the next press toggles again
        actuator.apply(&key(KeyAction::GearUpDown), PRESSED);
        assert_eq!(value(&actuator, ControlChannel::Gear), 1.0);
    }

    #[test]
    fn batch_is_published_once() {
        let mut actuator = actuator(0.05);
        let mut reader = actuator.store().reader();
        actuator.apply_batch(
            SourceDevice::default(),
            [
                (ControlOrigin::Axis, axis(ControlChannel::Elevator), -0.5),
                (ControlOrigin::Axis, axis(ControlChannel::Aileron), 0.5),
            ],
        );
        assert!(reader.has_changed());
        let snapshot = reader.snapshot();
        assert!(snapshot.get(ControlChannel::Elevator) > 0.0);
        assert!(snapshot.get(ControlChannel::Aileron) < 0.0);
    }

    proptest! {
        #[test]
        fn trim_and_deflection_compose(
            sample in -1.0_f32..=1.0_f32,
            elevator_trim in -0.436_f64..0.261_f64,
            aileron_trim in -0.261_f64..0.261_f64,
            rudder_trim in -0.261_f64..0.261_f64,
        ) {
            let trim = TrimState::new(elevator_trim, aileron_trim, rudder_trim);
            let mut actuator = Actuator::new(ActuatorSettings {
                dt: 0.05,
                trim,
                initial_controls: Vec::new(),
            });
            for channel in ControlChannel::TRIMMABLE {
                actuator.apply(&axis(channel), sample);
                let shaped = signed_square(f64::from(sample));
                let expected = channel.clamp(deflection(channel, shaped) + trim.offset(channel));
                prop_assert!((value(&actuator, channel) - expected).abs() < EPS);
            }
        }

        #[test]
        fn every_command_keeps_state_in_bounds(
            steps in prop::collection::vec((0..KeyAction::ALL.len(), any::<bool>()), 1..200)
        ) {
            let mut actuator = actuator(0.5);
            for (index, pressed) in steps {
                let sample = if pressed { PRESSED } else { RELEASED };
                actuator.apply(&key(KeyAction::ALL[index]), sample);
            }
            for (channel, value) in actuator.store().snapshot().iter() {
                prop_assert!(channel.contains(value));
            }
        }
    }
}
