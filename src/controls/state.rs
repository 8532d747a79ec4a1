//! Control state vector and its shared store
//!
//! [`ControlState`] holds one value per [`ControlChannel`] and never lets a value
//! leave the channel's bounds. [`ControlStateStore`] publishes the vector through a
//! `tokio::sync::watch` channel: every write batch replaces the whole vector under
//! the channel's lock, so a reader always sees a complete vector from one batch.

use crate::controls::channel::ControlChannel;
use std::fmt;
use tokio::sync::watch;
use tracing::{debug, trace};

/// Bounded value for every control channel
#[derive(Clone, Copy, PartialEq)]
pub struct ControlState {
    values: [f64; ControlChannel::COUNT],
}

impl ControlState {
    /// Every channel at zero, or at its nearest bound if zero lies outside its range
    pub fn neutral() -> Self {
        let mut values = [0.0; ControlChannel::COUNT];
        for channel in ControlChannel::ALL {
            values[channel.index()] = channel.clamp(0.0);
        }
        Self { values }
    }

    pub fn get(&self, channel: ControlChannel) -> f64 {
        self.values[channel.index()]
    }

    /// Writes a value, clamped to the channel bounds. Non-finite values are dropped.
    pub fn set(&mut self, channel: ControlChannel, value: f64) {
        if !value.is_finite() {
            debug!("Dropping non-finite value {} for {}", value, channel);
            return;
        }
        let clamped = channel.clamp(value);
        if clamped != value {
            trace!("Clamped {} from {:.4} to {:.4}", channel, value, clamped);
        }
        self.values[channel.index()] = clamped;
    }

    pub fn iter(&self) -> impl Iterator<Item = (ControlChannel, f64)> + '_ {
        ControlChannel::ALL
            .iter()
            .map(move |channel| (*channel, self.values[channel.index()]))
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::neutral()
    }
}

impl fmt::Debug for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(channel, value)| (channel.name(), value)))
            .finish()
    }
}

/// Canonical shared control state, written by the actuator only
#[derive(Debug)]
pub struct ControlStateStore {
    sender: watch::Sender<ControlState>,
}

impl ControlStateStore {
    pub fn new(initial: ControlState) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    pub fn get(&self, channel: ControlChannel) -> f64 {
        self.sender.borrow().get(channel)
    }

    /// Runs one write batch against the vector while holding the store lock.
    /// Every `set` reaches the store through a batch.
    pub(crate) fn update(&self, batch: impl FnOnce(&mut ControlState)) {
        self.sender.send_modify(batch);
    }

    /// Immutable copy of the full vector
    pub fn snapshot(&self) -> ControlState {
        *self.sender.borrow()
    }

    /// Read-only view for consumers such as the dynamics integrator
    pub fn reader(&self) -> ControlStateReader {
        ControlStateReader {
            receiver: self.sender.subscribe(),
        }
    }
}

/// Read side of the store
#[derive(Debug, Clone)]
pub struct ControlStateReader {
    receiver: watch::Receiver<ControlState>,
}

impl ControlStateReader {
    /// Most recently completed batch
    pub fn snapshot(&mut self) -> ControlState {
        *self.receiver.borrow_and_update()
    }

    /// True when a batch was published since the last snapshot
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }
}
