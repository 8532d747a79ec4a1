//! Input loop
//!
//! Runs on its own OS thread so a slow driver call can never stall the
//! simulation loop. Lifecycle: `Discovering` enumerates every adapter once and
//! reports empty categories, then `Polling` runs fixed-cadence cycles until the
//! cancellation token fires.
//!
//! Each cycle polls every device seen so far. A device that fails is skipped for
//! that cycle and its channels keep their last values; the failure is logged
//! once when it starts and once when the device recovers. A failed device that
//! its adapter no longer lists is forgotten.

use crate::controller::dispatch::resolve_components;
use crate::controller::{DeviceAdapter, DeviceError, DeviceHandle};
use crate::controls::actuator::{Actuator, SourceDevice};
use crate::controls::state::ControlStateStore;
use crate::mapping::table::DeviceMappingTable;
use chrono::Local;
use statum::{machine, state};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Clone, Debug)]
pub struct InputLoopSettings {
    pub poll_interval: Duration,
    pub stats_interval: chrono::Duration,
}

impl Default for InputLoopSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(20),
            stats_interval: chrono::Duration::seconds(10),
        }
    }
}

/// Outcome of one polling cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub polled: usize,
    pub failed: usize,
    pub commands: usize,
}

#[state]
#[derive(Debug, Clone)]
pub enum LoopState {
    Discovering,
    Polling,
}

#[machine]
#[derive(Debug)]
pub struct InputLoop<S: LoopState> {
    adapters: Vec<Box<dyn DeviceAdapter>>,

    // Devices seen so far, one set per adapter
    known: Vec<BTreeSet<DeviceHandle>>,

    // (adapter index, device) pairs whose last poll failed
    failing: HashSet<(usize, DeviceHandle)>,

    table: DeviceMappingTable,
    actuator: Actuator,
    settings: InputLoopSettings,

    // Simulation restart requests
    reset_requests: watch::Receiver<()>,
}

impl<S: LoopState> InputLoop<S> {
    /// Store the actuator writes to
    pub fn store(&self) -> Arc<ControlStateStore> {
        self.actuator.store()
    }
}

impl InputLoop<Discovering> {
    pub fn create(
        adapters: Vec<Box<dyn DeviceAdapter>>,
        table: DeviceMappingTable,
        actuator: Actuator,
        settings: InputLoopSettings,
        reset_requests: watch::Receiver<()>,
    ) -> Self {
        debug!(
            "Creating input loop with {} adapters, settings: {:?}",
            adapters.len(),
            settings
        );
        let known = vec![BTreeSet::new(); adapters.len()];
        Self::new(
            adapters,
            known,
            HashSet::new(),
            table,
            actuator,
            settings,
            reset_requests,
        )
    }

    /// Enumerates every adapter. Empty categories are reported, never fatal.
    pub fn discover(mut self) -> InputLoop<Polling> {
        for (adapter, known) in self.adapters.iter_mut().zip(self.known.iter_mut()) {
            let devices = adapter.connected_devices();
            if devices.is_empty() {
                warn!("{}", DeviceError::Unavailable(adapter.category()));
                continue;
            }

            info!("Found {} {} devices:", devices.len(), adapter.category());
            for device in devices {
                if self.table.device(&device.name).is_some() {
                    info!("  {} (mapped)", device);
                } else {
                    info!("  {} (no mapping, ignored)", device);
                }
                known.insert(device);
            }
        }

        info!("Device discovery finished, transitioning to Polling state");
        self.transition()
    }
}

impl InputLoop<Polling> {
    /// Polls every known device once and applies each device's commands as
    /// one store batch.
    pub fn run_cycle(&mut self) -> CycleReport {
        if self.reset_requests.has_changed().unwrap_or(false) {
            self.reset_requests.borrow_and_update();
            self.actuator.reset();
        }

        let mut report = CycleReport::default();
        for (index, (adapter, known)) in self
            .adapters
            .iter_mut()
            .zip(self.known.iter_mut())
            .enumerate()
        {
            let listed = adapter.connected_devices();
            let failing = &mut self.failing;
            let actuator = &mut self.actuator;
            known.retain(|device| {
                let key = (index, device.clone());
                if listed.contains(device) || !failing.remove(&key) {
                    return true;
                }
                info!("Forgetting disconnected device {}", device);
                actuator.forget_device(SourceDevice {
                    adapter: index,
                    id: device.id,
                });
                false
            });

            for device in listed {
                if !known.contains(&device) {
                    info!("New {} device: {}", adapter.category(), device);
                    known.insert(device);
                }
            }

            for device in known.iter() {
                let key = (index, device.clone());
                if let Err(e) = adapter.poll(device) {
                    report.failed += 1;
                    if self.failing.insert(key) {
                        warn!("{}", e);
                    }
                    continue;
                }
                if self.failing.remove(&key) {
                    info!("Device {} is responding again", device);
                }

                report.polled += 1;
                let commands = resolve_components(
                    &self.table,
                    &device.name,
                    adapter.active_components(device),
                );
                report.commands += commands.len();
                if !commands.is_empty() {
                    let source = SourceDevice {
                        adapter: index,
                        id: device.id,
                    };
                    self.actuator.apply_batch(source, commands);
                }
            }
        }
        report
    }

    /// Runs cycles at the configured cadence until `cancel` fires
    pub fn run(&mut self, cancel: &CancellationToken) {
        info!(
            "Starting input loop, poll interval {:?}",
            self.settings.poll_interval
        );

        let mut cycles: u64 = 0;
        let mut commands: usize = 0;
        let mut last_log_time = Local::now();

        while !cancel.is_cancelled() {
            let started = Instant::now();
            let report = self.run_cycle();
            cycles += 1;
            commands += report.commands;

            let now = Local::now();
            if now - last_log_time > self.settings.stats_interval {
                let seconds = self.settings.stats_interval.num_seconds().max(1) as f64;
                info!(
                    "Input loop stats: {} cycles, {} commands in last {} seconds (avg {:.2} cycles/sec), {} devices failing",
                    cycles,
                    commands,
                    seconds,
                    cycles as f64 / seconds,
                    self.failing.len()
                );
                cycles = 0;
                commands = 0;
                last_log_time = now;
            }

            if let Some(remaining) = self.settings.poll_interval.checked_sub(started.elapsed()) {
                thread::sleep(remaining);
            }
        }

        info!("Input loop stopped");
    }
}

/// Running input thread
#[derive(Debug)]
pub struct InputLoopHandle {
    thread: JoinHandle<()>,
}

impl InputLoopHandle {
    /// Discovers devices and starts polling on a dedicated thread
    pub fn spawn(
        input_loop: InputLoop<Discovering>,
        cancel: CancellationToken,
    ) -> std::io::Result<Self> {
        let thread = thread::Builder::new()
            .name("input-loop".to_string())
            .spawn(move || {
                let mut polling = input_loop.discover();
                polling.run(&cancel);
            })?;
        debug!("Input loop thread spawned");
        Ok(Self { thread })
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Blocks until the thread exits; false if it panicked
    pub fn join(self) -> bool {
        match self.thread.join() {
            Ok(()) => true,
            Err(_) => {
                error!("Input loop thread panicked");
                false
            }
        }
    }
}
