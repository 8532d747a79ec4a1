//! Pointer adapter
//!
//! The windowing layer forwards raw pointer input as [`PointerEvent`]s over a
//! bounded channel. Motion arrives as deltas with no reference frame, so the
//! adapter only sums them between polls; a poll latches the sums as the `x`,
//! `y` and `wheel` relative samples and starts a fresh accumulation. Turning
//! deltas into positions is the actuator's job.

use crate::controller::component::ComponentSample;
use crate::controller::{DeviceAdapter, DeviceCategory, DeviceError, DeviceHandle};
use std::collections::BTreeMap;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::{debug, info, warn};

/// Raw pointer input as reported by the windowing layer
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Added { id: usize, name: String },
    Removed { id: usize },
    Motion { id: usize, dx: f64, dy: f64 },
    Wheel { id: usize, delta: f64 },
    Button { id: usize, index: u16, pressed: bool },
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Deltas {
    x: f64,
    y: f64,
    wheel: f64,
}

#[derive(Debug)]
struct PointerDevice {
    name: String,
    pending: Deltas,
    latched: Deltas,
    buttons: BTreeMap<u16, bool>,
}

impl PointerDevice {
    fn new(name: String) -> Self {
        Self {
            name,
            pending: Deltas::default(),
            latched: Deltas::default(),
            buttons: BTreeMap::new(),
        }
    }
}

/// Producer side, owned by the windowing layer
#[derive(Debug, Clone)]
pub struct PointerSender {
    sender: mpsc::Sender<PointerEvent>,
}

impl PointerSender {
    /// Never blocks the windowing thread; a full channel drops the event
    pub fn send(&self, event: PointerEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                debug!("Pointer event channel full, dropping {:?}", event);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

#[derive(Debug)]
pub struct PointerAdapter {
    events: mpsc::Receiver<PointerEvent>,
    devices: BTreeMap<usize, PointerDevice>,
    closed: bool,
}

impl PointerAdapter {
    /// Adapter plus the sender the windowing layer feeds it through
    pub fn channel(capacity: usize) -> (PointerSender, Self) {
        let (sender, events) = mpsc::channel(capacity);
        debug!("Created pointer event channel with capacity {}", capacity);
        (
            PointerSender { sender },
            Self {
                events,
                devices: BTreeMap::new(),
                closed: false,
            },
        )
    }

    fn pump_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.handle_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.closed {
                        warn!("Pointer event channel closed, pointer devices are gone");
                        self.closed = true;
                        self.devices.clear();
                    }
                    break;
                }
            }
        }
    }

    fn handle_event(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Added { id, name } => {
                info!("Pointer device added: '{}' (#{})", name, id);
                self.devices.insert(id, PointerDevice::new(name));
            }
            PointerEvent::Removed { id } => {
                if let Some(device) = self.devices.remove(&id) {
                    warn!("Pointer device removed: '{}' (#{})", device.name, id);
                }
            }
            PointerEvent::Motion { id, dx, dy } => {
                if let Some(device) = self.devices.get_mut(&id) {
                    device.pending.x += dx;
                    device.pending.y += dy;
                }
            }
            PointerEvent::Wheel { id, delta } => {
                if let Some(device) = self.devices.get_mut(&id) {
                    device.pending.wheel += delta;
                }
            }
            PointerEvent::Button { id, index, pressed } => {
                if let Some(device) = self.devices.get_mut(&id) {
                    device.buttons.insert(index, pressed);
                }
            }
        }
    }
}

impl DeviceAdapter for PointerAdapter {
    fn category(&self) -> DeviceCategory {
        DeviceCategory::Pointer
    }

    fn connected_devices(&mut self) -> Vec<DeviceHandle> {
        self.pump_events();
        self.devices
            .iter()
            .map(|(id, device)| DeviceHandle::new(*id, device.name.clone()))
            .collect()
    }

    fn poll(&mut self, device: &DeviceHandle) -> Result<(), DeviceError> {
        self.pump_events();
        if self.closed {
            return Err(DeviceError::poll_failure(device, "pointer event channel closed"));
        }
        let Some(pointer) = self.devices.get_mut(&device.id) else {
            return Err(DeviceError::poll_failure(device, "pointer device removed"));
        };
        pointer.latched = std::mem::take(&mut pointer.pending);
        Ok(())
    }

    fn active_components(
        &self,
        device: &DeviceHandle,
    ) -> Box<dyn Iterator<Item = ComponentSample> + '_> {
        let Some(pointer) = self.devices.get(&device.id) else {
            return Box::new(std::iter::empty());
        };
        let deltas = pointer.latched;
        let axes = [("x", deltas.x), ("y", deltas.y), ("wheel", deltas.wheel)]
            .into_iter()
            .map(|(id, delta)| ComponentSample::relative_axis(id, delta as f32));
        let buttons = pointer
            .buttons
            .iter()
            .map(|(index, pressed)| ComponentSample::button(*index, *pressed));
        Box::new(axes.chain(buttons))
    }
}
