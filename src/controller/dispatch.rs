//! Dispatch rule: polled components to `(origin, Command, sample)` triples

use crate::controller::component::{ComponentKind, ComponentSample};
use crate::controls::actuator::{ControlOrigin, PRESSED, RELEASED};
use crate::mapping::command::Command;
use crate::mapping::table::DeviceMappingTable;
use tracing::trace;

/// Resolves one device's samples against its mapping, in component order.
///
/// A hat reading forwards every hat-mapped command of the device: the one at
/// the current position pressed, all others released, each tagged with the
/// position it is bound to. Relative axes that did not move since the last
/// poll are skipped.
pub fn resolve_components<I>(
    table: &DeviceMappingTable,
    device: &str,
    samples: I,
) -> Vec<(ControlOrigin, Command, f32)>
where
    I: IntoIterator<Item = ComponentSample>,
{
    let Some(mapping) = table.device(device) else {
        trace!("No mapping for device '{}'", device);
        return Vec::new();
    };

    let mut commands = Vec::new();
    for sample in samples {
        match ComponentKind::classify(&sample) {
            Some(ComponentKind::Button(index)) => {
                if let Some(command) = mapping.button(index) {
                    let origin = ControlOrigin::Button(index);
                    commands.push((origin, Command::Key(command), sample.value));
                }
            }
            Some(ComponentKind::Hat(position)) => {
                for (mapped, command) in mapping.hat_commands() {
                    let value = if mapped == position { PRESSED } else { RELEASED };
                    let origin = ControlOrigin::Hat(mapped);
                    commands.push((origin, Command::Key(command), value));
                }
            }
            Some(ComponentKind::Axis) => {
                if let Some(command) = mapping.axis(&sample.id) {
                    commands.push((ControlOrigin::Axis, Command::Axis(command), sample.value));
                }
            }
            Some(ComponentKind::RelativeAxis) => {
                if sample.value == 0.0 {
                    continue;
                }
                if let Some(command) = mapping.axis(&sample.id) {
                    commands.push((ControlOrigin::Axis, Command::Axis(command), sample.value));
                }
            }
            None => trace!("Ignoring component '{}' of '{}'", sample.id, device),
        }
    }
    commands
}
