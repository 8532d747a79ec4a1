//! Numeric transforms applied to continuous device readings

use crate::controls::channel::ControlChannel;

/// Squares a reading while keeping its sign; softens response near center
pub fn signed_square(value: f64) -> f64 {
    value * value.abs()
}

/// Maps a shaped reading onto the channel's asymmetric travel.
///
/// Non-positive readings scale `maximum`, positive readings scale `minimum`, so a
/// stick pushed fully forward (-1) commands the full positive deflection.
pub fn deflection(channel: ControlChannel, shaped: f64) -> f64 {
    if shaped <= 0.0 {
        channel.maximum() * shaped.abs()
    } else {
        channel.minimum() * shaped
    }
}

/// Lever style mapping: -1 is full travel, +1 is the minimum stop
pub fn lever(channel: ControlChannel, value: f64) -> f64 {
    let fraction = (1.0 - value) / 2.0;
    channel.minimum() + (channel.maximum() - channel.minimum()) * fraction
}
