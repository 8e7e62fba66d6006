use nalgebra::Vector3;

use super::types::{Channel, ControlValue};

/// Compile-time binding of a [`Channel`] to the Rust type its functions produce.
///
/// Managers and installs are generic over a kind, so a throttle function can
/// only ever land in a throttle slot.
pub trait ChannelKind: Send + Sync + 'static {
    type Output: Copy + Send + Sync + 'static;

    const CHANNEL: Channel;

    fn wrap(value: Self::Output) -> ControlValue;
}

/// Attitude command, (pitch, yaw, roll).
#[derive(Debug, Clone, Copy)]
pub struct Steering;

#[derive(Debug, Clone, Copy)]
pub struct Throttle;

/// RCS translation, (x, y, z) in the control frame.
#[derive(Debug, Clone, Copy)]
pub struct RcsTranslate;

#[derive(Debug, Clone, Copy)]
pub struct WheelSteering;

#[derive(Debug, Clone, Copy)]
pub struct WheelThrottle;

impl ChannelKind for Steering {
    type Output = Vector3<f64>;
    const CHANNEL: Channel = Channel::Steering;

    fn wrap(value: Vector3<f64>) -> ControlValue {
        ControlValue::Steering(value)
    }
}

impl ChannelKind for Throttle {
    type Output = f64;
    const CHANNEL: Channel = Channel::Throttle;

    fn wrap(value: f64) -> ControlValue {
        ControlValue::Throttle(value)
    }
}

impl ChannelKind for RcsTranslate {
    type Output = Vector3<f64>;
    const CHANNEL: Channel = Channel::RcsTranslate;

    fn wrap(value: Vector3<f64>) -> ControlValue {
        ControlValue::RcsTranslate(value)
    }
}

impl ChannelKind for WheelSteering {
    type Output = f64;
    const CHANNEL: Channel = Channel::WheelSteering;

    fn wrap(value: f64) -> ControlValue {
        ControlValue::WheelSteering(value)
    }
}

impl ChannelKind for WheelThrottle {
    type Output = f64;
    const CHANNEL: Channel = Channel::WheelThrottle;

    fn wrap(value: f64) -> ControlValue {
        ControlValue::WheelThrottle(value)
    }
}
