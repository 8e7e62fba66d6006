use std::fmt;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Vessel identity
// ---------------------------------------------------------------------------

/// Opaque identifier of a simulated vessel, owned by the host simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VesselId(pub u64);

impl fmt::Display for VesselId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// One independently controllable actuation axis of a vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Steering,
    Throttle,
    RcsTranslate,
    WheelSteering,
    WheelThrottle,
}

impl Channel {
    pub const COUNT: usize = 5;

    /// Every channel, in dispatch order.
    pub const ALL: [Channel; Channel::COUNT] = [
        Channel::Steering,
        Channel::Throttle,
        Channel::RcsTranslate,
        Channel::WheelSteering,
        Channel::WheelThrottle,
    ];

    /// Position of this channel in a per-vessel slot array.
    pub const fn index(self) -> usize {
        match self {
            Channel::Steering => 0,
            Channel::Throttle => 1,
            Channel::RcsTranslate => 2,
            Channel::WheelSteering => 3,
            Channel::WheelThrottle => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Channel::Steering => "steering",
            Channel::Throttle => "throttle",
            Channel::RcsTranslate => "rcs_translate",
            Channel::WheelSteering => "wheel_steering",
            Channel::WheelThrottle => "wheel_throttle",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

// ---------------------------------------------------------------------------
// Channel-typed command values
// ---------------------------------------------------------------------------

/// A resolved actuator command for one channel.
///
/// Vector channels are in the vessel control frame:
/// steering is (pitch, yaw, roll), RCS translate is (x, y, z).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlValue {
    Steering(Vector3<f64>),
    Throttle(f64),
    RcsTranslate(Vector3<f64>),
    WheelSteering(f64),
    WheelThrottle(f64),
}

impl ControlValue {
    pub fn channel(&self) -> Channel {
        match self {
            ControlValue::Steering(_) => Channel::Steering,
            ControlValue::Throttle(_) => Channel::Throttle,
            ControlValue::RcsTranslate(_) => Channel::RcsTranslate,
            ControlValue::WheelSteering(_) => Channel::WheelSteering,
            ControlValue::WheelThrottle(_) => Channel::WheelThrottle,
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            ControlValue::Steering(v) | ControlValue::RcsTranslate(v) => {
                v.iter().all(|c| c.is_finite())
            }
            ControlValue::Throttle(x)
            | ControlValue::WheelSteering(x)
            | ControlValue::WheelThrottle(x) => x.is_finite(),
        }
    }

    /// Clamp to the nominal actuator range.
    ///
    /// Throttle is [0, 1]; wheel axes and every vector component are [-1, 1].
    pub fn clamped(self) -> ControlValue {
        let unit = |v: Vector3<f64>| v.map(|c| c.clamp(-1.0, 1.0));
        match self {
            ControlValue::Steering(v) => ControlValue::Steering(unit(v)),
            ControlValue::Throttle(x) => ControlValue::Throttle(x.clamp(0.0, 1.0)),
            ControlValue::RcsTranslate(v) => ControlValue::RcsTranslate(unit(v)),
            ControlValue::WheelSteering(x) => ControlValue::WheelSteering(x.clamp(-1.0, 1.0)),
            ControlValue::WheelThrottle(x) => ControlValue::WheelThrottle(x.clamp(-1.0, 1.0)),
        }
    }

    /// Flattened (x, y, z) view used by exporters; scalars land in x.
    pub fn components(&self) -> [f64; 3] {
        match self {
            ControlValue::Steering(v) | ControlValue::RcsTranslate(v) => [v.x, v.y, v.z],
            ControlValue::Throttle(x)
            | ControlValue::WheelSteering(x)
            | ControlValue::WheelThrottle(x) => [*x, 0.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_match_dispatch_order() {
        for (i, ch) in Channel::ALL.iter().enumerate() {
            assert_eq!(ch.index(), i, "{} out of order", ch);
        }
    }

    #[test]
    fn value_reports_its_channel() {
        assert_eq!(ControlValue::Throttle(0.5).channel(), Channel::Throttle);
        assert_eq!(
            ControlValue::RcsTranslate(Vector3::zeros()).channel(),
            Channel::RcsTranslate
        );
    }

    #[test]
    fn nan_component_is_not_finite() {
        let v = ControlValue::Steering(Vector3::new(0.0, f64::NAN, 0.0));
        assert!(!v.is_finite());
        assert!(ControlValue::WheelSteering(-0.3).is_finite());
    }

    #[test]
    fn clamping_respects_channel_ranges() {
        assert_eq!(ControlValue::Throttle(-0.2).clamped(), ControlValue::Throttle(0.0));
        assert_eq!(ControlValue::Throttle(1.7).clamped(), ControlValue::Throttle(1.0));
        assert_eq!(
            ControlValue::WheelThrottle(-3.0).clamped(),
            ControlValue::WheelThrottle(-1.0)
        );
        assert_eq!(
            ControlValue::Steering(Vector3::new(2.0, -0.5, -9.0)).clamped(),
            ControlValue::Steering(Vector3::new(1.0, -0.5, -1.0))
        );
    }
}
