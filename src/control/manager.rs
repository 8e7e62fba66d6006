use std::fmt;
use std::marker::PhantomData;
use std::sync::Weak;

use crate::error::ControlError;

use super::function::{BoundFunction, ControlFunction};
use super::kind::{self, ChannelKind};
use super::registry::Shared;
use super::types::{Channel, VesselId};

/// Capability token for one (vessel, channel) slot.
///
/// Issued by [`VesselControlRegistry::install`](super::VesselControlRegistry::install).
/// The manager is current while the slot still carries its generation;
/// once superseded or released every operation on it is a harmless no-op.
///
/// Dropping a manager does not release control: the function keeps running
/// until it is released, replaced by another install, or the vessel is gone.
pub struct ControlManager<K: ChannelKind> {
    vessel: VesselId,
    generation: u64,
    released: bool,
    shared: Weak<Shared>,
    _kind: PhantomData<fn() -> K>,
}

pub type SteeringManager = ControlManager<kind::Steering>;
pub type ThrottleManager = ControlManager<kind::Throttle>;
pub type RcsTranslateManager = ControlManager<kind::RcsTranslate>;
pub type WheelSteeringManager = ControlManager<kind::WheelSteering>;
pub type WheelThrottleManager = ControlManager<kind::WheelThrottle>;

impl<K: ChannelKind> ControlManager<K> {
    pub(super) fn new(vessel: VesselId, generation: u64, shared: Weak<Shared>) -> Self {
        Self {
            vessel,
            generation,
            released: false,
            shared,
            _kind: PhantomData,
        }
    }

    pub fn vessel(&self) -> VesselId {
        self.vessel
    }

    pub fn channel(&self) -> Channel {
        K::CHANNEL
    }

    /// Generation this manager believes it owns.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True iff this manager still owns its slot.
    pub fn is_active(&self) -> bool {
        if self.released {
            return false;
        }
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.is_current(self.vessel, K::CHANNEL, self.generation))
    }

    /// Swap in a new function, keeping ownership of the slot.
    ///
    /// Fails with [`ControlError::StaleManager`] when another install took
    /// the slot or the manager was released; nothing is changed in that case.
    pub fn replace<F>(&mut self, function: F) -> Result<(), ControlError>
    where
        F: ControlFunction<K::Output> + 'static,
    {
        if self.released {
            return Err(self.stale());
        }
        let shared = self.shared.upgrade().ok_or(ControlError::RegistryClosed)?;
        let bound = BoundFunction::bind::<K, F>(function);
        match shared.replace(self.vessel, K::CHANNEL, self.generation, bound) {
            Some(next) => {
                self.generation = next;
                Ok(())
            }
            None => Err(self.stale()),
        }
    }

    /// Hand the channel back to native control.
    ///
    /// Returns whether a slot was actually cleared. The manager is unusable
    /// afterwards either way.
    pub fn release(&mut self) -> bool {
        if std::mem::replace(&mut self.released, true) {
            return false;
        }
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.release(self.vessel, K::CHANNEL, self.generation))
    }

    fn stale(&self) -> ControlError {
        ControlError::StaleManager { vessel: self.vessel, channel: K::CHANNEL }
    }
}

impl<K: ChannelKind> fmt::Debug for ControlManager<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlManager")
            .field("vessel", &self.vessel)
            .field("channel", &K::CHANNEL)
            .field("generation", &self.generation)
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::function::{from_fn, Constant};
    use crate::control::{ControlValue, VesselControlRegistry};
    use nalgebra::Vector3;

    const V: VesselId = VesselId(7);

    #[test]
    fn replace_keeps_manager_current() {
        let reg = VesselControlRegistry::default();
        let mut m = reg.install::<kind::Steering, _>(V, Constant(Vector3::x()));
        let first = m.generation();
        m.replace(Constant(Vector3::y())).unwrap();
        assert!(m.is_active(), "replace must not invalidate its own manager");
        assert!(m.generation() > first);
        assert_eq!(
            reg.evaluate(V, Channel::Steering, 0.0),
            Some(ControlValue::Steering(Vector3::y()))
        );
    }

    #[test]
    fn replace_on_superseded_manager_is_stale() {
        let reg = VesselControlRegistry::default();
        let mut old: ThrottleManager = reg.install(V, Constant(0.1));
        let newer: ThrottleManager = reg.install(V, Constant(0.6));

        let err = old.replace(from_fn(|_t: f64| 1.0)).unwrap_err();
        assert_eq!(err, ControlError::StaleManager { vessel: V, channel: Channel::Throttle });
        assert!(newer.is_active());
        assert_eq!(reg.evaluate(V, Channel::Throttle, 0.0), Some(ControlValue::Throttle(0.6)));
    }

    #[test]
    fn replace_after_release_is_stale() {
        let reg = VesselControlRegistry::default();
        let mut m: WheelThrottleManager = reg.install(V, Constant(0.3));
        assert!(m.release());
        assert!(m.replace(Constant(0.9)).is_err());
        assert_eq!(reg.evaluate(V, Channel::WheelThrottle, 0.0), None);
    }

    #[test]
    fn release_is_idempotent() {
        let reg = VesselControlRegistry::default();
        let mut m: RcsTranslateManager = reg.install(V, Constant(Vector3::z()));
        assert!(m.release());
        assert!(!m.release());
        assert!(!m.is_active());
    }

    #[test]
    fn replace_after_registry_dropped() {
        let reg = VesselControlRegistry::default();
        let mut m: WheelSteeringManager = reg.install(V, Constant(0.0));
        drop(reg);
        assert_eq!(m.replace(Constant(1.0)), Err(ControlError::RegistryClosed));
    }

    #[test]
    fn manager_reports_slot() {
        let reg = VesselControlRegistry::default();
        let m: SteeringManager = reg.install(V, Constant(Vector3::zeros()));
        assert_eq!(m.vessel(), V);
        assert_eq!(m.channel(), Channel::Steering);
        let dbg = format!("{:?}", m);
        assert!(dbg.contains("Steering"));
    }
}
