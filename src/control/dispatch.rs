//! Tick integration: resolve every active slot once per simulation step and
//! push the results into the vessels' native actuators.
//!
//! The slot table is read in one lock acquisition at the start of the tick,
//! so each vessel is seen either entirely before or entirely after any
//! concurrent install/release. Functions are evaluated after the lock is
//! dropped; a function may itself install or release without deadlocking.

use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::Vector3;
use serde::Serialize;
use tracing::{debug, trace};

use super::function::BoundFunction;
use super::overrides::{InputAxis, InputOverride};
use super::registry::VesselControlRegistry;
use super::types::{Channel, ControlValue, VesselId};

// ---------------------------------------------------------------------------
// Outbound actuator interface
// ---------------------------------------------------------------------------

/// The host's native control surface for one vessel.
///
/// Each setter is called at most once per tick, and only for channels that
/// carry an override; untouched channels stay under native/manual control.
pub trait VesselActuator {
    /// Attitude command as (pitch, yaw, roll).
    fn set_steering(&mut self, pitch_yaw_roll: Vector3<f64>);

    /// Main throttle, nominally [0, 1].
    fn set_throttle(&mut self, throttle: f64);

    fn set_rcs_translate(&mut self, translate: Vector3<f64>);

    fn set_wheel_steering(&mut self, steering: f64);

    fn set_wheel_throttle(&mut self, throttle: f64);

    /// One-shot raw input override.
    fn override_input(&mut self, _axis: InputAxis, _value: f64) {}
}

/// Resolves vessels to their actuators for the current tick.
pub trait ActuatorBus {
    /// `None` if the host no longer knows this vessel.
    fn actuator(&mut self, vessel: VesselId) -> Option<&mut dyn VesselActuator>;
}

impl<A: VesselActuator> ActuatorBus for HashMap<VesselId, A> {
    fn actuator(&mut self, vessel: VesselId) -> Option<&mut dyn VesselActuator> {
        self.get_mut(&vessel).map(|a| a as &mut dyn VesselActuator)
    }
}

/// Forward one resolved value to the matching actuator setter.
pub fn apply(actuator: &mut dyn VesselActuator, value: ControlValue) {
    match value {
        ControlValue::Steering(v) => actuator.set_steering(v),
        ControlValue::Throttle(x) => actuator.set_throttle(x),
        ControlValue::RcsTranslate(v) => actuator.set_rcs_translate(v),
        ControlValue::WheelSteering(x) => actuator.set_wheel_steering(x),
        ControlValue::WheelThrottle(x) => actuator.set_wheel_throttle(x),
    }
}

// ---------------------------------------------------------------------------
// Tick report
// ---------------------------------------------------------------------------

/// What a single tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub sim_time: f64,
    /// Vessels that received at least one call.
    pub vessels: usize,
    /// Channel commands dispatched.
    pub commands: usize,
    /// Raw input overrides delivered.
    pub overrides: usize,
    /// Evaluation faults contained this tick.
    pub faults: usize,
}

struct VesselSnapshot {
    vessel: VesselId,
    functions: [Option<Arc<BoundFunction>>; Channel::COUNT],
    overrides: Vec<InputOverride>,
}

// ---------------------------------------------------------------------------
// Host entry points
// ---------------------------------------------------------------------------

impl VesselControlRegistry {
    /// Run one tick: evaluate every active slot at `sim_time` and dispatch.
    pub fn on_tick(&self, sim_time: f64, bus: &mut dyn ActuatorBus) -> TickReport {
        let (tick, mut snapshot) = self.snapshot();

        // Dispatch in ascending vessel id.
        snapshot.sort_by_key(|s| s.vessel);

        let mut report = TickReport { tick, sim_time, ..TickReport::default() };

        for entry in snapshot {
            let Some(actuator) = bus.actuator(entry.vessel) else {
                debug!(
                    vessel = %entry.vessel,
                    tick,
                    overrides = entry.overrides.len(),
                    "vessel has no actuator this tick, skipped"
                );
                self.requeue_overrides(entry.vessel, &entry.overrides);
                continue;
            };

            let mut touched = false;
            for channel in Channel::ALL {
                let Some(function) = &entry.functions[channel.index()] else {
                    continue;
                };
                match self.shared.resolve(tick, entry.vessel, channel, function, sim_time) {
                    Some(value) => {
                        apply(&mut *actuator, value);
                        report.commands += 1;
                        touched = true;
                    }
                    None => report.faults += 1,
                }
            }

            for o in &entry.overrides {
                actuator.override_input(o.axis, o.value);
                report.overrides += 1;
                touched = true;
            }

            if touched {
                report.vessels += 1;
            }
        }

        trace!(
            tick,
            sim_time,
            vessels = report.vessels,
            commands = report.commands,
            faults = report.faults,
            "tick dispatched"
        );
        report
    }

    /// Host notification that `vessel` no longer exists.
    pub fn on_vessel_destroyed(&self, vessel: VesselId) {
        self.release_vessel(vessel);
    }

    /// Put undelivered overrides back, unless a newer write for the same
    /// axis arrived in the meantime.
    fn requeue_overrides(&self, vessel: VesselId, overrides: &[InputOverride]) {
        if overrides.is_empty() {
            return;
        }
        let mut table = self.shared.table.write();
        let pending = &mut table.vessels.entry(vessel).or_default().overrides;
        for o in overrides {
            if !pending.iter().any(|p| p.axis == o.axis) {
                pending.push(*o);
            }
        }
    }

    /// Copy out every vessel's functions and take its pending overrides, all
    /// under one write lock.
    fn snapshot(&self) -> (u64, Vec<VesselSnapshot>) {
        let mut table = self.shared.table.write();
        table.ticks += 1;
        let tick = table.ticks;

        let mut drained = Vec::new();
        let snapshot: Vec<VesselSnapshot> = table
            .vessels
            .iter_mut()
            .map(|(&vessel, slots)| {
                let overrides = std::mem::take(&mut slots.overrides);
                if !overrides.is_empty() {
                    drained.push(vessel);
                }
                VesselSnapshot {
                    vessel,
                    functions: std::array::from_fn(|i| {
                        slots.slots[i].as_ref().map(|s| Arc::clone(&s.function))
                    }),
                    overrides,
                }
            })
            .collect();

        for vessel in drained {
            table.prune(vessel);
        }
        (tick, snapshot)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::function::{from_fn, try_from_fn, Constant};
    use crate::control::kind::{RcsTranslate, Steering, Throttle, WheelSteering, WheelThrottle};
    use crate::error::EvaluationError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Probe {
        steering: Vec<Vector3<f64>>,
        throttle: Vec<f64>,
        rcs: Vec<Vector3<f64>>,
        wheel_steering: Vec<f64>,
        wheel_throttle: Vec<f64>,
        inputs: Vec<(InputAxis, f64)>,
    }

    impl VesselActuator for Probe {
        fn set_steering(&mut self, v: Vector3<f64>) {
            self.steering.push(v);
        }
        fn set_throttle(&mut self, x: f64) {
            self.throttle.push(x);
        }
        fn set_rcs_translate(&mut self, v: Vector3<f64>) {
            self.rcs.push(v);
        }
        fn set_wheel_steering(&mut self, x: f64) {
            self.wheel_steering.push(x);
        }
        fn set_wheel_throttle(&mut self, x: f64) {
            self.wheel_throttle.push(x);
        }
        fn override_input(&mut self, axis: InputAxis, value: f64) {
            self.inputs.push((axis, value));
        }
    }

    const A: VesselId = VesselId(1);
    const B: VesselId = VesselId(2);

    fn bus(ids: &[VesselId]) -> HashMap<VesselId, Probe> {
        ids.iter().map(|&id| (id, Probe::default())).collect()
    }

    #[test]
    fn steering_replace_release_scenario() {
        let reg = VesselControlRegistry::default();
        let mut bus = bus(&[A]);

        let mut m = reg.install::<Steering, _>(A, from_fn(|_t: f64| Vector3::new(1.0, 0.0, 0.0)));
        for t in [0.0, 1.0, 2.0] {
            reg.on_tick(t, &mut bus);
        }
        assert_eq!(bus[&A].steering, vec![Vector3::x(); 3]);

        m.replace(from_fn(|_t: f64| Vector3::new(0.0, 1.0, 0.0))).unwrap();
        reg.on_tick(3.0, &mut bus);
        assert_eq!(bus[&A].steering.last(), Some(&Vector3::y()));

        m.release();
        let report = reg.on_tick(4.0, &mut bus);
        assert_eq!(bus[&A].steering.len(), 4, "no steering command after release");
        assert_eq!(report.commands, 0);
    }

    #[test]
    fn all_channels_dispatch_once_per_tick() {
        let reg = VesselControlRegistry::default();
        let mut bus = bus(&[A]);
        let _s = reg.install::<Steering, _>(A, Constant(Vector3::x()));
        let _t = reg.install::<Throttle, _>(A, Constant(0.8));
        let _r = reg.install::<RcsTranslate, _>(A, Constant(Vector3::z()));
        let _ws = reg.install::<WheelSteering, _>(A, Constant(-0.2));
        let _wt = reg.install::<WheelThrottle, _>(A, Constant(0.4));

        let report = reg.on_tick(0.0, &mut bus);
        assert_eq!(report.commands, 5);
        assert_eq!(report.vessels, 1);
        let p = &bus[&A];
        assert_eq!(p.steering.len(), 1);
        assert_eq!(p.throttle, vec![0.8]);
        assert_eq!(p.rcs, vec![Vector3::z()]);
        assert_eq!(p.wheel_steering, vec![-0.2]);
        assert_eq!(p.wheel_throttle, vec![0.4]);
    }

    #[test]
    fn fault_is_confined_to_one_channel_and_one_tick() {
        let reg = VesselControlRegistry::default();
        let mut bus = bus(&[A, B]);

        let _bad = reg.install::<Throttle, _>(
            A,
            try_from_fn(|t: f64| {
                if t < 1.0 {
                    Err(EvaluationError::new("division by zero"))
                } else {
                    Ok(0.5)
                }
            }),
        );
        let _steer = reg.install::<Steering, _>(A, Constant(Vector3::x()));
        let _other = reg.install::<Throttle, _>(B, Constant(1.0));

        let report = reg.on_tick(0.0, &mut bus);
        assert_eq!(report.faults, 1);
        assert_eq!(report.commands, 2);
        assert!(bus[&A].throttle.is_empty(), "faulted channel gets no command");
        assert_eq!(bus[&A].steering.len(), 1, "sibling channel still dispatched");
        assert_eq!(bus[&B].throttle, vec![1.0], "other vessel still dispatched");

        let report = reg.on_tick(1.0, &mut bus);
        assert_eq!(report.faults, 0);
        assert_eq!(bus[&A].throttle, vec![0.5], "function retried on the next tick");
        assert_eq!(reg.faults()[0].tick, 1);
    }

    #[test]
    fn release_all_leaves_other_vessel_active() {
        let reg = VesselControlRegistry::default();
        let mut bus = bus(&[A, B]);
        let a = reg.install::<Throttle, _>(A, Constant(0.3));
        let b = reg.install::<Throttle, _>(B, Constant(0.6));

        reg.release_all(A);
        assert!(!a.is_active());
        assert!(b.is_active());

        reg.on_tick(0.0, &mut bus);
        assert!(bus[&A].throttle.is_empty());
        assert_eq!(bus[&B].throttle, vec![0.6]);
    }

    #[test]
    fn release_all_is_atomic_against_concurrent_ticks() {
        for _ in 0..200 {
            let reg = VesselControlRegistry::default();
            let _s = reg.install::<Steering, _>(A, Constant(Vector3::x()));
            let _t = reg.install::<Throttle, _>(A, Constant(1.0));

            let releaser = {
                let reg = reg.clone();
                std::thread::spawn(move || reg.release_all(A))
            };

            let mut observed = Vec::new();
            loop {
                let mut bus = bus(&[A]);
                let report = reg.on_tick(0.0, &mut bus);
                observed.push(report.commands);
                if report.commands == 0 {
                    break;
                }
            }
            assert_eq!(releaser.join().unwrap(), 2);
            assert!(
                observed.iter().all(|&c| c == 0 || c == 2),
                "tick observed a partially released vessel: {:?}",
                observed
            );
        }
    }

    #[test]
    fn overrides_are_one_shot() {
        let reg = VesselControlRegistry::default();
        let mut bus = bus(&[A]);
        reg.override_input(A, InputAxis::Pitch, 0.25);

        let report = reg.on_tick(0.0, &mut bus);
        assert_eq!(report.overrides, 1);
        reg.on_tick(0.1, &mut bus);
        assert_eq!(bus[&A].inputs, vec![(InputAxis::Pitch, 0.25)]);
        assert_eq!(reg.vessel_count(), 0, "drained override entry is pruned");
    }

    #[test]
    fn unknown_vessel_is_skipped_and_kept() {
        let reg = VesselControlRegistry::default();
        let mut bus = bus(&[A]);
        let ghost = reg.install::<Throttle, _>(B, Constant(1.0));
        let report = reg.on_tick(0.0, &mut bus);
        assert_eq!(report.vessels, 0);
        assert!(ghost.is_active(), "only a destroy notification removes the slot");

        reg.on_vessel_destroyed(B);
        assert!(!ghost.is_active());
    }

    #[test]
    fn panicking_function_is_contained_to_its_channel() {
        let reg = VesselControlRegistry::default();
        let mut bus = bus(&[A, B]);
        let _bad = reg.install::<Throttle, _>(
            A,
            from_fn(|_t: f64| {
                let samples: Vec<f64> = Vec::new();
                samples[0]
            }),
        );
        let _good = reg.install::<Throttle, _>(B, Constant(0.7));

        let report = reg.on_tick(0.0, &mut bus);
        assert_eq!(report.faults, 1);
        assert_eq!(report.commands, 1);
        assert!(bus[&A].throttle.is_empty());
        assert_eq!(bus[&B].throttle, vec![0.7], "other vessel dispatched in the same tick");

        let faults = reg.faults();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].vessel, A);
        assert!(faults[0].error.message().contains("panicked"));
        assert!(reg.has_overrides(A), "panicking function stays installed");
    }

    #[test]
    fn overrides_survive_a_tick_without_actuator() {
        let reg = VesselControlRegistry::default();
        reg.override_input(A, InputAxis::Pitch, 0.3);

        let mut empty: HashMap<VesselId, Probe> = HashMap::new();
        let report = reg.on_tick(0.0, &mut empty);
        assert_eq!(report.overrides, 0);
        assert_eq!(
            reg.pending_overrides(A),
            vec![InputOverride { axis: InputAxis::Pitch, value: 0.3 }],
            "undelivered override is kept for the next tick"
        );

        let mut bus = bus(&[A]);
        reg.on_tick(0.1, &mut bus);
        assert_eq!(bus[&A].inputs, vec![(InputAxis::Pitch, 0.3)]);
        assert!(reg.pending_overrides(A).is_empty());
    }

    #[test]
    fn function_may_release_from_inside_a_tick() {
        let reg = VesselControlRegistry::default();
        let mut bus = bus(&[A]);
        let handle = reg.clone();
        let _m = reg.install::<Throttle, _>(
            A,
            from_fn(move |_t: f64| {
                handle.release_all(A);
                1.0
            }),
        );

        reg.on_tick(0.0, &mut bus);
        assert_eq!(bus[&A].throttle, vec![1.0], "snapshot taken before the release");
        reg.on_tick(1.0, &mut bus);
        assert_eq!(bus[&A].throttle.len(), 1);
    }

    #[test]
    fn functions_only_run_inside_ticks() {
        let reg = VesselControlRegistry::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut m = reg.install::<Throttle, _>(
            A,
            from_fn(move |_t: f64| {
                counter.fetch_add(1, Ordering::SeqCst);
                0.0
            }),
        );
        assert!(m.is_active());
        m.replace(Constant(0.5)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0, "install/replace never evaluate");
    }
}
