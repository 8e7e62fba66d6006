use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::control::{TickReport, VesselControlRegistry};
use super::event::{ControlLossDetector, EventDetector, EventKind, FaultDetector, HostEvent, SimEvent};
use super::recorder::{CommandRecord, CommandRecorder};
use super::script::Script;

// ---------------------------------------------------------------------------
// Host loop configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub dt: f64,
    pub max_time: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.02,        // 50 Hz fixed physics step
            max_time: 60.0,
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Default)]
pub struct SimRun {
    pub script: String,
    pub reports: Vec<TickReport>,
    pub commands: Vec<CommandRecord>,
    pub events: Vec<SimEvent>,
}

impl SimRun {
    pub fn duration(&self) -> f64 {
        self.reports.last().map_or(0.0, |r| r.sim_time)
    }
}

// ---------------------------------------------------------------------------
// Host loop
// ---------------------------------------------------------------------------

/// Deliver every scheduled host event due at `time`.
fn deliver_due(
    pending: &mut VecDeque<HostEvent>,
    time: f64,
    registry: &VesselControlRegistry,
    fleet: &mut CommandRecorder,
    events: &mut Vec<SimEvent>,
) {
    while pending.front().is_some_and(|e| e.time <= time) {
        let Some(event) = pending.pop_front() else {
            break;
        };
        if let EventKind::VesselDestroyed(vessel) = event.kind {
            fleet.remove_vessel(vessel);
            registry.on_vessel_destroyed(vessel);
        }
        debug!(time, kind = ?event.kind, "host event delivered");
        events.push(SimEvent { time, kind: event.kind });
    }
}

/// Drive `registry` like the host simulation would: per step, deliver due
/// host events, let the script run, then tick.
///
/// The loop stops at `max_time`, or earlier once the script is done and no
/// vessel carries control.
pub fn simulate_with(
    registry: &VesselControlRegistry,
    mut fleet: CommandRecorder,
    config: &SimConfig,
    script: &mut dyn Script,
    host_events: &[HostEvent],
) -> SimRun {
    if !(config.dt > 0.0 && config.dt.is_finite() && config.max_time.is_finite()) {
        warn!(dt = config.dt, max_time = config.max_time, "invalid step configuration, nothing simulated");
        return SimRun { script: script.name().to_owned(), ..SimRun::default() };
    }

    let mut pending: Vec<HostEvent> = host_events.to_vec();
    pending.sort_by(|a, b| a.time.total_cmp(&b.time));
    let mut pending = VecDeque::from(pending);

    let steps = (config.max_time / config.dt).floor() as u64;
    let mut reports = Vec::with_capacity((steps as usize + 1).min(200_000));
    let mut events = Vec::new();
    let mut detectors: Vec<Box<dyn EventDetector>> =
        vec![Box::new(ControlLossDetector), Box::new(FaultDetector::new())];

    info!(script = script.name(), dt = config.dt, max_time = config.max_time, "simulation started");

    for step in 0..=steps {
        let time = step as f64 * config.dt;

        deliver_due(&mut pending, time, registry, &mut fleet, &mut events);

        script.step(time, registry);

        fleet.begin_tick(registry.tick_count() + 1, time);
        let report = registry.on_tick(time, &mut fleet);

        if let Some(prev) = reports.last() {
            for det in detectors.iter_mut() {
                if let Some(kind) = det.check(prev, &report) {
                    events.push(SimEvent { time, kind });
                }
            }
        }
        reports.push(report);

        if script.is_done() && registry.vessel_count() == 0 && pending.is_empty() {
            break;
        }
    }

    info!(
        script = script.name(),
        ticks = reports.len(),
        commands = fleet.log().len(),
        "simulation finished"
    );

    SimRun {
        script: script.name().to_owned(),
        reports,
        commands: fleet.into_log(),
        events,
    }
}

/// Run a script against a fresh default registry (convenience wrapper).
pub fn simulate(
    fleet: CommandRecorder,
    config: &SimConfig,
    script: &mut dyn Script,
) -> SimRun {
    let registry = VesselControlRegistry::default();
    simulate_with(&registry, fleet, config, script, &[])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{
        from_fn, Channel, ControlValue, SteeringManager, ThrottleManager, VesselId,
    };
    use crate::sim::recorder::Command;
    use crate::sim::script::Idle;
    use nalgebra::Vector3;

    const A: VesselId = VesselId(1);
    const B: VesselId = VesselId(2);

    /// Install steering, swap its function at t=1, hand control back at t=2.
    #[derive(Default)]
    struct SteerThenRelease {
        manager: Option<SteeringManager>,
        replaced: bool,
        done: bool,
    }

    impl Script for SteerThenRelease {
        fn step(&mut self, t: f64, registry: &VesselControlRegistry) {
            if self.done {
                return;
            }
            if self.manager.is_none() {
                self.manager = Some(registry.vessel(A).manage_steering(from_fn(|_t: f64| Vector3::x())));
                return;
            }
            let Some(m) = self.manager.as_mut() else {
                return;
            };
            if t >= 2.0 {
                m.release();
                self.manager = None;
                self.done = true;
            } else if t >= 1.0 && !self.replaced {
                m.replace(from_fn(|_t: f64| Vector3::y())).unwrap();
                self.replaced = true;
            }
        }

        fn is_done(&self) -> bool {
            self.done
        }

        fn name(&self) -> &str {
            "steer-then-release"
        }
    }

    #[test]
    fn scripted_steering_sequence() {
        let registry = VesselControlRegistry::default();
        let config = SimConfig { dt: 0.5, max_time: 10.0 };
        let mut script = SteerThenRelease::default();
        let run = simulate_with(&registry, CommandRecorder::new([A]), &config, &mut script, &[]);

        let steering: Vec<(f64, Vector3<f64>)> = run
            .commands
            .iter()
            .filter_map(|r| match r.command {
                Command::Channel(ControlValue::Steering(v)) => Some((r.sim_time, v)),
                _ => None,
            })
            .collect();

        assert_eq!(steering[0], (0.0, Vector3::x()));
        assert_eq!(steering[1], (0.5, Vector3::x()));
        assert_eq!(steering[2], (1.0, Vector3::y()), "replacement visible on the same tick");
        assert!(steering.iter().all(|(t, _)| *t < 2.0), "no steering after release");
        assert!(run.events.iter().any(|e| e.kind == EventKind::NativeControlResumed));
        assert!(run.duration() < config.max_time, "loop stops once script is done");
    }

    #[test]
    fn destroyed_vessel_is_collected_mid_run() {
        let registry = VesselControlRegistry::default();
        let a: ThrottleManager = registry.vessel(A).set_throttle(0.5);
        let b: ThrottleManager = registry.vessel(B).set_throttle(0.9);

        let config = SimConfig { dt: 1.0, max_time: 5.0 };
        let events = [HostEvent::vessel_destroyed(2.0, B)];
        let run = simulate_with(&registry, CommandRecorder::new([A, B]), &config, &mut Idle, &events);

        let b_commands = run.commands.iter().filter(|r| r.vessel == B).count();
        assert_eq!(b_commands, 2, "B is commanded at t=0 and t=1 only");
        assert!(!b.is_active());
        assert!(a.is_active());
        assert_eq!(registry.active_channels(A), vec![Channel::Throttle]);
        assert!(run
            .events
            .iter()
            .any(|e| e.kind == EventKind::VesselDestroyed(B) && e.time == 2.0));
    }

    #[test]
    fn non_positive_step_runs_nothing() {
        let registry = VesselControlRegistry::default();
        let _m: ThrottleManager = registry.vessel(A).set_throttle(1.0);
        for dt in [0.0, -0.1, f64::NAN] {
            let config = SimConfig { dt, max_time: 10.0 };
            let run = simulate_with(&registry, CommandRecorder::new([A]), &config, &mut Idle, &[]);
            assert!(run.reports.is_empty(), "dt={} must not tick", dt);
            assert!(run.commands.is_empty());
        }
        assert_eq!(registry.tick_count(), 0);
    }

    #[test]
    fn idle_run_stops_immediately() {
        let run = simulate(CommandRecorder::default(), &SimConfig::default(), &mut Idle);
        assert_eq!(run.reports.len(), 1);
        assert!(run.commands.is_empty());
    }
}
