use crate::control::VesselControlRegistry;

/// Scripted code driving vessels through the registry.
///
/// Implement this to plug an autopilot script into the host loop. `step`
/// runs once per simulation step, before that step's tick, and may
/// install, replace or release control freely.
pub trait Script {
    fn step(&mut self, sim_time: f64, registry: &VesselControlRegistry);

    /// The script has nothing left to do; the loop may stop early once no
    /// vessel carries control either.
    fn is_done(&self) -> bool {
        false
    }

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// A script that never touches the registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct Idle;

impl Script for Idle {
    fn step(&mut self, _sim_time: f64, _registry: &VesselControlRegistry) {}

    fn is_done(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "idle"
    }
}
