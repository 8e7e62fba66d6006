use crate::control::{TickReport, VesselId};

// ---------------------------------------------------------------------------
// Simulation events
// ---------------------------------------------------------------------------

/// Kinds of simulation events.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Host removed a vessel (crash, recovery, despawn).
    VesselDestroyed(VesselId),
    /// Every override went away; native control has all channels again.
    NativeControlResumed,
    /// First tick on which a control function failed.
    FaultsObserved { count: usize },
    Custom(String),
}

/// A discrete event that occurred during simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimEvent {
    pub time: f64,
    pub kind: EventKind,
}

/// Host-side event scheduled ahead of time, delivered before the tick at
/// or after `time`.
#[derive(Debug, Clone, PartialEq)]
pub struct HostEvent {
    pub time: f64,
    pub kind: EventKind,
}

impl HostEvent {
    pub fn vessel_destroyed(time: f64, vessel: VesselId) -> Self {
        Self { time, kind: EventKind::VesselDestroyed(vessel) }
    }
}

/// Trait for passive event detectors.
/// Implementations inspect consecutive tick reports and report events.
pub trait EventDetector {
    fn check(&mut self, prev: &TickReport, current: &TickReport) -> Option<EventKind>;
}

/// Detects the tick on which dispatch drops from some commands to none.
pub struct ControlLossDetector;

impl EventDetector for ControlLossDetector {
    fn check(&mut self, prev: &TickReport, current: &TickReport) -> Option<EventKind> {
        if prev.commands > 0 && current.commands == 0 && current.faults == 0 {
            Some(EventKind::NativeControlResumed)
        } else {
            None
        }
    }
}

/// Fires once, on the first tick with a contained evaluation fault.
#[derive(Default)]
pub struct FaultDetector {
    fired: bool,
}

impl FaultDetector {
    pub fn new() -> Self {
        Self { fired: false }
    }
}

impl EventDetector for FaultDetector {
    fn check(&mut self, _prev: &TickReport, current: &TickReport) -> Option<EventKind> {
        if self.fired || current.faults == 0 {
            return None;
        }
        self.fired = true;
        Some(EventKind::FaultsObserved { count: current.faults })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(commands: usize, faults: usize) -> TickReport {
        TickReport { commands, faults, ..TickReport::default() }
    }

    #[test]
    fn control_loss_detected() {
        let mut det = ControlLossDetector;
        assert_eq!(
            det.check(&report(2, 0), &report(0, 0)),
            Some(EventKind::NativeControlResumed)
        );
        assert!(det.check(&report(0, 0), &report(0, 0)).is_none());
    }

    #[test]
    fn faulted_tick_is_not_control_loss() {
        let mut det = ControlLossDetector;
        assert!(det.check(&report(1, 0), &report(0, 1)).is_none());
    }

    #[test]
    fn fault_detector_fires_once() {
        let mut det = FaultDetector::new();
        assert_eq!(
            det.check(&report(1, 0), &report(0, 2)),
            Some(EventKind::FaultsObserved { count: 2 })
        );
        // Should not fire again
        assert!(det.check(&report(0, 2), &report(0, 3)).is_none());
    }
}
