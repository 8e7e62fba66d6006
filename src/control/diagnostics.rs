use std::collections::VecDeque;

use serde::Serialize;

use crate::error::EvaluationError;

use super::types::{Channel, VesselId};

/// One contained evaluation failure: a single (vessel, channel) pair on a
/// single tick. The function stays installed and is retried next tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlFault {
    pub tick: u64,
    pub sim_time: f64,
    pub vessel: VesselId,
    pub channel: Channel,
    /// Name reported by the failing [`ControlFunction`](super::ControlFunction).
    pub function: String,
    pub error: EvaluationError,
}

/// Bounded ring of the most recent faults plus a lifetime counter.
#[derive(Debug)]
pub(crate) struct FaultLog {
    capacity: usize,
    recent: VecDeque<ControlFault>,
    total: u64,
}

impl FaultLog {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            recent: VecDeque::with_capacity(capacity.min(1024)),
            total: 0,
        }
    }

    pub(crate) fn push(&mut self, fault: ControlFault) {
        self.total += 1;
        if self.capacity == 0 {
            return;
        }
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(fault);
    }

    pub(crate) fn recent(&self) -> Vec<ControlFault> {
        self.recent.iter().cloned().collect()
    }

    pub(crate) fn drain(&mut self) -> Vec<ControlFault> {
        self.recent.drain(..).collect()
    }

    pub(crate) fn total(&self) -> u64 {
        self.total
    }
}

/// Fault counts by channel, for run summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FaultCounts {
    pub steering: u64,
    pub throttle: u64,
    pub rcs_translate: u64,
    pub wheel_steering: u64,
    pub wheel_throttle: u64,
}

impl FaultCounts {
    pub fn record(&mut self, channel: Channel) {
        let slot = match channel {
            Channel::Steering => &mut self.steering,
            Channel::Throttle => &mut self.throttle,
            Channel::RcsTranslate => &mut self.rcs_translate,
            Channel::WheelSteering => &mut self.wheel_steering,
            Channel::WheelThrottle => &mut self.wheel_throttle,
        };
        *slot += 1;
    }

    pub fn total(&self) -> u64 {
        self.steering + self.throttle + self.rcs_translate + self.wheel_steering + self.wheel_throttle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fault(tick: u64) -> ControlFault {
        ControlFault {
            tick,
            sim_time: tick as f64,
            vessel: VesselId(1),
            channel: Channel::Throttle,
            function: "closure".into(),
            error: EvaluationError::new("boom"),
        }
    }

    #[test]
    fn log_keeps_most_recent() {
        let mut log = FaultLog::new(2);
        for t in 0..5 {
            log.push(fault(t));
        }
        let ticks: Vec<u64> = log.recent().iter().map(|f| f.tick).collect();
        assert_eq!(ticks, vec![3, 4]);
        assert_eq!(log.total(), 5, "lifetime count includes evicted faults");
    }

    #[test]
    fn zero_capacity_only_counts() {
        let mut log = FaultLog::new(0);
        log.push(fault(0));
        assert!(log.recent().is_empty());
        assert_eq!(log.total(), 1);
    }

    #[test]
    fn drain_empties_log() {
        let mut log = FaultLog::new(4);
        log.push(fault(0));
        assert_eq!(log.drain().len(), 1);
        assert!(log.recent().is_empty());
    }

    #[test]
    fn counts_by_channel() {
        let mut counts = FaultCounts::default();
        counts.record(Channel::Steering);
        counts.record(Channel::Steering);
        counts.record(Channel::WheelThrottle);
        assert_eq!(counts.steering, 2);
        assert_eq!(counts.total(), 3);
    }
}
