use std::collections::BTreeSet;

use nalgebra::Vector3;

use crate::control::{ActuatorBus, Channel, ControlValue, InputAxis, VesselActuator, VesselId};

// ---------------------------------------------------------------------------
// Recorded commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Channel(ControlValue),
    Input { axis: InputAxis, value: f64 },
}

/// One actuator call as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandRecord {
    pub tick: u64,
    pub sim_time: f64,
    pub vessel: VesselId,
    pub command: Command,
}

// ---------------------------------------------------------------------------
// Recording actuator bus
// ---------------------------------------------------------------------------

/// Stand-in for the host's native actuators: accepts commands for a known
/// set of vessels and keeps a log of every call.
#[derive(Debug, Default)]
pub struct CommandRecorder {
    vessels: BTreeSet<VesselId>,
    log: Vec<CommandRecord>,
    current: Option<VesselId>,
    tick: u64,
    sim_time: f64,
}

impl CommandRecorder {
    pub fn new(vessels: impl IntoIterator<Item = VesselId>) -> Self {
        Self { vessels: vessels.into_iter().collect(), ..Self::default() }
    }

    pub fn add_vessel(&mut self, vessel: VesselId) {
        self.vessels.insert(vessel);
    }

    /// Vessel left the simulation; later commands for it are refused.
    pub fn remove_vessel(&mut self, vessel: VesselId) -> bool {
        self.vessels.remove(&vessel)
    }

    pub fn vessels(&self) -> impl Iterator<Item = VesselId> + '_ {
        self.vessels.iter().copied()
    }

    /// Stamp subsequent records with this tick.
    pub fn begin_tick(&mut self, tick: u64, sim_time: f64) {
        self.tick = tick;
        self.sim_time = sim_time;
    }

    pub fn log(&self) -> &[CommandRecord] {
        &self.log
    }

    pub fn into_log(self) -> Vec<CommandRecord> {
        self.log
    }

    /// Every channel command sent to `vessel` on `channel`, in order.
    pub fn channel_history(&self, vessel: VesselId, channel: Channel) -> Vec<(f64, ControlValue)> {
        self.log
            .iter()
            .filter(|r| r.vessel == vessel)
            .filter_map(|r| match r.command {
                Command::Channel(v) if v.channel() == channel => Some((r.sim_time, v)),
                _ => None,
            })
            .collect()
    }

    /// Most recent command on (vessel, channel), if any.
    pub fn last(&self, vessel: VesselId, channel: Channel) -> Option<ControlValue> {
        self.log.iter().rev().find_map(|r| match r.command {
            Command::Channel(v) if r.vessel == vessel && v.channel() == channel => Some(v),
            _ => None,
        })
    }

    fn push(&mut self, command: Command) {
        // `current` is always set by `actuator()` before any setter runs.
        if let Some(vessel) = self.current {
            self.log.push(CommandRecord {
                tick: self.tick,
                sim_time: self.sim_time,
                vessel,
                command,
            });
        }
    }
}

impl ActuatorBus for CommandRecorder {
    fn actuator(&mut self, vessel: VesselId) -> Option<&mut dyn VesselActuator> {
        if !self.vessels.contains(&vessel) {
            return None;
        }
        self.current = Some(vessel);
        Some(self as &mut dyn VesselActuator)
    }
}

impl VesselActuator for CommandRecorder {
    fn set_steering(&mut self, pitch_yaw_roll: Vector3<f64>) {
        self.push(Command::Channel(ControlValue::Steering(pitch_yaw_roll)));
    }

    fn set_throttle(&mut self, throttle: f64) {
        self.push(Command::Channel(ControlValue::Throttle(throttle)));
    }

    fn set_rcs_translate(&mut self, translate: Vector3<f64>) {
        self.push(Command::Channel(ControlValue::RcsTranslate(translate)));
    }

    fn set_wheel_steering(&mut self, steering: f64) {
        self.push(Command::Channel(ControlValue::WheelSteering(steering)));
    }

    fn set_wheel_throttle(&mut self, throttle: f64) {
        self.push(Command::Channel(ControlValue::WheelThrottle(throttle)));
    }

    fn override_input(&mut self, axis: InputAxis, value: f64) {
        self.push(Command::Input { axis, value });
    }
}
