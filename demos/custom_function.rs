use nalgebra::Vector3;

use vessel_control::control::ControlFunction;
use vessel_control::error::EvaluationError;
use vessel_control::sim::{simulate_with, CommandRecorder, Script, SimConfig};
use vessel_control::{Channel, VesselControlRegistry, VesselId};

/// Linear pitch-over between two times, holding attitude before and after.
struct PitchProgram {
    start: f64,
    end: f64,
    final_pitch: f64,
}

impl ControlFunction<Vector3<f64>> for PitchProgram {
    fn evaluate(&self, sim_time: f64) -> Result<Vector3<f64>, EvaluationError> {
        if self.end <= self.start {
            return Err(EvaluationError::new("pitch program ends before it starts"));
        }
        let s = ((sim_time - self.start) / (self.end - self.start)).clamp(0.0, 1.0);
        Ok(Vector3::new(self.final_pitch * s, 0.0, 0.0))
    }

    fn name(&self) -> &str {
        "PitchProgram"
    }
}

/// Installs the program once and hands control back at `cutoff`.
struct GravityTurn {
    vessel: VesselId,
    cutoff: f64,
    installed: bool,
    done: bool,
}

impl Script for GravityTurn {
    fn step(&mut self, t: f64, registry: &VesselControlRegistry) {
        let vessel = registry.vessel(self.vessel);
        if !self.installed {
            vessel.manage_steering(PitchProgram { start: 3.0, end: 8.0, final_pitch: -0.4 });
            vessel.set_throttle(1.0);
            self.installed = true;
        } else if t >= self.cutoff && !self.done {
            vessel.release_control();
            self.done = true;
        }
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn name(&self) -> &str {
        "gravity-turn"
    }
}

fn main() {
    let vessel = VesselId(7);
    let registry = VesselControlRegistry::default();
    let config = SimConfig { dt: 0.5, max_time: 30.0 };
    let mut script = GravityTurn { vessel, cutoff: 12.0, installed: false, done: false };

    println!("Simulating with {} script...", script.name());
    let run = simulate_with(&registry, CommandRecorder::new([vessel]), &config, &mut script, &[]);

    for r in run.commands.iter().filter(|r| r.sim_time.fract() == 0.0) {
        if let vessel_control::sim::Command::Channel(v) = r.command {
            if v.channel() == Channel::Steering {
                println!("t={:>5.1}s  pitch={:+.3}", r.sim_time, v.components()[0]);
            }
        }
    }
    println!("Ticks: {}", run.reports.len());
    println!("Faults: {}", registry.total_faults());
}
