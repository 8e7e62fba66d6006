use vessel_control::control::from_fn;
use vessel_control::io::csv;
use vessel_control::io::json::{self, RunSummary};
use vessel_control::sim::{simulate_with, CommandRecorder, HostEvent, Script, SimConfig};
use vessel_control::{VesselControlRegistry, VesselId};

/// Two rovers drive in formation until the lead one is lost.
struct Convoy {
    started: bool,
}

impl Script for Convoy {
    fn step(&mut self, _t: f64, registry: &VesselControlRegistry) {
        if self.started {
            return;
        }
        for (id, offset) in [(VesselId(1), 0.0), (VesselId(2), 0.5)] {
            let rover = registry.vessel(id);
            rover.manage_wheel_throttle(from_fn(move |t: f64| ((t - offset) / 5.0).clamp(0.0, 0.8)));
            rover.manage_wheel_steering(from_fn(move |t: f64| 0.1 * (t + offset).sin()));
        }
        self.started = true;
    }

    fn is_done(&self) -> bool {
        self.started
    }

    fn name(&self) -> &str {
        "convoy"
    }
}

fn main() {
    let registry = VesselControlRegistry::default();
    let config = SimConfig { dt: 0.1, max_time: 20.0 };
    let events = [
        HostEvent::vessel_destroyed(12.0, VesselId(1)),
        HostEvent::vessel_destroyed(15.0, VesselId(2)),
    ];

    println!("Simulating convoy ...");
    let run = simulate_with(
        &registry,
        CommandRecorder::new([VesselId(1), VesselId(2)]),
        &config,
        &mut Convoy { started: false },
        &events,
    );

    let summary = RunSummary::from_run(&run, &registry.faults());
    println!("Ticks: {}", summary.ticks);
    println!("Commands: {}", summary.commands);
    println!("Duration: {:.1} s", summary.duration_s);

    csv::write_commands_file("convoy_commands.csv", &run.commands)
        .expect("Failed to write CSV");
    json::write_summary_file("convoy_summary.json", &summary)
        .expect("Failed to write JSON");

    println!("Exported: convoy_commands.csv, convoy_summary.json");
}
