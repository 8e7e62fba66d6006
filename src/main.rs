use nalgebra::Vector3;
use tracing::{info, warn};

use vessel_control::control::{
    from_fn, try_from_fn, Channel, RcsTranslateManager, SteeringManager, ThrottleManager,
    WheelThrottleManager,
};
use vessel_control::error::EvaluationError;
use vessel_control::io::json::RunSummary;
use vessel_control::sim::{simulate_with, CommandRecorder, HostEvent, Script, SimConfig};
use vessel_control::{ControlConfig, VesselControlRegistry, VesselId};

const ROCKET: VesselId = VesselId(1);
const ROVER: VesselId = VesselId(2);

/// Launch-day script: a gravity-turn rocket and a rover driving off the pad.
#[derive(Default)]
struct LaunchDirector {
    steering: Option<SteeringManager>,
    throttle: Option<ThrottleManager>,
    rcs: Option<RcsTranslateManager>,
    rover: Option<WheelThrottleManager>,
    stage: u8,
}

impl Script for LaunchDirector {
    fn step(&mut self, t: f64, registry: &VesselControlRegistry) {
        let rocket = registry.vessel(ROCKET);
        let rover = registry.vessel(ROVER);

        match self.stage {
            0 => {
                // Pitch program: 0 -> -0.3 over the first 4 s
                self.steering = Some(rocket.manage_steering(from_fn(|t: f64| {
                    Vector3::new(-0.3 * (t / 4.0).min(1.0), 0.0, 0.0)
                })));
                self.throttle = Some(rocket.set_throttle(1.0));
                rover.set_wheel_steering(0.2);
                self.rover = Some(rover.manage_wheel_throttle(from_fn(|t: f64| (t / 2.0).min(1.0))));
                self.stage = 1;
            }
            1 if t >= 1.0 => {
                rocket.override_input_roll(0.5);
                // Ullage thruster that loses its data source after t=3.5
                self.rcs = Some(rocket.manage_rcs_translate(try_from_fn(|t: f64| {
                    if t < 3.5 {
                        Ok(Vector3::new(0.0, 0.0, 0.2))
                    } else {
                        Err(EvaluationError::new("ullage sensor offline"))
                    }
                })));
                self.stage = 2;
            }
            2 if t >= 2.0 => {
                if let Some(m) = self.throttle.as_mut() {
                    // Throttle bucket through max-q
                    if let Err(err) = m.replace(from_fn(|t: f64| if t < 3.0 { 0.7 } else { 1.0 })) {
                        warn!(%err, "throttle bucket not applied");
                    }
                }
                self.stage = 3;
            }
            3 if t >= 4.0 => {
                if let Some(m) = self.steering.as_mut() {
                    m.release();
                }
                if let Some(m) = self.rcs.as_mut() {
                    m.release();
                }
                self.stage = 4;
            }
            4 if t >= 5.0 => {
                let n = rover.release_control();
                info!(released = n, "rover handed back to its driver");
                self.stage = 5;
            }
            _ => {}
        }
    }

    fn is_done(&self) -> bool {
        self.stage >= 5
    }

    fn name(&self) -> &str {
        "launch-director"
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vessel_control=info".parse()?),
        )
        .init();

    let control_config = match std::env::args().nth(1) {
        Some(path) => ControlConfig::from_json_file(&path)?,
        None => ControlConfig::default(),
    };

    let registry = VesselControlRegistry::new(control_config.clone());
    let config = SimConfig { dt: 0.1, max_time: 20.0 };
    let host_events = [HostEvent::vessel_destroyed(8.0, ROCKET)];

    let mut script = LaunchDirector::default();
    let run = simulate_with(
        &registry,
        CommandRecorder::new([ROCKET, ROVER]),
        &config,
        &mut script,
        &host_events,
    );
    let faults = registry.faults();
    let summary = RunSummary::from_run(&run, &faults);

    // -----------------------------------------------------------------------
    // Print results
    // -----------------------------------------------------------------------
    println!();
    println!("====================================================================");
    println!("  VESSEL CONTROL RUN: {}", summary.script);
    println!("====================================================================");
    println!();
    println!("  Configuration");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Reject non-finite: {:>5}      Clamp outputs:   {:>5}",
        control_config.reject_non_finite, control_config.clamp_outputs
    );
    println!(
        "  Fault log size:    {:>5}      Step:            {:>5.2} s",
        control_config.fault_log_capacity, config.dt
    );
    println!();

    println!("  Commands by Channel");
    println!("  ──────────────────────────────────────────────────────────────────");
    for channel in Channel::ALL {
        println!(
            "  {:<16} {:>6}",
            channel.name(),
            summary.commands_by_channel.get(channel.name()).copied().unwrap_or(0)
        );
    }
    println!("  {:<16} {:>6}", "input overrides", summary.input_overrides);
    println!();

    println!("  Events");
    println!("  ──────────────────────────────────────────────────────────────────");
    for event in &summary.events {
        println!("  {}", event);
    }
    println!();

    println!("  Faults");
    println!("  ──────────────────────────────────────────────────────────────────");
    for f in faults.iter().take(5) {
        println!(
            "  tick {:>4}  t={:>6.2}s  vessel {}  {:<14} {}",
            f.tick, f.sim_time, f.vessel, f.channel, f.error
        );
    }
    if faults.len() > 5 {
        println!("  ... and {} more", faults.len() - 5);
    }
    println!();
    println!(
        "  Simulation: {} ticks, {:.1} s, {} commands",
        summary.ticks, summary.duration_s, summary.commands
    );
    println!("====================================================================");
    println!();

    Ok(())
}
