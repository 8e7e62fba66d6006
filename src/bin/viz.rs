use eframe::egui;
use egui_plot::{Line, Plot, PlotPoints};
use nalgebra::Vector3;

use vessel_control::control::{from_fn, Channel, ControlValue, SteeringManager};
use vessel_control::sim::{simulate_with, CommandRecorder, HostEvent, Script, SimConfig, SimRun};
use vessel_control::{VesselControlRegistry, VesselId};

const ROCKET: VesselId = VesselId(1);

/// Pitch program followed by a throttle-down, then control is handed back.
#[derive(Default)]
struct Ascent {
    steering: Option<SteeringManager>,
    done: bool,
}

impl Script for Ascent {
    fn step(&mut self, t: f64, registry: &VesselControlRegistry) {
        let rocket = registry.vessel(ROCKET);
        if self.steering.is_none() && !self.done {
            self.steering = Some(rocket.manage_steering(from_fn(|t: f64| {
                Vector3::new(-(t / 20.0).min(0.6), 0.0, 0.05 * (t * 0.5).sin())
            })));
            rocket.manage_throttle(from_fn(|t: f64| if t < 15.0 { 1.0 } else { 0.6 }));
        }
        if t >= 30.0 && !self.done {
            rocket.release_control();
            self.steering = None;
            self.done = true;
        }
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn name(&self) -> &str {
        "ascent"
    }
}

fn main() -> eframe::Result {
    let registry = VesselControlRegistry::default();
    let config = SimConfig { dt: 0.05, max_time: 60.0 };
    let run = simulate_with(
        &registry,
        CommandRecorder::new([ROCKET]),
        &config,
        &mut Ascent::default(),
        &[HostEvent::vessel_destroyed(45.0, ROCKET)],
    );

    let app = ControlViz { run };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native("Vessel Control Monitor", options, Box::new(|_| Ok(Box::new(app))))
}

struct ControlViz {
    run: SimRun,
}

impl ControlViz {
    fn history(&self, channel: Channel) -> Vec<(f64, ControlValue)> {
        self.run
            .commands
            .iter()
            .filter_map(|r| match r.command {
                vessel_control::sim::Command::Channel(v) if v.channel() == channel => {
                    Some((r.sim_time, v))
                }
                _ => None,
            })
            .collect()
    }
}

impl eframe::App for ControlViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let steering = self.history(Channel::Steering);
        let throttle = self.history(Channel::Throttle);

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.heading(format!("Script: {}", self.run.script));
            let commanded = self.run.reports.iter().filter(|r| r.commands > 0).count();
            ui.label(format!(
                "Ticks: {}  |  Commanded ticks: {}  |  Commands: {}  |  Events: {}  |  Duration: {:.1} s",
                self.run.reports.len(),
                commanded,
                self.run.commands.len(),
                self.run.events.len(),
                self.run.duration(),
            ));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let half_w = available.x / 2.0 - 8.0;
            let half_h = available.y / 2.0 - 8.0;

            ui.horizontal(|ui| {
                // Steering components vs Time
                ui.vertical(|ui| {
                    ui.label("Steering (pitch / yaw / roll)");
                    Plot::new("steering")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            for (i, name) in ["Pitch", "Yaw", "Roll"].into_iter().enumerate() {
                                let points: PlotPoints = steering
                                    .iter()
                                    .map(|(t, v)| [*t, v.components()[i]])
                                    .collect();
                                plot_ui.line(Line::new(name, points));
                            }
                        });
                });

                // Throttle vs Time
                ui.vertical(|ui| {
                    ui.label("Throttle");
                    let points: PlotPoints = throttle
                        .iter()
                        .map(|(t, v)| [*t, v.components()[0]])
                        .collect();
                    Plot::new("throttle")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Throttle", points));
                        });
                });
            });

            ui.horizontal(|ui| {
                // Overridden channels per tick
                ui.vertical(|ui| {
                    ui.label("Commands per tick");
                    let points: PlotPoints = self
                        .run
                        .reports
                        .iter()
                        .map(|r| [r.sim_time, r.commands as f64])
                        .collect();
                    Plot::new("commands")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Commands", points));
                        });
                });

                // Event timeline
                ui.vertical(|ui| {
                    ui.label("Events");
                    for e in &self.run.events {
                        ui.label(format!("t={:>6.2}s  {:?}", e.time, e.kind));
                    }
                });
            });
        });
    }
}
