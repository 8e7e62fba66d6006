use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::Serialize;

use crate::control::{Channel, ControlFault, FaultCounts};
use crate::sim::{Command, EventKind, SimRun};

/// Summary statistics computed from a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub script: String,
    pub ticks: usize,
    pub duration_s: f64,
    pub vessels_commanded: usize,
    pub commands: usize,
    pub commands_by_channel: BTreeMap<String, usize>,
    pub input_overrides: usize,
    pub faults: FaultCounts,
    pub events: Vec<String>,
}

impl RunSummary {
    /// Compute summary from run data plus the registry's fault log.
    pub fn from_run(run: &SimRun, faults: &[ControlFault]) -> Self {
        let mut commands_by_channel: BTreeMap<String, usize> =
            Channel::ALL.iter().map(|c| (c.name().to_owned(), 0)).collect();
        let mut input_overrides = 0;
        let mut vessels = std::collections::BTreeSet::new();

        for r in &run.commands {
            vessels.insert(r.vessel);
            match r.command {
                Command::Channel(v) => {
                    *commands_by_channel.entry(v.channel().name().to_owned()).or_default() += 1;
                }
                Command::Input { .. } => input_overrides += 1,
            }
        }

        let mut counts = FaultCounts::default();
        for f in faults {
            counts.record(f.channel);
        }

        let events = run
            .events
            .iter()
            .map(|e| {
                let what = match &e.kind {
                    EventKind::VesselDestroyed(v) => format!("vessel {} destroyed", v),
                    EventKind::NativeControlResumed => "native control resumed".to_owned(),
                    EventKind::FaultsObserved { count } => format!("{} control fault(s)", count),
                    EventKind::Custom(s) => s.clone(),
                };
                format!("t={:.2}s {}", e.time, what)
            })
            .collect();

        RunSummary {
            script: run.script.clone(),
            ticks: run.reports.len(),
            duration_s: run.duration(),
            vessels_commanded: vessels.len(),
            commands: run.commands.len() - input_overrides,
            commands_by_channel,
            input_overrides,
            faults: counts,
            events,
        }
    }
}

/// Write run summary as JSON to a writer.
pub fn write_summary<W: Write>(writer: &mut W, summary: &RunSummary) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, summary)?;
    writeln!(writer)
}

/// Write run summary JSON to a file.
pub fn write_summary_file(path: &str, summary: &RunSummary) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_summary(&mut file, summary)
}
