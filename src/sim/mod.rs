pub mod runner;
pub mod event;
pub mod script;
pub mod recorder;

pub use runner::{simulate, simulate_with, SimConfig, SimRun};
pub use event::{EventDetector, EventKind, HostEvent, SimEvent};
pub use script::{Idle, Script};
pub use recorder::{Command, CommandRecord, CommandRecorder};
