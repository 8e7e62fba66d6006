pub mod control;
pub mod vessel;
pub mod sim;
pub mod io;
pub mod config;
pub mod error;

pub use config::ControlConfig;
pub use control::{
    Channel, ControlFunction, ControlManager, ControlValue, VesselControlRegistry, VesselId,
};
pub use error::{ConfigError, ControlError, EvaluationError};
pub use vessel::VesselControl;
