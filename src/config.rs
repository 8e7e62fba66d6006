use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Registry configuration
// ---------------------------------------------------------------------------

/// Behaviour knobs for a [`VesselControlRegistry`](crate::control::VesselControlRegistry).
///
/// Every field has a default, so a partial JSON document such as
/// `{"clamp_outputs": true}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Treat NaN/infinite function output as an evaluation fault.
    pub reject_non_finite: bool,
    /// Clamp outputs to the actuator range before dispatch.
    /// Off by default: values go to the actuator unclamped.
    pub clamp_outputs: bool,
    /// Most recent faults kept for [`faults`](crate::control::VesselControlRegistry::faults).
    pub fault_log_capacity: usize,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            reject_non_finite: true,
            clamp_outputs: false,
            fault_log_capacity: 64,
        }
    }
}

impl ControlConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
