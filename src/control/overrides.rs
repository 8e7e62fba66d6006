use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::registry::VesselControlRegistry;
use super::types::VesselId;

/// Raw pilot input axes that can be overridden for a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputAxis {
    Pitch,
    Yaw,
    Roll,
    TranslateX,
    TranslateY,
    TranslateZ,
}

impl fmt::Display for InputAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputAxis::Pitch => "pitch",
            InputAxis::Yaw => "yaw",
            InputAxis::Roll => "roll",
            InputAxis::TranslateX => "translate_x",
            InputAxis::TranslateY => "translate_y",
            InputAxis::TranslateZ => "translate_z",
        };
        f.write_str(name)
    }
}

/// A queued one-shot input override.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputOverride {
    pub axis: InputAxis,
    pub value: f64,
}

impl VesselControlRegistry {
    /// Queue a raw input override for `vessel`, delivered on the next tick only.
    ///
    /// A second override of the same axis before that tick replaces the first.
    pub fn override_input(&self, vessel: VesselId, axis: InputAxis, value: f64) {
        let mut table = self.shared.table.write();
        let pending = &mut table.vessels.entry(vessel).or_default().overrides;
        match pending.iter_mut().find(|o| o.axis == axis) {
            Some(existing) => existing.value = value,
            None => pending.push(InputOverride { axis, value }),
        }
        trace!(%vessel, %axis, value, "input override queued");
    }

    /// Overrides waiting for the next tick.
    pub fn pending_overrides(&self, vessel: VesselId) -> Vec<InputOverride> {
        self.shared
            .table
            .read()
            .vessels
            .get(&vessel)
            .map(|slots| slots.overrides.clone())
            .unwrap_or_default()
    }
}
