//! Error types for vessel control.
//!
//! Nothing in here is fatal to a tick: stale managers are a status the
//! caller may ignore, and evaluation errors are contained to one
//! (vessel, channel) pair for one tick.

use std::any::Any;

use thiserror::Error;

use crate::control::{Channel, VesselId};

/// Errors returned to scripted callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// The manager was superseded by a newer install or already released.
    #[error("{channel} manager for vessel {vessel} has been superseded or released")]
    StaleManager {
        /// Vessel the manager was issued for
        vessel: VesselId,
        /// Channel the manager was issued for
        channel: Channel,
    },

    /// The registry backing this manager has been dropped (session ended).
    #[error("control registry is closed")]
    RegistryClosed,
}

/// A control function failed to produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EvaluationError {
    message: String,
}

impl EvaluationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// The function returned NaN or an infinite component.
    pub fn non_finite() -> Self {
        Self::new("control function returned a non-finite value")
    }

    /// The function panicked; keeps the panic message when it has one.
    pub fn panicked(payload: &(dyn Any + Send)) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string payload");
        Self::new(format!("control function panicked: {}", detail))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors loading a [`ControlConfig`](crate::config::ControlConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
