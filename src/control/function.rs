use crate::error::EvaluationError;

use super::kind::ChannelKind;
use super::types::ControlValue;

/// A time-indexed control law `f(sim_time) -> T`.
///
/// Implement this to plug custom steering/throttle logic into a vessel.
/// Functions are only ever called from inside a tick, with a simulation
/// time that increases monotonically within a run.
pub trait ControlFunction<T>: Send + Sync {
    /// Produce the command for `sim_time` (seconds).
    fn evaluate(&self, sim_time: f64) -> Result<T, EvaluationError>;

    /// Human-readable name for logging/diagnostics.
    fn name(&self) -> &str {
        "unnamed"
    }
}

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

/// Fixed command, the "set" flavour of every channel.
#[derive(Debug, Clone, Copy)]
pub struct Constant<T>(pub T);

impl<T: Copy + Send + Sync> ControlFunction<T> for Constant<T> {
    fn evaluate(&self, _sim_time: f64) -> Result<T, EvaluationError> {
        Ok(self.0)
    }

    fn name(&self) -> &str {
        "constant"
    }
}

/// Infallible closure adapter, see [`from_fn`].
#[derive(Clone, Copy)]
pub struct FnControl<F>(F);

/// Fallible closure adapter, see [`try_from_fn`].
#[derive(Clone, Copy)]
pub struct TryFnControl<F>(F);

/// Wrap a closure that always yields a command.
pub fn from_fn<T, F>(f: F) -> FnControl<F>
where
    F: Fn(f64) -> T + Send + Sync,
{
    FnControl(f)
}

/// Wrap a closure that may fail, e.g. a callback into scripted code.
pub fn try_from_fn<T, F>(f: F) -> TryFnControl<F>
where
    F: Fn(f64) -> Result<T, EvaluationError> + Send + Sync,
{
    TryFnControl(f)
}

impl<T, F> ControlFunction<T> for FnControl<F>
where
    F: Fn(f64) -> T + Send + Sync,
{
    fn evaluate(&self, sim_time: f64) -> Result<T, EvaluationError> {
        Ok((self.0)(sim_time))
    }

    fn name(&self) -> &str {
        "closure"
    }
}

impl<T, F> ControlFunction<T> for TryFnControl<F>
where
    F: Fn(f64) -> Result<T, EvaluationError> + Send + Sync,
{
    fn evaluate(&self, sim_time: f64) -> Result<T, EvaluationError> {
        (self.0)(sim_time)
    }

    fn name(&self) -> &str {
        "closure"
    }
}

// ---------------------------------------------------------------------------
// Slot storage
// ---------------------------------------------------------------------------

type ErasedFn = dyn Fn(f64) -> Result<ControlValue, EvaluationError> + Send + Sync;

/// A control function bound to its channel, with the output type erased.
pub(crate) struct BoundFunction {
    label: String,
    eval: Box<ErasedFn>,
}

impl BoundFunction {
    pub(crate) fn bind<K, F>(function: F) -> Self
    where
        K: ChannelKind,
        F: ControlFunction<K::Output> + 'static,
    {
        let label = function.name().to_owned();
        Self {
            label,
            eval: Box::new(move |t| function.evaluate(t).map(K::wrap)),
        }
    }

    pub(crate) fn evaluate(&self, sim_time: f64) -> Result<ControlValue, EvaluationError> {
        (self.eval)(sim_time)
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }
}
