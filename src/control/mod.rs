pub mod types;
pub mod kind;
pub mod function;
pub mod manager;
pub mod registry;
pub mod dispatch;
pub mod overrides;
pub mod diagnostics;

pub use types::{Channel, ControlValue, VesselId};
pub use kind::ChannelKind;
pub use function::{from_fn, try_from_fn, Constant, ControlFunction, FnControl, TryFnControl};
pub use manager::{
    ControlManager, RcsTranslateManager, SteeringManager, ThrottleManager, WheelSteeringManager,
    WheelThrottleManager,
};
pub use registry::VesselControlRegistry;
pub use dispatch::{apply, ActuatorBus, TickReport, VesselActuator};
pub use overrides::{InputAxis, InputOverride};
pub use diagnostics::{ControlFault, FaultCounts};
