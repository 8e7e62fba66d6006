use nalgebra::Vector3;

use crate::control::kind;
use crate::control::{
    Channel, Constant, ControlFunction, InputAxis, RcsTranslateManager, SteeringManager,
    ThrottleManager, VesselControlRegistry, VesselId, WheelSteeringManager, WheelThrottleManager,
};

// ---------------------------------------------------------------------------
// Script-facing vessel handle
// ---------------------------------------------------------------------------

/// Control surface of one vessel as seen from scripted code.
///
/// `set_*` installs a fixed command, `manage_*` a time-varying one; both
/// supersede whatever owned the channel before. Cheap to clone.
#[derive(Clone)]
pub struct VesselControl {
    id: VesselId,
    registry: VesselControlRegistry,
}

impl VesselControl {
    pub fn new(id: VesselId, registry: VesselControlRegistry) -> Self {
        Self { id, registry }
    }

    pub fn id(&self) -> VesselId {
        self.id
    }

    // --- Steering (pitch, yaw, roll) ---

    pub fn set_steering(&self, pitch_yaw_roll: Vector3<f64>) -> SteeringManager {
        self.manage_steering(Constant(pitch_yaw_roll))
    }

    pub fn manage_steering<F>(&self, provider: F) -> SteeringManager
    where
        F: ControlFunction<Vector3<f64>> + 'static,
    {
        self.registry.install::<kind::Steering, F>(self.id, provider)
    }

    // --- Throttle ---

    pub fn set_throttle(&self, throttle: f64) -> ThrottleManager {
        self.manage_throttle(Constant(throttle))
    }

    pub fn manage_throttle<F>(&self, provider: F) -> ThrottleManager
    where
        F: ControlFunction<f64> + 'static,
    {
        self.registry.install::<kind::Throttle, F>(self.id, provider)
    }

    // --- RCS translation ---

    pub fn set_rcs_translate(&self, translate: Vector3<f64>) -> RcsTranslateManager {
        self.manage_rcs_translate(Constant(translate))
    }

    pub fn manage_rcs_translate<F>(&self, provider: F) -> RcsTranslateManager
    where
        F: ControlFunction<Vector3<f64>> + 'static,
    {
        self.registry.install::<kind::RcsTranslate, F>(self.id, provider)
    }

    // --- Wheels ---

    pub fn set_wheel_steering(&self, steering: f64) -> WheelSteeringManager {
        self.manage_wheel_steering(Constant(steering))
    }

    pub fn manage_wheel_steering<F>(&self, provider: F) -> WheelSteeringManager
    where
        F: ControlFunction<f64> + 'static,
    {
        self.registry.install::<kind::WheelSteering, F>(self.id, provider)
    }

    pub fn set_wheel_throttle(&self, throttle: f64) -> WheelThrottleManager {
        self.manage_wheel_throttle(Constant(throttle))
    }

    pub fn manage_wheel_throttle<F>(&self, provider: F) -> WheelThrottleManager
    where
        F: ControlFunction<f64> + 'static,
    {
        self.registry.install::<kind::WheelThrottle, F>(self.id, provider)
    }

    /// Give every channel back to manual control.
    pub fn release_control(&self) -> usize {
        self.registry.release_all(self.id)
    }

    pub fn active_channels(&self) -> Vec<Channel> {
        self.registry.active_channels(self.id)
    }

    // --- Raw input overrides, next tick only ---

    pub fn override_input_pitch(&self, value: f64) {
        self.registry.override_input(self.id, InputAxis::Pitch, value);
    }

    pub fn override_input_yaw(&self, value: f64) {
        self.registry.override_input(self.id, InputAxis::Yaw, value);
    }

    pub fn override_input_roll(&self, value: f64) {
        self.registry.override_input(self.id, InputAxis::Roll, value);
    }

    pub fn override_input_translate_x(&self, value: f64) {
        self.registry.override_input(self.id, InputAxis::TranslateX, value);
    }

    pub fn override_input_translate_y(&self, value: f64) {
        self.registry.override_input(self.id, InputAxis::TranslateY, value);
    }

    pub fn override_input_translate_z(&self, value: f64) {
        self.registry.override_input(self.id, InputAxis::TranslateZ, value);
    }
}

impl VesselControlRegistry {
    /// Script-facing handle for `vessel`.
    pub fn vessel(&self, vessel: VesselId) -> VesselControl {
        VesselControl::new(vessel, self.clone())
    }
}
