//! Parameters structure for DriveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::DriveCtrlError;
use crate::{kinematics::NUM_MODULES, loc::LocMgrParams, module_ctrl::LowSpeedPolicy};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for drive control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    // ---- GEOMETRY ----
    /// Position of each module from the chassis centre of rotation, in FL, FR, RL, RR order.
    ///
    /// Units: meters,
    /// Frame: Chassis
    pub module_offsets_m: [[f64; 2]; NUM_MODULES],

    /// Steer encoder reading of each module when its wheel points along the chassis X+ axis.
    ///
    /// Units: radians
    pub module_angular_offsets_rad: [f64; NUM_MODULES],

    // ---- CAPABILITIES ----
    /// Maximum wheel surface speed, module demands are desaturated to this.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,

    /// Maximum chassis angular speed.
    ///
    /// Units: radians/second
    pub max_angular_speed_rads: f64,

    /// Module speed below which the module will not be turned by a teleop demand.
    ///
    /// Units: meters/second
    pub min_module_speed_ms: f64,

    /// What a module does with a teleop demand below `min_module_speed_ms`.
    #[serde(default)]
    pub low_speed_policy: LowSpeedPolicy,

    // ---- TELEOP ----
    /// Translational speed for a full scale teleop input.
    ///
    /// Units: meters/second
    pub driving_speed_damper: f64,

    /// Angular speed for a full scale teleop input.
    ///
    /// Units: radians/second
    pub angular_speed_damper: f64,

    /// Whether teleop demands that don't say otherwise are field relative.
    #[serde(default)]
    pub field_relative_default: bool,

    // ---- THERMAL ----
    /// Units: degrees Celsius
    pub max_drive_temp_c: f64,

    /// Units: degrees Celsius
    pub max_steer_temp_c: f64,

    // ---- LOCALISATION ----
    pub loc: LocMgrParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the parameters are usable. Geometry is checked separately when it is built.
    pub fn validate(&self) -> Result<(), DriveCtrlError> {
        let positive = [
            ("max_speed_ms", self.max_speed_ms),
            ("max_angular_speed_rads", self.max_angular_speed_rads),
            ("driving_speed_damper", self.driving_speed_damper),
            ("angular_speed_damper", self.angular_speed_damper),
            ("loc.heading_stale_limit_s", self.loc.heading_stale_limit_s),
        ];

        for (name, value) in positive.iter() {
            if !(value.is_finite() && *value > 0.0) {
                return Err(DriveCtrlError::InvalidParam(format!(
                    "{} must be positive, found {}",
                    name, value
                )));
            }
        }

        if !(self.min_module_speed_ms.is_finite() && self.min_module_speed_ms >= 0.0) {
            return Err(DriveCtrlError::InvalidParam(format!(
                "min_module_speed_ms must not be negative, found {}",
                self.min_module_speed_ms
            )));
        }

        if self.module_angular_offsets_rad.iter().any(|o| !o.is_finite()) {
            return Err(DriveCtrlError::InvalidParam(
                "module_angular_offsets_rad must be finite".into(),
            ));
        }

        Ok(())
    }
}
