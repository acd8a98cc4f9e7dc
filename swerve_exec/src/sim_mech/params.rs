//! Parameters structure for the simulated mechanisms

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::mech::{ActId, ActRole};
use serde::Deserialize;

use crate::{kinematics::NUM_MODULES, module_ctrl::LoopParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the simulated mechanisms.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Closed loop run by every drive actuator.
    pub drive_loop: LoopParams,

    /// Closed loop run by every steer actuator.
    pub steer_loop: LoopParams,

    /// Wheel surface speed at full drive output.
    ///
    /// Units: meters/second
    pub drive_max_speed_ms: f64,

    /// Time constant of the drive speed response.
    ///
    /// Units: seconds
    pub drive_time_const_s: f64,

    /// Steer rate at full steer output.
    ///
    /// Units: radians/second
    pub steer_max_rate_rads: f64,

    /// Steer encoder reading of each module when its wheel points along the chassis X+ axis, in
    /// FL, FR, RL, RR order.
    ///
    /// Units: radians
    pub module_angular_offsets_rad: [f64; NUM_MODULES],

    /// If true the simulated gyro reports clockwise positive yaw.
    pub gyro_inverted: bool,

    pub thermal: ThermalParams,

    /// Auxiliary actuators ganged to module actuators.
    #[serde(default)]
    pub gang: Vec<GangParams>,
}

/// First order thermal model, heating with the square of the actuator output.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ThermalParams {
    /// Units: degrees Celsius
    pub ambient_temp_c: f64,

    /// Heating rate at full output.
    ///
    /// Units: degrees Celsius/second
    pub heating_rate_cs: f64,

    /// Fraction of the excess over ambient lost per second.
    ///
    /// Units: 1/second
    pub cooling_coeff_s: f64,
}

/// The role of an auxiliary actuator.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GangParams {
    pub act: ActId,
    pub role: ActRole,
}
