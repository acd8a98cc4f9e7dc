//! Trajectory control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::TrajCtrlError;
use crate::controllers::PidGains;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Field X position controller gains
    pub x_gains: PidGains,

    /// Field Y position controller gains
    pub y_gains: PidGains,

    /// Heading controller gains
    pub theta_gains: PidGains,

    /// Maximum angular velocity of the heading profile.
    ///
    /// Units: radians/second
    pub theta_max_vel_rads: f64,

    /// Maximum angular acceleration of the heading profile.
    ///
    /// Units: radians/second^2
    pub theta_max_accel_radss: f64,

    /// Position error within which the final pose is considered reached.
    ///
    /// Units: meters
    pub position_tolerance_m: f64,

    /// Heading error within which the final pose is considered reached.
    ///
    /// Units: degrees
    pub angle_tolerance_deg: f64,

    /// Negate the angular velocity output, for heading sensors mounted upside down with respect
    /// to the drive's rotation sense.
    #[serde(default)]
    pub angular_output_inverted: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), TrajCtrlError> {
        let positive = [
            ("theta_max_vel_rads", self.theta_max_vel_rads),
            ("theta_max_accel_radss", self.theta_max_accel_radss),
            ("position_tolerance_m", self.position_tolerance_m),
            ("angle_tolerance_deg", self.angle_tolerance_deg),
        ];

        for (name, value) in positive.iter() {
            if !(value.is_finite() && *value > 0.0) {
                return Err(TrajCtrlError::InvalidParam(format!(
                    "{} must be positive, found {}",
                    name, value
                )));
            }
        }

        let gains = [
            ("x_gains", &self.x_gains),
            ("y_gains", &self.y_gains),
            ("theta_gains", &self.theta_gains),
        ];

        for (name, g) in gains.iter() {
            if !(g.k_p.is_finite() && g.k_i.is_finite() && g.k_d.is_finite()) {
                return Err(TrajCtrlError::InvalidParam(format!(
                    "{} must be finite, found {:?}",
                    name, g
                )));
            }
        }

        Ok(())
    }
}
