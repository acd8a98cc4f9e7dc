//! # Swerve Executable Parameters
//!
//! This module provides parameters for the swerve executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SwerveExecParams {
    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Teleop commands older than this are replaced by a stop. If not set teleop commands are
    /// held until superseded.
    ///
    /// Units: seconds
    #[serde(default)]
    pub teleop_timeout_s: Option<f64>,

    /// Number of consecutive cycle overruns after which the executable is made safe.
    pub max_consec_cycle_overruns: u64,

    /// Write the per-cycle CSV archives.
    #[serde(default)]
    pub archive: bool,

    /// Parameter file of drive control, relative to the `params` directory.
    pub drive_ctrl_params: String,

    /// Parameter file of trajectory control, relative to the `params` directory.
    pub traj_ctrl_params: String,

    /// Parameter file of the simulated mechanisms, relative to the `params` directory.
    pub sim_mech_params: String,
}

impl SwerveExecParams {
    /// Number of cycles per second.
    pub fn cycle_frequency_hz(&self) -> f64 {
        1.0 / self.cycle_period_s
    }
}
