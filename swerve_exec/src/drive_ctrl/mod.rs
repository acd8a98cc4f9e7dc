//! # Drive control module
//!
//! Drive control owns the four modules and the localisation manager. Each cycle it takes one
//! `DriveDemand`, turns it into module states, dispatches them to the modules, and then updates the
//! pose from the module positions.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
pub use params::*;
pub use state::*;

use crate::{
    kinematics::{KinematicsError, ModuleDemand, NUM_MODULES},
    module_ctrl::ModuleCtrlError,
};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A demand on the drivetrain for a single cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum DriveDemand {
    /// No new demand, the actuators keep their previous setpoints.
    None,

    /// Normalised joystick-style command, scaled by the speed dampers.
    Teleop {
        x: f64,
        y: f64,
        rot: f64,

        /// Interpret `x` and `y` in the field frame. If `None` the configured default is used.
        field_relative: Option<bool>,
    },

    /// Module states computed elsewhere, e.g. by trajectory control.
    ModuleStates([ModuleDemand; NUM_MODULES]),

    /// Point the modules in an X to resist being pushed.
    SetX,

    /// Remove the output from all actuators.
    Stop,
}

/// Possible errors that can occur during DriveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {
    #[error("Invalid module geometry: {0}")]
    InvalidGeometry(#[from] KinematicsError),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Module feedback incomplete: {0}")]
    ModuleFeedback(#[from] ModuleCtrlError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for DriveDemand {
    fn default() -> Self {
        DriveDemand::None
    }
}
