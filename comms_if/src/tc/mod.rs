//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications interface. A telecommand
//! is a JSON object with a `type` string and, for types which carry data, a `payload` object:
//!
//! ```json
//! {"type": "DRIVE", "payload": {"x": 0.5, "y": 0.0, "rot": 0.1}}
//! ```

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod drive_ctrl;
pub mod loc;
pub mod traj_ctrl;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal
use drive_ctrl::DriveCmd;
use loc::PoseSpec;
use traj_ctrl::FollowCmd;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the robot by an operator or a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Tc {
    /// Enter safe mode, stopping all modules.
    #[serde(rename = "SAFE")]
    MakeSafe,

    /// Leave safe mode.
    #[serde(rename = "UNSAFE")]
    MakeUnsafe,

    /// Drive with the given joystick-style command, superseding any active trajectory.
    #[serde(rename = "DRIVE")]
    Drive(DriveCmd),

    /// Point the modules in an X to resist being pushed.
    #[serde(rename = "SET_X")]
    SetX,

    /// Stop all modules.
    #[serde(rename = "STOP")]
    Stop,

    /// Begin following a trajectory.
    #[serde(rename = "FOLLOW")]
    Follow(FollowCmd),

    /// Cancel the trajectory currently being followed.
    #[serde(rename = "CANCEL")]
    Cancel,

    /// Reset the pose estimate to the given pose.
    #[serde(rename = "RESET_POSE")]
    ResetPose(PoseSpec),

    /// Reset the heading estimate to zero, keeping the current position.
    #[serde(rename = "ZERO_HEADING")]
    ZeroHeading,

    /// Zero the drive displacement of all modules.
    #[serde(rename = "RESET_ENCODERS")]
    ResetEncoders,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON or is not a recognised TC: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }
}
