//! # Drive control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A joystick-style drive command.
///
/// The inputs are dimensionless demands, nominally in the range [-1, 1], which drive control scales
/// by its speed dampers before use.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveCmd {
    /// Forward demand.
    pub x: f64,

    /// Leftward demand.
    pub y: f64,

    /// Rotation demand, positive is counter-clockwise.
    pub rot: f64,

    /// If set, overrides whether `x` and `y` are interpreted in the field frame or the robot frame.
    /// If not set the configured default is used.
    #[serde(default)]
    pub field_relative: Option<bool>,
}
