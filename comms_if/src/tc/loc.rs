//! # Localisation telecommands

use serde::{Deserialize, Serialize};

/// A pose in the field frame, used to reset the pose estimate.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseSpec {
    pub x_m: f64,
    pub y_m: f64,

    /// Counter-clockwise positive heading in radians.
    pub heading_rad: f64,
}
