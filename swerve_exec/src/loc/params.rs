//! Localisation parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LocMgrParams {
    /// Where the pose estimate comes from.
    #[serde(default)]
    pub source: PoseSourceKind,

    /// If true the heading sensor's yaw is clockwise positive and is negated before use.
    pub heading_inverted: bool,

    /// Added to the heading sensor's yaw before inversion.
    ///
    /// Units: degrees
    #[serde(default)]
    pub heading_offset_deg: f64,

    /// Age after which a heading reading is no longer trusted.
    ///
    /// Units: seconds
    pub heading_stale_limit_s: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub enum PoseSourceKind {
    /// Integrate module odometry using the heading sensor.
    GyroOdometry,

    /// Use the pose supplied by an external field position system.
    ExternalFieldPosition,
}

impl Default for PoseSourceKind {
    fn default() -> Self {
        PoseSourceKind::GyroOdometry
    }
}
