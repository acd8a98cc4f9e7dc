//! # Trajectory control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Command to follow a trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowCmd {
    /// Path to the trajectory file, relative to the `trajectories` directory of the software root.
    pub trajectory: String,

    /// Where the heading the robot should hold while following is taken from.
    #[serde(default)]
    pub heading: HeadingSpec,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Source of the desired heading while following a trajectory.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum HeadingSpec {
    /// Hold the heading of the trajectory's final pose.
    FinalPose,

    /// Hold the given heading in radians.
    Fixed(f64),

    /// Track the heading of each trajectory sample.
    Trajectory,
}

impl Default for HeadingSpec {
    fn default() -> Self {
        HeadingSpec::FinalPose
    }
}
