//! # Heading sensor data

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single reading from the yaw axis of the IMU.
///
/// Readings are in the sensor's own convention, which may be inverted with respect to the robot's
/// counter-clockwise positive heading.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ImuData {
    /// Time at which the reading was acquired, in seconds since the start of the session.
    pub timestamp_s: f64,

    /// Accumulated yaw angle in degrees. Not wrapped.
    pub yaw_deg: f64,

    /// Yaw rate in degrees/second.
    pub yaw_rate_degs: f64,
}
