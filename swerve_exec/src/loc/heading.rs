//! # Heading sensor
//!
//! Converts raw yaw readings into the robot's counter-clockwise positive heading and keeps the
//! last trusted heading for when readings go missing.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::imu::ImuData;
use log::{info, warn};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HeadingSensor {
    inverted: bool,

    /// Units: degrees
    offset_deg: f64,

    /// Units: seconds
    stale_limit_s: f64,

    /// Heading of the last trusted reading, not wrapped.
    ///
    /// Units: radians
    heading_rad: f64,

    /// Units: radians/second
    turn_rate_rads: f64,

    /// True while readings are missing, stale or invalid.
    degraded: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl HeadingSensor {
    pub fn new(inverted: bool, offset_deg: f64, stale_limit_s: f64) -> Self {
        Self {
            inverted,
            offset_deg,
            stale_limit_s,
            heading_rad: 0.0,
            turn_rate_rads: 0.0,
            degraded: false,
        }
    }

    /// Take a new reading from the sensor, returning the heading to use this cycle.
    ///
    /// If the reading is missing, non-finite, or older than the stale limit the last trusted
    /// heading is held and the sensor is flagged as degraded until a good reading arrives.
    pub fn sample(&mut self, reading: Option<&ImuData>, now_s: f64) -> f64 {
        let valid = reading.filter(|r| {
            r.yaw_deg.is_finite()
                && r.yaw_rate_degs.is_finite()
                && now_s - r.timestamp_s <= self.stale_limit_s
        });

        match valid {
            Some(r) => {
                if self.degraded {
                    info!("Heading sensor readings restored");
                }
                self.degraded = false;
                self.heading_rad = self.convert(r.yaw_deg + self.offset_deg);
                self.turn_rate_rads = self.convert(r.yaw_rate_degs);
            }
            None => {
                if !self.degraded {
                    warn!(
                        "Heading sensor reading missing or stale, holding heading at {:.3} rad",
                        self.heading_rad
                    );
                }
                self.degraded = true;
                self.turn_rate_rads = 0.0;
            }
        }

        self.heading_rad
    }

    /// Heading from the last trusted reading, not wrapped.
    pub fn heading_rad(&self) -> f64 {
        self.heading_rad
    }

    /// Counter-clockwise positive turn rate, zero while degraded.
    pub fn turn_rate_rads(&self) -> f64 {
        self.turn_rate_rads
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    fn convert(&self, deg: f64) -> f64 {
        if self.inverted {
            -deg.to_radians()
        } else {
            deg.to_radians()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn reading(t: f64, yaw_deg: f64, rate_degs: f64) -> ImuData {
        ImuData {
            timestamp_s: t,
            yaw_deg,
            yaw_rate_degs: rate_degs,
        }
    }

    #[test]
    fn test_inversion_and_offset() {
        let mut sensor = HeadingSensor::new(true, 10.0, 0.1);

        let h = sensor.sample(Some(&reading(0.0, 80.0, 45.0)), 0.0);
        assert!((h + 90f64.to_radians()).abs() < 1e-12);
        assert!((sensor.turn_rate_rads() + 45f64.to_radians()).abs() < 1e-12);

        let mut sensor = HeadingSensor::new(false, 0.0, 0.1);
        let h = sensor.sample(Some(&reading(0.0, 80.0, 45.0)), 0.0);
        assert!((h - 80f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_degraded_holds_heading() {
        let mut sensor = HeadingSensor::new(false, 0.0, 0.1);

        sensor.sample(Some(&reading(1.0, 30.0, 5.0)), 1.0);
        assert!(!sensor.is_degraded());

        // Missing
        let h = sensor.sample(None, 1.02);
        assert!(sensor.is_degraded());
        assert!((h - 30f64.to_radians()).abs() < 1e-12);
        assert_eq!(sensor.turn_rate_rads(), 0.0);

        // Stale
        let h = sensor.sample(Some(&reading(1.0, 60.0, 5.0)), 1.5);
        assert!(sensor.is_degraded());
        assert!((h - 30f64.to_radians()).abs() < 1e-12);

        // Invalid
        sensor.sample(Some(&reading(1.5, f64::NAN, 0.0)), 1.5);
        assert!(sensor.is_degraded());

        // Restored
        let h = sensor.sample(Some(&reading(1.52, 60.0, 5.0)), 1.54);
        assert!(!sensor.is_degraded());
        assert!((h - 60f64.to_radians()).abs() < 1e-12);
    }
}
