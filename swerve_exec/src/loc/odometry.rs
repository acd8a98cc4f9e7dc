//! # Odometry pose estimator
//!
//! Dead-reckons the robot's pose in the field frame from the change in module positions each
//! cycle, taking heading from the heading sensor rather than from the integrated wheel rotation.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use util::maths::wrap_pi;

use super::Pose2;
use crate::kinematics::{ModuleGeometry, ModulePosition, NUM_MODULES};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PoseEstimator {
    geometry: ModuleGeometry,

    pose: Pose2,

    /// Added to the sensor heading to get the pose heading.
    ///
    /// Units: radians
    heading_offset_rad: f64,

    /// Module positions at the last update, `None` until the first update.
    prev_positions: Option<[ModulePosition; NUM_MODULES]>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PoseEstimator {
    /// Create a new estimator at the origin, with the pose heading equal to the sensor heading.
    ///
    /// The first update only records the module positions, so encoders which are not at zero when
    /// the estimator starts do not produce a jump.
    pub fn new(geometry: ModuleGeometry) -> Self {
        Self {
            geometry,
            pose: Pose2::default(),
            heading_offset_rad: 0.0,
            prev_positions: None,
        }
    }

    /// Pose heading for the given sensor heading.
    pub fn heading_for(&self, sensor_heading_rad: f64) -> f64 {
        wrap_pi(sensor_heading_rad + self.heading_offset_rad)
    }

    /// Integrate the change in module positions since the last update.
    pub fn update(
        &mut self,
        sensor_heading_rad: f64,
        positions: &[ModulePosition; NUM_MODULES],
    ) -> Pose2 {
        let heading_rad = self.heading_for(sensor_heading_rad);

        if let Some(prev) = self.prev_positions {
            let mut deltas = *positions;
            for (d, p) in deltas.iter_mut().zip(prev.iter()) {
                d.distance_m -= p.distance_m;
            }

            let twist = self.geometry.to_twist(&deltas);

            // Rotate the chassis displacement into the field frame
            let (sin, cos) = heading_rad.sin_cos();
            self.pose.x_m += twist.dx_m * cos - twist.dy_m * sin;
            self.pose.y_m += twist.dx_m * sin + twist.dy_m * cos;
        }

        self.pose.heading_rad = heading_rad;
        self.prev_positions = Some(*positions);

        self.pose
    }

    /// Reset the estimate to `pose`.
    ///
    /// `sensor_heading_rad` and `positions` are the current readings, which become the reference
    /// for subsequent updates.
    pub fn reset(
        &mut self,
        pose: Pose2,
        sensor_heading_rad: f64,
        positions: &[ModulePosition; NUM_MODULES],
    ) {
        self.heading_offset_rad = pose.heading_rad - sensor_heading_rad;
        self.pose = Pose2 {
            heading_rad: wrap_pi(pose.heading_rad),
            ..pose
        };
        self.prev_positions = Some(*positions);
    }

    pub fn pose(&self) -> Pose2 {
        self.pose
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn geometry() -> ModuleGeometry {
        ModuleGeometry::new([[0.4, 0.35], [0.4, -0.35], [-0.4, 0.35], [-0.4, -0.35]]).unwrap()
    }

    fn positions(distance_m: f64, angle_rad: f64) -> [ModulePosition; NUM_MODULES] {
        [ModulePosition {
            distance_m,
            angle_rad,
        }; NUM_MODULES]
    }

    #[test]
    fn test_first_update_does_not_jump() {
        let mut est = PoseEstimator::new(geometry());

        let pose = est.update(0.0, &positions(12.0, 0.0));
        assert_eq!(pose.x_m, 0.0);
        assert_eq!(pose.y_m, 0.0);

        let pose = est.update(0.0, &positions(12.5, 0.0));
        assert!((pose.x_m - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_straight_line() {
        let mut est = PoseEstimator::new(geometry());
        est.update(0.0, &positions(0.0, 0.0));

        for i in 1..=10 {
            est.update(0.0, &positions(0.1 * i as f64, 0.0));
        }

        let pose = est.pose();
        assert!((pose.x_m - 1.0).abs() < 1e-9);
        assert!(pose.y_m.abs() < 1e-9);
        assert_eq!(pose.heading_rad, 0.0);
    }

    #[test]
    fn test_displacement_rotated_by_heading() {
        let mut est = PoseEstimator::new(geometry());
        est.update(FRAC_PI_2, &positions(0.0, 0.0));

        // Chassis forwards while facing field +Y
        let pose = est.update(FRAC_PI_2, &positions(1.0, 0.0));
        assert!(pose.x_m.abs() < 1e-9);
        assert!((pose.y_m - 1.0).abs() < 1e-9);
        assert!((pose.heading_rad - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_reset() {
        let mut est = PoseEstimator::new(geometry());
        est.update(0.3, &positions(5.0, 0.0));
        est.update(0.3, &positions(6.0, 0.0));

        let target = Pose2::new(2.0, -1.0, 1.0);
        est.reset(target, 0.3, &positions(6.0, 0.0));
        assert_eq!(est.pose().x_m, 2.0);
        assert_eq!(est.pose().y_m, -1.0);
        assert!((est.pose().heading_rad - 1.0).abs() < 1e-12);

        // No motion, no change, and heading follows the sensor from the new reference
        let pose = est.update(0.3, &positions(6.0, 0.0));
        assert!((pose.x_m - 2.0).abs() < 1e-12);
        assert!((pose.y_m + 1.0).abs() < 1e-12);
        assert!((pose.heading_rad - 1.0).abs() < 1e-12);

        let pose = est.update(0.5, &positions(6.0, 0.0));
        assert!((pose.heading_rad - 1.2).abs() < 1e-12);
    }
}
