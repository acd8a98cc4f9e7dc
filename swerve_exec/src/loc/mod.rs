//! # Localisation module
//!
//! This module provides the robot's pose in the field frame, either by integrating module odometry
//! against the heading sensor or by taking it from an external field position system. Both sources
//! are used through `LocMgr`, so drive and trajectory control don't care which is in use.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod heading;
mod odometry;
mod params;

pub use heading::HeadingSensor;
pub use odometry::PoseEstimator;
pub use params::{LocMgrParams, PoseSourceKind};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::{eqpt::imu::ImuData, tc::loc::PoseSpec};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kinematics::{ModuleGeometry, ModulePosition, NUM_MODULES};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pose of the robot in the field frame.
///
/// The field frame is fixed to the ground, with heading measured counter-clockwise from the field
/// X+ axis.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose2 {
    /// Units: meters
    pub x_m: f64,

    /// Units: meters
    pub y_m: f64,

    /// Units: radians, in the range (-pi, pi]
    pub heading_rad: f64,
}

/// Provides an interface for the localisation system of the robot.
#[derive(Debug, Clone)]
pub struct LocMgr {
    source: LocSource,

    heading: HeadingSensor,

    /// Module positions at the last update.
    positions: [ModulePosition; NUM_MODULES],
}

/// Status of localisation for the current cycle.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct StatusReport {
    /// The heading sensor is not providing trusted readings and the heading is being held.
    pub heading_degraded: bool,

    /// No pose is available from the source.
    pub pose_unavailable: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Where the pose comes from.
#[derive(Debug, Clone)]
pub enum LocSource {
    GyroOdometry(PoseEstimator),

    /// The last pose supplied by the external system, if any.
    ExternalFieldPosition(Option<Pose2>),
}

#[derive(Debug, Error, PartialEq)]
pub enum LocError {
    #[error("An external pose was supplied but the pose source is {0:?}")]
    NotExternalSource(PoseSourceKind),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose2 {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            x_m,
            y_m,
            heading_rad,
        }
    }

    /// Straight line distance between the positions of two poses.
    pub fn distance_to(&self, other: &Pose2) -> f64 {
        (other.x_m - self.x_m).hypot(other.y_m - self.y_m)
    }
}

impl From<PoseSpec> for Pose2 {
    fn from(pose: PoseSpec) -> Self {
        Self::new(pose.x_m, pose.y_m, util::maths::wrap_pi(pose.heading_rad))
    }
}

impl LocMgr {
    pub fn new(source: LocSource, heading: HeadingSensor) -> Self {
        Self {
            source,
            heading,
            positions: [ModulePosition::default(); NUM_MODULES],
        }
    }

    /// Build the manager described by the parameters.
    pub fn from_params(params: &LocMgrParams, geometry: ModuleGeometry) -> Self {
        let source = match params.source {
            PoseSourceKind::GyroOdometry => LocSource::GyroOdometry(PoseEstimator::new(geometry)),
            PoseSourceKind::ExternalFieldPosition => LocSource::ExternalFieldPosition(None),
        };

        info!("Localisation source: {:?}", params.source);

        Self::new(
            source,
            HeadingSensor::new(
                params.heading_inverted,
                params.heading_offset_deg,
                params.heading_stale_limit_s,
            ),
        )
    }

    pub fn source_kind(&self) -> PoseSourceKind {
        match self.source {
            LocSource::GyroOdometry(_) => PoseSourceKind::GyroOdometry,
            LocSource::ExternalFieldPosition(_) => PoseSourceKind::ExternalFieldPosition,
        }
    }

    /// Take this cycle's heading sensor reading.
    ///
    /// Must be called at the start of the cycle, before the heading is used.
    pub fn sample_heading(&mut self, reading: Option<&ImuData>, now_s: f64) {
        self.heading.sample(reading, now_s);
    }

    /// Update the pose with this cycle's module positions.
    pub fn update(&mut self, positions: &[ModulePosition; NUM_MODULES]) -> Option<Pose2> {
        self.positions = *positions;

        match self.source {
            LocSource::GyroOdometry(ref mut est) => {
                Some(est.update(self.heading.heading_rad(), positions))
            }
            LocSource::ExternalFieldPosition(pose) => pose,
        }
    }

    /// Supply a new pose from the external field position system.
    pub fn set_external_pose(&mut self, pose: Pose2) -> Result<(), LocError> {
        match self.source {
            LocSource::ExternalFieldPosition(ref mut p) => {
                *p = Some(pose);
                Ok(())
            }
            _ => Err(LocError::NotExternalSource(self.source_kind())),
        }
    }

    /// Reset the pose estimate to the given pose.
    pub fn reset_pose(&mut self, pose: Pose2) {
        info!(
            "Pose reset to ({:.3}, {:.3}, {:.3})",
            pose.x_m, pose.y_m, pose.heading_rad
        );

        match self.source {
            LocSource::GyroOdometry(ref mut est) => {
                est.reset(pose, self.heading.heading_rad(), &self.positions)
            }
            LocSource::ExternalFieldPosition(ref mut p) => *p = Some(pose),
        }
    }

    /// Re-reference the module positions without moving the pose, used after the drive encoders
    /// are zeroed.
    pub fn reset_positions(&mut self, positions: &[ModulePosition; NUM_MODULES]) {
        debug!("Module position reference reset");

        self.positions = *positions;

        if let LocSource::GyroOdometry(ref mut est) = self.source {
            let pose = est.pose();
            est.reset(pose, self.heading.heading_rad(), positions);
        }
    }

    /// Reset the heading to zero, keeping the position.
    ///
    /// Does nothing if the source has not provided a pose yet.
    pub fn zero_heading(&mut self) {
        match self.get_pose() {
            Some(pose) => self.reset_pose(Pose2 {
                heading_rad: 0.0,
                ..pose
            }),
            None => warn!("Cannot zero the heading, no pose is available yet"),
        }
    }

    /// The current pose, or `None` if the source has not provided one.
    pub fn get_pose(&self) -> Option<Pose2> {
        match self.source {
            LocSource::GyroOdometry(ref est) => Some(est.pose()),
            LocSource::ExternalFieldPosition(pose) => pose,
        }
    }

    /// The current heading in radians, from this cycle's heading sample.
    pub fn get_heading(&self) -> f64 {
        match self.source {
            LocSource::GyroOdometry(ref est) => est.heading_for(self.heading.heading_rad()),
            LocSource::ExternalFieldPosition(Some(pose)) => pose.heading_rad,
            LocSource::ExternalFieldPosition(None) => {
                util::maths::wrap_pi(self.heading.heading_rad())
            }
        }
    }

    /// Counter-clockwise positive turn rate.
    ///
    /// Units: radians/second
    pub fn get_turn_rate(&self) -> f64 {
        self.heading.turn_rate_rads()
    }

    pub fn report(&self) -> StatusReport {
        StatusReport {
            heading_degraded: self.heading.is_degraded(),
            pose_unavailable: self.get_pose().is_none(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn params(source: PoseSourceKind) -> LocMgrParams {
        LocMgrParams {
            source,
            heading_inverted: true,
            heading_offset_deg: 0.0,
            heading_stale_limit_s: 0.1,
        }
    }

    fn geometry() -> ModuleGeometry {
        ModuleGeometry::new([[0.4, 0.35], [0.4, -0.35], [-0.4, 0.35], [-0.4, -0.35]]).unwrap()
    }

    fn positions(distance_m: f64) -> [ModulePosition; NUM_MODULES] {
        [ModulePosition {
            distance_m,
            angle_rad: 0.0,
        }; NUM_MODULES]
    }

    fn imu(t: f64, yaw_deg: f64) -> ImuData {
        ImuData {
            timestamp_s: t,
            yaw_deg,
            yaw_rate_degs: 0.0,
        }
    }

    #[test]
    fn test_gyro_odometry() {
        let mut loc = LocMgr::from_params(&params(PoseSourceKind::GyroOdometry), geometry());

        // Inverted sensor, -90 deg of yaw is facing field +Y
        loc.sample_heading(Some(&imu(0.0, -90.0)), 0.0);
        loc.update(&positions(0.0));
        loc.sample_heading(Some(&imu(0.02, -90.0)), 0.02);
        let pose = loc.update(&positions(1.0)).unwrap();

        assert!(pose.x_m.abs() < 1e-9);
        assert!((pose.y_m - 1.0).abs() < 1e-9);
        assert!(!loc.report().heading_degraded);

        assert!(loc.set_external_pose(Pose2::default()).is_err());
    }

    #[test]
    fn test_zero_heading_keeps_position() {
        let mut loc = LocMgr::from_params(&params(PoseSourceKind::GyroOdometry), geometry());

        loc.sample_heading(Some(&imu(0.0, -45.0)), 0.0);
        loc.update(&positions(0.0));
        loc.update(&positions(2.0));

        let before = loc.get_pose().unwrap();
        loc.zero_heading();

        let after = loc.get_pose().unwrap();
        assert_eq!(after.x_m, before.x_m);
        assert_eq!(after.y_m, before.y_m);
        assert!(loc.get_heading().abs() < 1e-12);

        // Subsequent forward motion is along field +X
        loc.update(&positions(3.0));
        let moved = loc.get_pose().unwrap();
        assert!((moved.x_m - after.x_m - 1.0).abs() < 1e-9);
        assert!((moved.y_m - after.y_m).abs() < 1e-9);
    }

    #[test]
    fn test_zero_heading_without_external_pose() {
        let mut loc = LocMgr::from_params(
            &params(PoseSourceKind::ExternalFieldPosition),
            geometry(),
        );

        loc.zero_heading();
        assert_eq!(loc.get_pose(), None);
        assert!(loc.report().pose_unavailable);

        loc.set_external_pose(Pose2::new(1.0, 2.0, 0.5)).unwrap();
        loc.zero_heading();
        assert_eq!(loc.get_pose(), Some(Pose2::new(1.0, 2.0, 0.0)));
    }

    #[test]
    fn test_degraded_heading_is_reported() {
        let mut loc = LocMgr::from_params(&params(PoseSourceKind::GyroOdometry), geometry());

        loc.sample_heading(Some(&imu(0.0, -30.0)), 0.0);
        loc.update(&positions(0.0));

        loc.sample_heading(None, 0.02);
        loc.update(&positions(0.0));

        assert!(loc.report().heading_degraded);
        assert!((loc.get_heading() - 30f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_external_source() {
        let mut loc =
            LocMgr::from_params(&params(PoseSourceKind::ExternalFieldPosition), geometry());

        assert_eq!(loc.get_pose(), None);
        assert!(loc.report().pose_unavailable);

        let pose = Pose2::new(1.0, 2.0, 0.5);
        loc.set_external_pose(pose).unwrap();
        assert_eq!(loc.update(&positions(5.0)), Some(pose));
        assert_eq!(loc.get_heading(), 0.5);

        loc.reset_pose(Pose2::default());
        assert_eq!(loc.get_pose(), Some(Pose2::default()));
    }
}
