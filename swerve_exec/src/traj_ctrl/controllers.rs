//! # Trajectory controllers module
//!
//! This module provides the holonomic controller used by TrajCtrl, which combines velocity
//! feedforward from the trajectory with PID feedback on the field position error, and a profiled
//! PID on heading which is independent of the direction of travel.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;
use std::f64::consts::PI;

// Internal
use super::{Params, TrajectorySample};
use crate::{
    controllers::{Constraints, PidController, ProfiledPidController},
    kinematics::ChassisVelocity,
    loc::Pose2,
};
use util::maths::get_ang_dist;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The trajectory controllers
#[derive(Debug, Clone, Serialize)]
pub struct HolonomicController {
    /// Field X error controller
    x_ctrl: PidController,

    /// Field Y error controller
    y_ctrl: PidController,

    /// Heading controller
    theta_ctrl: ProfiledPidController,

    /// The heading profile is restarted from the measured heading on the first calculation
    first_run: bool,

    /// Reference pose minus current pose at the last calculation
    pose_error: Pose2,

    /// Desired heading minus current heading at the last calculation
    ///
    /// Units: radians
    rotation_error_rad: f64,

    position_tolerance_m: f64,

    angle_tolerance_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl HolonomicController {
    /// Create a new instance of the controllers from the parameters
    pub fn new(params: &Params) -> Self {
        Self {
            x_ctrl: PidController::from_gains(&params.x_gains),
            y_ctrl: PidController::from_gains(&params.y_gains),
            theta_ctrl: ProfiledPidController::new(
                &params.theta_gains,
                Constraints::new(params.theta_max_vel_rads, params.theta_max_accel_radss),
            )
            .with_continuous_input(-PI, PI),
            first_run: true,
            pose_error: Pose2::default(),
            rotation_error_rad: 0.0,
            position_tolerance_m: params.position_tolerance_m,
            angle_tolerance_rad: params.angle_tolerance_deg.to_radians(),
        }
    }

    /// Compute the chassis velocity which drives the robot from `current` towards `reference`
    /// while turning to `desired_heading_rad`.
    pub fn calculate(
        &mut self,
        current: &Pose2,
        reference: &TrajectorySample,
        desired_heading_rad: f64,
        dt_s: f64,
    ) -> ChassisVelocity {
        if self.first_run {
            self.theta_ctrl.reset(current.heading_rad);
            self.first_run = false;
        }

        // Feedforward along the path direction
        let (sin, cos) = reference.pose.heading_rad.sin_cos();
        let x_ff = reference.velocity_ms * cos;
        let y_ff = reference.velocity_ms * sin;

        let theta_ff = self
            .theta_ctrl
            .calculate(current.heading_rad, desired_heading_rad, dt_s);

        self.pose_error = Pose2 {
            x_m: reference.pose.x_m - current.x_m,
            y_m: reference.pose.y_m - current.y_m,
            heading_rad: get_ang_dist(current.heading_rad, reference.pose.heading_rad),
        };
        self.rotation_error_rad = get_ang_dist(current.heading_rad, desired_heading_rad);

        let x_fb = self.x_ctrl.calculate(current.x_m, reference.pose.x_m, dt_s);
        let y_fb = self.y_ctrl.calculate(current.y_m, reference.pose.y_m, dt_s);

        ChassisVelocity::from_field_relative(
            x_ff + x_fb,
            y_ff + y_fb,
            theta_ff,
            current.heading_rad,
        )
    }

    /// True if the last calculation was within tolerance of the reference position and desired
    /// heading.
    pub fn at_reference(&self) -> bool {
        self.pose_error.x_m.abs() < self.position_tolerance_m
            && self.pose_error.y_m.abs() < self.position_tolerance_m
            && self.rotation_error_rad.abs() < self.angle_tolerance_rad
    }

    pub fn pose_error(&self) -> Pose2 {
        self.pose_error
    }

    pub fn rotation_error_rad(&self) -> f64 {
        self.rotation_error_rad
    }
}
