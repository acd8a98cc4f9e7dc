//! Trajectory control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use serde::Serialize;

// Internal
use super::*;
use crate::{
    drive_ctrl::DriveDemand,
    kinematics::ModuleGeometry,
    loc::Pose2,
    task::{Task, TaskInput},
};
use comms_if::tc::traj_ctrl::HeadingSpec;
use util::{
    archive::{Archived, Archiver},
    maths::get_ang_dist,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Follows a trajectory by sampling it each cycle and driving the robot towards the sample.
pub struct TrajCtrl {
    params: Params,

    geometry: ModuleGeometry,

    /// Executing mode
    mode: TrajCtrlMode,

    /// The trajectory being followed
    trajectory: Option<Trajectory>,

    heading_source: HeadingSource,

    /// Time since the trajectory was started
    ///
    /// Units: seconds
    elapsed_s: f64,

    controller: HolonomicController,

    report: StatusReport,

    /// The report holds a cycle that has not been archived yet
    report_pending: bool,

    arch_report: Archiver,
}

/// The status report containing monitoring quantities for the current cycle.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// Time since the trajectory was started
    pub elapsed_s: f64,

    /// Reference position minus current position in the field frame
    pub pos_error_x_m: f64,
    pub pos_error_y_m: f64,

    /// Desired heading minus current heading
    pub heading_error_rad: f64,

    /// The controller is within tolerance of the current reference
    pub at_reference: bool,

    /// The final pose has been reached this cycle
    pub finished: bool,

    /// No pose was available, tracking was cancelled
    pub no_pose: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur when commanding the module.
#[derive(Debug, thiserror::Error)]
pub enum TrajCtrlError {
    /// A trajectory is being followed. Cancel it before loading another.
    #[error("Attempted to load a trajectory while one is being followed")]
    TrajectoryActive,

    /// Attempted to start without a loaded trajectory.
    #[error("No trajectory has been loaded")]
    NoTrajectory,

    #[error("Invalid trajectory: {0}")]
    InvalidTrajectory(TrajectoryError),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),
}

/// The possible modes of execution of TrajCtrl. Each mode is handled by a `mode_xyz` function.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum TrajCtrlMode {
    /// Nothing loaded, or a trajectory loaded but not yet started
    Idle,

    /// Following the trajectory
    Running,

    /// The final pose was reached
    Finished,

    /// Following was cancelled before the final pose was reached
    Cancelled,
}

/// Where the heading the robot holds while following comes from.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub enum HeadingSource {
    /// The heading of the trajectory's final pose, held throughout
    FinalPose,

    /// A fixed heading in radians
    Fixed(f64),

    /// The heading of each trajectory sample
    TrajectorySample,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajCtrl {
    /// Build the tracker, rejecting unusable parameters.
    pub fn new(params: Params, geometry: ModuleGeometry) -> Result<Self, TrajCtrlError> {
        params.validate()?;

        let controller = HolonomicController::new(&params);

        Ok(Self {
            params,
            geometry,
            mode: TrajCtrlMode::Idle,
            trajectory: None,
            heading_source: HeadingSource::FinalPose,
            elapsed_s: 0.0,
            controller,
            report: StatusReport::default(),
            report_pending: false,
            arch_report: Archiver::default(),
        })
    }

    /// Start archiving the status report of every tracking cycle into the session's archive
    /// directory.
    pub fn init_archive(&mut self, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report = Archiver::from_path(session, "traj_ctrl_status_report.csv")?;

        Ok(())
    }

    /// Load a trajectory to be followed when the task is next started.
    ///
    /// Loading while a trajectory is being followed is an error, the running one must be
    /// cancelled first.
    pub fn load(
        &mut self,
        trajectory: Trajectory,
        heading_source: HeadingSource,
    ) -> Result<(), TrajCtrlError> {
        if self.mode == TrajCtrlMode::Running {
            return Err(TrajCtrlError::TrajectoryActive);
        }

        info!(
            "Loaded trajectory with {} samples over {:.2} s",
            trajectory.samples().len(),
            trajectory.total_time_s()
        );

        self.trajectory = Some(trajectory);
        self.heading_source = heading_source;
        self.mode = TrajCtrlMode::Idle;

        Ok(())
    }

    /// Return to idle after finishing or being cancelled, dropping the trajectory.
    pub fn clear(&mut self) {
        self.trajectory = None;
        self.mode = TrajCtrlMode::Idle;
    }

    pub fn mode(&self) -> TrajCtrlMode {
        self.mode
    }

    pub fn report(&self) -> StatusReport {
        self.report
    }

    /// True if `pose` is within tolerance of the final pose and final desired heading.
    pub fn is_finished(&self, pose: &Pose2) -> bool {
        let trajectory = match self.trajectory {
            Some(ref t) => t,
            None => return false,
        };

        let final_sample = trajectory.final_sample();
        let final_heading_rad = self.desired_heading(&final_sample);

        let heading_error_deg = get_ang_dist(pose.heading_rad, final_heading_rad).to_degrees();

        (heading_error_deg.abs() % 360.0) < self.params.angle_tolerance_deg
            && (final_sample.pose.x_m - pose.x_m).abs() < self.params.position_tolerance_m
            && (final_sample.pose.y_m - pose.y_m).abs() < self.params.position_tolerance_m
    }

    fn desired_heading(&self, sample: &TrajectorySample) -> f64 {
        match self.heading_source {
            HeadingSource::FinalPose => match self.trajectory {
                Some(ref t) => t.final_sample().pose.heading_rad,
                None => sample.pose.heading_rad,
            },
            HeadingSource::Fixed(h) => h,
            HeadingSource::TrajectorySample => sample.pose.heading_rad,
        }
    }

    /// Mode not executing, no demands are issued.
    fn mode_idle(&mut self) -> DriveDemand {
        DriveDemand::None
    }

    /// Mode following the trajectory.
    fn mode_running(&mut self, input: &TaskInput) -> DriveDemand {
        let trajectory = match self.trajectory {
            Some(ref t) => t,
            None => {
                warn!("TrajCtrl running without a trajectory, cancelling");
                self.mode = TrajCtrlMode::Cancelled;
                return DriveDemand::None;
            }
        };

        let pose = match input.pose {
            Some(p) => p,
            None => {
                warn!("No pose available, cancelling trajectory");
                self.report.no_pose = true;
                self.mode = TrajCtrlMode::Cancelled;
                return DriveDemand::None;
            }
        };

        let reference = trajectory.sample(self.elapsed_s);
        let desired_heading_rad = self.desired_heading(&reference);

        let mut vel = self
            .controller
            .calculate(&pose, &reference, desired_heading_rad, input.dt_s);

        if self.params.angular_output_inverted {
            vel.omega_rads = -vel.omega_rads;
        }

        let pose_error = self.controller.pose_error();
        self.report.elapsed_s = self.elapsed_s;
        self.report.pos_error_x_m = pose_error.x_m;
        self.report.pos_error_y_m = pose_error.y_m;
        self.report.heading_error_rad = self.controller.rotation_error_rad();
        self.report.at_reference = self.controller.at_reference();

        self.elapsed_s += input.dt_s;

        if self.is_finished(&pose) {
            info!("Trajectory finished after {:.2} s", self.elapsed_s);
            self.report.finished = true;
            self.mode = TrajCtrlMode::Finished;
        }

        DriveDemand::ModuleStates(self.geometry.to_module_states(&vel))
    }
}

impl Task for TrajCtrl {
    fn start(&mut self) {
        if self.trajectory.is_none() {
            warn!("{}", TrajCtrlError::NoTrajectory);
            return;
        }

        self.elapsed_s = 0.0;
        self.controller = HolonomicController::new(&self.params);
        self.report = StatusReport::default();
        self.mode = TrajCtrlMode::Running;

        info!("Trajectory started");
    }

    fn step(&mut self, input: &TaskInput) -> DriveDemand {
        self.report = StatusReport {
            elapsed_s: self.elapsed_s,
            ..StatusReport::default()
        };

        self.report_pending = self.mode == TrajCtrlMode::Running;

        match self.mode {
            TrajCtrlMode::Running => self.mode_running(input),
            TrajCtrlMode::Idle | TrajCtrlMode::Finished | TrajCtrlMode::Cancelled => {
                self.mode_idle()
            }
        }
    }

    fn is_done(&self) -> bool {
        matches!(self.mode, TrajCtrlMode::Finished | TrajCtrlMode::Cancelled)
    }

    fn cancel(&mut self) {
        if self.mode == TrajCtrlMode::Running {
            info!("Trajectory cancelled after {:.2} s", self.elapsed_s);
            self.mode = TrajCtrlMode::Cancelled;
        }
    }
}

impl Archived for TrajCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.report_pending {
            self.arch_report.serialise(self.report)?;
            self.report_pending = false;
        }

        Ok(())
    }
}

impl From<HeadingSpec> for HeadingSource {
    fn from(heading: HeadingSpec) -> Self {
        match heading {
            HeadingSpec::FinalPose => HeadingSource::FinalPose,
            HeadingSpec::Fixed(h) => HeadingSource::Fixed(h),
            HeadingSpec::Trajectory => HeadingSource::TrajectorySample,
        }
    }
}
