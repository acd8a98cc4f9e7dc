//! # Tasks and the velocity source scheduler
//!
//! Only one source may command the drivetrain at a time: either teleop, which is the default, or
//! trajectory control. Both are tasks with the same `start/step/is_done/cancel` lifecycle, stepped
//! once per cycle by the `Scheduler`.
//!
//! Requests to change source are queued and applied at the start of the next step, so a switch
//! always happens on a cycle boundary. A new source supersedes whichever was active. Cancelling a
//! task does not zero the demands it last issued.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;

// Internal
use crate::{
    drive_ctrl::DriveDemand,
    loc::Pose2,
    traj_ctrl::{HeadingSource, TrajCtrl, Trajectory},
};
use comms_if::tc::drive_ctrl::DriveCmd;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A finite-state task which produces one drive demand per cycle.
pub trait Task {
    /// Begin executing the task.
    fn start(&mut self);

    /// Execute one cycle of the task.
    fn step(&mut self, input: &TaskInput) -> DriveDemand;

    /// True once the task has finished or been cancelled.
    fn is_done(&self) -> bool;

    /// Stop executing the task. Takes effect on the next step.
    fn cancel(&mut self);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Data available to a task each cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskInput {
    /// Current pose of the robot, if the pose source has one.
    pub pose: Option<Pose2>,

    /// Length of the cycle.
    ///
    /// Units: seconds
    pub dt_s: f64,

    /// Session time at the start of the cycle.
    ///
    /// Units: seconds
    pub time_s: f64,
}

/// Teleop velocity source. Holds the latest drive command and issues it every cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeleopTask {
    /// Latest command and the time it was received
    cmd: Option<(DriveCmd, f64)>,

    /// Time after which a command with no successor is replaced by a stop.
    ///
    /// Units: seconds
    timeout_s: Option<f64>,

    timed_out: bool,
}

/// Arbitrates which task commands the drivetrain.
pub struct Scheduler {
    teleop: TeleopTask,

    traj_ctrl: TrajCtrl,

    active: ActiveSource,

    /// Request to be applied at the start of the next step.
    pending: Option<SourceRequest>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The source currently commanding the drivetrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActiveSource {
    Teleop,
    Trajectory,
}

/// A request to change what is commanding the drivetrain.
#[derive(Debug, Clone)]
pub enum SourceRequest {
    /// Drive with a teleop command.
    Teleop(DriveCmd),

    /// Follow a trajectory.
    Trajectory(Trajectory, HeadingSource),

    /// Cancel trajectory following and return to teleop.
    Cancel,

    /// Issue a single demand, then hold until the next request.
    OneShot(DriveDemand),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TeleopTask {
    pub fn new(timeout_s: Option<f64>) -> Self {
        Self {
            cmd: None,
            timeout_s,
            timed_out: false,
        }
    }

    /// Replace the held command.
    pub fn set_cmd(&mut self, cmd: DriveCmd, time_s: f64) {
        self.cmd = Some((cmd, time_s));
        self.timed_out = false;
    }

    /// Drop the held command without issuing anything.
    pub fn clear(&mut self) {
        self.cmd = None;
    }
}

impl Task for TeleopTask {
    fn start(&mut self) {
        self.timed_out = false;
    }

    fn step(&mut self, input: &TaskInput) -> DriveDemand {
        let (cmd, cmd_time_s) = match self.cmd {
            Some(c) => c,
            None => return DriveDemand::None,
        };

        if let Some(timeout_s) = self.timeout_s {
            if input.time_s - cmd_time_s > timeout_s {
                if self.timed_out {
                    return DriveDemand::None;
                }

                warn!(
                    "No drive command for {:.2} s, stopping",
                    input.time_s - cmd_time_s
                );
                self.timed_out = true;

                return DriveDemand::Teleop {
                    x: 0.0,
                    y: 0.0,
                    rot: 0.0,
                    field_relative: cmd.field_relative,
                };
            }
        }

        DriveDemand::Teleop {
            x: cmd.x,
            y: cmd.y,
            rot: cmd.rot,
            field_relative: cmd.field_relative,
        }
    }

    /// Teleop never finishes by itself.
    fn is_done(&self) -> bool {
        false
    }

    fn cancel(&mut self) {
        self.clear();
    }
}

impl Scheduler {
    pub fn new(teleop: TeleopTask, traj_ctrl: TrajCtrl) -> Self {
        Self {
            teleop,
            traj_ctrl,
            active: ActiveSource::Teleop,
            pending: None,
        }
    }

    /// Queue a change of source for the next cycle boundary. A later request in the same cycle
    /// replaces an earlier one.
    pub fn request(&mut self, req: SourceRequest) {
        if let Some(ref prev) = self.pending {
            debug!("Source request {:?} replaced before it was applied", prev);
        }

        self.pending = Some(req);
    }

    /// Cancel everything immediately and drop any queued request.
    pub fn cancel_all(&mut self) {
        self.pending = None;
        self.traj_ctrl.cancel();
        self.teleop.cancel();
        self.active = ActiveSource::Teleop;
    }

    /// Step the active task, applying any queued request first.
    pub fn step(&mut self, input: &TaskInput) -> DriveDemand {
        if let Some(req) = self.pending.take() {
            if let Some(demand) = self.apply(req, input.time_s) {
                return demand;
            }
        }

        match self.active {
            ActiveSource::Teleop => self.teleop.step(input),
            ActiveSource::Trajectory => {
                let demand = self.traj_ctrl.step(input);

                if self.traj_ctrl.is_done() {
                    info!("Trajectory task done, returning to teleop");
                    self.active = ActiveSource::Teleop;
                }

                demand
            }
        }
    }

    pub fn active(&self) -> ActiveSource {
        self.active
    }

    pub fn traj_ctrl(&self) -> &TrajCtrl {
        &self.traj_ctrl
    }

    pub fn traj_ctrl_mut(&mut self) -> &mut TrajCtrl {
        &mut self.traj_ctrl
    }

    /// Apply a request, returning a demand if the request issues one directly.
    fn apply(&mut self, req: SourceRequest, time_s: f64) -> Option<DriveDemand> {
        match req {
            SourceRequest::Teleop(cmd) => {
                if self.active == ActiveSource::Trajectory {
                    info!("Teleop command supersedes trajectory");
                    self.traj_ctrl.cancel();
                }

                if self.active != ActiveSource::Teleop || self.teleop.cmd.is_none() {
                    self.teleop.start();
                }
                self.teleop.set_cmd(cmd, time_s);
                self.active = ActiveSource::Teleop;

                None
            }
            SourceRequest::Trajectory(trajectory, heading) => {
                self.traj_ctrl.cancel();
                self.teleop.cancel();
                self.active = ActiveSource::Teleop;

                match self.traj_ctrl.load(trajectory, heading) {
                    Ok(()) => {
                        self.traj_ctrl.start();
                        self.active = ActiveSource::Trajectory;
                    }
                    Err(e) => warn!("Could not load trajectory: {}", e),
                }

                None
            }
            SourceRequest::Cancel => {
                self.traj_ctrl.cancel();
                self.active = ActiveSource::Teleop;

                None
            }
            SourceRequest::OneShot(demand) => {
                self.traj_ctrl.cancel();
                self.teleop.cancel();
                self.active = ActiveSource::Teleop;

                Some(demand)
            }
        }
    }
}
