//! # Telecommand processor module
//!
//! The telecommand processor handles various TCs coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use std::path::Path;

// Internal
use comms_if::tc::{traj_ctrl::FollowCmd, Tc};
use swerve_lib::{
    data_store::{DataStore, SafeModeCause},
    drive_ctrl::DriveDemand,
    loc::Pose2,
    task::SourceRequest,
    traj_ctrl::{Trajectory, TrajectoryError},
};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules. While the robot is safe only the
/// MakeUnsafe TC is executed. Trajectory files are looked up in `traj_dir`.
pub(crate) fn exec(ds: &mut DataStore, tc: &Tc, traj_dir: &Path) {
    if ds.safe && *tc != Tc::MakeUnsafe {
        warn!("Robot is safe, rejected TC {:?}", tc);
        return;
    }

    // Handle different Tcs
    match tc {
        Tc::MakeSafe => {
            debug!("Recieved MakeSafe command");
            ds.make_safe(SafeModeCause::MakeSafeTc);
        }
        Tc::MakeUnsafe => {
            debug!("Recieved MakeUnsafe command");
            if let Err(root_cause) = ds.make_unsafe(SafeModeCause::MakeSafeTc) {
                warn!(
                    "Cannot make unsafe, safe mode was caused by {:?}",
                    root_cause
                );
            }
        }
        Tc::Drive(cmd) => ds.scheduler.request(SourceRequest::Teleop(*cmd)),
        Tc::SetX => ds
            .scheduler
            .request(SourceRequest::OneShot(DriveDemand::SetX)),
        Tc::Stop => ds
            .scheduler
            .request(SourceRequest::OneShot(DriveDemand::Stop)),
        Tc::Follow(cmd) => match load_trajectory(cmd, traj_dir) {
            Ok(trajectory) => {
                info!("Following trajectory {:?}", cmd.trajectory);
                ds.scheduler.request(SourceRequest::Trajectory(
                    trajectory,
                    cmd.heading.into(),
                ));
            }
            Err(e) => warn!("Cannot follow trajectory {:?}: {}", cmd.trajectory, e),
        },
        Tc::Cancel => ds.scheduler.request(SourceRequest::Cancel),
        Tc::ResetPose(pose) => ds.drive_ctrl.reset_pose(Pose2::from(*pose)),
        Tc::ZeroHeading => ds.drive_ctrl.zero_heading(),
        Tc::ResetEncoders => ds.drive_ctrl.reset_encoders(),
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn load_trajectory(cmd: &FollowCmd, traj_dir: &Path) -> Result<Trajectory, TrajectoryError> {
    Trajectory::from_file(traj_dir.join(&cmd.trajectory))
}
