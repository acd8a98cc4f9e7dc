//! # Data Store

use comms_if::eqpt::mech::MechDems;
use log::{info, warn};

use crate::{
    drive_ctrl::{self, DriveCtrl},
    sim_mech::SimMech,
    task::Scheduler,
};

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the robot has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SafeModeCause {
    MakeSafeTc,
    CycleOverruns,
    MotorOverTemp,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Session time at the start of this cycle
    pub time_s: f64,

    // Safe mode variables
    /// Determines if the robot is in safe mode.
    pub safe: bool,

    /// Gives the reason for the robot being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // Velocity sources
    pub scheduler: Scheduler,

    // DriveCtrl
    pub drive_ctrl: DriveCtrl,
    pub drive_ctrl_input: drive_ctrl::InputData,
    pub drive_ctrl_output: MechDems,
    pub drive_ctrl_status_rpt: drive_ctrl::StatusReport,

    // Mechanisms
    pub sim: SimMech,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    pub fn new(drive_ctrl: DriveCtrl, scheduler: Scheduler, sim: SimMech) -> Self {
        Self {
            num_cycles: 0,
            is_1_hz_cycle: false,
            time_s: 0.0,
            safe: false,
            safe_cause: None,
            scheduler,
            drive_ctrl,
            drive_ctrl_input: drive_ctrl::InputData::default(),
            drive_ctrl_output: MechDems::default(),
            drive_ctrl_status_rpt: drive_ctrl::StatusReport::default(),
            sim,
            num_consec_cycle_overruns: 0,
        }
    }

    /// Puts the robot into safe mode with the given cause.
    ///
    /// Any trajectory being followed is cancelled and queued requests are dropped. While safe the
    /// executable commands the modules to stop every cycle.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);

            self.scheduler.cancel_all();
        }
    }

    /// Attempts to disable the safe mode by clearing the given cause.
    ///
    /// To remove safe mode the provided cause must match the initial reason for safe mode being
    /// enabled, otherwise the root cause is returned as the error.
    ///
    /// If safe mode was not enabled `Ok(())` is returned
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), SafeModeCause> {
        if !self.safe {
            return Ok(());
        }

        match self.safe_cause {
            Some(root_cause) if root_cause != cause => Err(root_cause),
            _ => {
                self.safe = false;
                self.safe_cause = None;
                info!("Make unsafe requested, root cause match, safe mode disabled");
                Ok(())
            }
        }
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        let cycles_per_s = (cycle_frequency_hz.round() as u128).max(1);
        self.is_1_hz_cycle = self.num_cycles % cycles_per_s == 0;

        self.drive_ctrl_input = drive_ctrl::InputData::default();
        self.drive_ctrl_output = MechDems::default();
        self.drive_ctrl_status_rpt = drive_ctrl::StatusReport::default();

        self.time_s = self.sim.time_s();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        drive_ctrl::DriveDemand,
        sim_mech,
        task::{ActiveSource, SourceRequest, TaskInput, TeleopTask},
        traj_ctrl::{self, HeadingSource, TrajCtrl, TrajCtrlMode, Trajectory},
    };
    use comms_if::tc::drive_ctrl::DriveCmd;
    use util::module::State;

    /// Data store built from the parameter files shipped with the software.
    fn data_store() -> DataStore {
        let dc_params: drive_ctrl::Params =
            util::params::from_toml_str(include_str!("../../params/drive_ctrl.toml")).unwrap();
        let tc_params: traj_ctrl::Params =
            util::params::from_toml_str(include_str!("../../params/traj_ctrl.toml")).unwrap();
        let sim_params: sim_mech::Params =
            util::params::from_toml_str(include_str!("../../params/sim_mech.toml")).unwrap();

        let drive_ctrl = DriveCtrl::init(dc_params).unwrap();
        let sim = SimMech::new(sim_params, drive_ctrl.geometry().clone()).unwrap();
        let scheduler = Scheduler::new(
            TeleopTask::new(Some(1.0)),
            TrajCtrl::new(tc_params, drive_ctrl.geometry().clone()).unwrap(),
        );

        DataStore::new(drive_ctrl, scheduler, sim)
    }

    fn trajectory() -> Trajectory {
        Trajectory::from_json(include_str!("../../trajectories/auto_move.json")).unwrap()
    }

    #[test]
    fn test_safe_mode_causes() {
        let mut ds = data_store();

        assert_eq!(ds.make_unsafe(SafeModeCause::MakeSafeTc), Ok(()));

        ds.make_safe(SafeModeCause::MotorOverTemp);
        ds.make_safe(SafeModeCause::MakeSafeTc);
        assert!(ds.safe);
        assert_eq!(ds.safe_cause, Some(SafeModeCause::MotorOverTemp));

        // Only the root cause clears safe mode
        assert_eq!(
            ds.make_unsafe(SafeModeCause::MakeSafeTc),
            Err(SafeModeCause::MotorOverTemp)
        );
        assert!(ds.safe);

        assert_eq!(ds.make_unsafe(SafeModeCause::MotorOverTemp), Ok(()));
        assert!(!ds.safe);
        assert_eq!(ds.safe_cause, None);
    }

    #[test]
    fn test_make_safe_cancels_tasks() {
        let mut ds = data_store();

        ds.scheduler.request(SourceRequest::Trajectory(
            trajectory(),
            HeadingSource::FinalPose,
        ));
        let input = TaskInput {
            pose: ds.drive_ctrl.pose(),
            dt_s: 0.02,
            time_s: 0.0,
        };
        ds.scheduler.step(&input);
        assert_eq!(ds.scheduler.active(), ActiveSource::Trajectory);

        // A queued teleop command must not survive safe mode either
        ds.scheduler.request(SourceRequest::Teleop(DriveCmd {
            x: 0.5,
            y: 0.0,
            rot: 0.0,
            field_relative: None,
        }));

        ds.make_safe(SafeModeCause::MakeSafeTc);
        assert_eq!(ds.scheduler.active(), ActiveSource::Teleop);
        assert_eq!(ds.scheduler.traj_ctrl().mode(), TrajCtrlMode::Cancelled);
        assert_eq!(ds.scheduler.step(&input), DriveDemand::None);
    }

    #[test]
    fn test_cycle_start() {
        let mut ds = data_store();

        ds.drive_ctrl_input.demand = DriveDemand::Stop;
        ds.cycle_start(50.0);
        assert!(ds.is_1_hz_cycle);
        assert_eq!(ds.drive_ctrl_input.demand, DriveDemand::None);

        ds.num_cycles = 49;
        ds.cycle_start(50.0);
        assert!(!ds.is_1_hz_cycle);

        ds.num_cycles = 50;
        ds.cycle_start(50.0);
        assert!(ds.is_1_hz_cycle);

        ds.sim.step(0.02);
        ds.cycle_start(50.0);
        assert!((ds.time_s - 0.02).abs() < 1e-12);
    }
}
