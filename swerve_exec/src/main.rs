//! Main swerve executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - System input acquisition:
//!             - Actuator sensing
//!             - Heading sensing
//!         - Telecommand processing and handling
//!         - Velocity source processing (teleop or trajectory control)
//!         - Drive control processing
//!         - Mechanisms execution
//!
//! The mechanisms are simulated, and the simulation clock is the session clock of the loop, so a
//! script runs the same way whether or not the loop keeps up with real time.
//!
//! # Modules
//!
//! All cyclic modules (e.g. `drive_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use comms_if::eqpt::mech::MechDemsResponse;
use swerve_lib::{
    data_store::{DataStore, SafeModeCause},
    drive_ctrl::{self, DriveCtrl, DriveDemand},
    loc::PoseSourceKind,
    params::SwerveExecParams,
    sim_mech::{self, SimMech},
    task::{Scheduler, TaskInput, TeleopTask},
    traj_ctrl::{self, TrajCtrl},
};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use util::{
    archive::Archived,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Swerve drive executable, runs a telecommand script against the simulated drivetrain.
#[derive(Debug, StructOpt)]
#[structopt(name = "swerve_exec")]
struct Cli {
    /// Path to the telecommand script to run.
    #[structopt(parse(from_os_str))]
    script: PathBuf,

    /// Run cycles back to back instead of at the cycle period.
    #[structopt(long)]
    fast: bool,

    /// Log debug messages.
    #[structopt(short, long)]
    verbose: bool,
}

/// Where the robot ended up, saved into the session at the end of execution.
#[derive(Debug, Serialize)]
struct FinalState {
    time_s: f64,
    estimated_pose: Option<swerve_lib::loc::Pose2>,
    true_pose: swerve_lib::loc::Pose2,
    safe: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let cli = Cli::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("swerve_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logger_init(level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Swerve Drive Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: SwerveExecParams =
        util::params::load("swerve_exec.toml").wrap_err("Could not load exec params")?;
    let drive_ctrl_params: drive_ctrl::Params = util::params::load(&exec_params.drive_ctrl_params)
        .wrap_err("Could not load DriveCtrl params")?;
    let traj_ctrl_params: traj_ctrl::Params = util::params::load(&exec_params.traj_ctrl_params)
        .wrap_err("Could not load TrajCtrl params")?;
    let sim_mech_params: sim_mech::Params = util::params::load(&exec_params.sim_mech_params)
        .wrap_err("Could not load SimMech params")?;

    info!("Exec parameters loaded");

    let traj_dir = host::get_swerve_sw_root()
        .wrap_err("Could not find the software root")?
        .join("trajectories");

    // ---- INITIALISE TC SOURCE ----

    let mut script = ScriptInterpreter::new(&cli.script).wrap_err("Failed to load script")?;

    info!(
        "Loaded script {:?} lasts {:.02} s and contains {} TCs\n",
        script.script_path(),
        script.get_duration(),
        script.get_num_tcs()
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut drive_ctrl =
        DriveCtrl::init(drive_ctrl_params).wrap_err("Failed to initialise DriveCtrl")?;
    info!("DriveCtrl init complete");

    let mut traj_ctrl = TrajCtrl::new(traj_ctrl_params, drive_ctrl.geometry().clone())
        .wrap_err("Failed to initialise TrajCtrl")?;
    info!("TrajCtrl init complete");

    let sim = SimMech::new(sim_mech_params, drive_ctrl.geometry().clone())
        .wrap_err("Failed to initialise SimMech")?;
    info!("SimMech init complete");

    if exec_params.archive {
        drive_ctrl
            .init_archive(&session)
            .map_err(|e| eyre!("Failed to initialise the DriveCtrl archive: {}", e))?;
        traj_ctrl
            .init_archive(&session)
            .map_err(|e| eyre!("Failed to initialise the TrajCtrl archive: {}", e))?;
        info!("Archiving enabled");
    }

    let scheduler = Scheduler::new(TeleopTask::new(exec_params.teleop_timeout_s), traj_ctrl);

    let mut ds = DataStore::new(drive_ctrl, scheduler, sim);

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(exec_params.cycle_frequency_hz());

        // ---- DATA INPUT ----

        ds.drive_ctrl_input.sens = ds.sim.sens_data();
        ds.drive_ctrl_input.imu = Some(ds.sim.imu_data());
        ds.drive_ctrl_input.time_s = ds.time_s;

        // The simulation stands in for the field position system
        if ds.drive_ctrl.pose_source() == PoseSourceKind::ExternalFieldPosition {
            let pose = ds.sim.true_pose();
            if let Err(e) = ds.drive_ctrl.set_external_pose(pose) {
                warn!("Could not set the external pose: {}", e);
            }
        }

        // ---- TELECOMMAND PROCESSING ----

        match script.get_pending_tcs(ds.time_s) {
            PendingTcs::None => (),
            PendingTcs::Some(tc_vec) => {
                for tc in tc_vec.iter() {
                    tc_processor::exec(&mut ds, tc, &traj_dir);
                }
            }
            // Exit if end of script reached
            PendingTcs::EndOfScript => {
                info!("End of TC script reached, stopping");
                break;
            }
        }

        // ---- VELOCITY SOURCE PROCESSING ----

        ds.drive_ctrl_input.demand = if ds.safe {
            DriveDemand::Stop
        } else {
            let task_input = TaskInput {
                pose: ds.drive_ctrl.pose(),
                dt_s: exec_params.cycle_period_s,
                time_s: ds.time_s,
            };
            ds.scheduler.step(&task_input)
        };

        // ---- CONTROL ALGORITHM PROCESSING ----

        // DriveCtrl processing
        match ds.drive_ctrl.proc(&ds.drive_ctrl_input) {
            Ok((o, r)) => {
                ds.drive_ctrl_output = o;
                ds.drive_ctrl_status_rpt = r;

                // Motor temperature monitoring
                if r.motors_within_safe_temp {
                    ds.make_unsafe(SafeModeCause::MotorOverTemp).ok();
                } else {
                    ds.make_safe(SafeModeCause::MotorOverTemp);
                }
            }
            Err(e) => {
                // Errors here are missing feedback, which the next cycle may well have, so warn
                // and carry on with no demands.
                warn!("Error during DriveCtrl processing: {}", e)
            }
        };

        // ---- MECHANISMS ----

        if !ds.drive_ctrl_output.is_empty() {
            match ds.sim.send_demands(&ds.drive_ctrl_output) {
                MechDemsResponse::DemsOk => (),
                r => warn!("Recieved non-nominal response from SimMech: {:?}", r),
            }
        }

        ds.sim.step(exec_params.cycle_period_s);

        // ---- WRITE ARCHIVES ----

        if exec_params.archive {
            if let Err(e) = ds.drive_ctrl.write() {
                warn!("Could not write the DriveCtrl archive: {}", e);
            }
            if let Err(e) = ds.scheduler.traj_ctrl_mut().write() {
                warn!("Could not write the TrajCtrl archive: {}", e);
            }
        }

        // ---- MONITORING ----

        if ds.is_1_hz_cycle {
            let rpt = &ds.drive_ctrl_status_rpt;
            info!(
                "Pose ({:.3}, {:.3}, {:.3}), source {:?}, safe: {}",
                rpt.x_m,
                rpt.y_m,
                rpt.heading_rad,
                ds.scheduler.active(),
                ds.safe
            );
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                if !cli.fast {
                    thread::sleep(d);
                }
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                ds.num_consec_cycle_overruns += 1;

                if ds.num_consec_cycle_overruns > exec_params.max_consec_cycle_overruns {
                    ds.make_safe(SafeModeCause::CycleOverruns);
                }
            }
        }

        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    let final_state = FinalState {
        time_s: ds.time_s,
        estimated_pose: ds.drive_ctrl.pose(),
        true_pose: ds.sim.true_pose(),
        safe: ds.safe,
    };
    debug!("Final state: {:?}", final_state);

    session
        .save_json("final_state.json", &final_state)
        .wrap_err("Failed to save the final state")?;

    info!("End of execution");

    Ok(())
}
