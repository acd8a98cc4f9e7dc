//! # Swerve library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to access items defined
//! inside the swerve crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Generic controllers - PID, trapezoid profile and profiled PID
pub mod controllers;

/// Data store - the data shared between modules within one cycle of the executable
pub mod data_store;

/// Drive control module - converts chassis demands into individual module demands
pub mod drive_ctrl;

/// Kinematics - converts between chassis velocity and module states
pub mod kinematics;

/// Localisation module - provides the robot with an idea of where it is on the field
pub mod loc;

/// Module control - optimises and actuates the demand of a single swerve module
pub mod module_ctrl;

/// Executable parameters
pub mod params;

/// Simulated mechanisms - stands in for the drivetrain hardware
pub mod sim_mech;

/// Tasks and the scheduler which picks which one commands the drivetrain
pub mod task;

/// Trajectory control module - keeps the robot on the given trajectory
pub mod traj_ctrl;
