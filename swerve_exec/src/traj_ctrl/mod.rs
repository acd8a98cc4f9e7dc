//! # Trajectory control module
//!
//! Trajectory control follows a pre-generated trajectory by sampling it at the time since the
//! trajectory was started and driving the robot towards that sample. The output is a set of module
//! states which DriveCtrl dispatches directly, bypassing its own teleop shaping.
//!
//! Completion is judged against the trajectory's final pose only, so tracking can finish early
//! if the robot is already there, or never finish if the tolerances can't be met. Bounding the
//! duration is left to the caller.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod controllers;
mod params;
mod state;
mod trajectory;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use controllers::*;
pub use params::*;
pub use state::*;
pub use trajectory::*;
