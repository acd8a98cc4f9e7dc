//! Host platform utility functions

use std::path::PathBuf;

/// Name of the environment variable holding the path to the software root.
///
/// The root contains the `params`, `scripts`, `trajectories` and `sessions` directories.
pub const SW_ROOT_ENV_VAR: &str = "SWERVE_SW_ROOT";

/// Get the path to the software root from the environment.
pub fn get_swerve_sw_root() -> Result<PathBuf, std::env::VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
