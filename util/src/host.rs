//! Host platform (linux for example) utility functions

use std::path::PathBuf;

use uname;

/// Environment variable pointing at the root of the software directory
pub const SW_ROOT_ENV_VAR: &str = "TL_SW_ROOT";

/// Retrieve uname information.
pub fn get_uname() -> std::io::Result<uname::Info> {
    uname::uname()
}

/// Get the root of the software directory, which contains the `params` and `sessions`
/// directories.
pub fn get_sw_root() -> Result<PathBuf, std::env::VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
