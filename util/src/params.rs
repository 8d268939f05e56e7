//! # Parameter Files
//!
//! Parameters are TOML files kept in `$TL_SW_ROOT/params` and deserialised straight into the
//! struct of the module that uses them.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{fs, path::Path};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::host;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable (TL_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the parmeter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file from the params directory, `file_name` being relative to it.
pub fn load<P: DeserializeOwned>(file_name: &str) -> Result<P, LoadError> {
    let path = host::get_sw_root()
        .map_err(|_| LoadError::SwRootNotSet)?
        .join("params")
        .join(file_name);

    load_from_path(path)
}

/// Load a parameter file from anywhere.
pub fn load_from_path<P, F>(path: F) -> Result<P, LoadError>
where
    P: DeserializeOwned,
    F: AsRef<Path>,
{
    let contents = fs::read_to_string(path).map_err(LoadError::FileLoadError)?;

    from_str(&contents)
}

/// Parse parameters held in a string.
pub fn from_str<P: DeserializeOwned>(contents: &str) -> Result<P, LoadError> {
    toml::from_str(contents).map_err(LoadError::DeserialiseError)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
