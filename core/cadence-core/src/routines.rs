//! Routine definition files.

use std::path::Path;

use cadence_session_protocol::{parse_routine, Routine};

use crate::error::{CadenceError, Result};

/// Reads and validates a routine JSON file.
pub fn load_routine(path: &Path) -> Result<Routine> {
    let content = fs_err::read_to_string(path)
        .map_err(|err| CadenceError::io(format!("reading {}", path.display()), err))?;
    parse_routine(&content).map_err(|err| CadenceError::RoutineInvalid {
        path: path.to_path_buf(),
        details: err.to_string(),
    })
}
