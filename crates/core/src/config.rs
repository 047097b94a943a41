//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Environment variables are read only by the binary; everything in
//! here takes explicit values so tests can point the registry at temporary directories.

use crate::constants::{
    PATIENT_ROSTER_FILENAME, ROSTER_DIR, STORE_FILENAME, STORE_TMP_FILENAME, USER_ROSTER_FILENAME,
};
use crate::{TriageError, TriageResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    roster_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidInput`] if `data_dir` is empty.
    pub fn new(data_dir: PathBuf, roster_dir: PathBuf) -> TriageResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(TriageError::InvalidInput("data_dir cannot be empty".into()));
        }

        Ok(Self {
            data_dir,
            roster_dir,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILENAME)
    }

    pub fn store_tmp_path(&self) -> PathBuf {
        self.data_dir.join(STORE_TMP_FILENAME)
    }

    pub fn roster_dir(&self) -> &Path {
        &self.roster_dir
    }

    pub fn patient_roster_path(&self) -> PathBuf {
        self.roster_dir.join(PATIENT_ROSTER_FILENAME)
    }

    pub fn user_roster_path(&self) -> PathBuf {
        self.roster_dir.join(USER_ROSTER_FILENAME)
    }
}

fn looks_like_roster_dir(path: &Path) -> bool {
    path.is_dir()
        && path.join(PATIENT_ROSTER_FILENAME).is_file()
        && path.join(USER_ROSTER_FILENAME).is_file()
}

/// Resolve the seed roster directory without reading environment variables.
///
/// If `override_dir` is provided, it must be a directory holding both roster files.
/// Otherwise this searches for `rosters/` relative to the current working directory and
/// then walks up from `CARGO_MANIFEST_DIR`.
pub fn resolve_roster_dir(override_dir: Option<PathBuf>) -> TriageResult<PathBuf> {
    if let Some(roster_dir) = override_dir {
        if looks_like_roster_dir(&roster_dir) {
            return Ok(roster_dir);
        }
        return Err(TriageError::InvalidInput(format!(
            "TRIAGE_ROSTER_DIR override is not a valid roster directory (must contain {PATIENT_ROSTER_FILENAME} and {USER_ROSTER_FILENAME})"
        )));
    }

    let cwd_relative = PathBuf::from(ROSTER_DIR);
    if looks_like_roster_dir(&cwd_relative) {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join(ROSTER_DIR);
        if looks_like_roster_dir(&candidate) {
            return Ok(candidate);
        }
    }

    Err(TriageError::InvalidInput(format!(
        "could not locate {ROSTER_DIR}/ directory with {PATIENT_ROSTER_FILENAME} and {USER_ROSTER_FILENAME}"
    )))
}
