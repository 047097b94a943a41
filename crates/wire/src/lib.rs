//! Wire/boundary support for the triage store.
//!
//! This crate provides **wire models** and **format/translation helpers** for the two
//! on-disk formats the system reads and writes:
//! - the YAML store document holding patients, visits, readings, prescriptions and users
//! - the line-oriented seed rosters used on first start
//!
//! This crate focuses on:
//! - strict serialisation/deserialisation (unknown keys are rejected)
//! - translation between domain-level records and wire structs
//!
//! It holds no business rules; urgency, lifecycle and ordering live in `triage-core`.

pub mod roster;
pub mod store;

// Re-export facades
pub use roster::Roster;
pub use store::Store;

// Re-export public domain-level types
pub use roster::{PatientRosterRow, UserRosterRow};
pub use store::{
    PatientRecord, PrescriptionRecord, ReadingRecord, StoreData, UserRecord, VisitRecord,
    STORE_FORMAT_VERSION,
};

/// Errors returned by the `triage-wire` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("roster line {line}: {reason}")]
    Roster { line: usize, reason: String },
}

/// Type alias for Results that can fail with a [`WireError`].
pub type WireResult<T> = Result<T, WireError>;
