use triage_types::{HealthCardNumber, TextError};

/// Errors raised by a persistence gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("failed to read store file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write store file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to create data directory: {0}")]
    DataDirCreation(std::io::Error),
    #[error("store document error: {0}")]
    Wire(#[from] triage_wire::WireError),
    #[error("visit {0} does not exist")]
    UnknownVisit(i64),
    #[error("patient {0} does not exist")]
    UnknownPatient(HealthCardNumber),
    #[error("patient {0} is already stored")]
    DuplicatePatient(HealthCardNumber),
    #[error("user {0:?} is already stored")]
    DuplicateUser(String),
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("health card {0} is already registered")]
    DuplicateHealthCard(HealthCardNumber),
    #[error("no patient with health card {0}")]
    PatientNotFound(HealthCardNumber),
    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),
    #[error("persistence failure: {0}")]
    Persistence(#[from] GatewayError),
    #[error("{role} is not permitted to {operation}")]
    PermissionDenied {
        role: crate::users::Role,
        operation: crate::users::Operation,
    },
    #[error("failed to read roster {path}: {source}", path = path.display())]
    RosterRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("roster error: {0}")]
    Roster(triage_wire::WireError),
}

impl From<TextError> for TriageError {
    fn from(err: TextError) -> Self {
        TriageError::InvalidInput(err.to_string())
    }
}

pub type TriageResult<T> = std::result::Result<T, TriageError>;
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
