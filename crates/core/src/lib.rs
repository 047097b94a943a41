//! # Triage Core
//!
//! Core business logic for the emergency-room triage registry.
//!
//! This crate contains the domain model and its persistence contract:
//! - vital-signs readings with urgency scoring, and prescriptions
//! - visits with their `OpenUnseen -> OpenSeen -> Closed` lifecycle
//! - patients owning at most one open visit
//! - [`TriageRegistry`], which owns the patient directory and the two worklists and is the
//!   only mutator of all of them
//! - the [`PersistenceGateway`] trait with in-memory and YAML file adapters
//! - users, roles and role-checked access through [`Clinician`]
//!
//! **No presentation concerns**: argument parsing and output formatting belong in
//! `triage-cli`.

pub mod config;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod patient;
pub mod prescription;
mod record;
pub mod registry;
pub mod repositories;
pub mod snapshot;
pub mod users;
pub mod visit;
pub mod vitals;

pub use config::{resolve_roster_dir, CoreConfig};
pub use error::{GatewayError, GatewayResult, TriageError, TriageResult};
pub use gateway::{
    OpenVisitRow, PatientRow, PersistenceGateway, PrescriptionRow, ReadingRow, UserRow,
};
pub use patient::Patient;
pub use prescription::Prescription;
pub use registry::TriageRegistry;
pub use repositories::{FileGateway, MemoryGateway};
pub use snapshot::{PatientSummary, VisitSnapshot};
pub use users::{Clinician, Operation, Role};
pub use visit::{Visit, VisitId, VisitState};
pub use vitals::VitalSignsReading;

pub use triage_types::{ExportText, HealthCardNumber, TextError};
