//! Persistence gateway contract.
//!
//! The registry talks to durable storage only through [`PersistenceGateway`]. Every method
//! is a single blocking call that either completes or fails without a partial write.
//! Multi-row writes (`create_patient_with_visit`, `seed`) are one call each for that reason.
//! Queries return owned rows, so nothing stays borrowed from the store after a call.
//!
//! Two adapters live in [`crate::repositories`]: an in-memory one and a YAML file one.

use crate::error::GatewayResult;
use crate::visit::VisitId;
use crate::vitals::VitalSignsReading;
use chrono::{DateTime, Utc};
use triage_types::HealthCardNumber;

/// A stored patient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientRow {
    pub health_card: HealthCardNumber,
    pub name: String,
    pub date_of_birth: String,
}

/// The open visit of a patient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenVisitRow {
    pub id: VisitId,
    pub arrival_time: DateTime<Utc>,
    pub time_seen_by_doctor: Option<DateTime<Utc>>,
    pub urgency: u8,
}

/// A stored vital-signs reading.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadingRow {
    pub systolic: i32,
    pub diastolic: i32,
    pub temperature: f64,
    pub heart_rate: f64,
    pub timestamp: DateTime<Utc>,
}

/// A stored prescription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrescriptionRow {
    pub medication_name: String,
    pub instructions: String,
}

/// A user to store. The gateway keeps only a digest of `password`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRow {
    pub username: String,
    pub password: String,
    pub role: String,
}

pub trait PersistenceGateway {
    fn create_patient(
        &mut self,
        health_card: &HealthCardNumber,
        name: &str,
        date_of_birth: &str,
    ) -> GatewayResult<()>;

    /// Creates a patient and their first open, unseen visit in one call.
    ///
    /// Either both rows are stored or neither is.
    fn create_patient_with_visit(
        &mut self,
        health_card: &HealthCardNumber,
        name: &str,
        date_of_birth: &str,
        arrival_time: DateTime<Utc>,
        urgency: u8,
    ) -> GatewayResult<VisitId>;

    /// Creates an open, unseen visit and returns its identifier.
    fn create_visit(
        &mut self,
        arrival_time: DateTime<Utc>,
        health_card: &HealthCardNumber,
        urgency: u8,
    ) -> GatewayResult<VisitId>;

    /// Stores a reading and sets the visit's urgency in the same call.
    fn create_reading(
        &mut self,
        visit_id: VisitId,
        reading: &VitalSignsReading,
        urgency: u8,
    ) -> GatewayResult<()>;

    fn create_prescription(
        &mut self,
        visit_id: VisitId,
        medication_name: &str,
        instructions: &str,
    ) -> GatewayResult<()>;

    fn update_visit_seen_time(
        &mut self,
        visit_id: VisitId,
        time_seen_by_doctor: DateTime<Utc>,
    ) -> GatewayResult<()>;

    fn update_visit_closed(&mut self, visit_id: VisitId, closed: bool) -> GatewayResult<()>;

    fn fetch_all_patients(&self) -> GatewayResult<Vec<PatientRow>>;

    fn fetch_open_visit(&self, health_card: &HealthCardNumber)
        -> GatewayResult<Option<OpenVisitRow>>;

    /// Readings of a visit, oldest first.
    fn fetch_readings(&self, visit_id: VisitId) -> GatewayResult<Vec<ReadingRow>>;

    /// Prescriptions of a visit, in the order they were stored.
    fn fetch_prescriptions(&self, visit_id: VisitId) -> GatewayResult<Vec<PrescriptionRow>>;

    /// Patients with an open, unseen visit: urgency descending, then arrival ascending.
    fn fetch_by_urgency(&self) -> GatewayResult<Vec<HealthCardNumber>>;

    /// Patients with an open, seen visit, in the order they were seen.
    fn fetch_referred(&self) -> GatewayResult<Vec<HealthCardNumber>>;

    /// Preformatted summary of the patient's closed visits, or `None` if there are none.
    fn fetch_medical_record(&self, health_card: &HealthCardNumber)
        -> GatewayResult<Option<String>>;

    /// Stores a user. The password is kept only as a digest.
    fn create_user(&mut self, username: &str, password: &str, role: &str) -> GatewayResult<()>;

    /// Stores the seed patients and users of a new store in one call.
    ///
    /// Either every row is stored or none is.
    fn seed(&mut self, patients: &[PatientRow], users: &[UserRow]) -> GatewayResult<()>;

    /// The role name of the user if the credentials match.
    fn authenticate_user(&self, username: &str, password: &str) -> GatewayResult<Option<String>>;

    /// Whether the store already existed when the gateway was opened.
    fn store_existed(&self) -> bool;
}
