//! Value copies of registry state for callers outside the core.
//!
//! Snapshots own their data, so holding one never borrows the registry.

use crate::patient::Patient;
use crate::prescription::Prescription;
use crate::visit::{Visit, VisitState};
use crate::vitals::VitalSignsReading;
use chrono::{DateTime, NaiveDate, Utc};
use triage_types::HealthCardNumber;

#[derive(Clone, Debug, PartialEq)]
pub struct PatientSummary {
    pub health_card: HealthCardNumber,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub age: u32,
    pub urgency: u8,
    pub arrival_time: Option<DateTime<Utc>>,
    /// `None` when the patient has no open visit.
    pub visit_state: Option<VisitState>,
}

impl From<&Patient> for PatientSummary {
    fn from(patient: &Patient) -> Self {
        Self {
            health_card: patient.health_card().clone(),
            name: patient.name().to_owned(),
            date_of_birth: patient.date_of_birth(),
            age: patient.age(),
            urgency: patient.urgency(),
            arrival_time: patient.arrival_time(),
            visit_state: patient.current_visit().map(Visit::state),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisitSnapshot {
    pub id: Option<i64>,
    pub arrival_time: DateTime<Utc>,
    pub time_seen_by_doctor: Option<DateTime<Utc>>,
    pub state: VisitState,
    pub readings: Vec<VitalSignsReading>,
    pub prescriptions: Vec<Prescription>,
    /// The visit rendered with [`Visit::display_text`].
    pub display_text: String,
}

impl From<&Visit> for VisitSnapshot {
    fn from(visit: &Visit) -> Self {
        Self {
            id: visit.id().map(|id| id.get()),
            arrival_time: visit.arrival_time(),
            time_seen_by_doctor: visit.time_seen_by_doctor(),
            state: visit.state(),
            readings: visit.readings().to_vec(),
            prescriptions: visit.prescriptions().to_vec(),
            display_text: visit.display_text(),
        }
    }
}
