//! In-process persistence gateway.
//!
//! Keeps the store tables in memory for the lifetime of the value. Writes never fail
//! except on integrity violations (unknown visit, duplicate key). Useful for tests and
//! for running the registry without a data directory.

use crate::error::GatewayResult;
use crate::gateway::{
    OpenVisitRow, PatientRow, PersistenceGateway, PrescriptionRow, ReadingRow, UserRow,
};
use crate::repositories::tables::Tables;
use crate::visit::VisitId;
use crate::vitals::VitalSignsReading;
use chrono::{DateTime, Utc};
use triage_types::HealthCardNumber;

#[derive(Clone, Debug, Default)]
pub struct MemoryGateway {
    tables: Tables,
    existed: bool,
}

impl MemoryGateway {
    /// An empty store that reports it did not exist, so the registry seeds it.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of this gateway's tables reported as an existing store.
    ///
    /// Models reopening the same store in a later process.
    pub fn reopen(&self) -> Self {
        Self {
            tables: self.tables.clone(),
            existed: true,
        }
    }

    /// Applies `change` to a copy of the tables and keeps it only on success.
    fn write_with<T>(
        &mut self,
        change: impl FnOnce(&mut Tables) -> GatewayResult<T>,
    ) -> GatewayResult<T> {
        let mut next = self.tables.clone();
        let out = change(&mut next)?;
        self.tables = next;
        Ok(out)
    }
}

impl PersistenceGateway for MemoryGateway {
    fn create_patient(
        &mut self,
        health_card: &HealthCardNumber,
        name: &str,
        date_of_birth: &str,
    ) -> GatewayResult<()> {
        self.tables.create_patient(health_card, name, date_of_birth)
    }

    fn create_patient_with_visit(
        &mut self,
        health_card: &HealthCardNumber,
        name: &str,
        date_of_birth: &str,
        arrival_time: DateTime<Utc>,
        urgency: u8,
    ) -> GatewayResult<VisitId> {
        self.write_with(|t| {
            t.create_patient_with_visit(health_card, name, date_of_birth, arrival_time, urgency)
        })
    }

    fn create_visit(
        &mut self,
        arrival_time: DateTime<Utc>,
        health_card: &HealthCardNumber,
        urgency: u8,
    ) -> GatewayResult<VisitId> {
        self.tables.create_visit(arrival_time, health_card, urgency)
    }

    fn create_reading(
        &mut self,
        visit_id: VisitId,
        reading: &VitalSignsReading,
        urgency: u8,
    ) -> GatewayResult<()> {
        self.tables.create_reading(visit_id, reading, urgency)
    }

    fn create_prescription(
        &mut self,
        visit_id: VisitId,
        medication_name: &str,
        instructions: &str,
    ) -> GatewayResult<()> {
        self.tables
            .create_prescription(visit_id, medication_name, instructions)
    }

    fn update_visit_seen_time(
        &mut self,
        visit_id: VisitId,
        time_seen_by_doctor: DateTime<Utc>,
    ) -> GatewayResult<()> {
        self.tables
            .update_visit_seen_time(visit_id, time_seen_by_doctor)
    }

    fn update_visit_closed(&mut self, visit_id: VisitId, closed: bool) -> GatewayResult<()> {
        self.tables.update_visit_closed(visit_id, closed)
    }

    fn fetch_all_patients(&self) -> GatewayResult<Vec<PatientRow>> {
        Ok(self.tables.fetch_all_patients())
    }

    fn fetch_open_visit(
        &self,
        health_card: &HealthCardNumber,
    ) -> GatewayResult<Option<OpenVisitRow>> {
        Ok(self.tables.fetch_open_visit(health_card))
    }

    fn fetch_readings(&self, visit_id: VisitId) -> GatewayResult<Vec<ReadingRow>> {
        Ok(self.tables.fetch_readings(visit_id))
    }

    fn fetch_prescriptions(&self, visit_id: VisitId) -> GatewayResult<Vec<PrescriptionRow>> {
        Ok(self.tables.fetch_prescriptions(visit_id))
    }

    fn fetch_by_urgency(&self) -> GatewayResult<Vec<HealthCardNumber>> {
        Ok(self.tables.fetch_by_urgency())
    }

    fn fetch_referred(&self) -> GatewayResult<Vec<HealthCardNumber>> {
        Ok(self.tables.fetch_referred())
    }

    fn fetch_medical_record(
        &self,
        health_card: &HealthCardNumber,
    ) -> GatewayResult<Option<String>> {
        Ok(self.tables.fetch_medical_record(health_card))
    }

    fn create_user(&mut self, username: &str, password: &str, role: &str) -> GatewayResult<()> {
        self.tables.create_user(username, password, role)
    }

    fn seed(&mut self, patients: &[PatientRow], users: &[UserRow]) -> GatewayResult<()> {
        self.write_with(|t| t.seed(patients, users))
    }

    fn authenticate_user(&self, username: &str, password: &str) -> GatewayResult<Option<String>> {
        Ok(self.tables.authenticate_user(username, password))
    }

    fn store_existed(&self) -> bool {
        self.existed
    }
}
