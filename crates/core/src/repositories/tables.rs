//! Store tables shared by the gateway adapters.
//!
//! Both adapters keep the whole store in a [`StoreData`] value and run every query against
//! it. The file adapter additionally renders the tables to YAML after each write.

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{OpenVisitRow, PatientRow, PrescriptionRow, ReadingRow, UserRow};
use crate::record::{self, ReadingLine, VisitLines};
use crate::users::hash_password;
use crate::visit::VisitId;
use crate::vitals::VitalSignsReading;
use chrono::{DateTime, Utc};
use triage_types::HealthCardNumber;
use triage_wire::{
    PatientRecord, PrescriptionRecord, ReadingRecord, StoreData, UserRecord, VisitRecord,
};

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Tables {
    data: StoreData,
}

impl Tables {
    pub(crate) fn from_data(data: StoreData) -> Self {
        Self { data }
    }

    pub(crate) fn data(&self) -> &StoreData {
        &self.data
    }

    fn visit_mut(&mut self, visit_id: VisitId) -> GatewayResult<&mut VisitRecord> {
        self.data
            .visits
            .iter_mut()
            .find(|v| v.id == visit_id.get())
            .ok_or(GatewayError::UnknownVisit(visit_id.get()))
    }

    fn ensure_visit(&self, visit_id: VisitId) -> GatewayResult<()> {
        if self.data.visits.iter().any(|v| v.id == visit_id.get()) {
            Ok(())
        } else {
            Err(GatewayError::UnknownVisit(visit_id.get()))
        }
    }

    // ========================================================================
    // Writes
    // ========================================================================

    pub(crate) fn create_patient(
        &mut self,
        health_card: &HealthCardNumber,
        name: &str,
        date_of_birth: &str,
    ) -> GatewayResult<()> {
        if self
            .data
            .patients
            .iter()
            .any(|p| &p.health_card == health_card)
        {
            return Err(GatewayError::DuplicatePatient(health_card.clone()));
        }
        self.data.patients.push(PatientRecord {
            health_card: health_card.clone(),
            name: name.to_owned(),
            date_of_birth: date_of_birth.to_owned(),
        });
        Ok(())
    }

    pub(crate) fn create_visit(
        &mut self,
        arrival_time: DateTime<Utc>,
        health_card: &HealthCardNumber,
        urgency: u8,
    ) -> GatewayResult<VisitId> {
        if !self
            .data
            .patients
            .iter()
            .any(|p| &p.health_card == health_card)
        {
            return Err(GatewayError::UnknownPatient(health_card.clone()));
        }
        let id = self.data.next_visit_id;
        self.data.next_visit_id += 1;
        self.data.visits.push(VisitRecord {
            id,
            health_card: health_card.clone(),
            arrival_time,
            time_seen_by_doctor: None,
            closed: false,
            urgency,
        });
        Ok(VisitId::new(id))
    }

    pub(crate) fn create_reading(
        &mut self,
        visit_id: VisitId,
        reading: &VitalSignsReading,
        urgency: u8,
    ) -> GatewayResult<()> {
        self.visit_mut(visit_id)?.urgency = urgency;
        self.data.readings.push(ReadingRecord {
            visit_id: visit_id.get(),
            systolic: reading.systolic(),
            diastolic: reading.diastolic(),
            temperature: reading.temperature(),
            heart_rate: reading.heart_rate(),
            timestamp: reading.timestamp(),
        });
        Ok(())
    }

    pub(crate) fn create_prescription(
        &mut self,
        visit_id: VisitId,
        medication_name: &str,
        instructions: &str,
    ) -> GatewayResult<()> {
        self.ensure_visit(visit_id)?;
        self.data.prescriptions.push(PrescriptionRecord {
            visit_id: visit_id.get(),
            medication: medication_name.to_owned(),
            instructions: instructions.to_owned(),
        });
        Ok(())
    }

    pub(crate) fn update_visit_seen_time(
        &mut self,
        visit_id: VisitId,
        time_seen_by_doctor: DateTime<Utc>,
    ) -> GatewayResult<()> {
        self.visit_mut(visit_id)?.time_seen_by_doctor = Some(time_seen_by_doctor);
        Ok(())
    }

    pub(crate) fn update_visit_closed(
        &mut self,
        visit_id: VisitId,
        closed: bool,
    ) -> GatewayResult<()> {
        self.visit_mut(visit_id)?.closed = closed;
        Ok(())
    }

    pub(crate) fn create_user(
        &mut self,
        username: &str,
        password: &str,
        role: &str,
    ) -> GatewayResult<()> {
        if self.data.users.iter().any(|u| u.username == username) {
            return Err(GatewayError::DuplicateUser(username.to_owned()));
        }
        self.data.users.push(UserRecord {
            username: username.to_owned(),
            password_sha256: hash_password(password),
            role: role.to_owned(),
        });
        Ok(())
    }

    /// Adds a patient and their first visit. Adapters run this on a copy of the tables.
    pub(crate) fn create_patient_with_visit(
        &mut self,
        health_card: &HealthCardNumber,
        name: &str,
        date_of_birth: &str,
        arrival_time: DateTime<Utc>,
        urgency: u8,
    ) -> GatewayResult<VisitId> {
        self.create_patient(health_card, name, date_of_birth)?;
        self.create_visit(arrival_time, health_card, urgency)
    }

    /// Adds every seed row. Adapters run this on a copy of the tables.
    pub(crate) fn seed(&mut self, patients: &[PatientRow], users: &[UserRow]) -> GatewayResult<()> {
        for p in patients {
            self.create_patient(&p.health_card, &p.name, &p.date_of_birth)?;
        }
        for u in users {
            self.create_user(&u.username, &u.password, &u.role)?;
        }
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub(crate) fn fetch_all_patients(&self) -> Vec<PatientRow> {
        self.data
            .patients
            .iter()
            .map(|p| PatientRow {
                health_card: p.health_card.clone(),
                name: p.name.clone(),
                date_of_birth: p.date_of_birth.clone(),
            })
            .collect()
    }

    pub(crate) fn fetch_open_visit(&self, health_card: &HealthCardNumber) -> Option<OpenVisitRow> {
        self.data
            .visits
            .iter()
            .filter(|v| !v.closed && &v.health_card == health_card)
            .max_by_key(|v| v.id)
            .map(|v| OpenVisitRow {
                id: VisitId::new(v.id),
                arrival_time: v.arrival_time,
                time_seen_by_doctor: v.time_seen_by_doctor,
                urgency: v.urgency,
            })
    }

    fn readings_of(&self, visit_id: i64) -> Vec<&ReadingRecord> {
        let mut readings: Vec<&ReadingRecord> = self
            .data
            .readings
            .iter()
            .filter(|r| r.visit_id == visit_id)
            .collect();
        readings.sort_by_key(|r| r.timestamp);
        readings
    }

    pub(crate) fn fetch_readings(&self, visit_id: VisitId) -> Vec<ReadingRow> {
        self.readings_of(visit_id.get())
            .into_iter()
            .map(|r| ReadingRow {
                systolic: r.systolic,
                diastolic: r.diastolic,
                temperature: r.temperature,
                heart_rate: r.heart_rate,
                timestamp: r.timestamp,
            })
            .collect()
    }

    pub(crate) fn fetch_prescriptions(&self, visit_id: VisitId) -> Vec<PrescriptionRow> {
        self.data
            .prescriptions
            .iter()
            .filter(|p| p.visit_id == visit_id.get())
            .map(|p| PrescriptionRow {
                medication_name: p.medication.clone(),
                instructions: p.instructions.clone(),
            })
            .collect()
    }

    pub(crate) fn fetch_by_urgency(&self) -> Vec<HealthCardNumber> {
        let mut open: Vec<&VisitRecord> = self
            .data
            .visits
            .iter()
            .filter(|v| !v.closed && v.time_seen_by_doctor.is_none())
            .collect();
        open.sort_by(|a, b| {
            b.urgency
                .cmp(&a.urgency)
                .then(a.arrival_time.cmp(&b.arrival_time))
                .then(a.id.cmp(&b.id))
        });
        open.into_iter().map(|v| v.health_card.clone()).collect()
    }

    pub(crate) fn fetch_referred(&self) -> Vec<HealthCardNumber> {
        let mut seen: Vec<(DateTime<Utc>, i64, &HealthCardNumber)> = self
            .data
            .visits
            .iter()
            .filter(|v| !v.closed)
            .filter_map(|v| v.time_seen_by_doctor.map(|t| (t, v.id, &v.health_card)))
            .collect();
        seen.sort_by_key(|(t, id, _)| (*t, *id));
        seen.into_iter().map(|(_, _, hcn)| hcn.clone()).collect()
    }

    pub(crate) fn fetch_medical_record(&self, health_card: &HealthCardNumber) -> Option<String> {
        let mut closed: Vec<&VisitRecord> = self
            .data
            .visits
            .iter()
            .filter(|v| v.closed && &v.health_card == health_card)
            .collect();
        closed.sort_by(|a, b| b.arrival_time.cmp(&a.arrival_time));

        let visits: Vec<VisitLines<'_>> = closed
            .into_iter()
            .map(|v| VisitLines {
                arrival_time: v.arrival_time,
                time_seen_by_doctor: v.time_seen_by_doctor,
                readings: self
                    .readings_of(v.id)
                    .into_iter()
                    .rev()
                    .map(|r| ReadingLine {
                        systolic: r.systolic,
                        diastolic: r.diastolic,
                        temperature: r.temperature,
                        heart_rate: r.heart_rate,
                        timestamp: r.timestamp,
                    })
                    .collect(),
                prescriptions: self
                    .data
                    .prescriptions
                    .iter()
                    .filter(|p| p.visit_id == v.id)
                    .map(|p| (p.medication.as_str(), p.instructions.as_str()))
                    .collect(),
            })
            .collect();

        record::medical_record(&visits)
    }

    pub(crate) fn authenticate_user(&self, username: &str, password: &str) -> Option<String> {
        let digest = hash_password(password);
        self.data
            .users
            .iter()
            .find(|u| u.username == username && u.password_sha256 == digest)
            .map(|u| u.role.clone())
    }
}
