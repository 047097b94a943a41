//! YAML file persistence gateway.
//!
//! The whole store lives in `triage.yaml` inside the configured data directory. Each write
//! is applied to a copy of the tables, rendered, written to `triage.yaml.tmp` and renamed
//! over the store file. The in-memory tables are replaced only after the rename succeeds,
//! so a failed write leaves both the file and the gateway unchanged.
//!
//! Opening a missing store does not create the file. It is first written by the seed, so
//! a seed that fails leaves no store behind and the next start seeds again.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   triage.yaml        # store document (see triage_wire::Store)
//!   triage.yaml.tmp    # only present while a write is in flight
//! ```

use crate::config::CoreConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{
    OpenVisitRow, PatientRow, PersistenceGateway, PrescriptionRow, ReadingRow, UserRow,
};
use crate::repositories::tables::Tables;
use crate::visit::VisitId;
use crate::vitals::VitalSignsReading;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;
use triage_types::HealthCardNumber;
use triage_wire::{Store, StoreData};

#[derive(Debug)]
pub struct FileGateway {
    store_path: PathBuf,
    tmp_path: PathBuf,
    tables: Tables,
    existed: bool,
}

impl FileGateway {
    /// Opens the store in the configured data directory.
    ///
    /// A missing store opens empty and reports that it did not exist. The directory is
    /// created; the store file is not.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if:
    /// - the data directory cannot be created,
    /// - an existing store file cannot be read or does not parse.
    pub fn open(cfg: &CoreConfig) -> GatewayResult<Self> {
        fs::create_dir_all(cfg.data_dir()).map_err(GatewayError::DataDirCreation)?;

        let store_path = cfg.store_path();
        let mut gateway = Self {
            store_path,
            tmp_path: cfg.store_tmp_path(),
            tables: Tables::default(),
            existed: false,
        };

        if gateway.store_path.is_file() {
            let text = fs::read_to_string(&gateway.store_path).map_err(GatewayError::FileRead)?;
            gateway.tables = Tables::from_data(Store::parse(&text)?);
            gateway.existed = true;
            tracing::info!("opened store {}", gateway.store_path.display());
        } else {
            tracing::info!(
                "no store at {}; it will be written on first change",
                gateway.store_path.display()
            );
        }

        Ok(gateway)
    }

    fn persist(&self, data: &StoreData) -> GatewayResult<()> {
        let yaml = Store::render(data)?;
        fs::write(&self.tmp_path, yaml).map_err(GatewayError::FileWrite)?;
        fs::rename(&self.tmp_path, &self.store_path).map_err(|e| {
            let _ = fs::remove_file(&self.tmp_path);
            GatewayError::FileWrite(e)
        })
    }

    /// Applies `change` to a copy of the tables, writes it out, then keeps it.
    fn write_with<T>(
        &mut self,
        change: impl FnOnce(&mut Tables) -> GatewayResult<T>,
    ) -> GatewayResult<T> {
        let mut next = self.tables.clone();
        let out = change(&mut next)?;
        self.persist(next.data())?;
        self.tables = next;
        tracing::debug!("wrote store {}", self.store_path.display());
        Ok(out)
    }
}

impl PersistenceGateway for FileGateway {
    fn create_patient(
        &mut self,
        health_card: &HealthCardNumber,
        name: &str,
        date_of_birth: &str,
    ) -> GatewayResult<()> {
        self.write_with(|t| t.create_patient(health_card, name, date_of_birth))
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
        self.write_with(|t| t.create_visit(arrival_time, health_card, urgency))
    }

    fn create_reading(
        &mut self,
        visit_id: VisitId,
        reading: &VitalSignsReading,
        urgency: u8,
    ) -> GatewayResult<()> {
        self.write_with(|t| t.create_reading(visit_id, reading, urgency))
    }

    fn create_prescription(
        &mut self,
        visit_id: VisitId,
        medication_name: &str,
        instructions: &str,
    ) -> GatewayResult<()> {
        self.write_with(|t| t.create_prescription(visit_id, medication_name, instructions))
    }

    fn update_visit_seen_time(
        &mut self,
        visit_id: VisitId,
        time_seen_by_doctor: DateTime<Utc>,
    ) -> GatewayResult<()> {
        self.write_with(|t| t.update_visit_seen_time(visit_id, time_seen_by_doctor))
    }

    fn update_visit_closed(&mut self, visit_id: VisitId, closed: bool) -> GatewayResult<()> {
        self.write_with(|t| t.update_visit_closed(visit_id, closed))
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
        self.write_with(|t| t.create_user(username, password, role))
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
