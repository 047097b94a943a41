//! The triage registry: patient directory, worklists and every state transition.
//!
//! [`TriageRegistry`] is the only mutator of patients, visits and worklists. Each operation
//! validates first, then makes the gateway call, and only touches in-memory state once that
//! call has succeeded. A failed gateway call therefore leaves the registry exactly as it was.
//!
//! ## Worklists
//!
//! - urgency worklist: patients with an open visit not yet seen by a doctor, ordered by
//!   urgency descending, then arrival ascending, then visit id ascending. The order is taken
//!   from the gateway and then settled on the in-memory urgency, which is recomputed from
//!   today's age and can differ from the stored column after a birthday.
//! - referred worklist: patients with an open visit seen by a doctor, in referral order
//!
//! A patient is in at most one worklist, and in one iff they have an open visit.

use crate::config::CoreConfig;
use crate::gateway::{PatientRow, PersistenceGateway, UserRow};
use crate::patient::Patient;
use crate::prescription::Prescription;
use crate::record::medical_record_or_sentinel;
use crate::snapshot::{PatientSummary, VisitSnapshot};
use crate::users::{Clinician, Role};
use crate::visit::{Visit, VisitId, VisitState};
use crate::vitals::VitalSignsReading;
use crate::{TriageError, TriageResult};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use triage_types::HealthCardNumber;
use triage_wire::{PatientRosterRow, Roster, UserRosterRow};

/// Sort key of the urgency worklist.
type UrgencyKey = (Reverse<u8>, DateTime<Utc>, VisitId);

#[derive(Debug)]
pub struct TriageRegistry<G: PersistenceGateway> {
    gateway: G,
    patients: BTreeMap<HealthCardNumber, Patient>,
    urgency_worklist: Vec<HealthCardNumber>,
    referred_worklist: Vec<HealthCardNumber>,
}

impl<G: PersistenceGateway> TriageRegistry<G> {
    /// An empty registry over `gateway`. Nothing is loaded.
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            patients: BTreeMap::new(),
            urgency_worklist: Vec::new(),
            referred_worklist: Vec::new(),
        }
    }

    /// Builds the registry for a process start.
    ///
    /// If the store already existed the registry is reloaded from it; otherwise the store is
    /// seeded from the rosters in `cfg`. A failed seed stores nothing, so the next start
    /// seeds again.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError`] if reading or applying the rosters fails, or if the gateway
    /// fails during reload.
    pub fn start(gateway: G, cfg: &CoreConfig) -> TriageResult<Self> {
        let mut registry = Self::new(gateway);
        if registry.gateway.store_existed() {
            tracing::info!("store exists; reloading registry");
            registry.reload()?;
        } else {
            tracing::info!(
                "new store; seeding from rosters in {}",
                cfg.roster_dir().display()
            );
            let patients = Roster::parse_patients(&read_roster(&cfg.patient_roster_path())?)
                .map_err(TriageError::Roster)?;
            let users = Roster::parse_users(&read_roster(&cfg.user_roster_path())?)
                .map_err(TriageError::Roster)?;
            registry.bootstrap(&patients, &users)?;
        }
        Ok(registry)
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    // ========================================================================
    // Startup
    // ========================================================================

    /// Seeds a fresh store with roster patients and users.
    ///
    /// Roster patients are registered but not admitted. Every row is validated before the
    /// gateway is called, and the rows are stored in a single gateway call, so a failed
    /// seed leaves both the store and the registry untouched.
    ///
    /// # Errors
    ///
    /// - [`TriageError::InvalidInput`] for a malformed patient field or unknown role
    /// - [`TriageError::DuplicateHealthCard`] if a health card repeats
    /// - [`TriageError::Persistence`] if the gateway fails
    pub fn bootstrap(
        &mut self,
        patients: &[PatientRosterRow],
        users: &[UserRosterRow],
    ) -> TriageResult<()> {
        let mut seeded = BTreeMap::new();
        for row in patients {
            let patient = Patient::create(&row.name, &row.date_of_birth, &row.health_card)
                .map_err(|e| roster_line_error(row.line, e))?;
            let health_card = patient.health_card().clone();
            if self.patients.contains_key(&health_card) || seeded.contains_key(&health_card) {
                return Err(TriageError::DuplicateHealthCard(health_card));
            }
            seeded.insert(health_card, patient);
        }

        let mut user_rows = Vec::with_capacity(users.len());
        for row in users {
            let role: Role = row
                .role
                .parse()
                .map_err(|e| roster_line_error(row.line, e))?;
            user_rows.push(UserRow {
                username: row.username.clone(),
                password: row.password.clone(),
                role: role.as_str().to_owned(),
            });
        }

        let patient_rows: Vec<PatientRow> = seeded
            .values()
            .map(|p| PatientRow {
                health_card: p.health_card().clone(),
                name: p.name().to_owned(),
                date_of_birth: p.date_of_birth_text(),
            })
            .collect();
        self.gateway.seed(&patient_rows, &user_rows)?;
        self.patients.extend(seeded);

        tracing::info!(
            "seeded {} patients and {} users",
            patients.len(),
            users.len()
        );
        Ok(())
    }

    /// Rebuilds the directory and worklists from the gateway.
    ///
    /// Rows that no longer validate are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Persistence`] if any gateway query fails. The registry may be
    /// partially loaded in that case.
    pub fn reload(&mut self) -> TriageResult<()> {
        self.patients.clear();
        self.urgency_worklist.clear();
        self.referred_worklist.clear();

        let mut patients = BTreeMap::new();
        for row in self.gateway.fetch_all_patients()? {
            let mut patient = match Patient::create(
                &row.name,
                &row.date_of_birth,
                row.health_card.as_str(),
            ) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!("skipping stored patient {}: {e}", row.health_card);
                    continue;
                }
            };

            if let Some(open) = self.gateway.fetch_open_visit(&row.health_card)? {
                let mut visit =
                    Visit::restore(open.id, open.arrival_time, open.time_seen_by_doctor);
                for r in self.gateway.fetch_readings(open.id)? {
                    visit.add_reading(VitalSignsReading::reconstruct(
                        r.systolic,
                        r.diastolic,
                        r.temperature,
                        r.heart_rate,
                        r.timestamp,
                    ));
                }
                for p in self.gateway.fetch_prescriptions(open.id)? {
                    visit.add_prescription(Prescription::restore(
                        p.medication_name,
                        p.instructions,
                    ));
                }
                patient.admit(visit)?;
            }

            if patients.insert(row.health_card.clone(), patient).is_some() {
                tracing::warn!(
                    "stored patient {} appears twice; keeping the last row",
                    row.health_card
                );
            }
        }
        self.patients = patients;

        let urgency = self.gateway.fetch_by_urgency()?;
        let referred = self.gateway.fetch_referred()?;
        self.urgency_worklist = self.by_urgency(self.known(urgency, VisitState::OpenUnseen));
        self.referred_worklist = self.known(referred, VisitState::OpenSeen);

        tracing::info!(
            "reloaded {} patients ({} waiting, {} referred)",
            self.patients.len(),
            self.urgency_worklist.len(),
            self.referred_worklist.len()
        );
        Ok(())
    }

    /// Keeps the health cards whose patient is registered with a visit in `state`.
    fn known(&self, cards: Vec<HealthCardNumber>, state: VisitState) -> Vec<HealthCardNumber> {
        cards
            .into_iter()
            .filter(|hcn| {
                let ok = self
                    .patients
                    .get(hcn)
                    .and_then(Patient::current_visit)
                    .is_some_and(|v| v.state() == state);
                if !ok {
                    tracing::warn!("skipping worklist entry {hcn}: no matching {state:?} visit");
                }
                ok
            })
            .collect()
    }

    /// Stable sort on the in-memory urgency key.
    fn by_urgency(&self, mut cards: Vec<HealthCardNumber>) -> Vec<HealthCardNumber> {
        cards.sort_by_cached_key(|hcn| self.urgency_key(hcn));
        cards
    }

    fn reload_urgency_worklist(&mut self) -> TriageResult<()> {
        let urgency = self.gateway.fetch_by_urgency()?;
        self.urgency_worklist = self.by_urgency(self.known(urgency, VisitState::OpenUnseen));
        Ok(())
    }

    // ========================================================================
    // Admission
    // ========================================================================

    /// Registers a new patient and signs them in.
    ///
    /// The patient and their visit are stored in one gateway call. On any error the patient
    /// is neither stored nor registered, so the call can be retried.
    ///
    /// # Errors
    ///
    /// - [`TriageError::InvalidInput`] if any field is malformed
    /// - [`TriageError::DuplicateHealthCard`] if the health card is already registered
    /// - [`TriageError::Persistence`] if the gateway fails
    pub fn add_patient(
        &mut self,
        name: &str,
        date_of_birth: &str,
        health_card: &str,
    ) -> TriageResult<VisitId> {
        let mut patient = Patient::create(name, date_of_birth, health_card)?;
        let health_card = patient.health_card().clone();
        if self.patients.contains_key(&health_card) {
            return Err(TriageError::DuplicateHealthCard(health_card));
        }

        let mut visit = Visit::open();
        let id = self.gateway.create_patient_with_visit(
            &health_card,
            patient.name(),
            &patient.date_of_birth_text(),
            visit.arrival_time(),
            patient.urgency_on_admission(),
        )?;
        visit.assign_id(id);
        patient.admit(visit)?;

        self.patients.insert(health_card.clone(), patient);
        self.insert_by_urgency(health_card.clone());
        tracing::info!("registered and signed in patient {health_card} (visit {id})");
        Ok(id)
    }

    /// Opens a visit for a registered patient and places them on the urgency worklist.
    ///
    /// # Errors
    ///
    /// - [`TriageError::PatientNotFound`] if the health card is not registered
    /// - [`TriageError::InvalidStateTransition`] if the patient already has a visit
    /// - [`TriageError::Persistence`] if the gateway fails
    pub fn sign_in_patient(&mut self, health_card: &HealthCardNumber) -> TriageResult<VisitId> {
        let patient = self.patient(health_card)?;
        if patient.is_admitted() {
            return Err(TriageError::InvalidStateTransition(format!(
                "patient {health_card} is already signed in"
            )));
        }
        let urgency = patient.urgency_on_admission();

        let mut visit = Visit::open();
        let id = self
            .gateway
            .create_visit(visit.arrival_time(), health_card, urgency)?;
        visit.assign_id(id);

        self.patient_mut(health_card)?.admit(visit)?;
        self.insert_by_urgency(health_card.clone());
        tracing::info!("signed in patient {health_card} (visit {id})");
        Ok(id)
    }

    fn urgency_key(&self, health_card: &HealthCardNumber) -> Option<UrgencyKey> {
        let patient = self.patients.get(health_card)?;
        let visit = patient.current_visit()?;
        Some((Reverse(patient.urgency()), visit.arrival_time(), visit.id()?))
    }

    fn insert_by_urgency(&mut self, health_card: HealthCardNumber) {
        let key = self.urgency_key(&health_card);
        let at = self
            .urgency_worklist
            .partition_point(|other| self.urgency_key(other) <= key);
        self.urgency_worklist.insert(at, health_card);
    }

    // ========================================================================
    // Clinical actions
    // ========================================================================

    fn patient(&self, health_card: &HealthCardNumber) -> TriageResult<&Patient> {
        self.patients
            .get(health_card)
            .ok_or_else(|| TriageError::PatientNotFound(health_card.clone()))
    }

    fn patient_mut(&mut self, health_card: &HealthCardNumber) -> TriageResult<&mut Patient> {
        self.patients
            .get_mut(health_card)
            .ok_or_else(|| TriageError::PatientNotFound(health_card.clone()))
    }

    /// Identifier of the patient's open visit.
    fn open_visit_id(&self, health_card: &HealthCardNumber) -> TriageResult<VisitId> {
        self.patient(health_card)?.open_visit()?.id().ok_or_else(|| {
            TriageError::InvalidStateTransition(format!(
                "visit of patient {health_card} has not been stored"
            ))
        })
    }

    /// Records a reading on the open visit and re-derives the urgency worklist.
    ///
    /// Returns the patient's new urgency. Once the reading is stored the call succeeds; if
    /// the worklist cannot be re-read from the gateway it is reordered in memory instead.
    ///
    /// # Errors
    ///
    /// - [`TriageError::PatientNotFound`] if the health card is not registered
    /// - [`TriageError::InvalidStateTransition`] if there is no open visit
    /// - [`TriageError::Persistence`] if the reading cannot be stored
    pub fn add_vitals(
        &mut self,
        health_card: &HealthCardNumber,
        reading: VitalSignsReading,
    ) -> TriageResult<u8> {
        let visit_id = self.open_visit_id(health_card)?;
        let urgency = self.patient(health_card)?.urgency_with(&reading);

        self.gateway.create_reading(visit_id, &reading, urgency)?;
        self.patient_mut(health_card)?.record_reading(reading)?;
        tracing::info!("recorded vitals for {health_card}; urgency {urgency}");

        if let Err(e) = self.reload_urgency_worklist() {
            tracing::warn!("could not re-read urgency worklist ({e}); reordering in memory");
            let waiting = std::mem::take(&mut self.urgency_worklist);
            self.urgency_worklist = self.by_urgency(waiting);
        }
        Ok(urgency)
    }

    /// Records a prescription on the open visit.
    ///
    /// # Errors
    ///
    /// Same as [`TriageRegistry::add_vitals`].
    pub fn add_prescription(
        &mut self,
        health_card: &HealthCardNumber,
        prescription: Prescription,
    ) -> TriageResult<()> {
        let visit_id = self.open_visit_id(health_card)?;
        self.gateway.create_prescription(
            visit_id,
            prescription.medication_name(),
            prescription.instructions(),
        )?;
        self.patient_mut(health_card)?
            .record_prescription(prescription)?;
        tracing::info!("recorded prescription for {health_card}");
        Ok(())
    }

    /// Marks the open visit as seen and moves the patient to the end of the referred worklist.
    ///
    /// # Errors
    ///
    /// - [`TriageError::PatientNotFound`] if the health card is not registered
    /// - [`TriageError::InvalidStateTransition`] unless the visit is open and unseen
    /// - [`TriageError::Persistence`] if the gateway fails
    pub fn refer_to_physician(&mut self, health_card: &HealthCardNumber) -> TriageResult<()> {
        let visit_id = self.open_visit_id(health_card)?;
        let state = self.patient(health_card)?.open_visit()?.state();
        if state != VisitState::OpenUnseen {
            return Err(TriageError::InvalidStateTransition(format!(
                "patient {health_card} has already been referred"
            )));
        }

        let seen_at = Utc::now();
        self.gateway.update_visit_seen_time(visit_id, seen_at)?;
        self.patient_mut(health_card)?
            .mark_seen_by_doctor_at(seen_at)?;

        self.urgency_worklist.retain(|hcn| hcn != health_card);
        self.referred_worklist.push(health_card.clone());
        tracing::info!("referred patient {health_card} to a physician");
        Ok(())
    }

    /// Closes the open visit and removes the patient from both worklists.
    ///
    /// # Errors
    ///
    /// - [`TriageError::PatientNotFound`] if the health card is not registered
    /// - [`TriageError::InvalidStateTransition`] if there is no open visit
    /// - [`TriageError::Persistence`] if the gateway fails
    pub fn close_case(&mut self, health_card: &HealthCardNumber) -> TriageResult<()> {
        let visit_id = self.open_visit_id(health_card)?;
        self.gateway.update_visit_closed(visit_id, true)?;
        self.patient_mut(health_card)?.close_visit()?;

        self.urgency_worklist.retain(|hcn| hcn != health_card);
        self.referred_worklist.retain(|hcn| hcn != health_card);
        tracing::info!("closed case of patient {health_card}");
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn look_up(&self, health_card: &HealthCardNumber) -> Option<&Patient> {
        self.patients.get(health_card)
    }

    pub fn patients(&self) -> impl Iterator<Item = &Patient> {
        self.patients.values()
    }

    pub fn urgency_worklist(&self) -> &[HealthCardNumber] {
        &self.urgency_worklist
    }

    pub fn referred_worklist(&self) -> &[HealthCardNumber] {
        &self.referred_worklist
    }

    pub fn patient_summary(&self, health_card: &HealthCardNumber) -> Option<PatientSummary> {
        self.patients.get(health_card).map(PatientSummary::from)
    }

    /// Snapshot of the patient's current visit, if any.
    pub fn visit_snapshot(&self, health_card: &HealthCardNumber) -> Option<VisitSnapshot> {
        self.patients
            .get(health_card)?
            .current_visit()
            .map(VisitSnapshot::from)
    }

    /// All closed visits of the patient, or `No medical record on file.`.
    ///
    /// # Errors
    ///
    /// - [`TriageError::PatientNotFound`] if the health card is not registered
    /// - [`TriageError::Persistence`] if the gateway fails
    pub fn medical_record_text(&self, health_card: &HealthCardNumber) -> TriageResult<String> {
        self.patient(health_card)?;
        let text = self.gateway.fetch_medical_record(health_card)?;
        Ok(medical_record_or_sentinel(text))
    }

    /// Checks credentials and returns the matching clinician.
    ///
    /// A stored role name that is not recognised is treated as a failed login.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Persistence`] if the gateway fails.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> TriageResult<Option<Clinician>> {
        let Some(role_name) = self.gateway.authenticate_user(username, password)? else {
            return Ok(None);
        };
        match role_name.parse::<Role>() {
            Ok(role) => Ok(Some(Clinician::new(username, role))),
            Err(e) => {
                tracing::warn!("user {username:?} has an unusable role: {e}");
                Ok(None)
            }
        }
    }
}

fn read_roster(path: &std::path::Path) -> TriageResult<String> {
    std::fs::read_to_string(path).map_err(|source| TriageError::RosterRead {
        path: path.to_path_buf(),
        source,
    })
}

fn roster_line_error(line: usize, err: TriageError) -> TriageError {
    match err {
        TriageError::InvalidInput(msg) => {
            TriageError::InvalidInput(format!("roster line {line}: {msg}"))
        }
        other => other,
    }
}
