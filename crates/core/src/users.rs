//! Users, roles and role-checked access to the registry.
//!
//! A [`Clinician`] is obtained from [`TriageRegistry::authenticate`] and forwards each call
//! to the registry after checking that its [`Role`] permits the [`Operation`].

use crate::gateway::PersistenceGateway;
use crate::patient::Patient;
use crate::prescription::Prescription;
use crate::registry::TriageRegistry;
use crate::snapshot::{PatientSummary, VisitSnapshot};
use crate::visit::VisitId;
use crate::vitals::VitalSignsReading;
use crate::{TriageError, TriageResult};
use sha2::{Digest, Sha256};
use triage_types::HealthCardNumber;

/// Lowercase hex SHA-256 digest of a password.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Nurse,
    Physician,
}

/// Registry operations subject to a permission check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    AdmitPatient,
    SignIn,
    RecordVitals,
    RecordPrescription,
    ReferToPhysician,
    CloseCase,
    LookUp,
    ViewWorklists,
    ViewMedicalRecord,
}

impl Role {
    /// Name stored alongside users in the gateway.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Nurse => "nurse",
            Role::Physician => "physician",
        }
    }

    pub fn permits(self, operation: Operation) -> bool {
        use Operation::*;
        match self {
            Role::Nurse => !matches!(operation, RecordPrescription),
            Role::Physician => matches!(
                operation,
                RecordPrescription | CloseCase | LookUp | ViewWorklists | ViewMedicalRecord
            ),
        }
    }

    /// # Errors
    ///
    /// Returns [`TriageError::PermissionDenied`] if the role does not permit `operation`.
    pub fn require(self, operation: Operation) -> TriageResult<()> {
        if self.permits(operation) {
            Ok(())
        } else {
            Err(TriageError::PermissionDenied {
                role: self,
                operation,
            })
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nurse" => Ok(Role::Nurse),
            "physician" => Ok(Role::Physician),
            other => Err(TriageError::InvalidInput(format!("unknown role {other:?}"))),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Operation::AdmitPatient => "admit a patient",
            Operation::SignIn => "sign in a patient",
            Operation::RecordVitals => "record vital signs",
            Operation::RecordPrescription => "record a prescription",
            Operation::ReferToPhysician => "refer a patient to a physician",
            Operation::CloseCase => "close a case",
            Operation::LookUp => "look up a patient",
            Operation::ViewWorklists => "view the worklists",
            Operation::ViewMedicalRecord => "view a medical record",
        };
        f.write_str(text)
    }
}

/// An authenticated user acting on the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clinician {
    username: String,
    role: Role,
}

impl Clinician {
    pub(crate) fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn admit_patient<G: PersistenceGateway>(
        &self,
        registry: &mut TriageRegistry<G>,
        name: &str,
        date_of_birth: &str,
        health_card: &str,
    ) -> TriageResult<VisitId> {
        self.role.require(Operation::AdmitPatient)?;
        registry.add_patient(name, date_of_birth, health_card)
    }

    pub fn sign_in_patient<G: PersistenceGateway>(
        &self,
        registry: &mut TriageRegistry<G>,
        health_card: &HealthCardNumber,
    ) -> TriageResult<VisitId> {
        self.role.require(Operation::SignIn)?;
        registry.sign_in_patient(health_card)
    }

    pub fn add_vitals<G: PersistenceGateway>(
        &self,
        registry: &mut TriageRegistry<G>,
        health_card: &HealthCardNumber,
        reading: VitalSignsReading,
    ) -> TriageResult<u8> {
        self.role.require(Operation::RecordVitals)?;
        registry.add_vitals(health_card, reading)
    }

    pub fn add_prescription<G: PersistenceGateway>(
        &self,
        registry: &mut TriageRegistry<G>,
        health_card: &HealthCardNumber,
        prescription: Prescription,
    ) -> TriageResult<()> {
        self.role.require(Operation::RecordPrescription)?;
        registry.add_prescription(health_card, prescription)
    }

    pub fn refer_to_physician<G: PersistenceGateway>(
        &self,
        registry: &mut TriageRegistry<G>,
        health_card: &HealthCardNumber,
    ) -> TriageResult<()> {
        self.role.require(Operation::ReferToPhysician)?;
        registry.refer_to_physician(health_card)
    }

    pub fn close_case<G: PersistenceGateway>(
        &self,
        registry: &mut TriageRegistry<G>,
        health_card: &HealthCardNumber,
    ) -> TriageResult<()> {
        self.role.require(Operation::CloseCase)?;
        registry.close_case(health_card)
    }

    pub fn look_up<'r, G: PersistenceGateway>(
        &self,
        registry: &'r TriageRegistry<G>,
        health_card: &HealthCardNumber,
    ) -> TriageResult<Option<&'r Patient>> {
        self.role.require(Operation::LookUp)?;
        Ok(registry.look_up(health_card))
    }

    pub fn patient_summary<G: PersistenceGateway>(
        &self,
        registry: &TriageRegistry<G>,
        health_card: &HealthCardNumber,
    ) -> TriageResult<Option<PatientSummary>> {
        self.role.require(Operation::LookUp)?;
        Ok(registry.patient_summary(health_card))
    }

    pub fn visit_snapshot<G: PersistenceGateway>(
        &self,
        registry: &TriageRegistry<G>,
        health_card: &HealthCardNumber,
    ) -> TriageResult<Option<VisitSnapshot>> {
        self.role.require(Operation::LookUp)?;
        Ok(registry.visit_snapshot(health_card))
    }

    /// Summaries of the urgency worklist followed by the referred worklist.
    pub fn worklists<G: PersistenceGateway>(
        &self,
        registry: &TriageRegistry<G>,
    ) -> TriageResult<(Vec<PatientSummary>, Vec<PatientSummary>)> {
        self.role.require(Operation::ViewWorklists)?;
        let summarise = |cards: &[HealthCardNumber]| -> Vec<PatientSummary> {
            cards
                .iter()
                .filter_map(|hcn| registry.patient_summary(hcn))
                .collect()
        };
        Ok((
            summarise(registry.urgency_worklist()),
            summarise(registry.referred_worklist()),
        ))
    }

    pub fn medical_record_text<G: PersistenceGateway>(
        &self,
        registry: &TriageRegistry<G>,
        health_card: &HealthCardNumber,
    ) -> TriageResult<String> {
        self.role.require(Operation::ViewMedicalRecord)?;
        registry.medical_record_text(health_card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_digest_is_hex_sha256() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn role_names_round_trip() {
        for role in [Role::Nurse, Role::Physician] {
            assert_eq!(role.as_str().parse::<Role>().expect("known role"), role);
        }
        assert!(matches!(
            "admin".parse::<Role>(),
            Err(TriageError::InvalidInput(_))
        ));
    }

    #[test]
    fn nurse_permissions() {
        let nurse = Role::Nurse;
        for op in [
            Operation::AdmitPatient,
            Operation::SignIn,
            Operation::RecordVitals,
            Operation::ReferToPhysician,
            Operation::CloseCase,
            Operation::LookUp,
            Operation::ViewWorklists,
            Operation::ViewMedicalRecord,
        ] {
            assert!(nurse.permits(op), "{op}");
        }
        assert!(!nurse.permits(Operation::RecordPrescription));
    }

    #[test]
    fn physician_permissions() {
        let physician = Role::Physician;
        assert!(physician.permits(Operation::RecordPrescription));
        assert!(physician.permits(Operation::CloseCase));
        for op in [
            Operation::AdmitPatient,
            Operation::SignIn,
            Operation::RecordVitals,
            Operation::ReferToPhysician,
        ] {
            assert!(!physician.permits(op), "{op}");
        }

        let err = physician
            .require(Operation::RecordVitals)
            .expect_err("physician cannot record vitals");
        assert_eq!(
            err.to_string(),
            "physician is not permitted to record vital signs"
        );
    }
}
