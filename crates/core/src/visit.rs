//! ER visits and their lifecycle.
//!
//! A visit moves through `OpenUnseen -> OpenSeen -> Closed`, or straight from
//! `OpenUnseen` to `Closed`. `Closed` is terminal. Readings and prescriptions are only
//! ever appended, so their order is the order they were recorded in.

use crate::prescription::Prescription;
use crate::record::{self, Layout, ReadingLine, VisitLines};
use crate::vitals::VitalSignsReading;
use crate::{TriageError, TriageResult};
use chrono::{DateTime, Utc};

/// Identifier assigned to a visit by the persistence gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VisitId(i64);

impl VisitId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for VisitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a visit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisitState {
    OpenUnseen,
    OpenSeen,
    Closed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Visit {
    id: Option<VisitId>,
    arrival_time: DateTime<Utc>,
    time_seen_by_doctor: Option<DateTime<Utc>>,
    closed: bool,
    readings: Vec<VitalSignsReading>,
    prescriptions: Vec<Prescription>,
}

impl Visit {
    /// Opens a new visit arriving now.
    pub fn open() -> Self {
        Self::open_at(Utc::now())
    }

    /// Opens a new visit with an explicit arrival time.
    pub fn open_at(arrival_time: DateTime<Utc>) -> Self {
        Self {
            id: None,
            arrival_time,
            time_seen_by_doctor: None,
            closed: false,
            readings: Vec::new(),
            prescriptions: Vec::new(),
        }
    }

    /// Rehydrates an open visit from stored values.
    pub fn restore(
        id: VisitId,
        arrival_time: DateTime<Utc>,
        time_seen_by_doctor: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Some(id),
            time_seen_by_doctor,
            ..Self::open_at(arrival_time)
        }
    }

    /// Attaches the gateway-assigned identifier.
    pub fn assign_id(&mut self, id: VisitId) {
        self.id = Some(id);
    }

    pub fn id(&self) -> Option<VisitId> {
        self.id
    }

    pub fn arrival_time(&self) -> DateTime<Utc> {
        self.arrival_time
    }

    pub fn time_seen_by_doctor(&self) -> Option<DateTime<Utc>> {
        self.time_seen_by_doctor
    }

    pub fn is_seen_by_doctor(&self) -> bool {
        self.time_seen_by_doctor.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn state(&self) -> VisitState {
        match (self.closed, self.is_seen_by_doctor()) {
            (true, _) => VisitState::Closed,
            (false, true) => VisitState::OpenSeen,
            (false, false) => VisitState::OpenUnseen,
        }
    }

    pub fn add_reading(&mut self, reading: VitalSignsReading) {
        self.readings.push(reading);
    }

    pub fn add_prescription(&mut self, prescription: Prescription) {
        self.prescriptions.push(prescription);
    }

    /// The most recently appended reading, if any.
    pub fn latest_reading(&self) -> Option<&VitalSignsReading> {
        self.readings.last()
    }

    pub fn readings(&self) -> &[VitalSignsReading] {
        &self.readings
    }

    pub fn prescriptions(&self) -> &[Prescription] {
        &self.prescriptions
    }

    /// Marks the visit as seen by a doctor now.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidStateTransition`] unless the visit is open and unseen.
    pub fn mark_seen_by_doctor(&mut self) -> TriageResult<DateTime<Utc>> {
        let now = Utc::now();
        self.mark_seen_by_doctor_at(now)?;
        Ok(now)
    }

    /// Marks the visit as seen by a doctor at `time`.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidStateTransition`] unless the visit is open and unseen.
    pub fn mark_seen_by_doctor_at(&mut self, time: DateTime<Utc>) -> TriageResult<()> {
        self.ensure_state(VisitState::OpenUnseen, "mark as seen by doctor")?;
        self.time_seen_by_doctor = Some(time);
        Ok(())
    }

    /// Closes the visit.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidStateTransition`] if the visit is already closed.
    pub fn close(&mut self) -> TriageResult<()> {
        if self.closed {
            return Err(TriageError::InvalidStateTransition(
                "visit is already closed".into(),
            ));
        }
        self.closed = true;
        Ok(())
    }

    fn ensure_state(&self, expected: VisitState, action: &str) -> TriageResult<()> {
        let actual = self.state();
        if actual != expected {
            return Err(TriageError::InvalidStateTransition(format!(
                "cannot {action}: visit is {actual:?}"
            )));
        }
        Ok(())
    }

    /// Renders the visit for display: arrival, seen-by-doctor, readings in recorded
    /// order, then prescriptions.
    pub fn display_text(&self) -> String {
        let lines = VisitLines {
            arrival_time: self.arrival_time,
            time_seen_by_doctor: self.time_seen_by_doctor,
            readings: self
                .readings
                .iter()
                .map(|r| ReadingLine {
                    systolic: r.systolic(),
                    diastolic: r.diastolic(),
                    temperature: r.temperature(),
                    heart_rate: r.heart_rate(),
                    timestamp: r.timestamp(),
                })
                .collect(),
            prescriptions: self
                .prescriptions
                .iter()
                .map(|p| (p.medication_name(), p.instructions()))
                .collect(),
        };
        record::visit_block(&lines, Layout::Display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reading(temperature: f64) -> VitalSignsReading {
        VitalSignsReading::create(120, 80, temperature, 70.0).expect("valid reading")
    }

    #[test]
    fn new_visit_is_open_and_unseen() {
        let visit = Visit::open();
        assert_eq!(visit.state(), VisitState::OpenUnseen);
        assert_eq!(visit.id(), None);
        assert!(visit.latest_reading().is_none());
        assert!(visit.prescriptions().is_empty());
    }

    #[test]
    fn restore_derives_seen_state() {
        let arrival = Utc::now() - Duration::hours(1);
        let unseen = Visit::restore(VisitId::new(4), arrival, None);
        assert_eq!(unseen.state(), VisitState::OpenUnseen);
        assert_eq!(unseen.id(), Some(VisitId::new(4)));

        let seen = Visit::restore(VisitId::new(5), arrival, Some(Utc::now()));
        assert_eq!(seen.state(), VisitState::OpenSeen);
        assert_eq!(seen.arrival_time(), arrival);
    }

    #[test]
    fn latest_reading_is_last_appended() {
        let mut visit = Visit::open();
        visit.add_reading(reading(37.0));
        visit.add_reading(reading(39.5));
        assert_eq!(visit.readings().len(), 2);
        assert_eq!(visit.latest_reading().map(|r| r.temperature()), Some(39.5));
    }

    #[test]
    fn lifecycle_transitions() {
        let mut visit = Visit::open();
        let seen_at = visit.mark_seen_by_doctor().expect("first referral");
        assert_eq!(visit.time_seen_by_doctor(), Some(seen_at));
        assert_eq!(visit.state(), VisitState::OpenSeen);

        let err = visit.mark_seen_by_doctor().expect_err("second referral");
        assert!(matches!(err, TriageError::InvalidStateTransition(_)));

        visit.close().expect("close seen visit");
        assert_eq!(visit.state(), VisitState::Closed);

        let err = visit.close().expect_err("re-close");
        assert!(matches!(err, TriageError::InvalidStateTransition(_)));
        let err = visit.mark_seen_by_doctor().expect_err("refer closed");
        assert!(matches!(err, TriageError::InvalidStateTransition(_)));
    }

    #[test]
    fn unseen_visit_can_close_directly() {
        let mut visit = Visit::open();
        visit.close().expect("close unseen visit");
        assert_eq!(visit.state(), VisitState::Closed);
        assert!(!visit.is_seen_by_doctor());
    }

    #[test]
    fn display_text_lists_readings_then_prescriptions() {
        let mut visit = Visit::open();
        visit.add_reading(reading(37.0));
        visit.add_reading(reading(39.5));
        visit.add_prescription(Prescription::create("Ibuprofen", "400mg").expect("valid"));

        let text = visit.display_text();
        let first = text.find("Temperature: 37.0").expect("first reading");
        let second = text.find("Temperature: 39.5").expect("second reading");
        let prescription = text.find("Name: Ibuprofen").expect("prescription");
        assert!(first < second && second < prescription);
        assert!(text.starts_with("+++++++++++++++++++++ \n Record \n"));
    }
}
