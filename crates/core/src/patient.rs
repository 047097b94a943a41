//! Patients and their current visit.

use crate::constants::{AGE_BONUS_LIMIT, DATE_OF_BIRTH_FORMAT};
use crate::prescription::Prescription;
use crate::visit::Visit;
use crate::vitals::VitalSignsReading;
use crate::{TriageError, TriageResult};
use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use triage_types::{ExportText, HealthCardNumber};

/// A registered patient. Owns at most one open visit.
#[derive(Clone, Debug, PartialEq)]
pub struct Patient {
    name: ExportText,
    date_of_birth: NaiveDate,
    health_card: HealthCardNumber,
    age: u32,
    urgency: u8,
    current_visit: Option<Visit>,
}

/// Parses a `YYYY-MM-DD` date of birth.
pub(crate) fn parse_date_of_birth(input: &str) -> TriageResult<NaiveDate> {
    NaiveDate::parse_from_str(input, DATE_OF_BIRTH_FORMAT).map_err(|e| {
        TriageError::InvalidInput(format!(
            "date of birth {input:?} is not a YYYY-MM-DD date: {e}"
        ))
    })
}

/// Whole years between `date_of_birth` and `today`. Future dates give 0.
fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}

impl Patient {
    /// Creates a patient, computing the age relative to today's local date.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidInput`] if the name contains `~`, the date of birth
    /// is not a `YYYY-MM-DD` calendar date, or the health card is not six digits.
    pub fn create(name: &str, date_of_birth: &str, health_card: &str) -> TriageResult<Self> {
        Self::create_on(name, date_of_birth, health_card, Local::now().date_naive())
    }

    /// Creates a patient, computing the age relative to `today`.
    ///
    /// # Errors
    ///
    /// Same as [`Patient::create`].
    pub fn create_on(
        name: &str,
        date_of_birth: &str,
        health_card: &str,
        today: NaiveDate,
    ) -> TriageResult<Self> {
        let name = ExportText::new(name)?;
        let health_card = HealthCardNumber::parse(health_card)?;
        let date_of_birth = parse_date_of_birth(date_of_birth)?;

        Ok(Self {
            name,
            date_of_birth,
            health_card,
            age: age_on(date_of_birth, today),
            urgency: 0,
            current_visit: None,
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn date_of_birth(&self) -> NaiveDate {
        self.date_of_birth
    }

    /// Date of birth in `YYYY-MM-DD` form.
    pub fn date_of_birth_text(&self) -> String {
        self.date_of_birth.format(DATE_OF_BIRTH_FORMAT).to_string()
    }

    pub fn health_card(&self) -> &HealthCardNumber {
        &self.health_card
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn urgency(&self) -> u8 {
        self.urgency
    }

    pub fn current_visit(&self) -> Option<&Visit> {
        self.current_visit.as_ref()
    }

    pub fn is_admitted(&self) -> bool {
        self.current_visit.is_some()
    }

    /// Arrival time of the current visit, if any.
    pub fn arrival_time(&self) -> Option<DateTime<Utc>> {
        self.current_visit.as_ref().map(Visit::arrival_time)
    }

    /// Attaches a new open visit and recomputes urgency.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidStateTransition`] if a visit is already attached.
    pub fn admit(&mut self, visit: Visit) -> TriageResult<()> {
        if self.current_visit.is_some() {
            return Err(TriageError::InvalidStateTransition(format!(
                "patient {} already has an open visit",
                self.health_card
            )));
        }
        self.current_visit = Some(visit);
        self.recompute_urgency();
        Ok(())
    }

    fn age_bonus(&self) -> u8 {
        u8::from(self.age < AGE_BONUS_LIMIT)
    }

    /// Recomputes urgency from the latest reading of the current visit plus the age bonus.
    pub fn recompute_urgency(&mut self) {
        self.urgency = match &self.current_visit {
            None => 0,
            Some(visit) => {
                visit.latest_reading().map_or(0, VitalSignsReading::urgency_points)
                    + self.age_bonus()
            }
        };
    }

    /// Urgency of a freshly admitted visit with no readings.
    pub fn urgency_on_admission(&self) -> u8 {
        self.age_bonus()
    }

    /// Urgency the patient would have if `reading` became the latest reading.
    pub fn urgency_with(&self, reading: &VitalSignsReading) -> u8 {
        reading.urgency_points() + self.age_bonus()
    }

    /// The open visit, or an error naming `action`.
    fn open_visit_mut(&mut self, action: &str) -> TriageResult<&mut Visit> {
        let health_card = self.health_card.clone();
        match self.current_visit.as_mut() {
            Some(visit) if !visit.is_closed() => Ok(visit),
            _ => Err(TriageError::InvalidStateTransition(format!(
                "cannot {action}: patient {health_card} has no open visit"
            ))),
        }
    }

    /// The open visit.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidStateTransition`] when there is no open visit.
    pub fn open_visit(&self) -> TriageResult<&Visit> {
        match self.current_visit.as_ref() {
            Some(visit) if !visit.is_closed() => Ok(visit),
            _ => Err(TriageError::InvalidStateTransition(format!(
                "patient {} has no open visit",
                self.health_card
            ))),
        }
    }

    /// Appends a reading to the open visit and recomputes urgency.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidStateTransition`] when there is no open visit.
    pub fn record_reading(&mut self, reading: VitalSignsReading) -> TriageResult<()> {
        self.open_visit_mut("record vitals")?.add_reading(reading);
        self.recompute_urgency();
        Ok(())
    }

    /// Appends a prescription to the open visit.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidStateTransition`] when there is no open visit.
    pub fn record_prescription(&mut self, prescription: Prescription) -> TriageResult<()> {
        self.open_visit_mut("record a prescription")?
            .add_prescription(prescription);
        Ok(())
    }

    /// Marks the open visit as seen by a doctor at `time`.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidStateTransition`] when there is no open, unseen visit.
    pub fn mark_seen_by_doctor_at(&mut self, time: DateTime<Utc>) -> TriageResult<()> {
        self.open_visit_mut("refer to a physician")?
            .mark_seen_by_doctor_at(time)
    }

    /// Closes and detaches the current visit. Urgency resets to 0.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidStateTransition`] when there is no open visit.
    pub fn close_visit(&mut self) -> TriageResult<Visit> {
        self.open_visit_mut("close the case")?.close()?;
        let visit = self.current_visit.take().ok_or_else(|| {
            TriageError::InvalidStateTransition("visit detached while closing".into())
        })?;
        self.urgency = 0;
        Ok(visit)
    }
}
