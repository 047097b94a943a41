//! Vital-signs readings and urgency scoring.

use crate::constants::{
    FEVER_TEMPERATURE, HIGH_DIASTOLIC, HIGH_HEART_RATE, HIGH_SYSTOLIC, LOW_HEART_RATE,
    MAX_DIASTOLIC, MAX_HEART_RATE, MAX_SYSTOLIC, MAX_TEMPERATURE,
};
use crate::{TriageError, TriageResult};
use chrono::{DateTime, Utc};

/// One set of vital signs taken during a visit.
///
/// Readings are immutable. The urgency points are derived from the measurements at
/// construction and never stored separately.
#[derive(Clone, Debug, PartialEq)]
pub struct VitalSignsReading {
    systolic: i32,
    diastolic: i32,
    temperature: f64,
    heart_rate: f64,
    timestamp: DateTime<Utc>,
    urgency_points: u8,
}

impl VitalSignsReading {
    /// Creates a reading stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidInput`] if any measurement is above its plausibility
    /// ceiling or is not a finite number.
    pub fn create(
        systolic: i32,
        diastolic: i32,
        temperature: f64,
        heart_rate: f64,
    ) -> TriageResult<Self> {
        Self::create_at(systolic, diastolic, temperature, heart_rate, Utc::now())
    }

    /// Creates a reading stamped with an explicit time.
    ///
    /// # Errors
    ///
    /// Same as [`VitalSignsReading::create`].
    pub fn create_at(
        systolic: i32,
        diastolic: i32,
        temperature: f64,
        heart_rate: f64,
        timestamp: DateTime<Utc>,
    ) -> TriageResult<Self> {
        if systolic > MAX_SYSTOLIC {
            return Err(TriageError::InvalidInput(format!(
                "systolic {systolic} exceeds {MAX_SYSTOLIC}"
            )));
        }
        if diastolic > MAX_DIASTOLIC {
            return Err(TriageError::InvalidInput(format!(
                "diastolic {diastolic} exceeds {MAX_DIASTOLIC}"
            )));
        }
        if !temperature.is_finite() || temperature > MAX_TEMPERATURE {
            return Err(TriageError::InvalidInput(format!(
                "temperature {temperature} exceeds {MAX_TEMPERATURE}"
            )));
        }
        if !heart_rate.is_finite() || heart_rate > MAX_HEART_RATE {
            return Err(TriageError::InvalidInput(format!(
                "heart rate {heart_rate} exceeds {MAX_HEART_RATE}"
            )));
        }

        Ok(Self::reconstruct(
            systolic,
            diastolic,
            temperature,
            heart_rate,
            timestamp,
        ))
    }

    /// Rebuilds a reading from stored values without validating them.
    pub fn reconstruct(
        systolic: i32,
        diastolic: i32,
        temperature: f64,
        heart_rate: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            systolic,
            diastolic,
            temperature,
            heart_rate,
            timestamp,
            urgency_points: urgency_points(systolic, diastolic, temperature, heart_rate),
        }
    }

    pub fn systolic(&self) -> i32 {
        self.systolic
    }

    pub fn diastolic(&self) -> i32 {
        self.diastolic
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn heart_rate(&self) -> f64 {
        self.heart_rate
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Urgency points in `0..=3`.
    pub fn urgency_points(&self) -> u8 {
        self.urgency_points
    }
}

/// Scores a set of measurements. Each check contributes at most one point.
fn urgency_points(systolic: i32, diastolic: i32, temperature: f64, heart_rate: f64) -> u8 {
    let fever = temperature >= FEVER_TEMPERATURE;
    let blood_pressure = systolic >= HIGH_SYSTOLIC || diastolic >= HIGH_DIASTOLIC;
    let heart = heart_rate >= HIGH_HEART_RATE || heart_rate <= LOW_HEART_RATE;

    u8::from(fever) + u8::from(blood_pressure) + u8::from(heart)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(systolic: i32, diastolic: i32, temperature: f64, heart_rate: f64) -> u8 {
        VitalSignsReading::create(systolic, diastolic, temperature, heart_rate)
            .expect("valid reading")
            .urgency_points()
    }

    #[test]
    fn fever_threshold_is_inclusive() {
        assert_eq!(points(120, 80, 39.0, 70.0), 1);
        assert_eq!(points(120, 80, 38.9, 70.0), 0);
    }

    #[test]
    fn blood_pressure_scores_once() {
        assert_eq!(points(140, 80, 37.0, 70.0), 1);
        assert_eq!(points(120, 90, 37.0, 70.0), 1);
        assert_eq!(points(180, 120, 37.0, 70.0), 1);
        assert_eq!(points(139, 89, 37.0, 70.0), 0);
    }

    #[test]
    fn heart_rate_scores_high_and_low() {
        assert_eq!(points(120, 80, 37.0, 100.0), 1);
        assert_eq!(points(120, 80, 37.0, 50.0), 1);
        assert_eq!(points(120, 80, 37.0, 50.5), 0);
        assert_eq!(points(120, 80, 37.0, 99.9), 0);
    }

    #[test]
    fn points_are_capped_at_three() {
        assert_eq!(points(200, 100, 40.0, 150.0), 3);
        assert_eq!(points(150, 80, 39.5, 60.0), 2);
    }

    #[test]
    fn rejects_values_above_ceilings() {
        for (s, d, t, h) in [
            (501, 80, 37.0, 70.0),
            (120, 501, 37.0, 70.0),
            (120, 80, 100.1, 70.0),
            (120, 80, 37.0, 350.5),
            (120, 80, f64::NAN, 70.0),
            (120, 80, 37.0, f64::INFINITY),
        ] {
            let err = VitalSignsReading::create(s, d, t, h).expect_err("should reject");
            assert!(matches!(err, TriageError::InvalidInput(_)));
        }
    }

    #[test]
    fn accepts_values_at_ceilings() {
        assert!(VitalSignsReading::create(500, 500, 100.0, 350.0).is_ok());
    }

    #[test]
    fn reconstruct_skips_validation_but_scores() {
        let ts = Utc::now();
        let reading = VitalSignsReading::reconstruct(600, 80, 39.2, 70.0, ts);
        assert_eq!(reading.systolic(), 600);
        assert_eq!(reading.timestamp(), ts);
        assert_eq!(reading.urgency_points(), 2);
    }
}
