//! Constants used throughout the triage core crate.

/// Default directory for the store when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "triage_data";

/// Filename of the YAML store document inside the data directory.
pub const STORE_FILENAME: &str = "triage.yaml";

/// Filename used while a new store document is being written.
pub const STORE_TMP_FILENAME: &str = "triage.yaml.tmp";

/// Directory searched for seed rosters when no override is configured.
pub const ROSTER_DIR: &str = "rosters";

/// Filename of the patient seed roster.
pub const PATIENT_ROSTER_FILENAME: &str = "patient_records.txt";

/// Filename of the user seed roster.
pub const USER_ROSTER_FILENAME: &str = "passwords.txt";

/// Text returned when a patient has no closed visits.
pub const NO_MEDICAL_RECORD: &str = "No medical record on file.";

/// Date format for dates of birth.
pub const DATE_OF_BIRTH_FORMAT: &str = "%Y-%m-%d";

/// Patients younger than this (in whole years) receive the age bonus.
pub const AGE_BONUS_LIMIT: u32 = 2;

// Plausibility ceilings for vital-sign readings.
pub const MAX_SYSTOLIC: i32 = 500;
pub const MAX_DIASTOLIC: i32 = 500;
pub const MAX_TEMPERATURE: f64 = 100.0;
pub const MAX_HEART_RATE: f64 = 350.0;

// Urgency scoring thresholds.
pub const FEVER_TEMPERATURE: f64 = 39.0;
pub const HIGH_SYSTOLIC: i32 = 140;
pub const HIGH_DIASTOLIC: i32 = 90;
pub const HIGH_HEART_RATE: f64 = 100.0;
pub const LOW_HEART_RATE: f64 = 50.0;
