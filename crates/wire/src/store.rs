//! Store document wire models and translation helpers.
//!
//! The file-backed gateway keeps every table in a single YAML document. This module
//! defines the domain-level records handed to the gateway and the strict wire model
//! written to disk.
//!
//! Notes:
//! - The document is rewritten as a whole on every gateway write
//! - Timestamps are stored as RFC 3339 strings
//! - Row order inside each table is meaningful (insertion order)

use crate::{WireError, WireResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use triage_types::HealthCardNumber;

/// Version written to and required from the `version` key of the document.
pub const STORE_FORMAT_VERSION: u32 = 1;

// ============================================================================
// Public domain-level types
// ============================================================================

/// A registered patient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientRecord {
    pub health_card: HealthCardNumber,
    pub name: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date_of_birth: String,
}

/// One ER visit. At most one visit per patient is open (`closed == false`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisitRecord {
    pub id: i64,
    pub health_card: HealthCardNumber,
    pub arrival_time: DateTime<Utc>,
    pub time_seen_by_doctor: Option<DateTime<Utc>>,
    pub closed: bool,
    pub urgency: u8,
}

/// A vital-signs reading recorded during a visit.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadingRecord {
    pub visit_id: i64,
    pub systolic: i32,
    pub diastolic: i32,
    pub temperature: f64,
    pub heart_rate: f64,
    pub timestamp: DateTime<Utc>,
}

/// A prescription recorded during a visit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrescriptionRecord {
    pub visit_id: i64,
    pub medication: String,
    pub instructions: String,
}

/// A user allowed to operate the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    /// Lowercase hex SHA-256 digest of the password.
    pub password_sha256: String,
    /// Role name, `nurse` or `physician`.
    pub role: String,
}

/// Every table of the store.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreData {
    /// Identifier the next created visit will receive.
    pub next_visit_id: i64,
    pub patients: Vec<PatientRecord>,
    pub visits: Vec<VisitRecord>,
    pub readings: Vec<ReadingRecord>,
    pub prescriptions: Vec<PrescriptionRecord>,
    pub users: Vec<UserRecord>,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            next_visit_id: 1,
            patients: Vec::new(),
            visits: Vec::new(),
            readings: Vec::new(),
            prescriptions: Vec::new(),
            users: Vec::new(),
        }
    }
}

// ============================================================================
// Public Store operations
// ============================================================================

/// Store document operations.
///
/// Zero-sized type used for namespacing; all methods are associated functions.
pub struct Store;

impl Store {
    /// Parse a store document from YAML text.
    ///
    /// Uses `serde_path_to_error` to report the path of the failing field (for example
    /// `visits.2.arrivalTime`) when the YAML does not match the wire schema.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] if:
    /// - the YAML does not match the wire schema or contains unknown keys,
    /// - the document version is not [`STORE_FORMAT_VERSION`],
    /// - a health card number or timestamp is malformed.
    pub fn parse(yaml_text: &str) -> WireResult<StoreData> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let wire = match serde_path_to_error::deserialize::<_, StoreWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(WireError::Translation(format!(
                    "store schema mismatch at {path}: {source}"
                )));
            }
        };

        if wire.version != STORE_FORMAT_VERSION {
            return Err(WireError::InvalidInput(format!(
                "unsupported store version {} (expected {STORE_FORMAT_VERSION})",
                wire.version
            )));
        }

        wire_to_domain(wire)
    }

    /// Render a store document as YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] if serialisation fails.
    pub fn render(data: &StoreData) -> WireResult<String> {
        let wire = domain_to_wire(data);
        Ok(serde_yaml::to_string(&wire)?)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct StoreWire {
    version: u32,

    #[serde(rename = "nextVisitId")]
    next_visit_id: i64,

    #[serde(default)]
    patients: Vec<PatientWire>,

    #[serde(default)]
    visits: Vec<VisitWire>,

    #[serde(default)]
    readings: Vec<ReadingWire>,

    #[serde(default)]
    prescriptions: Vec<PrescriptionWire>,

    #[serde(default)]
    users: Vec<UserWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct PatientWire {
    #[serde(rename = "healthCard")]
    health_card: HealthCardNumber,
    name: String,
    #[serde(rename = "dateOfBirth")]
    date_of_birth: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct VisitWire {
    id: i64,
    #[serde(rename = "healthCard")]
    health_card: HealthCardNumber,
    #[serde(rename = "arrivalTime")]
    arrival_time: String,
    #[serde(rename = "timeSeenByDoctor", skip_serializing_if = "Option::is_none")]
    time_seen_by_doctor: Option<String>,
    #[serde(default)]
    closed: bool,
    #[serde(default)]
    urgency: u8,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct ReadingWire {
    #[serde(rename = "visitId")]
    visit_id: i64,
    systolic: i32,
    diastolic: i32,
    temperature: f64,
    #[serde(rename = "heartRate")]
    heart_rate: f64,
    timestamp: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct PrescriptionWire {
    #[serde(rename = "visitId")]
    visit_id: i64,
    medication: String,
    instructions: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct UserWire {
    username: String,
    #[serde(rename = "passwordSha256")]
    password_sha256: String,
    role: String,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn parse_timestamp(field: &str, value: &str) -> WireResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| WireError::Translation(format!("invalid {field} {value:?}: {e}")))
}

fn wire_to_domain(wire: StoreWire) -> WireResult<StoreData> {
    let patients = wire
        .patients
        .into_iter()
        .map(|p| PatientRecord {
            health_card: p.health_card,
            name: p.name,
            date_of_birth: p.date_of_birth,
        })
        .collect();

    let visits = wire
        .visits
        .into_iter()
        .map(|v| {
            Ok(VisitRecord {
                id: v.id,
                health_card: v.health_card,
                arrival_time: parse_timestamp("arrivalTime", &v.arrival_time)?,
                time_seen_by_doctor: v
                    .time_seen_by_doctor
                    .as_deref()
                    .map(|t| parse_timestamp("timeSeenByDoctor", t))
                    .transpose()?,
                closed: v.closed,
                urgency: v.urgency,
            })
        })
        .collect::<WireResult<Vec<_>>>()?;

    let readings = wire
        .readings
        .into_iter()
        .map(|r| {
            Ok(ReadingRecord {
                visit_id: r.visit_id,
                systolic: r.systolic,
                diastolic: r.diastolic,
                temperature: r.temperature,
                heart_rate: r.heart_rate,
                timestamp: parse_timestamp("timestamp", &r.timestamp)?,
            })
        })
        .collect::<WireResult<Vec<_>>>()?;

    let prescriptions = wire
        .prescriptions
        .into_iter()
        .map(|p| PrescriptionRecord {
            visit_id: p.visit_id,
            medication: p.medication,
            instructions: p.instructions,
        })
        .collect();

    let users = wire
        .users
        .into_iter()
        .map(|u| UserRecord {
            username: u.username,
            password_sha256: u.password_sha256,
            role: u.role,
        })
        .collect();

    Ok(StoreData {
        next_visit_id: wire.next_visit_id,
        patients,
        visits,
        readings,
        prescriptions,
        users,
    })
}

fn domain_to_wire(data: &StoreData) -> StoreWire {
    StoreWire {
        version: STORE_FORMAT_VERSION,
        next_visit_id: data.next_visit_id,
        patients: data
            .patients
            .iter()
            .map(|p| PatientWire {
                health_card: p.health_card.clone(),
                name: p.name.clone(),
                date_of_birth: p.date_of_birth.clone(),
            })
            .collect(),
        visits: data
            .visits
            .iter()
            .map(|v| VisitWire {
                id: v.id,
                health_card: v.health_card.clone(),
                arrival_time: v.arrival_time.to_rfc3339(),
                time_seen_by_doctor: v.time_seen_by_doctor.map(|t| t.to_rfc3339()),
                closed: v.closed,
                urgency: v.urgency,
            })
            .collect(),
        readings: data
            .readings
            .iter()
            .map(|r| ReadingWire {
                visit_id: r.visit_id,
                systolic: r.systolic,
                diastolic: r.diastolic,
                temperature: r.temperature,
                heart_rate: r.heart_rate,
                timestamp: r.timestamp.to_rfc3339(),
            })
            .collect(),
        prescriptions: data
            .prescriptions
            .iter()
            .map(|p| PrescriptionWire {
                visit_id: p.visit_id,
                medication: p.medication.clone(),
                instructions: p.instructions.clone(),
            })
            .collect(),
        users: data
            .users
            .iter()
            .map(|u| UserWire {
                username: u.username.clone(),
                password_sha256: u.password_sha256.clone(),
                role: u.role.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hcn(s: &str) -> HealthCardNumber {
        HealthCardNumber::parse(s).expect("valid health card")
    }

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse::<DateTime<Utc>>().expect("valid datetime")
    }

    #[test]
    fn parses_sample_document() {
        let input = r#"version: 1
nextVisitId: 3
patients:
  - healthCard: "123456"
    name: Jane Doe
    dateOfBirth: "1990-05-01"
visits:
  - id: 1
    healthCard: "123456"
    arrivalTime: 2026-01-23T13:58:04.099304Z
    timeSeenByDoctor: 2026-01-23T14:10:00Z
    closed: true
    urgency: 2
  - id: 2
    healthCard: "123456"
    arrivalTime: 2026-02-01T09:00:00Z
readings:
  - visitId: 1
    systolic: 150
    diastolic: 80
    temperature: 39.5
    heartRate: 60.0
    timestamp: 2026-01-23T14:00:00Z
prescriptions:
  - visitId: 1
    medication: Ibuprofen
    instructions: 400mg every 6 hours
users:
  - username: nurse1
    passwordSha256: abc123
    role: nurse
"#;

        let data = Store::parse(input).expect("parse store");
        assert_eq!(data.next_visit_id, 3);
        assert_eq!(data.patients.len(), 1);
        assert_eq!(data.patients[0].health_card, hcn("123456"));
        assert_eq!(data.visits.len(), 2);
        assert!(data.visits[0].closed);
        assert_eq!(
            data.visits[0].time_seen_by_doctor,
            Some(ts("2026-01-23T14:10:00Z"))
        );
        assert!(!data.visits[1].closed);
        assert_eq!(data.visits[1].urgency, 0);
        assert_eq!(data.visits[1].time_seen_by_doctor, None);
        assert_eq!(data.readings[0].temperature, 39.5);
        assert_eq!(data.prescriptions[0].medication, "Ibuprofen");
        assert_eq!(data.users[0].role, "nurse");
    }

    #[test]
    fn render_then_parse_preserves_tables() {
        let data = StoreData {
            next_visit_id: 2,
            patients: vec![PatientRecord {
                health_card: hcn("654321"),
                name: "John Smith".into(),
                date_of_birth: "2025-12-01".into(),
            }],
            visits: vec![VisitRecord {
                id: 1,
                health_card: hcn("654321"),
                arrival_time: ts("2026-03-01T08:30:00.123456789Z"),
                time_seen_by_doctor: None,
                closed: false,
                urgency: 1,
            }],
            readings: vec![],
            prescriptions: vec![],
            users: vec![],
        };

        let yaml = Store::render(&data).expect("render");
        assert!(yaml.contains("version: 1"));
        assert!(yaml.contains("nextVisitId: 2"));
        assert!(!yaml.contains("timeSeenByDoctor"));

        let reparsed = Store::parse(&yaml).expect("reparse");
        assert_eq!(reparsed, data);
    }

    #[test]
    fn rejects_unknown_keys() {
        let input = "version: 1\nnextVisitId: 1\nunexpected_key: true\n";
        let err = Store::parse(input).expect_err("should reject unknown key");
        match err {
            WireError::Translation(msg) => assert!(msg.contains("unexpected_key")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_health_card() {
        let input = r#"version: 1
nextVisitId: 1
patients:
  - healthCard: "12345"
    name: Short Card
    dateOfBirth: "1990-01-01"
"#;
        let err = Store::parse(input).expect_err("should reject short health card");
        match err {
            WireError::Translation(msg) => assert!(msg.contains("patients")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_timestamp() {
        let input = r#"version: 1
nextVisitId: 2
visits:
  - id: 1
    healthCard: "123456"
    arrivalTime: yesterday
"#;
        let err = Store::parse(input).expect_err("should reject timestamp");
        match err {
            WireError::Translation(msg) => assert!(msg.contains("arrivalTime")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unsupported_version() {
        let err = Store::parse("version: 9\nnextVisitId: 1\n").expect_err("bad version");
        assert!(matches!(err, WireError::InvalidInput(_)));
    }
}
