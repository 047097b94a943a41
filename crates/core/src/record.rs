//! Text layout for visit records.
//!
//! Two renderings share the same building blocks:
//! - the medical record of a patient's closed visits, produced by the gateways
//! - the display text of a single visit, produced by [`crate::Visit::display_text`]
//!
//! Times are shown in the local time zone as `MM/DD/YYYY` and `HH:MM`.

use crate::constants::NO_MEDICAL_RECORD;
use chrono::{DateTime, Local, Utc};

const RECORD_BANNER: &str = "+++++++++++++++++++++ \n Record \n+++++++++++++++++++++ \n";
const ENTRY_RULE: &str = "------------------\n";

/// Measurements of one reading as they appear in a record.
pub(crate) struct ReadingLine {
    pub systolic: i32,
    pub diastolic: i32,
    pub temperature: f64,
    pub heart_rate: f64,
    pub timestamp: DateTime<Utc>,
}

/// One visit as it appears in a record.
pub(crate) struct VisitLines<'a> {
    pub arrival_time: DateTime<Utc>,
    pub time_seen_by_doctor: Option<DateTime<Utc>>,
    pub readings: Vec<ReadingLine>,
    pub prescriptions: Vec<(&'a str, &'a str)>,
}

/// Spacing differences between the stored medical record and the live display.
#[derive(Clone, Copy)]
pub(crate) enum Layout {
    /// Dates carry a trailing space; prescriptions are separated by a space.
    MedicalRecord,
    /// Dates carry no trailing space; entries are concatenated.
    Display,
}

impl Layout {
    fn date_suffix(self) -> &'static str {
        match self {
            Layout::MedicalRecord => " ",
            Layout::Display => "",
        }
    }

    fn prescription_separator(self) -> &'static str {
        match self {
            Layout::MedicalRecord => " ",
            Layout::Display => "",
        }
    }
}

fn local_date(t: DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%m/%d/%Y").to_string()
}

fn local_time(t: DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%H:%M").to_string()
}

/// Formats a real value the way the record has always shown it (`37.0`, `39.5`).
fn real(value: f64) -> String {
    format!("{value:?}")
}

/// Renders one visit block.
pub(crate) fn visit_block(visit: &VisitLines<'_>, layout: Layout) -> String {
    let suffix = layout.date_suffix();
    let mut out = String::from(RECORD_BANNER);

    out.push_str(&format!(
        "Arrival Date: {}{suffix}\nArrival Time: {}\n",
        local_date(visit.arrival_time),
        local_time(visit.arrival_time)
    ));

    if let Some(seen) = visit.time_seen_by_doctor {
        out.push_str(&format!(
            "Seen by Doctor Date: {}{suffix}\nSeen by Doctor Time: {}\n",
            local_date(seen),
            local_time(seen)
        ));
    }

    for reading in &visit.readings {
        out.push_str(&format!(
            "{ENTRY_RULE}Vital Signs:\nDate: {}{suffix}\nTime: {}\nSystolic: {}\nDiastolic: {}\nTemperature: {}\nHeart Rate: {}\n",
            local_date(reading.timestamp),
            local_time(reading.timestamp),
            reading.systolic,
            reading.diastolic,
            real(reading.temperature),
            real(reading.heart_rate),
        ));
    }

    let prescriptions: Vec<String> = visit
        .prescriptions
        .iter()
        .map(|(name, instructions)| {
            format!("{ENTRY_RULE}Prescription:\nName: {name}\nInstructions: {instructions}\n")
        })
        .collect();
    out.push_str(&prescriptions.join(layout.prescription_separator()));

    out
}

/// Renders the medical record for a patient's closed visits.
///
/// `visits` must already be ordered most recent arrival first, each with its readings
/// most recent first. Returns `None` when there are no closed visits.
pub(crate) fn medical_record(visits: &[VisitLines<'_>]) -> Option<String> {
    if visits.is_empty() {
        return None;
    }
    let blocks: Vec<String> = visits
        .iter()
        .map(|v| visit_block(v, Layout::MedicalRecord))
        .collect();
    Some(blocks.join(" "))
}

/// Medical record text, or the sentinel when the patient has none.
pub(crate) fn medical_record_or_sentinel(text: Option<String>) -> String {
    text.unwrap_or_else(|| NO_MEDICAL_RECORD.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse::<DateTime<Utc>>().expect("valid datetime")
    }

    fn sample<'a>(seen: bool, prescriptions: Vec<(&'a str, &'a str)>) -> VisitLines<'a> {
        VisitLines {
            arrival_time: ts("2026-01-23T12:00:00Z"),
            time_seen_by_doctor: seen.then(|| ts("2026-01-23T12:30:00Z")),
            readings: vec![ReadingLine {
                systolic: 150,
                diastolic: 80,
                temperature: 39.5,
                heart_rate: 60.0,
                timestamp: ts("2026-01-23T12:10:00Z"),
            }],
            prescriptions,
        }
    }

    #[test]
    fn medical_record_block_layout() {
        let visit = sample(true, vec![("Ibuprofen", "400mg"), ("Rest", "two days")]);
        let text = medical_record(&[visit]).expect("record");

        let arrival = ts("2026-01-23T12:00:00Z");
        let expected_start = format!(
            "+++++++++++++++++++++ \n Record \n+++++++++++++++++++++ \nArrival Date: {} \nArrival Time: {}\nSeen by Doctor Date: ",
            local_date(arrival),
            local_time(arrival)
        );
        assert!(text.starts_with(&expected_start), "got: {text}");
        assert!(text.contains("Systolic: 150\nDiastolic: 80\nTemperature: 39.5\nHeart Rate: 60.0\n"));
        assert!(text.ends_with(
            "------------------\nPrescription:\nName: Ibuprofen\nInstructions: 400mg\n ------------------\nPrescription:\nName: Rest\nInstructions: two days\n"
        ));
    }

    #[test]
    fn display_layout_has_no_date_padding() {
        let visit = sample(false, vec![("A", "x"), ("B", "y")]);
        let text = visit_block(&visit, Layout::Display);
        assert!(!text.contains("Seen by Doctor"));
        assert!(!text.contains("/2026 \n"));
        assert!(text.contains("Instructions: x\n------------------\nPrescription:\nName: B"));
    }

    #[test]
    fn visits_are_joined_by_a_space() {
        let text = medical_record(&[sample(false, vec![]), sample(false, vec![])])
            .expect("record");
        assert_eq!(text.matches(RECORD_BANNER).count(), 2);
        assert!(text.contains("Heart Rate: 60.0\n +++++++++++++++++++++ \n"));
    }

    #[test]
    fn no_closed_visits_gives_sentinel() {
        assert_eq!(medical_record(&[]), None);
        assert_eq!(medical_record_or_sentinel(None), NO_MEDICAL_RECORD);
    }
}
