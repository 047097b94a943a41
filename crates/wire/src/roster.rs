//! Seed roster line formats.
//!
//! Two plain-text rosters seed a fresh store:
//! - `patient_records.txt`: `healthCard,name,dateOfBirth`
//! - `passwords.txt`: `username,password,role`
//!
//! Fields are split on `,` and kept verbatim. Field-level validation (health card shape,
//! date format, role name) belongs to the caller; this module only checks line shape.

use crate::{WireError, WireResult};

/// Number of comma-separated fields on every roster line.
const ROSTER_FIELDS: usize = 3;

/// One line of the patient roster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientRosterRow {
    /// 1-based line number in the source text.
    pub line: usize,
    pub health_card: String,
    pub name: String,
    pub date_of_birth: String,
}

/// One line of the user roster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRosterRow {
    /// 1-based line number in the source text.
    pub line: usize,
    pub username: String,
    pub password: String,
    pub role: String,
}

/// Roster parsing operations.
///
/// Zero-sized type used for namespacing; all methods are associated functions.
pub struct Roster;

impl Roster {
    /// Parse the patient roster.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Roster`] for the first line that does not have exactly
    /// three fields.
    pub fn parse_patients(text: &str) -> WireResult<Vec<PatientRosterRow>> {
        lines(text)
            .map(|(line, content)| {
                let [health_card, name, date_of_birth] = split_fields(line, content)?;
                Ok(PatientRosterRow {
                    line,
                    health_card,
                    name,
                    date_of_birth,
                })
            })
            .collect()
    }

    /// Parse the user roster.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Roster`] for the first line that does not have exactly
    /// three fields, or whose username is empty.
    pub fn parse_users(text: &str) -> WireResult<Vec<UserRosterRow>> {
        lines(text)
            .map(|(line, content)| {
                let [username, password, role] = split_fields(line, content)?;
                if username.is_empty() {
                    return Err(WireError::Roster {
                        line,
                        reason: "username is empty".into(),
                    });
                }
                Ok(UserRosterRow {
                    line,
                    username,
                    password,
                    role,
                })
            })
            .collect()
    }
}

/// Yields `(line_number, content)` for non-blank lines with any trailing `\r` removed.
fn lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(idx, raw)| (idx + 1, raw.strip_suffix('\r').unwrap_or(raw)))
        .filter(|(_, content)| !content.trim().is_empty())
}

fn split_fields(line: usize, content: &str) -> WireResult<[String; ROSTER_FIELDS]> {
    let fields: Vec<&str> = content.split(',').collect();
    if fields.len() != ROSTER_FIELDS {
        return Err(WireError::Roster {
            line,
            reason: format!(
                "expected {ROSTER_FIELDS} comma-separated fields, found {}",
                fields.len()
            ),
        });
    }
    Ok([
        fields[0].to_owned(),
        fields[1].to_owned(),
        fields[2].to_owned(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_patient_lines() {
        let text = "123456,Jane Doe,1990-05-01\r\n\n654321,John Smith,2025-01-15\n";
        let rows = Roster::parse_patients(text).expect("parse roster");
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            PatientRosterRow {
                line: 1,
                health_card: "123456".into(),
                name: "Jane Doe".into(),
                date_of_birth: "1990-05-01".into(),
            }
        );
        assert_eq!(rows[1].line, 3);
        assert_eq!(rows[1].date_of_birth, "2025-01-15");
    }

    #[test]
    fn rejects_wrong_field_count() {
        let text = "123456,Jane Doe,1990-05-01\n654321,Smith, John,2025-01-15\n";
        let err = Roster::parse_patients(text).expect_err("extra comma");
        match err {
            WireError::Roster { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("found 4"));
            }
            other => panic!("expected Roster error, got {other:?}"),
        }
    }

    #[test]
    fn parses_user_lines() {
        let rows = Roster::parse_users("nurse1,secret,nurse\ndoc1,pw,physician\n")
            .expect("parse users");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].username, "doc1");
        assert_eq!(rows[1].role, "physician");
    }

    #[test]
    fn rejects_empty_username() {
        let err = Roster::parse_users(",pw,nurse\n").expect_err("empty username");
        assert!(matches!(err, WireError::Roster { line: 1, .. }));
    }

    #[test]
    fn empty_text_yields_no_rows() {
        assert!(Roster::parse_patients("").expect("empty").is_empty());
        assert!(Roster::parse_users("\n\r\n").expect("blank").is_empty());
    }
}
