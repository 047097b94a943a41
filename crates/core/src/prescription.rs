//! Prescriptions recorded during a visit.

use crate::TriageResult;
use triage_types::ExportText;

/// A medication and its instructions. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prescription {
    medication_name: ExportText,
    instructions: ExportText,
}

impl Prescription {
    /// Creates a validated prescription.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TriageError::InvalidInput`] if the name contains `~`, or the
    /// instructions contain `~` or a line break.
    pub fn create(
        medication_name: impl Into<String>,
        instructions: impl Into<String>,
    ) -> TriageResult<Self> {
        Ok(Self {
            medication_name: ExportText::new(medication_name)?,
            instructions: ExportText::single_line(instructions)?,
        })
    }

    /// Rebuilds a prescription from stored values without validating them.
    pub fn restore(medication_name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            medication_name: ExportText::unchecked(medication_name),
            instructions: ExportText::unchecked(instructions),
        }
    }

    pub fn medication_name(&self) -> &str {
        self.medication_name.as_str()
    }

    pub fn instructions(&self) -> &str {
        self.instructions.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TriageError;

    #[test]
    fn creates_valid_prescription() {
        let p = Prescription::create("Ibuprofen", "400mg every 6 hours").expect("valid");
        assert_eq!(p.medication_name(), "Ibuprofen");
        assert_eq!(p.instructions(), "400mg every 6 hours");
    }

    #[test]
    fn rejects_delimiter_in_either_field() {
        let err = Prescription::create("Ibu~profen", "x").expect_err("delimiter in name");
        assert!(matches!(err, TriageError::InvalidInput(_)));
        let err = Prescription::create("Ibuprofen", "take ~ daily").expect_err("delimiter");
        assert!(matches!(err, TriageError::InvalidInput(_)));
    }

    #[test]
    fn rejects_line_break_in_instructions() {
        let err = Prescription::create("Ibuprofen", "one\ntwo").expect_err("line break");
        assert!(matches!(err, TriageError::InvalidInput(_)));
    }

    #[test]
    fn restore_keeps_text_verbatim() {
        let p = Prescription::restore("a~b", "one\ntwo");
        assert_eq!(p.medication_name(), "a~b");
        assert_eq!(p.instructions(), "one\ntwo");
    }
}
