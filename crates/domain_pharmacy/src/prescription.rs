//! Prescription records
//!
//! A prescription is an ordered list of medication lines issued by a doctor
//! for a patient. Each line snapshots the medicine's unit price at creation
//! time so that later price edits cannot retroactively change what an
//! already-billed invoice was computed from.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{DoctorId, MedicineId, Money, PatientId, PrescriptionId};

/// A prescription issued for a patient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    /// Unique identifier
    pub id: PrescriptionId,
    /// Patient the medication is for
    pub patient_id: PatientId,
    /// Prescribing doctor
    pub prescriber_id: DoctorId,
    /// Medication lines
    pub lines: Vec<PrescriptionLine>,
    /// Optional clinical note
    pub note: Option<String>,
    /// When the prescription was issued
    pub issued_at: DateTime<Utc>,
}

impl Prescription {
    /// Creates a new prescription with no lines
    pub fn new(patient_id: PatientId, prescriber_id: DoctorId) -> Self {
        Self {
            id: PrescriptionId::new_v7(),
            patient_id,
            prescriber_id,
            lines: Vec::new(),
            note: None,
            issued_at: Utc::now(),
        }
    }

    /// Attaches a clinical note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Adds a medication line
    pub fn add_line(&mut self, line: PrescriptionLine) {
        self.lines.push(line);
    }

    /// Total medication charge across all lines, from snapshotted prices
    pub fn total(&self) -> Option<Money> {
        let mut iter = self.lines.iter();
        let first = iter.next()?.total();
        Some(iter.fold(first, |acc, line| acc + line.total()))
    }
}

/// A single medication line on a prescription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionLine {
    /// Line identifier
    pub id: Uuid,
    /// Medicine being dispensed
    pub medicine_id: MedicineId,
    /// Quantity dispensed (> 0)
    pub quantity: u32,
    /// Unit price snapshotted at issuance
    pub unit_price: Money,
    /// Usage instructions for the patient
    pub instructions: Option<String>,
    /// Whether this line has been billed on an invoice
    pub billed: bool,
}

impl PrescriptionLine {
    /// Creates a new line with the price snapshot taken from the medicine
    pub fn new(medicine_id: MedicineId, quantity: u32, unit_price: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            medicine_id,
            quantity,
            unit_price,
            instructions: None,
            billed: false,
        }
    }

    /// Sets the usage instructions
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Line amount: snapshotted unit price times quantity
    pub fn total(&self) -> Money {
        self.unit_price.multiply(Decimal::from(self.quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn test_line_total_uses_snapshot_price() {
        let line = PrescriptionLine::new(
            MedicineId::new(),
            2,
            Money::new(dec!(10000), Currency::IDR),
        );
        assert_eq!(line.total().amount(), dec!(20000));
    }

    #[test]
    fn test_prescription_total_sums_lines() {
        let mut rx = Prescription::new(PatientId::new(), DoctorId::new());
        rx.add_line(PrescriptionLine::new(
            MedicineId::new(),
            2,
            Money::new(dec!(10000), Currency::IDR),
        ));
        rx.add_line(PrescriptionLine::new(
            MedicineId::new(),
            1,
            Money::new(dec!(5000), Currency::IDR),
        ));

        assert_eq!(rx.total().unwrap().amount(), dec!(25000));
    }

    #[test]
    fn test_empty_prescription_has_no_total() {
        let rx = Prescription::new(PatientId::new(), DoctorId::new());
        assert!(rx.total().is_none());
    }

    #[test]
    fn test_with_note_and_instructions() {
        let rx = Prescription::new(PatientId::new(), DoctorId::new())
            .with_note("post-op course");
        assert_eq!(rx.note.as_deref(), Some("post-op course"));

        let line = PrescriptionLine::new(
            MedicineId::new(),
            1,
            Money::new(dec!(5000), Currency::IDR),
        )
        .with_instructions("3x daily after meals");
        assert_eq!(line.instructions.as_deref(), Some("3x daily after meals"));
        assert!(!line.billed);
    }
}
