//! Invoice management
//!
//! An invoice is created only by the dispensing or discharge workflows,
//! inside the same transaction as the charge data it represents. Its total
//! equals the sum of its contributing charge components at creation time and
//! never changes afterwards; its status moves `Unpaid -> Paid` exactly once.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AppointmentId, InvoiceId, Money, PatientId, PrescriptionId, StayId};

use crate::error::BillingError;

/// Invoice category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceCategory {
    /// Flat-fee outpatient consultation
    Consultation,
    /// Dispensed medication
    Medication,
    /// Inpatient stay (room charge plus any unbilled medication)
    InpatientStay,
}

/// Invoice status: a one-way machine, `Unpaid -> Paid`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Unpaid,
    /// Terminal; never reverts
    Paid,
}

/// Reference back to the clinical record the invoice bills for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ClinicalReference {
    Prescription(PrescriptionId),
    Stay(StayId),
    Appointment(AppointmentId),
}

/// A billable charge record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Patient being billed
    pub patient_id: PatientId,
    /// Category
    pub category: InvoiceCategory,
    /// Total amount; immutable once computed
    pub total: Money,
    /// Status
    pub status: InvoiceStatus,
    /// Issue timestamp
    pub issued_at: DateTime<Utc>,
    /// Payment due date, if any
    pub due_date: Option<NaiveDate>,
    /// When the invoice was settled
    pub paid_at: Option<DateTime<Utc>>,
    /// Originating clinical record
    pub reference: Option<ClinicalReference>,
}

impl Invoice {
    /// Creates a new unpaid invoice
    ///
    /// # Arguments
    ///
    /// * `category` - What the invoice bills for
    /// * `patient_id` - Patient being billed
    /// * `total` - Sum of the contributing charge components
    /// * `reference` - Originating clinical record, if any
    /// * `due_in_days` - Days until the due date, from the issue date
    ///
    /// # Errors
    ///
    /// Returns `NegativeAmount` if the total is negative.
    pub fn new(
        category: InvoiceCategory,
        patient_id: PatientId,
        total: Money,
        reference: Option<ClinicalReference>,
        due_in_days: Option<i64>,
    ) -> Result<Self, BillingError> {
        if total.is_negative() {
            return Err(BillingError::NegativeAmount(total));
        }

        let now = Utc::now();
        let due_date = due_in_days
            .and_then(|days| u64::try_from(days).ok())
            .and_then(|days| now.date_naive().checked_add_days(Days::new(days)));

        Ok(Self {
            id: InvoiceId::new_v7(),
            patient_id,
            category,
            total,
            status: InvoiceStatus::Unpaid,
            issued_at: now,
            due_date,
            paid_at: None,
            reference,
        })
    }

    /// Returns true once the invoice is settled
    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    /// Marks the invoice paid
    ///
    /// Idempotent in the sense required by the payment processor: calling on
    /// an already-paid invoice returns `AlreadyPaid` without mutating
    /// anything, so repeated confirmations can never produce a second
    /// transition or alter the original paid timestamp.
    pub fn mark_paid(&mut self, paid_at: DateTime<Utc>) -> Result<(), BillingError> {
        if self.is_paid() {
            return Err(BillingError::AlreadyPaid(self.id));
        }
        self.status = InvoiceStatus::Paid;
        self.paid_at = Some(paid_at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn unpaid_invoice(total: Money) -> Invoice {
        Invoice::new(
            InvoiceCategory::Medication,
            PatientId::new(),
            total,
            Some(ClinicalReference::Prescription(PrescriptionId::new())),
            Some(3),
        )
        .unwrap()
    }

    #[test]
    fn test_new_invoice_is_unpaid_with_due_date() {
        let invoice = unpaid_invoice(Money::new(dec!(25_000), Currency::IDR));

        assert_eq!(invoice.status, InvoiceStatus::Unpaid);
        assert!(invoice.paid_at.is_none());
        assert_eq!(
            invoice.due_date,
            invoice.issued_at.date_naive().checked_add_days(Days::new(3))
        );
    }

    #[test]
    fn test_negative_total_is_rejected() {
        let result = Invoice::new(
            InvoiceCategory::Consultation,
            PatientId::new(),
            Money::new(dec!(-1), Currency::IDR),
            None,
            None,
        );
        assert!(matches!(result, Err(BillingError::NegativeAmount(_))));
    }

    #[test]
    fn test_zero_total_is_allowed() {
        // An unconfigured room class can legitimately produce a zero stay charge
        let invoice = unpaid_invoice(Money::zero(Currency::IDR));
        assert!(invoice.total.is_zero());
    }

    #[test]
    fn test_mark_paid_transition() {
        let mut invoice = unpaid_invoice(Money::new(dec!(25_000), Currency::IDR));
        let paid_at = Utc::now();

        invoice.mark_paid(paid_at).unwrap();

        assert!(invoice.is_paid());
        assert_eq!(invoice.paid_at, Some(paid_at));
    }

    #[test]
    fn test_mark_paid_twice_is_rejected_without_mutation() {
        let mut invoice = unpaid_invoice(Money::new(dec!(25_000), Currency::IDR));
        let first = Utc::now();
        invoice.mark_paid(first).unwrap();

        let result = invoice.mark_paid(first + chrono::Duration::hours(1));

        assert!(matches!(result, Err(BillingError::AlreadyPaid(_))));
        assert_eq!(invoice.paid_at, Some(first));
    }

    #[test]
    fn test_clinical_reference_serialization() {
        let reference = ClinicalReference::Stay(StayId::new());
        let json = serde_json::to_string(&reference).unwrap();
        let back: ClinicalReference = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reference);
    }
}
