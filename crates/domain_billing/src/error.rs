//! Billing domain errors
//!
//! The variants fall into the four buckets the API layer cares about:
//! validation (reject before any transaction starts), conflict (the
//! transaction rolled back because someone got there first), not-found, and
//! transient store faults (safe to retry because every operation is atomic).

use core_kernel::{InvoiceId, Money, MoneyError, PortError, StayId};
use domain_admissions::AdmissionsError;
use domain_pharmacy::PharmacyError;
use thiserror::Error;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Invoice not found
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// Stay not found
    #[error("Stay not found: {0}")]
    StayNotFound(StayId),

    /// The invoice has already been settled
    #[error("Invoice {0} is already paid")]
    AlreadyPaid(InvoiceId),

    /// Settlement amount does not equal the invoice total (no partial payments)
    #[error("Amount mismatch for invoice {invoice_id}: expected {expected}, got {actual}")]
    AmountMismatch {
        invoice_id: InvoiceId,
        expected: Money,
        actual: Money,
    },

    /// Invoice totals must be non-negative
    #[error("Invoice amount must be non-negative, got {0}")]
    NegativeAmount(Money),

    /// Pharmacy failure (insufficient stock, unknown medicine, bad lines)
    #[error(transparent)]
    Pharmacy(#[from] PharmacyError),

    /// Admissions failure (already discharged, unknown room or stay)
    #[error(transparent)]
    Admissions(#[from] AdmissionsError),

    /// Money arithmetic failure (currency mismatch)
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// Storage failure
    #[error(transparent)]
    Store(#[from] PortError),
}

impl BillingError {
    /// Validation errors: nothing happened, fix the input
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BillingError::NegativeAmount(_)
                | BillingError::Money(_)
                | BillingError::Pharmacy(
                    PharmacyError::EmptyPrescription | PharmacyError::InvalidQuantity { .. }
                )
                | BillingError::Admissions(AdmissionsError::DischargeBeforeAdmission(_))
        )
    }

    /// Conflict errors: something already changed this; the transaction
    /// rolled back entirely
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            BillingError::AlreadyPaid(_)
                | BillingError::AmountMismatch { .. }
                | BillingError::Pharmacy(PharmacyError::InsufficientStock { .. })
                | BillingError::Admissions(AdmissionsError::AlreadyDischarged(_))
        )
    }

    /// Not-found errors: a referenced entity no longer exists
    pub fn is_not_found(&self) -> bool {
        match self {
            BillingError::InvoiceNotFound(_) | BillingError::StayNotFound(_) => true,
            BillingError::Pharmacy(PharmacyError::MedicineNotFound(_)) => true,
            BillingError::Admissions(
                AdmissionsError::StayNotFound(_) | AdmissionsError::RoomNotFound(_),
            ) => true,
            BillingError::Store(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Transient store faults: the caller may retry the whole operation
    pub fn is_transient(&self) -> bool {
        matches!(self, BillingError::Store(e) if e.is_transient())
    }
}
