//! Pharmacy domain errors

use core_kernel::MedicineId;
use thiserror::Error;

/// Errors that can occur in the pharmacy domain
#[derive(Debug, Error)]
pub enum PharmacyError {
    /// Medicine not found in the catalogue
    #[error("Medicine not found: {0}")]
    MedicineNotFound(MedicineId),

    /// A stock debit would take the quantity below zero
    #[error("Insufficient stock for {medicine_id}: requested {requested}, available {available}")]
    InsufficientStock {
        medicine_id: MedicineId,
        requested: u32,
        available: u32,
    },

    /// A prescription must carry at least one line
    #[error("Prescription has no lines")]
    EmptyPrescription,

    /// Line quantities must be strictly positive
    #[error("Invalid quantity {quantity} for medicine {medicine_id}")]
    InvalidQuantity {
        medicine_id: MedicineId,
        quantity: u32,
    },
}
