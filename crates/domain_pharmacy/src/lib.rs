//! Pharmacy Domain - Medicines and Prescriptions
//!
//! This crate owns the medicine catalogue and prescription records. Its one
//! hard invariant is the stock invariant: a medicine's available quantity
//! must never go negative. The entity-level guard lives here
//! ([`Medicine::debit`]); the storage adapters enforce the same rule as a
//! single conditional decrement so that concurrent dispensing can never
//! oversell.
//!
//! Prescription lines snapshot the medicine's unit price at issuance. A
//! price change after a prescription is issued never alters an invoice that
//! was already computed from those lines.

pub mod medicine;
pub mod prescription;
pub mod error;

pub use medicine::Medicine;
pub use prescription::{Prescription, PrescriptionLine};
pub use error::PharmacyError;
