//! Billing Domain - Charges, Invoices, and Settlement
//!
//! This crate is the billing and settlement core of the hospital system. It
//! owns the parts of the application with real invariants:
//!
//! - **Charge calculation** ([`charges`]): pure functions computing room-stay
//!   and medication charges from the configured tariff policy. No I/O.
//! - **Invoices** ([`invoice`]): a two-state, one-way machine
//!   (`Unpaid -> Paid`) with a non-negative total that is immutable once
//!   computed.
//! - **Settlement** ([`settlement`]): exactly one settlement record per paid
//!   invoice; repeated settlement attempts are rejected as no-ops.
//! - **The store port** ([`store`]): a repository/unit-of-work interface.
//!   Every multi-step operation acquires one transaction scope, performs all
//!   of its writes inside it, and commits last; dropping the scope rolls
//!   everything back. Stock debits cross this boundary as a single
//!   conditional decrement so concurrent dispensing can never oversell.
//! - **Services** ([`services`]): the dispensing, discharge, and payment
//!   orchestrators tying the above together.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{DispensingService, ChargePolicy};
//!
//! let service = DispensingService::new(store, ChargePolicy::default());
//! let outcome = service.dispense(request).await?;
//! // Either every line was recorded, every stock debit succeeded, and one
//! // Medication invoice exists - or nothing happened at all.
//! ```

pub mod charges;
pub mod invoice;
pub mod settlement;
pub mod store;
pub mod services;
pub mod error;

pub use charges::{ChargePolicy, billable_days};
pub use invoice::{Invoice, InvoiceCategory, InvoiceStatus, ClinicalReference};
pub use settlement::{Settlement, SettlementMethod};
pub use store::{BillingStore, BillingTx, StockDebit};
pub use services::{
    DispensingService, DispenseRequest, DispenseLine, DispenseOutcome,
    DischargeService, DischargeRequest, DischargeOutcome,
    PaymentService, InvoiceStatusView,
};
pub use error::BillingError;
