//! The billing store port
//!
//! A repository/unit-of-work interface injected into each service. Reads go
//! through [`BillingStore`]; every multi-step operation calls
//! [`BillingStore::begin`] to acquire one [`BillingTx`] scope, performs all
//! of its writes inside it, and finishes with [`BillingTx::commit`].
//! Dropping an uncommitted transaction discards every write in it, so a
//! failure at any step rolls the whole operation back.
//!
//! [`BillingTx::try_debit_stock`] is the stock-ledger boundary: adapters
//! must implement it as a single conditional decrement ("subtract N only if
//! the result stays non-negative"), never as a separate read followed by a
//! write. Two concurrent debits against the same medicine may therefore
//! never both succeed when their combined quantity exceeds available stock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{InvoiceId, MedicineId, PatientId, PortError, PrescriptionId, RoomId, StayId};
use domain_admissions::{InpatientStay, Room};
use domain_pharmacy::{Medicine, Prescription, PrescriptionLine};

use crate::invoice::{Invoice, InvoiceStatus};
use crate::settlement::Settlement;

/// Outcome of a conditional stock debit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDebit {
    /// Stock was decremented
    Debited,
    /// The debit would have taken stock below zero; nothing changed
    Insufficient {
        /// Stock available at the time of the attempt
        available: u32,
    },
}

/// Read access plus transaction entry point
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Opens a transaction scope
    async fn begin(&self) -> Result<Box<dyn BillingTx>, PortError>;

    /// Fetches an invoice
    async fn invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, PortError>;

    /// Lists a patient's invoices, newest first, optionally filtered by status
    async fn invoices_by_patient(
        &self,
        patient_id: PatientId,
        status: Option<InvoiceStatus>,
    ) -> Result<Vec<Invoice>, PortError>;

    /// Lists the settlements recorded against an invoice
    async fn settlements_for_invoice(&self, id: InvoiceId)
        -> Result<Vec<Settlement>, PortError>;

    /// Fetches a medicine
    async fn medicine(&self, id: MedicineId) -> Result<Option<Medicine>, PortError>;

    /// Fetches a stay
    async fn stay(&self, id: StayId) -> Result<Option<InpatientStay>, PortError>;

    /// Fetches a prescription with its lines
    async fn prescription(&self, id: PrescriptionId)
        -> Result<Option<Prescription>, PortError>;
}

/// One atomic unit of billing work
///
/// All writes within one `BillingTx` commit together or not at all.
/// Implementations serialize conflicting transactions: concurrent debits on
/// one medicine, and concurrent settlements of one invoice, are ordered such
/// that the second observes the first's effects.
#[async_trait]
pub trait BillingTx: Send {
    /// Fetches a medicine within the transaction (price snapshot source)
    async fn medicine(&mut self, id: MedicineId) -> Result<Option<Medicine>, PortError>;

    /// Conditionally debits stock: decrement by `quantity` only if the
    /// result stays non-negative
    async fn try_debit_stock(
        &mut self,
        id: MedicineId,
        quantity: u32,
    ) -> Result<StockDebit, PortError>;

    /// Inserts a prescription together with its lines
    async fn insert_prescription(&mut self, prescription: &Prescription)
        -> Result<(), PortError>;

    /// Fetches a stay, locked against concurrent discharge
    async fn stay_for_update(&mut self, id: StayId)
        -> Result<Option<InpatientStay>, PortError>;

    /// Fetches a room
    async fn room(&mut self, id: RoomId) -> Result<Option<Room>, PortError>;

    /// Persists updated stay fields (discharge timestamp, status)
    async fn update_stay(&mut self, stay: &InpatientStay) -> Result<(), PortError>;

    /// Lines on a prescription that have not yet been billed
    async fn unbilled_lines(
        &mut self,
        prescription_id: PrescriptionId,
    ) -> Result<Vec<PrescriptionLine>, PortError>;

    /// Marks all of a prescription's lines as billed
    async fn mark_lines_billed(&mut self, prescription_id: PrescriptionId)
        -> Result<(), PortError>;

    /// Inserts an invoice
    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), PortError>;

    /// Fetches an invoice, locked against concurrent settlement
    async fn invoice_for_update(&mut self, id: InvoiceId)
        -> Result<Option<Invoice>, PortError>;

    /// Transitions an invoice to Paid
    async fn mark_invoice_paid(
        &mut self,
        id: InvoiceId,
        paid_at: DateTime<Utc>,
    ) -> Result<(), PortError>;

    /// Inserts a settlement record
    async fn insert_settlement(&mut self, settlement: &Settlement) -> Result<(), PortError>;

    /// Commits every write in this scope
    async fn commit(self: Box<Self>) -> Result<(), PortError>;
}
