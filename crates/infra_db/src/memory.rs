//! In-memory billing store
//!
//! An in-process implementation of [`BillingStore`] used by tests and local
//! development. It mirrors the transactional semantics of the PostgreSQL
//! adapter with a coarser mechanism: [`MemoryStore::begin`] takes the single
//! store lock and clones the state into a working copy; [`BillingTx::commit`]
//! swaps the working copy back in; dropping the transaction without
//! committing discards the copy. Holding the lock for the lifetime of the
//! transaction serializes all transactions, which trivially satisfies the
//! ordering the port demands of conflicting debits and settlements.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use core_kernel::{InvoiceId, MedicineId, PatientId, PortError, PrescriptionId, RoomId, StayId};
use domain_admissions::{InpatientStay, Room};
use domain_billing::{BillingStore, BillingTx, Invoice, InvoiceStatus, Settlement, StockDebit};
use domain_pharmacy::{Medicine, Prescription, PrescriptionLine};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    medicines: HashMap<MedicineId, Medicine>,
    prescriptions: HashMap<PrescriptionId, Prescription>,
    rooms: HashMap<RoomId, Room>,
    stays: HashMap<StayId, InpatientStay>,
    invoices: HashMap<InvoiceId, Invoice>,
    settlements: Vec<Settlement>,
}

/// In-memory implementation of the billing store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a medicine into the catalogue
    pub async fn seed_medicine(&self, medicine: Medicine) {
        self.state.lock().await.medicines.insert(medicine.id, medicine);
    }

    /// Seeds a room
    pub async fn seed_room(&self, room: Room) {
        self.state.lock().await.rooms.insert(room.id, room);
    }

    /// Seeds an inpatient stay
    pub async fn seed_stay(&self, stay: InpatientStay) {
        self.state.lock().await.stays.insert(stay.id, stay);
    }

    /// Seeds a prescription with its lines
    pub async fn seed_prescription(&self, prescription: Prescription) {
        self.state
            .lock()
            .await
            .prescriptions
            .insert(prescription.id, prescription);
    }

    /// Seeds an invoice
    pub async fn seed_invoice(&self, invoice: Invoice) {
        self.state.lock().await.invoices.insert(invoice.id, invoice);
    }

    /// Current stock of a medicine, for test assertions
    pub async fn stock_of(&self, id: MedicineId) -> Option<u32> {
        self.state.lock().await.medicines.get(&id).map(|m| m.stock)
    }
}

#[async_trait]
impl BillingStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn BillingTx>, PortError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }

    async fn invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, PortError> {
        Ok(self.state.lock().await.invoices.get(&id).cloned())
    }

    async fn invoices_by_patient(
        &self,
        patient_id: PatientId,
        status: Option<InvoiceStatus>,
    ) -> Result<Vec<Invoice>, PortError> {
        let state = self.state.lock().await;
        let mut invoices: Vec<Invoice> = state
            .invoices
            .values()
            .filter(|inv| inv.patient_id == patient_id)
            .filter(|inv| status.map_or(true, |s| inv.status == s))
            .cloned()
            .collect();
        invoices.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        Ok(invoices)
    }

    async fn settlements_for_invoice(
        &self,
        id: InvoiceId,
    ) -> Result<Vec<Settlement>, PortError> {
        Ok(self
            .state
            .lock()
            .await
            .settlements
            .iter()
            .filter(|s| s.invoice_id == id)
            .cloned()
            .collect())
    }

    async fn medicine(&self, id: MedicineId) -> Result<Option<Medicine>, PortError> {
        Ok(self.state.lock().await.medicines.get(&id).cloned())
    }

    async fn stay(&self, id: StayId) -> Result<Option<InpatientStay>, PortError> {
        Ok(self.state.lock().await.stays.get(&id).cloned())
    }

    async fn prescription(
        &self,
        id: PrescriptionId,
    ) -> Result<Option<Prescription>, PortError> {
        Ok(self.state.lock().await.prescriptions.get(&id).cloned())
    }
}

/// One in-memory transaction: a working copy plus the held store lock
struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl BillingTx for MemoryTx {
    async fn medicine(&mut self, id: MedicineId) -> Result<Option<Medicine>, PortError> {
        Ok(self.working.medicines.get(&id).cloned())
    }

    async fn try_debit_stock(
        &mut self,
        id: MedicineId,
        quantity: u32,
    ) -> Result<StockDebit, PortError> {
        let medicine = self
            .working
            .medicines
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Medicine", id))?;

        if medicine.stock < quantity {
            return Ok(StockDebit::Insufficient {
                available: medicine.stock,
            });
        }
        medicine.stock -= quantity;
        medicine.updated_at = Utc::now();
        Ok(StockDebit::Debited)
    }

    async fn insert_prescription(
        &mut self,
        prescription: &Prescription,
    ) -> Result<(), PortError> {
        self.working
            .prescriptions
            .insert(prescription.id, prescription.clone());
        Ok(())
    }

    async fn stay_for_update(&mut self, id: StayId) -> Result<Option<InpatientStay>, PortError> {
        Ok(self.working.stays.get(&id).cloned())
    }

    async fn room(&mut self, id: RoomId) -> Result<Option<Room>, PortError> {
        Ok(self.working.rooms.get(&id).cloned())
    }

    async fn update_stay(&mut self, stay: &InpatientStay) -> Result<(), PortError> {
        self.working.stays.insert(stay.id, stay.clone());
        Ok(())
    }

    async fn unbilled_lines(
        &mut self,
        prescription_id: PrescriptionId,
    ) -> Result<Vec<PrescriptionLine>, PortError> {
        Ok(self
            .working
            .prescriptions
            .get(&prescription_id)
            .map(|rx| rx.lines.iter().filter(|l| !l.billed).cloned().collect())
            .unwrap_or_default())
    }

    async fn mark_lines_billed(
        &mut self,
        prescription_id: PrescriptionId,
    ) -> Result<(), PortError> {
        if let Some(rx) = self.working.prescriptions.get_mut(&prescription_id) {
            for line in &mut rx.lines {
                line.billed = true;
            }
        }
        Ok(())
    }

    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), PortError> {
        self.working.invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn invoice_for_update(&mut self, id: InvoiceId) -> Result<Option<Invoice>, PortError> {
        Ok(self.working.invoices.get(&id).cloned())
    }

    async fn mark_invoice_paid(
        &mut self,
        id: InvoiceId,
        paid_at: DateTime<Utc>,
    ) -> Result<(), PortError> {
        let invoice = self
            .working
            .invoices
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Invoice", id))?;
        invoice
            .mark_paid(paid_at)
            .map_err(|e| PortError::conflict(e.to_string()))?;
        Ok(())
    }

    async fn insert_settlement(&mut self, settlement: &Settlement) -> Result<(), PortError> {
        self.working.settlements.push(settlement.clone());
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), PortError> {
        *self.guard = self.working;
        Ok(())
    }
}
