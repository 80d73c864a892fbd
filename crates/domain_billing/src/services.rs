//! Billing orchestration services
//!
//! These services tie the pure calculators, the domain entities, and the
//! store port together. Each operation acquires exactly one transaction
//! scope; every early return drops the scope and rolls the whole operation
//! back, so a half-applied state (stock debited but no invoice, invoice
//! paid but no settlement) is never observable.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use core_kernel::{AppointmentId, DoctorId, InvoiceId, MedicineId, Money, PatientId, StayId};
use domain_admissions::{AdmissionsError, InpatientStay};
use domain_pharmacy::{PharmacyError, Prescription, PrescriptionLine};

use crate::charges::ChargePolicy;
use crate::error::BillingError;
use crate::invoice::{ClinicalReference, Invoice, InvoiceCategory, InvoiceStatus};
use crate::settlement::{Settlement, SettlementMethod};
use crate::store::{BillingStore, StockDebit};

/// A requested medication line
#[derive(Debug, Clone)]
pub struct DispenseLine {
    pub medicine_id: MedicineId,
    pub quantity: u32,
    pub instructions: Option<String>,
}

/// Inputs to a dispensing transaction
#[derive(Debug, Clone)]
pub struct DispenseRequest {
    pub patient_id: PatientId,
    pub prescriber_id: DoctorId,
    pub lines: Vec<DispenseLine>,
    pub note: Option<String>,
}

/// Result of a committed dispensing transaction
#[derive(Debug, Clone)]
pub struct DispenseOutcome {
    pub prescription: Prescription,
    /// Absent when the total charge was zero
    pub invoice: Option<Invoice>,
}

/// Dispenses prescriptions atomically
///
/// For the whole line list, either every line is recorded, every stock
/// debit succeeds, and exactly one Medication invoice is created - or none
/// of that happens. The first insufficient-stock or unknown-medicine
/// failure aborts and rolls back all prior debits and insertions.
pub struct DispensingService {
    store: Arc<dyn BillingStore>,
    policy: ChargePolicy,
}

impl DispensingService {
    pub fn new(store: Arc<dyn BillingStore>, policy: ChargePolicy) -> Self {
        Self { store, policy }
    }

    /// Runs one dispensing transaction
    ///
    /// # Errors
    ///
    /// - `EmptyPrescription` / `InvalidQuantity`: rejected before the
    ///   transaction starts
    /// - `MedicineNotFound` / `InsufficientStock`: the transaction rolls
    ///   back; no stock level changes and no invoice is created
    pub async fn dispense(&self, request: DispenseRequest) -> Result<DispenseOutcome, BillingError> {
        if request.lines.is_empty() {
            return Err(PharmacyError::EmptyPrescription.into());
        }
        for line in &request.lines {
            if line.quantity == 0 {
                return Err(PharmacyError::InvalidQuantity {
                    medicine_id: line.medicine_id,
                    quantity: line.quantity,
                }
                .into());
            }
        }

        let mut tx = self.store.begin().await?;

        let mut prescription = Prescription::new(request.patient_id, request.prescriber_id);
        if let Some(note) = request.note {
            prescription = prescription.with_note(note);
        }

        for line in &request.lines {
            let medicine = tx
                .medicine(line.medicine_id)
                .await?
                .ok_or(PharmacyError::MedicineNotFound(line.medicine_id))?;

            match tx.try_debit_stock(line.medicine_id, line.quantity).await? {
                StockDebit::Debited => {}
                StockDebit::Insufficient { available } => {
                    // Dropping the transaction rolls back all prior debits
                    return Err(PharmacyError::InsufficientStock {
                        medicine_id: line.medicine_id,
                        requested: line.quantity,
                        available,
                    }
                    .into());
                }
            }

            let mut rx_line =
                PrescriptionLine::new(line.medicine_id, line.quantity, medicine.unit_price);
            if let Some(instructions) = &line.instructions {
                rx_line = rx_line.with_instructions(instructions.clone());
            }
            prescription.add_line(rx_line);
        }

        let total = self.policy.medication_charge(&prescription.lines);
        let invoice = if total.is_zero() {
            None
        } else {
            for line in &mut prescription.lines {
                line.billed = true;
            }
            Some(Invoice::new(
                InvoiceCategory::Medication,
                request.patient_id,
                total,
                Some(ClinicalReference::Prescription(prescription.id)),
                Some(self.policy.invoice_due_days),
            )?)
        };

        tx.insert_prescription(&prescription).await?;
        if let Some(invoice) = &invoice {
            tx.insert_invoice(invoice).await?;
        }
        tx.commit().await?;

        tracing::info!(
            prescription_id = %prescription.id,
            patient_id = %request.patient_id,
            lines = prescription.lines.len(),
            total = %total,
            invoiced = invoice.is_some(),
            "prescription dispensed"
        );

        Ok(DispenseOutcome {
            prescription,
            invoice,
        })
    }
}

/// Inputs to the discharge workflow
#[derive(Debug, Clone)]
pub struct DischargeRequest {
    pub stay_id: StayId,
    /// Actor requesting the discharge, for the audit trail
    pub requested_by: Option<String>,
    /// Defaults to now
    pub discharged_at: Option<DateTime<Utc>>,
}

/// Result of a committed discharge
#[derive(Debug, Clone)]
pub struct DischargeOutcome {
    pub stay: InpatientStay,
    pub invoice: Invoice,
}

/// Generates the end-of-stay invoice atomically
///
/// Room charge plus any pending medication charge become one InpatientStay
/// invoice, created in the same transaction that marks the stay discharged.
/// A partially discharged state is never observable.
pub struct DischargeService {
    store: Arc<dyn BillingStore>,
    policy: ChargePolicy,
}

impl DischargeService {
    pub fn new(store: Arc<dyn BillingStore>, policy: ChargePolicy) -> Self {
        Self { store, policy }
    }

    /// Runs one discharge workflow
    ///
    /// # Errors
    ///
    /// - `StayNotFound`: no such stay
    /// - `AlreadyDischarged`: the stay is no longer active
    /// - `DischargeBeforeAdmission`: invalid discharge timestamp
    pub async fn discharge(
        &self,
        request: DischargeRequest,
    ) -> Result<DischargeOutcome, BillingError> {
        let discharged_at = request.discharged_at.unwrap_or_else(Utc::now);

        let mut tx = self.store.begin().await?;

        let mut stay = tx
            .stay_for_update(request.stay_id)
            .await?
            .ok_or(BillingError::StayNotFound(request.stay_id))?;
        if !stay.is_active() {
            return Err(AdmissionsError::AlreadyDischarged(stay.id).into());
        }

        let room = tx
            .room(stay.room_id)
            .await?
            .ok_or(AdmissionsError::RoomNotFound(stay.room_id))?;

        stay.discharge(discharged_at)?;

        let mut total = self
            .policy
            .room_charge(room.class, stay.admitted_at, discharged_at);

        if let Some(prescription_id) = stay.prescription_id {
            let unbilled = tx.unbilled_lines(prescription_id).await?;
            if !unbilled.is_empty() {
                total = total.checked_add(&self.policy.medication_charge(&unbilled))?;
                tx.mark_lines_billed(prescription_id).await?;
            }
        }

        let invoice = Invoice::new(
            InvoiceCategory::InpatientStay,
            stay.patient_id,
            total,
            Some(ClinicalReference::Stay(stay.id)),
            Some(self.policy.invoice_due_days),
        )?;

        tx.update_stay(&stay).await?;
        tx.insert_invoice(&invoice).await?;
        tx.commit().await?;

        tracing::info!(
            stay_id = %stay.id,
            patient_id = %stay.patient_id,
            requested_by = request.requested_by.as_deref().unwrap_or("unknown"),
            room_class = room.class.label(),
            total = %total,
            "stay discharged and invoiced"
        );

        Ok(DischargeOutcome { stay, invoice })
    }
}

/// Status snapshot returned to polling clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceStatusView {
    pub invoice_id: InvoiceId,
    pub status: InvoiceStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Records settlements and drives the invoice status machine
///
/// `settle` and `confirm_external` share one contract: full amount only,
/// first commit wins, later callers observe `AlreadyPaid`. Clients waiting
/// on a QR scan poll [`PaymentService::check_status`], a pure read, until
/// the status flips - QR-pending exists only on the client's screen, never
/// as server state.
pub struct PaymentService {
    store: Arc<dyn BillingStore>,
    policy: ChargePolicy,
}

impl PaymentService {
    pub fn new(store: Arc<dyn BillingStore>, policy: ChargePolicy) -> Self {
        Self { store, policy }
    }

    /// Settles an invoice in the paying party's own session
    ///
    /// # Errors
    ///
    /// - `InvoiceNotFound`
    /// - `AlreadyPaid`: benign no-op; no second settlement is recorded
    /// - `AmountMismatch`: the amount must equal the invoice total
    pub async fn settle(
        &self,
        invoice_id: InvoiceId,
        amount: Money,
        method: SettlementMethod,
        external_reference: Option<String>,
    ) -> Result<Settlement, BillingError> {
        self.settle_internal(invoice_id, Some(amount), method, external_reference)
            .await
    }

    /// Applies an out-of-band confirmation signal (scanned QR code)
    ///
    /// Same contract as [`PaymentService::settle`]; the amount is the
    /// invoice total and the method is `QrCode`. Whichever of settle and
    /// confirm commits first wins; the other observes `AlreadyPaid`.
    pub async fn confirm_external(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Settlement, BillingError> {
        self.settle_internal(invoice_id, None, SettlementMethod::QrCode, None)
            .await
    }

    async fn settle_internal(
        &self,
        invoice_id: InvoiceId,
        amount: Option<Money>,
        method: SettlementMethod,
        external_reference: Option<String>,
    ) -> Result<Settlement, BillingError> {
        let mut tx = self.store.begin().await?;

        let invoice = tx
            .invoice_for_update(invoice_id)
            .await?
            .ok_or(BillingError::InvoiceNotFound(invoice_id))?;
        if invoice.is_paid() {
            return Err(BillingError::AlreadyPaid(invoice_id));
        }

        let amount = amount.unwrap_or(invoice.total);
        if amount != invoice.total {
            return Err(BillingError::AmountMismatch {
                invoice_id,
                expected: invoice.total,
                actual: amount,
            });
        }

        let mut settlement = Settlement::new(invoice_id, amount, method);
        if let Some(reference) = external_reference {
            settlement = settlement.with_reference(reference);
        }

        tx.insert_settlement(&settlement).await?;
        tx.mark_invoice_paid(invoice_id, settlement.settled_at).await?;
        tx.commit().await?;

        tracing::info!(
            invoice_id = %invoice_id,
            settlement_id = %settlement.id,
            method = ?method,
            amount = %amount,
            "invoice settled"
        );

        Ok(settlement)
    }

    /// Current status of an invoice; cheap, read-only, never blocks
    pub async fn check_status(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<InvoiceStatusView, BillingError> {
        let invoice = self
            .store
            .invoice(invoice_id)
            .await?
            .ok_or(BillingError::InvoiceNotFound(invoice_id))?;

        Ok(InvoiceStatusView {
            invoice_id: invoice.id,
            status: invoice.status,
            paid_at: invoice.paid_at,
        })
    }

    /// A patient's invoices, newest first, optionally filtered by status
    pub async fn invoices_for_patient(
        &self,
        patient_id: PatientId,
        status: Option<InvoiceStatus>,
    ) -> Result<Vec<Invoice>, BillingError> {
        Ok(self.store.invoices_by_patient(patient_id, status).await?)
    }

    /// Creates a flat-fee consultation invoice
    pub async fn bill_consultation(
        &self,
        patient_id: PatientId,
        appointment_id: AppointmentId,
    ) -> Result<Invoice, BillingError> {
        let invoice = Invoice::new(
            InvoiceCategory::Consultation,
            patient_id,
            self.policy.consultation_fee,
            Some(ClinicalReference::Appointment(appointment_id)),
            Some(self.policy.invoice_due_days),
        )?;

        let mut tx = self.store.begin().await?;
        tx.insert_invoice(&invoice).await?;
        tx.commit().await?;

        tracing::info!(
            invoice_id = %invoice.id,
            patient_id = %patient_id,
            total = %invoice.total,
            "consultation billed"
        );

        Ok(invoice)
    }
}
