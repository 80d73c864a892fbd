//! Billing DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{InvoiceId, PatientId, SettlementId};
use domain_billing::{
    ClinicalReference, Invoice, InvoiceCategory, InvoiceStatus, InvoiceStatusView, Settlement,
    SettlementMethod,
};

#[derive(Debug, Deserialize)]
pub struct ConsultationRequest {
    pub patient_id: Uuid,
    pub appointment_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SettleRequest {
    pub amount: Decimal,
    pub method: SettlementMethod,
    pub external_reference: Option<String>,
}

/// Query parameters for the patient invoice listing
#[derive(Debug, Default, Deserialize)]
pub struct InvoiceListQuery {
    /// Filter: "unpaid" or "paid"
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: InvoiceId,
    pub patient_id: PatientId,
    pub category: InvoiceCategory,
    pub total: Decimal,
    pub currency: String,
    pub status: InvoiceStatus,
    pub issued_at: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ClinicalReference>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            patient_id: invoice.patient_id,
            category: invoice.category,
            total: invoice.total.amount(),
            currency: invoice.total.currency().code().to_string(),
            status: invoice.status,
            issued_at: invoice.issued_at,
            due_date: invoice.due_date,
            paid_at: invoice.paid_at,
            reference: invoice.reference,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    pub id: SettlementId,
    pub invoice_id: InvoiceId,
    pub amount: Decimal,
    pub currency: String,
    pub method: SettlementMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    pub settled_at: DateTime<Utc>,
}

impl From<Settlement> for SettlementResponse {
    fn from(settlement: Settlement) -> Self {
        Self {
            id: settlement.id,
            invoice_id: settlement.invoice_id,
            amount: settlement.amount.amount(),
            currency: settlement.amount.currency().code().to_string(),
            method: settlement.method,
            external_reference: settlement.external_reference,
            settled_at: settlement.settled_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceStatusResponse {
    pub invoice_id: InvoiceId,
    pub status: InvoiceStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<InvoiceStatusView> for InvoiceStatusResponse {
    fn from(view: InvoiceStatusView) -> Self {
        Self {
            invoice_id: view.invoice_id,
            status: view.status,
            paid_at: view.paid_at,
        }
    }
}
