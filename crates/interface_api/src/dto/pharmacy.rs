//! Pharmacy DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{MedicineId, PatientId, PrescriptionId};
use domain_billing::{DispenseLine, DispenseOutcome, DispenseRequest};
use domain_pharmacy::PrescriptionLine;

use super::billing::InvoiceResponse;

#[derive(Debug, Deserialize, Validate)]
pub struct DispenseRequestDto {
    pub patient_id: Uuid,
    pub prescriber_id: Uuid,
    #[validate(length(min = 1, message = "at least one medication line is required"))]
    pub lines: Vec<DispenseLineDto>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DispenseLineDto {
    pub medicine_id: Uuid,
    pub quantity: u32,
    pub instructions: Option<String>,
}

impl DispenseRequestDto {
    pub fn into_domain(self) -> DispenseRequest {
        DispenseRequest {
            patient_id: self.patient_id.into(),
            prescriber_id: self.prescriber_id.into(),
            lines: self
                .lines
                .into_iter()
                .map(|line| DispenseLine {
                    medicine_id: line.medicine_id.into(),
                    quantity: line.quantity,
                    instructions: line.instructions,
                })
                .collect(),
            note: self.note,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PrescriptionLineResponse {
    pub medicine_id: MedicineId,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl From<PrescriptionLine> for PrescriptionLineResponse {
    fn from(line: PrescriptionLine) -> Self {
        Self {
            medicine_id: line.medicine_id,
            quantity: line.quantity,
            unit_price: line.unit_price.amount(),
            line_total: line.total().amount(),
            instructions: line.instructions,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DispenseResponse {
    pub prescription_id: PrescriptionId,
    pub patient_id: PatientId,
    pub issued_at: DateTime<Utc>,
    pub lines: Vec<PrescriptionLineResponse>,
    /// Absent when the total charge was zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice: Option<InvoiceResponse>,
}

impl From<DispenseOutcome> for DispenseResponse {
    fn from(outcome: DispenseOutcome) -> Self {
        Self {
            prescription_id: outcome.prescription.id,
            patient_id: outcome.prescription.patient_id,
            issued_at: outcome.prescription.issued_at,
            lines: outcome
                .prescription
                .lines
                .into_iter()
                .map(Into::into)
                .collect(),
            invoice: outcome.invoice.map(Into::into),
        }
    }
}
