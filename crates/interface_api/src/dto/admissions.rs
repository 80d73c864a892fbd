//! Admissions DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{PatientId, RoomId, StayId};
use domain_admissions::{InpatientStay, StayStatus};
use domain_billing::DischargeOutcome;

use super::billing::InvoiceResponse;

#[derive(Debug, Default, Deserialize)]
pub struct DischargeRequestDto {
    /// Actor requesting the discharge, for the audit trail
    #[serde(default)]
    pub requested_by: Option<String>,
    /// Defaults to now
    #[serde(default)]
    pub discharged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct StayResponse {
    pub id: StayId,
    pub patient_id: PatientId,
    pub room_id: RoomId,
    pub admitted_at: DateTime<Utc>,
    pub discharged_at: Option<DateTime<Utc>>,
    pub status: StayStatus,
}

impl From<InpatientStay> for StayResponse {
    fn from(stay: InpatientStay) -> Self {
        Self {
            id: stay.id,
            patient_id: stay.patient_id,
            room_id: stay.room_id,
            admitted_at: stay.admitted_at,
            discharged_at: stay.discharged_at,
            status: stay.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DischargeResponse {
    pub stay: StayResponse,
    pub invoice: InvoiceResponse,
}

impl From<DischargeOutcome> for DischargeResponse {
    fn from(outcome: DischargeOutcome) -> Self {
        Self {
            stay: outcome.stay.into(),
            invoice: outcome.invoice.into(),
        }
    }
}
