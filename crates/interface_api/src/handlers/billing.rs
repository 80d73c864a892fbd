//! Billing and settlement handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use core_kernel::Money;
use domain_billing::InvoiceStatus;

use crate::dto::billing::{
    ConsultationRequest, InvoiceListQuery, InvoiceResponse, InvoiceStatusResponse, SettleRequest,
    SettlementResponse,
};
use crate::{error::ApiError, AppState};

/// Creates a flat-fee consultation invoice
pub async fn bill_consultation(
    State(state): State<AppState>,
    Json(request): Json<ConsultationRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiError> {
    let invoice = state
        .payments
        .bill_consultation(request.patient_id.into(), request.appointment_id.into())
        .await?;

    Ok((StatusCode::CREATED, Json(invoice.into())))
}

/// Fetches an invoice
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state
        .store
        .invoice(invoice_id.into())
        .await
        .map_err(domain_billing::BillingError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("Invoice not found: {invoice_id}")))?;

    Ok(Json(invoice.into()))
}

/// Settles an invoice in the paying party's own session
///
/// The amount must equal the invoice total; a second settlement attempt
/// surfaces as 409 without recording anything.
pub async fn settle_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(request): Json<SettleRequest>,
) -> Result<Json<SettlementResponse>, ApiError> {
    let amount = Money::new(request.amount, state.policy.currency);
    let settlement = state
        .payments
        .settle(
            invoice_id.into(),
            amount,
            request.method,
            request.external_reference,
        )
        .await?;

    Ok(Json(settlement.into()))
}

/// Applies an out-of-band payment confirmation (scanned QR code)
pub async fn confirm_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<SettlementResponse>, ApiError> {
    let settlement = state.payments.confirm_external(invoice_id.into()).await?;
    Ok(Json(settlement.into()))
}

/// Current settlement status of an invoice; clients poll this while a QR
/// code is on screen
pub async fn invoice_status(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceStatusResponse>, ApiError> {
    let view = state.payments.check_status(invoice_id.into()).await?;
    Ok(Json(view.into()))
}

/// Lists a patient's invoices, newest first
pub async fn list_patient_invoices(
    State(state): State<AppState>,
    Path(patient_id): Path<Uuid>,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Json<Vec<InvoiceResponse>>, ApiError> {
    let status = match query.status.as_deref() {
        None => None,
        Some("unpaid") => Some(InvoiceStatus::Unpaid),
        Some("paid") => Some(InvoiceStatus::Paid),
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "unknown status filter: {other}"
            )))
        }
    };

    let invoices = state
        .payments
        .invoices_for_patient(patient_id.into(), status)
        .await?;

    Ok(Json(invoices.into_iter().map(Into::into).collect()))
}
