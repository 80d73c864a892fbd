//! Admissions handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use domain_billing::DischargeRequest;

use crate::dto::admissions::{DischargeRequestDto, DischargeResponse};
use crate::{error::ApiError, AppState};

/// Discharges an inpatient stay
///
/// Marks the stay discharged and creates its end-of-stay invoice in one
/// atomic step. A repeated discharge surfaces as 409 and bills nothing.
pub async fn discharge(
    State(state): State<AppState>,
    Path(stay_id): Path<Uuid>,
    Json(request): Json<DischargeRequestDto>,
) -> Result<Json<DischargeResponse>, ApiError> {
    let outcome = state
        .discharge
        .discharge(DischargeRequest {
            stay_id: stay_id.into(),
            requested_by: request.requested_by,
            discharged_at: request.discharged_at,
        })
        .await?;

    Ok(Json(outcome.into()))
}
