//! Pharmacy handlers

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::dto::pharmacy::{DispenseRequestDto, DispenseResponse};
use crate::{error::ApiError, AppState};

/// Dispenses a prescription
///
/// Atomic across all lines: either every stock debit succeeds and one
/// Medication invoice is created, or nothing changes. Insufficient stock
/// surfaces as 409, unknown medicines as 404.
pub async fn dispense(
    State(state): State<AppState>,
    Json(request): Json<DispenseRequestDto>,
) -> Result<(StatusCode, Json<DispenseResponse>), ApiError> {
    request.validate()?;

    let outcome = state.dispensing.dispense(request.into_domain()).await?;
    Ok((StatusCode::CREATED, Json(outcome.into())))
}
