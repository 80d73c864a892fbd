//! Admissions domain errors

use core_kernel::{RoomId, StayId};
use thiserror::Error;

/// Errors that can occur in the admissions domain
#[derive(Debug, Error)]
pub enum AdmissionsError {
    /// Stay not found
    #[error("Stay not found: {0}")]
    StayNotFound(StayId),

    /// Room not found
    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),

    /// The stay has already been discharged
    #[error("Stay {0} is already discharged")]
    AlreadyDischarged(StayId),

    /// Discharge timestamp precedes admission
    #[error("Discharge time precedes admission for stay {0}")]
    DischargeBeforeAdmission(StayId),
}
