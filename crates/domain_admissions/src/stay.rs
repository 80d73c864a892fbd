//! Inpatient stays
//!
//! A stay is a continuous admission-to-discharge period occupying one room.
//! While active its discharge timestamp is `None`; discharging is a one-way
//! transition and is only ever performed inside the discharge workflow's
//! transaction, together with invoice creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{PatientId, PrescriptionId, RoomId, StayId};

use crate::error::AdmissionsError;

/// Stay status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StayStatus {
    /// Patient is admitted; discharge timestamp is unset
    Admitted,
    /// Stay is complete (terminal)
    Discharged,
}

/// A continuous inpatient admission period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InpatientStay {
    /// Unique identifier
    pub id: StayId,
    /// Admitted patient
    pub patient_id: PatientId,
    /// Occupied room
    pub room_id: RoomId,
    /// Admission timestamp
    pub admitted_at: DateTime<Utc>,
    /// Discharge timestamp; `None` while the stay is active
    pub discharged_at: Option<DateTime<Utc>>,
    /// Status
    pub status: StayStatus,
    /// Prescription linked to this stay, if any
    pub prescription_id: Option<PrescriptionId>,
}

impl InpatientStay {
    /// Admits a patient to a room
    pub fn admit(patient_id: PatientId, room_id: RoomId, admitted_at: DateTime<Utc>) -> Self {
        Self {
            id: StayId::new_v7(),
            patient_id,
            room_id,
            admitted_at,
            discharged_at: None,
            status: StayStatus::Admitted,
            prescription_id: None,
        }
    }

    /// Links a prescription to this stay
    pub fn with_prescription(mut self, prescription_id: PrescriptionId) -> Self {
        self.prescription_id = Some(prescription_id);
        self
    }

    /// Returns true while the patient is still admitted
    pub fn is_active(&self) -> bool {
        self.discharged_at.is_none()
    }

    /// Discharges the patient
    ///
    /// # Errors
    ///
    /// - `AlreadyDischarged` if the stay is no longer active
    /// - `DischargeBeforeAdmission` if the timestamp precedes admission
    pub fn discharge(&mut self, at: DateTime<Utc>) -> Result<(), AdmissionsError> {
        if !self.is_active() {
            return Err(AdmissionsError::AlreadyDischarged(self.id));
        }
        if at < self.admitted_at {
            return Err(AdmissionsError::DischargeBeforeAdmission(self.id));
        }
        self.discharged_at = Some(at);
        self.status = StayStatus::Discharged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn active_stay() -> InpatientStay {
        InpatientStay::admit(PatientId::new(), RoomId::new(), Utc::now())
    }

    #[test]
    fn test_admit_is_active() {
        let stay = active_stay();
        assert!(stay.is_active());
        assert_eq!(stay.status, StayStatus::Admitted);
        assert!(stay.discharged_at.is_none());
    }

    #[test]
    fn test_discharge_transition() {
        let mut stay = active_stay();
        let at = stay.admitted_at + Duration::days(2);

        stay.discharge(at).unwrap();

        assert!(!stay.is_active());
        assert_eq!(stay.status, StayStatus::Discharged);
        assert_eq!(stay.discharged_at, Some(at));
    }

    #[test]
    fn test_discharge_twice_is_rejected() {
        let mut stay = active_stay();
        let at = stay.admitted_at + Duration::days(1);
        stay.discharge(at).unwrap();

        let result = stay.discharge(at + Duration::days(1));
        assert!(matches!(result, Err(AdmissionsError::AlreadyDischarged(_))));
        // First discharge timestamp is preserved
        assert_eq!(stay.discharged_at, Some(at));
    }

    #[test]
    fn test_discharge_before_admission_is_rejected() {
        let mut stay = active_stay();
        let result = stay.discharge(stay.admitted_at - Duration::hours(1));
        assert!(matches!(
            result,
            Err(AdmissionsError::DischargeBeforeAdmission(_))
        ));
        assert!(stay.is_active());
    }
}
