//! Admissions Domain - Rooms and Inpatient Stays
//!
//! This crate models inpatient admissions: which room a patient occupies,
//! when they were admitted, and when they were discharged. A stay moves
//! through exactly one transition, `Admitted -> Discharged`, and a patient
//! has at most one active stay at a time.
//!
//! Room classes map to daily tariffs in the billing policy; this crate only
//! carries the class itself.

pub mod room;
pub mod stay;
pub mod error;

pub use room::{Room, RoomClass};
pub use stay::{InpatientStay, StayStatus};
pub use error::AdmissionsError;
