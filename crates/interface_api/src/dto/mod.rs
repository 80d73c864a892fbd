//! Request/response data transfer objects

pub mod admissions;
pub mod billing;
pub mod pharmacy;
