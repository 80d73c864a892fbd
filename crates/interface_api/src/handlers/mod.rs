//! Request handlers

pub mod admissions;
pub mod billing;
pub mod health;
pub mod pharmacy;
