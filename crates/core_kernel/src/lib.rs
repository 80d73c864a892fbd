//! Core Kernel - Foundational types for the hospital billing system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers for clinical and billing entities
//! - The port error type shared by all storage adapters

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError};
pub use identifiers::{
    PatientId, DoctorId, AppointmentId, MedicineId, PrescriptionId,
    RoomId, StayId, InvoiceId, SettlementId,
};
pub use ports::{PortError, DomainPort};
