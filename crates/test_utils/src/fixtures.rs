//! Pre-built Test Fixtures
//!
//! Ready-to-use test data for the billing test suites, plus a fully seeded
//! in-memory store for API-level tests.

use std::sync::Arc;

use rust_decimal::Decimal;

use core_kernel::{Currency, MedicineId, Money, PatientId, RoomId, StayId};
use domain_admissions::RoomClass;
use infra_db::MemoryStore;

use crate::builders::{MedicineBuilder, StayBuilder};

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Whole-rupiah amount
    pub fn rp(amount: i64) -> Money {
        Money::new(Decimal::from(amount), Currency::IDR)
    }

    /// The flat consultation fee
    pub fn consultation_fee() -> Money {
        Self::rp(150_000)
    }

    /// One day of VIP room tariff
    pub fn vip_daily_rate() -> Money {
        Self::rp(500_000)
    }

    /// A zero amount
    pub fn rp_zero() -> Money {
        Money::zero(Currency::IDR)
    }
}

/// Identifiers of the entities a seeded store contains
#[derive(Debug, Clone, Copy)]
pub struct SeededIds {
    pub patient: PatientId,
    /// Rp 10,000 per unit, 50 on hand
    pub paracetamol: MedicineId,
    /// Rp 5,000 per unit, 50 on hand
    pub amoxicillin: MedicineId,
    /// Rp 90,000 per unit, 2 on hand
    pub insulin: MedicineId,
    /// The VIP room the seeded stay occupies
    pub room: RoomId,
    /// Active stay for `patient`, admitted three days ago
    pub stay: StayId,
}

/// Seeds an in-memory store with the standard billing test scenario
pub async fn seeded_store() -> (Arc<MemoryStore>, SeededIds) {
    let store = Arc::new(MemoryStore::new());
    let patient = PatientId::new();

    let paracetamol = MedicineBuilder::new()
        .with_name("Paracetamol 500mg")
        .with_price(10_000)
        .with_stock(50)
        .build();
    let amoxicillin = MedicineBuilder::new()
        .with_name("Amoxicillin 500mg")
        .with_price(5_000)
        .with_stock(50)
        .build();
    let insulin = MedicineBuilder::new()
        .with_name("Insulin pen")
        .with_price(90_000)
        .with_stock(2)
        .build();

    let (room, stay) = StayBuilder::new()
        .with_patient(patient)
        .with_room(RoomClass::Vip, "VIP-01")
        .admitted_days_ago(3)
        .build();

    let ids = SeededIds {
        patient,
        paracetamol: paracetamol.id,
        amoxicillin: amoxicillin.id,
        insulin: insulin.id,
        room: room.id,
        stay: stay.id,
    };

    store.seed_medicine(paracetamol).await;
    store.seed_medicine(amoxicillin).await;
    store.seed_medicine(insulin).await;
    store.seed_room(room).await;
    store.seed_stay(stay).await;

    (store, ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_store_contents() {
        let (store, ids) = seeded_store().await;

        assert_eq!(store.stock_of(ids.paracetamol).await, Some(50));
        assert_eq!(store.stock_of(ids.insulin).await, Some(2));

        use domain_billing::BillingStore;
        let stay = store.stay(ids.stay).await.unwrap().unwrap();
        assert!(stay.is_active());
        assert_eq!(stay.patient_id, ids.patient);
    }
}
