//! Integration tests for the dispensing and discharge services
//!
//! These run against the in-memory store, which implements the same
//! transactional contract as the PostgreSQL adapter: all-or-nothing commits
//! and conditional stock debits.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

use core_kernel::{Currency, DoctorId, MedicineId, Money, PatientId, RoomId};
use domain_billing::{
    BillingError, BillingStore, ChargePolicy, DischargeRequest, DischargeService, DispenseLine,
    DispenseRequest, DispensingService, InvoiceCategory, InvoiceStatus,
};
use domain_admissions::{AdmissionsError, InpatientStay, Room, RoomClass, StayStatus};
use domain_pharmacy::{Medicine, PharmacyError, Prescription, PrescriptionLine};
use infra_db::MemoryStore;

fn medicine(name: &str, price: i64, stock: u32) -> Medicine {
    Medicine::new(
        MedicineId::new(),
        name,
        Money::new(rust_decimal::Decimal::from(price), Currency::IDR),
        stock,
    )
}

fn line(medicine_id: MedicineId, quantity: u32) -> DispenseLine {
    DispenseLine {
        medicine_id,
        quantity,
        instructions: None,
    }
}

fn dispense_request(patient_id: PatientId, lines: Vec<DispenseLine>) -> DispenseRequest {
    DispenseRequest {
        patient_id,
        prescriber_id: DoctorId::new(),
        lines,
        note: None,
    }
}

#[tokio::test]
async fn test_dispense_debits_stock_and_creates_one_invoice() {
    let store = Arc::new(MemoryStore::new());
    let paracetamol = medicine("Paracetamol 500mg", 10_000, 10);
    let amoxicillin = medicine("Amoxicillin 500mg", 5_000, 10);
    let (para_id, amox_id) = (paracetamol.id, amoxicillin.id);
    store.seed_medicine(paracetamol).await;
    store.seed_medicine(amoxicillin).await;

    let service = DispensingService::new(store.clone(), ChargePolicy::default());
    let patient_id = PatientId::new();

    let outcome = service
        .dispense(dispense_request(
            patient_id,
            vec![line(para_id, 2), line(amox_id, 1)],
        ))
        .await
        .unwrap();

    let invoice = outcome.invoice.expect("non-zero total must be invoiced");
    assert_eq!(invoice.total.amount(), dec!(25_000));
    assert_eq!(invoice.category, InvoiceCategory::Medication);
    assert_eq!(invoice.status, InvoiceStatus::Unpaid);
    assert_eq!(invoice.patient_id, patient_id);

    assert_eq!(store.stock_of(para_id).await, Some(8));
    assert_eq!(store.stock_of(amox_id).await, Some(9));

    // The committed prescription's lines are marked billed
    let stored = store
        .prescription(outcome.prescription.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.lines.len(), 2);
    assert!(stored.lines.iter().all(|l| l.billed));
}

#[tokio::test]
async fn test_dispense_insufficient_stock_rolls_back_everything() {
    let store = Arc::new(MemoryStore::new());
    let plenty = medicine("Paracetamol 500mg", 10_000, 10);
    let scarce = medicine("Insulin pen", 90_000, 1);
    let (plenty_id, scarce_id) = (plenty.id, scarce.id);
    store.seed_medicine(plenty).await;
    store.seed_medicine(scarce).await;

    let service = DispensingService::new(store.clone(), ChargePolicy::default());
    let patient_id = PatientId::new();

    let result = service
        .dispense(dispense_request(
            patient_id,
            vec![line(plenty_id, 2), line(scarce_id, 5)],
        ))
        .await;

    assert!(matches!(
        result,
        Err(BillingError::Pharmacy(PharmacyError::InsufficientStock {
            requested: 5,
            available: 1,
            ..
        }))
    ));

    // The successful first-line debit was rolled back with the rest
    assert_eq!(store.stock_of(plenty_id).await, Some(10));
    assert_eq!(store.stock_of(scarce_id).await, Some(1));
    assert!(store
        .invoices_by_patient(patient_id, None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_dispense_unknown_medicine_rolls_back() {
    let store = Arc::new(MemoryStore::new());
    let known = medicine("Paracetamol 500mg", 10_000, 10);
    let known_id = known.id;
    store.seed_medicine(known).await;

    let service = DispensingService::new(store.clone(), ChargePolicy::default());
    let result = service
        .dispense(dispense_request(
            PatientId::new(),
            vec![line(known_id, 2), line(MedicineId::new(), 1)],
        ))
        .await;

    assert!(matches!(
        result,
        Err(BillingError::Pharmacy(PharmacyError::MedicineNotFound(_)))
    ));
    assert_eq!(store.stock_of(known_id).await, Some(10));
}

#[tokio::test]
async fn test_dispense_rejects_empty_and_zero_quantity_lines() {
    let store = Arc::new(MemoryStore::new());
    let med = medicine("Paracetamol 500mg", 10_000, 10);
    let med_id = med.id;
    store.seed_medicine(med).await;

    let service = DispensingService::new(store.clone(), ChargePolicy::default());

    let empty = service
        .dispense(dispense_request(PatientId::new(), vec![]))
        .await;
    assert!(matches!(
        empty,
        Err(BillingError::Pharmacy(PharmacyError::EmptyPrescription))
    ));

    let zero = service
        .dispense(dispense_request(PatientId::new(), vec![line(med_id, 0)]))
        .await;
    assert!(matches!(
        zero,
        Err(BillingError::Pharmacy(PharmacyError::InvalidQuantity { .. }))
    ));
    assert_eq!(store.stock_of(med_id).await, Some(10));
}

#[tokio::test]
async fn test_concurrent_dispense_never_oversells() {
    let store = Arc::new(MemoryStore::new());
    let med = medicine("Insulin pen", 90_000, 5);
    let med_id = med.id;
    store.seed_medicine(med).await;

    let service = Arc::new(DispensingService::new(
        store.clone(),
        ChargePolicy::default(),
    ));

    let mut handles = Vec::new();
    for _ in 0..2 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .dispense(dispense_request(PatientId::new(), vec![line(med_id, 3)]))
                .await
        }));
    }

    let mut ok = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(BillingError::Pharmacy(PharmacyError::InsufficientStock { .. })) => {
                insufficient += 1
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    // 5 on hand, two requests for 3: exactly one can succeed
    assert_eq!(ok, 1);
    assert_eq!(insufficient, 1);
    assert_eq!(store.stock_of(med_id).await, Some(2));
}

#[tokio::test]
async fn test_zero_total_dispense_records_prescription_without_invoice() {
    let store = Arc::new(MemoryStore::new());
    let free = medicine("Oralit sachet", 0, 10);
    let free_id = free.id;
    store.seed_medicine(free).await;

    let service = DispensingService::new(store.clone(), ChargePolicy::default());
    let patient_id = PatientId::new();

    let outcome = service
        .dispense(dispense_request(patient_id, vec![line(free_id, 2)]))
        .await
        .unwrap();

    assert!(outcome.invoice.is_none());
    assert_eq!(store.stock_of(free_id).await, Some(8));
    assert!(store
        .invoices_by_patient(patient_id, None)
        .await
        .unwrap()
        .is_empty());

    // Lines stay unbilled so a later discharge can still pick them up
    let stored = store
        .prescription(outcome.prescription.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.lines.iter().all(|l| !l.billed));
}

#[tokio::test]
async fn test_discharge_bills_room_and_unbilled_medication_together() {
    let store = Arc::new(MemoryStore::new());

    let room = Room::new(RoomId::new(), "VIP-01", RoomClass::Vip);
    let room_id = room.id;
    store.seed_room(room).await;

    let mut prescription = Prescription::new(PatientId::new(), DoctorId::new());
    prescription.add_line(PrescriptionLine::new(
        MedicineId::new(),
        2,
        Money::new(dec!(10_000), Currency::IDR),
    ));
    let rx_id = prescription.id;

    let admitted_at = Utc::now() - Duration::days(3);
    let stay = InpatientStay::admit(prescription.patient_id, room_id, admitted_at)
        .with_prescription(rx_id);
    let stay_id = stay.id;
    let patient_id = stay.patient_id;
    store.seed_prescription(prescription).await;
    store.seed_stay(stay).await;

    let service = DischargeService::new(store.clone(), ChargePolicy::default());
    let outcome = service
        .discharge(DischargeRequest {
            stay_id,
            requested_by: Some("ward-admin".into()),
            discharged_at: Some(admitted_at + Duration::days(3)),
        })
        .await
        .unwrap();

    // 3 days of VIP at 500k plus 2 x 10k of unbilled medication
    assert_eq!(outcome.invoice.total.amount(), dec!(1_520_000));
    assert_eq!(outcome.invoice.category, InvoiceCategory::InpatientStay);
    assert_eq!(outcome.stay.status, StayStatus::Discharged);

    let stored_stay = store.stay(stay_id).await.unwrap().unwrap();
    assert!(!stored_stay.is_active());

    let stored_rx = store.prescription(rx_id).await.unwrap().unwrap();
    assert!(stored_rx.lines.iter().all(|l| l.billed));

    let invoices = store.invoices_by_patient(patient_id, None).await.unwrap();
    assert_eq!(invoices.len(), 1);
}

#[tokio::test]
async fn test_discharge_skips_already_billed_medication() {
    let store = Arc::new(MemoryStore::new());

    let room = Room::new(RoomId::new(), "C2-07", RoomClass::Class2);
    let room_id = room.id;
    store.seed_room(room).await;

    let mut prescription = Prescription::new(PatientId::new(), DoctorId::new());
    let mut billed_line = PrescriptionLine::new(
        MedicineId::new(),
        4,
        Money::new(dec!(25_000), Currency::IDR),
    );
    billed_line.billed = true;
    prescription.add_line(billed_line);
    let rx_id = prescription.id;

    let admitted_at = Utc::now() - Duration::days(1);
    let stay = InpatientStay::admit(prescription.patient_id, room_id, admitted_at)
        .with_prescription(rx_id);
    let stay_id = stay.id;
    store.seed_prescription(prescription).await;
    store.seed_stay(stay).await;

    let service = DischargeService::new(store.clone(), ChargePolicy::default());
    let outcome = service
        .discharge(DischargeRequest {
            stay_id,
            requested_by: None,
            discharged_at: Some(admitted_at + Duration::days(1)),
        })
        .await
        .unwrap();

    // Room only: the medication was already invoiced at dispense time
    assert_eq!(outcome.invoice.total.amount(), dec!(200_000));
}

#[tokio::test]
async fn test_discharge_twice_conflicts_and_bills_once() {
    let store = Arc::new(MemoryStore::new());

    let room = Room::new(RoomId::new(), "C3-11", RoomClass::Class3);
    let room_id = room.id;
    store.seed_room(room).await;

    let admitted_at = Utc::now() - Duration::days(2);
    let stay = InpatientStay::admit(PatientId::new(), room_id, admitted_at);
    let stay_id = stay.id;
    let patient_id = stay.patient_id;
    store.seed_stay(stay).await;

    let service = DischargeService::new(store.clone(), ChargePolicy::default());
    let request = DischargeRequest {
        stay_id,
        requested_by: None,
        discharged_at: None,
    };

    service.discharge(request.clone()).await.unwrap();
    let second = service.discharge(request).await;

    assert!(matches!(
        second,
        Err(BillingError::Admissions(AdmissionsError::AlreadyDischarged(_)))
    ));
    let invoices = store.invoices_by_patient(patient_id, None).await.unwrap();
    assert_eq!(invoices.len(), 1);
}

#[tokio::test]
async fn test_discharge_unknown_stay() {
    let store = Arc::new(MemoryStore::new());
    let service = DischargeService::new(store, ChargePolicy::default());

    let result = service
        .discharge(DischargeRequest {
            stay_id: core_kernel::StayId::new(),
            requested_by: None,
            discharged_at: None,
        })
        .await;

    assert!(matches!(result, Err(BillingError::StayNotFound(_))));
}
