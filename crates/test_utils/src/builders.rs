//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible
//! defaults. Tests specify only the fields they care about.

use chrono::{DateTime, Duration, Utc};

use core_kernel::{MedicineId, Money, PatientId, PrescriptionId, RoomId};
use domain_admissions::{InpatientStay, Room, RoomClass};
use domain_pharmacy::Medicine;

use crate::fixtures::MoneyFixtures;

/// Builder for medicine catalogue entries
pub struct MedicineBuilder {
    id: MedicineId,
    name: String,
    unit_price: Money,
    stock: u32,
}

impl Default for MedicineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MedicineBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            id: MedicineId::new(),
            name: "Paracetamol 500mg".to_string(),
            unit_price: MoneyFixtures::rp(10_000),
            stock: 100,
        }
    }

    /// Sets the medicine ID
    pub fn with_id(mut self, id: MedicineId) -> Self {
        self.id = id;
        self
    }

    /// Sets the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the unit price in whole rupiah
    pub fn with_price(mut self, rupiah: i64) -> Self {
        self.unit_price = MoneyFixtures::rp(rupiah);
        self
    }

    /// Sets the on-hand stock
    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    /// Builds the medicine
    pub fn build(self) -> Medicine {
        Medicine::new(self.id, self.name, self.unit_price, self.stock)
    }
}

/// Builder for an inpatient stay together with its room
pub struct StayBuilder {
    patient_id: PatientId,
    room_class: RoomClass,
    room_number: String,
    admitted_at: DateTime<Utc>,
    prescription_id: Option<PrescriptionId>,
}

impl Default for StayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StayBuilder {
    /// Creates a new builder: a Class 3 stay admitted two days ago
    pub fn new() -> Self {
        Self {
            patient_id: PatientId::new(),
            room_class: RoomClass::Class3,
            room_number: "C3-01".to_string(),
            admitted_at: Utc::now() - Duration::days(2),
            prescription_id: None,
        }
    }

    /// Sets the patient
    pub fn with_patient(mut self, patient_id: PatientId) -> Self {
        self.patient_id = patient_id;
        self
    }

    /// Sets the room class and number
    pub fn with_room(mut self, class: RoomClass, number: impl Into<String>) -> Self {
        self.room_class = class;
        self.room_number = number.into();
        self
    }

    /// Sets the admission timestamp
    pub fn admitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.admitted_at = at;
        self
    }

    /// Sets the admission to a number of days before now
    pub fn admitted_days_ago(mut self, days: i64) -> Self {
        self.admitted_at = Utc::now() - Duration::days(days);
        self
    }

    /// Links a prescription to the stay
    pub fn with_prescription(mut self, prescription_id: PrescriptionId) -> Self {
        self.prescription_id = Some(prescription_id);
        self
    }

    /// Builds the room and the stay occupying it
    pub fn build(self) -> (Room, InpatientStay) {
        let room = Room::new(RoomId::new(), self.room_number, self.room_class);
        let mut stay = InpatientStay::admit(self.patient_id, room.id, self.admitted_at);
        if let Some(rx) = self.prescription_id {
            stay = stay.with_prescription(rx);
        }
        (room, stay)
    }
}
