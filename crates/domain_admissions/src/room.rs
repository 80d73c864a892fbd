//! Rooms and room classes

use serde::{Deserialize, Serialize};

use core_kernel::RoomId;

/// Room class, the key into the billing policy's daily-rate table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomClass {
    Vip,
    Class1,
    Class2,
    Class3,
}

impl RoomClass {
    /// Returns the display label used on invoices and ward boards
    pub fn label(&self) -> &'static str {
        match self {
            RoomClass::Vip => "VIP",
            RoomClass::Class1 => "Class 1",
            RoomClass::Class2 => "Class 2",
            RoomClass::Class3 => "Class 3",
        }
    }
}

/// An inpatient room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Unique identifier
    pub id: RoomId,
    /// Human-readable room number
    pub number: String,
    /// Room class
    pub class: RoomClass,
}

impl Room {
    /// Creates a new room
    pub fn new(id: RoomId, number: impl Into<String>, class: RoomClass) -> Self {
        Self {
            id,
            number: number.into(),
            class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_class_labels() {
        assert_eq!(RoomClass::Vip.label(), "VIP");
        assert_eq!(RoomClass::Class3.label(), "Class 3");
    }

    #[test]
    fn test_room_class_serialization() {
        let json = serde_json::to_string(&RoomClass::Class1).unwrap();
        let back: RoomClass = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RoomClass::Class1);
    }
}
