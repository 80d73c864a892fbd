//! Medicine catalogue entries
//!
//! A medicine carries a unit price and an on-hand stock quantity. Stock is
//! mutated only through debits; the quantity never goes below zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{MedicineId, Money};

use crate::error::PharmacyError;

/// A dispensable medicine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    /// Unique identifier
    pub id: MedicineId,
    /// Display name
    pub name: String,
    /// Current unit price; prescriptions snapshot this at issuance
    pub unit_price: Money,
    /// On-hand stock quantity (never negative)
    pub stock: u32,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Medicine {
    /// Creates a new medicine
    pub fn new(id: MedicineId, name: impl Into<String>, unit_price: Money, stock: u32) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            unit_price,
            stock,
            created_at: now,
            updated_at: now,
        }
    }

    /// Debits stock, enforcing the non-negative invariant
    ///
    /// # Errors
    ///
    /// Returns `InsufficientStock` if the debit would take stock below zero;
    /// the quantity is left unchanged.
    pub fn debit(&mut self, quantity: u32) -> Result<(), PharmacyError> {
        if quantity > self.stock {
            return Err(PharmacyError::InsufficientStock {
                medicine_id: self.id,
                requested: quantity,
                available: self.stock,
            });
        }
        self.stock -= quantity;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Credits stock (restock delivery)
    pub fn credit(&mut self, quantity: u32) {
        self.stock += quantity;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn paracetamol(stock: u32) -> Medicine {
        Medicine::new(
            MedicineId::new(),
            "Paracetamol 500mg",
            Money::new(dec!(10000), Currency::IDR),
            stock,
        )
    }

    #[test]
    fn test_debit_within_stock() {
        let mut med = paracetamol(5);
        med.debit(3).unwrap();
        assert_eq!(med.stock, 2);
    }

    #[test]
    fn test_debit_entire_stock() {
        let mut med = paracetamol(5);
        med.debit(5).unwrap();
        assert_eq!(med.stock, 0);
    }

    #[test]
    fn test_debit_beyond_stock_leaves_quantity_unchanged() {
        let mut med = paracetamol(5);
        let result = med.debit(6);

        assert!(matches!(
            result,
            Err(PharmacyError::InsufficientStock {
                requested: 6,
                available: 5,
                ..
            })
        ));
        assert_eq!(med.stock, 5);
    }

    #[test]
    fn test_credit() {
        let mut med = paracetamol(2);
        med.credit(10);
        assert_eq!(med.stock, 12);
    }
}
