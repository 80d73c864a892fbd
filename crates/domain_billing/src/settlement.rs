//! Settlement records
//!
//! A settlement is a recorded payment event against exactly one invoice.
//! Settlements are created only by the payment processor, in the same
//! transaction that marks the invoice paid, so an invoice can never be Paid
//! without its settlement or vice versa.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{InvoiceId, Money, SettlementId};

/// Settlement method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementMethod {
    /// Bank transfer
    BankTransfer,
    /// QR code scanned at the cashier or bedside
    QrCode,
    /// Cash
    Cash,
    /// Credit card
    CreditCard,
    /// Debit card
    DebitCard,
    /// National or private insurance program
    InsuranceProgram,
}

/// A recorded payment against an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    /// Unique identifier
    pub id: SettlementId,
    /// Invoice being settled
    pub invoice_id: InvoiceId,
    /// Amount paid; always equals the invoice total
    pub amount: Money,
    /// Settlement method
    pub method: SettlementMethod,
    /// External reference (bank ref, QR transaction id)
    pub external_reference: Option<String>,
    /// When the payment was recorded
    pub settled_at: DateTime<Utc>,
}

impl Settlement {
    /// Creates a new settlement record
    pub fn new(invoice_id: InvoiceId, amount: Money, method: SettlementMethod) -> Self {
        Self {
            id: SettlementId::new_v7(),
            invoice_id,
            amount,
            method,
            external_reference: None,
            settled_at: Utc::now(),
        }
    }

    /// Sets the external reference
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.external_reference = Some(reference.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn test_settlement_new() {
        let invoice_id = InvoiceId::new_v7();
        let settlement = Settlement::new(
            invoice_id,
            Money::new(dec!(25_000), Currency::IDR),
            SettlementMethod::Cash,
        );

        assert_eq!(settlement.invoice_id, invoice_id);
        assert_eq!(settlement.method, SettlementMethod::Cash);
        assert!(settlement.external_reference.is_none());
    }

    #[test]
    fn test_settlement_with_reference() {
        let settlement = Settlement::new(
            InvoiceId::new_v7(),
            Money::new(dec!(150_000), Currency::IDR),
            SettlementMethod::QrCode,
        )
        .with_reference("QR-20240301-0042");

        assert_eq!(
            settlement.external_reference.as_deref(),
            Some("QR-20240301-0042")
        );
    }

    #[test]
    fn test_all_settlement_methods_serialize() {
        let methods = [
            SettlementMethod::BankTransfer,
            SettlementMethod::QrCode,
            SettlementMethod::Cash,
            SettlementMethod::CreditCard,
            SettlementMethod::DebitCard,
            SettlementMethod::InsuranceProgram,
        ];

        for method in methods {
            let json = serde_json::to_string(&method).unwrap();
            let back: SettlementMethod = serde_json::from_str(&json).unwrap();
            assert_eq!(back, method);
        }
    }
}
