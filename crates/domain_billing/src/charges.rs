//! Charge calculation
//!
//! Pure, side-effect-free charge computation from heterogeneous sources:
//! room-days, medication lines, and the flat consultation fee. Inputs are
//! pre-validated by callers; nothing here touches storage.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, Money};
use domain_admissions::RoomClass;
use domain_pharmacy::PrescriptionLine;

/// Milliseconds per billable day
const DAY_MS: i64 = 86_400_000;

/// Number of billable days for a stay: `max(1, ceil(duration / 1 day))`
///
/// A stay discharged the same calendar day as admission still bills one
/// full day.
pub fn billable_days(admitted_at: DateTime<Utc>, discharged_at: DateTime<Utc>) -> i64 {
    let ms = (discharged_at - admitted_at).num_milliseconds();
    if ms <= 0 {
        return 1;
    }
    // Ceiling division, then the one-day floor
    ((ms + DAY_MS - 1) / DAY_MS).max(1)
}

/// Billing tariff policy
///
/// The room-class daily-rate table and the flat fees are policy data,
/// externally configurable; the calculators below are pure functions over it.
#[derive(Debug, Clone)]
pub struct ChargePolicy {
    /// Operating currency for all tariffs
    pub currency: Currency,
    /// Room class -> daily rate
    pub daily_rates: HashMap<RoomClass, Money>,
    /// Flat consultation fee
    pub consultation_fee: Money,
    /// Days between invoice issue and due date
    pub invoice_due_days: i64,
}

impl Default for ChargePolicy {
    fn default() -> Self {
        let currency = Currency::IDR;
        let daily_rates = HashMap::from([
            (RoomClass::Vip, Money::new(dec!(500_000), currency)),
            (RoomClass::Class1, Money::new(dec!(300_000), currency)),
            (RoomClass::Class2, Money::new(dec!(200_000), currency)),
            (RoomClass::Class3, Money::new(dec!(100_000), currency)),
        ]);

        Self {
            currency,
            daily_rates,
            consultation_fee: Money::new(dec!(150_000), currency),
            invoice_due_days: 3,
        }
    }
}

impl ChargePolicy {
    /// Daily rate for a room class
    ///
    /// A class missing from the table rates to zero rather than erroring.
    /// This preserves observed billing behavior for misconfigured rooms and
    /// is logged so the gap stays visible.
    pub fn daily_rate(&self, class: RoomClass) -> Money {
        match self.daily_rates.get(&class) {
            Some(rate) => *rate,
            None => {
                tracing::warn!(
                    class = class.label(),
                    "no daily rate configured for room class, billing zero"
                );
                Money::zero(self.currency)
            }
        }
    }

    /// Room-stay charge: daily rate times billable days
    pub fn room_charge(
        &self,
        class: RoomClass,
        admitted_at: DateTime<Utc>,
        discharged_at: DateTime<Utc>,
    ) -> Money {
        let days = billable_days(admitted_at, discharged_at);
        self.daily_rate(class).multiply(Decimal::from(days))
    }

    /// Medication charge: sum of line totals from snapshotted unit prices
    pub fn medication_charge(&self, lines: &[PrescriptionLine]) -> Money {
        lines
            .iter()
            .fold(Money::zero(self.currency), |acc, line| acc + line.total())
    }
}
