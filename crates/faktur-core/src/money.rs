//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A grand total that must equal SUM(line totals) cannot tolerate         │
//! │  that: two code paths computing the "same" float diverge.              │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    price_cents × quantity is exact; sums are exact; the persisted      │
//! │    grand total and the SQL SUM agree bit-for-bit.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use faktur_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let line_total = price * 3;          // $32.97
//! assert_eq!(line_total.cents(), 3297);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: room for credit notes later, and SQLite INTEGER is i64
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **No float constructor**: `Money::from_cents` is the only way in
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero amount.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Whether the amount is strictly positive.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

/// Line-total arithmetic: unit price × quantity.
impl Mul<i64> for Money {
    type Output = Money;

    fn mul(self, quantity: i64) -> Money {
        Money(self.0 * quantity)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

/// Display as major.minor, e.g. `10.99`. For logs and diagnostics only;
/// the API always ships raw cents.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total_arithmetic() {
        let price = Money::from_cents(1000);
        assert_eq!((price * 2).cents(), 2000);
        assert_eq!((price * 1).cents(), 1000);
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_cents(2000), Money::from_cents(500)]
            .into_iter()
            .sum();
        assert_eq!(total.cents(), 2500);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
    }

    #[test]
    fn test_serde_transparent() {
        let m = Money::from_cents(2500);
        assert_eq!(serde_json::to_string(&m).unwrap(), "2500");
    }
}
