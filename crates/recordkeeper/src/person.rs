//! Person records.
//!
//! A [`Person`] is one row of the record file. Field names serialize in
//! `PascalCase` so the CSV header reads `Id,FirstName,LastName,Phone,City,Balance`.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// One person entry in the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Person {
    /// Caller-assigned identifier, unique within the record book.
    pub id: i32,
    /// Given name. Never blank.
    pub first_name: String,
    /// Family name. Never blank.
    pub last_name: String,
    /// Phone number, ASCII digits only.
    pub phone: String,
    /// City of residence; may be empty.
    pub city: String,
    /// Account balance, never negative.
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Decimal,
}

impl Person {
    /// Full display name, `first last`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.id,
            self.first_name,
            self.last_name,
            self.phone,
            self.city,
            format_amount(self.balance)
        )
    }
}

/// Format an amount with two decimals and `,` thousands separators.
///
/// `1234.5` renders as `1,234.50`.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{fraction}")
}
