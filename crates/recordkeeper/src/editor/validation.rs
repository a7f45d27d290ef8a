//! Field rules for person records.
//!
//! Every check trims its input first. Failures carry the message shown to
//! the user before the prompt repeats.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::person::Person;

/// A rejected field value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The id is not an integer.
    #[error("ID must be a valid number.")]
    InvalidId,

    /// Another record already uses this id.
    #[error("ID {0} already exists. Please enter a unique ID.")]
    DuplicateId(i32),

    /// A required text field is blank.
    #[error("{field} cannot be empty.")]
    Blank {
        /// Human name of the field.
        field: &'static str,
    },

    /// The phone is blank or has a non-digit character.
    #[error("Phone must be a non-empty numeric value.")]
    InvalidPhone,

    /// The balance is not a number.
    #[error("Balance must be a valid number.")]
    InvalidBalance,

    /// The balance is below zero.
    #[error("Balance must be a positive number (or zero).")]
    NegativeBalance,
}

/// Parse a record id.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidId`] if `input` is not an `i32`.
pub fn parse_id(input: &str) -> Result<i32, ValidationError> {
    input
        .trim()
        .parse::<i32>()
        .map_err(|_| ValidationError::InvalidId)
}

/// Parse an id for a new record; it must not be used in `people`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidId`] or [`ValidationError::DuplicateId`].
pub fn new_id(input: &str, people: &[Person]) -> Result<i32, ValidationError> {
    let id = parse_id(input)?;
    if people.iter().any(|person| person.id == id) {
        return Err(ValidationError::DuplicateId(id));
    }
    Ok(id)
}

/// A required name field.
///
/// # Errors
///
/// Returns [`ValidationError::Blank`] for blank input.
pub fn name(input: &str, field: &'static str) -> Result<String, ValidationError> {
    let value = input.trim();
    if value.is_empty() {
        return Err(ValidationError::Blank { field });
    }
    Ok(value.to_string())
}

/// A phone number: ASCII digits only, at least one.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidPhone`].
pub fn phone(input: &str) -> Result<String, ValidationError> {
    let value = input.trim();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidPhone);
    }
    Ok(value.to_string())
}

/// A non-negative balance.
///
/// Accepts `1234.5`, `1,234.50`, `$1,234.50`, `+12`, `1.5e3`, and the
/// comma-decimal form `1.234,50`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidBalance`] or
/// [`ValidationError::NegativeBalance`].
pub fn balance(input: &str) -> Result<Decimal, ValidationError> {
    let value = parse_amount(input).ok_or(ValidationError::InvalidBalance)?;
    if value < Decimal::ZERO {
        return Err(ValidationError::NegativeBalance);
    }
    if value.is_zero() {
        return Ok(Decimal::ZERO);
    }
    Ok(value)
}

fn parse_amount(input: &str) -> Option<Decimal> {
    let text = input.trim();
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let digits = unsigned.strip_prefix('$').unwrap_or(unsigned).trim_start();
    if digits.is_empty() || digits.starts_with(|c: char| c == '-' || c == '+') {
        return None;
    }

    parse_point_decimal(digits)
        .or_else(|| parse_comma_decimal(digits))
        .map(|amount| if negative { -amount } else { amount })
}

/// `1,234.56`: `,` groups digits, `.` marks the fraction.
fn parse_point_decimal(text: &str) -> Option<Decimal> {
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text, None),
    };
    if fraction.is_some_and(|f| f.contains(',')) || whole.starts_with(',') {
        return None;
    }

    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    decimal_from(&cleaned)
}

/// `1.234,56`: `.` groups digits, `,` marks the fraction.
fn parse_comma_decimal(text: &str) -> Option<Decimal> {
    let (whole, fraction) = text.rsplit_once(',')?;
    if fraction.contains('.') || whole.contains(',') || whole.starts_with('.') {
        return None;
    }

    let cleaned = format!("{}.{fraction}", whole.replace('.', ""));
    decimal_from(&cleaned)
}

fn decimal_from(text: &str) -> Option<Decimal> {
    if text.contains(|c: char| c == 'e' || c == 'E') {
        return Decimal::from_scientific(text).ok();
    }
    Decimal::from_str(text).ok()
}
