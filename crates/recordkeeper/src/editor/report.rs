//! Balance report grouped by city.

use std::cmp::Ordering;
use std::fmt::Write as _;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::person::{format_amount, Person};

/// Label used for records whose city is blank.
pub const UNASSIGNED_CITY: &str = "N/A";

/// Records sharing one city, with their balance subtotal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityGroup {
    /// City name, or [`UNASSIGNED_CITY`].
    pub city: String,
    /// Members in record-book order.
    pub people: Vec<Person>,
    /// Sum of member balances.
    pub subtotal: Decimal,
}

/// Per-city groups plus the grand total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityReport {
    /// Groups, [`UNASSIGNED_CITY`] first, then by city name.
    pub groups: Vec<CityGroup>,
    /// Sum of all subtotals.
    pub grand_total: Decimal,
}

/// A subtotal or the grand total does not fit in a [`Decimal`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Balance total for {scope} is too large to compute.")]
pub struct TotalOverflow {
    /// City label, or `all cities` for the grand total.
    pub scope: String,
}

/// Group label for a city value.
#[must_use]
pub fn city_label(city: &str) -> &str {
    let city = city.trim();
    if city.is_empty() {
        UNASSIGNED_CITY
    } else {
        city
    }
}

impl CityReport {
    /// Group `people` by city.
    ///
    /// # Errors
    ///
    /// Returns [`TotalOverflow`] if a total exceeds the range of [`Decimal`].
    pub fn build(people: &[Person]) -> Result<Self, TotalOverflow> {
        let mut groups: Vec<CityGroup> = Vec::new();
        for person in people {
            let label = city_label(&person.city);
            match groups.iter_mut().find(|group| group.city == label) {
                Some(group) => {
                    group.subtotal = group
                        .subtotal
                        .checked_add(person.balance)
                        .ok_or_else(|| TotalOverflow {
                            scope: label.to_string(),
                        })?;
                    group.people.push(person.clone());
                }
                None => groups.push(CityGroup {
                    city: label.to_string(),
                    people: vec![person.clone()],
                    subtotal: person.balance,
                }),
            }
        }

        groups.sort_by(|a, b| compare_cities(&a.city, &b.city));
        let grand_total = groups
            .iter()
            .try_fold(Decimal::ZERO, |total, group| total.checked_add(group.subtotal))
            .ok_or_else(|| TotalOverflow {
                scope: "all cities".to_string(),
            })?;
        Ok(Self {
            groups,
            grand_total,
        })
    }

    /// Whether there is nothing to report.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Render the report as console text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("\n--- Report by City ---\n");
        for group in &self.groups {
            let _ = writeln!(out, "\nCity: {}\n", group.city);
            let _ = writeln!(out, "ID\tFirst Name\tLast Name\tBalance");
            let _ = writeln!(out, "--\t----------\t---------\t----------");
            for person in &group.people {
                let _ = writeln!(
                    out,
                    "{}\t{:<10}\t{:<10}\t{:>10}",
                    person.id,
                    person.first_name,
                    person.last_name,
                    format_amount(person.balance)
                );
            }
            let _ = writeln!(out, "\t\t\t\t=========");
            let _ = writeln!(
                out,
                "Total: {:<15}\t\t{:>10}",
                group.city,
                format_amount(group.subtotal)
            );
        }
        let _ = writeln!(out, "\n\t\t\t\t=========");
        let _ = writeln!(
            out,
            "Grand Total:\t\t\t{:>10}",
            format_amount(self.grand_total)
        );
        out
    }
}

/// The unassigned group stands for the empty name and sorts first; other
/// cities compare ignoring case, then exactly.
fn compare_cities(a: &str, b: &str) -> Ordering {
    let unassigned = |city: &str| city != UNASSIGNED_CITY;
    unassigned(a)
        .cmp(&unassigned(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}
