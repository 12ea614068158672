//! Running cost accounting
//!
//! A [`Cost`] is either a known dollar amount or `Unknown`. Once any
//! contributing delta is not a usable number the total becomes `Unknown` and
//! stays that way, so an unreliable total is never reported as a real one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Cost of one or more model calls
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Cost {
    Known(f64),
    Unknown,
}

impl Cost {
    pub const ZERO: Cost = Cost::Known(0.0);

    /// Build a cost from a raw amount; non-finite amounts are `Unknown`
    pub fn from_amount(amount: f64) -> Self {
        if amount.is_finite() {
            Cost::Known(amount)
        } else {
            Cost::Unknown
        }
    }

    pub fn amount(&self) -> Option<f64> {
        match self {
            Cost::Known(amount) => Some(*amount),
            Cost::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Cost::Known(_))
    }
}

impl Default for Cost {
    fn default() -> Self {
        Cost::ZERO
    }
}

impl From<f64> for Cost {
    fn from(amount: f64) -> Self {
        Cost::from_amount(amount)
    }
}

impl From<Option<f64>> for Cost {
    fn from(amount: Option<f64>) -> Self {
        amount.map(Cost::from_amount).unwrap_or(Cost::Unknown)
    }
}

impl From<Cost> for Option<f64> {
    fn from(cost: Cost) -> Self {
        cost.amount()
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        match (self, rhs) {
            (Cost::Known(a), Cost::Known(b)) => Cost::from_amount(a + b),
            _ => Cost::Unknown,
        }
    }
}

impl AddAssign for Cost {
    fn add_assign(&mut self, rhs: Cost) {
        *self = *self + rhs;
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::ZERO, Add::add)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cost::Known(amount) => write!(f, "${:.2}", amount),
            Cost::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_costs_add_exactly() {
        let total: Cost = [0.25, 0.5, 1.0].into_iter().map(Cost::from).sum();
        assert_eq!(total, Cost::Known(1.75));
    }

    #[test]
    fn test_unknown_poisons_and_sticks() {
        let mut total = Cost::Known(1.0);
        total += Cost::Unknown;
        assert_eq!(total, Cost::Unknown);

        total += Cost::Known(2.0);
        assert_eq!(total, Cost::Unknown);
    }

    #[test]
    fn test_non_finite_amount_is_unknown() {
        assert_eq!(Cost::from(f64::NAN), Cost::Unknown);
        assert_eq!(Cost::from(f64::INFINITY), Cost::Unknown);
    }

    #[test]
    fn test_display() {
        assert_eq!(Cost::Known(0.126).to_string(), "$0.13");
        assert_eq!(Cost::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_serde_as_optional_number() {
        assert_eq!(serde_json::to_string(&Cost::Known(0.5)).unwrap(), "0.5");
        assert_eq!(serde_json::to_string(&Cost::Unknown).unwrap(), "null");
        let parsed: Cost = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, Cost::Unknown);
    }
}
