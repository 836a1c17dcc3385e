//! # Domain Preconditions
//!
//! Shared checks used by every `*Input::validate()`. Each returns a
//! [`CalcError::Validation`] naming the field, the offending value and the
//! violated constraint. Inputs are validated in full before any arithmetic
//! so a formula never sees a value that would turn into NaN or infinity.

use crate::errors::{CalcError, CalcResult};
use crate::format::trim;
use crate::units::Percent;

/// `0 < value < 1`
pub fn probability(field: &str, value: f64) -> CalcResult<()> {
    within(field, value, 0.0, 1.0)
}

/// `lo < value < hi`
pub fn within(field: &str, value: f64, lo: f64, hi: f64) -> CalcResult<()> {
    if value > lo && value < hi {
        Ok(())
    } else {
        Err(CalcError::validation(
            field,
            trim(value),
            format!("must lie strictly between {} and {}", trim(lo), trim(hi)),
        ))
    }
}

/// `value > 0`
pub fn positive(field: &str, value: f64) -> CalcResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(CalcError::validation(field, trim(value), "must be greater than 0"))
    }
}

/// `value ≥ 0`
pub fn non_negative(field: &str, value: f64) -> CalcResult<()> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(CalcError::validation(field, trim(value), "must not be negative"))
    }
}

/// `value ≥ min`
pub fn at_least(field: &str, value: f64, min: f64) -> CalcResult<()> {
    if value >= min {
        Ok(())
    } else {
        Err(CalcError::validation(
            field,
            trim(value),
            format!("must be at least {}", trim(min)),
        ))
    }
}

/// Significance level in `(0, 1)`
pub fn alpha(value: f64) -> CalcResult<()> {
    probability("alpha", value)
}

/// Power (1 − β) in `(0, 1)`
pub fn power(value: f64) -> CalcResult<()> {
    probability("power", value)
}

/// Allocation ratio k = n2/n1 > 0
pub fn ratio(value: f64) -> CalcResult<()> {
    positive("ratio", value)
}

/// Loss rate in `[0, 100)` percent
pub fn loss_rate(field: &str, value: Percent) -> CalcResult<()> {
    if value.is_retention_safe() {
        Ok(())
    } else {
        Err(CalcError::validation(
            field,
            value.to_string(),
            "must be at least 0% and below 100%",
        ))
    }
}

/// Two values that a formula divides by the difference of
pub fn differ(field: &str, a: f64, b: f64) -> CalcResult<()> {
    if a != b {
        Ok(())
    } else {
        Err(CalcError::validation(
            field,
            trim(b),
            format!("must differ from {} (zero effect size)", trim(a)),
        ))
    }
}

/// An arbitrary named rule with a custom message
pub fn require(condition: bool, field: &str, value: f64, constraint: &str) -> CalcResult<()> {
    if condition {
        Ok(())
    } else {
        Err(CalcError::validation(field, trim(value), constraint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_bounds_are_open() {
        assert!(probability("p", 0.5).is_ok());
        assert!(probability("p", 0.0).is_err());
        assert!(probability("p", 1.0).is_err());
        assert!(probability("p", f64::NAN).is_err());
    }

    #[test]
    fn test_validation_message() {
        let err = within("d", 0.7, 0.0, 0.5).unwrap_err();
        assert_eq!(
            err,
            CalcError::validation("d", "0.7", "must lie strictly between 0 and 0.5")
        );
    }

    #[test]
    fn test_positive_and_non_negative() {
        assert!(positive("sd", 1.0).is_ok());
        assert!(positive("sd", 0.0).is_err());
        assert!(non_negative("icc", 0.0).is_ok());
        assert!(non_negative("icc", -0.1).is_err());
    }

    #[test]
    fn test_loss_rate() {
        assert!(loss_rate("dropout", Percent(0.0)).is_ok());
        assert!(loss_rate("dropout", Percent(100.0)).is_err());
    }

    #[test]
    fn test_differ() {
        assert!(differ("p2", 0.3, 0.4).is_ok());
        assert_eq!(differ("p2", 0.3, 0.3).unwrap_err().field(), Some("p2"));
    }

    #[test]
    fn test_at_least_and_require() {
        assert!(at_least("raters", 2.0, 2.0).is_ok());
        assert!(at_least("raters", 1.0, 2.0).is_err());
        assert!(require(false, "p1", 1.2, "exceeds 100%").is_err());
    }
}
