//! # Numeric Formatting
//!
//! Two rounding rules apply across every calculator and they must not be
//! confused:
//!
//! - **Sample sizes** are rounded *up* with [`ceil_count`]. Rounding down
//!   under-enrolls, which is the unsafe direction.
//! - **Statistics** (Z-scores, effect sizes, probabilities) are rounded to a
//!   fixed number of decimal places with [`round_to`] / [`fixed`]. The number
//!   of places is always an explicit argument.
//!
//! ## Example
//!
//! ```rust
//! use biostat_core::format::{ceil_count, fixed, round_to};
//!
//! assert_eq!(ceil_count(384.16), 385);
//! assert_eq!(round_to(1.959964, 4), 1.96);
//! assert_eq!(fixed(0.84162, 3), "0.842");
//! ```

/// Decimal places used for Z-scores in step traces
pub const Z_PLACES: usize = 4;

/// Decimal places used for headline statistics
pub const STAT_PLACES: usize = 3;

/// Round `x` to `places` decimal places (half away from zero).
///
/// Non-finite values are returned unchanged.
pub fn round_to(x: f64, places: usize) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let factor = 10f64.powi(places as i32);
    (x * factor).round() / factor
}

/// Format `x` with exactly `places` decimals; infinities render as `∞`.
pub fn fixed(x: f64, places: usize) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else if x == f64::INFINITY {
        "∞".to_string()
    } else if x == f64::NEG_INFINITY {
        "-∞".to_string()
    } else {
        format!("{:.*}", places, round_to(x, places))
    }
}

/// Format without trailing zeros, for echoing user inputs (`0.50` → `0.5`).
pub fn trim(x: f64) -> String {
    let s = fixed(x, 6);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Format a proportion as a percentage (`0.123` → `12.3%`).
pub fn percent(proportion: f64, places: usize) -> String {
    format!("{}%", fixed(proportion * 100.0, places))
}

/// Values closer than this to an integer are treated as that integer
const CEIL_TOLERANCE: f64 = 1e-9;

/// Ceiling rule for sample sizes.
///
/// Floating-point noise just above an integer (`100.00000000000001`) does not
/// add a subject. Negative, zero or non-finite requirements map to `0`;
/// callers that need a strictly positive size validate before computing.
pub fn ceil_count(x: f64) -> u64 {
    if !x.is_finite() || x <= 0.0 {
        return 0;
    }
    (x - CEIL_TOLERANCE).ceil().max(0.0) as u64
}
