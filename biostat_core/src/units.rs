//! # Unit Types
//!
//! Lightweight wrappers for the two ways a rate crosses the boundary:
//! as a percentage (`10` meaning 10%) or as a proportion (`0.10`).
//! Non-response, dropout and heterogeneity inputs arrive as percentages;
//! every formula works on proportions.
//!
//! ## Example
//!
//! ```rust
//! use biostat_core::units::{Percent, Proportion};
//!
//! let dropout = Percent(15.0);
//! let p: Proportion = dropout.into();
//! assert!((p.0 - 0.15).abs() < 1e-12);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A rate expressed in percent (0–100)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(pub f64);

/// A rate expressed as a proportion (0–1)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Proportion(pub f64);

impl Percent {
    /// The same rate as a fraction of one
    pub fn fraction(self) -> f64 {
        self.0 / 100.0
    }

    /// Whether the rate lies in `[0, 100)`, i.e. leaves someone to analyse
    pub fn is_retention_safe(self) -> bool {
        self.0 >= 0.0 && self.0 < 100.0
    }
}

impl From<Percent> for Proportion {
    fn from(pct: Percent) -> Self {
        Proportion(pct.0 / 100.0)
    }
}

impl From<Proportion> for Percent {
    fn from(p: Proportion) -> Self {
        Percent(p.0 * 100.0)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", crate::format::trim(self.0))
    }
}

impl fmt::Display for Proportion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::format::trim(self.0))
    }
}
