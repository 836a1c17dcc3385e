//! # Shared Formula Kernels
//!
//! Closed-form pieces that several calculators plug their own inputs into:
//! the design Z-scores, the pooled-variance two-proportion formula, the
//! two-mean formula, and loss-to-follow-up inflation. Each kernel returns
//! its intermediate quantities so the caller can write them into its step
//! trace.

use crate::distributions::{z_alpha, z_beta, Tails};
use crate::format::{ceil_count, fixed, trim, Z_PLACES};
use crate::result::ResultBuilder;
use crate::units::Percent;

// =============================================================================
// DESIGN Z-SCORES
// =============================================================================

/// The pair of standard normal quantiles driving a sample-size formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesignZ {
    pub alpha: f64,
    pub power: f64,
    pub tails: Tails,
    /// Zα (one- or two-sided)
    pub z_alpha: f64,
    /// Zβ = Φ⁻¹(power)
    pub z_beta: f64,
}

impl DesignZ {
    pub fn new(alpha: f64, power: f64, tails: Tails) -> Self {
        DesignZ {
            alpha,
            power,
            tails,
            z_alpha: z_alpha(alpha, tails),
            z_beta: z_beta(power),
        }
    }

    /// Zα + Zβ
    pub fn sum(&self) -> f64 {
        self.z_alpha + self.z_beta
    }

    /// Append the two quantile steps to a trace
    pub fn steps(&self, builder: ResultBuilder) -> ResultBuilder {
        let alpha_calc = match self.tails {
            Tails::Two => format!(
                "Zα = Φ⁻¹(1 − {}/2) = {}",
                trim(self.alpha),
                fixed(self.z_alpha, Z_PLACES)
            ),
            Tails::One => format!(
                "Zα = Φ⁻¹(1 − {}) = {}",
                trim(self.alpha),
                fixed(self.z_alpha, Z_PLACES)
            ),
        };
        builder
            .step(format!("Z-score for α ({})", self.tails.label()), alpha_calc)
            .step(
                "Z-score for power",
                format!(
                    "Zβ = Φ⁻¹({}) = {}",
                    trim(self.power),
                    fixed(self.z_beta, Z_PLACES)
                ),
            )
    }
}

// =============================================================================
// TWO INDEPENDENT PROPORTIONS
// =============================================================================

/// Intermediate quantities of the pooled-variance (Fleiss) formula
///
/// ```text
/// n₁ = [Zα·√((1 + 1/k)·p̄q̄) + Zβ·√(p₁q₁ + p₂q₂/k)]² / δ²,   n₂ = k·n₁
/// p̄ = (p₁ + k·p₂)/(1 + k)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoProportionTerms {
    pub p_bar: f64,
    /// √((1 + 1/k)·p̄q̄)
    pub null_sd: f64,
    /// √(p₁q₁ + p₂q₂/k)
    pub alt_sd: f64,
    /// Effect on the scale of the test (|p₁ − p₂| or a margin-adjusted gap)
    pub delta: f64,
    /// Unrounded size of group 1
    pub n1: f64,
}

/// Evaluate the pooled two-proportion formula.
///
/// `delta` is passed separately so non-inferiority and equivalence designs
/// can substitute their margin-adjusted difference.
pub fn two_proportion_terms(p1: f64, p2: f64, k: f64, z: &DesignZ, delta: f64) -> TwoProportionTerms {
    let p_bar = (p1 + k * p2) / (1.0 + k);
    let null_sd = ((1.0 + 1.0 / k) * p_bar * (1.0 - p_bar)).sqrt();
    let alt_sd = (p1 * (1.0 - p1) + p2 * (1.0 - p2) / k).sqrt();
    let n1 = (z.z_alpha * null_sd + z.z_beta * alt_sd).powi(2) / delta.powi(2);
    TwoProportionTerms {
        p_bar,
        null_sd,
        alt_sd,
        delta,
        n1,
    }
}

impl TwoProportionTerms {
    /// Append the pooled-proportion, variance and n steps to a trace
    pub fn steps(&self, builder: ResultBuilder, p1: f64, p2: f64, k: f64, z: &DesignZ) -> ResultBuilder {
        builder
            .step(
                "Pooled proportion",
                format!(
                    "p̄ = ({} + {} × {}) / (1 + {}) = {}",
                    trim(p1),
                    trim(k),
                    trim(p2),
                    trim(k),
                    fixed(self.p_bar, Z_PLACES)
                ),
            )
            .step(
                "Standard deviation under H₀",
                format!(
                    "√((1 + 1/{}) × {} × {}) = {}",
                    trim(k),
                    fixed(self.p_bar, Z_PLACES),
                    fixed(1.0 - self.p_bar, Z_PLACES),
                    fixed(self.null_sd, Z_PLACES)
                ),
            )
            .step(
                "Standard deviation under H₁",
                format!(
                    "√({} × {} + {} × {} / {}) = {}",
                    trim(p1),
                    trim(1.0 - p1),
                    trim(p2),
                    trim(1.0 - p2),
                    trim(k),
                    fixed(self.alt_sd, Z_PLACES)
                ),
            )
            .step(
                "Sample size for group 1",
                format!(
                    "n₁ = ({} × {} + {} × {})² / {}² = {}",
                    fixed(z.z_alpha, Z_PLACES),
                    fixed(self.null_sd, Z_PLACES),
                    fixed(z.z_beta, Z_PLACES),
                    fixed(self.alt_sd, Z_PLACES),
                    fixed(self.delta, Z_PLACES),
                    fixed(self.n1, 2)
                ),
            )
    }
}

// =============================================================================
// TWO INDEPENDENT MEANS
// =============================================================================

/// Unrounded size of group 1 for comparing two means:
///
/// ```text
/// n₁ = (Zα + Zβ)² · (σ₁² + σ₂²/k) / Δ²
/// ```
#[inline]
pub fn two_mean_n1(sd1: f64, sd2: f64, k: f64, delta: f64, z: &DesignZ) -> f64 {
    z.sum().powi(2) * (sd1.powi(2) + sd2.powi(2) / k) / delta.powi(2)
}

// =============================================================================
// GROUP ALLOCATION & LOSS
// =============================================================================

/// Ceiling-rounded group sizes `(n₁, n₂)` from the unrounded n₁ and ratio k.
pub fn allocate(n1_raw: f64, k: f64) -> (u64, u64) {
    let n1 = ceil_count(n1_raw);
    let n2 = ceil_count(n1 as f64 * k);
    (n1, n2)
}

/// Inflate a count for anticipated loss: `⌈n / (1 − rate)⌉`.
pub fn inflate_for_loss(n: u64, rate: Percent) -> u64 {
    ceil_count(n as f64 / (1.0 - rate.fraction()))
}

// =============================================================================
// EFFECT MAGNITUDE
// =============================================================================

/// Cohen's conventional label for a standardized mean difference
pub fn cohen_magnitude(d: f64) -> &'static str {
    let d = d.abs();
    if d < 0.2 {
        "negligible"
    } else if d < 0.5 {
        "small"
    } else if d < 0.8 {
        "medium"
    } else {
        "large"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_design_z_two_sided() {
        let z = DesignZ::new(0.05, 0.8, Tails::Two);
        assert_abs_diff_eq!(z.z_alpha, 1.959964, epsilon = 1e-6);
        assert_abs_diff_eq!(z.z_beta, 0.841621, epsilon = 1e-6);
        assert_abs_diff_eq!(z.sum(), 2.801585, epsilon = 1e-6);
    }

    #[test]
    fn test_design_z_steps_are_recorded() {
        let z = DesignZ::new(0.05, 0.9, Tails::One);
        let result = z.steps(ResultBuilder::new("t", "m")).build();
        assert_eq!(result.steps().len(), 2);
        assert!(result.steps()[0].calc.contains("1.6449"));
        assert!(result.steps()[1].calc.contains("1.2816"));
    }

    #[test]
    fn test_two_proportion_textbook_value() {
        // p1 = 0.6, p2 = 0.4, α = 0.05, power = 0.8 → ~97 per group
        let z = DesignZ::new(0.05, 0.8, Tails::Two);
        let terms = two_proportion_terms(0.6, 0.4, 1.0, &z, 0.2);
        assert_abs_diff_eq!(terms.p_bar, 0.5, epsilon = 1e-12);
        assert_eq!(ceil_count(terms.n1), 97);
    }

    #[test]
    fn test_allocate_and_inflate() {
        assert_eq!(allocate(35.2, 2.0), (36, 72));
        assert_eq!(inflate_for_loss(385, Percent(10.0)), 428);
        assert_eq!(inflate_for_loss(100, Percent(0.0)), 100);
    }

    #[test]
    fn test_cohen_magnitude() {
        assert_eq!(cohen_magnitude(0.1), "negligible");
        assert_eq!(cohen_magnitude(-0.33), "small");
        assert_eq!(cohen_magnitude(0.5), "medium");
        assert_eq!(cohen_magnitude(1.2), "large");
    }

    #[test]
    fn test_two_mean_n1() {
        let z = DesignZ::new(0.05, 0.8, Tails::Two);
        // (2.8016)² × (15² + 15²) / 5² = 141.28
        assert_abs_diff_eq!(two_mean_n1(15.0, 15.0, 1.0, 5.0, &z), 141.28, epsilon = 0.01);
    }
}
