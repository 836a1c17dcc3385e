//! # T-Test Sample Sizes
//!
//! Normal-approximation sample sizes for the three t-test designs:
//! independent groups with unequal allocation, paired differences, and a
//! single mean against a reference value. All use a two-sided α.
//!
//! ## Example
//!
//! ```rust
//! use biostat_core::calculations::t_test::{calculate_two_sample_t, TwoSampleTInput};
//!
//! let input = TwoSampleTInput {
//!     mean1: 75.0,
//!     mean2: 70.0,
//!     sd1: 15.0,
//!     sd2: 15.0,
//!     alpha: 0.05,
//!     power: 0.8,
//!     ratio: 1.0,
//! };
//! let result = calculate_two_sample_t(&input).unwrap();
//! assert_eq!(result.result("Group 1 (n₁)").unwrap().as_count(), Some(142));
//! ```

use serde::{Deserialize, Serialize};

use crate::distributions::Tails;
use crate::errors::CalcResult;
use crate::format::{ceil_count, fixed, percent, trim, STAT_PLACES, Z_PLACES};
use crate::params::{FromParams, Params};
use crate::result::{CalculationResult, ResultBuilder};
use crate::validation;

use super::common::{allocate, cohen_magnitude, two_mean_n1, DesignZ};

const STUDY_TYPE: &str = "Comparison of means";

const REFERENCE: &str =
    "Chow SC, Shao J, Wang H. Sample Size Calculations in Clinical Research. 2nd ed. Chapman & Hall/CRC; 2008.";

// ============================================================================
// Two independent samples
// ============================================================================

/// Input parameters for comparing two independent means.
///
/// ## JSON Example
///
/// ```json
/// { "mean1": 75, "mean2": 70, "sd1": 15, "sd2": 15, "alpha": 0.05, "power": 0.8, "ratio": 1 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoSampleTInput {
    /// Expected mean in group 1
    pub mean1: f64,
    /// Expected mean in group 2
    pub mean2: f64,
    /// Standard deviation in group 1
    pub sd1: f64,
    /// Standard deviation in group 2
    pub sd2: f64,
    /// Two-sided significance level
    pub alpha: f64,
    /// Desired power (1 − β)
    pub power: f64,
    /// Allocation ratio k = n₂/n₁
    pub ratio: f64,
}

impl TwoSampleTInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::differ("mean2", self.mean1, self.mean2)?;
        validation::positive("sd1", self.sd1)?;
        validation::positive("sd2", self.sd2)?;
        validation::alpha(self.alpha)?;
        validation::power(self.power)?;
        validation::ratio(self.ratio)
    }
}

impl FromParams for TwoSampleTInput {
    const FIELDS: &'static [&'static str] = &["mean1", "mean2", "sd1", "sd2", "alpha", "power", "ratio"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(TwoSampleTInput {
            mean1: params.number("mean1")?,
            mean2: params.number("mean2")?,
            sd1: params.number("sd1")?,
            sd2: params.number("sd2")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
            ratio: params.number("ratio")?,
        })
    }
}

/// Two-sample comparison of means.
///
/// ```text
/// n₁ = (Zα/2 + Zβ)² · (σ₁² + σ₂²/k) / Δ²,   n₂ = k · n₁
/// ```
///
/// With equal SDs and k = 1 this reduces to `((Zα/2 + Zβ)/d)² × 2` where
/// `d = Δ/σ` is Cohen's d.
pub fn calculate_two_sample_t(input: &TwoSampleTInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let TwoSampleTInput { mean1, mean2, sd1, sd2, alpha, power, ratio } = *input;
    let z = DesignZ::new(alpha, power, Tails::Two);
    let delta = (mean1 - mean2).abs();
    let variance_term = sd1.powi(2) + sd2.powi(2) / ratio;
    let pooled_sd = ((sd1.powi(2) + sd2.powi(2)) / 2.0).sqrt();
    let d = delta / pooled_sd;
    let n1_raw = two_mean_n1(sd1, sd2, ratio, delta, &z);
    let (n1, n2) = allocate(n1_raw, ratio);
    let total = n1 + n2;

    let builder = ResultBuilder::new(STUDY_TYPE, "Two-sample t-test (independent groups)")
        .input("Mean, group 1 (μ₁)", trim(mean1))
        .input("Mean, group 2 (μ₂)", trim(mean2))
        .input("SD, group 1 (σ₁)", trim(sd1))
        .input("SD, group 2 (σ₂)", trim(sd2))
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .input("Allocation ratio (k = n₂/n₁)", trim(ratio))
        .formula(
            "n₁ = (Zα/2 + Zβ)² × (σ₁² + σ₂²/k) / Δ²,  n₂ = k × n₁",
            "Δ = |μ₁ − μ₂|, σ₁, σ₂ = group standard deviations, k = allocation ratio, \
             Zα/2 and Zβ = standard normal quantiles",
        );

    Ok(z.steps(builder)
        .step("Mean difference", format!("Δ = |{} − {}| = {}", trim(mean1), trim(mean2), trim(delta)))
        .step(
            "Standardized effect (Cohen's d)",
            format!("d = {} / {} = {}", trim(delta), fixed(pooled_sd, Z_PLACES), fixed(d, Z_PLACES)),
        )
        .step(
            "Variance term",
            format!(
                "σ₁² + σ₂²/k = {}² + {}²/{} = {}",
                trim(sd1),
                trim(sd2),
                trim(ratio),
                fixed(variance_term, 2)
            ),
        )
        .step(
            "Sample size for group 1",
            format!(
                "n₁ = ({} + {})² × {} / {}² = {}",
                fixed(z.z_alpha, Z_PLACES),
                fixed(z.z_beta, Z_PLACES),
                fixed(variance_term, 2),
                trim(delta),
                fixed(n1_raw, 2)
            ),
        )
        .step(
            "Round up and allocate",
            format!("n₁ = ⌈{}⌉ = {}, n₂ = ⌈{} × {}⌉ = {}", fixed(n1_raw, 2), n1, trim(ratio), n1, n2),
        )
        .step("Total", format!("N = {} + {} = {}", n1, n2, total))
        .count("Group 1 (n₁)", n1)
        .count("Group 2 (n₂)", n2)
        .count("Total sample size", total)
        .number("Cohen's d", d, STAT_PLACES)
        .interpretation(format!(
            "To detect a difference of {} units (Cohen's d = {}, a {} effect) with {} power at α = {}, \
             enrol {} in group 1 and {} in group 2 ({} in total).",
            trim(delta),
            fixed(d, STAT_PLACES),
            cohen_magnitude(d),
            percent(power, 0),
            trim(alpha),
            n1,
            n2,
            total
        ))
        .recommend("Base the standard deviations on pilot data or a comparable published trial.")
        .recommend_if(
            (sd1 / sd2).max(sd2 / sd1) > 2.0,
            "The group SDs differ by more than a factor of two; plan a Welch t-test for the analysis.",
        )
        .recommend_if(
            n1 < 30 || n2 < 30,
            "Small groups: the normal approximation understates n slightly; add one or two subjects per group.",
        )
        .recommend("Inflate the total for anticipated dropout before finalising recruitment targets.")
        .reference(REFERENCE)
        .build())
}

// ============================================================================
// Paired samples
// ============================================================================

/// Input parameters for a paired (before/after) comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairedTInput {
    /// Expected mean of the within-pair differences
    pub mean_diff: f64,
    /// Standard deviation of the within-pair differences
    pub sd_diff: f64,
    pub alpha: f64,
    pub power: f64,
}

impl PairedTInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::require(self.mean_diff != 0.0, "meanDiff", self.mean_diff, "must not be zero")?;
        validation::positive("sdDiff", self.sd_diff)?;
        validation::alpha(self.alpha)?;
        validation::power(self.power)
    }
}

impl FromParams for PairedTInput {
    const FIELDS: &'static [&'static str] = &["meanDiff", "sdDiff", "alpha", "power"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(PairedTInput {
            mean_diff: params.number("meanDiff")?,
            sd_diff: params.number("sdDiff")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
        })
    }
}

/// Paired t-test: `n = ((Zα/2 + Zβ) · σd / δ)²` pairs
pub fn calculate_paired_t(input: &PairedTInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let PairedTInput { mean_diff, sd_diff, alpha, power } = *input;
    let z = DesignZ::new(alpha, power, Tails::Two);
    let dz = mean_diff.abs() / sd_diff;
    let n_raw = (z.sum() / dz).powi(2);
    let n = ceil_count(n_raw);

    let builder = ResultBuilder::new(STUDY_TYPE, "Paired t-test")
        .input("Mean difference (δ)", trim(mean_diff))
        .input("SD of differences (σd)", trim(sd_diff))
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .formula(
            "n = ((Zα/2 + Zβ) × σd / δ)²",
            "δ = mean within-pair difference, σd = SD of the differences",
        );

    Ok(z.steps(builder)
        .step(
            "Standardized effect (dz)",
            format!("dz = |{}| / {} = {}", trim(mean_diff), trim(sd_diff), fixed(dz, Z_PLACES)),
        )
        .step(
            "Number of pairs",
            format!(
                "n = (({} + {}) / {})² = {}",
                fixed(z.z_alpha, Z_PLACES),
                fixed(z.z_beta, Z_PLACES),
                fixed(dz, Z_PLACES),
                fixed(n_raw, 2)
            ),
        )
        .step("Round up", format!("n = ⌈{}⌉ = {}", fixed(n_raw, 2), n))
        .count("Number of pairs", n)
        .number("Effect size (dz)", dz, STAT_PLACES)
        .interpretation(format!(
            "{} pairs give {} power to detect a mean change of {} (dz = {}) at α = {}.",
            n,
            percent(power, 0),
            trim(mean_diff),
            fixed(dz, STAT_PLACES),
            trim(alpha)
        ))
        .recommend("The SD of differences is usually smaller than the between-subject SD; do not substitute one for the other.")
        .recommend_if(n < 30, "With few pairs, check the differences for approximate normality or plan a Wilcoxon signed-rank test.")
        .reference(REFERENCE)
        .build())
}

// ============================================================================
// One sample
// ============================================================================

/// Input parameters for testing one mean against a reference value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneSampleTInput {
    /// Reference (null) mean
    pub mean0: f64,
    /// Expected true mean
    pub mean1: f64,
    pub sd: f64,
    pub alpha: f64,
    pub power: f64,
}

impl OneSampleTInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::differ("mean1", self.mean0, self.mean1)?;
        validation::positive("sd", self.sd)?;
        validation::alpha(self.alpha)?;
        validation::power(self.power)
    }
}

impl FromParams for OneSampleTInput {
    const FIELDS: &'static [&'static str] = &["mean0", "mean1", "sd", "alpha", "power"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(OneSampleTInput {
            mean0: params.number("mean0")?,
            mean1: params.number("mean1")?,
            sd: params.number("sd")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
        })
    }
}

/// One-sample t-test: `n = ((Zα/2 + Zβ) · σ / (μ₁ − μ₀))²`
pub fn calculate_one_sample_t(input: &OneSampleTInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let OneSampleTInput { mean0, mean1, sd, alpha, power } = *input;
    let z = DesignZ::new(alpha, power, Tails::Two);
    let delta = (mean1 - mean0).abs();
    let n_raw = (z.sum() * sd / delta).powi(2);
    let n = ceil_count(n_raw);
    let d = delta / sd;

    let builder = ResultBuilder::new(STUDY_TYPE, "One-sample t-test")
        .input("Reference mean (μ₀)", trim(mean0))
        .input("Expected mean (μ₁)", trim(mean1))
        .input("Standard deviation (σ)", trim(sd))
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .formula(
            "n = ((Zα/2 + Zβ) × σ / (μ₁ − μ₀))²",
            "μ₀ = reference mean, μ₁ = expected mean, σ = standard deviation",
        );

    Ok(z.steps(builder)
        .step("Difference", format!("|μ₁ − μ₀| = |{} − {}| = {}", trim(mean1), trim(mean0), trim(delta)))
        .step(
            "Sample size",
            format!(
                "n = (({} + {}) × {} / {})² = {}",
                fixed(z.z_alpha, Z_PLACES),
                fixed(z.z_beta, Z_PLACES),
                trim(sd),
                trim(delta),
                fixed(n_raw, 2)
            ),
        )
        .step("Round up", format!("n = ⌈{}⌉ = {}", fixed(n_raw, 2), n))
        .count("Required sample size", n)
        .number("Cohen's d", d, STAT_PLACES)
        .interpretation(format!(
            "A sample of {} detects a shift from {} to {} (d = {}) with {} power at α = {}.",
            n,
            trim(mean0),
            trim(mean1),
            fixed(d, STAT_PLACES),
            percent(power, 0),
            trim(alpha)
        ))
        .recommend("Make sure the reference value comes from an external standard, not from the same data.")
        .reference(REFERENCE)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_sample() -> TwoSampleTInput {
        TwoSampleTInput {
            mean1: 75.0,
            mean2: 70.0,
            sd1: 15.0,
            sd2: 15.0,
            alpha: 0.05,
            power: 0.8,
            ratio: 1.0,
        }
    }

    #[test]
    fn test_two_sample_matches_effect_size_form() {
        // ((1.96 + 0.8416) / (5/15))² × 2 = 141.28 → 142 per group
        let result = calculate_two_sample_t(&two_sample()).unwrap();
        assert_eq!(result.result("Group 1 (n₁)").unwrap().as_count(), Some(142));
        assert_eq!(result.result("Group 2 (n₂)").unwrap().as_count(), Some(142));
        assert_eq!(result.result("Total sample size").unwrap().as_count(), Some(284));
        let expected = ((1.959964_f64 + 0.841621) / (5.0 / 15.0)).powi(2) * 2.0;
        assert_eq!(ceil_count(expected), 142);
    }

    #[test]
    fn test_two_sample_unequal_allocation() {
        let mut input = two_sample();
        input.ratio = 2.0;
        let result = calculate_two_sample_t(&input).unwrap();
        let n1 = result.result("Group 1 (n₁)").unwrap().as_count().unwrap();
        let n2 = result.result("Group 2 (n₂)").unwrap().as_count().unwrap();
        // 7.849 × (225 + 112.5) / 25 = 105.96 → 106, n₂ = 212
        assert_eq!((n1, n2), (106, 212));
    }

    #[test]
    fn test_two_sample_larger_difference_needs_fewer() {
        let small = calculate_two_sample_t(&two_sample()).unwrap();
        let mut input = two_sample();
        input.mean1 = 80.0;
        let large = calculate_two_sample_t(&input).unwrap();
        let n_small = small.headline().unwrap().1.as_count().unwrap();
        let n_large = large.headline().unwrap().1.as_count().unwrap();
        assert!(n_large < n_small);
    }

    #[test]
    fn test_two_sample_rejects_equal_means() {
        let mut input = two_sample();
        input.mean2 = 75.0;
        assert_eq!(calculate_two_sample_t(&input).unwrap_err().field(), Some("mean2"));
    }

    #[test]
    fn test_paired_t() {
        let input = PairedTInput {
            mean_diff: 5.0,
            sd_diff: 10.0,
            alpha: 0.05,
            power: 0.8,
        };
        let result = calculate_paired_t(&input).unwrap();
        // (2.8016 / 0.5)² = 31.4 → 32
        assert_eq!(result.headline().unwrap().1.as_count(), Some(32));
    }

    #[test]
    fn test_one_sample_t() {
        let input = OneSampleTInput {
            mean0: 100.0,
            mean1: 105.0,
            sd: 10.0,
            alpha: 0.05,
            power: 0.9,
        };
        let result = calculate_one_sample_t(&input).unwrap();
        // ((1.96 + 1.2816) × 10 / 5)² = 42.03 → 43
        assert_eq!(result.headline().unwrap().1.as_count(), Some(43));
        assert!(result.interpretation().contains("43"));
    }
}
