//! # Power Analysis
//!
//! The inverse questions: the power a fixed design achieves, the smallest
//! effect it can detect, and the sample size for a correlation.

use serde::{Deserialize, Serialize};

use crate::distributions::{normal_cdf, Tails};
use crate::errors::CalcResult;
use crate::format::{ceil_count, fixed, percent, trim, STAT_PLACES, Z_PLACES};
use crate::params::{FromParams, Params};
use crate::result::{CalculationResult, ResultBuilder};
use crate::validation;

use super::common::{cohen_magnitude, DesignZ};

const STUDY_TYPE: &str = "Power analysis";

const COHEN: &str = "Cohen J. Statistical Power Analysis for the Behavioral Sciences. 2nd ed. Lawrence Erlbaum; 1988.";

/// Conventional adequacy note on an achieved power
fn power_note(power: f64) -> &'static str {
    if power >= 0.9 {
        "high"
    } else if power >= 0.8 {
        "adequate"
    } else if power >= 0.5 {
        "below the conventional 80%"
    } else {
        "low"
    }
}

fn validate_group_sizes(n1: u64, n2: u64) -> CalcResult<()> {
    validation::require(n1 >= 2, "n1", n1 as f64, "must be at least 2")?;
    validation::require(n2 >= 2, "n2", n2 as f64, "must be at least 2")
}

// ============================================================================
// Power, two means
// ============================================================================

/// Input parameters for the power of a two-sample comparison of means.
///
/// ## JSON Example
///
/// ```json
/// { "mean1": 75, "mean2": 70, "sd": 15, "n1": 142, "n2": 142, "alpha": 0.05 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerTwoMeansInput {
    pub mean1: f64,
    pub mean2: f64,
    /// Common standard deviation
    pub sd: f64,
    pub n1: u64,
    pub n2: u64,
    pub alpha: f64,
}

impl PowerTwoMeansInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::differ("mean2", self.mean1, self.mean2)?;
        validation::positive("sd", self.sd)?;
        validate_group_sizes(self.n1, self.n2)?;
        validation::alpha(self.alpha)
    }
}

impl FromParams for PowerTwoMeansInput {
    const FIELDS: &'static [&'static str] = &["mean1", "mean2", "sd", "n1", "n2", "alpha"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(PowerTwoMeansInput {
            mean1: params.number("mean1")?,
            mean2: params.number("mean2")?,
            sd: params.number("sd")?,
            n1: params.count("n1")?,
            n2: params.count("n2")?,
            alpha: params.number("alpha")?,
        })
    }
}

/// `power = Φ(|Δ| / (σ·√(1/n₁ + 1/n₂)) − Zα/2)`
pub fn calculate_power_two_means(input: &PowerTwoMeansInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let PowerTwoMeansInput { mean1, mean2, sd, n1, n2, alpha } = *input;
    // power is what we solve for; only Zα is used
    let z = DesignZ::new(alpha, 0.5, Tails::Two);
    let delta = (mean1 - mean2).abs();
    let se = sd * (1.0 / n1 as f64 + 1.0 / n2 as f64).sqrt();
    let noncentrality = delta / se;
    let power = normal_cdf(noncentrality - z.z_alpha);
    let d = delta / sd;

    Ok(ResultBuilder::new(STUDY_TYPE, "Power, two independent means")
        .input("Mean, group 1 (μ₁)", trim(mean1))
        .input("Mean, group 2 (μ₂)", trim(mean2))
        .input("Standard deviation (σ)", trim(sd))
        .input("Group 1 size (n₁)", n1.to_string())
        .input("Group 2 size (n₂)", n2.to_string())
        .input("Significance level (α)", trim(alpha))
        .formula(
            "Power = Φ(|μ₁ − μ₂| / (σ × √(1/n₁ + 1/n₂)) − Zα/2)",
            "Φ = standard normal CDF, σ = common SD, n₁, n₂ = group sizes",
        )
        .step("Z-score for α", format!("Zα/2 = {}", fixed(z.z_alpha, Z_PLACES)))
        .step(
            "Standard error of the difference",
            format!("SE = {} × √(1/{} + 1/{}) = {}", trim(sd), n1, n2, fixed(se, Z_PLACES)),
        )
        .step(
            "Non-centrality",
            format!("{} / {} = {}", trim(delta), fixed(se, Z_PLACES), fixed(noncentrality, Z_PLACES)),
        )
        .step(
            "Power",
            format!(
                "Φ({} − {}) = {}",
                fixed(noncentrality, Z_PLACES),
                fixed(z.z_alpha, Z_PLACES),
                fixed(power, Z_PLACES)
            ),
        )
        .number("Power", power, Z_PLACES)
        .text("Power (%)", percent(power, 1))
        .number("Cohen's d", d, STAT_PLACES)
        .interpretation(format!(
            "With {} and {} subjects the study has {} power ({}) to detect a difference of {} \
             (d = {}) at α = {}.",
            n1,
            n2,
            percent(power, 1),
            power_note(power),
            trim(delta),
            fixed(d, STAT_PLACES),
            trim(alpha)
        ))
        .recommend_if(power < 0.8, "Power is below 80%; enlarge the groups or target a larger effect.")
        .recommend("Post-hoc power from an observed effect adds nothing to the p-value; use it for planning only.")
        .reference(COHEN)
        .build())
}

// ============================================================================
// Power, two proportions
// ============================================================================

/// Input parameters for the power of a comparison of two proportions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerTwoProportionsInput {
    pub p1: f64,
    pub p2: f64,
    pub n1: u64,
    pub n2: u64,
    pub alpha: f64,
}

impl PowerTwoProportionsInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::probability("p1", self.p1)?;
        validation::probability("p2", self.p2)?;
        validation::differ("p2", self.p1, self.p2)?;
        validate_group_sizes(self.n1, self.n2)?;
        validation::alpha(self.alpha)
    }
}

impl FromParams for PowerTwoProportionsInput {
    const FIELDS: &'static [&'static str] = &["p1", "p2", "n1", "n2", "alpha"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(PowerTwoProportionsInput {
            p1: params.number("p1")?,
            p2: params.number("p2")?,
            n1: params.count("n1")?,
            n2: params.count("n2")?,
            alpha: params.number("alpha")?,
        })
    }
}

/// Pooled null SE against the unpooled alternative SE:
///
/// ```text
/// Z = (|p₁ − p₂| − Zα/2·√(p̄q̄(1/n₁ + 1/n₂))) / √(p₁q₁/n₁ + p₂q₂/n₂),   power = Φ(Z)
/// ```
pub fn calculate_power_two_proportions(input: &PowerTwoProportionsInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let PowerTwoProportionsInput { p1, p2, n1, n2, alpha } = *input;
    let z = DesignZ::new(alpha, 0.5, Tails::Two);
    let (f1, f2) = (n1 as f64, n2 as f64);
    let p_bar = (f1 * p1 + f2 * p2) / (f1 + f2);
    let se_null = (p_bar * (1.0 - p_bar) * (1.0 / f1 + 1.0 / f2)).sqrt();
    let se_alt = (p1 * (1.0 - p1) / f1 + p2 * (1.0 - p2) / f2).sqrt();
    let delta = (p1 - p2).abs();
    let z_power = (delta - z.z_alpha * se_null) / se_alt;
    let power = normal_cdf(z_power);

    Ok(ResultBuilder::new(STUDY_TYPE, "Power, two independent proportions")
        .input("Proportion, group 1 (p₁)", trim(p1))
        .input("Proportion, group 2 (p₂)", trim(p2))
        .input("Group 1 size (n₁)", n1.to_string())
        .input("Group 2 size (n₂)", n2.to_string())
        .input("Significance level (α)", trim(alpha))
        .formula(
            "Power = Φ((|p₁ − p₂| − Zα/2 × √(p̄q̄(1/n₁ + 1/n₂))) / √(p₁q₁/n₁ + p₂q₂/n₂))",
            "p̄ = (n₁p₁ + n₂p₂)/(n₁ + n₂), q = 1 − p",
        )
        .step("Z-score for α", format!("Zα/2 = {}", fixed(z.z_alpha, Z_PLACES)))
        .step("Pooled proportion", format!("p̄ = {}", fixed(p_bar, Z_PLACES)))
        .step(
            "Standard errors",
            format!("SE₀ = {}, SE₁ = {}", fixed(se_null, Z_PLACES), fixed(se_alt, Z_PLACES)),
        )
        .step(
            "Power",
            format!(
                "Φ(({} − {} × {}) / {}) = Φ({}) = {}",
                fixed(delta, Z_PLACES),
                fixed(z.z_alpha, Z_PLACES),
                fixed(se_null, Z_PLACES),
                fixed(se_alt, Z_PLACES),
                fixed(z_power, Z_PLACES),
                fixed(power, Z_PLACES)
            ),
        )
        .number("Power", power, Z_PLACES)
        .text("Power (%)", percent(power, 1))
        .number("Absolute difference", delta, STAT_PLACES)
        .interpretation(format!(
            "Comparing {} vs {} with {} and {} subjects gives {} power ({}) at α = {}.",
            percent(p1, 1),
            percent(p2, 1),
            n1,
            n2,
            percent(power, 1),
            power_note(power),
            trim(alpha)
        ))
        .recommend_if(power < 0.8, "Power is below 80%; enlarge the groups or target a larger difference.")
        .reference(COHEN)
        .build())
}

// ============================================================================
// Minimum detectable effect
// ============================================================================

/// Input parameters for the smallest detectable mean difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimumDetectableEffectInput {
    pub sd: f64,
    /// Subjects per group
    pub n: u64,
    pub alpha: f64,
    pub power: f64,
}

impl MinimumDetectableEffectInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::positive("sd", self.sd)?;
        validation::require(self.n >= 2, "n", self.n as f64, "must be at least 2")?;
        validation::alpha(self.alpha)?;
        validation::power(self.power)
    }
}

impl FromParams for MinimumDetectableEffectInput {
    const FIELDS: &'static [&'static str] = &["sd", "n", "alpha", "power"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(MinimumDetectableEffectInput {
            sd: params.number("sd")?,
            n: params.count("n")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
        })
    }
}

/// `MDE = (Zα/2 + Zβ)·σ·√(2/n)` for two equal groups of n
pub fn calculate_minimum_detectable_effect(input: &MinimumDetectableEffectInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let MinimumDetectableEffectInput { sd, n, alpha, power } = *input;
    let z = DesignZ::new(alpha, power, Tails::Two);
    let mde = z.sum() * sd * (2.0 / n as f64).sqrt();
    let d = mde / sd;

    let builder = ResultBuilder::new(STUDY_TYPE, "Minimum detectable effect, two means")
        .input("Standard deviation (σ)", trim(sd))
        .input("Subjects per group (n)", n.to_string())
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .formula(
            "MDE = (Zα/2 + Zβ) × σ × √(2/n)",
            "σ = common SD, n = subjects per group",
        );

    Ok(z.steps(builder)
        .step(
            "Minimum detectable difference",
            format!(
                "MDE = {} × {} × √(2/{}) = {}",
                fixed(z.sum(), Z_PLACES),
                trim(sd),
                n,
                fixed(mde, Z_PLACES)
            ),
        )
        .step("Standardized", format!("d = {} / {} = {}", fixed(mde, Z_PLACES), trim(sd), fixed(d, Z_PLACES)))
        .number("Minimum detectable difference", mde, STAT_PLACES)
        .number("Standardized effect (d)", d, STAT_PLACES)
        .text("Magnitude", cohen_magnitude(d))
        .interpretation(format!(
            "With {} per group the smallest difference detectable with {} power at α = {} is {} \
             (d = {}, a {} effect).",
            n,
            percent(power, 0),
            trim(alpha),
            fixed(mde, STAT_PLACES),
            fixed(d, STAT_PLACES),
            cohen_magnitude(d)
        ))
        .recommend("Compare the MDE with the smallest clinically important difference before committing to this size.")
        .reference(COHEN)
        .build())
}

// ============================================================================
// Correlation
// ============================================================================

/// Input parameters for detecting a non-zero Pearson correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationInput {
    pub r: f64,
    pub alpha: f64,
    pub power: f64,
}

impl CorrelationInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::within("r", self.r, -1.0, 1.0)?;
        validation::require(self.r != 0.0, "r", self.r, "must not be zero")?;
        validation::alpha(self.alpha)?;
        validation::power(self.power)
    }
}

impl FromParams for CorrelationInput {
    const FIELDS: &'static [&'static str] = &["r", "alpha", "power"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(CorrelationInput {
            r: params.number("r")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
        })
    }
}

/// Fisher z: `C = ½·ln((1 + r)/(1 − r))`, `n = ((Zα/2 + Zβ)/C)² + 3`
pub fn calculate_correlation(input: &CorrelationInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let CorrelationInput { r, alpha, power } = *input;
    let z = DesignZ::new(alpha, power, Tails::Two);
    let c = 0.5 * ((1.0 + r) / (1.0 - r)).ln();
    let n_raw = (z.sum() / c).powi(2) + 3.0;
    let n = ceil_count(n_raw);

    let strength = match r.abs() {
        a if a < 0.3 => "weak",
        a if a < 0.5 => "moderate",
        _ => "strong",
    };

    let builder = ResultBuilder::new(STUDY_TYPE, "Pearson correlation (Fisher z)")
        .input("Expected correlation (r)", trim(r))
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .formula(
            "n = ((Zα/2 + Zβ) / C)² + 3,  C = ½ ln((1 + r)/(1 − r))",
            "C = Fisher z-transform of r",
        );

    Ok(z.steps(builder)
        .step(
            "Fisher transform",
            format!("C = ½ ln((1 + {}) / (1 − {})) = {}", trim(r), trim(r), fixed(c, Z_PLACES)),
        )
        .step(
            "Sample size",
            format!(
                "n = ({} / {})² + 3 = {} → {}",
                fixed(z.sum(), Z_PLACES),
                fixed(c, Z_PLACES),
                fixed(n_raw, 2),
                n
            ),
        )
        .count("Required sample size", n)
        .number("Fisher z (C)", c, Z_PLACES)
        .number("Variance explained (r²)", r * r, STAT_PLACES)
        .interpretation(format!(
            "{} subjects detect a {} correlation of {} with {} power at α = {}.",
            n,
            strength,
            trim(r),
            percent(power, 0),
            trim(alpha)
        ))
        .recommend("Inspect a scatter plot; Pearson's r only captures linear association.")
        .reference("Hulley SB, Cummings SR, Browner WS, et al. Designing Clinical Research. 4th ed. Lippincott Williams & Wilkins; 2013.")
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_power_two_means_recovers_design_power() {
        let input = PowerTwoMeansInput {
            mean1: 75.0,
            mean2: 70.0,
            sd: 15.0,
            n1: 142,
            n2: 142,
            alpha: 0.05,
        };
        let result = calculate_power_two_means(&input).unwrap();
        let power = result.result("Power").unwrap().as_f64().unwrap();
        assert_abs_diff_eq!(power, 0.802, epsilon = 1e-3);
        assert!(result.recommendations().iter().all(|r| !r.contains("below 80%")));
    }

    #[test]
    fn test_power_two_means_underpowered() {
        let input = PowerTwoMeansInput {
            mean1: 75.0,
            mean2: 70.0,
            sd: 15.0,
            n1: 50,
            n2: 50,
            alpha: 0.05,
        };
        let result = calculate_power_two_means(&input).unwrap();
        assert_abs_diff_eq!(result.headline().unwrap().1.as_f64().unwrap(), 0.3846, epsilon = 1e-3);
        assert!(result.recommendations().iter().any(|r| r.contains("below 80%")));
    }

    #[test]
    fn test_power_two_proportions() {
        let input = PowerTwoProportionsInput {
            p1: 0.6,
            p2: 0.4,
            n1: 97,
            n2: 97,
            alpha: 0.05,
        };
        let result = calculate_power_two_proportions(&input).unwrap();
        assert_abs_diff_eq!(result.headline().unwrap().1.as_f64().unwrap(), 0.8003, epsilon = 1e-3);
    }

    #[test]
    fn test_power_rejects_tiny_groups() {
        let input = PowerTwoProportionsInput {
            p1: 0.6,
            p2: 0.4,
            n1: 1,
            n2: 97,
            alpha: 0.05,
        };
        assert_eq!(calculate_power_two_proportions(&input).unwrap_err().field(), Some("n1"));
    }

    #[test]
    fn test_minimum_detectable_effect() {
        let input = MinimumDetectableEffectInput {
            sd: 10.0,
            n: 50,
            alpha: 0.05,
            power: 0.8,
        };
        let result = calculate_minimum_detectable_effect(&input).unwrap();
        assert_abs_diff_eq!(result.headline().unwrap().1.as_f64().unwrap(), 5.603, epsilon = 1e-3);
        assert_eq!(result.result("Magnitude").unwrap().as_text(), Some("medium"));
    }

    #[test]
    fn test_correlation() {
        let input = CorrelationInput {
            r: 0.3,
            alpha: 0.05,
            power: 0.8,
        };
        let result = calculate_correlation(&input).unwrap();
        // (2.8016 / 0.3095)² + 3 = 84.93
        assert_eq!(result.headline().unwrap().1.as_count(), Some(85));
        // sign of r does not matter
        let negative = calculate_correlation(&CorrelationInput { r: -0.3, ..input }).unwrap();
        assert_eq!(negative.headline().unwrap().1.as_count(), Some(85));
    }
}
