//! # Clinical Trial Designs
//!
//! Two-arm randomized trials with a binary or continuous endpoint. Every
//! design inflates each arm for anticipated dropout after rounding:
//! `n_adj = ⌈n / (1 − dropout)⌉`.
//!
//! | Design | Zα | Effect in denominator |
//! |--------|----|-----------------------|
//! | Superiority (binary) | two-sided | `p₁ − p₂` |
//! | Non-inferiority (binary) | one-sided | `p₂ − p₁ + margin` |
//! | Equivalence (binary, TOST) | one-sided | `margin − \|p₁ − p₂\|`, n doubled |
//! | Superiority (continuous) | two-sided | mean difference |
//!
//! ## Example
//!
//! ```rust
//! use biostat_core::calculations::clinical::{calculate_superiority_binary, SuperiorityBinaryInput};
//! use biostat_core::units::Percent;
//!
//! let input = SuperiorityBinaryInput {
//!     p1: 0.6,
//!     p2: 0.4,
//!     alpha: 0.05,
//!     power: 0.8,
//!     ratio: 1.0,
//!     dropout: Percent(10.0),
//! };
//! let result = calculate_superiority_binary(&input).unwrap();
//! assert_eq!(result.result("Group 1 (n₁)").unwrap().as_count(), Some(97));
//! assert_eq!(result.result("Total adjusted for dropout").unwrap().as_count(), Some(216));
//! ```

use serde::{Deserialize, Serialize};

use crate::distributions::Tails;
use crate::errors::CalcResult;
use crate::format::{fixed, percent, trim, STAT_PLACES, Z_PLACES};
use crate::params::{FromParams, Params};
use crate::result::{CalculationResult, ResultBuilder};
use crate::units::Percent;
use crate::validation;

use super::common::{allocate, cohen_magnitude, inflate_for_loss, two_mean_n1, two_proportion_terms, DesignZ};

const STUDY_TYPE: &str = "Randomized controlled trial";

const CHOW: &str =
    "Chow SC, Shao J, Wang H. Sample Size Calculations in Clinical Research. 2nd ed. Chapman & Hall/CRC; 2008.";

/// Arm sizes before and after dropout inflation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArmSizes {
    n1: u64,
    n2: u64,
    n1_adj: u64,
    n2_adj: u64,
}

impl ArmSizes {
    fn new(n1_raw: f64, ratio: f64, dropout: Percent) -> Self {
        let (n1, n2) = allocate(n1_raw, ratio);
        ArmSizes {
            n1,
            n2,
            n1_adj: inflate_for_loss(n1, dropout),
            n2_adj: inflate_for_loss(n2, dropout),
        }
    }

    fn total(&self) -> u64 {
        self.n1 + self.n2
    }

    fn total_adj(&self) -> u64 {
        self.n1_adj + self.n2_adj
    }

    /// Rounding, dropout steps and the six size results
    fn record(&self, builder: ResultBuilder, n1_raw: f64, ratio: f64, dropout: Percent) -> ResultBuilder {
        builder
            .step(
                "Round up and allocate",
                format!(
                    "n₁ = ⌈{}⌉ = {}, n₂ = ⌈{} × {}⌉ = {}",
                    fixed(n1_raw, 2),
                    self.n1,
                    trim(ratio),
                    self.n1,
                    self.n2
                ),
            )
            .step(
                "Adjust for dropout",
                format!(
                    "n₁ = ⌈{} / (1 − {})⌉ = {}, n₂ = ⌈{} / (1 − {})⌉ = {}",
                    self.n1,
                    trim(dropout.fraction()),
                    self.n1_adj,
                    self.n2,
                    trim(dropout.fraction()),
                    self.n2_adj
                ),
            )
            .count("Group 1 (n₁)", self.n1)
            .count("Group 2 (n₂)", self.n2)
            .count("Total sample size", self.total())
            .count("Group 1 adjusted for dropout", self.n1_adj)
            .count("Group 2 adjusted for dropout", self.n2_adj)
            .count("Total adjusted for dropout", self.total_adj())
    }
}

fn validate_common(alpha: f64, power: f64, ratio: f64, dropout: Percent) -> CalcResult<()> {
    validation::alpha(alpha)?;
    validation::power(power)?;
    validation::ratio(ratio)?;
    validation::loss_rate("dropout", dropout)
}

// ============================================================================
// Superiority, binary endpoint
// ============================================================================

/// Input parameters for a superiority trial with a binary endpoint.
///
/// ## JSON Example
///
/// ```json
/// { "p1": 0.6, "p2": 0.4, "alpha": 0.05, "power": 0.8, "ratio": 1, "dropout": 10 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperiorityBinaryInput {
    /// Response rate, group 1
    pub p1: f64,
    /// Response rate, group 2
    pub p2: f64,
    pub alpha: f64,
    pub power: f64,
    pub ratio: f64,
    pub dropout: Percent,
}

impl SuperiorityBinaryInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::probability("p1", self.p1)?;
        validation::probability("p2", self.p2)?;
        validation::differ("p2", self.p1, self.p2)?;
        validate_common(self.alpha, self.power, self.ratio, self.dropout)
    }
}

impl FromParams for SuperiorityBinaryInput {
    const FIELDS: &'static [&'static str] = &["p1", "p2", "alpha", "power", "ratio", "dropout"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(SuperiorityBinaryInput {
            p1: params.number("p1")?,
            p2: params.number("p2")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
            ratio: params.number("ratio")?,
            dropout: params.percent("dropout")?,
        })
    }
}

pub fn calculate_superiority_binary(input: &SuperiorityBinaryInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let SuperiorityBinaryInput { p1, p2, alpha, power, ratio, dropout } = *input;
    let z = DesignZ::new(alpha, power, Tails::Two);
    let terms = two_proportion_terms(p1, p2, ratio, &z, (p1 - p2).abs());
    let sizes = ArmSizes::new(terms.n1, ratio, dropout);

    let builder = ResultBuilder::new(STUDY_TYPE, "Superiority trial, binary endpoint")
        .input("Response rate, group 1 (p₁)", trim(p1))
        .input("Response rate, group 2 (p₂)", trim(p2))
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .input("Allocation ratio (k = n₂/n₁)", trim(ratio))
        .input("Dropout rate", dropout.to_string())
        .formula(
            "n₁ = [Zα/2 × √((1 + 1/k) p̄ q̄) + Zβ × √(p₁q₁ + p₂q₂/k)]² / (p₁ − p₂)²",
            "p₁, p₂ = response rates, p̄ = (p₁ + k p₂)/(1 + k), k = allocation ratio; \
             each arm is then divided by (1 − dropout)",
        );

    let builder = terms.steps(z.steps(builder), p1, p2, ratio, &z);

    Ok(sizes
        .record(builder, terms.n1, ratio, dropout)
        .number("Absolute risk difference", (p1 - p2).abs(), STAT_PLACES)
        .interpretation(format!(
            "Randomize {} and {} participants ({} in total, {} after allowing {} dropout) to detect \
             response rates of {} vs {} with {} power at two-sided α = {}.",
            sizes.n1,
            sizes.n2,
            sizes.total(),
            sizes.total_adj(),
            dropout,
            percent(p1, 1),
            percent(p2, 1),
            percent(power, 0),
            trim(alpha)
        ))
        .recommend("Register the primary endpoint and analysis population before enrolment.")
        .recommend("Use stratified block randomization to keep the arms balanced.")
        .reference(CHOW)
        .build())
}

// ============================================================================
// Non-inferiority, binary endpoint
// ============================================================================

/// Input parameters for a non-inferiority trial.
///
/// `p1` is the control success rate and `p2` the expected rate under the
/// new treatment; `margin` is the largest acceptable loss of efficacy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonInferiorityBinaryInput {
    pub p1: f64,
    pub p2: f64,
    pub margin: f64,
    /// One-sided significance level
    pub alpha: f64,
    pub power: f64,
    pub ratio: f64,
    pub dropout: Percent,
}

impl NonInferiorityBinaryInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::probability("p1", self.p1)?;
        validation::probability("p2", self.p2)?;
        validation::within("margin", self.margin, 0.0, 1.0)?;
        validation::require(
            self.p2 - self.p1 + self.margin > 0.0,
            "margin",
            self.margin,
            "treatment is expected to be worse than control by more than the margin",
        )?;
        validate_common(self.alpha, self.power, self.ratio, self.dropout)
    }
}

impl FromParams for NonInferiorityBinaryInput {
    const FIELDS: &'static [&'static str] = &["p1", "p2", "margin", "alpha", "power", "ratio", "dropout"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(NonInferiorityBinaryInput {
            p1: params.number("p1")?,
            p2: params.number("p2")?,
            margin: params.number("margin")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
            ratio: params.number("ratio")?,
            dropout: params.percent("dropout")?,
        })
    }
}

/// Non-inferiority with a one-sided Zα and denominator `(p₂ − p₁ + margin)²`
pub fn calculate_non_inferiority_binary(input: &NonInferiorityBinaryInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let NonInferiorityBinaryInput { p1, p2, margin, alpha, power, ratio, dropout } = *input;
    let z = DesignZ::new(alpha, power, Tails::One);
    let effect = p2 - p1 + margin;
    let terms = two_proportion_terms(p1, p2, ratio, &z, effect);
    let sizes = ArmSizes::new(terms.n1, ratio, dropout);

    let builder = ResultBuilder::new(STUDY_TYPE, "Non-inferiority trial, binary endpoint")
        .input("Control success rate (p₁)", trim(p1))
        .input("Treatment success rate (p₂)", trim(p2))
        .input("Non-inferiority margin (δ)", trim(margin))
        .input("Significance level (α, one-sided)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .input("Allocation ratio (k = n₂/n₁)", trim(ratio))
        .input("Dropout rate", dropout.to_string())
        .formula(
            "n₁ = [Zα × √((1 + 1/k) p̄ q̄) + Zβ × √(p₁q₁ + p₂q₂/k)]² / (p₂ − p₁ + δ)²",
            "p₁ = control rate, p₂ = treatment rate, δ = non-inferiority margin, Zα one-sided",
        );

    let builder = z
        .steps(builder)
        .step(
            "Margin-adjusted difference",
            format!("{} − {} + {} = {}", trim(p2), trim(p1), trim(margin), fixed(effect, Z_PLACES)),
        );
    let builder = terms.steps(builder, p1, p2, ratio, &z);

    Ok(sizes
        .record(builder, terms.n1, ratio, dropout)
        .interpretation(format!(
            "With {} per arm ({} and {}; {} after dropout) the trial has {} power to show the new treatment \
             is no more than {} worse than control at one-sided α = {}.",
            sizes.n1.max(sizes.n2),
            sizes.n1,
            sizes.n2,
            sizes.total_adj(),
            percent(power, 0),
            percent(margin, 1),
            trim(alpha)
        ))
        .recommend("Justify the margin clinically and from historical placebo-controlled evidence.")
        .recommend("Analyse both per-protocol and intention-to-treat populations; conclusions should agree.")
        .reference(CHOW)
        .build())
}

// ============================================================================
// Equivalence, binary endpoint (TOST)
// ============================================================================

/// Input parameters for an equivalence trial (two one-sided tests).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquivalenceBinaryInput {
    pub p1: f64,
    pub p2: f64,
    /// Equivalence margin
    pub margin: f64,
    pub alpha: f64,
    pub power: f64,
    pub ratio: f64,
    pub dropout: Percent,
}

impl EquivalenceBinaryInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::probability("p1", self.p1)?;
        validation::probability("p2", self.p2)?;
        validation::within("margin", self.margin, 0.0, 1.0)?;
        validation::require(
            (self.p1 - self.p2).abs() < self.margin,
            "margin",
            self.margin,
            "the expected difference must be smaller than the equivalence margin",
        )?;
        validate_common(self.alpha, self.power, self.ratio, self.dropout)
    }
}

impl FromParams for EquivalenceBinaryInput {
    const FIELDS: &'static [&'static str] = &["p1", "p2", "margin", "alpha", "power", "ratio", "dropout"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(EquivalenceBinaryInput {
            p1: params.number("p1")?,
            p2: params.number("p2")?,
            margin: params.number("margin")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
            ratio: params.number("ratio")?,
            dropout: params.percent("dropout")?,
        })
    }
}

/// Equivalence by TOST: one-sided Zα, denominator `(margin − |p₁ − p₂|)²`,
/// and the unrounded n doubled for the two tests.
pub fn calculate_equivalence_binary(input: &EquivalenceBinaryInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let EquivalenceBinaryInput { p1, p2, margin, alpha, power, ratio, dropout } = *input;
    let z = DesignZ::new(alpha, power, Tails::One);
    let effect = margin - (p1 - p2).abs();
    let terms = two_proportion_terms(p1, p2, ratio, &z, effect);
    let n1_raw = 2.0 * terms.n1;
    let sizes = ArmSizes::new(n1_raw, ratio, dropout);

    let builder = ResultBuilder::new(STUDY_TYPE, "Equivalence trial, binary endpoint (TOST)")
        .input("Response rate, group 1 (p₁)", trim(p1))
        .input("Response rate, group 2 (p₂)", trim(p2))
        .input("Equivalence margin (δ)", trim(margin))
        .input("Significance level (α, each one-sided test)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .input("Allocation ratio (k = n₂/n₁)", trim(ratio))
        .input("Dropout rate", dropout.to_string())
        .formula(
            "n₁ = 2 × [Zα × √((1 + 1/k) p̄ q̄) + Zβ × √(p₁q₁ + p₂q₂/k)]² / (δ − |p₁ − p₂|)²",
            "δ = equivalence margin, Zα one-sided for each of the two one-sided tests",
        );

    let builder = z.steps(builder).step(
        "Distance to the margin",
        format!(
            "{} − |{} − {}| = {}",
            trim(margin),
            trim(p1),
            trim(p2),
            fixed(effect, Z_PLACES)
        ),
    );
    let builder = terms
        .steps(builder, p1, p2, ratio, &z)
        .step("Two one-sided tests", format!("n₁ = 2 × {} = {}", fixed(terms.n1, 2), fixed(n1_raw, 2)));

    Ok(sizes
        .record(builder, n1_raw, ratio, dropout)
        .interpretation(format!(
            "Randomize {} and {} participants ({} after {} dropout) to conclude the response rates lie \
             within ±{} of each other with {} power.",
            sizes.n1,
            sizes.n2,
            sizes.total_adj(),
            dropout,
            percent(margin, 1),
            percent(power, 0)
        ))
        .recommend("Report the 90% two-sided confidence interval; equivalence holds when it lies inside ±margin.")
        .recommend_if(
            effect < margin / 2.0,
            "The expected difference uses most of the margin; a small misjudgement inflates n sharply.",
        )
        .reference(CHOW)
        .build())
}

// ============================================================================
// Superiority, continuous endpoint
// ============================================================================

/// Input parameters for a superiority trial with a continuous endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperiorityContinuousInput {
    /// Clinically important mean difference
    pub mean_diff: f64,
    /// Common standard deviation
    pub sd: f64,
    pub alpha: f64,
    pub power: f64,
    pub ratio: f64,
    pub dropout: Percent,
}

impl SuperiorityContinuousInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::require(self.mean_diff != 0.0, "meanDiff", self.mean_diff, "must not be zero")?;
        validation::positive("sd", self.sd)?;
        validate_common(self.alpha, self.power, self.ratio, self.dropout)
    }
}

impl FromParams for SuperiorityContinuousInput {
    const FIELDS: &'static [&'static str] = &["meanDiff", "sd", "alpha", "power", "ratio", "dropout"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(SuperiorityContinuousInput {
            mean_diff: params.number("meanDiff")?,
            sd: params.number("sd")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
            ratio: params.number("ratio")?,
            dropout: params.percent("dropout")?,
        })
    }
}

pub fn calculate_superiority_continuous(input: &SuperiorityContinuousInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let SuperiorityContinuousInput { mean_diff, sd, alpha, power, ratio, dropout } = *input;
    let z = DesignZ::new(alpha, power, Tails::Two);
    let delta = mean_diff.abs();
    let n1_raw = two_mean_n1(sd, sd, ratio, delta, &z);
    let sizes = ArmSizes::new(n1_raw, ratio, dropout);
    let d = delta / sd;

    let builder = ResultBuilder::new(STUDY_TYPE, "Superiority trial, continuous endpoint")
        .input("Mean difference (Δ)", trim(mean_diff))
        .input("Standard deviation (σ)", trim(sd))
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .input("Allocation ratio (k = n₂/n₁)", trim(ratio))
        .input("Dropout rate", dropout.to_string())
        .formula(
            "n₁ = (Zα/2 + Zβ)² × σ² × (1 + 1/k) / Δ²",
            "Δ = clinically important difference, σ = common SD, k = allocation ratio",
        );

    let builder = z.steps(builder).step(
        "Sample size for group 1",
        format!(
            "n₁ = ({} + {})² × {}² × (1 + 1/{}) / {}² = {}",
            fixed(z.z_alpha, Z_PLACES),
            fixed(z.z_beta, Z_PLACES),
            trim(sd),
            trim(ratio),
            trim(delta),
            fixed(n1_raw, 2)
        ),
    );

    Ok(sizes
        .record(builder, n1_raw, ratio, dropout)
        .number("Cohen's d", d, STAT_PLACES)
        .interpretation(format!(
            "Randomize {} and {} participants ({} after {} dropout) to detect a difference of {} \
             ({} effect, d = {}) with {} power at α = {}.",
            sizes.n1,
            sizes.n2,
            sizes.total_adj(),
            dropout,
            trim(delta),
            cohen_magnitude(d),
            fixed(d, STAT_PLACES),
            percent(power, 0),
            trim(alpha)
        ))
        .recommend("Adjusting for the baseline value (ANCOVA) typically reduces the required size.")
        .reference(CHOW)
        .build())
}
