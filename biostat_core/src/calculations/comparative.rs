//! # Comparative (Observational) Studies
//!
//! Two-group designs that compare a binary exposure or outcome:
//!
//! - [`calculate_case_control`] - exposure odds ratio between cases and controls
//! - [`calculate_cohort`] - incidence risk ratio between exposed and unexposed
//! - [`calculate_cross_sectional`] - two prevalences
//! - [`calculate_matched_pairs`] - discordant-pair McNemar design
//!
//! The first three share the pooled-variance formula in
//! [`two_proportion_terms`](super::common::two_proportion_terms); they differ
//! only in how the second proportion is derived.

use serde::{Deserialize, Serialize};

use crate::distributions::Tails;
use crate::errors::CalcResult;
use crate::format::{ceil_count, fixed, percent, trim, STAT_PLACES, Z_PLACES};
use crate::params::{FromParams, Params};
use crate::result::{CalculationResult, ResultBuilder};
use crate::validation;

use super::common::{allocate, two_proportion_terms, DesignZ};

const STUDY_TYPE: &str = "Comparative / Observational";

const FLEISS: &str = "Fleiss JL, Levin B, Paik MC. Statistical Methods for Rates and Proportions. 3rd ed. Wiley; 2003.";

/// Labels for the two arms of a design
struct Arms {
    first: &'static str,
    second: &'static str,
}

/// Shared tail of the two-proportion designs: Z steps, the pooled formula,
/// allocation, and the size results.
fn two_proportion_body(
    builder: ResultBuilder,
    p1: f64,
    p2: f64,
    ratio: f64,
    z: &DesignZ,
    arms: &Arms,
) -> (ResultBuilder, u64, u64) {
    let delta = (p1 - p2).abs();
    let terms = two_proportion_terms(p1, p2, ratio, z, delta);
    let (n1, n2) = allocate(terms.n1, ratio);

    let builder = terms
        .steps(z.steps(builder), p1, p2, ratio, z)
        .step(
            "Round up and allocate",
            format!(
                "{} = ⌈{}⌉ = {}, {} = ⌈{} × {}⌉ = {}",
                arms.first,
                fixed(terms.n1, 2),
                n1,
                arms.second,
                trim(ratio),
                n1,
                n2
            ),
        )
        .count(arms.first, n1)
        .count(arms.second, n2)
        .count("Total sample size", n1 + n2);
    (builder, n1, n2)
}

// ============================================================================
// Case-control
// ============================================================================

/// Input parameters for an unmatched case-control study.
///
/// ## JSON Example
///
/// ```json
/// { "p0": 0.3, "or": 2, "alpha": 0.05, "power": 0.8, "ratio": 1 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseControlInput {
    /// Proportion of controls exposed
    pub p0: f64,
    /// Odds ratio to detect
    #[serde(rename = "or")]
    pub odds_ratio: f64,
    pub alpha: f64,
    pub power: f64,
    /// Controls per case
    pub ratio: f64,
}

impl CaseControlInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::probability("p0", self.p0)?;
        validation::positive("or", self.odds_ratio)?;
        validation::differ("or", 1.0, self.odds_ratio)?;
        validation::alpha(self.alpha)?;
        validation::power(self.power)?;
        validation::ratio(self.ratio)
    }

    /// Exposure proportion among cases implied by the odds ratio
    pub fn p1(&self) -> f64 {
        self.odds_ratio * self.p0 / (1.0 + self.p0 * (self.odds_ratio - 1.0))
    }
}

impl FromParams for CaseControlInput {
    const FIELDS: &'static [&'static str] = &["p0", "or", "alpha", "power", "ratio"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(CaseControlInput {
            p0: params.number("p0")?,
            odds_ratio: params.number("or")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
            ratio: params.number("ratio")?,
        })
    }
}

/// Case-control sample size.
///
/// ```text
/// p₁ = OR·p₀ / (1 + p₀(OR − 1))
/// ```
/// then the pooled two-proportion formula with cases as group 1.
pub fn calculate_case_control(input: &CaseControlInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let CaseControlInput { p0, odds_ratio, alpha, power, ratio } = *input;
    let p1 = input.p1();
    let z = DesignZ::new(alpha, power, Tails::Two);

    let builder = ResultBuilder::new(STUDY_TYPE, "Unmatched case-control (odds ratio)")
        .input("Exposure among controls (p₀)", trim(p0))
        .input("Odds ratio (OR)", trim(odds_ratio))
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .input("Controls per case (k)", trim(ratio))
        .formula(
            "n = [Zα/2 × √((1 + 1/k) p̄ q̄) + Zβ × √(p₁q₁ + p₀q₀/k)]² / (p₁ − p₀)²",
            "p₁ = OR × p₀ / (1 + p₀(OR − 1)) = exposure among cases, p₀ = exposure among controls, \
             p̄ = (p₁ + k p₀)/(1 + k), k = controls per case",
        )
        .step(
            "Exposure among cases",
            format!(
                "p₁ = {} × {} / (1 + {} × ({} − 1)) = {}",
                trim(odds_ratio),
                trim(p0),
                trim(p0),
                trim(odds_ratio),
                fixed(p1, Z_PLACES)
            ),
        );

    let arms = Arms { first: "Cases", second: "Controls" };
    let (builder, cases, controls) = two_proportion_body(builder, p1, p0, ratio, &z, &arms);

    Ok(builder
        .number("Exposure among cases (p₁)", p1, STAT_PLACES)
        .interpretation(format!(
            "To detect an odds ratio of {} when {} of controls are exposed, recruit {} cases and {} controls \
             ({} power, α = {}).",
            trim(odds_ratio),
            percent(p0, 1),
            cases,
            controls,
            percent(power, 0),
            trim(alpha)
        ))
        .recommend("Draw controls from the same source population as the cases.")
        .recommend_if(
            ratio < 4.0,
            "Up to four controls per case can recover power when cases are scarce; beyond four the gain is small.",
        )
        .recommend("Plan adjustment for confounders; it usually needs a larger sample than the crude comparison.")
        .reference(FLEISS)
        .build())
}

// ============================================================================
// Cohort
// ============================================================================

/// Input parameters for a cohort study comparing incidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortInput {
    /// Incidence among the unexposed
    pub p0: f64,
    /// Relative risk to detect
    pub rr: f64,
    pub alpha: f64,
    pub power: f64,
    /// Unexposed per exposed subject
    pub ratio: f64,
}

impl CohortInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::probability("p0", self.p0)?;
        validation::positive("rr", self.rr)?;
        validation::differ("rr", 1.0, self.rr)?;
        validation::require(
            self.rr * self.p0 < 1.0,
            "rr",
            self.rr,
            "incidence in exposed group exceeds 100%",
        )?;
        validation::alpha(self.alpha)?;
        validation::power(self.power)?;
        validation::ratio(self.ratio)
    }
}

impl FromParams for CohortInput {
    const FIELDS: &'static [&'static str] = &["p0", "rr", "alpha", "power", "ratio"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(CohortInput {
            p0: params.number("p0")?,
            rr: params.number("rr")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
            ratio: params.number("ratio")?,
        })
    }
}

/// Cohort sample size with `p₁ = RR · p₀`
pub fn calculate_cohort(input: &CohortInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let CohortInput { p0, rr, alpha, power, ratio } = *input;
    let p1 = rr * p0;
    let z = DesignZ::new(alpha, power, Tails::Two);

    let builder = ResultBuilder::new(STUDY_TYPE, "Cohort study (relative risk)")
        .input("Incidence in unexposed (p₀)", trim(p0))
        .input("Relative risk (RR)", trim(rr))
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .input("Unexposed per exposed (k)", trim(ratio))
        .formula(
            "n = [Zα/2 × √((1 + 1/k) p̄ q̄) + Zβ × √(p₁q₁ + p₀q₀/k)]² / (p₁ − p₀)²",
            "p₁ = RR × p₀ = incidence in exposed, p₀ = incidence in unexposed, k = unexposed per exposed",
        )
        .step(
            "Incidence in exposed",
            format!("p₁ = {} × {} = {}", trim(rr), trim(p0), fixed(p1, Z_PLACES)),
        );

    let arms = Arms { first: "Exposed", second: "Unexposed" };
    let (builder, exposed, unexposed) = two_proportion_body(builder, p1, p0, ratio, &z, &arms);

    Ok(builder
        .number("Incidence in exposed (p₁)", p1, STAT_PLACES)
        .interpretation(format!(
            "Following {} exposed and {} unexposed subjects detects a relative risk of {} \
             (incidence {} vs {}) with {} power at α = {}.",
            exposed,
            unexposed,
            trim(rr),
            percent(p1, 1),
            percent(p0, 1),
            percent(power, 0),
            trim(alpha)
        ))
        .recommend("Add an allowance for loss to follow-up; cohort attrition compounds over time.")
        .recommend_if(p0 < 0.05, "The outcome is rare; a case-control design may be more efficient.")
        .reference(FLEISS)
        .build())
}

// ============================================================================
// Cross-sectional
// ============================================================================

/// Input parameters for comparing two prevalences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossSectionalInput {
    pub p1: f64,
    pub p2: f64,
    pub alpha: f64,
    pub power: f64,
    pub ratio: f64,
}

impl CrossSectionalInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::probability("p1", self.p1)?;
        validation::probability("p2", self.p2)?;
        validation::differ("p2", self.p1, self.p2)?;
        validation::alpha(self.alpha)?;
        validation::power(self.power)?;
        validation::ratio(self.ratio)
    }
}

impl FromParams for CrossSectionalInput {
    const FIELDS: &'static [&'static str] = &["p1", "p2", "alpha", "power", "ratio"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(CrossSectionalInput {
            p1: params.number("p1")?,
            p2: params.number("p2")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
            ratio: params.number("ratio")?,
        })
    }
}

pub fn calculate_cross_sectional(input: &CrossSectionalInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let CrossSectionalInput { p1, p2, alpha, power, ratio } = *input;
    let z = DesignZ::new(alpha, power, Tails::Two);

    let builder = ResultBuilder::new(STUDY_TYPE, "Comparison of two prevalences")
        .input("Prevalence, group 1 (p₁)", trim(p1))
        .input("Prevalence, group 2 (p₂)", trim(p2))
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .input("Allocation ratio (k = n₂/n₁)", trim(ratio))
        .formula(
            "n₁ = [Zα/2 × √((1 + 1/k) p̄ q̄) + Zβ × √(p₁q₁ + p₂q₂/k)]² / (p₁ − p₂)²",
            "p₁, p₂ = group prevalences, p̄ = (p₁ + k p₂)/(1 + k), q = 1 − p, k = allocation ratio",
        );

    let arms = Arms { first: "Group 1 (n₁)", second: "Group 2 (n₂)" };
    let (builder, n1, n2) = two_proportion_body(builder, p1, p2, ratio, &z, &arms);

    Ok(builder
        .number("Prevalence difference", p1 - p2, STAT_PLACES)
        .interpretation(format!(
            "Sampling {} from group 1 and {} from group 2 detects prevalences of {} vs {} \
             with {} power at α = {}.",
            n1,
            n2,
            percent(p1, 1),
            percent(p2, 1),
            percent(power, 0),
            trim(alpha)
        ))
        .recommend("A cross-sectional comparison shows association, not temporal order.")
        .recommend("If sampling is clustered, multiply by the design effect.")
        .reference(FLEISS)
        .build())
}

// ============================================================================
// Matched pairs (McNemar)
// ============================================================================

/// Input parameters for a 1:1 matched design analysed with McNemar's test.
///
/// `p10` and `p01` are the expected proportions of discordant pairs in each
/// direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedPairsInput {
    pub p10: f64,
    pub p01: f64,
    pub alpha: f64,
    pub power: f64,
}

impl MatchedPairsInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::probability("p10", self.p10)?;
        validation::probability("p01", self.p01)?;
        validation::differ("p01", self.p10, self.p01)?;
        validation::require(
            self.p10 + self.p01 <= 1.0,
            "p01",
            self.p01,
            "discordant proportions must not sum to more than 1",
        )?;
        validation::alpha(self.alpha)?;
        validation::power(self.power)
    }
}

impl FromParams for MatchedPairsInput {
    const FIELDS: &'static [&'static str] = &["p10", "p01", "alpha", "power"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(MatchedPairsInput {
            p10: params.number("p10")?,
            p01: params.number("p01")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
        })
    }
}

/// Connor's McNemar sample size.
///
/// ```text
/// n = [Zα/2·√ψ + Zβ·√(ψ − δ²)]² / δ²,   ψ = p₁₀ + p₀₁,  δ = p₁₀ − p₀₁
/// ```
pub fn calculate_matched_pairs(input: &MatchedPairsInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let MatchedPairsInput { p10, p01, alpha, power } = *input;
    let z = DesignZ::new(alpha, power, Tails::Two);
    let psi = p10 + p01;
    let delta = p10 - p01;
    let n_raw = (z.z_alpha * psi.sqrt() + z.z_beta * (psi - delta.powi(2)).sqrt()).powi(2) / delta.powi(2);
    let pairs = ceil_count(n_raw);
    let discordant = ceil_count(pairs as f64 * psi);

    let builder = ResultBuilder::new(STUDY_TYPE, "Matched pairs (McNemar)")
        .input("Discordant proportion p₁₀", trim(p10))
        .input("Discordant proportion p₀₁", trim(p01))
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .formula(
            "n = [Zα/2 × √ψ + Zβ × √(ψ − δ²)]² / δ²",
            "ψ = p₁₀ + p₀₁ = proportion of discordant pairs, δ = p₁₀ − p₀₁",
        );

    Ok(z.steps(builder)
        .step(
            "Discordant proportion",
            format!("ψ = {} + {} = {}", trim(p10), trim(p01), fixed(psi, Z_PLACES)),
        )
        .step(
            "Difference",
            format!("δ = {} − {} = {}", trim(p10), trim(p01), fixed(delta, Z_PLACES)),
        )
        .step(
            "Number of pairs",
            format!(
                "n = ({} × √{} + {} × √({} − {}²))² / {}² = {}",
                fixed(z.z_alpha, Z_PLACES),
                fixed(psi, Z_PLACES),
                fixed(z.z_beta, Z_PLACES),
                fixed(psi, Z_PLACES),
                fixed(delta, Z_PLACES),
                fixed(delta, Z_PLACES),
                fixed(n_raw, 2)
            ),
        )
        .step("Round up", format!("n = ⌈{}⌉ = {}", fixed(n_raw, 2), pairs))
        .count("Number of pairs", pairs)
        .count("Total subjects", pairs * 2)
        .count("Expected discordant pairs", discordant)
        .number("Matched odds ratio", p10 / p01, STAT_PLACES)
        .interpretation(format!(
            "{} matched pairs ({} subjects) are needed; about {} pairs are expected to be discordant \
             and carry all the information for McNemar's test.",
            pairs,
            pairs * 2,
            discordant
        ))
        .recommend("Pilot data on discordance rates matter more than the marginal proportions here.")
        .reference("Connor RJ. Sample size for testing differences in proportions for the paired-sample design. Biometrics. 1987;43(1):207-211.")
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn count(result: &CalculationResult, label: &str) -> u64 {
        result.result(label).unwrap().as_count().unwrap()
    }

    #[test]
    fn test_case_control_equal_groups() {
        let input = CaseControlInput {
            p0: 0.3,
            odds_ratio: 2.0,
            alpha: 0.05,
            power: 0.8,
            ratio: 1.0,
        };
        assert_abs_diff_eq!(input.p1(), 0.461538, epsilon = 1e-6);
        let result = calculate_case_control(&input).unwrap();
        // unrounded 140.66
        assert_eq!(count(&result, "Cases"), 141);
        assert_eq!(count(&result, "Controls"), 141);
        assert_eq!(count(&result, "Total sample size"), 282);
    }

    #[test]
    fn test_case_control_more_controls_fewer_cases() {
        let input = CaseControlInput {
            p0: 0.3,
            odds_ratio: 2.0,
            alpha: 0.05,
            power: 0.8,
            ratio: 2.0,
        };
        let result = calculate_case_control(&input).unwrap();
        // unrounded 104.11
        assert_eq!(count(&result, "Cases"), 105);
        assert_eq!(count(&result, "Controls"), 210);
    }

    #[test]
    fn test_case_control_rejects_null_odds_ratio() {
        let input = CaseControlInput {
            p0: 0.3,
            odds_ratio: 1.0,
            alpha: 0.05,
            power: 0.8,
            ratio: 1.0,
        };
        assert_eq!(calculate_case_control(&input).unwrap_err().field(), Some("or"));
    }

    #[test]
    fn test_case_control_json_uses_or_key() {
        let input: CaseControlInput =
            serde_json::from_str(r#"{"p0":0.3,"or":2,"alpha":0.05,"power":0.8,"ratio":1}"#).unwrap();
        assert_eq!(input.odds_ratio, 2.0);
    }

    #[test]
    fn test_cohort() {
        let input = CohortInput {
            p0: 0.1,
            rr: 2.0,
            alpha: 0.05,
            power: 0.8,
            ratio: 1.0,
        };
        let result = calculate_cohort(&input).unwrap();
        // unrounded 198.96
        assert_eq!(count(&result, "Exposed"), 199);
        assert_eq!(count(&result, "Unexposed"), 199);
    }

    #[test]
    fn test_cohort_rejects_impossible_incidence() {
        let input = CohortInput {
            p0: 0.4,
            rr: 3.0,
            alpha: 0.05,
            power: 0.8,
            ratio: 1.0,
        };
        let err = calculate_cohort(&input).unwrap_err();
        assert_eq!(err.field(), Some("rr"));
        assert!(err.to_string().contains("exceeds 100%"));
    }

    #[test]
    fn test_cross_sectional_and_ratio() {
        let mut input = CrossSectionalInput {
            p1: 0.3,
            p2: 0.2,
            alpha: 0.05,
            power: 0.8,
            ratio: 1.0,
        };
        let equal = calculate_cross_sectional(&input).unwrap();
        assert_eq!(count(&equal, "Group 1 (n₁)"), 294);
        input.ratio = 2.0;
        let unequal = calculate_cross_sectional(&input).unwrap();
        assert_eq!(count(&unequal, "Group 1 (n₁)"), 216);
        assert_eq!(count(&unequal, "Group 2 (n₂)"), 432);
        assert!(count(&unequal, "Total sample size") >= count(&equal, "Total sample size"));
    }

    #[test]
    fn test_larger_gap_needs_fewer() {
        let base = CrossSectionalInput {
            p1: 0.3,
            p2: 0.2,
            alpha: 0.05,
            power: 0.8,
            ratio: 1.0,
        };
        let wider = CrossSectionalInput { p2: 0.1, ..base.clone() };
        let n_base = count(&calculate_cross_sectional(&base).unwrap(), "Total sample size");
        let n_wider = count(&calculate_cross_sectional(&wider).unwrap(), "Total sample size");
        assert!(n_wider < n_base);
    }

    #[test]
    fn test_matched_pairs() {
        let input = MatchedPairsInput {
            p10: 0.2,
            p01: 0.1,
            alpha: 0.05,
            power: 0.8,
        };
        let result = calculate_matched_pairs(&input).unwrap();
        // unrounded 233.09
        assert_eq!(count(&result, "Number of pairs"), 234);
        assert_eq!(count(&result, "Total subjects"), 468);
        assert_eq!(result.result("Matched odds ratio").unwrap().as_f64(), Some(2.0));
    }

    #[test]
    fn test_matched_pairs_rejects_equal_discordance() {
        let input = MatchedPairsInput {
            p10: 0.15,
            p01: 0.15,
            alpha: 0.05,
            power: 0.8,
        };
        assert!(calculate_matched_pairs(&input).is_err());
    }
}
