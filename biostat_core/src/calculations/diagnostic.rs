//! # Diagnostic Accuracy
//!
//! - [`calculate_sensitivity_specificity`] - Buderer's sample size for
//!   estimating sensitivity and specificity to a given precision
//! - [`calculate_roc_auc`] - cases and controls to show an AUC beats a null value
//! - [`calculate_predictive_values`] - PPV/NPV and likelihood ratios at a prevalence

use serde::{Deserialize, Serialize};

use crate::distributions::{z_alpha, Tails};
use crate::errors::CalcResult;
use crate::format::{ceil_count, fixed, percent, trim, STAT_PLACES, Z_PLACES};
use crate::params::{FromParams, Params};
use crate::result::{CalculationResult, ResultBuilder};
use crate::validation;

use super::common::{allocate, DesignZ};

const STUDY_TYPE: &str = "Diagnostic accuracy";

// ============================================================================
// Sensitivity & specificity (Buderer)
// ============================================================================

/// Input parameters for estimating sensitivity and specificity.
///
/// ## JSON Example
///
/// ```json
/// { "sensitivity": 0.9, "specificity": 0.85, "prevalence": 0.2, "d": 0.05, "alpha": 0.05 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivitySpecificityInput {
    pub sensitivity: f64,
    pub specificity: f64,
    /// Prevalence of the target condition in the study population
    pub prevalence: f64,
    /// Absolute precision for both estimates
    pub d: f64,
    pub alpha: f64,
}

impl SensitivitySpecificityInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::probability("sensitivity", self.sensitivity)?;
        validation::probability("specificity", self.specificity)?;
        validation::probability("prevalence", self.prevalence)?;
        validation::within("d", self.d, 0.0, 0.5)?;
        validation::alpha(self.alpha)
    }
}

impl FromParams for SensitivitySpecificityInput {
    const FIELDS: &'static [&'static str] = &["sensitivity", "specificity", "prevalence", "d", "alpha"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(SensitivitySpecificityInput {
            sensitivity: params.number("sensitivity")?,
            specificity: params.number("specificity")?,
            prevalence: params.number("prevalence")?,
            d: params.number("d")?,
            alpha: params.number("alpha")?,
        })
    }
}

/// Buderer (1996).
///
/// ```text
/// n_Se = Z²·Se(1 − Se) / d² / prev
/// n_Sp = Z²·Sp(1 − Sp) / d² / (1 − prev)
/// n    = max(n_Se, n_Sp)
/// ```
pub fn calculate_sensitivity_specificity(input: &SensitivitySpecificityInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let SensitivitySpecificityInput { sensitivity, specificity, prevalence, d, alpha } = *input;
    let z = z_alpha(alpha, Tails::Two);

    let diseased = z.powi(2) * sensitivity * (1.0 - sensitivity) / d.powi(2);
    let healthy = z.powi(2) * specificity * (1.0 - specificity) / d.powi(2);
    let n_se_raw = diseased / prevalence;
    let n_sp_raw = healthy / (1.0 - prevalence);
    let n_se = ceil_count(n_se_raw);
    let n_sp = ceil_count(n_sp_raw);
    let required = n_se.max(n_sp);
    let driver = if n_se >= n_sp { "sensitivity" } else { "specificity" };

    Ok(ResultBuilder::new(STUDY_TYPE, "Sensitivity and specificity (Buderer)")
        .input("Expected sensitivity", percent(sensitivity, 1))
        .input("Expected specificity", percent(specificity, 1))
        .input("Prevalence", percent(prevalence, 1))
        .input("Precision (d)", trim(d))
        .input("Significance level (α)", trim(alpha))
        .formula(
            "n_Se = Z² × Se(1 − Se) / (d² × prev),  n_Sp = Z² × Sp(1 − Sp) / (d² × (1 − prev)),  n = max",
            "Se = sensitivity, Sp = specificity, d = precision, prev = prevalence of the condition",
        )
        .step("Z-score", format!("Z = Φ⁻¹(1 − {}/2) = {}", trim(alpha), fixed(z, Z_PLACES)))
        .step(
            "Diseased subjects for sensitivity",
            format!(
                "{}² × {} × {} / {}² = {}",
                fixed(z, Z_PLACES),
                trim(sensitivity),
                trim(1.0 - sensitivity),
                trim(d),
                fixed(diseased, 2)
            ),
        )
        .step(
            "Total for sensitivity",
            format!("n_Se = {} / {} = {} → {}", fixed(diseased, 2), trim(prevalence), fixed(n_se_raw, 2), n_se),
        )
        .step(
            "Non-diseased subjects for specificity",
            format!(
                "{}² × {} × {} / {}² = {}",
                fixed(z, Z_PLACES),
                trim(specificity),
                trim(1.0 - specificity),
                trim(d),
                fixed(healthy, 2)
            ),
        )
        .step(
            "Total for specificity",
            format!(
                "n_Sp = {} / {} = {} → {}",
                fixed(healthy, 2),
                trim(1.0 - prevalence),
                fixed(n_sp_raw, 2),
                n_sp
            ),
        )
        .step("Required", format!("n = max({}, {}) = {}", n_se, n_sp, required))
        .count("Required sample size", required)
        .count("For sensitivity", n_se)
        .count("For specificity", n_sp)
        .count("Expected diseased", ceil_count(required as f64 * prevalence))
        .interpretation(format!(
            "Enrol {} consecutive subjects; the {} estimate drives the size. At a prevalence of {} \
             about {} of them will have the condition.",
            required,
            driver,
            percent(prevalence, 1),
            ceil_count(required as f64 * prevalence)
        ))
        .recommend("Recruit consecutive or random patients from the intended-use population to avoid spectrum bias.")
        .recommend_if(
            prevalence < 0.1,
            "Low prevalence makes sensitivity expensive to estimate; consider enriching with known cases.",
        )
        .reference("Buderer NM. Statistical methodology: I. Incorporating the prevalence of disease into the sample size calculation for sensitivity and specificity. Acad Emerg Med. 1996;3(9):895-900.")
        .build())
}

// ============================================================================
// ROC area under the curve
// ============================================================================

/// Input parameters for testing an AUC against a null value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RocAucInput {
    /// Expected AUC
    pub auc: f64,
    /// AUC under the null hypothesis (0.5 for an uninformative test)
    pub auc0: f64,
    pub alpha: f64,
    pub power: f64,
    /// Controls per case
    pub ratio: f64,
}

impl RocAucInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::within("auc", self.auc, 0.0, 1.0)?;
        validation::within("auc0", self.auc0, 0.0, 1.0)?;
        validation::differ("auc", self.auc0, self.auc)?;
        validation::alpha(self.alpha)?;
        validation::power(self.power)?;
        validation::ratio(self.ratio)
    }
}

impl FromParams for RocAucInput {
    const FIELDS: &'static [&'static str] = &["auc", "auc0", "alpha", "power", "ratio"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(RocAucInput {
            auc: params.number("auc")?,
            auc0: params.number("auc0")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
            ratio: params.number("ratio")?,
        })
    }
}

/// Hanley–McNeil variance of an AUC with `k` controls per case
pub fn auc_variance(auc: f64, k: f64) -> f64 {
    let q1 = auc / (2.0 - auc);
    let q2 = 2.0 * auc.powi(2) / (1.0 + auc);
    q1 + q2 / k - auc.powi(2) * (1.0 + 1.0 / k)
}

/// Obuchowski's sample size for a single AUC.
///
/// ```text
/// n_cases = (Zα/2·√V(A₀) + Zβ·√V(A₁))² / (A₁ − A₀)²
/// ```
pub fn calculate_roc_auc(input: &RocAucInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let RocAucInput { auc, auc0, alpha, power, ratio } = *input;
    let z = DesignZ::new(alpha, power, Tails::Two);
    let v0 = auc_variance(auc0, ratio);
    let v1 = auc_variance(auc, ratio);
    let delta = auc - auc0;
    let n_raw = (z.z_alpha * v0.sqrt() + z.z_beta * v1.sqrt()).powi(2) / delta.powi(2);
    let (cases, controls) = allocate(n_raw, ratio);

    let builder = ResultBuilder::new(STUDY_TYPE, "ROC curve area (Hanley–McNeil / Obuchowski)")
        .input("Expected AUC (A₁)", trim(auc))
        .input("Null AUC (A₀)", trim(auc0))
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .input("Controls per case (k)", trim(ratio))
        .formula(
            "n = (Zα/2 × √V(A₀) + Zβ × √V(A₁))² / (A₁ − A₀)²,  V(A) = Q₁ + Q₂/k − A²(1 + 1/k)",
            "Q₁ = A/(2 − A), Q₂ = 2A²/(1 + A), k = controls per case, n = number of cases",
        );

    Ok(z.steps(builder)
        .step("Variance under H₀", format!("V({}) = {}", trim(auc0), fixed(v0, Z_PLACES)))
        .step("Variance under H₁", format!("V({}) = {}", trim(auc), fixed(v1, Z_PLACES)))
        .step(
            "Number of cases",
            format!(
                "n = ({} × √{} + {} × √{})² / {}² = {}",
                fixed(z.z_alpha, Z_PLACES),
                fixed(v0, Z_PLACES),
                fixed(z.z_beta, Z_PLACES),
                fixed(v1, Z_PLACES),
                fixed(delta, Z_PLACES),
                fixed(n_raw, 2)
            ),
        )
        .step(
            "Round up and allocate",
            format!("cases = {}, controls = ⌈{} × {}⌉ = {}", cases, trim(ratio), cases, controls),
        )
        .count("Cases", cases)
        .count("Controls", controls)
        .count("Total sample size", cases + controls)
        .interpretation(format!(
            "{} cases and {} controls give {} power to show an AUC of {} {} {} at α = {}.",
            cases,
            controls,
            percent(power, 0),
            trim(auc),
            if delta > 0.0 { "exceeds" } else { "falls below" },
            trim(auc0),
            trim(alpha)
        ))
        .recommend_if(
            cases < 30,
            "Very small groups make the AUC variance unstable; aim for at least 30 cases.",
        )
        .recommend("Predefine the reference standard and any threshold before unblinding the index test.")
        .reference("Hanley JA, McNeil BJ. The meaning and use of the area under a receiver operating characteristic (ROC) curve. Radiology. 1982;143(1):29-36. Obuchowski NA. Sample size calculations in studies of test accuracy. Stat Methods Med Res. 1998;7(4):371-392.")
        .build())
}

// ============================================================================
// Predictive values
// ============================================================================

/// Test characteristics at a given prevalence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveValuesInput {
    pub sensitivity: f64,
    pub specificity: f64,
    pub prevalence: f64,
}

impl PredictiveValuesInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::probability("sensitivity", self.sensitivity)?;
        validation::probability("specificity", self.specificity)?;
        validation::probability("prevalence", self.prevalence)
    }
}

impl FromParams for PredictiveValuesInput {
    const FIELDS: &'static [&'static str] = &["sensitivity", "specificity", "prevalence"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(PredictiveValuesInput {
            sensitivity: params.number("sensitivity")?,
            specificity: params.number("specificity")?,
            prevalence: params.number("prevalence")?,
        })
    }
}

/// PPV and NPV by Bayes' theorem, with likelihood ratios and post-test odds.
pub fn calculate_predictive_values(input: &PredictiveValuesInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let PredictiveValuesInput { sensitivity: se, specificity: sp, prevalence: prev } = *input;
    let true_pos = se * prev;
    let false_pos = (1.0 - sp) * (1.0 - prev);
    let true_neg = sp * (1.0 - prev);
    let false_neg = (1.0 - se) * prev;

    let ppv = true_pos / (true_pos + false_pos);
    let npv = true_neg / (true_neg + false_neg);
    let lr_pos = se / (1.0 - sp);
    let lr_neg = (1.0 - se) / sp;
    let accuracy = true_pos + true_neg;
    let pre_odds = prev / (1.0 - prev);
    let post_odds_pos = pre_odds * lr_pos;
    let post_odds_neg = pre_odds * lr_neg;

    Ok(ResultBuilder::new(STUDY_TYPE, "Predictive values (Bayes' theorem)")
        .input("Sensitivity", percent(se, 1))
        .input("Specificity", percent(sp, 1))
        .input("Prevalence", percent(prev, 1))
        .formula(
            "PPV = Se·prev / (Se·prev + (1 − Sp)(1 − prev)),  NPV = Sp(1 − prev) / (Sp(1 − prev) + (1 − Se)prev)",
            "Se = sensitivity, Sp = specificity, prev = pre-test probability; LR+ = Se/(1 − Sp), LR− = (1 − Se)/Sp",
        )
        .step(
            "Positive predictive value",
            format!(
                "PPV = {} / ({} + {}) = {}",
                fixed(true_pos, Z_PLACES),
                fixed(true_pos, Z_PLACES),
                fixed(false_pos, Z_PLACES),
                fixed(ppv, Z_PLACES)
            ),
        )
        .step(
            "Negative predictive value",
            format!(
                "NPV = {} / ({} + {}) = {}",
                fixed(true_neg, Z_PLACES),
                fixed(true_neg, Z_PLACES),
                fixed(false_neg, Z_PLACES),
                fixed(npv, Z_PLACES)
            ),
        )
        .step(
            "Likelihood ratios",
            format!(
                "LR+ = {} / {} = {}, LR− = {} / {} = {}",
                trim(se),
                trim(1.0 - sp),
                fixed(lr_pos, STAT_PLACES),
                trim(1.0 - se),
                trim(sp),
                fixed(lr_neg, STAT_PLACES)
            ),
        )
        .step(
            "Post-test odds",
            format!(
                "pre-test odds = {}, after positive = {}, after negative = {}",
                fixed(pre_odds, Z_PLACES),
                fixed(post_odds_pos, Z_PLACES),
                fixed(post_odds_neg, Z_PLACES)
            ),
        )
        .number("Positive predictive value", ppv, Z_PLACES)
        .number("Negative predictive value", npv, Z_PLACES)
        .number("Positive likelihood ratio", lr_pos, STAT_PLACES)
        .number("Negative likelihood ratio", lr_neg, STAT_PLACES)
        .number("Accuracy", accuracy, Z_PLACES)
        .number("Post-test odds (positive)", post_odds_pos, Z_PLACES)
        .number("Post-test odds (negative)", post_odds_neg, Z_PLACES)
        .interpretation(format!(
            "At a prevalence of {}, a positive result means a {} probability of disease and a negative \
             result a {} probability of being disease-free.",
            percent(prev, 1),
            percent(ppv, 1),
            percent(npv, 1)
        ))
        .recommend_if(
            ppv < 0.5,
            "Most positives will be false positives at this prevalence; use the test for rule-out or confirm positives.",
        )
        .recommend("Predictive values depend on prevalence; recompute them for each setting.")
        .reference("Altman DG, Bland JM. Diagnostic tests 2: Predictive values. BMJ. 1994;309(6947):102.")
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_buderer() {
        let input = SensitivitySpecificityInput {
            sensitivity: 0.9,
            specificity: 0.85,
            prevalence: 0.2,
            d: 0.05,
            alpha: 0.05,
        };
        let result = calculate_sensitivity_specificity(&input).unwrap();
        // 138.29 / 0.2 = 691.46 ; 195.91 / 0.8 = 244.89
        assert_eq!(result.result("For sensitivity").unwrap().as_count(), Some(692));
        assert_eq!(result.result("For specificity").unwrap().as_count(), Some(245));
        assert_eq!(result.headline().unwrap().1.as_count(), Some(692));
        assert!(result.interpretation().contains("sensitivity"));
    }

    #[test]
    fn test_auc_variance_under_null() {
        // A = 0.5, k = 1: 1/3 + 1/3 − 0.5
        assert_abs_diff_eq!(auc_variance(0.5, 1.0), 1.0 / 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(auc_variance(0.8, 1.0), 0.097778, epsilon = 1e-6);
    }

    #[test]
    fn test_roc_auc() {
        let mut input = RocAucInput {
            auc: 0.8,
            auc0: 0.5,
            alpha: 0.05,
            power: 0.8,
            ratio: 1.0,
        };
        let result = calculate_roc_auc(&input).unwrap();
        // unrounded 12.56
        assert_eq!(result.result("Cases").unwrap().as_count(), Some(13));
        assert_eq!(result.result("Controls").unwrap().as_count(), Some(13));

        input.ratio = 2.0;
        let result = calculate_roc_auc(&input).unwrap();
        // unrounded 9.06
        assert_eq!(result.result("Cases").unwrap().as_count(), Some(10));
        assert_eq!(result.result("Controls").unwrap().as_count(), Some(20));
    }

    #[test]
    fn test_roc_auc_below_null() {
        let input = RocAucInput {
            auc: 0.6,
            auc0: 0.8,
            alpha: 0.05,
            power: 0.8,
            ratio: 1.0,
        };
        let result = calculate_roc_auc(&input).unwrap();
        assert!(result.interpretation().contains("AUC of 0.6 falls below 0.8"));
        assert!(!result.interpretation().contains("exceeds"));
    }

    #[test]
    fn test_roc_rejects_equal_auc() {
        let input = RocAucInput {
            auc: 0.5,
            auc0: 0.5,
            alpha: 0.05,
            power: 0.8,
            ratio: 1.0,
        };
        assert_eq!(calculate_roc_auc(&input).unwrap_err().field(), Some("auc"));
    }

    #[test]
    fn test_predictive_values() {
        let input = PredictiveValuesInput {
            sensitivity: 0.9,
            specificity: 0.8,
            prevalence: 0.1,
        };
        let result = calculate_predictive_values(&input).unwrap();
        let value = |label: &str| result.result(label).unwrap().as_f64().unwrap();
        assert_abs_diff_eq!(value("Positive predictive value"), 0.3333, epsilon = 1e-4);
        assert_abs_diff_eq!(value("Negative predictive value"), 0.9863, epsilon = 1e-4);
        assert_abs_diff_eq!(value("Positive likelihood ratio"), 4.5, epsilon = 1e-9);
        assert_abs_diff_eq!(value("Negative likelihood ratio"), 0.125, epsilon = 1e-9);
        assert_abs_diff_eq!(value("Accuracy"), 0.81, epsilon = 1e-9);
        // low PPV triggers the rule-out advice
        assert!(result.recommendations().iter().any(|r| r.contains("false positives")));
    }
}
