//! # Effect Sizes
//!
//! Standardized effects from summary statistics:
//!
//! - [`calculate_cohens_d`] - standardized mean difference, Hedges' g and CI
//! - [`calculate_two_by_two`] - odds ratio, risk ratio, risk difference, NNT
//! - [`calculate_effect_conversion`] - d expressed as r, OR, η² and CLES
//!
//! All intervals are 95% (Z = 1.96).

use serde::{Deserialize, Serialize};

use crate::distributions::{normal_cdf, z_alpha, Tails};
use crate::errors::CalcResult;
use crate::format::{fixed, percent, trim, STAT_PLACES, Z_PLACES};
use crate::params::{FromParams, Params};
use crate::result::{CalculationResult, ResultBuilder};
use crate::validation;

use super::common::cohen_magnitude;

const STUDY_TYPE: &str = "Effect size";

/// Two-sided 95% critical value
fn z95() -> f64 {
    z_alpha(0.05, Tails::Two)
}

// ============================================================================
// Cohen's d
// ============================================================================

/// Group summaries for a standardized mean difference.
///
/// ## JSON Example
///
/// ```json
/// { "mean1": 75, "mean2": 70, "sd1": 15, "sd2": 15, "n1": 50, "n2": 50 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohensDInput {
    pub mean1: f64,
    pub mean2: f64,
    pub sd1: f64,
    pub sd2: f64,
    pub n1: u64,
    pub n2: u64,
}

impl CohensDInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::positive("sd1", self.sd1)?;
        validation::positive("sd2", self.sd2)?;
        validation::require(self.n1 >= 2, "n1", self.n1 as f64, "must be at least 2")?;
        validation::require(self.n2 >= 2, "n2", self.n2 as f64, "must be at least 2")
    }
}

impl FromParams for CohensDInput {
    const FIELDS: &'static [&'static str] = &["mean1", "mean2", "sd1", "sd2", "n1", "n2"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(CohensDInput {
            mean1: params.number("mean1")?,
            mean2: params.number("mean2")?,
            sd1: params.number("sd1")?,
            sd2: params.number("sd2")?,
            n1: params.count("n1")?,
            n2: params.count("n2")?,
        })
    }
}

/// Cohen's d with pooled SD and the small-sample correction
///
/// ```text
/// s_p = √(((n₁ − 1)s₁² + (n₂ − 1)s₂²) / (n₁ + n₂ − 2))
/// d   = (μ₁ − μ₂) / s_p
/// g   = d · (1 − 3 / (4(n₁ + n₂) − 9))
/// SE  = √((n₁ + n₂)/(n₁n₂) + d² / (2(n₁ + n₂)))
/// ```
pub fn calculate_cohens_d(input: &CohensDInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let CohensDInput { mean1, mean2, sd1, sd2, n1, n2 } = *input;
    let (f1, f2) = (n1 as f64, n2 as f64);
    let pooled_sd = (((f1 - 1.0) * sd1.powi(2) + (f2 - 1.0) * sd2.powi(2)) / (f1 + f2 - 2.0)).sqrt();
    let d = (mean1 - mean2) / pooled_sd;
    let correction = 1.0 - 3.0 / (4.0 * (f1 + f2) - 9.0);
    let g = d * correction;
    let se = ((f1 + f2) / (f1 * f2) + d.powi(2) / (2.0 * (f1 + f2))).sqrt();
    let z = z95();
    let (lower, upper) = (d - z * se, d + z * se);
    let magnitude = cohen_magnitude(d);

    Ok(ResultBuilder::new(STUDY_TYPE, "Standardized mean difference (Cohen's d / Hedges' g)")
        .input("Mean, group 1", trim(mean1))
        .input("Mean, group 2", trim(mean2))
        .input("SD, group 1", trim(sd1))
        .input("SD, group 2", trim(sd2))
        .input("n, group 1", n1.to_string())
        .input("n, group 2", n2.to_string())
        .formula(
            "d = (μ₁ − μ₂) / s_pooled,  g = d × (1 − 3/(4(n₁ + n₂) − 9))",
            "s_pooled = √(((n₁ − 1)s₁² + (n₂ − 1)s₂²)/(n₁ + n₂ − 2)), g = Hedges' small-sample corrected d",
        )
        .step(
            "Pooled SD",
            format!(
                "s_p = √(({} × {}² + {} × {}²) / {}) = {}",
                n1 - 1,
                trim(sd1),
                n2 - 1,
                trim(sd2),
                n1 + n2 - 2,
                fixed(pooled_sd, Z_PLACES)
            ),
        )
        .step(
            "Cohen's d",
            format!(
                "d = ({} − {}) / {} = {}",
                trim(mean1),
                trim(mean2),
                fixed(pooled_sd, Z_PLACES),
                fixed(d, Z_PLACES)
            ),
        )
        .step(
            "Hedges' correction",
            format!("J = {}, g = {}", fixed(correction, Z_PLACES), fixed(g, Z_PLACES)),
        )
        .step(
            "Standard error and 95% CI",
            format!(
                "SE = {}, CI = {} ± {} × {} = ({}, {})",
                fixed(se, Z_PLACES),
                fixed(d, Z_PLACES),
                fixed(z, 2),
                fixed(se, Z_PLACES),
                fixed(lower, Z_PLACES),
                fixed(upper, Z_PLACES)
            ),
        )
        .number("Cohen's d", d, STAT_PLACES)
        .number("Hedges' g", g, STAT_PLACES)
        .number("Standard error", se, Z_PLACES)
        .number("95% CI lower", lower, STAT_PLACES)
        .number("95% CI upper", upper, STAT_PLACES)
        .text("Magnitude", magnitude)
        .number("Pooled SD", pooled_sd, Z_PLACES)
        .interpretation(format!(
            "The groups differ by {} pooled standard deviations (d = {}, 95% CI {} to {}), a {} effect.",
            fixed(d.abs(), 2),
            fixed(d, STAT_PLACES),
            fixed(lower, STAT_PLACES),
            fixed(upper, STAT_PLACES),
            magnitude
        ))
        .recommend_if(n1 + n2 < 50, "With small samples report Hedges' g rather than d.")
        .recommend_if(
            lower < 0.0 && upper > 0.0,
            "The confidence interval includes zero; the direction of the effect is uncertain.",
        )
        .recommend("Interpret the magnitude against field-specific benchmarks, not only Cohen's conventions.")
        .reference("Cohen J. Statistical Power Analysis for the Behavioral Sciences. 2nd ed. 1988. Hedges LV, Olkin I. Statistical Methods for Meta-Analysis. Academic Press; 1985.")
        .build())
}

// ============================================================================
// 2×2 table
// ============================================================================

/// Cell counts of a 2×2 table.
///
/// ```text
///              outcome   no outcome
/// exposed         a          b
/// unexposed       c          d
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoByTwoInput {
    pub a: u64,
    pub b: u64,
    pub c: u64,
    pub d: u64,
}

impl TwoByTwoInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::require(self.a > 0 || self.b > 0, "b", self.b as f64, "the exposed row is empty")?;
        validation::require(self.c > 0 || self.d > 0, "d", self.d as f64, "the unexposed row is empty")?;
        validation::require(
            self.a > 0 || self.c > 0,
            "c",
            self.c as f64,
            "no outcomes in either row",
        )
    }
}

impl FromParams for TwoByTwoInput {
    const FIELDS: &'static [&'static str] = &["a", "b", "c", "d"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(TwoByTwoInput {
            a: params.count("a")?,
            b: params.count("b")?,
            c: params.count("c")?,
            d: params.count("d")?,
        })
    }
}

/// Ratio measures with Woolf (OR) and Katz (RR) log-scale intervals.
///
/// A zero cell adds 0.5 to every cell (Haldane–Anscombe) for the ratio
/// measures; the risk difference uses the raw counts.
pub fn calculate_two_by_two(input: &TwoByTwoInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let TwoByTwoInput { a, b, c, d } = *input;
    let has_zero = a == 0 || b == 0 || c == 0 || d == 0;
    let adj = if has_zero { 0.5 } else { 0.0 };
    let (fa, fb, fc, fd) = (a as f64 + adj, b as f64 + adj, c as f64 + adj, d as f64 + adj);
    let z = z95();

    let odds_ratio = (fa * fd) / (fb * fc);
    let se_log_or = (1.0 / fa + 1.0 / fb + 1.0 / fc + 1.0 / fd).sqrt();
    let or_ci = (
        (odds_ratio.ln() - z * se_log_or).exp(),
        (odds_ratio.ln() + z * se_log_or).exp(),
    );

    let risk_ratio = (fa / (fa + fb)) / (fc / (fc + fd));
    let se_log_rr = (1.0 / fa - 1.0 / (fa + fb) + 1.0 / fc - 1.0 / (fc + fd)).sqrt();
    let rr_ci = (
        (risk_ratio.ln() - z * se_log_rr).exp(),
        (risk_ratio.ln() + z * se_log_rr).exp(),
    );

    let n_exposed = (a + b) as f64;
    let n_unexposed = (c + d) as f64;
    let risk1 = a as f64 / n_exposed;
    let risk0 = c as f64 / n_unexposed;
    let risk_diff = risk1 - risk0;
    let se_rd = (risk1 * (1.0 - risk1) / n_exposed + risk0 * (1.0 - risk0) / n_unexposed).sqrt();
    let nnt = 1.0 / risk_diff.abs();
    let nnt_label = if risk_diff > 0.0 { "harm (NNH)" } else { "benefit (NNT)" };

    Ok(ResultBuilder::new(STUDY_TYPE, "2×2 table measures of association")
        .input("Exposed with outcome (a)", a.to_string())
        .input("Exposed without outcome (b)", b.to_string())
        .input("Unexposed with outcome (c)", c.to_string())
        .input("Unexposed without outcome (d)", d.to_string())
        .formula(
            "OR = ad/bc,  RR = [a/(a + b)] / [c/(c + d)],  RD = a/(a + b) − c/(c + d),  NNT = 1/|RD|",
            "Woolf SE(ln OR) = √(1/a + 1/b + 1/c + 1/d); Katz SE(ln RR) = √(1/a − 1/(a+b) + 1/c − 1/(c+d))",
        )
        .step(
            "Continuity correction",
            if has_zero {
                "A cell is zero: 0.5 added to every cell for OR and RR".to_string()
            } else {
                "No zero cells; none applied".to_string()
            },
        )
        .step(
            "Odds ratio",
            format!(
                "OR = ({} × {}) / ({} × {}) = {}, 95% CI {} to {}",
                trim(fa),
                trim(fd),
                trim(fb),
                trim(fc),
                fixed(odds_ratio, Z_PLACES),
                fixed(or_ci.0, Z_PLACES),
                fixed(or_ci.1, Z_PLACES)
            ),
        )
        .step(
            "Risk ratio",
            format!(
                "RR = {} / {} = {}, 95% CI {} to {}",
                fixed(fa / (fa + fb), Z_PLACES),
                fixed(fc / (fc + fd), Z_PLACES),
                fixed(risk_ratio, Z_PLACES),
                fixed(rr_ci.0, Z_PLACES),
                fixed(rr_ci.1, Z_PLACES)
            ),
        )
        .step(
            "Risk difference",
            format!(
                "RD = {} − {} = {} (SE {})",
                fixed(risk1, Z_PLACES),
                fixed(risk0, Z_PLACES),
                fixed(risk_diff, Z_PLACES),
                fixed(se_rd, Z_PLACES)
            ),
        )
        .step("Number needed to treat", format!("1 / |{}| = {}", fixed(risk_diff, Z_PLACES), fixed(nnt, 1)))
        .number("Odds ratio", odds_ratio, STAT_PLACES)
        .number("OR 95% CI lower", or_ci.0, STAT_PLACES)
        .number("OR 95% CI upper", or_ci.1, STAT_PLACES)
        .number("Risk ratio", risk_ratio, STAT_PLACES)
        .number("RR 95% CI lower", rr_ci.0, STAT_PLACES)
        .number("RR 95% CI upper", rr_ci.1, STAT_PLACES)
        .number("Risk difference", risk_diff, Z_PLACES)
        .number("RD 95% CI lower", risk_diff - z * se_rd, Z_PLACES)
        .number("RD 95% CI upper", risk_diff + z * se_rd, Z_PLACES)
        .number("Number needed to treat", nnt, 1)
        .text("NNT direction", nnt_label)
        .interpretation(format!(
            "Risk is {} among the exposed and {} among the unexposed: RR = {} (95% CI {} to {}), \
             OR = {} (95% CI {} to {}).",
            percent(risk1, 1),
            percent(risk0, 1),
            fixed(risk_ratio, 2),
            fixed(rr_ci.0, 2),
            fixed(rr_ci.1, 2),
            fixed(odds_ratio, 2),
            fixed(or_ci.0, 2),
            fixed(or_ci.1, 2)
        ))
        .recommend("In case-control data only the odds ratio is interpretable; RR and RD need cohort sampling.")
        .recommend_if(has_zero, "A zero cell makes ratio estimates unstable; consider an exact method.")
        .reference("Rothman KJ, Greenland S, Lash TL. Modern Epidemiology. 3rd ed. Lippincott Williams & Wilkins; 2008.")
        .build())
}

// ============================================================================
// Effect conversion
// ============================================================================

/// A standardized mean difference to re-express on other scales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectConversionInput {
    pub d: f64,
}

impl EffectConversionInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::require(self.d.is_finite(), "d", self.d, "must be finite")
    }
}

impl FromParams for EffectConversionInput {
    const FIELDS: &'static [&'static str] = &["d"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(EffectConversionInput { d: params.number("d")? })
    }
}

/// `r = d/√(d² + 4)`, `ln OR = d·π/√3`, `η² = r²`, `CLES = Φ(d/√2)`
pub fn calculate_effect_conversion(input: &EffectConversionInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let d = input.d;
    let r = d / (d.powi(2) + 4.0).sqrt();
    let log_or = d * std::f64::consts::PI / 3f64.sqrt();
    let odds_ratio = log_or.exp();
    let eta_squared = r.powi(2);
    let cles = normal_cdf(d / std::f64::consts::SQRT_2);

    Ok(ResultBuilder::new(STUDY_TYPE, "Effect size conversion")
        .input("Cohen's d", trim(d))
        .formula(
            "r = d / √(d² + 4),  ln OR = d × π/√3,  η² = r²,  CLES = Φ(d/√2)",
            "Conversions assume equal group sizes and normally distributed outcomes",
        )
        .step("Correlation", format!("r = {} / √({}² + 4) = {}", trim(d), trim(d), fixed(r, Z_PLACES)))
        .step(
            "Odds ratio",
            format!("ln OR = {} × π / √3 = {}, OR = {}", trim(d), fixed(log_or, Z_PLACES), fixed(odds_ratio, Z_PLACES)),
        )
        .step("Variance explained", format!("η² = {}² = {}", fixed(r, Z_PLACES), fixed(eta_squared, Z_PLACES)))
        .step(
            "Common-language effect size",
            format!("Φ({} / √2) = {}", trim(d), fixed(cles, Z_PLACES)),
        )
        .number("Correlation (r)", r, Z_PLACES)
        .number("Odds ratio", odds_ratio, Z_PLACES)
        .number("Log odds ratio", log_or, Z_PLACES)
        .number("Eta squared (η²)", eta_squared, Z_PLACES)
        .number("Common-language effect size", cles, Z_PLACES)
        .text("Magnitude", cohen_magnitude(d))
        .interpretation(format!(
            "d = {} corresponds to r = {} and OR = {}; a random member of group 1 scores higher than a \
             random member of group 2 {} of the time.",
            trim(d),
            fixed(r, STAT_PLACES),
            fixed(odds_ratio, 2),
            percent(cles, 1)
        ))
        .recommend("Conversions are approximate; report the effect on the scale of the original analysis.")
        .reference("Borenstein M, Hedges LV, Higgins JPT, Rothstein HR. Introduction to Meta-Analysis. Wiley; 2009. McGraw KO, Wong SP. A common language effect size statistic. Psychol Bull. 1992;111(2):361-365.")
        .build())
}
