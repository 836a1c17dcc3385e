//! # Meta-Analysis
//!
//! - [`calculate_dersimonian_laird`] - pool study effects under fixed and
//!   random effects with heterogeneity statistics
//! - [`calculate_meta_power`] - power of a planned random-effects meta-analysis
//! - [`calculate_meta_studies_needed`] - number of studies for a target power
//! - [`calculate_fail_safe_n`] - Rosenthal's file-drawer number

use serde::{Deserialize, Serialize};

use crate::distributions::{chi_square_sf, normal_cdf, z_alpha, Tails};
use crate::errors::CalcResult;
use crate::format::{ceil_count, fixed, percent, trim, STAT_PLACES, Z_PLACES};
use crate::params::{FromParams, Params};
use crate::result::{CalculationResult, ResultBuilder};
use crate::units::Percent;
use crate::validation;

use super::common::DesignZ;

const STUDY_TYPE: &str = "Meta-analysis";

const HEDGES_PIGOTT: &str =
    "Hedges LV, Pigott TD. The power of statistical tests in meta-analysis. Psychol Methods. 2001;6(3):203-217.";

/// I² must leave some within-study variance: `0 ≤ I² < 100`
fn validate_i2(i2: Percent) -> CalcResult<()> {
    validation::require(i2.0 >= 0.0 && i2.0 < 100.0, "i2", i2.0, "must be at least 0% and below 100%")
}

/// Sampling variance of a standardized mean difference for one study
fn smd_variance(d: f64, n1: u64, n2: u64) -> f64 {
    let (f1, f2) = (n1 as f64, n2 as f64);
    (f1 + f2) / (f1 * f2) + d.powi(2) / (2.0 * (f1 + f2))
}

/// Between-study variance implied by I²: `τ² = v·I²/(100 − I²)`
fn tau_squared_from_i2(v: f64, i2: Percent) -> f64 {
    v * i2.0 / (100.0 - i2.0)
}

// ============================================================================
// DerSimonian–Laird
// ============================================================================

/// Pooled-estimate summary of the DerSimonian–Laird procedure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pooled {
    pub fixed: f64,
    pub fixed_se: f64,
    pub q: f64,
    pub c: f64,
    pub tau_squared: f64,
    pub random: f64,
    pub random_se: f64,
    pub i_squared: f64,
    pub h_squared: f64,
}

/// Run the DerSimonian–Laird moment estimator on effects `y` with
/// within-study variances `v` (equal lengths, at least two studies).
pub fn dersimonian_laird(y: &[f64], v: &[f64]) -> Pooled {
    let k = y.len() as f64;
    let w: Vec<f64> = v.iter().map(|vi| 1.0 / vi).collect();
    let sum_w: f64 = w.iter().sum();
    let sum_w2: f64 = w.iter().map(|wi| wi * wi).sum();
    let fixed = w.iter().zip(y).map(|(wi, yi)| wi * yi).sum::<f64>() / sum_w;
    let q: f64 = w.iter().zip(y).map(|(wi, yi)| wi * (yi - fixed).powi(2)).sum();
    let df = k - 1.0;
    let c = sum_w - sum_w2 / sum_w;
    let tau_squared = ((q - df) / c).max(0.0);

    let w_star: Vec<f64> = v.iter().map(|vi| 1.0 / (vi + tau_squared)).collect();
    let sum_w_star: f64 = w_star.iter().sum();
    let random = w_star.iter().zip(y).map(|(wi, yi)| wi * yi).sum::<f64>() / sum_w_star;

    let i_squared = if q > df { (q - df) / q * 100.0 } else { 0.0 };

    Pooled {
        fixed,
        fixed_se: (1.0 / sum_w).sqrt(),
        q,
        c,
        tau_squared,
        random,
        random_se: (1.0 / sum_w_star).sqrt(),
        i_squared,
        h_squared: q / df,
    }
}

/// Study effects and their sampling variances.
///
/// ## JSON Example
///
/// ```json
/// { "effects": [0.2, 0.5, 0.3, 0.8], "variances": "0.04, 0.05, 0.03, 0.06" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerSimonianLairdInput {
    pub effects: Vec<f64>,
    pub variances: Vec<f64>,
}

impl DerSimonianLairdInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::require(
            self.effects.len() >= 2,
            "effects",
            self.effects.len() as f64,
            "at least two studies are required",
        )?;
        validation::require(
            self.variances.len() == self.effects.len(),
            "variances",
            self.variances.len() as f64,
            "must list one variance per effect",
        )?;
        for v in &self.variances {
            validation::positive("variances", *v)?;
        }
        Ok(())
    }
}

impl FromParams for DerSimonianLairdInput {
    const FIELDS: &'static [&'static str] = &["effects", "variances"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(DerSimonianLairdInput {
            effects: params.numbers("effects")?,
            variances: params.numbers("variances")?,
        })
    }
}

pub fn calculate_dersimonian_laird(input: &DerSimonianLairdInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let y = &input.effects;
    let v = &input.variances;
    let k = y.len();
    let pooled = dersimonian_laird(y, v);
    let q_p = chi_square_sf(pooled.q, (k - 1) as f64);
    let z = z_alpha(0.05, Tails::Two);
    let ci = |est: f64, se: f64| (est - z * se, est + z * se);
    let fixed_ci = ci(pooled.fixed, pooled.fixed_se);
    let random_ci = ci(pooled.random, pooled.random_se);

    let heterogeneity = match pooled.i_squared {
        i if i < 25.0 => "low",
        i if i < 50.0 => "moderate",
        i if i < 75.0 => "substantial",
        _ => "considerable",
    };

    let list = |xs: &[f64]| xs.iter().map(|x| trim(*x)).collect::<Vec<_>>().join(", ");

    Ok(ResultBuilder::new(STUDY_TYPE, "DerSimonian–Laird random-effects meta-analysis")
        .input("Number of studies (k)", k.to_string())
        .input("Effects", list(y))
        .input("Variances", list(v))
        .formula(
            "τ² = max(0, (Q − (k − 1)) / C),  θ_RE = Σ w*ᵢ yᵢ / Σ w*ᵢ,  w*ᵢ = 1/(vᵢ + τ²)",
            "Q = Σ wᵢ(yᵢ − θ_FE)², wᵢ = 1/vᵢ, C = Σwᵢ − Σwᵢ²/Σwᵢ, I² = (Q − (k − 1))/Q × 100",
        )
        .step(
            "Fixed-effect estimate",
            format!(
                "θ_FE = {} (SE {})",
                fixed(pooled.fixed, Z_PLACES),
                fixed(pooled.fixed_se, Z_PLACES)
            ),
        )
        .step(
            "Cochran's Q",
            format!("Q = {} on {} df, p = {}", fixed(pooled.q, Z_PLACES), k - 1, fixed(q_p, Z_PLACES)),
        )
        .step(
            "Between-study variance",
            format!(
                "τ² = max(0, ({} − {}) / {}) = {}",
                fixed(pooled.q, Z_PLACES),
                k - 1,
                fixed(pooled.c, Z_PLACES),
                fixed(pooled.tau_squared, Z_PLACES)
            ),
        )
        .step(
            "Random-effects estimate",
            format!(
                "θ_RE = {} (SE {})",
                fixed(pooled.random, Z_PLACES),
                fixed(pooled.random_se, Z_PLACES)
            ),
        )
        .step(
            "Heterogeneity",
            format!("I² = {}%, H² = {}", fixed(pooled.i_squared, 1), fixed(pooled.h_squared, STAT_PLACES)),
        )
        .number("Random-effects estimate", pooled.random, Z_PLACES)
        .number("RE 95% CI lower", random_ci.0, Z_PLACES)
        .number("RE 95% CI upper", random_ci.1, Z_PLACES)
        .number("Fixed-effect estimate", pooled.fixed, Z_PLACES)
        .number("FE 95% CI lower", fixed_ci.0, Z_PLACES)
        .number("FE 95% CI upper", fixed_ci.1, Z_PLACES)
        .number("Q", pooled.q, STAT_PLACES)
        .number("Q p-value", q_p, Z_PLACES)
        .number("Tau squared (τ²)", pooled.tau_squared, Z_PLACES)
        .number("I² (%)", pooled.i_squared, 1)
        .number("H²", pooled.h_squared, STAT_PLACES)
        .interpretation(format!(
            "Across {} studies the random-effects estimate is {} (95% CI {} to {}); heterogeneity is {} \
             (I² = {}%).",
            k,
            fixed(pooled.random, STAT_PLACES),
            fixed(random_ci.0, STAT_PLACES),
            fixed(random_ci.1, STAT_PLACES),
            heterogeneity,
            fixed(pooled.i_squared, 1)
        ))
        .recommend_if(k < 5, "With fewer than five studies τ² is poorly estimated; interpret the random-effects CI cautiously.")
        .recommend_if(
            pooled.i_squared >= 50.0,
            "Substantial heterogeneity: explore it with subgroup analysis or meta-regression.",
        )
        .recommend("Report a prediction interval alongside the confidence interval.")
        .reference("DerSimonian R, Laird N. Meta-analysis in clinical trials. Control Clin Trials. 1986;7(3):177-188. Higgins JPT, Thompson SG. Quantifying heterogeneity in a meta-analysis. Stat Med. 2002;21(11):1539-1558.")
        .build())
}

// ============================================================================
// Power of a random-effects meta-analysis
// ============================================================================

/// Planned meta-analysis of `studies` trials of equal size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaPowerInput {
    /// Expected standardized mean difference
    pub effect: f64,
    /// Typical group sizes per study
    pub n1: u64,
    pub n2: u64,
    pub studies: u64,
    /// Anticipated heterogeneity
    pub i2: Percent,
    pub alpha: f64,
}

impl MetaPowerInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::require(self.effect != 0.0, "effect", self.effect, "must not be zero")?;
        validation::require(self.n1 >= 2, "n1", self.n1 as f64, "must be at least 2")?;
        validation::require(self.n2 >= 2, "n2", self.n2 as f64, "must be at least 2")?;
        validation::require(self.studies >= 2, "studies", self.studies as f64, "must be at least 2")?;
        validate_i2(self.i2)?;
        validation::alpha(self.alpha)
    }
}

impl FromParams for MetaPowerInput {
    const FIELDS: &'static [&'static str] = &["effect", "n1", "n2", "studies", "i2", "alpha"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(MetaPowerInput {
            effect: params.number("effect")?,
            n1: params.count("n1")?,
            n2: params.count("n2")?,
            studies: params.count("studies")?,
            i2: params.percent("i2")?,
            alpha: params.number("alpha")?,
        })
    }
}

/// Hedges–Pigott two-sided power:
///
/// ```text
/// V* = (v + τ²)/k,  λ = d/√V*,  power = 1 − Φ(Zα/2 − λ) + Φ(−Zα/2 − λ)
/// ```
pub fn calculate_meta_power(input: &MetaPowerInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let MetaPowerInput { effect, n1, n2, studies, i2, alpha } = *input;
    let z = z_alpha(alpha, Tails::Two);
    let d = effect.abs();
    let v = smd_variance(d, n1, n2);
    let tau2 = tau_squared_from_i2(v, i2);
    let pooled_var = (v + tau2) / studies as f64;
    let lambda = d / pooled_var.sqrt();
    let power = 1.0 - normal_cdf(z - lambda) + normal_cdf(-z - lambda);

    Ok(ResultBuilder::new(STUDY_TYPE, "Power of a random-effects meta-analysis (Hedges–Pigott)")
        .input("Expected effect (d)", trim(effect))
        .input("Group sizes per study", format!("{} + {}", n1, n2))
        .input("Number of studies (k)", studies.to_string())
        .input("Heterogeneity (I²)", i2.to_string())
        .input("Significance level (α)", trim(alpha))
        .formula(
            "power = 1 − Φ(Zα/2 − λ) + Φ(−Zα/2 − λ),  λ = d / √((v + τ²)/k)",
            "v = (n₁ + n₂)/(n₁n₂) + d²/(2(n₁ + n₂)), τ² = v × I²/(100 − I²)",
        )
        .step("Within-study variance", format!("v = {}", fixed(v, Z_PLACES)))
        .step(
            "Between-study variance",
            format!("τ² = {} × {} / (100 − {}) = {}", fixed(v, Z_PLACES), trim(i2.0), trim(i2.0), fixed(tau2, Z_PLACES)),
        )
        .step(
            "Variance of the pooled effect",
            format!("({} + {}) / {} = {}", fixed(v, Z_PLACES), fixed(tau2, Z_PLACES), studies, fixed(pooled_var, 6)),
        )
        .step("Non-centrality", format!("λ = {} / √{} = {}", trim(d), fixed(pooled_var, 6), fixed(lambda, Z_PLACES)))
        .step("Power", fixed(power, Z_PLACES))
        .number("Power", power, Z_PLACES)
        .text("Power (%)", percent(power, 1))
        .number("Tau squared (τ²)", tau2, Z_PLACES)
        .number("Non-centrality (λ)", lambda, STAT_PLACES)
        .interpretation(format!(
            "A random-effects meta-analysis of {} studies with {} + {} participants each has {} power to \
             detect d = {} when I² = {}.",
            studies,
            n1,
            n2,
            percent(power, 1),
            trim(effect),
            i2
        ))
        .recommend_if(power < 0.8, "Power is below 80%; more studies help more than larger ones when heterogeneity is high.")
        .reference(HEDGES_PIGOTT)
        .build())
}

// ============================================================================
// Studies needed
// ============================================================================

/// Number of equal-sized studies for a random-effects meta-analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaStudiesNeededInput {
    pub effect: f64,
    pub n1: u64,
    pub n2: u64,
    pub i2: Percent,
    pub alpha: f64,
    pub power: f64,
}

impl MetaStudiesNeededInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::require(self.effect != 0.0, "effect", self.effect, "must not be zero")?;
        validation::require(self.n1 >= 2, "n1", self.n1 as f64, "must be at least 2")?;
        validation::require(self.n2 >= 2, "n2", self.n2 as f64, "must be at least 2")?;
        validate_i2(self.i2)?;
        validation::alpha(self.alpha)?;
        validation::power(self.power)
    }
}

impl FromParams for MetaStudiesNeededInput {
    const FIELDS: &'static [&'static str] = &["effect", "n1", "n2", "i2", "alpha", "power"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(MetaStudiesNeededInput {
            effect: params.number("effect")?,
            n1: params.count("n1")?,
            n2: params.count("n2")?,
            i2: params.percent("i2")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
        })
    }
}

/// `k = (Zα/2 + Zβ)²·(v + τ²) / d²`, at least 2
pub fn calculate_meta_studies_needed(input: &MetaStudiesNeededInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let MetaStudiesNeededInput { effect, n1, n2, i2, alpha, power } = *input;
    let z = DesignZ::new(alpha, power, Tails::Two);
    let d = effect.abs();
    let v = smd_variance(d, n1, n2);
    let tau2 = tau_squared_from_i2(v, i2);
    let k_raw = z.sum().powi(2) * (v + tau2) / d.powi(2);
    let k = ceil_count(k_raw).max(2);

    let builder = ResultBuilder::new(STUDY_TYPE, "Studies needed for a random-effects meta-analysis")
        .input("Expected effect (d)", trim(effect))
        .input("Group sizes per study", format!("{} + {}", n1, n2))
        .input("Heterogeneity (I²)", i2.to_string())
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .formula(
            "k = (Zα/2 + Zβ)² × (v + τ²) / d²",
            "v = within-study variance of d, τ² = v × I²/(100 − I²); at least two studies",
        );

    Ok(z.steps(builder)
        .step("Within-study variance", format!("v = {}", fixed(v, Z_PLACES)))
        .step("Between-study variance", format!("τ² = {}", fixed(tau2, Z_PLACES)))
        .step(
            "Studies",
            format!(
                "k = {}² × ({} + {}) / {}² = {} → {}",
                fixed(z.sum(), Z_PLACES),
                fixed(v, Z_PLACES),
                fixed(tau2, Z_PLACES),
                trim(d),
                fixed(k_raw, 2),
                k
            ),
        )
        .count("Studies needed", k)
        .count("Total participants", k * (n1 + n2))
        .interpretation(format!(
            "{} studies of {} + {} participants give {} power to detect d = {} at α = {} with I² = {}.",
            k,
            n1,
            n2,
            percent(power, 0),
            trim(effect),
            trim(alpha),
            i2
        ))
        .recommend("Heterogeneity cannot be reduced by larger studies; only more studies shrink τ²'s share.")
        .reference(HEDGES_PIGOTT)
        .build())
}

// ============================================================================
// Fail-safe N
// ============================================================================

/// Study Z statistics for Rosenthal's fail-safe N.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailSafeNInput {
    pub z_scores: Vec<f64>,
    /// One-sided significance level
    pub alpha: f64,
}

impl FailSafeNInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::require(
            !self.z_scores.is_empty(),
            "zScores",
            0.0,
            "at least one study Z statistic is required",
        )?;
        validation::alpha(self.alpha)
    }
}

impl FromParams for FailSafeNInput {
    const FIELDS: &'static [&'static str] = &["zScores", "alpha"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(FailSafeNInput {
            z_scores: params.numbers("zScores")?,
            alpha: params.number("alpha")?,
        })
    }
}

/// Rosenthal: `N = (ΣZ)² / Zα² − k` with one-sided Zα
pub fn calculate_fail_safe_n(input: &FailSafeNInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let k = input.z_scores.len() as u64;
    let alpha = input.alpha;
    let z = z_alpha(alpha, Tails::One);
    let sum_z: f64 = input.z_scores.iter().sum();
    let n_raw = sum_z.powi(2) / z.powi(2) - k as f64;
    let n = ceil_count(n_raw);
    let tolerance = 5 * k + 10;
    let robust = n > tolerance;
    let stouffer = sum_z / (k as f64).sqrt();

    Ok(ResultBuilder::new(STUDY_TYPE, "Fail-safe N (Rosenthal)")
        .input("Number of studies (k)", k.to_string())
        .input(
            "Z statistics",
            input.z_scores.iter().map(|x| trim(*x)).collect::<Vec<_>>().join(", "),
        )
        .input("Significance level (α, one-sided)", trim(alpha))
        .formula(
            "N_fs = (ΣZ)² / Zα² − k",
            "ΣZ = sum of study Z statistics, Zα one-sided, k = number of studies; tolerance 5k + 10",
        )
        .step("Z-score for α", format!("Zα = Φ⁻¹(1 − {}) = {}", trim(alpha), fixed(z, Z_PLACES)))
        .step("Sum of Z", format!("ΣZ = {}", fixed(sum_z, Z_PLACES)))
        .step(
            "Fail-safe N",
            format!("N = {}² / {}² − {} = {} → {}", fixed(sum_z, Z_PLACES), fixed(z, Z_PLACES), k, fixed(n_raw, 2), n),
        )
        .step("Tolerance", format!("5 × {} + 10 = {}", k, tolerance))
        .count("Fail-safe N", n)
        .count("Tolerance level (5k + 10)", tolerance)
        .text("Robust to publication bias", if robust { "yes" } else { "no" })
        .number("Combined Z (Stouffer)", stouffer, STAT_PLACES)
        .interpretation(format!(
            "{} unpublished null studies would be needed to make the combined result non-significant; \
             this is {} the tolerance of {}.",
            n,
            if robust { "above" } else { "not above" },
            tolerance
        ))
        .recommend("Fail-safe N ignores effect size; complement it with a funnel plot and trim-and-fill.")
        .reference("Rosenthal R. The file drawer problem and tolerance for null results. Psychol Bull. 1979;86(3):638-641.")
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn value(result: &CalculationResult, label: &str) -> f64 {
        result.result(label).unwrap().as_f64().unwrap()
    }

    #[test]
    fn test_dersimonian_laird() {
        let pooled = dersimonian_laird(&[0.2, 0.5, 0.3, 0.8], &[0.04, 0.05, 0.03, 0.06]);
        assert_abs_diff_eq!(pooled.fixed, 0.403509, epsilon = 1e-6);
        assert_abs_diff_eq!(pooled.q, 4.198830, epsilon = 1e-6);
        assert_abs_diff_eq!(pooled.tau_squared, 0.017227, epsilon = 1e-6);
        assert_abs_diff_eq!(pooled.random, 0.415867, epsilon = 1e-6);
        assert_abs_diff_eq!(pooled.i_squared, 28.5515, epsilon = 1e-4);
    }

    #[test]
    fn test_homogeneous_studies_give_equal_estimates() {
        let pooled = dersimonian_laird(&[0.3, 0.3, 0.3], &[0.02, 0.04, 0.05]);
        assert_eq!(pooled.tau_squared, 0.0);
        assert_eq!(pooled.i_squared, 0.0);
        assert_abs_diff_eq!(pooled.random, pooled.fixed, epsilon = 1e-12);
    }

    #[test]
    fn test_dersimonian_laird_result_bounds() {
        let input = DerSimonianLairdInput {
            effects: vec![0.2, 0.5, 0.3, 0.8],
            variances: vec![0.04, 0.05, 0.03, 0.06],
        };
        let result = calculate_dersimonian_laird(&input).unwrap();
        let i2 = value(&result, "I² (%)");
        assert!((0.0..=100.0).contains(&i2));
        assert!(value(&result, "Tau squared (τ²)") >= 0.0);
        assert_abs_diff_eq!(value(&result, "Q p-value"), 0.2395, epsilon = 1e-3);
    }

    #[test]
    fn test_dersimonian_laird_from_text_lists() {
        let params = Params::new()
            .with("effects", "0.2, 0.5, 0.3, 0.8")
            .with("variances", "0.04;0.05;0.03;0.06");
        let input = DerSimonianLairdInput::from_params(&params).unwrap();
        assert_eq!(input.variances.len(), 4);
        assert!(calculate_dersimonian_laird(&input).is_ok());
    }

    #[test]
    fn test_dersimonian_laird_rejects_mismatched_lists() {
        let input = DerSimonianLairdInput {
            effects: vec![0.2, 0.5, 0.3],
            variances: vec![0.04, 0.05],
        };
        assert_eq!(calculate_dersimonian_laird(&input).unwrap_err().field(), Some("variances"));
    }

    #[test]
    fn test_meta_power_drops_with_heterogeneity() {
        let mut input = MetaPowerInput {
            effect: 0.3,
            n1: 50,
            n2: 50,
            studies: 5,
            i2: Percent(0.0),
            alpha: 0.05,
        };
        let homogeneous = calculate_meta_power(&input).unwrap();
        assert_abs_diff_eq!(value(&homogeneous, "Power"), 0.9155, epsilon = 1e-3);
        input.i2 = Percent(50.0);
        let heterogeneous = calculate_meta_power(&input).unwrap();
        assert_abs_diff_eq!(value(&heterogeneous, "Power"), 0.6549, epsilon = 1e-3);
    }

    #[test]
    fn test_meta_studies_needed() {
        let mut input = MetaStudiesNeededInput {
            effect: 0.3,
            n1: 50,
            n2: 50,
            i2: Percent(0.0),
            alpha: 0.05,
            power: 0.8,
        };
        let result = calculate_meta_studies_needed(&input).unwrap();
        // 3.53 → 4
        assert_eq!(result.headline().unwrap().1.as_count(), Some(4));
        input.i2 = Percent(50.0);
        let result = calculate_meta_studies_needed(&input).unwrap();
        // 7.06 → 8
        assert_eq!(result.headline().unwrap().1.as_count(), Some(8));
        assert_eq!(result.result("Total participants").unwrap().as_count(), Some(800));
    }

    #[test]
    fn test_fail_safe_n() {
        let input = FailSafeNInput {
            z_scores: vec![2.1, 1.8, 2.5, 1.2, 2.9],
            alpha: 0.05,
        };
        let result = calculate_fail_safe_n(&input).unwrap();
        // 10.5² / 1.6449² − 5 = 35.75
        assert_eq!(result.headline().unwrap().1.as_count(), Some(36));
        assert_eq!(result.result("Tolerance level (5k + 10)").unwrap().as_count(), Some(35));
        assert_eq!(result.result("Robust to publication bias").unwrap().as_text(), Some("yes"));
    }

    #[test]
    fn test_i2_of_100_is_rejected() {
        let input = MetaPowerInput {
            effect: 0.3,
            n1: 50,
            n2: 50,
            studies: 5,
            i2: Percent(100.0),
            alpha: 0.05,
        };
        assert_eq!(calculate_meta_power(&input).unwrap_err().field(), Some("i2"));
    }
}
