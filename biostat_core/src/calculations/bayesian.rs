//! # Bayesian Designs
//!
//! Conjugate-prior sample sizes and summaries:
//!
//! - [`calculate_bayesian_proportion`] - Beta prior, target credible-interval width
//! - [`calculate_bayesian_mean`] - Normal prior, target credible-interval width
//! - [`calculate_assurance`] - expected power averaged over a Normal prior
//! - [`calculate_beta_binomial_update`] - posterior after observed binomial data
//!
//! Credible intervals use the normal approximation. When the prior is
//! already as precise as the target, the additional sample size is 0.

use serde::{Deserialize, Serialize};

use crate::distributions::{log_beta, log_gamma, normal_cdf, z_alpha, Tails};
use crate::errors::CalcResult;
use crate::format::{ceil_count, fixed, percent, trim, STAT_PLACES, Z_PLACES};
use crate::params::{FromParams, Params};
use crate::result::{CalculationResult, ResultBuilder};
use crate::validation;

const STUDY_TYPE: &str = "Bayesian design";

const SPIEGELHALTER: &str =
    "Spiegelhalter DJ, Abrams KR, Myles JP. Bayesian Approaches to Clinical Trials and Health-Care Evaluation. Wiley; 2004.";

/// Quantile for a central credible interval of the given level
fn credible_z(level: f64) -> f64 {
    z_alpha(1.0 - level, Tails::Two)
}

fn validate_credible_level(level: f64) -> CalcResult<()> {
    validation::within("credibleLevel", level, 0.0, 1.0)
}

// ============================================================================
// Proportion with a Beta prior
// ============================================================================

/// Input parameters for estimating a proportion with a Beta(a, b) prior.
///
/// ## JSON Example
///
/// ```json
/// { "priorAlpha": 2, "priorBeta": 8, "width": 0.1, "credibleLevel": 0.95 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BayesianProportionInput {
    pub prior_alpha: f64,
    pub prior_beta: f64,
    /// Total width of the credible interval
    pub width: f64,
    pub credible_level: f64,
}

impl BayesianProportionInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::positive("priorAlpha", self.prior_alpha)?;
        validation::positive("priorBeta", self.prior_beta)?;
        validation::within("width", self.width, 0.0, 1.0)?;
        validate_credible_level(self.credible_level)
    }
}

impl FromParams for BayesianProportionInput {
    const FIELDS: &'static [&'static str] = &["priorAlpha", "priorBeta", "width", "credibleLevel"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(BayesianProportionInput {
            prior_alpha: params.number("priorAlpha")?,
            prior_beta: params.number("priorBeta")?,
            width: params.number("width")?,
            credible_level: params.number("credibleLevel")?,
        })
    }
}

/// `n = p(1 − p)/(w/2z)² − (a + b) − 1`, `p = a/(a + b)`
pub fn calculate_bayesian_proportion(input: &BayesianProportionInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let BayesianProportionInput { prior_alpha: a, prior_beta: b, width, credible_level } = *input;
    let z = credible_z(credible_level);
    let p = a / (a + b);
    let half_sd = width / (2.0 * z);
    let n_raw = p * (1.0 - p) / half_sd.powi(2) - (a + b) - 1.0;
    let n = ceil_count(n_raw);
    // log space: strong priors underflow p^(a−1) long before the ratio does
    let density = ((a - 1.0) * p.ln() + (b - 1.0) * (1.0 - p).ln() - log_beta(a, b)).exp();
    let prior_sd = (a * b / ((a + b).powi(2) * (a + b + 1.0))).sqrt();

    Ok(ResultBuilder::new(STUDY_TYPE, "Proportion with a Beta prior")
        .input("Prior α (a)", trim(a))
        .input("Prior β (b)", trim(b))
        .input("Credible interval width", trim(width))
        .input("Credible level", percent(credible_level, 0))
        .formula(
            "n = p(1 − p) / (w / 2z)² − (a + b) − 1",
            "p = a/(a + b) = prior mean, w = interval width, z = quantile for the credible level; \
             a + b acts as a prior sample size",
        )
        .step("Prior mean", format!("p = {} / ({} + {}) = {}", trim(a), trim(a), trim(b), fixed(p, Z_PLACES)))
        .step("Z for credible level", format!("z = {}", fixed(z, Z_PLACES)))
        .step("Target posterior SD", format!("w / 2z = {} / (2 × {}) = {}", trim(width), fixed(z, Z_PLACES), fixed(half_sd, 6)))
        .step(
            "Additional sample size",
            format!(
                "n = {} × {} / {}² − {} − 1 = {} → {}",
                fixed(p, Z_PLACES),
                fixed(1.0 - p, Z_PLACES),
                fixed(half_sd, 6),
                trim(a + b),
                fixed(n_raw, 2),
                n
            ),
        )
        .count("Required sample size", n)
        .number("Prior mean", p, Z_PLACES)
        .number("Prior SD", prior_sd, Z_PLACES)
        .number("Prior density at mean", density, Z_PLACES)
        .number("Prior effective sample size", a + b, 1)
        .interpretation(if n == 0 {
            format!(
                "The Beta({}, {}) prior is already precise enough for a {} interval of width {}; \
                 no further subjects are required.",
                trim(a),
                trim(b),
                percent(credible_level, 0),
                trim(width)
            )
        } else {
            format!(
                "Combined with a Beta({}, {}) prior worth {} observations, {} more subjects give a {} \
                 credible interval of width {} around a proportion near {}.",
                trim(a),
                trim(b),
                trim(a + b),
                n,
                percent(credible_level, 0),
                trim(width),
                percent(p, 1)
            )
        })
        .recommend("Check sensitivity to the prior by repeating with a flatter Beta(1, 1).")
        .reference("Joseph L, Wolfson DB, du Berger R. Sample size calculations for binomial proportions via highest posterior density intervals. The Statistician. 1995;44(2):143-154.")
        .build())
}

// ============================================================================
// Mean with a Normal prior
// ============================================================================

/// Input parameters for estimating a mean with a Normal prior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BayesianMeanInput {
    /// Prior standard deviation of the mean (τ₀)
    pub prior_sd: f64,
    /// Data standard deviation (σ)
    pub sd: f64,
    pub width: f64,
    pub credible_level: f64,
}

impl BayesianMeanInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::positive("priorSd", self.prior_sd)?;
        validation::positive("sd", self.sd)?;
        validation::positive("width", self.width)?;
        validate_credible_level(self.credible_level)
    }
}

impl FromParams for BayesianMeanInput {
    const FIELDS: &'static [&'static str] = &["priorSd", "sd", "width", "credibleLevel"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(BayesianMeanInput {
            prior_sd: params.number("priorSd")?,
            sd: params.number("sd")?,
            width: params.number("width")?,
            credible_level: params.number("credibleLevel")?,
        })
    }
}

/// `n = σ²(1/s² − 1/τ₀²)`, `s = w/(2z)`
pub fn calculate_bayesian_mean(input: &BayesianMeanInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let BayesianMeanInput { prior_sd, sd, width, credible_level } = *input;
    let z = credible_z(credible_level);
    let s = width / (2.0 * z);
    let n_raw = sd.powi(2) * (1.0 / s.powi(2) - 1.0 / prior_sd.powi(2));
    let n = ceil_count(n_raw);
    let prior_n = (sd / prior_sd).powi(2);

    Ok(ResultBuilder::new(STUDY_TYPE, "Mean with a Normal prior")
        .input("Prior SD (τ₀)", trim(prior_sd))
        .input("Data SD (σ)", trim(sd))
        .input("Credible interval width", trim(width))
        .input("Credible level", percent(credible_level, 0))
        .formula(
            "n = σ² × (1/s² − 1/τ₀²),  s = w / 2z",
            "σ = data SD, τ₀ = prior SD, s = target posterior SD, w = interval width",
        )
        .step("Z for credible level", format!("z = {}", fixed(z, Z_PLACES)))
        .step("Target posterior SD", format!("s = {} / (2 × {}) = {}", trim(width), fixed(z, Z_PLACES), fixed(s, Z_PLACES)))
        .step(
            "Additional sample size",
            format!(
                "n = {}² × (1/{}² − 1/{}²) = {} → {}",
                trim(sd),
                fixed(s, Z_PLACES),
                trim(prior_sd),
                fixed(n_raw, 2),
                n
            ),
        )
        .count("Required sample size", n)
        .number("Target posterior SD", s, Z_PLACES)
        .number("Prior worth (observations)", prior_n, 1)
        .interpretation(if n == 0 {
            "The prior alone already meets the target precision; no further subjects are required.".to_string()
        } else {
            format!(
                "{} subjects bring the {} credible interval for the mean to a width of {} \
                 (the prior is worth about {} observations).",
                n,
                percent(credible_level, 0),
                trim(width),
                fixed(prior_n, 1)
            )
        })
        .recommend("A vague prior (large τ₀) recovers the frequentist sample size.")
        .reference(SPIEGELHALTER)
        .build())
}

// ============================================================================
// Assurance
// ============================================================================

/// Input parameters for the assurance (probability of success) of a
/// two-arm trial with `n` per arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssuranceInput {
    /// Prior mean of the treatment effect
    pub prior_mean: f64,
    /// Prior SD of the treatment effect
    pub prior_sd: f64,
    /// Outcome SD
    pub sd: f64,
    /// Subjects per arm
    pub n: u64,
    pub alpha: f64,
}

impl AssuranceInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::positive("priorSd", self.prior_sd)?;
        validation::positive("sd", self.sd)?;
        validation::require(self.n >= 2, "n", self.n as f64, "must be at least 2")?;
        validation::alpha(self.alpha)
    }
}

impl FromParams for AssuranceInput {
    const FIELDS: &'static [&'static str] = &["priorMean", "priorSd", "sd", "n", "alpha"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(AssuranceInput {
            prior_mean: params.number("priorMean")?,
            prior_sd: params.number("priorSd")?,
            sd: params.number("sd")?,
            n: params.count("n")?,
            alpha: params.number("alpha")?,
        })
    }
}

/// O'Hagan–Stevens assurance for a one-directional success:
///
/// ```text
/// SE = σ·√(2/n),   assurance = Φ((μ − Zα/2·SE) / √(τ² + SE²))
/// ```
pub fn calculate_assurance(input: &AssuranceInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let AssuranceInput { prior_mean, prior_sd, sd, n, alpha } = *input;
    let z = z_alpha(alpha, Tails::Two);
    let se = sd * (2.0 / n as f64).sqrt();
    let spread = (prior_sd.powi(2) + se.powi(2)).sqrt();
    let assurance = normal_cdf((prior_mean - z * se) / spread);
    let power = normal_cdf(prior_mean.abs() / se - z);

    Ok(ResultBuilder::new(STUDY_TYPE, "Assurance (Bayesian expected power)")
        .input("Prior mean effect (μ)", trim(prior_mean))
        .input("Prior SD of effect (τ)", trim(prior_sd))
        .input("Outcome SD (σ)", trim(sd))
        .input("Subjects per arm (n)", n.to_string())
        .input("Significance level (α)", trim(alpha))
        .formula(
            "Assurance = Φ((μ − Zα/2 × SE) / √(τ² + SE²)),  SE = σ√(2/n)",
            "μ, τ = prior mean and SD of the effect, σ = outcome SD, n = subjects per arm",
        )
        .step("Z-score for α", format!("Zα/2 = {}", fixed(z, Z_PLACES)))
        .step("Standard error", format!("SE = {} × √(2/{}) = {}", trim(sd), n, fixed(se, Z_PLACES)))
        .step(
            "Assurance",
            format!(
                "Φ(({} − {} × {}) / √({}² + {}²)) = {}",
                trim(prior_mean),
                fixed(z, Z_PLACES),
                fixed(se, Z_PLACES),
                trim(prior_sd),
                fixed(se, Z_PLACES),
                fixed(assurance, Z_PLACES)
            ),
        )
        .step(
            "Power at the prior mean",
            format!("Φ(|{}| / {} − {}) = {}", trim(prior_mean), fixed(se, Z_PLACES), fixed(z, Z_PLACES), fixed(power, Z_PLACES)),
        )
        .number("Assurance", assurance, Z_PLACES)
        .number("Power at prior mean", power, Z_PLACES)
        .text("Assurance (%)", percent(assurance, 1))
        .interpretation(format!(
            "Averaging over the prior, the trial has a {} chance of a significant result, compared with \
             {} power if the effect equals its prior mean.",
            percent(assurance, 1),
            percent(power, 1)
        ))
        .recommend_if(
            assurance < power,
            "Assurance is below conventional power because the prior admits smaller effects; \
             plan with assurance when the effect is uncertain.",
        )
        .reference("O'Hagan A, Stevens JW, Campbell MJ. Assurance in clinical trial design. Pharm Stat. 2005;4(3):187-201.")
        .build())
}

// ============================================================================
// Beta-binomial update
// ============================================================================

/// A Beta prior updated with observed successes out of trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetaBinomialUpdateInput {
    pub prior_alpha: f64,
    pub prior_beta: f64,
    pub successes: u64,
    pub trials: u64,
    /// Reference value for `P(p > threshold)`
    pub threshold: f64,
    pub credible_level: f64,
}

impl BetaBinomialUpdateInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::positive("priorAlpha", self.prior_alpha)?;
        validation::positive("priorBeta", self.prior_beta)?;
        validation::require(self.trials > 0, "trials", self.trials as f64, "must be at least 1")?;
        validation::require(
            self.successes <= self.trials,
            "successes",
            self.successes as f64,
            "cannot exceed the number of trials",
        )?;
        validation::probability("threshold", self.threshold)?;
        validate_credible_level(self.credible_level)
    }
}

impl FromParams for BetaBinomialUpdateInput {
    const FIELDS: &'static [&'static str] = &[
        "priorAlpha",
        "priorBeta",
        "successes",
        "trials",
        "threshold",
        "credibleLevel",
    ];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(BetaBinomialUpdateInput {
            prior_alpha: params.number("priorAlpha")?,
            prior_beta: params.number("priorBeta")?,
            successes: params.count("successes")?,
            trials: params.count("trials")?,
            threshold: params.number("threshold")?,
            credible_level: params.number("credibleLevel")?,
        })
    }
}

/// Log of the beta-binomial marginal likelihood
/// `C(n, k)·B(a + k, b + n − k) / B(a, b)`
pub fn log_marginal_likelihood(a: f64, b: f64, k: u64, n: u64) -> f64 {
    let (k, n) = (k as f64, n as f64);
    let log_choose = log_gamma(n + 1.0) - log_gamma(k + 1.0) - log_gamma(n - k + 1.0);
    log_choose + log_beta(a + k, b + n - k) - log_beta(a, b)
}

pub fn calculate_beta_binomial_update(input: &BetaBinomialUpdateInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let BetaBinomialUpdateInput {
        prior_alpha: a,
        prior_beta: b,
        successes,
        trials,
        threshold,
        credible_level,
    } = *input;
    let failures = trials - successes;
    let post_a = a + successes as f64;
    let post_b = b + failures as f64;
    let total = post_a + post_b;
    let mean = post_a / total;
    let sd = (post_a * post_b / (total.powi(2) * (total + 1.0))).sqrt();
    let z = credible_z(credible_level);
    let lower = (mean - z * sd).max(0.0);
    let upper = (mean + z * sd).min(1.0);
    let p_above = 1.0 - normal_cdf((threshold - mean) / sd);
    let log_ml = log_marginal_likelihood(a, b, successes, trials);

    Ok(ResultBuilder::new(STUDY_TYPE, "Beta-binomial posterior update")
        .input("Prior α (a)", trim(a))
        .input("Prior β (b)", trim(b))
        .input("Successes", successes.to_string())
        .input("Trials", trials.to_string())
        .input("Threshold", trim(threshold))
        .input("Credible level", percent(credible_level, 0))
        .formula(
            "Posterior = Beta(a + x, b + n − x)",
            "x = successes, n = trials; credible interval and P(p > threshold) use the normal approximation",
        )
        .step(
            "Posterior parameters",
            format!(
                "Beta({} + {}, {} + {}) = Beta({}, {})",
                trim(a),
                successes,
                trim(b),
                failures,
                trim(post_a),
                trim(post_b)
            ),
        )
        .step("Posterior mean", format!("{} / {} = {}", trim(post_a), trim(total), fixed(mean, Z_PLACES)))
        .step("Posterior SD", fixed(sd, Z_PLACES))
        .step(
            "Credible interval",
            format!("{} ± {} × {} = ({}, {})", fixed(mean, Z_PLACES), fixed(z, Z_PLACES), fixed(sd, Z_PLACES), fixed(lower, Z_PLACES), fixed(upper, Z_PLACES)),
        )
        .step(
            "Probability above threshold",
            format!("1 − Φ(({} − {}) / {}) = {}", trim(threshold), fixed(mean, Z_PLACES), fixed(sd, Z_PLACES), fixed(p_above, Z_PLACES)),
        )
        .step("Marginal likelihood", format!("log m(x) = {}", fixed(log_ml, Z_PLACES)))
        .number("Posterior mean", mean, Z_PLACES)
        .number("Posterior SD", sd, Z_PLACES)
        .number("Credible interval lower", lower, Z_PLACES)
        .number("Credible interval upper", upper, Z_PLACES)
        .number("P(p > threshold)", p_above, Z_PLACES)
        .number("Log marginal likelihood", log_ml, Z_PLACES)
        .number("Posterior alpha", post_a, STAT_PLACES)
        .number("Posterior beta", post_b, STAT_PLACES)
        .interpretation(format!(
            "After {} successes in {} trials the posterior mean is {} ({} credible interval {} to {}); \
             the probability that the true rate exceeds {} is {}.",
            successes,
            trials,
            percent(mean, 1),
            percent(credible_level, 0),
            percent(lower, 1),
            percent(upper, 1),
            trim(threshold),
            percent(p_above, 1)
        ))
        .recommend_if(
            trials < 30,
            "With few trials the normal approximation is rough; prefer exact Beta quantiles.",
        )
        .recommend("State the prior and its justification in the analysis plan.")
        .reference(SPIEGELHALTER)
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
    fn test_bayesian_proportion() {
        let input = BayesianProportionInput {
            prior_alpha: 2.0,
            prior_beta: 8.0,
            width: 0.1,
            credible_level: 0.95,
        };
        let result = calculate_bayesian_proportion(&input).unwrap();
        // 0.16 / (0.05/1.96)² − 10 − 1 = 234.85
        assert_eq!(result.headline().unwrap().1.as_count(), Some(235));
        assert_abs_diff_eq!(value(&result, "Prior density at mean"), 3.0199, epsilon = 1e-4);
    }

    #[test]
    fn test_strong_prior_needs_no_subjects() {
        let input = BayesianProportionInput {
            prior_alpha: 200.0,
            prior_beta: 800.0,
            width: 0.1,
            credible_level: 0.95,
        };
        let result = calculate_bayesian_proportion(&input).unwrap();
        assert_eq!(result.headline().unwrap().1.as_count(), Some(0));
        assert!(result.interpretation().contains("no further subjects"));
    }

    #[test]
    fn test_density_of_concentrated_prior_is_finite() {
        let input = BayesianProportionInput {
            prior_alpha: 2000.0,
            prior_beta: 8000.0,
            width: 0.01,
            credible_level: 0.95,
        };
        let result = calculate_bayesian_proportion(&input).unwrap();
        let density = value(&result, "Prior density at mean");
        assert!(density.is_finite());
        // close to the normal peak 1/(σ√2π) with σ = √(0.16/10001)
        assert_abs_diff_eq!(density, 99.7312, epsilon = 1e-2);
        assert_eq!(result.headline().unwrap().1.as_count(), Some(14585));
    }

    #[test]
    fn test_bayesian_mean() {
        let input = BayesianMeanInput {
            prior_sd: 10.0,
            sd: 20.0,
            width: 5.0,
            credible_level: 0.95,
        };
        let result = calculate_bayesian_mean(&input).unwrap();
        // 400 × (1/1.2755² − 1/100) = 241.85
        assert_eq!(result.headline().unwrap().1.as_count(), Some(242));

        let precise = BayesianMeanInput { prior_sd: 1.0, ..input };
        let result = calculate_bayesian_mean(&precise).unwrap();
        assert_eq!(result.headline().unwrap().1.as_count(), Some(0));
    }

    #[test]
    fn test_assurance_below_power() {
        let input = AssuranceInput {
            prior_mean: 5.0,
            prior_sd: 2.0,
            sd: 15.0,
            n: 142,
            alpha: 0.05,
        };
        let result = calculate_assurance(&input).unwrap();
        assert_abs_diff_eq!(value(&result, "Assurance"), 0.7137, epsilon = 1e-3);
        assert_abs_diff_eq!(value(&result, "Power at prior mean"), 0.802, epsilon = 1e-3);
        assert!(value(&result, "Assurance") < value(&result, "Power at prior mean"));
    }

    #[test]
    fn test_uniform_prior_marginal_likelihood() {
        // with a Beta(1, 1) prior every count is equally likely: 1/(n + 1)
        let ml = log_marginal_likelihood(1.0, 1.0, 12, 40).exp();
        assert_abs_diff_eq!(ml, 1.0 / 41.0, epsilon = 1e-8);
    }

    #[test]
    fn test_beta_binomial_update() {
        let input = BetaBinomialUpdateInput {
            prior_alpha: 1.0,
            prior_beta: 1.0,
            successes: 12,
            trials: 40,
            threshold: 0.25,
            credible_level: 0.95,
        };
        let result = calculate_beta_binomial_update(&input).unwrap();
        assert_abs_diff_eq!(value(&result, "Posterior mean"), 0.3095, epsilon = 1e-9);
        assert_abs_diff_eq!(value(&result, "Posterior SD"), 0.0705, epsilon = 1e-9);
        assert_abs_diff_eq!(value(&result, "Credible interval lower"), 0.1713, epsilon = 1e-4);
        assert_abs_diff_eq!(value(&result, "Credible interval upper"), 0.4477, epsilon = 1e-4);
        assert_abs_diff_eq!(value(&result, "P(p > threshold)"), 0.8008, epsilon = 1e-3);
        assert_eq!(value(&result, "Posterior alpha"), 13.0);
        assert_eq!(value(&result, "Posterior beta"), 29.0);
    }

    #[test]
    fn test_successes_cannot_exceed_trials() {
        let input = BetaBinomialUpdateInput {
            prior_alpha: 1.0,
            prior_beta: 1.0,
            successes: 41,
            trials: 40,
            threshold: 0.25,
            credible_level: 0.95,
        };
        assert_eq!(calculate_beta_binomial_update(&input).unwrap_err().field(), Some("successes"));
    }
}
