//! # Descriptive Sampling
//!
//! Sample sizes for estimating a single population quantity to a stated
//! precision, as used in prevalence surveys and cross-sectional studies.
//!
//! - [`calculate_prevalence`] - a proportion (Cochran / Lwanga–Lemeshow)
//! - [`calculate_mean_estimation`] - a mean
//! - [`calculate_finite_population`] - finite population correction
//!
//! ## Example
//!
//! ```rust
//! use biostat_core::calculations::descriptive::{calculate_prevalence, PrevalenceInput};
//! use biostat_core::units::Percent;
//!
//! let input = PrevalenceInput {
//!     p: 0.5,
//!     d: 0.05,
//!     z: 1.96,
//!     deff: 1.0,
//!     non_response_rate: Percent(10.0),
//! };
//!
//! let result = calculate_prevalence(&input).unwrap();
//! assert_eq!(result.result("Required sample size").unwrap().as_count(), Some(385));
//! assert_eq!(result.result("Adjusted for non-response").unwrap().as_count(), Some(428));
//! ```

use serde::{Deserialize, Serialize};

use crate::distributions::{z_alpha, Tails};
use crate::errors::CalcResult;
use crate::format::{ceil_count, fixed, percent, trim, Z_PLACES};
use crate::params::{FromParams, Params};
use crate::result::{CalculationResult, ResultBuilder};
use crate::units::Percent;
use crate::validation;

use super::common::inflate_for_loss;

const STUDY_TYPE: &str = "Descriptive / Cross-sectional";

// ============================================================================
// Prevalence
// ============================================================================

/// Input parameters for estimating a prevalence.
///
/// ## JSON Example
///
/// ```json
/// { "p": 0.5, "d": 0.05, "z": 1.96, "deff": 1, "nonResponseRate": 10 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrevalenceInput {
    /// Expected prevalence (proportion)
    pub p: f64,
    /// Absolute precision (half-width of the confidence interval)
    pub d: f64,
    /// Z-score for the confidence level (1.96 for 95%)
    pub z: f64,
    /// Design effect for complex sampling (1 for simple random sampling)
    pub deff: f64,
    /// Anticipated non-response
    pub non_response_rate: Percent,
}

impl PrevalenceInput {
    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        validation::probability("p", self.p)?;
        validation::within("d", self.d, 0.0, 0.5)?;
        validation::positive("z", self.z)?;
        validation::at_least("deff", self.deff, 1.0)?;
        validation::loss_rate("nonResponseRate", self.non_response_rate)
    }
}

impl FromParams for PrevalenceInput {
    const FIELDS: &'static [&'static str] = &["p", "d", "z", "deff", "nonResponseRate"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(PrevalenceInput {
            p: params.number("p")?,
            d: params.number("d")?,
            z: params.number("z")?,
            deff: params.number("deff")?,
            non_response_rate: params.percent("nonResponseRate")?,
        })
    }
}

/// Sample size to estimate a prevalence within ±d.
///
/// ```text
/// n = Z² · p(1 − p) / d² × DEFF,    n_adj = n / (1 − NR)
/// ```
pub fn calculate_prevalence(input: &PrevalenceInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let PrevalenceInput { p, d, z, deff, .. } = *input;
    let nr = input.non_response_rate;

    let n0 = z.powi(2) * p * (1.0 - p) / d.powi(2);
    let n_deff = n0 * deff;
    let n = ceil_count(n_deff);
    let n_adj = inflate_for_loss(n, nr);

    let interpretation = format!(
        "To estimate a prevalence of about {} with a precision of ±{} (Z = {}), {} participants are required; \
         recruiting {} allows for {} non-response.",
        percent(p, 1),
        percent(d, 1),
        trim(z),
        n,
        n_adj,
        nr
    );

    Ok(ResultBuilder::new(STUDY_TYPE, "Single proportion (prevalence)")
        .input("Expected prevalence (p)", trim(p))
        .input("Precision (d)", trim(d))
        .input("Z-score", trim(z))
        .input("Design effect (DEFF)", trim(deff))
        .input("Non-response rate", nr.to_string())
        .formula(
            "n = Z² × p × (1 − p) / d² × DEFF",
            "Z = standard normal quantile for the confidence level, p = expected prevalence, \
             d = absolute precision, DEFF = design effect, NR = non-response rate",
        )
        .step(
            "Base sample size",
            format!(
                "n₀ = {}² × {} × {} / {}² = {}",
                trim(z),
                trim(p),
                trim(1.0 - p),
                trim(d),
                fixed(n0, 2)
            ),
        )
        .step(
            "Apply design effect",
            format!("n = {} × {} = {}", fixed(n0, 2), trim(deff), fixed(n_deff, 2)),
        )
        .step("Round up", format!("n = ⌈{}⌉ = {}", fixed(n_deff, 2), n))
        .step(
            "Adjust for non-response",
            format!("n_adj = {} / (1 − {}) = {}", n, trim(nr.fraction()), n_adj),
        )
        .count("Required sample size", n)
        .count("Adjusted for non-response", n_adj)
        .number("Base sample size (n₀)", n0, 2)
        .interpretation(interpretation)
        .recommend("Use p = 0.5 when the prevalence is unknown; it gives the largest (most conservative) sample.")
        .recommend_if(
            d >= p || d >= 1.0 - p,
            "The precision is wide relative to the expected prevalence; consider a relative precision (e.g. 10–20% of p).",
        )
        .recommend_if(
            deff > 1.0,
            "A design effect above 1 assumes cluster or multistage sampling; justify it from pilot data or literature.",
        )
        .recommend("Apply a finite population correction if the sample exceeds 5% of the population.")
        .reference(
            "Lwanga SK, Lemeshow S. Sample Size Determination in Health Studies: A Practical Manual. \
             Geneva: World Health Organization; 1991.",
        )
        .build())
}

// ============================================================================
// Mean estimation
// ============================================================================

/// Input parameters for estimating a mean to a given precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeanEstimationInput {
    /// Expected standard deviation
    pub sd: f64,
    /// Absolute precision (half-width of the confidence interval)
    pub d: f64,
    /// Significance level (1 − confidence)
    pub alpha: f64,
    /// Anticipated non-response
    pub non_response_rate: Percent,
}

impl MeanEstimationInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::positive("sd", self.sd)?;
        validation::positive("d", self.d)?;
        validation::alpha(self.alpha)?;
        validation::loss_rate("nonResponseRate", self.non_response_rate)
    }
}

impl FromParams for MeanEstimationInput {
    const FIELDS: &'static [&'static str] = &["sd", "d", "alpha", "nonResponseRate"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(MeanEstimationInput {
            sd: params.number("sd")?,
            d: params.number("d")?,
            alpha: params.number("alpha")?,
            non_response_rate: params.percent("nonResponseRate")?,
        })
    }
}

/// Sample size to estimate a mean within ±d: `n = (Z·σ/d)²`
pub fn calculate_mean_estimation(input: &MeanEstimationInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let MeanEstimationInput { sd, d, alpha, .. } = *input;
    let nr = input.non_response_rate;
    let z = z_alpha(alpha, Tails::Two);
    let n_raw = (z * sd / d).powi(2);
    let n = ceil_count(n_raw);
    let n_adj = inflate_for_loss(n, nr);
    let confidence = percent(1.0 - alpha, 0);

    Ok(ResultBuilder::new(STUDY_TYPE, "Single mean")
        .input("Standard deviation (σ)", trim(sd))
        .input("Precision (d)", trim(d))
        .input("Confidence level", confidence.clone())
        .input("Non-response rate", nr.to_string())
        .formula(
            "n = (Z × σ / d)²",
            "Z = Φ⁻¹(1 − α/2), σ = expected standard deviation, d = absolute precision",
        )
        .step(
            "Z-score for confidence level",
            format!("Z = Φ⁻¹(1 − {}/2) = {}", trim(alpha), fixed(z, Z_PLACES)),
        )
        .step(
            "Sample size",
            format!(
                "n = ({} × {} / {})² = {}",
                fixed(z, Z_PLACES),
                trim(sd),
                trim(d),
                fixed(n_raw, 2)
            ),
        )
        .step("Round up", format!("n = ⌈{}⌉ = {}", fixed(n_raw, 2), n))
        .step(
            "Adjust for non-response",
            format!("n_adj = {} / (1 − {}) = {}", n, trim(nr.fraction()), n_adj),
        )
        .count("Required sample size", n)
        .count("Adjusted for non-response", n_adj)
        .number("Z-score", z, Z_PLACES)
        .interpretation(format!(
            "Measuring {} participants estimates the mean within ±{} units with {} confidence; \
             recruit {} to allow for {} non-response.",
            n,
            trim(d),
            confidence,
            n_adj,
            nr
        ))
        .recommend("Take σ from a pilot study or published data on the same population.")
        .recommend_if(
            n < 30,
            "With fewer than 30 subjects, use the t-distribution; the normal approximation slightly understates n.",
        )
        .reference("Daniel WW. Biostatistics: A Foundation for Analysis in the Health Sciences. 7th ed. Wiley; 1999.")
        .build())
}

// ============================================================================
// Finite population correction
// ============================================================================

/// Input parameters for the finite population correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinitePopulationInput {
    /// Sample size computed for an infinite population
    pub n0: f64,
    /// Size of the target population
    pub population_size: f64,
}

impl FinitePopulationInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::positive("n0", self.n0)?;
        validation::positive("populationSize", self.population_size)?;
        validation::require(
            self.n0 <= self.population_size,
            "n0",
            self.n0,
            "initial sample size must not exceed the population size",
        )
    }
}

impl FromParams for FinitePopulationInput {
    const FIELDS: &'static [&'static str] = &["n0", "populationSize"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(FinitePopulationInput {
            n0: params.number("n0")?,
            population_size: params.number("populationSize")?,
        })
    }
}

/// Finite population correction: `n = n₀ / (1 + (n₀ − 1)/N)`
pub fn calculate_finite_population(input: &FinitePopulationInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let FinitePopulationInput { n0, population_size } = *input;
    let fraction = n0 / population_size;
    let n_raw = n0 / (1.0 + (n0 - 1.0) / population_size);
    let n = ceil_count(n_raw);
    let saved = ceil_count(n0).saturating_sub(n);

    Ok(ResultBuilder::new(STUDY_TYPE, "Finite population correction")
        .input("Initial sample size (n₀)", trim(n0))
        .input("Population size (N)", trim(population_size))
        .formula(
            "n = n₀ / (1 + (n₀ − 1) / N)",
            "n₀ = sample size for an infinite population, N = population size",
        )
        .step(
            "Sampling fraction",
            format!("n₀ / N = {} / {} = {}", trim(n0), trim(population_size), fixed(fraction, 4)),
        )
        .step(
            "Corrected sample size",
            format!(
                "n = {} / (1 + ({} − 1) / {}) = {}",
                trim(n0),
                trim(n0),
                trim(population_size),
                fixed(n_raw, 2)
            ),
        )
        .step("Round up", format!("n = ⌈{}⌉ = {}", fixed(n_raw, 2), n))
        .count("Adjusted sample size", n)
        .number("Sampling fraction", fraction, 4)
        .count("Reduction", saved)
        .interpretation(format!(
            "For a population of {} people, a sample of {} gives the same precision as {} from an infinite population \
             ({} fewer participants).",
            trim(population_size),
            n,
            trim(n0),
            saved
        ))
        .recommend_if(
            fraction < 0.05,
            "The sample is under 5% of the population; the correction is negligible and may be omitted.",
        )
        .recommend("Apply non-response inflation after the correction, not before.")
        .reference("Cochran WG. Sampling Techniques. 3rd ed. New York: John Wiley & Sons; 1977.")
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CalcError;

    fn prevalence() -> PrevalenceInput {
        PrevalenceInput {
            p: 0.5,
            d: 0.05,
            z: 1.96,
            deff: 1.0,
            non_response_rate: Percent(10.0),
        }
    }

    #[test]
    fn test_prevalence_reference_scenario() {
        let result = calculate_prevalence(&prevalence()).unwrap();
        assert_eq!(result.result("Required sample size").unwrap().as_count(), Some(385));
        assert_eq!(result.result("Adjusted for non-response").unwrap().as_count(), Some(428));
        assert!(result.interpretation().contains("385"));
        assert!(result.interpretation().contains("428"));
        assert_eq!(result.steps().len(), 4);
        assert!(result.steps()[0].calc.ends_with("384.16"));
    }

    #[test]
    fn test_prevalence_design_effect_doubles() {
        let mut input = prevalence();
        input.deff = 2.0;
        let result = calculate_prevalence(&input).unwrap();
        assert_eq!(result.result("Required sample size").unwrap().as_count(), Some(769));
    }

    #[test]
    fn test_prevalence_rejects_precision_out_of_range() {
        let mut input = prevalence();
        input.d = 0.6;
        let err = calculate_prevalence(&input).unwrap_err();
        assert_eq!(err.field(), Some("d"));

        let mut input = prevalence();
        input.p = 1.0;
        assert!(matches!(
            calculate_prevalence(&input),
            Err(CalcError::Validation { .. })
        ));
    }

    #[test]
    fn test_prevalence_from_string_params() {
        let params = Params::new()
            .with("p", "0.5")
            .with("d", "0.05")
            .with("z", "1.96")
            .with("deff", "1")
            .with("nonResponseRate", "10");
        let input = PrevalenceInput::from_params(&params).unwrap();
        assert_eq!(input, prevalence());
    }

    #[test]
    fn test_mean_estimation() {
        let input = MeanEstimationInput {
            sd: 10.0,
            d: 2.0,
            alpha: 0.05,
            non_response_rate: Percent(0.0),
        };
        let result = calculate_mean_estimation(&input).unwrap();
        // (1.96 × 10 / 2)² = 96.04 → 97
        assert_eq!(result.headline().unwrap().1.as_count(), Some(97));
        assert_eq!(result.result("Adjusted for non-response").unwrap().as_count(), Some(97));
    }

    #[test]
    fn test_finite_population_correction() {
        let input = FinitePopulationInput {
            n0: 385.0,
            population_size: 1000.0,
        };
        let result = calculate_finite_population(&input).unwrap();
        // 385 / (1 + 384/1000) = 278.18 → 279
        assert_eq!(result.headline().unwrap().1.as_count(), Some(279));
        assert_eq!(result.result("Reduction").unwrap().as_count(), Some(106));
    }

    #[test]
    fn test_finite_population_rejects_oversized_sample() {
        let input = FinitePopulationInput {
            n0: 500.0,
            population_size: 400.0,
        };
        let err = calculate_finite_population(&input).unwrap_err();
        assert_eq!(err.field(), Some("n0"));
        assert!(err.to_string().contains("must not exceed"));
    }

    #[test]
    fn test_input_serialization_uses_camel_case() {
        let json = serde_json::to_string(&prevalence()).unwrap();
        assert!(json.contains("nonResponseRate"));
        let roundtrip: PrevalenceInput = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, prevalence());
    }
}
