//! # Cluster-Randomized Trials
//!
//! Individual-level sample sizes inflated by the design effect
//!
//! ```text
//! DEFF = 1 + (m − 1)·ICC                      (equal cluster sizes)
//! DEFF = (1 + (m − 1)·ICC)·(1 + cv²)          (variable sizes)
//! ```
//!
//! where `m` is the mean cluster size and `cv` the coefficient of variation
//! of cluster sizes. Clusters per arm are `⌈n·DEFF / m⌉`.

use serde::{Deserialize, Serialize};

use crate::distributions::Tails;
use crate::errors::CalcResult;
use crate::format::{ceil_count, fixed, percent, trim, Z_PLACES};
use crate::params::{FromParams, Params};
use crate::result::{CalculationResult, ResultBuilder};
use crate::validation;

use super::common::{two_mean_n1, two_proportion_terms, DesignZ};

const STUDY_TYPE: &str = "Cluster randomized trial";

const REFERENCE: &str = "Donner A, Klar N. Design and Analysis of Cluster Randomization Trials in Health Research. Arnold; 2000. \
     Eldridge SM, Ashby D, Kerry S. Sample size for cluster randomized trials: effect of coefficient of variation \
     of cluster size and analysis method. Int J Epidemiol. 2006;35(5):1292-1300.";

/// Design effect for mean cluster size `m`, intracluster correlation `icc`
/// and cluster-size coefficient of variation `cv` (0 for equal sizes).
pub fn design_effect(m: f64, icc: f64, cv: f64) -> f64 {
    (1.0 + (m - 1.0) * icc) * (1.0 + cv.powi(2))
}

fn validate_cluster(m: f64, icc: f64, cv: f64) -> CalcResult<()> {
    validation::at_least("clusterSize", m, 1.0)?;
    validation::non_negative("icc", icc)?;
    validation::require(icc < 1.0, "icc", icc, "must be below 1")?;
    validation::non_negative("cv", cv)
}

fn deff_step(builder: ResultBuilder, m: f64, icc: f64, cv: f64, deff: f64) -> ResultBuilder {
    let calc = if cv > 0.0 {
        format!(
            "DEFF = (1 + ({} − 1) × {}) × (1 + {}²) = {}",
            trim(m),
            trim(icc),
            trim(cv),
            fixed(deff, Z_PLACES)
        )
    } else {
        format!("DEFF = 1 + ({} − 1) × {} = {}", trim(m), trim(icc), fixed(deff, Z_PLACES))
    };
    builder.step("Design effect", calc)
}

/// Per-arm inflation shared by the two trial designs
fn cluster_arms(builder: ResultBuilder, n: u64, m: f64, icc: f64, cv: f64) -> (ResultBuilder, u64) {
    let deff = design_effect(m, icc, cv);
    let inflated = n as f64 * deff;
    let individuals = ceil_count(inflated);
    let clusters = ceil_count(inflated / m);
    let total_participants = ceil_count(2.0 * clusters as f64 * m);

    let builder = deff_step(builder, m, icc, cv, deff)
        .step(
            "Inflate for clustering",
            format!("n = {} × {} = {} → {}", n, fixed(deff, Z_PLACES), fixed(inflated, 2), individuals),
        )
        .step(
            "Clusters per arm",
            format!("⌈{} / {}⌉ = {}", fixed(inflated, 2), trim(m), clusters),
        )
        .count("Clusters per arm", clusters)
        .count("Total clusters", clusters * 2)
        .count("Individuals per arm (adjusted)", individuals)
        .count("Individuals per arm (unadjusted)", n)
        .count("Total participants", total_participants)
        .number("Design effect", deff, Z_PLACES);
    (builder, clusters)
}

// ============================================================================
// Binary outcome
// ============================================================================

/// Input parameters for a cluster trial with a binary outcome.
///
/// ## JSON Example
///
/// ```json
/// { "p1": 0.3, "p2": 0.2, "alpha": 0.05, "power": 0.8, "clusterSize": 20, "icc": 0.05, "cv": 0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterBinaryInput {
    pub p1: f64,
    pub p2: f64,
    pub alpha: f64,
    pub power: f64,
    /// Mean number of individuals per cluster
    pub cluster_size: f64,
    /// Intracluster correlation coefficient
    pub icc: f64,
    /// Coefficient of variation of cluster sizes
    pub cv: f64,
}

impl ClusterBinaryInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::probability("p1", self.p1)?;
        validation::probability("p2", self.p2)?;
        validation::differ("p2", self.p1, self.p2)?;
        validation::alpha(self.alpha)?;
        validation::power(self.power)?;
        validate_cluster(self.cluster_size, self.icc, self.cv)
    }
}

impl FromParams for ClusterBinaryInput {
    const FIELDS: &'static [&'static str] = &["p1", "p2", "alpha", "power", "clusterSize", "icc", "cv"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(ClusterBinaryInput {
            p1: params.number("p1")?,
            p2: params.number("p2")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
            cluster_size: params.number("clusterSize")?,
            icc: params.number("icc")?,
            cv: params.number("cv")?,
        })
    }
}

pub fn calculate_cluster_binary(input: &ClusterBinaryInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let ClusterBinaryInput { p1, p2, alpha, power, cluster_size: m, icc, cv } = *input;
    let z = DesignZ::new(alpha, power, Tails::Two);
    let terms = two_proportion_terms(p1, p2, 1.0, &z, (p1 - p2).abs());
    let n = ceil_count(terms.n1);

    let builder = ResultBuilder::new(STUDY_TYPE, "Cluster randomized trial, binary outcome")
        .input("Proportion, arm 1 (p₁)", trim(p1))
        .input("Proportion, arm 2 (p₂)", trim(p2))
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .input("Mean cluster size (m)", trim(m))
        .input("Intracluster correlation (ICC)", trim(icc))
        .input("CV of cluster size", trim(cv))
        .formula(
            "n_cluster = n_individual × DEFF,  DEFF = (1 + (m − 1) × ICC)(1 + cv²),  clusters = ⌈n × DEFF / m⌉",
            "n_individual from the two-proportion formula, m = mean cluster size, ICC = intracluster \
             correlation, cv = coefficient of variation of cluster sizes (0 for equal sizes)",
        );
    let builder = terms
        .steps(z.steps(builder), p1, p2, 1.0, &z)
        .step("Individually randomized size", format!("n = ⌈{}⌉ = {}", fixed(terms.n1, 2), n));
    let (builder, clusters) = cluster_arms(builder, n, m, icc, cv);

    Ok(builder
        .interpretation(format!(
            "Randomize {} clusters per arm ({} in total) of about {} individuals each to detect {} vs {} \
             with {} power at α = {}.",
            clusters,
            clusters * 2,
            trim(m),
            percent(p1, 1),
            percent(p2, 1),
            percent(power, 0),
            trim(alpha)
        ))
        .recommend_if(clusters < 6, "Fewer than six clusters per arm gives unreliable variance estimates; add clusters.")
        .recommend("Adding clusters raises power more than enlarging them when the ICC is non-negligible.")
        .recommend("Analyse with a method that accounts for clustering (GEE or mixed models).")
        .reference(REFERENCE)
        .build())
}

// ============================================================================
// Continuous outcome
// ============================================================================

/// Input parameters for a cluster trial with a continuous outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterContinuousInput {
    pub mean_diff: f64,
    pub sd: f64,
    pub alpha: f64,
    pub power: f64,
    pub cluster_size: f64,
    pub icc: f64,
    pub cv: f64,
}

impl ClusterContinuousInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::require(self.mean_diff != 0.0, "meanDiff", self.mean_diff, "must not be zero")?;
        validation::positive("sd", self.sd)?;
        validation::alpha(self.alpha)?;
        validation::power(self.power)?;
        validate_cluster(self.cluster_size, self.icc, self.cv)
    }
}

impl FromParams for ClusterContinuousInput {
    const FIELDS: &'static [&'static str] = &["meanDiff", "sd", "alpha", "power", "clusterSize", "icc", "cv"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(ClusterContinuousInput {
            mean_diff: params.number("meanDiff")?,
            sd: params.number("sd")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
            cluster_size: params.number("clusterSize")?,
            icc: params.number("icc")?,
            cv: params.number("cv")?,
        })
    }
}

pub fn calculate_cluster_continuous(input: &ClusterContinuousInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let ClusterContinuousInput { mean_diff, sd, alpha, power, cluster_size: m, icc, cv } = *input;
    let z = DesignZ::new(alpha, power, Tails::Two);
    let delta = mean_diff.abs();
    let n_raw = two_mean_n1(sd, sd, 1.0, delta, &z);
    let n = ceil_count(n_raw);

    let builder = ResultBuilder::new(STUDY_TYPE, "Cluster randomized trial, continuous outcome")
        .input("Mean difference (Δ)", trim(mean_diff))
        .input("Standard deviation (σ)", trim(sd))
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .input("Mean cluster size (m)", trim(m))
        .input("Intracluster correlation (ICC)", trim(icc))
        .input("CV of cluster size", trim(cv))
        .formula(
            "n = 2(Zα/2 + Zβ)²σ² / Δ² × DEFF,  clusters = ⌈n × DEFF / m⌉",
            "Δ = mean difference, σ = individual-level SD, DEFF = design effect, m = mean cluster size",
        );
    let builder = z.steps(builder).step(
        "Individually randomized size",
        format!(
            "n = 2 × ({} + {})² × {}² / {}² = {} → {}",
            fixed(z.z_alpha, Z_PLACES),
            fixed(z.z_beta, Z_PLACES),
            trim(sd),
            trim(delta),
            fixed(n_raw, 2),
            n
        ),
    );
    let (builder, clusters) = cluster_arms(builder, n, m, icc, cv);

    Ok(builder
        .interpretation(format!(
            "Randomize {} clusters per arm of about {} individuals to detect a mean difference of {} \
             with {} power at α = {}.",
            clusters,
            trim(m),
            trim(delta),
            percent(power, 0),
            trim(alpha)
        ))
        .recommend_if(clusters < 6, "Fewer than six clusters per arm gives unreliable variance estimates; add clusters.")
        .recommend("Take the ICC from a published trial in a similar setting; small changes move the design effect a lot.")
        .reference(REFERENCE)
        .build())
}

// ============================================================================
// Design effect for a given n
// ============================================================================

/// Inflate an individually randomized total for clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignEffectInput {
    /// Sample size required under individual randomization
    pub n: u64,
    pub cluster_size: f64,
    pub icc: f64,
    pub cv: f64,
}

impl DesignEffectInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::require(self.n > 0, "n", self.n as f64, "must be at least 1")?;
        validate_cluster(self.cluster_size, self.icc, self.cv)
    }
}

impl FromParams for DesignEffectInput {
    const FIELDS: &'static [&'static str] = &["n", "clusterSize", "icc", "cv"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(DesignEffectInput {
            n: params.count("n")?,
            cluster_size: params.number("clusterSize")?,
            icc: params.number("icc")?,
            cv: params.number("cv")?,
        })
    }
}

pub fn calculate_design_effect(input: &DesignEffectInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let DesignEffectInput { n, cluster_size: m, icc, cv } = *input;
    let deff = design_effect(m, icc, cv);
    let inflated = n as f64 * deff;
    let adjusted = ceil_count(inflated);
    let clusters = ceil_count(inflated / m);
    let effective = n as f64 / deff;

    let builder = ResultBuilder::new(STUDY_TYPE, "Design effect")
        .input("Individually randomized n", n.to_string())
        .input("Mean cluster size (m)", trim(m))
        .input("Intracluster correlation (ICC)", trim(icc))
        .input("CV of cluster size", trim(cv))
        .formula(
            "DEFF = (1 + (m − 1) × ICC)(1 + cv²),  n_adj = n × DEFF",
            "m = mean cluster size, ICC = intracluster correlation, cv = coefficient of variation of cluster sizes",
        );

    Ok(deff_step(builder, m, icc, cv, deff)
        .step("Adjusted size", format!("{} × {} = {} → {}", n, fixed(deff, Z_PLACES), fixed(inflated, 2), adjusted))
        .step("Clusters", format!("⌈{} / {}⌉ = {}", fixed(inflated, 2), trim(m), clusters))
        .count("Adjusted sample size", adjusted)
        .count("Number of clusters", clusters)
        .number("Design effect", deff, Z_PLACES)
        .number("Effective sample size of n", effective, 1)
        .interpretation(format!(
            "Clustering inflates the variance by a factor of {}; {} individuals in {} clusters give the \
             precision of {} individually randomized subjects.",
            fixed(deff, 2),
            adjusted,
            clusters,
            n
        ))
        .recommend_if(
            deff > 2.0,
            "The design effect exceeds 2; smaller clusters or more of them would be more efficient.",
        )
        .reference(REFERENCE)
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
    fn test_design_effect_is_one_without_clustering() {
        assert_eq!(design_effect(30.0, 0.0, 0.0), 1.0);
        assert_eq!(design_effect(1.0, 0.2, 0.0), 1.0);
    }

    #[test]
    fn test_design_effect_forms() {
        assert_abs_diff_eq!(design_effect(20.0, 0.05, 0.0), 1.95, epsilon = 1e-12);
        // 1.95 × (1 + 0.4²)
        assert_abs_diff_eq!(design_effect(20.0, 0.05, 0.4), 2.262, epsilon = 1e-12);
        assert_abs_diff_eq!(design_effect(1.0, 0.2, 0.5), 1.25, epsilon = 1e-12);
    }

    #[test]
    fn test_cluster_binary() {
        let input = ClusterBinaryInput {
            p1: 0.3,
            p2: 0.2,
            alpha: 0.05,
            power: 0.8,
            cluster_size: 20.0,
            icc: 0.05,
            cv: 0.0,
        };
        let result = calculate_cluster_binary(&input).unwrap();
        // 294 × 1.95 = 573.3 ; / 20 = 28.67
        assert_eq!(count(&result, "Individuals per arm (unadjusted)"), 294);
        assert_eq!(count(&result, "Individuals per arm (adjusted)"), 574);
        assert_eq!(count(&result, "Clusters per arm"), 29);
        assert_eq!(count(&result, "Total clusters"), 58);
        assert_eq!(count(&result, "Total participants"), 1160);
    }

    #[test]
    fn test_cluster_continuous() {
        let input = ClusterContinuousInput {
            mean_diff: 5.0,
            sd: 10.0,
            alpha: 0.05,
            power: 0.8,
            cluster_size: 20.0,
            icc: 0.05,
            cv: 0.0,
        };
        let result = calculate_cluster_continuous(&input).unwrap();
        // 63 × 1.95 = 122.85 ; / 20 = 6.14
        assert_eq!(count(&result, "Individuals per arm (adjusted)"), 123);
        assert_eq!(count(&result, "Clusters per arm"), 7);
    }

    #[test]
    fn test_zero_icc_keeps_individual_size() {
        let input = DesignEffectInput {
            n: 200,
            cluster_size: 10.0,
            icc: 0.0,
            cv: 0.0,
        };
        let result = calculate_design_effect(&input).unwrap();
        assert_eq!(count(&result, "Adjusted sample size"), 200);
        assert_eq!(count(&result, "Number of clusters"), 20);
    }

    #[test]
    fn test_design_effect_calculator() {
        let input = DesignEffectInput {
            n: 200,
            cluster_size: 10.0,
            icc: 0.02,
            cv: 0.0,
        };
        let result = calculate_design_effect(&input).unwrap();
        // DEFF 1.18 → 236 individuals, 23.6 → 24 clusters
        assert_eq!(count(&result, "Adjusted sample size"), 236);
        assert_eq!(count(&result, "Number of clusters"), 24);
    }

    #[test]
    fn test_cluster_size_variation_inflates_design_effect() {
        let input = DesignEffectInput {
            n: 200,
            cluster_size: 10.0,
            icc: 0.02,
            cv: 0.4,
        };
        let result = calculate_design_effect(&input).unwrap();
        // DEFF 1.18 × 1.16 = 1.3688 → 273.76 individuals, 27.38 clusters
        assert_eq!(count(&result, "Adjusted sample size"), 274);
        assert_eq!(count(&result, "Number of clusters"), 28);
        assert!(result.steps()[0].calc.starts_with("DEFF = (1 + (10 − 1) × 0.02) × (1 + 0.4²)"));
    }

    #[test]
    fn test_invalid_cluster_parameters() {
        let input = DesignEffectInput {
            n: 200,
            cluster_size: 0.5,
            icc: 0.02,
            cv: 0.0,
        };
        assert_eq!(calculate_design_effect(&input).unwrap_err().field(), Some("clusterSize"));
        let input = DesignEffectInput {
            n: 200,
            cluster_size: 10.0,
            icc: 1.0,
            cv: 0.0,
        };
        assert_eq!(calculate_design_effect(&input).unwrap_err().field(), Some("icc"));
    }
}
