//! # Calculator Registry
//!
//! Central registry of every calculator in the engine. Each calculator has
//! metadata (slug, title, formula, parameters, citation, runnable example)
//! and a dispatch from raw [`Params`] to its formula function.
//!
//! ## Architecture
//!
//! The registry provides:
//! - Type-safe calculator identification via the [`Calculator`] enum
//! - Lookup by URL-style slug (`"two-sample-t"`)
//! - Full metadata for front ends and the generated `CALCULATORS.md`
//!
//! ## Usage
//!
//! ```rust
//! use biostat_core::params::Params;
//! use biostat_core::registry::{self, Calculator};
//!
//! let params = Params::new()
//!     .with("p", 0.5)
//!     .with("d", 0.05)
//!     .with("z", 1.96)
//!     .with("deff", 1)
//!     .with("nonResponseRate", "10%");
//!
//! let result = registry::run("prevalence", &params).unwrap();
//! assert_eq!(result.headline().unwrap().1.as_count(), Some(385));
//!
//! let meta = Calculator::Prevalence.metadata();
//! assert_eq!(meta.params, &["p", "d", "z", "deff", "nonResponseRate"]);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::calculations::{
    agreement, bayesian, clinical, cluster, comparative, descriptive, diagnostic, effect_size,
    meta_analysis, power, survival, t_test,
};
use crate::errors::{CalcError, CalcResult};
use crate::params::{FromParams, Params};
use crate::result::CalculationResult;

// ============================================================================
// Categories
// ============================================================================

/// Calculator groups, one per calculation module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Descriptive,
    TTest,
    Comparative,
    Diagnostic,
    ClinicalTrials,
    ClusterRct,
    Survival,
    Power,
    EffectSize,
    MetaAnalysis,
    Bayesian,
    Agreement,
}

impl Category {
    /// Display name for the category
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Descriptive => "Descriptive",
            Category::TTest => "T-Test",
            Category::Comparative => "Comparative",
            Category::Diagnostic => "Diagnostic",
            Category::ClinicalTrials => "Clinical Trials",
            Category::ClusterRct => "Cluster RCT",
            Category::Survival => "Survival",
            Category::Power => "Power",
            Category::EffectSize => "Effect Size",
            Category::MetaAnalysis => "Meta-Analysis",
            Category::Bayesian => "Bayesian",
            Category::Agreement => "Agreement",
        }
    }

    /// All categories in display order
    pub fn all() -> &'static [Category] {
        &[
            Category::Descriptive,
            Category::TTest,
            Category::Comparative,
            Category::Diagnostic,
            Category::ClinicalTrials,
            Category::ClusterRct,
            Category::Survival,
            Category::Power,
            Category::EffectSize,
            Category::MetaAnalysis,
            Category::Bayesian,
            Category::Agreement,
        ]
    }
}

// ============================================================================
// Calculator Metadata
// ============================================================================

/// Everything a front end needs to present a calculator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorMetadata {
    /// URL-style identifier (e.g., "two-sample-t")
    pub slug: &'static str,
    /// Human-readable name
    pub title: &'static str,
    /// What the calculator answers
    pub description: &'static str,
    /// The formula in plain text
    pub formula: &'static str,
    pub category: Category,
    /// Parameter names, in display order
    pub params: &'static [&'static str],
    /// A complete, valid parameter object (JSON)
    pub example: &'static str,
    /// Primary literature reference
    pub reference: &'static str,
    /// Source module where the implementation lives
    pub source_module: &'static str,
    /// Function implementing the calculator
    pub source_function: &'static str,
}

// ============================================================================
// Calculator Enum
// ============================================================================

/// Every calculator in the engine. Serializes as its slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Calculator {
    // Descriptive
    Prevalence,
    MeanEstimation,
    FinitePopulation,
    // T-Test
    TwoSampleT,
    PairedT,
    OneSampleT,
    // Comparative
    CaseControl,
    Cohort,
    CrossSectional,
    MatchedPairs,
    // Diagnostic
    SensitivitySpecificity,
    RocAuc,
    PredictiveValues,
    // Clinical trials
    SuperiorityBinary,
    NonInferiorityBinary,
    EquivalenceBinary,
    SuperiorityContinuous,
    // Cluster RCT
    ClusterBinary,
    ClusterContinuous,
    DesignEffect,
    // Survival
    LogRank,
    CoxRegression,
    ExponentialSurvival,
    Freedman,
    // Power
    PowerTwoMeans,
    PowerTwoProportions,
    MinimumDetectableEffect,
    Correlation,
    // Effect size
    CohensD,
    TwoByTwo,
    EffectConversion,
    // Meta-analysis
    #[serde(rename = "dersimonian-laird")]
    DersimonianLaird,
    MetaPower,
    MetaStudiesNeeded,
    FailSafeN,
    // Bayesian
    BayesianProportion,
    BayesianMean,
    Assurance,
    BetaBinomialUpdate,
    // Agreement
    CohensKappa,
    IccSampleSize,
    BlandAltman,
}

/// All calculators in the registry (for iteration)
pub static ALL_CALCULATORS: &[Calculator] = &[
    Calculator::Prevalence,
    Calculator::MeanEstimation,
    Calculator::FinitePopulation,
    Calculator::TwoSampleT,
    Calculator::PairedT,
    Calculator::OneSampleT,
    Calculator::CaseControl,
    Calculator::Cohort,
    Calculator::CrossSectional,
    Calculator::MatchedPairs,
    Calculator::SensitivitySpecificity,
    Calculator::RocAuc,
    Calculator::PredictiveValues,
    Calculator::SuperiorityBinary,
    Calculator::NonInferiorityBinary,
    Calculator::EquivalenceBinary,
    Calculator::SuperiorityContinuous,
    Calculator::ClusterBinary,
    Calculator::ClusterContinuous,
    Calculator::DesignEffect,
    Calculator::LogRank,
    Calculator::CoxRegression,
    Calculator::ExponentialSurvival,
    Calculator::Freedman,
    Calculator::PowerTwoMeans,
    Calculator::PowerTwoProportions,
    Calculator::MinimumDetectableEffect,
    Calculator::Correlation,
    Calculator::CohensD,
    Calculator::TwoByTwo,
    Calculator::EffectConversion,
    Calculator::DersimonianLaird,
    Calculator::MetaPower,
    Calculator::MetaStudiesNeeded,
    Calculator::FailSafeN,
    Calculator::BayesianProportion,
    Calculator::BayesianMean,
    Calculator::Assurance,
    Calculator::BetaBinomialUpdate,
    Calculator::CohensKappa,
    Calculator::IccSampleSize,
    Calculator::BlandAltman,
];

static BY_SLUG: Lazy<HashMap<&'static str, Calculator>> = Lazy::new(|| {
    ALL_CALCULATORS
        .iter()
        .map(|calculator| (calculator.slug(), *calculator))
        .collect()
});

/// Parse the parameters and run the formula
fn execute<I, F>(params: &Params, calculate: F) -> CalcResult<CalculationResult>
where
    I: FromParams,
    F: Fn(&I) -> CalcResult<CalculationResult>,
{
    calculate(&I::from_params(params)?)
}

impl Calculator {
    /// Look up a calculator by slug. Case and `_`/`-` are not significant.
    pub fn from_slug(slug: &str) -> CalcResult<Calculator> {
        let normalized = slug.trim().to_ascii_lowercase().replace('_', "-");
        BY_SLUG
            .get(normalized.as_str())
            .copied()
            .ok_or_else(|| CalcError::unknown_calculator(slug))
    }

    pub fn slug(&self) -> &'static str {
        self.metadata().slug
    }

    /// Parse `params` into this calculator's input and run it.
    pub fn run(&self, params: &Params) -> CalcResult<CalculationResult> {
        match self {
            Calculator::Prevalence => execute(params, descriptive::calculate_prevalence),
            Calculator::MeanEstimation => execute(params, descriptive::calculate_mean_estimation),
            Calculator::FinitePopulation => execute(params, descriptive::calculate_finite_population),
            Calculator::TwoSampleT => execute(params, t_test::calculate_two_sample_t),
            Calculator::PairedT => execute(params, t_test::calculate_paired_t),
            Calculator::OneSampleT => execute(params, t_test::calculate_one_sample_t),
            Calculator::CaseControl => execute(params, comparative::calculate_case_control),
            Calculator::Cohort => execute(params, comparative::calculate_cohort),
            Calculator::CrossSectional => execute(params, comparative::calculate_cross_sectional),
            Calculator::MatchedPairs => execute(params, comparative::calculate_matched_pairs),
            Calculator::SensitivitySpecificity => {
                execute(params, diagnostic::calculate_sensitivity_specificity)
            }
            Calculator::RocAuc => execute(params, diagnostic::calculate_roc_auc),
            Calculator::PredictiveValues => execute(params, diagnostic::calculate_predictive_values),
            Calculator::SuperiorityBinary => execute(params, clinical::calculate_superiority_binary),
            Calculator::NonInferiorityBinary => {
                execute(params, clinical::calculate_non_inferiority_binary)
            }
            Calculator::EquivalenceBinary => execute(params, clinical::calculate_equivalence_binary),
            Calculator::SuperiorityContinuous => {
                execute(params, clinical::calculate_superiority_continuous)
            }
            Calculator::ClusterBinary => execute(params, cluster::calculate_cluster_binary),
            Calculator::ClusterContinuous => execute(params, cluster::calculate_cluster_continuous),
            Calculator::DesignEffect => execute(params, cluster::calculate_design_effect),
            Calculator::LogRank => execute(params, survival::calculate_log_rank),
            Calculator::CoxRegression => execute(params, survival::calculate_cox_regression),
            Calculator::ExponentialSurvival => execute(params, survival::calculate_exponential_survival),
            Calculator::Freedman => execute(params, survival::calculate_freedman),
            Calculator::PowerTwoMeans => execute(params, power::calculate_power_two_means),
            Calculator::PowerTwoProportions => execute(params, power::calculate_power_two_proportions),
            Calculator::MinimumDetectableEffect => {
                execute(params, power::calculate_minimum_detectable_effect)
            }
            Calculator::Correlation => execute(params, power::calculate_correlation),
            Calculator::CohensD => execute(params, effect_size::calculate_cohens_d),
            Calculator::TwoByTwo => execute(params, effect_size::calculate_two_by_two),
            Calculator::EffectConversion => execute(params, effect_size::calculate_effect_conversion),
            Calculator::DersimonianLaird => execute(params, meta_analysis::calculate_dersimonian_laird),
            Calculator::MetaPower => execute(params, meta_analysis::calculate_meta_power),
            Calculator::MetaStudiesNeeded => execute(params, meta_analysis::calculate_meta_studies_needed),
            Calculator::FailSafeN => execute(params, meta_analysis::calculate_fail_safe_n),
            Calculator::BayesianProportion => execute(params, bayesian::calculate_bayesian_proportion),
            Calculator::BayesianMean => execute(params, bayesian::calculate_bayesian_mean),
            Calculator::Assurance => execute(params, bayesian::calculate_assurance),
            Calculator::BetaBinomialUpdate => execute(params, bayesian::calculate_beta_binomial_update),
            Calculator::CohensKappa => execute(params, agreement::calculate_cohens_kappa),
            Calculator::IccSampleSize => execute(params, agreement::calculate_icc_sample_size),
            Calculator::BlandAltman => execute(params, agreement::calculate_bland_altman),
        }
    }

    /// Get all calculators in a given category
    pub fn in_category(category: Category) -> Vec<Calculator> {
        ALL_CALCULATORS
            .iter()
            .filter(|calculator| calculator.metadata().category == category)
            .copied()
            .collect()
    }

    /// Get complete metadata for this calculator
    pub fn metadata(&self) -> CalculatorMetadata {
        match self {
            // =================================================================
            // Descriptive
            // =================================================================
            Calculator::Prevalence => CalculatorMetadata {
                slug: "prevalence",
                title: "Prevalence Survey",
                description: "Sample size to estimate a proportion to a given absolute precision, with design effect and non-response.",
                formula: "n = z² × p(1 − p) / d² × DEFF;  adjusted = n / (1 − NR)",
                category: Category::Descriptive,
                params: descriptive::PrevalenceInput::FIELDS,
                example: r#"{"p": 0.5, "d": 0.05, "z": 1.96, "deff": 1, "nonResponseRate": 10}"#,
                reference: "Lwanga SK, Lemeshow S. Sample Size Determination in Health Studies. WHO; 1991.",
                source_module: "calculations/descriptive.rs",
                source_function: "calculate_prevalence",
            },
            Calculator::MeanEstimation => CalculatorMetadata {
                slug: "mean-estimation",
                title: "Mean Estimation",
                description: "Sample size to estimate a population mean to a given precision.",
                formula: "n = (z × σ / d)²",
                category: Category::Descriptive,
                params: descriptive::MeanEstimationInput::FIELDS,
                example: r#"{"sd": 10, "d": 2, "alpha": 0.05, "nonResponseRate": 0}"#,
                reference: "Cochran WG. Sampling Techniques. 3rd ed. Wiley; 1977.",
                source_module: "calculations/descriptive.rs",
                source_function: "calculate_mean_estimation",
            },
            Calculator::FinitePopulation => CalculatorMetadata {
                slug: "finite-population",
                title: "Finite Population Correction",
                description: "Reduce an infinite-population sample size when sampling from a small population.",
                formula: "n = n₀ / (1 + (n₀ − 1) / N)",
                category: Category::Descriptive,
                params: descriptive::FinitePopulationInput::FIELDS,
                example: r#"{"n0": 385, "populationSize": 1000}"#,
                reference: "Cochran WG. Sampling Techniques. 3rd ed. Wiley; 1977.",
                source_module: "calculations/descriptive.rs",
                source_function: "calculate_finite_population",
            },

            // =================================================================
            // T-Test
            // =================================================================
            Calculator::TwoSampleT => CalculatorMetadata {
                slug: "two-sample-t",
                title: "Two-Sample T-Test",
                description: "Sample size to detect a difference between two independent means.",
                formula: "n₁ = (Zα/2 + Zβ)² (σ₁² + σ₂²/k) / Δ²;  n₂ = k × n₁",
                category: Category::TTest,
                params: t_test::TwoSampleTInput::FIELDS,
                example: r#"{"mean1": 75, "mean2": 70, "sd1": 15, "sd2": 15, "alpha": 0.05, "power": 0.8, "ratio": 1}"#,
                reference: "Chow SC, Shao J, Wang H. Sample Size Calculations in Clinical Research. 2nd ed. Chapman & Hall/CRC; 2008.",
                source_module: "calculations/t_test.rs",
                source_function: "calculate_two_sample_t",
            },
            Calculator::PairedT => CalculatorMetadata {
                slug: "paired-t",
                title: "Paired T-Test",
                description: "Number of pairs to detect a mean within-pair difference.",
                formula: "n = ((Zα/2 + Zβ) × σd / δ)²",
                category: Category::TTest,
                params: t_test::PairedTInput::FIELDS,
                example: r#"{"meanDiff": 5, "sdDiff": 10, "alpha": 0.05, "power": 0.8}"#,
                reference: "Chow SC, Shao J, Wang H. Sample Size Calculations in Clinical Research. 2nd ed. Chapman & Hall/CRC; 2008.",
                source_module: "calculations/t_test.rs",
                source_function: "calculate_paired_t",
            },
            Calculator::OneSampleT => CalculatorMetadata {
                slug: "one-sample-t",
                title: "One-Sample T-Test",
                description: "Sample size to detect a departure of a mean from a reference value.",
                formula: "n = ((Zα/2 + Zβ) × σ / (μ₁ − μ₀))²",
                category: Category::TTest,
                params: t_test::OneSampleTInput::FIELDS,
                example: r#"{"mean0": 100, "mean1": 105, "sd": 10, "alpha": 0.05, "power": 0.9}"#,
                reference: "Chow SC, Shao J, Wang H. Sample Size Calculations in Clinical Research. 2nd ed. Chapman & Hall/CRC; 2008.",
                source_module: "calculations/t_test.rs",
                source_function: "calculate_one_sample_t",
            },

            // =================================================================
            // Comparative
            // =================================================================
            Calculator::CaseControl => CalculatorMetadata {
                slug: "case-control",
                title: "Case-Control Study",
                description: "Cases and controls needed to detect an odds ratio given exposure among controls.",
                formula: "p₁ = OR × p₀ / (1 + p₀(OR − 1));  pooled two-proportion formula",
                category: Category::Comparative,
                params: comparative::CaseControlInput::FIELDS,
                example: r#"{"p0": 0.2, "or": 2, "alpha": 0.05, "power": 0.8, "ratio": 1}"#,
                reference: "Fleiss JL, Levin B, Paik MC. Statistical Methods for Rates and Proportions. 3rd ed. Wiley; 2003.",
                source_module: "calculations/comparative.rs",
                source_function: "calculate_case_control",
            },
            Calculator::Cohort => CalculatorMetadata {
                slug: "cohort",
                title: "Cohort Study",
                description: "Exposed and unexposed subjects needed to detect a relative risk.",
                formula: "p₁ = RR × p₀;  pooled two-proportion formula",
                category: Category::Comparative,
                params: comparative::CohortInput::FIELDS,
                example: r#"{"p0": 0.1, "rr": 2, "alpha": 0.05, "power": 0.8, "ratio": 1}"#,
                reference: "Fleiss JL, Levin B, Paik MC. Statistical Methods for Rates and Proportions. 3rd ed. Wiley; 2003.",
                source_module: "calculations/comparative.rs",
                source_function: "calculate_cohort",
            },
            Calculator::CrossSectional => CalculatorMetadata {
                slug: "cross-sectional",
                title: "Cross-Sectional Comparison",
                description: "Sample size to detect a difference in prevalence between two groups.",
                formula: "n₁ = [Zα/2 √(p̄q̄(1 + 1/k)) + Zβ √(p₁q₁ + p₂q₂/k)]² / (p₁ − p₂)²",
                category: Category::Comparative,
                params: comparative::CrossSectionalInput::FIELDS,
                example: r#"{"p1": 0.3, "p2": 0.2, "alpha": 0.05, "power": 0.8, "ratio": 1}"#,
                reference: "Fleiss JL, Levin B, Paik MC. Statistical Methods for Rates and Proportions. 3rd ed. Wiley; 2003.",
                source_module: "calculations/comparative.rs",
                source_function: "calculate_cross_sectional",
            },
            Calculator::MatchedPairs => CalculatorMetadata {
                slug: "matched-pairs",
                title: "Matched Pairs (McNemar)",
                description: "Matched pairs needed to detect a difference in discordant proportions.",
                formula: "n = [Zα/2 √ψ + Zβ √(ψ − δ²)]² / δ²,  ψ = p₁₀ + p₀₁,  δ = p₁₀ − p₀₁",
                category: Category::Comparative,
                params: comparative::MatchedPairsInput::FIELDS,
                example: r#"{"p10": 0.2, "p01": 0.1, "alpha": 0.05, "power": 0.8}"#,
                reference: "Connor RJ. Sample size for testing differences in proportions for the paired-sample design. Biometrics. 1987;43(1):207-211.",
                source_module: "calculations/comparative.rs",
                source_function: "calculate_matched_pairs",
            },

            // =================================================================
            // Diagnostic
            // =================================================================
            Calculator::SensitivitySpecificity => CalculatorMetadata {
                slug: "sensitivity-specificity",
                title: "Sensitivity and Specificity",
                description: "Subjects needed to estimate sensitivity and specificity to a given precision.",
                formula: "n_se = z² Se(1 − Se) / d² / prev;  n_sp = z² Sp(1 − Sp) / d² / (1 − prev)",
                category: Category::Diagnostic,
                params: diagnostic::SensitivitySpecificityInput::FIELDS,
                example: r#"{"sensitivity": 0.9, "specificity": 0.85, "prevalence": 0.2, "d": 0.05, "alpha": 0.05}"#,
                reference: "Buderer NM. Statistical methodology: incorporating the prevalence of disease into the sample size calculation for sensitivity and specificity. Acad Emerg Med. 1996;3(9):895-900.",
                source_module: "calculations/diagnostic.rs",
                source_function: "calculate_sensitivity_specificity",
            },
            Calculator::RocAuc => CalculatorMetadata {
                slug: "roc-auc",
                title: "ROC Area Under the Curve",
                description: "Cases and controls needed to show an AUC differs from a null value.",
                formula: "n = (Zα/2 √V(A₀) + Zβ √V(A₁))² / (A₁ − A₀)²",
                category: Category::Diagnostic,
                params: diagnostic::RocAucInput::FIELDS,
                example: r#"{"auc": 0.8, "auc0": 0.5, "alpha": 0.05, "power": 0.8, "ratio": 1}"#,
                reference: "Hanley JA, McNeil BJ. The meaning and use of the area under a receiver operating characteristic (ROC) curve. Radiology. 1982;143(1):29-36.",
                source_module: "calculations/diagnostic.rs",
                source_function: "calculate_roc_auc",
            },
            Calculator::PredictiveValues => CalculatorMetadata {
                slug: "predictive-values",
                title: "Predictive Values",
                description: "PPV, NPV, likelihood ratios and accuracy at a given prevalence.",
                formula: "PPV = Se × prev / (Se × prev + (1 − Sp)(1 − prev))",
                category: Category::Diagnostic,
                params: diagnostic::PredictiveValuesInput::FIELDS,
                example: r#"{"sensitivity": 0.9, "specificity": 0.8, "prevalence": 0.1}"#,
                reference: "Altman DG, Bland JM. Diagnostic tests 2: predictive values. BMJ. 1994;309(6947):102.",
                source_module: "calculations/diagnostic.rs",
                source_function: "calculate_predictive_values",
            },

            // =================================================================
            // Clinical trials
            // =================================================================
            Calculator::SuperiorityBinary => CalculatorMetadata {
                slug: "superiority-binary",
                title: "Superiority Trial (Binary)",
                description: "Per-arm sample size to show one response rate exceeds another, inflated for dropout.",
                formula: "n₁ = [Zα/2 √(p̄q̄(1 + 1/k)) + Zβ √(p₁q₁ + p₂q₂/k)]² / (p₁ − p₂)²;  n / (1 − dropout)",
                category: Category::ClinicalTrials,
                params: clinical::SuperiorityBinaryInput::FIELDS,
                example: r#"{"p1": 0.6, "p2": 0.4, "alpha": 0.05, "power": 0.8, "ratio": 1, "dropout": 10}"#,
                reference: "Chow SC, Shao J, Wang H. Sample Size Calculations in Clinical Research. 2nd ed. Chapman & Hall/CRC; 2008.",
                source_module: "calculations/clinical.rs",
                source_function: "calculate_superiority_binary",
            },
            Calculator::NonInferiorityBinary => CalculatorMetadata {
                slug: "non-inferiority-binary",
                title: "Non-Inferiority Trial (Binary)",
                description: "Per-arm sample size to show a treatment is no worse than control by more than a margin.",
                formula: "n₁ = [Zα √((1 + 1/k) p̄q̄) + Zβ √(p₁q₁ + p₂q₂/k)]² / (p₂ − p₁ + margin)²",
                category: Category::ClinicalTrials,
                params: clinical::NonInferiorityBinaryInput::FIELDS,
                example: r#"{"p1": 0.8, "p2": 0.8, "margin": 0.1, "alpha": 0.05, "power": 0.8, "ratio": 1, "dropout": 0}"#,
                reference: "Chow SC, Shao J, Wang H. Sample Size Calculations in Clinical Research. 2nd ed. Chapman & Hall/CRC; 2008.",
                source_module: "calculations/clinical.rs",
                source_function: "calculate_non_inferiority_binary",
            },
            Calculator::EquivalenceBinary => CalculatorMetadata {
                slug: "equivalence-binary",
                title: "Equivalence Trial (Binary)",
                description: "Per-arm sample size for two one-sided tests (TOST) of equivalence within a margin.",
                formula: "n₁ = 2 × [Zα √((1 + 1/k) p̄q̄) + Zβ √(p₁q₁ + p₂q₂/k)]² / (margin − |p₁ − p₂|)²",
                category: Category::ClinicalTrials,
                params: clinical::EquivalenceBinaryInput::FIELDS,
                example: r#"{"p1": 0.8, "p2": 0.8, "margin": 0.1, "alpha": 0.05, "power": 0.8, "ratio": 1, "dropout": 0}"#,
                reference: "Chow SC, Shao J, Wang H. Sample Size Calculations in Clinical Research. 2nd ed. Chapman & Hall/CRC; 2008.",
                source_module: "calculations/clinical.rs",
                source_function: "calculate_equivalence_binary",
            },
            Calculator::SuperiorityContinuous => CalculatorMetadata {
                slug: "superiority-continuous",
                title: "Superiority Trial (Continuous)",
                description: "Per-arm sample size to detect a difference in means, inflated for dropout.",
                formula: "n₁ = (Zα/2 + Zβ)² σ² (1 + 1/k) / Δ²;  n / (1 − dropout)",
                category: Category::ClinicalTrials,
                params: clinical::SuperiorityContinuousInput::FIELDS,
                example: r#"{"meanDiff": 5, "sd": 10, "alpha": 0.05, "power": 0.8, "ratio": 1, "dropout": 20}"#,
                reference: "Chow SC, Shao J, Wang H. Sample Size Calculations in Clinical Research. 2nd ed. Chapman & Hall/CRC; 2008.",
                source_module: "calculations/clinical.rs",
                source_function: "calculate_superiority_continuous",
            },

            // =================================================================
            // Cluster RCT
            // =================================================================
            Calculator::ClusterBinary => CalculatorMetadata {
                slug: "cluster-binary",
                title: "Cluster Randomized Trial (Binary)",
                description: "Clusters per arm to compare two proportions when individuals are randomized in groups.",
                formula: "n × DEFF,  DEFF = 1 + (m − 1) × ICC;  clusters = ⌈n × DEFF / m⌉",
                category: Category::ClusterRct,
                params: cluster::ClusterBinaryInput::FIELDS,
                example: r#"{"p1": 0.3, "p2": 0.2, "alpha": 0.05, "power": 0.8, "clusterSize": 20, "icc": 0.05, "cv": 0}"#,
                reference: "Donner A, Klar N. Design and Analysis of Cluster Randomization Trials in Health Research. Arnold; 2000.",
                source_module: "calculations/cluster.rs",
                source_function: "calculate_cluster_binary",
            },
            Calculator::ClusterContinuous => CalculatorMetadata {
                slug: "cluster-continuous",
                title: "Cluster Randomized Trial (Continuous)",
                description: "Clusters per arm to compare two means when individuals are randomized in groups.",
                formula: "n × DEFF,  DEFF = 1 + (m − 1) × ICC;  clusters = ⌈n × DEFF / m⌉",
                category: Category::ClusterRct,
                params: cluster::ClusterContinuousInput::FIELDS,
                example: r#"{"meanDiff": 5, "sd": 10, "alpha": 0.05, "power": 0.8, "clusterSize": 20, "icc": 0.05, "cv": 0}"#,
                reference: "Donner A, Klar N. Design and Analysis of Cluster Randomization Trials in Health Research. Arnold; 2000.",
                source_module: "calculations/cluster.rs",
                source_function: "calculate_cluster_continuous",
            },
            Calculator::DesignEffect => CalculatorMetadata {
                slug: "design-effect",
                title: "Design Effect",
                description: "Inflate an individually randomized sample size for clustering.",
                formula: "DEFF = (1 + (m − 1) × ICC)(1 + cv²)",
                category: Category::ClusterRct,
                params: cluster::DesignEffectInput::FIELDS,
                example: r#"{"n": 200, "clusterSize": 10, "icc": 0.02, "cv": 0}"#,
                reference: "Eldridge SM, Ashby D, Kerry S. Sample size for cluster randomized trials: effect of coefficient of variation of cluster size and analysis method. Int J Epidemiol. 2006;35(5):1292-1300.",
                source_module: "calculations/cluster.rs",
                source_function: "calculate_design_effect",
            },

            // =================================================================
            // Survival
            // =================================================================
            Calculator::LogRank => CalculatorMetadata {
                slug: "log-rank",
                title: "Log-Rank Test",
                description: "Events and subjects needed to detect a hazard ratio.",
                formula: "d = ((Zα/2 + Zβ) / ln HR)² (1 + r)² / r;  N = d / eventRate",
                category: Category::Survival,
                params: survival::LogRankInput::FIELDS,
                example: r#"{"hr": 0.7, "alpha": 0.05, "power": 0.8, "ratio": 1, "eventRate": 0.3}"#,
                reference: "Schoenfeld DA. Sample-size formula for the proportional-hazards regression model. Biometrics. 1983;39(2):499-503.",
                source_module: "calculations/survival.rs",
                source_function: "calculate_log_rank",
            },
            Calculator::CoxRegression => CalculatorMetadata {
                slug: "cox-regression",
                title: "Cox Regression",
                description: "Events and subjects needed for a covariate effect in a proportional hazards model.",
                formula: "D = (Zα/2 + Zβ)² / ((1 − R²) σ² (ln HR)²);  N = D / eventProb",
                category: Category::Survival,
                params: survival::CoxRegressionInput::FIELDS,
                example: r#"{"hr": 1.5, "eventProb": 0.3, "alpha": 0.05, "power": 0.8, "r2": 0, "sd": 1}"#,
                reference: "Hsieh FY, Lavori PW. Sample-size calculations for the Cox proportional hazards regression model with nonbinary covariates. Control Clin Trials. 2000;21(6):552-560.",
                source_module: "calculations/survival.rs",
                source_function: "calculate_cox_regression",
            },
            Calculator::ExponentialSurvival => CalculatorMetadata {
                slug: "exponential-survival",
                title: "Exponential Survival",
                description: "Subjects needed to compare median survival times with uniform accrual and follow-up.",
                formula: "λ = ln 2 / median;  P = 1 − (e^(−λF) − e^(−λ(A+F))) / (λA)",
                category: Category::Survival,
                params: survival::ExponentialSurvivalInput::FIELDS,
                example: r#"{"median1": 12, "median2": 18, "accrualTime": 12, "followUpTime": 12, "alpha": 0.05, "power": 0.8, "ratio": 1}"#,
                reference: "Lachin JM, Foulkes MA. Evaluation of sample size and power for analyses of survival with allowance for nonuniform patient entry, losses to follow-up, noncompliance, and stratification. Biometrics. 1986;42(3):507-519.",
                source_module: "calculations/survival.rs",
                source_function: "calculate_exponential_survival",
            },
            Calculator::Freedman => CalculatorMetadata {
                slug: "freedman",
                title: "Freedman Method",
                description: "Events and subjects needed for the log-rank test by Freedman's formula.",
                formula: "d = (Zα/2 + Zβ)² (1 + r × HR)² / (r (1 − HR)²)",
                category: Category::Survival,
                params: survival::FreedmanInput::FIELDS,
                example: r#"{"hr": 0.7, "alpha": 0.05, "power": 0.8, "ratio": 1, "eventRate": 0.3}"#,
                reference: "Freedman LS. Tables of the number of patients required in clinical trials using the logrank test. Stat Med. 1982;1(2):121-129.",
                source_module: "calculations/survival.rs",
                source_function: "calculate_freedman",
            },

            // =================================================================
            // Power
            // =================================================================
            Calculator::PowerTwoMeans => CalculatorMetadata {
                slug: "power-two-means",
                title: "Power: Two Means",
                description: "Achieved power of a two-group comparison of means with given group sizes.",
                formula: "Power = Φ(|Δ| / (σ√(1/n₁ + 1/n₂)) − Zα/2)",
                category: Category::Power,
                params: power::PowerTwoMeansInput::FIELDS,
                example: r#"{"mean1": 75, "mean2": 70, "sd": 15, "n1": 142, "n2": 142, "alpha": 0.05}"#,
                reference: "Cohen J. Statistical Power Analysis for the Behavioral Sciences. 2nd ed. Lawrence Erlbaum; 1988.",
                source_module: "calculations/power.rs",
                source_function: "calculate_power_two_means",
            },
            Calculator::PowerTwoProportions => CalculatorMetadata {
                slug: "power-two-proportions",
                title: "Power: Two Proportions",
                description: "Achieved power of a two-group comparison of proportions with given group sizes.",
                formula: "Power = Φ((|p₁ − p₂| − Zα/2 × SE₀) / SE₁)",
                category: Category::Power,
                params: power::PowerTwoProportionsInput::FIELDS,
                example: r#"{"p1": 0.6, "p2": 0.4, "n1": 97, "n2": 97, "alpha": 0.05}"#,
                reference: "Fleiss JL, Levin B, Paik MC. Statistical Methods for Rates and Proportions. 3rd ed. Wiley; 2003.",
                source_module: "calculations/power.rs",
                source_function: "calculate_power_two_proportions",
            },
            Calculator::MinimumDetectableEffect => CalculatorMetadata {
                slug: "minimum-detectable-effect",
                title: "Minimum Detectable Effect",
                description: "Smallest difference in means detectable with n per group.",
                formula: "MDE = (Zα/2 + Zβ) × σ × √(2/n)",
                category: Category::Power,
                params: power::MinimumDetectableEffectInput::FIELDS,
                example: r#"{"sd": 10, "n": 50, "alpha": 0.05, "power": 0.8}"#,
                reference: "Cohen J. Statistical Power Analysis for the Behavioral Sciences. 2nd ed. Lawrence Erlbaum; 1988.",
                source_module: "calculations/power.rs",
                source_function: "calculate_minimum_detectable_effect",
            },
            Calculator::Correlation => CalculatorMetadata {
                slug: "correlation",
                title: "Correlation",
                description: "Sample size to detect a correlation coefficient different from zero.",
                formula: "n = ((Zα/2 + Zβ) / C)² + 3,  C = ½ ln((1 + r)/(1 − r))",
                category: Category::Power,
                params: power::CorrelationInput::FIELDS,
                example: r#"{"r": 0.3, "alpha": 0.05, "power": 0.8}"#,
                reference: "Hulley SB, Cummings SR, Browner WS, et al. Designing Clinical Research. 4th ed. Lippincott Williams & Wilkins; 2013.",
                source_module: "calculations/power.rs",
                source_function: "calculate_correlation",
            },

            // =================================================================
            // Effect size
            // =================================================================
            Calculator::CohensD => CalculatorMetadata {
                slug: "cohens-d",
                title: "Cohen's d",
                description: "Standardized mean difference with Hedges' g and a 95% confidence interval.",
                formula: "d = (μ₁ − μ₂) / s_pooled;  g = d × (1 − 3/(4(n₁ + n₂) − 9))",
                category: Category::EffectSize,
                params: effect_size::CohensDInput::FIELDS,
                example: r#"{"mean1": 75, "mean2": 70, "sd1": 15, "sd2": 15, "n1": 50, "n2": 50}"#,
                reference: "Hedges LV, Olkin I. Statistical Methods for Meta-Analysis. Academic Press; 1985.",
                source_module: "calculations/effect_size.rs",
                source_function: "calculate_cohens_d",
            },
            Calculator::TwoByTwo => CalculatorMetadata {
                slug: "two-by-two",
                title: "2×2 Table Measures",
                description: "Odds ratio, risk ratio, risk difference and NNT with confidence intervals.",
                formula: "OR = ad / bc;  RR = (a/(a+b)) / (c/(c+d));  NNT = 1 / |RD|",
                category: Category::EffectSize,
                params: effect_size::TwoByTwoInput::FIELDS,
                example: r#"{"a": 20, "b": 80, "c": 10, "d": 90}"#,
                reference: "Altman DG. Confidence intervals for the number needed to treat. BMJ. 1998;317(7168):1309-1312.",
                source_module: "calculations/effect_size.rs",
                source_function: "calculate_two_by_two",
            },
            Calculator::EffectConversion => CalculatorMetadata {
                slug: "effect-conversion",
                title: "Effect Size Conversion",
                description: "Convert Cohen's d to r, odds ratio, η² and the common-language effect size.",
                formula: "r = d / √(d² + 4);  ln OR = dπ / √3;  CL = Φ(d / √2)",
                category: Category::EffectSize,
                params: effect_size::EffectConversionInput::FIELDS,
                example: r#"{"d": 0.5}"#,
                reference: "Borenstein M, Hedges LV, Higgins JPT, Rothstein HR. Introduction to Meta-Analysis. Wiley; 2009.",
                source_module: "calculations/effect_size.rs",
                source_function: "calculate_effect_conversion",
            },

            // =================================================================
            // Meta-analysis
            // =================================================================
            Calculator::DersimonianLaird => CalculatorMetadata {
                slug: "dersimonian-laird",
                title: "DerSimonian-Laird Pooling",
                description: "Fixed- and random-effects pooled estimates with heterogeneity statistics.",
                formula: "τ² = max(0, (Q − (k − 1)) / C);  w* = 1 / (v + τ²)",
                category: Category::MetaAnalysis,
                params: meta_analysis::DerSimonianLairdInput::FIELDS,
                example: r#"{"effects": [0.2, 0.5, 0.3, 0.8], "variances": [0.04, 0.05, 0.03, 0.06]}"#,
                reference: "DerSimonian R, Laird N. Meta-analysis in clinical trials. Control Clin Trials. 1986;7(3):177-188.",
                source_module: "calculations/meta_analysis.rs",
                source_function: "calculate_dersimonian_laird",
            },
            Calculator::MetaPower => CalculatorMetadata {
                slug: "meta-power",
                title: "Meta-Analysis Power",
                description: "Power of a random-effects meta-analysis of k studies.",
                formula: "Power = 1 − Φ(Zα/2 − λ) + Φ(−Zα/2 − λ),  λ = d / √((v + τ²)/k)",
                category: Category::MetaAnalysis,
                params: meta_analysis::MetaPowerInput::FIELDS,
                example: r#"{"effect": 0.3, "n1": 50, "n2": 50, "studies": 5, "i2": 50, "alpha": 0.05}"#,
                reference: "Hedges LV, Pigott TD. The power of statistical tests in meta-analysis. Psychol Methods. 2001;6(3):203-217.",
                source_module: "calculations/meta_analysis.rs",
                source_function: "calculate_meta_power",
            },
            Calculator::MetaStudiesNeeded => CalculatorMetadata {
                slug: "meta-studies-needed",
                title: "Studies Needed for Meta-Analysis",
                description: "Number of studies needed for a random-effects meta-analysis to reach target power.",
                formula: "k = (Zα/2 + Zβ)² (v + τ²) / d²",
                category: Category::MetaAnalysis,
                params: meta_analysis::MetaStudiesNeededInput::FIELDS,
                example: r#"{"effect": 0.3, "n1": 50, "n2": 50, "i2": 50, "alpha": 0.05, "power": 0.8}"#,
                reference: "Hedges LV, Pigott TD. The power of statistical tests in meta-analysis. Psychol Methods. 2001;6(3):203-217.",
                source_module: "calculations/meta_analysis.rs",
                source_function: "calculate_meta_studies_needed",
            },
            Calculator::FailSafeN => CalculatorMetadata {
                slug: "fail-safe-n",
                title: "Fail-Safe N",
                description: "Number of unpublished null studies needed to overturn a combined result.",
                formula: "N = (ΣZ)² / Zα² − k",
                category: Category::MetaAnalysis,
                params: meta_analysis::FailSafeNInput::FIELDS,
                example: r#"{"zScores": [2.1, 1.8, 2.5, 1.2, 2.9], "alpha": 0.05}"#,
                reference: "Rosenthal R. The file drawer problem and tolerance for null results. Psychol Bull. 1979;86(3):638-641.",
                source_module: "calculations/meta_analysis.rs",
                source_function: "calculate_fail_safe_n",
            },

            // =================================================================
            // Bayesian
            // =================================================================
            Calculator::BayesianProportion => CalculatorMetadata {
                slug: "bayesian-proportion",
                title: "Bayesian Proportion",
                description: "Additional subjects for a credible interval of given width around a proportion with a Beta prior.",
                formula: "n = p(1 − p) / (w / 2z)² − (a + b) − 1",
                category: Category::Bayesian,
                params: bayesian::BayesianProportionInput::FIELDS,
                example: r#"{"priorAlpha": 2, "priorBeta": 8, "width": 0.1, "credibleLevel": 0.95}"#,
                reference: "Joseph L, Wolfson DB, du Berger R. Sample size calculations for binomial proportions via highest posterior density intervals. The Statistician. 1995;44(2):143-154.",
                source_module: "calculations/bayesian.rs",
                source_function: "calculate_bayesian_proportion",
            },
            Calculator::BayesianMean => CalculatorMetadata {
                slug: "bayesian-mean",
                title: "Bayesian Mean",
                description: "Additional subjects for a credible interval of given width around a mean with a Normal prior.",
                formula: "n = σ² (1/s² − 1/τ₀²),  s = w / 2z",
                category: Category::Bayesian,
                params: bayesian::BayesianMeanInput::FIELDS,
                example: r#"{"priorSd": 10, "sd": 20, "width": 5, "credibleLevel": 0.95}"#,
                reference: "Spiegelhalter DJ, Abrams KR, Myles JP. Bayesian Approaches to Clinical Trials and Health-Care Evaluation. Wiley; 2004.",
                source_module: "calculations/bayesian.rs",
                source_function: "calculate_bayesian_mean",
            },
            Calculator::Assurance => CalculatorMetadata {
                slug: "assurance",
                title: "Assurance",
                description: "Probability of trial success averaged over a prior on the treatment effect.",
                formula: "Assurance = Φ((μ − Zα/2 × SE) / √(τ² + SE²)),  SE = σ√(2/n)",
                category: Category::Bayesian,
                params: bayesian::AssuranceInput::FIELDS,
                example: r#"{"priorMean": 5, "priorSd": 2, "sd": 15, "n": 142, "alpha": 0.05}"#,
                reference: "O'Hagan A, Stevens JW, Campbell MJ. Assurance in clinical trial design. Pharm Stat. 2005;4(3):187-201.",
                source_module: "calculations/bayesian.rs",
                source_function: "calculate_assurance",
            },
            Calculator::BetaBinomialUpdate => CalculatorMetadata {
                slug: "beta-binomial-update",
                title: "Beta-Binomial Update",
                description: "Posterior for a proportion after observed successes, with P(p > threshold).",
                formula: "Posterior = Beta(a + x, b + n − x)",
                category: Category::Bayesian,
                params: bayesian::BetaBinomialUpdateInput::FIELDS,
                example: r#"{"priorAlpha": 1, "priorBeta": 1, "successes": 12, "trials": 40, "threshold": 0.25, "credibleLevel": 0.95}"#,
                reference: "Spiegelhalter DJ, Abrams KR, Myles JP. Bayesian Approaches to Clinical Trials and Health-Care Evaluation. Wiley; 2004.",
                source_module: "calculations/bayesian.rs",
                source_function: "calculate_beta_binomial_update",
            },

            // =================================================================
            // Agreement
            // =================================================================
            Calculator::CohensKappa => CalculatorMetadata {
                slug: "cohens-kappa",
                title: "Cohen's Kappa",
                description: "Chance-corrected agreement between two raters with a confidence interval.",
                formula: "κ = (po − pe) / (1 − pe)",
                category: Category::Agreement,
                params: agreement::CohensKappaInput::FIELDS,
                example: r#"{"a": 40, "b": 10, "c": 8, "d": 42, "alpha": 0.05}"#,
                reference: "Fleiss JL, Cohen J, Everitt BS. Large sample standard errors of kappa and weighted kappa. Psychol Bull. 1969;72(5):323-327.",
                source_module: "calculations/agreement.rs",
                source_function: "calculate_cohens_kappa",
            },
            Calculator::IccSampleSize => CalculatorMetadata {
                slug: "icc-sample-size",
                title: "ICC Sample Size",
                description: "Subjects needed to show an intraclass correlation exceeds a minimally acceptable value.",
                formula: "n = 1 + 2(Zα + Zβ)² k / ((ln C₀)² (k − 1))",
                category: Category::Agreement,
                params: agreement::IccSampleSizeInput::FIELDS,
                example: r#"{"icc0": 0.6, "icc1": 0.8, "raters": 3, "alpha": 0.05, "power": 0.8}"#,
                reference: "Walter SD, Eliasziw M, Donner A. Sample size and optimal designs for reliability studies. Stat Med. 1998;17(1):101-110.",
                source_module: "calculations/agreement.rs",
                source_function: "calculate_icc_sample_size",
            },
            Calculator::BlandAltman => CalculatorMetadata {
                slug: "bland-altman",
                title: "Bland-Altman Agreement",
                description: "Subjects needed to estimate limits of agreement to a given precision.",
                formula: "n = 3 (z × s / δ)²,  s = width / (2 × 1.96)",
                category: Category::Agreement,
                params: agreement::BlandAltmanInput::FIELDS,
                example: r#"{"loaWidth": 20, "precision": 2, "alpha": 0.05}"#,
                reference: "Bland JM, Altman DG. Measuring agreement in method comparison studies. Stat Methods Med Res. 1999;8(2):135-160.",
                source_module: "calculations/agreement.rs",
                source_function: "calculate_bland_altman",
            },
        }
    }
}

impl fmt::Display for Calculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Calculator {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Calculator::from_slug(s)
    }
}

/// Look up `slug` and run it on `params`.
pub fn run(slug: &str, params: &Params) -> CalcResult<CalculationResult> {
    Calculator::from_slug(slug)?.run(params)
}

// ============================================================================
// Markdown Generation
// ============================================================================

/// Generate the calculator reference as markdown.
///
/// Used by the `gen-calculators` binary to write `CALCULATORS.md`.
///
/// ```rust
/// let markdown = biostat_core::registry::generate_calculators_markdown();
/// assert!(markdown.contains("## Survival"));
/// ```
pub fn generate_calculators_markdown() -> String {
    let mut output = String::with_capacity(48_000);

    output.push_str(
        r#"# Biostat Calculator Reference

> **Auto-generated from source code. Do not edit manually.**
>
> Regenerate with: `cargo run --bin gen-calculators`

Every calculator in the engine with its parameters, formula, and literature
reference. Parameters are passed as a flat object; percentages (`dropout`,
`nonResponseRate`, `i2`) are given in percent, e.g. `10` or `"10%"`.

## Conventions

| Quantity | Convention |
|----------|-----------|
| Sample sizes | Rounded up to the next integer |
| α | Two-sided unless the design states otherwise |
| ratio (k) | n₂ / n₁ |
| Statistics | Rounded to fixed decimals for display |

---

"#,
    );

    for category in Category::all() {
        let calculators = Calculator::in_category(*category);
        if calculators.is_empty() {
            continue;
        }

        output.push_str(&format!("## {}\n\n", category.display_name()));

        for calculator in calculators {
            let meta = calculator.metadata();

            output.push_str(&format!("### {}\n\n", meta.title));
            output.push_str(&format!("{}\n\n", meta.description));
            output.push_str(&format!("**Slug:** `{}`\n\n", meta.slug));
            output.push_str(&format!("**Formula:** `{}`\n\n", meta.formula));

            output.push_str("**Parameters:** ");
            let params: Vec<String> = meta.params.iter().map(|p| format!("`{}`", p)).collect();
            output.push_str(&params.join(", "));
            output.push_str("\n\n");

            output.push_str(&format!("**Example:** `{}`\n\n", meta.example));
            output.push_str(&format!("**Reference:** {}\n\n", meta.reference));
            output.push_str(&format!(
                "**Source:** [`{}`]({})\n\n",
                meta.source_function, meta.source_module
            ));
            output.push_str("---\n\n");
        }
    }

    output.push_str(&format!(
        "## Statistics\n\n- **Total Calculators:** {}\n- **Categories:** {}\n",
        ALL_CALCULATORS.len(),
        Category::all().len()
    ));

    output
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_calculators_have_metadata() {
        assert_eq!(ALL_CALCULATORS.len(), 42);

        for calculator in ALL_CALCULATORS {
            let meta = calculator.metadata();
            assert!(!meta.title.is_empty(), "{:?} has no title", calculator);
            assert!(!meta.formula.is_empty(), "{:?} has no formula", calculator);
            assert!(!meta.params.is_empty(), "{:?} has no parameters", calculator);
            assert!(!meta.reference.is_empty(), "{:?} has no reference", calculator);
            assert!(meta.source_module.starts_with("calculations/"));
        }
    }

    #[test]
    fn test_slugs_are_unique_and_match_serde() {
        let mut seen = HashSet::new();
        for calculator in ALL_CALCULATORS {
            let slug = calculator.slug();
            assert!(seen.insert(slug), "duplicate slug {}", slug);
            assert_eq!(
                serde_json::to_value(calculator).unwrap(),
                serde_json::Value::String(slug.to_string())
            );
            assert_eq!(Calculator::from_slug(slug).unwrap(), *calculator);
        }
    }

    #[test]
    fn test_every_category_is_populated() {
        for category in Category::all() {
            assert!(!Calculator::in_category(*category).is_empty(), "{:?} is empty", category);
        }
    }

    #[test]
    fn test_every_example_runs() {
        for calculator in ALL_CALCULATORS {
            let meta = calculator.metadata();
            let params = Params::from_json_str(meta.example).unwrap();
            for field in meta.params {
                assert!(params.raw(field).is_some(), "{} example lacks {}", meta.slug, field);
            }
            let result = calculator.run(&params);
            assert!(result.is_ok(), "{} example failed: {:?}", meta.slug, result.err());
            assert!(result.unwrap().headline().is_some());
        }
    }

    #[test]
    fn test_from_slug_is_lenient_about_case_and_underscores() {
        assert_eq!(Calculator::from_slug("Two_Sample_T").unwrap(), Calculator::TwoSampleT);
        assert_eq!("cohens-kappa".parse::<Calculator>().unwrap(), Calculator::CohensKappa);
        assert_eq!(Calculator::BlandAltman.to_string(), "bland-altman");
    }

    #[test]
    fn test_unknown_slug() {
        let err = run("sample-size-oracle", &Params::new()).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_CALCULATOR");
    }

    #[test]
    fn test_run_from_strings() {
        let params = Params::from_assignments([
            "mean1=75",
            "mean2=70",
            "sd1=15",
            "sd2=15",
            "alpha=0.05",
            "power=0.8",
            "ratio=1",
        ])
        .unwrap();
        let result = run("two-sample-t", &params).unwrap();
        assert_eq!(result.result("Total sample size").unwrap().as_count(), Some(284));
    }

    #[test]
    fn test_run_reports_missing_field() {
        let params = Params::new().with("p10", 0.2).with("alpha", 0.05).with("power", 0.8);
        let err = run("matched-pairs", &params).unwrap_err();
        assert_eq!(err.field(), Some("p01"));
    }

    #[test]
    fn test_generate_calculators_markdown() {
        let markdown = generate_calculators_markdown();

        assert!(markdown.contains("# Biostat Calculator Reference"));
        assert!(markdown.contains("Auto-generated from source code"));
        for category in Category::all() {
            assert!(markdown.contains(&format!("## {}", category.display_name())));
        }
        assert!(markdown.contains("### Log-Rank Test"));
        assert!(markdown.contains("`dersimonian-laird`"));
        assert!(markdown.contains("**Total Calculators:** 42"));
        assert!(markdown.contains("**Categories:** 12"));
    }
}
