//! # Biostatistics Calculations
//!
//! This module contains every calculator in the engine. Each calculation
//! follows the pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable, camelCase keys)
//! - `*Input::validate()` - Domain preconditions, checked before any arithmetic
//! - `calculate_*(&input) -> CalcResult<CalculationResult>` - Pure calculation function
//!
//! Inputs also implement [`FromParams`](crate::params::FromParams) so they can
//! be built from a flat `key=value` parameter set; see [`crate::registry`].
//!
//! ## Available Calculations
//!
//! - [`descriptive`] - Prevalence, mean estimation, finite population correction
//! - [`t_test`] - Two-sample, paired and one-sample comparisons of means
//! - [`comparative`] - Case-control, cohort, cross-sectional, matched pairs
//! - [`diagnostic`] - Sensitivity/specificity, ROC AUC, predictive values
//! - [`clinical`] - Superiority, non-inferiority and equivalence trials
//! - [`cluster`] - Cluster randomized trials and design effects
//! - [`survival`] - Log-rank, Cox regression, exponential survival, Freedman
//! - [`power`] - Achieved power, minimum detectable effect, correlation
//! - [`effect_size`] - Cohen's d, 2×2 table measures, effect conversion
//! - [`meta_analysis`] - DerSimonian-Laird pooling, meta-analytic power, fail-safe N
//! - [`bayesian`] - Conjugate-prior sample sizes, assurance, posterior updates
//! - [`agreement`] - Cohen's kappa, ICC sample size, Bland-Altman
//!
//! Shared kernels (Z-scores for a design, the two-proportion term, dropout
//! inflation) live in [`common`] so no calculator module imports another.

pub mod common;

pub mod agreement;
pub mod bayesian;
pub mod clinical;
pub mod cluster;
pub mod comparative;
pub mod descriptive;
pub mod diagnostic;
pub mod effect_size;
pub mod meta_analysis;
pub mod power;
pub mod survival;
pub mod t_test;
