//! # biostat_core - Sample-Size, Power and Effect-Size Engine
//!
//! `biostat_core` is the computational heart of Biostat, providing medical and
//! biostatistical design calculations with a clean, explainable API. Every
//! calculator returns the same [`CalculationResult`]: inputs, formula, a
//! substituted step trace, results, interpretation, recommendations and a
//! literature reference. All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure, synchronous functions that take input and return results
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, never `NaN` or `Infinity` results
//! - **Explainable**: Each result reproduces every intermediate quantity
//!
//! ## Quick Start
//!
//! ```rust
//! use biostat_core::calculations::t_test::{calculate_two_sample_t, TwoSampleTInput};
//!
//! let input = TwoSampleTInput {
//!     mean1: 75.0,
//!     mean2: 70.0,
//!     sd1: 15.0,
//!     sd2: 15.0,
//!     alpha: 0.05,
//!     power: 0.8,
//!     ratio: 1.0,
//! };
//!
//! let result = calculate_two_sample_t(&input).unwrap();
//! assert_eq!(result.result("Total sample size").unwrap().as_count(), Some(284));
//!
//! // Serialize to JSON for display or export
//! let json = serde_json::to_string_pretty(&result).unwrap();
//! assert!(json.contains("\"studyType\""));
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - All calculators, grouped by study design
//! - [`registry`] - Calculator lookup by slug, metadata, dispatch from raw parameters
//! - [`params`] - Parameter boundary: raw values to typed inputs
//! - [`result`] - The result contract and its builder
//! - [`distributions`] - Normal, gamma and beta primitives
//! - [`validation`] - Shared domain preconditions
//! - [`format`] - Fixed-decimal display and ceiling rounding
//! - [`units`] - Percent and proportion wrappers
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod distributions;
pub mod errors;
pub mod format;
pub mod params;
pub mod registry;
pub mod result;
pub mod units;
pub mod validation;

// Re-export commonly used types at crate root for convenience
pub use errors::{CalcError, CalcResult};
pub use params::{FromParams, Params};
pub use registry::{Calculator, CalculatorMetadata, Category, ALL_CALCULATORS};
pub use result::{CalculationResult, ResultBuilder, ResultValue};
pub use units::{Percent, Proportion};
