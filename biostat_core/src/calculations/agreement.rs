//! # Agreement and Reliability
//!
//! - [`calculate_cohens_kappa`] - chance-corrected agreement for two raters
//! - [`calculate_icc_sample_size`] - subjects for an intraclass correlation test
//! - [`calculate_bland_altman`] - subjects for precise limits of agreement

use serde::{Deserialize, Serialize};

use crate::distributions::{normal_cdf, z_alpha, Tails};
use crate::errors::{CalcError, CalcResult};
use crate::format::{ceil_count, fixed, percent, trim, STAT_PLACES, Z_PLACES};
use crate::params::{FromParams, Params};
use crate::result::{CalculationResult, ResultBuilder};
use crate::validation;

use super::common::DesignZ;

const STUDY_TYPE: &str = "Agreement / Reliability";

/// Quantile used when converting limits of agreement back to an SD
const LOA_Z: f64 = 1.96;

/// Landis and Koch (1977) benchmarks
pub fn landis_koch(kappa: f64) -> &'static str {
    if kappa < 0.0 {
        "poor"
    } else if kappa <= 0.20 {
        "slight"
    } else if kappa <= 0.40 {
        "fair"
    } else if kappa <= 0.60 {
        "moderate"
    } else if kappa <= 0.80 {
        "substantial"
    } else {
        "almost perfect"
    }
}

// ============================================================================
// Cohen's kappa
// ============================================================================

/// Two raters classifying the same subjects as positive/negative.
///
/// ```text
///                 Rater 2 +   Rater 2 −
///   Rater 1 +        a           b
///   Rater 1 −        c           d
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohensKappaInput {
    pub a: u64,
    pub b: u64,
    pub c: u64,
    pub d: u64,
    pub alpha: f64,
}

impl CohensKappaInput {
    /// Number of rated subjects, `None` if the cell counts overflow
    fn total(&self) -> Option<u64> {
        [self.b, self.c, self.d]
            .iter()
            .try_fold(self.a, |sum, &cell| sum.checked_add(cell))
    }

    pub fn validate(&self) -> CalcResult<()> {
        let n = self.total().ok_or_else(|| {
            CalcError::validation("a", self.a.to_string(), "cell counts are too large to sum")
        })?;
        validation::require(n > 0, "a", n as f64, "table must contain at least one subject")?;
        validation::alpha(self.alpha)
    }
}

impl FromParams for CohensKappaInput {
    const FIELDS: &'static [&'static str] = &["a", "b", "c", "d", "alpha"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(CohensKappaInput {
            a: params.count("a")?,
            b: params.count("b")?,
            c: params.count("c")?,
            d: params.count("d")?,
            alpha: params.number("alpha")?,
        })
    }
}

/// Kappa with the Fleiss, Cohen and Everitt (1969) large-sample SE and
/// a z-test of κ = 0 using the SE under the null.
pub fn calculate_cohens_kappa(input: &CohensKappaInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let CohensKappaInput { a, b, c, d, alpha } = *input;
    let n = a as f64 + b as f64 + c as f64 + d as f64;
    let cells = [[a as f64 / n, b as f64 / n], [c as f64 / n, d as f64 / n]];
    let rows = [cells[0][0] + cells[0][1], cells[1][0] + cells[1][1]];
    let cols = [cells[0][0] + cells[1][0], cells[0][1] + cells[1][1]];

    let po = cells[0][0] + cells[1][1];
    let pe = rows[0] * cols[0] + rows[1] * cols[1];
    validation::require(
        pe < 1.0,
        "a",
        pe,
        "both raters use a single category; kappa is undefined",
    )?;
    let kappa = (po - pe) / (1.0 - pe);

    let diagonal: f64 = (0..2)
        .map(|i| cells[i][i] * ((1.0 - pe) - (rows[i] + cols[i]) * (1.0 - po)).powi(2))
        .sum();
    let off_diagonal = (1.0 - po).powi(2)
        * (cells[0][1] * (cols[0] + rows[1]).powi(2) + cells[1][0] * (cols[1] + rows[0]).powi(2));
    let correction = (po * pe - 2.0 * pe + po).powi(2);
    let se = ((diagonal + off_diagonal - correction).max(0.0) / (n * (1.0 - pe).powi(4))).sqrt();

    let null_sum: f64 = (0..2).map(|i| rows[i] * cols[i] * (rows[i] + cols[i])).sum();
    let se0 = ((pe + pe.powi(2) - null_sum).max(0.0) / (n * (1.0 - pe).powi(2))).sqrt();
    validation::require(
        se0 > 0.0,
        "a",
        se0,
        "one rater uses a single category; kappa cannot be tested against 0",
    )?;

    let z_crit = z_alpha(alpha, Tails::Two);
    let lower = kappa - z_crit * se;
    let upper = kappa + z_crit * se;
    let z = kappa / se0;
    let p_value = 2.0 * (1.0 - normal_cdf(z.abs()));
    let label = landis_koch(kappa);
    let confidence = percent(1.0 - alpha, 0);

    Ok(ResultBuilder::new(STUDY_TYPE, "Cohen's kappa (two raters)")
        .input("Both positive (a)", a.to_string())
        .input("Rater 1 +, Rater 2 − (b)", b.to_string())
        .input("Rater 1 −, Rater 2 + (c)", c.to_string())
        .input("Both negative (d)", d.to_string())
        .input("Significance level (α)", trim(alpha))
        .formula(
            "κ = (po − pe) / (1 − pe)",
            "po = observed agreement, pe = agreement expected by chance from the marginal totals",
        )
        .step("Observed agreement", format!("po = ({} + {}) / {} = {}", a, d, n, fixed(po, Z_PLACES)))
        .step(
            "Chance agreement",
            format!(
                "pe = {} × {} + {} × {} = {}",
                fixed(rows[0], Z_PLACES),
                fixed(cols[0], Z_PLACES),
                fixed(rows[1], Z_PLACES),
                fixed(cols[1], Z_PLACES),
                fixed(pe, Z_PLACES)
            ),
        )
        .step(
            "Kappa",
            format!("κ = ({} − {}) / (1 − {}) = {}", fixed(po, Z_PLACES), fixed(pe, Z_PLACES), fixed(pe, Z_PLACES), fixed(kappa, Z_PLACES)),
        )
        .step("Standard error", format!("SE(κ) = {}", fixed(se, Z_PLACES)))
        .step(
            "Confidence interval",
            format!("{} ± {} × {} = ({}, {})", fixed(kappa, Z_PLACES), fixed(z_crit, Z_PLACES), fixed(se, Z_PLACES), fixed(lower, Z_PLACES), fixed(upper, Z_PLACES)),
        )
        .step(
            "Test of κ = 0",
            format!("z = {} / {} = {}", fixed(kappa, Z_PLACES), fixed(se0, Z_PLACES), fixed(z, STAT_PLACES)),
        )
        .number("Cohen's kappa (κ)", kappa, Z_PLACES)
        .number("Observed agreement", po, Z_PLACES)
        .number("Expected agreement", pe, Z_PLACES)
        .number("Standard error", se, Z_PLACES)
        .number("CI lower", lower, Z_PLACES)
        .number("CI upper", upper, Z_PLACES)
        .number("z", z, STAT_PLACES)
        .number("p-value", p_value, Z_PLACES)
        .text("Strength of agreement", label)
        .interpretation(format!(
            "Observed agreement was {} against {} expected by chance, giving κ = {} ({} CI {} to {}), \
             which indicates {} agreement.",
            percent(po, 1),
            percent(pe, 1),
            fixed(kappa, STAT_PLACES),
            confidence,
            fixed(lower, STAT_PLACES),
            fixed(upper, STAT_PLACES),
            label
        ))
        .recommend_if(
            (rows[0] - 0.5).abs() > 0.4 || (cols[0] - 0.5).abs() > 0.4,
            "Marginal totals are highly unbalanced; kappa is depressed by low prevalence, so also report \
             positive and negative agreement.",
        )
        .recommend_if(n < 50.0, "Fewer than 50 subjects: the large-sample standard error is approximate.")
        .reference("Fleiss JL, Cohen J, Everitt BS. Large sample standard errors of kappa and weighted kappa. Psychol Bull. 1969;72(5):323-327.")
        .build())
}

// ============================================================================
// ICC sample size
// ============================================================================

/// Subjects needed to show the ICC exceeds a minimally acceptable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IccSampleSizeInput {
    /// Null (minimally acceptable) reliability
    pub icc0: f64,
    /// Expected reliability
    pub icc1: f64,
    /// Ratings per subject
    pub raters: u64,
    pub alpha: f64,
    pub power: f64,
}

impl IccSampleSizeInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::within("icc0", self.icc0, 0.0, 1.0)?;
        validation::within("icc1", self.icc1, 0.0, 1.0)?;
        validation::require(self.icc1 > self.icc0, "icc1", self.icc1, "must exceed icc0")?;
        validation::require(self.raters >= 2, "raters", self.raters as f64, "must be at least 2")?;
        validation::alpha(self.alpha)?;
        validation::power(self.power)
    }
}

impl FromParams for IccSampleSizeInput {
    const FIELDS: &'static [&'static str] = &["icc0", "icc1", "raters", "alpha", "power"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(IccSampleSizeInput {
            icc0: params.number("icc0")?,
            icc1: params.number("icc1")?,
            raters: params.count("raters")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
        })
    }
}

/// Walter, Eliasziw and Donner (1998), one-sided test:
///
/// ```text
/// C0 = (1 + kρ0/(1 − ρ0)) / (1 + kρ1/(1 − ρ1))
/// n  = 1 + 2(Zα + Zβ)²·k / ((ln C0)²·(k − 1))
/// ```
pub fn calculate_icc_sample_size(input: &IccSampleSizeInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let IccSampleSizeInput { icc0, icc1, raters, alpha, power } = *input;
    let z = DesignZ::new(alpha, power, Tails::One);
    let k = raters as f64;
    let c0 = (1.0 + k * icc0 / (1.0 - icc0)) / (1.0 + k * icc1 / (1.0 - icc1));
    let n_raw = 1.0 + 2.0 * z.sum().powi(2) * k / (c0.ln().powi(2) * (k - 1.0));
    let n = ceil_count(n_raw);
    let ratings = n * raters;

    let builder = ResultBuilder::new(STUDY_TYPE, "Intraclass correlation (Walter–Eliasziw–Donner)")
        .input("Null ICC (ρ₀)", trim(icc0))
        .input("Expected ICC (ρ₁)", trim(icc1))
        .input("Raters per subject (k)", raters.to_string())
        .input("Significance level (α)", trim(alpha))
        .input("Power (1−β)", percent(power, 0))
        .formula(
            "n = 1 + 2(Zα + Zβ)² k / ((ln C₀)² (k − 1))",
            "C₀ = (1 + kρ₀/(1 − ρ₀)) / (1 + kρ₁/(1 − ρ₁)), k = ratings per subject",
        );

    Ok(z.steps(builder)
        .step(
            "C₀",
            format!(
                "(1 + {} × {} / {}) / (1 + {} × {} / {}) = {}",
                raters,
                trim(icc0),
                trim(1.0 - icc0),
                raters,
                trim(icc1),
                trim(1.0 - icc1),
                fixed(c0, Z_PLACES)
            ),
        )
        .step(
            "Subjects",
            format!(
                "n = 1 + 2 × {}² × {} / ({}² × {}) = {} → {}",
                fixed(z.sum(), Z_PLACES),
                raters,
                fixed(c0.ln(), Z_PLACES),
                raters - 1,
                fixed(n_raw, 2),
                n
            ),
        )
        .count("Required subjects", n)
        .count("Total ratings", ratings)
        .number("C₀", c0, Z_PLACES)
        .interpretation(format!(
            "{} subjects, each rated {} times ({} ratings), give {} power to show the ICC exceeds {} \
             when it is truly {} (one-sided α = {}).",
            n,
            raters,
            ratings,
            percent(power, 0),
            trim(icc0),
            trim(icc1),
            trim(alpha)
        ))
        .recommend("Adding raters per subject reduces the number of subjects, with diminishing returns beyond 3-4.")
        .reference("Walter SD, Eliasziw M, Donner A. Sample size and optimal designs for reliability studies. Stat Med. 1998;17(1):101-110.")
        .build())
}

// ============================================================================
// Bland-Altman
// ============================================================================

/// Subjects needed to estimate a limit of agreement to a given precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlandAltmanInput {
    /// Expected distance between the upper and lower limits of agreement
    pub loa_width: f64,
    /// Desired CI half-width for each limit
    pub precision: f64,
    pub alpha: f64,
}

impl BlandAltmanInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::positive("loaWidth", self.loa_width)?;
        validation::positive("precision", self.precision)?;
        validation::alpha(self.alpha)
    }
}

impl FromParams for BlandAltmanInput {
    const FIELDS: &'static [&'static str] = &["loaWidth", "precision", "alpha"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(BlandAltmanInput {
            loa_width: params.number("loaWidth")?,
            precision: params.number("precision")?,
            alpha: params.number("alpha")?,
        })
    }
}

/// `Var(LoA) ≈ 3s²/n`, so `n = 3(z·s/δ)²`
pub fn calculate_bland_altman(input: &BlandAltmanInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let BlandAltmanInput { loa_width, precision, alpha } = *input;
    let z = z_alpha(alpha, Tails::Two);
    let s = loa_width / (2.0 * LOA_Z);
    let n_raw = 3.0 * (z * s / precision).powi(2);
    let n = ceil_count(n_raw);

    Ok(ResultBuilder::new(STUDY_TYPE, "Bland–Altman limits of agreement")
        .input("Width of limits of agreement", trim(loa_width))
        .input("Precision of each limit (δ)", trim(precision))
        .input("Significance level (α)", trim(alpha))
        .formula(
            "n = 3 (z × s / δ)²,  s = width / (2 × 1.96)",
            "s = SD of the differences, δ = CI half-width for a limit of agreement",
        )
        .step("SD of differences", format!("s = {} / (2 × 1.96) = {}", trim(loa_width), fixed(s, Z_PLACES)))
        .step("Z-score", format!("z = {}", fixed(z, Z_PLACES)))
        .step(
            "Subjects",
            format!("n = 3 × ({} × {} / {})² = {} → {}", fixed(z, Z_PLACES), fixed(s, Z_PLACES), trim(precision), fixed(n_raw, 2), n),
        )
        .count("Required sample size", n)
        .number("SD of differences", s, Z_PLACES)
        .interpretation(format!(
            "{} subjects measured by both methods estimate each limit of agreement to within ±{} \
             ({} confidence), given differences with SD {}.",
            n,
            trim(precision),
            percent(1.0 - alpha, 0),
            fixed(s, STAT_PLACES)
        ))
        .recommend_if(n < 100, "Bland and Altman suggest at least 100 subjects for stable limits.")
        .reference("Bland JM, Altman DG. Measuring agreement in method comparison studies. Stat Methods Med Res. 1999;8(2):135-160.")
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
    fn test_cohens_kappa() {
        let input = CohensKappaInput { a: 40, b: 10, c: 8, d: 42, alpha: 0.05 };
        let result = calculate_cohens_kappa(&input).unwrap();

        assert_abs_diff_eq!(value(&result, "Cohen's kappa (κ)"), 0.64, epsilon = 1e-9);
        assert_abs_diff_eq!(value(&result, "Observed agreement"), 0.82, epsilon = 1e-9);
        assert_abs_diff_eq!(value(&result, "Expected agreement"), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(value(&result, "Standard error"), 0.0768, epsilon = 1e-4);
        assert!(value(&result, "CI lower") > 0.0);
        assert_abs_diff_eq!(value(&result, "CI upper"), 0.7905, epsilon = 1e-3);
        assert_abs_diff_eq!(value(&result, "z"), 6.405, epsilon = 1e-2);
        assert_eq!(
            result.result("Strength of agreement").unwrap().as_text(),
            Some("substantial")
        );
    }

    #[test]
    fn test_landis_koch_bands() {
        assert_eq!(landis_koch(-0.1), "poor");
        assert_eq!(landis_koch(0.1), "slight");
        assert_eq!(landis_koch(0.3), "fair");
        assert_eq!(landis_koch(0.5), "moderate");
        assert_eq!(landis_koch(0.9), "almost perfect");
    }

    #[test]
    fn test_kappa_single_category_is_rejected() {
        let input = CohensKappaInput { a: 30, b: 0, c: 0, d: 0, alpha: 0.05 };
        assert!(calculate_cohens_kappa(&input).is_err());

        let empty = CohensKappaInput { a: 0, b: 0, c: 0, d: 0, alpha: 0.05 };
        assert_eq!(calculate_cohens_kappa(&empty).unwrap_err().field(), Some("a"));
    }

    #[test]
    fn test_kappa_one_rater_single_category_is_rejected() {
        // rater 2 splits 30/10 but rater 1 always says positive: pe = 0.75, null SE = 0
        let input = CohensKappaInput { a: 30, b: 10, c: 0, d: 0, alpha: 0.05 };
        let err = calculate_cohens_kappa(&input).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(err.field(), Some("a"));
    }

    #[test]
    fn test_kappa_overflowing_counts_are_rejected() {
        let input = CohensKappaInput { a: u64::MAX, b: 1, c: 0, d: 0, alpha: 0.05 };
        let err = calculate_cohens_kappa(&input).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(err.field(), Some("a"));
    }

    #[test]
    fn test_icc_sample_size() {
        let input = IccSampleSizeInput {
            icc0: 0.6,
            icc1: 0.8,
            raters: 3,
            alpha: 0.05,
            power: 0.8,
        };
        let result = calculate_icc_sample_size(&input).unwrap();
        // 1 + 2 × 2.4865² × 3 / (ln 0.4231² × 2) = 26.07
        assert_eq!(result.headline().unwrap().1.as_count(), Some(27));
        assert_eq!(result.result("Total ratings").unwrap().as_count(), Some(81));
    }

    #[test]
    fn test_icc_requires_improvement() {
        let input = IccSampleSizeInput {
            icc0: 0.8,
            icc1: 0.6,
            raters: 3,
            alpha: 0.05,
            power: 0.8,
        };
        assert_eq!(calculate_icc_sample_size(&input).unwrap_err().field(), Some("icc1"));
    }

    #[test]
    fn test_bland_altman() {
        let input = BlandAltmanInput { loa_width: 20.0, precision: 2.0, alpha: 0.05 };
        let result = calculate_bland_altman(&input).unwrap();
        // s = 5.102, 3 × (1.96 × 5.102 / 2)² = 75.0
        assert_eq!(result.headline().unwrap().1.as_count(), Some(75));

        let tighter = BlandAltmanInput { precision: 1.0, ..input };
        let result = calculate_bland_altman(&tighter).unwrap();
        assert_eq!(result.headline().unwrap().1.as_count(), Some(300));
    }
}
