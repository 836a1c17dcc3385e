//! # Distribution Primitives
//!
//! The numerical special functions every formula module is built on. All of
//! them are closed-form rational or series approximations; none iterate.
//!
//! | Function | Method | Accuracy |
//! |----------|--------|----------|
//! | [`inverse_normal_cdf`] | Acklam rational approximation, 3 regimes | ~1.15e-9 |
//! | [`normal_cdf`] | Abramowitz & Stegun 7.1.26 erf | ~7.5e-8 |
//! | [`log_gamma`] | Lanczos series (6 coefficients) | ~2e-10 |
//!
//! ## Boundary Policy
//!
//! The CDF pair is total: `inverse_normal_cdf` saturates to `±∞` outside
//! `(0, 1)` and `normal_cdf` saturates to 0/1 at `∓∞`. Neither returns an
//! error. Callers validate their probabilities before asking for quantiles.
//!
//! The quantile is NOT refined with a Newton step against [`normal_cdf`];
//! formulas consume the base approximation as-is.
//!
//! ## Example
//!
//! ```rust
//! use biostat_core::distributions::{inverse_normal_cdf, normal_cdf, z_alpha, Tails};
//!
//! let z = inverse_normal_cdf(0.975);
//! assert!((z - 1.959964).abs() < 1e-6);
//! assert!((normal_cdf(z) - 0.975).abs() < 1e-6);
//! assert!((z_alpha(0.05, Tails::Two) - z).abs() < 1e-12);
//! ```

use std::f64::consts::{PI, SQRT_2};

use serde::{Deserialize, Serialize};

// =============================================================================
// STANDARD NORMAL QUANTILE
// =============================================================================

/// Acklam central-region numerator coefficients
const ACKLAM_A: [f64; 6] = [
    -3.969_683_028_665_376e1,
    2.209_460_984_245_205e2,
    -2.759_285_104_469_687e2,
    1.383_577_518_672_69e2,
    -3.066_479_806_614_716e1,
    2.506_628_277_459_239,
];

/// Acklam central-region denominator coefficients
const ACKLAM_B: [f64; 5] = [
    -5.447_609_879_822_406e1,
    1.615_858_368_580_409e2,
    -1.556_989_798_598_866e2,
    6.680_131_188_771_972e1,
    -1.328_068_155_288_572e1,
];

/// Acklam tail numerator coefficients (shared by both tails)
const ACKLAM_C: [f64; 6] = [
    -7.784_894_002_430_293e-3,
    -3.223_964_580_411_365e-1,
    -2.400_758_277_161_838,
    -2.549_732_539_343_734,
    4.374_664_141_464_968,
    2.938_163_982_698_783,
];

/// Acklam tail denominator coefficients (shared by both tails)
const ACKLAM_D: [f64; 4] = [
    7.784_695_709_041_462e-3,
    3.224_671_290_700_398e-1,
    2.445_134_137_142_996,
    3.754_408_661_907_416,
];

/// Break-point between the tail and central regimes
const P_LOW: f64 = 0.02425;

/// Standard normal quantile function Φ⁻¹(p).
///
/// # Contract
/// - `p ≤ 0` → `-∞`, `p ≥ 1` → `+∞`
/// - `p = 0.5` → exactly `0.0`
/// - NaN propagates
///
/// # Method
/// Acklam's rational approximation: the central region `[0.02425, 0.97575]`
/// uses a 6/5-coefficient rational function in `r = (p-0.5)²`; each tail
/// uses a 6/4-coefficient rational function in `q = √(-2 ln p)`, with the
/// upper tail obtained by reflection.
#[inline]
pub fn inverse_normal_cdf(p: f64) -> f64 {
    if p.is_nan() {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    if p == 0.5 {
        return 0.0;
    }

    if p < P_LOW {
        tail_quantile(p)
    } else if p > 1.0 - P_LOW {
        -tail_quantile(1.0 - p)
    } else {
        let q = p - 0.5;
        let r = q * q;
        let (a, b) = (&ACKLAM_A, &ACKLAM_B);
        (((((a[0] * r + a[1]) * r + a[2]) * r + a[3]) * r + a[4]) * r + a[5]) * q
            / (((((b[0] * r + b[1]) * r + b[2]) * r + b[3]) * r + b[4]) * r + 1.0)
    }
}

/// Lower-tail rational approximation, valid for `0 < p < P_LOW`
#[inline]
fn tail_quantile(p: f64) -> f64 {
    let q = (-2.0 * p.ln()).sqrt();
    let (c, d) = (&ACKLAM_C, &ACKLAM_D);
    (((((c[0] * q + c[1]) * q + c[2]) * q + c[3]) * q + c[4]) * q + c[5])
        / ((((d[0] * q + d[1]) * q + d[2]) * q + d[3]) * q + 1.0)
}

// =============================================================================
// STANDARD NORMAL CDF
// =============================================================================

/// Error function via Abramowitz & Stegun 7.1.26 (max error ~1.5e-7).
///
/// ```text
/// erf(z) ≈ 1 - (a1·t + a2·t² + a3·t³ + a4·t⁴ + a5·t⁵)·e^(-z²),  t = 1/(1 + 0.3275911·z)
/// ```
#[inline]
pub fn erf(z: f64) -> f64 {
    let sign = if z < 0.0 { -1.0 } else { 1.0 };
    let z = z.abs();
    let t = 1.0 / (1.0 + 0.327_591_1 * z);
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    sign * (1.0 - poly * (-z * z).exp())
}

/// Standard normal cumulative distribution Φ(x) = ½·(1 + erf(x/√2)).
///
/// Returns a value in `[0, 1]`; `normal_cdf(0.0)` is exactly `0.5`.
#[inline]
pub fn normal_cdf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x == 0.0 {
        return 0.5;
    }
    if x == f64::INFINITY {
        return 1.0;
    }
    if x == f64::NEG_INFINITY {
        return 0.0;
    }
    (0.5 * (1.0 + erf(x / SQRT_2))).clamp(0.0, 1.0)
}

/// Standard normal density φ(x)
#[inline]
pub fn normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

// =============================================================================
// GAMMA / BETA
// =============================================================================

/// Lanczos series coefficients (g = 5, n = 6)
const LANCZOS: [f64; 6] = [
    76.180_091_729_471_46,
    -86.505_320_329_416_77,
    24.014_098_240_830_91,
    -1.231_739_572_450_155,
    0.120_865_097_386_617_9e-2,
    -0.539_523_938_495_3e-5,
];

/// Natural log of the gamma function, `ln Γ(x)` for `x > 0`.
///
/// # Formula
/// ```text
/// ln Γ(x) = ln(√(2π)·S/x) - (x + 5.5) + (x + 0.5)·ln(x + 5.5)
/// S = 1.000000000190015 + Σ cⱼ/(x + j + 1)
/// ```
#[inline]
pub fn log_gamma(x: f64) -> f64 {
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut y = x;
    let mut ser = 1.000_000_000_190_015;
    for c in LANCZOS {
        y += 1.0;
        ser += c / y;
    }
    -tmp + (2.506_628_274_631_000_5 * ser / x).ln()
}

/// `ln B(a, b) = ln Γ(a) + ln Γ(b) - ln Γ(a + b)`
#[inline]
pub fn log_beta(a: f64, b: f64) -> f64 {
    log_gamma(a) + log_gamma(b) - log_gamma(a + b)
}

/// Beta function `B(a, b) = exp(ln Γ(a) + ln Γ(b) - ln Γ(a + b))`
#[inline]
pub fn beta(a: f64, b: f64) -> f64 {
    log_beta(a, b).exp()
}

// =============================================================================
// CHI-SQUARE TAIL
// =============================================================================

/// Upper-tail probability `P(X > x)` for `X ~ χ²(df)`.
///
/// Wilson–Hilferty cube-root normal approximation:
///
/// ```text
/// z = ((x/df)^(1/3) - (1 - 2/(9df))) / √(2/(9df)),   P = 1 - Φ(z)
/// ```
///
/// Returns NaN for `df ≤ 0`.
#[inline]
pub fn chi_square_sf(x: f64, df: f64) -> f64 {
    if df <= 0.0 || x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    let v = 2.0 / (9.0 * df);
    let z = ((x / df).cbrt() - (1.0 - v)) / v.sqrt();
    1.0 - normal_cdf(z)
}

// =============================================================================
// Z-SCORES FOR DESIGN PARAMETERS
// =============================================================================

/// Sidedness of a hypothesis test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tails {
    /// One-sided test: Zα = Φ⁻¹(1 - α)
    One,
    /// Two-sided test: Zα = Φ⁻¹(1 - α/2)
    Two,
}

impl Tails {
    /// Short label for step traces
    pub fn label(&self) -> &'static str {
        match self {
            Tails::One => "one-sided",
            Tails::Two => "two-sided",
        }
    }
}

/// Critical value for significance level `alpha`
#[inline]
pub fn z_alpha(alpha: f64, tails: Tails) -> f64 {
    match tails {
        Tails::One => inverse_normal_cdf(1.0 - alpha),
        Tails::Two => inverse_normal_cdf(1.0 - alpha / 2.0),
    }
}

/// Quantile for the desired power (1 - β)
#[inline]
pub fn z_beta(power: f64) -> f64 {
    inverse_normal_cdf(power)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_quantile_at_half_is_exact_zero() {
        assert_eq!(inverse_normal_cdf(0.5), 0.0);
    }

    #[test]
    fn test_quantile_known_values() {
        assert_abs_diff_eq!(inverse_normal_cdf(0.975), 1.959964, epsilon = 1e-6);
        assert_abs_diff_eq!(inverse_normal_cdf(0.95), 1.644854, epsilon = 1e-6);
        assert_abs_diff_eq!(inverse_normal_cdf(0.8), 0.841621, epsilon = 1e-6);
        assert_abs_diff_eq!(inverse_normal_cdf(0.995), 2.575829, epsilon = 1e-6);
        assert_abs_diff_eq!(inverse_normal_cdf(0.001), -3.090232, epsilon = 1e-6);
    }

    #[test]
    fn test_quantile_saturates_outside_unit_interval() {
        assert_eq!(inverse_normal_cdf(0.0), f64::NEG_INFINITY);
        assert_eq!(inverse_normal_cdf(-0.3), f64::NEG_INFINITY);
        assert_eq!(inverse_normal_cdf(1.0), f64::INFINITY);
        assert_eq!(inverse_normal_cdf(7.0), f64::INFINITY);
        assert!(inverse_normal_cdf(f64::NAN).is_nan());
    }

    #[test]
    fn test_quantile_strictly_increasing() {
        let mut prev = f64::NEG_INFINITY;
        for i in 1..1000 {
            let z = inverse_normal_cdf(i as f64 / 1000.0);
            assert!(z > prev, "not increasing at p = {}", i as f64 / 1000.0);
            prev = z;
        }
    }

    #[test]
    fn test_quantile_antisymmetric() {
        for &p in &[0.001, 0.01, 0.02425, 0.1, 0.3, 0.45, 0.499] {
            assert_abs_diff_eq!(
                inverse_normal_cdf(p),
                -inverse_normal_cdf(1.0 - p),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_normal_cdf_center_and_symmetry() {
        assert_eq!(normal_cdf(0.0), 0.5);
        for &x in &[0.1, 0.5, 1.0, 1.96, 2.5, 4.0] {
            assert_abs_diff_eq!(normal_cdf(-x), 1.0 - normal_cdf(x), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_normal_cdf_known_values() {
        assert_abs_diff_eq!(normal_cdf(1.96), 0.975002, epsilon = 1e-6);
        assert_abs_diff_eq!(normal_cdf(-1.0), 0.158655, epsilon = 1e-6);
        assert_eq!(normal_cdf(f64::INFINITY), 1.0);
        assert_eq!(normal_cdf(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_round_trip() {
        for i in 1..100 {
            let p = i as f64 / 100.0;
            assert_abs_diff_eq!(normal_cdf(inverse_normal_cdf(p)), p, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_log_gamma_factorials() {
        // Γ(n) = (n-1)!
        assert_abs_diff_eq!(log_gamma(1.0), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(log_gamma(5.0), 24.0_f64.ln(), epsilon = 1e-9);
        assert_abs_diff_eq!(log_gamma(0.5), PI.sqrt().ln(), epsilon = 1e-9);
    }

    #[test]
    fn test_beta_function() {
        // B(1, 1) = 1, B(2, 3) = 1/12
        assert_relative_eq!(beta(1.0, 1.0), 1.0, max_relative = 1e-9);
        assert_relative_eq!(beta(2.0, 3.0), 1.0 / 12.0, max_relative = 1e-9);
        assert_relative_eq!(beta(3.0, 2.0), beta(2.0, 3.0), max_relative = 1e-12);
    }

    #[test]
    fn test_chi_square_sf() {
        // χ²(1) critical value 3.841 → p ≈ 0.05; W-H is rough at df = 1
        assert_abs_diff_eq!(chi_square_sf(3.841, 1.0), 0.05, epsilon = 0.01);
        assert_abs_diff_eq!(chi_square_sf(18.307, 10.0), 0.05, epsilon = 0.002);
        assert_eq!(chi_square_sf(0.0, 4.0), 1.0);
        assert!(chi_square_sf(1.0, 0.0).is_nan());
    }

    #[test]
    fn test_z_helpers() {
        assert_abs_diff_eq!(z_alpha(0.05, Tails::Two), 1.959964, epsilon = 1e-6);
        assert_abs_diff_eq!(z_alpha(0.05, Tails::One), 1.644854, epsilon = 1e-6);
        assert_abs_diff_eq!(z_beta(0.8), 0.841621, epsilon = 1e-6);
    }

    #[test]
    fn test_normal_pdf_peak() {
        assert_abs_diff_eq!(normal_pdf(0.0), 0.398942, epsilon = 1e-6);
    }
}
