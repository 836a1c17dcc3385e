//! # Survival Analysis
//!
//! Event-driven designs. Each calculator first finds the number of events
//! the test needs, then divides by the probability that a subject has an
//! event during the study to get the number of subjects:
//!
//! - [`calculate_log_rank`] - Schoenfeld's events for the log-rank test
//! - [`calculate_cox_regression`] - Hsieh–Lavori events for one Cox covariate
//! - [`calculate_exponential_survival`] - Schoenfeld events with the event
//!   probability derived from exponential survival and uniform accrual
//! - [`calculate_freedman`] - Freedman's events for the log-rank test
//!
//! Event counts are rounded up before the division so the subject total
//! always covers the rounded events.

use serde::{Deserialize, Serialize};

use crate::distributions::Tails;
use crate::errors::CalcResult;
use crate::format::{ceil_count, fixed, percent, trim, STAT_PLACES, Z_PLACES};
use crate::params::{FromParams, Params};
use crate::result::{CalculationResult, ResultBuilder};
use crate::validation;

use super::common::DesignZ;

const STUDY_TYPE: &str = "Survival analysis";

const SCHOENFELD: &str =
    "Schoenfeld D. The asymptotic properties of nonparametric tests for comparing survival distributions. Biometrika. 1981;68(1):316-319.";

fn validate_hazard_ratio(hr: f64) -> CalcResult<()> {
    validation::positive("hr", hr)?;
    validation::differ("hr", 1.0, hr)
}

fn validate_event_probability(field: &str, p: f64) -> CalcResult<()> {
    validation::require(p > 0.0 && p <= 1.0, field, p, "must lie in (0, 1]")
}

/// Subject totals from rounded events: `(total, group 1, group 2)`
fn subjects_from_events(events: u64, event_probability: f64, ratio: f64) -> (u64, u64, u64) {
    let total = ceil_count(events as f64 / event_probability);
    let n1 = ceil_count(total as f64 / (1.0 + ratio));
    let n2 = ceil_count(total as f64 * ratio / (1.0 + ratio));
    (total, n1, n2)
}

// ============================================================================
// Log-rank (Schoenfeld)
// ============================================================================

/// Input parameters for a two-arm log-rank comparison.
///
/// ## JSON Example
///
/// ```json
/// { "hr": 0.7, "alpha": 0.05, "power": 0.8, "ratio": 1, "eventRate": 0.3 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRankInput {
    /// Hazard ratio to detect
    pub hr: f64,
    pub alpha: f64,
    pub power: f64,
    /// Allocation ratio r = n₂/n₁
    pub ratio: f64,
    /// Overall probability of observing an event
    pub event_rate: f64,
}

impl LogRankInput {
    pub fn validate(&self) -> CalcResult<()> {
        validate_hazard_ratio(self.hr)?;
        validation::alpha(self.alpha)?;
        validation::power(self.power)?;
        validation::ratio(self.ratio)?;
        validate_event_probability("eventRate", self.event_rate)
    }
}

impl FromParams for LogRankInput {
    const FIELDS: &'static [&'static str] = &["hr", "alpha", "power", "ratio", "eventRate"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(LogRankInput {
            hr: params.number("hr")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
            ratio: params.number("ratio")?,
            event_rate: params.number("eventRate")?,
        })
    }
}

/// Schoenfeld's required events: `((Zα/2 + Zβ)/ln HR)² · (1 + r)²/r`
pub fn schoenfeld_events(hr: f64, ratio: f64, z: &DesignZ) -> f64 {
    (z.sum() / hr.ln()).powi(2) * (1.0 + ratio).powi(2) / ratio
}

pub fn calculate_log_rank(input: &LogRankInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let LogRankInput { hr, alpha, power, ratio, event_rate } = *input;
    let z = DesignZ::new(alpha, power, Tails::Two);
    let events_raw = schoenfeld_events(hr, ratio, &z);
    let events = ceil_count(events_raw);
    let (total, n1, n2) = subjects_from_events(events, event_rate, ratio);

    let builder = ResultBuilder::new(STUDY_TYPE, "Log-rank test (Schoenfeld)")
        .input("Hazard ratio (HR)", trim(hr))
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .input("Allocation ratio (r)", trim(ratio))
        .input("Probability of event", trim(event_rate))
        .formula(
            "d = ((Zα/2 + Zβ) / ln HR)² × (1 + r)² / r,  N = d / P(event)",
            "d = required events, HR = hazard ratio, r = allocation ratio, P(event) = probability a subject has an event",
        );

    Ok(z.steps(builder)
        .step("Log hazard ratio", format!("ln({}) = {}", trim(hr), fixed(hr.ln(), Z_PLACES)))
        .step(
            "Required events",
            format!(
                "d = ({} / {})² × (1 + {})² / {} = {} → {}",
                fixed(z.sum(), Z_PLACES),
                fixed(hr.ln(), Z_PLACES),
                trim(ratio),
                trim(ratio),
                fixed(events_raw, 2),
                events
            ),
        )
        .step("Total subjects", format!("N = ⌈{} / {}⌉ = {}", events, trim(event_rate), total))
        .count("Required events", events)
        .count("Total sample size", total)
        .count("Group 1", n1)
        .count("Group 2", n2)
        .interpretation(format!(
            "The trial must observe {} events; with {} of subjects expected to have an event, enrol {} \
             ({} and {} per arm) to detect HR = {} with {} power.",
            events,
            percent(event_rate, 0),
            total,
            n1,
            n2,
            trim(hr),
            percent(power, 0)
        ))
        .recommend("Plan the analysis to trigger on the event count rather than calendar time.")
        .recommend("Check the proportional-hazards assumption at analysis.")
        .reference(SCHOENFELD)
        .build())
}

// ============================================================================
// Cox regression (Hsieh–Lavori)
// ============================================================================

/// Input parameters for detecting a hazard ratio per SD of a covariate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoxRegressionInput {
    /// Hazard ratio per unit of the covariate
    pub hr: f64,
    /// Probability that a subject has an event
    pub event_prob: f64,
    pub alpha: f64,
    pub power: f64,
    /// R² of the covariate on the other covariates
    pub r2: f64,
    /// Standard deviation of the covariate
    pub sd: f64,
}

impl CoxRegressionInput {
    pub fn validate(&self) -> CalcResult<()> {
        validate_hazard_ratio(self.hr)?;
        validate_event_probability("eventProb", self.event_prob)?;
        validation::alpha(self.alpha)?;
        validation::power(self.power)?;
        validation::non_negative("r2", self.r2)?;
        validation::require(self.r2 < 1.0, "r2", self.r2, "must be below 1")?;
        validation::positive("sd", self.sd)
    }
}

impl FromParams for CoxRegressionInput {
    const FIELDS: &'static [&'static str] = &["hr", "eventProb", "alpha", "power", "r2", "sd"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(CoxRegressionInput {
            hr: params.number("hr")?,
            event_prob: params.number("eventProb")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
            r2: params.number("r2")?,
            sd: params.number("sd")?,
        })
    }
}

/// Hsieh–Lavori: `D = (Zα/2 + Zβ)² / ((1 − R²)·σ²·(ln HR)²)`, `N = D / P(event)`
pub fn calculate_cox_regression(input: &CoxRegressionInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let CoxRegressionInput { hr, event_prob, alpha, power, r2, sd } = *input;
    let z = DesignZ::new(alpha, power, Tails::Two);
    let log_hr = hr.ln();
    let events_raw = z.sum().powi(2) / ((1.0 - r2) * sd.powi(2) * log_hr.powi(2));
    let events = ceil_count(events_raw);
    let total = ceil_count(events as f64 / event_prob);

    let builder = ResultBuilder::new(STUDY_TYPE, "Cox proportional hazards regression (Hsieh–Lavori)")
        .input("Hazard ratio (HR)", trim(hr))
        .input("Probability of event", trim(event_prob))
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .input("R² with other covariates", trim(r2))
        .input("SD of covariate (σ)", trim(sd))
        .formula(
            "D = (Zα/2 + Zβ)² / ((1 − R²) × σ² × (ln HR)²),  N = D / P(event)",
            "D = required events, R² = squared multiple correlation of the covariate with the others, \
             σ = covariate SD, HR = hazard ratio per unit",
        );

    Ok(z.steps(builder)
        .step("Log hazard ratio", format!("ln({}) = {}", trim(hr), fixed(log_hr, Z_PLACES)))
        .step(
            "Required events",
            format!(
                "D = {}² / ((1 − {}) × {}² × {}²) = {} → {}",
                fixed(z.sum(), Z_PLACES),
                trim(r2),
                trim(sd),
                fixed(log_hr, Z_PLACES),
                fixed(events_raw, 2),
                events
            ),
        )
        .step("Total subjects", format!("N = ⌈{} / {}⌉ = {}", events, trim(event_prob), total))
        .count("Required events", events)
        .count("Total sample size", total)
        .number("Variance inflation 1/(1 − R²)", 1.0 / (1.0 - r2), STAT_PLACES)
        .interpretation(format!(
            "{} events are needed to detect HR = {} per {} unit(s) of the covariate; at an event \
             probability of {} that means {} subjects.",
            events,
            trim(hr),
            trim(sd),
            percent(event_prob, 0),
            total
        ))
        .recommend("Keep at least 10 events per candidate covariate in the final model.")
        .recommend_if(r2 > 0.5, "Strong correlation with other covariates inflates the requirement; reconsider the adjustment set.")
        .reference("Hsieh FY, Lavori PW. Sample-size calculations for the Cox proportional hazards regression model with nonbinary covariates. Control Clin Trials. 2000;21(6):552-560.")
        .build())
}

// ============================================================================
// Exponential survival with accrual
// ============================================================================

/// Input parameters for comparing two exponential survival curves.
///
/// Times are in any consistent unit (months is typical).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExponentialSurvivalInput {
    /// Median survival, group 1
    pub median1: f64,
    /// Median survival, group 2
    pub median2: f64,
    /// Length of the uniform accrual period
    pub accrual_time: f64,
    /// Additional follow-up after accrual closes
    pub follow_up_time: f64,
    pub alpha: f64,
    pub power: f64,
    pub ratio: f64,
}

impl ExponentialSurvivalInput {
    pub fn validate(&self) -> CalcResult<()> {
        validation::positive("median1", self.median1)?;
        validation::positive("median2", self.median2)?;
        validation::differ("median2", self.median1, self.median2)?;
        validation::positive("accrualTime", self.accrual_time)?;
        validation::non_negative("followUpTime", self.follow_up_time)?;
        validation::alpha(self.alpha)?;
        validation::power(self.power)?;
        validation::ratio(self.ratio)
    }
}

impl FromParams for ExponentialSurvivalInput {
    const FIELDS: &'static [&'static str] = &[
        "median1",
        "median2",
        "accrualTime",
        "followUpTime",
        "alpha",
        "power",
        "ratio",
    ];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(ExponentialSurvivalInput {
            median1: params.number("median1")?,
            median2: params.number("median2")?,
            accrual_time: params.number("accrualTime")?,
            follow_up_time: params.number("followUpTime")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
            ratio: params.number("ratio")?,
        })
    }
}

/// Probability of an event with hazard `lambda`, uniform accrual over
/// `accrual` and further follow-up `follow_up`:
///
/// ```text
/// P = 1 − (e^{−λF} − e^{−λ(A+F)}) / (λA)
/// ```
pub fn event_probability(lambda: f64, accrual: f64, follow_up: f64) -> f64 {
    1.0 - ((-lambda * follow_up).exp() - (-lambda * (accrual + follow_up)).exp()) / (lambda * accrual)
}

pub fn calculate_exponential_survival(input: &ExponentialSurvivalInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let ExponentialSurvivalInput {
        median1,
        median2,
        accrual_time,
        follow_up_time,
        alpha,
        power,
        ratio,
    } = *input;
    let z = DesignZ::new(alpha, power, Tails::Two);
    let lambda1 = std::f64::consts::LN_2 / median1;
    let lambda2 = std::f64::consts::LN_2 / median2;
    let hr = lambda2 / lambda1;
    let events_raw = schoenfeld_events(hr, ratio, &z);
    let events = ceil_count(events_raw);
    let p1 = event_probability(lambda1, accrual_time, follow_up_time);
    let p2 = event_probability(lambda2, accrual_time, follow_up_time);
    let p_event = (p1 + ratio * p2) / (1.0 + ratio);
    let (total, n1, n2) = subjects_from_events(events, p_event, ratio);

    let builder = ResultBuilder::new(STUDY_TYPE, "Exponential survival with uniform accrual")
        .input("Median survival, group 1", trim(median1))
        .input("Median survival, group 2", trim(median2))
        .input("Accrual period (A)", trim(accrual_time))
        .input("Additional follow-up (F)", trim(follow_up_time))
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .input("Allocation ratio (r)", trim(ratio))
        .formula(
            "λ = ln 2 / median,  P(event) = 1 − (e^{−λF} − e^{−λ(A+F)}) / (λA),  N = d / P̄(event)",
            "d = Schoenfeld events for HR = λ₂/λ₁, A = accrual period, F = follow-up after accrual, \
             P̄ = allocation-weighted event probability",
        );

    Ok(z.steps(builder)
        .step(
            "Hazards",
            format!(
                "λ₁ = ln 2 / {} = {}, λ₂ = ln 2 / {} = {}",
                trim(median1),
                fixed(lambda1, Z_PLACES),
                trim(median2),
                fixed(lambda2, Z_PLACES)
            ),
        )
        .step("Hazard ratio", format!("HR = λ₂ / λ₁ = {}", fixed(hr, Z_PLACES)))
        .step("Required events", format!("d = {} → {}", fixed(events_raw, 2), events))
        .step(
            "Event probabilities",
            format!(
                "P₁ = {}, P₂ = {}, P̄ = {}",
                fixed(p1, Z_PLACES),
                fixed(p2, Z_PLACES),
                fixed(p_event, Z_PLACES)
            ),
        )
        .step("Total subjects", format!("N = ⌈{} / {}⌉ = {}", events, fixed(p_event, Z_PLACES), total))
        .count("Total sample size", total)
        .count("Group 1", n1)
        .count("Group 2", n2)
        .count("Required events", events)
        .number("Hazard ratio", hr, Z_PLACES)
        .number("Probability of event", p_event, Z_PLACES)
        .interpretation(format!(
            "Enrol {} subjects over {} time units and follow for {} more to observe the {} events needed \
             to detect medians of {} vs {} (HR = {}).",
            total,
            trim(accrual_time),
            trim(follow_up_time),
            events,
            trim(median1),
            trim(median2),
            fixed(hr, STAT_PLACES)
        ))
        .recommend("Longer follow-up raises the event probability and lowers the number to enrol.")
        .recommend("Revisit accrual assumptions at an interim review; slow accrual lengthens the trial.")
        .reference("Lachin JM, Foulkes MA. Evaluation of sample size and power for analyses of survival with allowance for nonuniform patient entry, losses to follow-up, noncompliance, and stratification. Biometrics. 1986;42(3):507-519.")
        .build())
}

// ============================================================================
// Freedman
// ============================================================================

/// Input parameters for Freedman's log-rank sample size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreedmanInput {
    pub hr: f64,
    pub alpha: f64,
    pub power: f64,
    pub ratio: f64,
    pub event_rate: f64,
}

impl FreedmanInput {
    pub fn validate(&self) -> CalcResult<()> {
        validate_hazard_ratio(self.hr)?;
        validation::alpha(self.alpha)?;
        validation::power(self.power)?;
        validation::ratio(self.ratio)?;
        validate_event_probability("eventRate", self.event_rate)
    }
}

impl FromParams for FreedmanInput {
    const FIELDS: &'static [&'static str] = &["hr", "alpha", "power", "ratio", "eventRate"];

    fn from_params(params: &Params) -> CalcResult<Self> {
        Ok(FreedmanInput {
            hr: params.number("hr")?,
            alpha: params.number("alpha")?,
            power: params.number("power")?,
            ratio: params.number("ratio")?,
            event_rate: params.number("eventRate")?,
        })
    }
}

/// Freedman: `d = (Zα/2 + Zβ)² · (1 + r·HR)² / (r·(1 − HR)²)`
pub fn calculate_freedman(input: &FreedmanInput) -> CalcResult<CalculationResult> {
    input.validate()?;

    let FreedmanInput { hr, alpha, power, ratio, event_rate } = *input;
    let z = DesignZ::new(alpha, power, Tails::Two);
    let events_raw = z.sum().powi(2) * (1.0 + ratio * hr).powi(2) / (ratio * (1.0 - hr).powi(2));
    let events = ceil_count(events_raw);
    let (total, n1, n2) = subjects_from_events(events, event_rate, ratio);

    let builder = ResultBuilder::new(STUDY_TYPE, "Log-rank test (Freedman)")
        .input("Hazard ratio (HR)", trim(hr))
        .input("Significance level (α)", trim(alpha))
        .input("Power (1 − β)", percent(power, 0))
        .input("Allocation ratio (r)", trim(ratio))
        .input("Probability of event", trim(event_rate))
        .formula(
            "d = (Zα/2 + Zβ)² × (1 + r × HR)² / (r × (1 − HR)²),  N = d / P(event)",
            "d = required events, HR = hazard ratio, r = allocation ratio",
        );

    Ok(z.steps(builder)
        .step(
            "Required events",
            format!(
                "d = {}² × (1 + {} × {})² / ({} × (1 − {})²) = {} → {}",
                fixed(z.sum(), Z_PLACES),
                trim(ratio),
                trim(hr),
                trim(ratio),
                trim(hr),
                fixed(events_raw, 2),
                events
            ),
        )
        .step("Total subjects", format!("N = ⌈{} / {}⌉ = {}", events, trim(event_rate), total))
        .count("Required events", events)
        .count("Total sample size", total)
        .count("Group 1", n1)
        .count("Group 2", n2)
        .interpretation(format!(
            "Freedman's method needs {} events, i.e. {} subjects at an event probability of {}.",
            events,
            total,
            percent(event_rate, 0)
        ))
        .recommend("Freedman's formula is slightly more conservative than Schoenfeld's; report which was used.")
        .reference("Freedman LS. Tables of the number of patients required in clinical trials using the logrank test. Stat Med. 1982;1(2):121-129.")
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
    fn test_log_rank() {
        let input = LogRankInput {
            hr: 0.7,
            alpha: 0.05,
            power: 0.8,
            ratio: 1.0,
            event_rate: 0.3,
        };
        let result = calculate_log_rank(&input).unwrap();
        // events 246.79 → 247 ; 247 / 0.3 = 823.3
        assert_eq!(count(&result, "Required events"), 247);
        assert_eq!(count(&result, "Total sample size"), 824);
        assert_eq!(count(&result, "Group 1"), 412);
        assert_eq!(count(&result, "Group 2"), 412);
    }

    #[test]
    fn test_hazard_ratio_direction_is_symmetric() {
        let z = DesignZ::new(0.05, 0.8, Tails::Two);
        assert_abs_diff_eq!(
            schoenfeld_events(0.5, 1.0, &z),
            schoenfeld_events(2.0, 1.0, &z),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_cox_total_is_events_over_event_probability() {
        let input = CoxRegressionInput {
            hr: 1.5,
            event_prob: 0.3,
            alpha: 0.05,
            power: 0.8,
            r2: 0.0,
            sd: 1.0,
        };
        let result = calculate_cox_regression(&input).unwrap();
        // D = 7.849 / (ln 1.5)² = 47.74 → 48 ; 48 / 0.30 = 160
        assert_eq!(count(&result, "Required events"), 48);
        assert_eq!(count(&result, "Total sample size"), 160);
    }

    #[test]
    fn test_cox_adjustment_inflates_events() {
        let input = CoxRegressionInput {
            hr: 1.5,
            event_prob: 0.3,
            alpha: 0.05,
            power: 0.8,
            r2: 0.2,
            sd: 0.5,
        };
        let result = calculate_cox_regression(&input).unwrap();
        // 47.74 / (0.8 × 0.25) = 238.71
        assert_eq!(count(&result, "Required events"), 239);
    }

    #[test]
    fn test_event_probability() {
        let lambda = std::f64::consts::LN_2 / 12.0;
        assert_abs_diff_eq!(event_probability(lambda, 12.0, 12.0), 0.639326, epsilon = 1e-6);
        // more follow-up, more events
        assert!(event_probability(lambda, 12.0, 24.0) > event_probability(lambda, 12.0, 12.0));
    }

    #[test]
    fn test_exponential_survival() {
        let input = ExponentialSurvivalInput {
            median1: 12.0,
            median2: 18.0,
            accrual_time: 12.0,
            follow_up_time: 12.0,
            alpha: 0.05,
            power: 0.8,
            ratio: 1.0,
        };
        let result = calculate_exponential_survival(&input).unwrap();
        // HR 2/3, events 190.97 → 191, P̄ 0.5674 → 336.6
        assert_eq!(count(&result, "Required events"), 191);
        assert_eq!(count(&result, "Total sample size"), 337);
        assert_eq!(result.result("Hazard ratio").unwrap().as_f64(), Some(0.6667));
    }

    #[test]
    fn test_freedman() {
        let input = FreedmanInput {
            hr: 0.7,
            alpha: 0.05,
            power: 0.8,
            ratio: 1.0,
            event_rate: 0.3,
        };
        let result = calculate_freedman(&input).unwrap();
        // events 252.04 → 253 ; 253 / 0.3 = 843.3
        assert_eq!(count(&result, "Required events"), 253);
        assert_eq!(count(&result, "Total sample size"), 844);
    }

    #[test]
    fn test_rejects_null_hazard_ratio() {
        let input = LogRankInput {
            hr: 1.0,
            alpha: 0.05,
            power: 0.8,
            ratio: 1.0,
            event_rate: 0.3,
        };
        assert_eq!(calculate_log_rank(&input).unwrap_err().field(), Some("hr"));
    }
}
