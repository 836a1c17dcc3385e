//! Text rendering of results, calculator metadata and errors.

use std::fmt::Write as _;

use biostat_core::{CalcError, CalculationResult, CalculatorMetadata, ResultValue};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::settings::Settings;

const RULE: &str = "==============================================================";

/// Replacement for each non-ASCII symbol the engine emits
fn ascii_symbol(c: char) -> Option<&'static str> {
    let replacement = match c {
        '₀' => "0",
        '₁' => "1",
        '₂' => "2",
        '²' => "^2",
        'α' => "alpha",
        'β' => "beta",
        'δ' => "delta",
        'Δ' => "Delta",
        'η' => "eta",
        'κ' => "kappa",
        'λ' => "lambda",
        'μ' => "mu",
        'π' => "pi",
        'ρ' => "rho",
        'σ' => "sigma",
        'τ' => "tau",
        'ψ' => "psi",
        'Φ' => "Phi",
        'Σ' => "Sum",
        '√' => "sqrt",
        '×' => "x",
        '·' => "*",
        '−' | '–' | '—' => "-",
        '→' => "->",
        '±' => "+/-",
        '≥' => ">=",
        '≤' => "<=",
        '≈' => "~",
        '∞' => "inf",
        '⌈' => "ceil(",
        '⌉' => ")",
        '½' => "1/2",
        // combining macron in p̄, q̄
        '\u{0304}' => "",
        _ => return None,
    };
    Some(replacement)
}

/// Transliterate to plain ASCII; anything unmapped becomes `?`
pub fn to_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            out.push_str(ascii_symbol(c).unwrap_or("?"));
        }
    }
    out
}

fn value_text(value: &ResultValue, decimals: Option<usize>) -> String {
    match (value, decimals) {
        (ResultValue::Number(x), Some(places)) => format!("{:.*}", places, x),
        _ => value.to_string(),
    }
}

/// Human-readable report of one result
pub fn render_result(
    title: &str,
    result: &CalculationResult,
    settings: &Settings,
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    // writeln! into a String cannot fail
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "  {}", title.to_uppercase());
    let _ = writeln!(out, "  {} | {}", result.study_type(), result.method());
    let _ = writeln!(out, "  Generated {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(out, "{}", RULE);

    let _ = writeln!(out, "\nInputs:");
    for (label, value) in result.inputs().iter() {
        let _ = writeln!(out, "  {:<36} {}", label, value);
    }

    let _ = writeln!(out, "\nFormula:");
    let _ = writeln!(out, "  {}", result.formula());
    let _ = writeln!(out, "  where {}", result.formula_explanation());

    let _ = writeln!(out, "\nSteps:");
    for (i, step) in result.steps().iter().enumerate() {
        let _ = writeln!(out, "  {}. {}: {}", i + 1, step.title, step.calc);
    }

    let _ = writeln!(out, "\nResults:");
    for (label, value) in result.results().iter() {
        let _ = writeln!(out, "  {:<36} {}", label, value_text(value, settings.decimals));
    }

    let _ = writeln!(out, "\nInterpretation:");
    let _ = writeln!(out, "  {}", result.interpretation());

    if !result.recommendations().is_empty() {
        let _ = writeln!(out, "\nRecommendations:");
        for recommendation in result.recommendations() {
            let _ = writeln!(out, "  - {}", recommendation);
        }
    }

    let _ = writeln!(out, "\nReference:");
    let _ = writeln!(out, "  {}", result.reference());

    if settings.ascii_only {
        to_ascii(&out)
    } else {
        out
    }
}

/// Detail view of one calculator
pub fn render_metadata(meta: &CalculatorMetadata, settings: &Settings) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", meta.title, meta.slug);
    let _ = writeln!(out, "Category:   {}", meta.category.display_name());
    let _ = writeln!(out, "{}", meta.description);
    let _ = writeln!(out, "\nFormula:    {}", meta.formula);
    let _ = writeln!(out, "Parameters: {}", meta.params.join(", "));
    let _ = writeln!(out, "Example:    {}", meta.example);
    let _ = writeln!(out, "Reference:  {}", meta.reference);
    let assignments: Vec<String> = match serde_json::from_str::<serde_json::Value>(meta.example) {
        Ok(serde_json::Value::Object(map)) => map
            .iter()
            .map(|(key, value)| match value {
                serde_json::Value::Array(items) => {
                    let items: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                    format!("{}={}", key, items.join(","))
                }
                other => format!("{}={}", key, other),
            })
            .collect(),
        _ => Vec::new(),
    };
    let _ = writeln!(out, "\nUsage:      biostat run {} {}", meta.slug, assignments.join(" "));

    if settings.ascii_only {
        to_ascii(&out)
    } else {
        out
    }
}

/// The JSON document written to stderr when a calculation fails
#[derive(Debug, Serialize)]
pub struct ErrorDocument<'a> {
    pub code: &'static str,
    pub message: String,
    pub error: &'a CalcError,
}

impl<'a> ErrorDocument<'a> {
    pub fn new(error: &'a CalcError) -> Self {
        ErrorDocument {
            code: error.error_code(),
            message: error.to_string(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biostat_core::registry::Calculator;
    use biostat_core::Params;
    use chrono::TimeZone;

    fn two_sample() -> CalculationResult {
        let meta = Calculator::TwoSampleT.metadata();
        let params = Params::from_json_str(meta.example).unwrap();
        Calculator::TwoSampleT.run(&params).unwrap()
    }

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn test_render_result_sections() {
        let text = render_result("Two-Sample T-Test", &two_sample(), &Settings::default(), stamp());

        assert!(text.contains("TWO-SAMPLE T-TEST"));
        assert!(text.contains("Generated 2026-03-14 09:26:53 UTC"));
        for section in ["Inputs:", "Formula:", "Steps:", "Results:", "Interpretation:", "Reference:"] {
            assert!(text.contains(section), "missing {}", section);
        }
        assert!(text.contains("284"));
        assert!(text.contains("  1. "));
    }

    #[test]
    fn test_render_result_ascii_only() {
        let settings = Settings {
            ascii_only: true,
            ..Settings::default()
        };
        let text = render_result("Two-Sample T-Test", &two_sample(), &settings, stamp());
        assert!(text.is_ascii());
        assert!(text.contains("alpha"));
    }

    #[test]
    fn test_decimals_apply_to_numbers_only() {
        let settings = Settings {
            decimals: Some(1),
            ..Settings::default()
        };
        let text = render_result("Two-Sample T-Test", &two_sample(), &settings, stamp());
        // Cohen's d 0.3333 shown with one decimal; counts untouched
        assert!(text.contains(" 0.3\n"));
        assert!(text.contains(" 142\n"));
    }

    #[test]
    fn test_to_ascii() {
        assert_eq!(to_ascii("Zα/2 × σ₁²"), "Zalpha/2 x sigma1^2");
        assert_eq!(to_ascii("p̄ → ⌈n⌉"), "p -> ceil(n)");
        assert_eq!(to_ascii("日"), "?");
    }

    #[test]
    fn test_render_metadata_usage_line() {
        let text = render_metadata(&Calculator::FailSafeN.metadata(), &Settings::default());
        assert!(text.contains("Fail-Safe N (fail-safe-n)"));
        assert!(text.contains("biostat run fail-safe-n"));
        assert!(text.contains("zScores=2.1,1.8,2.5,1.2,2.9"));
    }

    #[test]
    fn test_error_document() {
        let error = CalcError::validation("alpha", "1.5", "must lie strictly between 0 and 1");
        let json = serde_json::to_value(ErrorDocument::new(&error)).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["type"], "Validation");
        assert_eq!(json["error"]["details"]["field"], "alpha");
        assert!(json["message"].as_str().unwrap().contains("alpha"));
    }
}
