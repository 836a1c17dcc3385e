use std::path::PathBuf;

use anyhow::Context;
use biostat_core::{registry::Calculator, CalcResult, CalculationResult, Params};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    report::{render_result, ErrorDocument},
    settings::{OutputFormat, Settings},
    util::{read_json_file, Output},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct RunArg {
    /// Calculator slug; may instead come from the request file
    calculator: Option<String>,
    /// Parameters as key=value; these override values from the request file
    #[arg(value_name = "KEY=VALUE")]
    params: Vec<String>,
    /// JSON request file: {"calculator": "<slug>", "params": {...}}
    #[arg(long)]
    file: Option<PathBuf>,
    /// Output file path (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

/// A saved calculation request
#[derive(Debug, Clone, Default, Deserialize)]
struct Request {
    calculator: Option<String>,
    #[serde(default)]
    params: Params,
}

impl RunArg {
    /// Merge the request file (if any) with the command line
    fn resolve(&self) -> anyhow::Result<(Calculator, Params)> {
        let request: Request = match &self.file {
            Some(path) => read_json_file("request", path)?,
            None => Request::default(),
        };

        let slug = self
            .calculator
            .as_deref()
            .or(request.calculator.as_deref())
            .context("No calculator given; pass a slug or a request file with a \"calculator\" field")?;
        let calculator = Calculator::from_slug(slug)?;

        let mut params = request.params;
        params.merge(Params::from_assignments(&self.params)?);
        Ok((calculator, params))
    }
}

/// Print the JSON error document on stderr and wrap the error for `main`
fn report_failure(
    calculator: Calculator,
    result: CalcResult<CalculationResult>,
) -> anyhow::Result<CalculationResult> {
    match result {
        Ok(result) => Ok(result),
        Err(error) => {
            if let Ok(json) = serde_json::to_string_pretty(&ErrorDocument::new(&error)) {
                eprintln!("{}", json);
            }
            Err(error).with_context(|| format!("{} failed", calculator))
        }
    }
}

pub(crate) fn run(arg: &RunArg, settings: &Settings) -> anyhow::Result<()> {
    let (calculator, params) = arg.resolve()?;
    let result = report_failure(calculator, calculator.run(&params))?;

    let mut output = Output::from_output_path(arg.output.clone())?;
    match settings.format {
        OutputFormat::Json => output.write_json(&result)?,
        OutputFormat::Text => {
            let title = calculator.metadata().title;
            output.write_text(&render_result(title, &result, settings, Utc::now()))?;
        }
    }
    if arg.output.is_some() {
        eprintln!("Wrote {} result to {}", calculator, output.display_path());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg(calculator: Option<&str>, params: &[&str]) -> RunArg {
        RunArg {
            calculator: calculator.map(str::to_string),
            params: params.iter().map(|p| p.to_string()).collect(),
            ..RunArg::default()
        }
    }

    #[test]
    fn test_resolve_from_assignments() {
        let (calculator, params) =
            arg(Some("paired_t"), &["meanDiff=5", "sdDiff=10", "alpha=0.05", "power=0.8"])
                .resolve()
                .unwrap();
        assert_eq!(calculator, Calculator::PairedT);
        let result = calculator.run(&params).unwrap();
        assert_eq!(result.headline().unwrap().1.as_count(), Some(32));
    }

    #[test]
    fn test_resolve_requires_calculator() {
        let err = arg(None, &["p=0.5"]).resolve().unwrap_err();
        assert!(err.to_string().contains("No calculator given"));
    }

    #[test]
    fn test_resolve_rejects_malformed_assignment() {
        assert!(arg(Some("prevalence"), &["p"]).resolve().is_err());
    }

    #[test]
    fn test_request_document() {
        let request: Request = serde_json::from_str(
            r#"{ "calculator": "correlation", "params": { "r": "0.3", "alpha": 0.05, "power": 0.8 } }"#,
        )
        .unwrap();
        assert_eq!(request.calculator.as_deref(), Some("correlation"));
        let result = Calculator::Correlation.run(&request.params).unwrap();
        assert_eq!(result.headline().unwrap().1.as_count(), Some(85));
    }

    #[test]
    fn test_failure_is_wrapped_with_calculator() {
        let params = Params::new().with("r", 0.0).with("alpha", 0.05).with("power", 0.8);
        let err = report_failure(Calculator::Correlation, Calculator::Correlation.run(&params))
            .unwrap_err();
        assert_eq!(err.to_string(), "correlation failed");
        assert!(err.downcast_ref::<biostat_core::CalcError>().is_some());
    }
}
