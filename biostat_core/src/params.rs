//! # Parameter Boundary
//!
//! Calculators receive one flat object per call whose values may be numbers
//! or strings (form fields, query strings, `key=value` CLI arguments). This
//! module is the only place that coercion happens: [`Params`] holds the raw
//! values and [`FromParams`] turns them into a typed `*Input` struct. Past
//! this boundary every formula works on plain `f64`/`u64`.
//!
//! Coercion is strict. Text that does not parse as a finite number is an
//! [`CalcError::InvalidParameter`], never a silent NaN, and an absent or
//! empty field is a [`CalcError::MissingField`]. No field has an engine-side
//! default.
//!
//! ## Example
//!
//! ```rust
//! use biostat_core::params::Params;
//!
//! let params = Params::new()
//!     .with("p", "0.5")
//!     .with("d", 0.05)
//!     .with("nonResponseRate", "10%");
//!
//! assert_eq!(params.number("p").unwrap(), 0.5);
//! assert_eq!(params.percent("nonResponseRate").unwrap().0, 10.0);
//! assert!(params.number("z").is_err());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{CalcError, CalcResult};
use crate::units::Percent;

/// Raw, untyped calculator parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params {
    values: Map<String, Value>,
}

impl Params {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON object. Any other JSON value is rejected.
    pub fn from_json(value: Value) -> CalcResult<Self> {
        match value {
            Value::Object(values) => Ok(Params { values }),
            other => Err(CalcError::SerializationError {
                reason: format!("parameters must be a JSON object, got {}", other),
            }),
        }
    }

    /// Parse a JSON object from text
    pub fn from_json_str(json: &str) -> CalcResult<Self> {
        Self::from_json(serde_json::from_str(json)?)
    }

    /// Build from `key=value` strings as typed on a command line.
    pub fn from_assignments<I, S>(assignments: I) -> CalcResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut params = Params::new();
        for assignment in assignments {
            let assignment = assignment.as_ref();
            let (key, value) = assignment.split_once('=').ok_or_else(|| {
                CalcError::invalid_parameter(assignment, assignment, "expected key=value")
            })?;
            params.set(key.trim(), value.trim());
        }
        Ok(params)
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Insert or replace a raw value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Raw value for a field, treating `null` and blank strings as absent
    pub fn raw(&self, field: &str) -> Option<&Value> {
        match self.values.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(v) => Some(v),
        }
    }

    /// Overlay `other`; its values win on conflicting keys
    pub fn merge(&mut self, other: Params) {
        self.values.extend(other.values);
    }

    /// Field names present, in key order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// A required finite number
    pub fn number(&self, field: &str) -> CalcResult<f64> {
        let value = self.raw(field).ok_or_else(|| CalcError::missing_field(field))?;
        coerce_number(field, value)
    }

    /// A required non-negative whole number (cell counts, cluster sizes)
    pub fn count(&self, field: &str) -> CalcResult<u64> {
        let x = self.number(field)?;
        if x < 0.0 || x.fract() != 0.0 {
            return Err(CalcError::invalid_parameter(
                field,
                x.to_string(),
                "expected a non-negative whole number",
            ));
        }
        Ok(x as u64)
    }

    /// A required percentage; a trailing `%` in text input is accepted
    pub fn percent(&self, field: &str) -> CalcResult<Percent> {
        let value = self.raw(field).ok_or_else(|| CalcError::missing_field(field))?;
        match value {
            Value::String(s) => {
                let s = s.trim();
                let s = s.strip_suffix('%').unwrap_or(s);
                parse_text(field, s).map(Percent)
            }
            other => coerce_number(field, other).map(Percent),
        }
    }

    /// A required list of numbers: a JSON array, or text separated by
    /// commas, semicolons or whitespace.
    pub fn numbers(&self, field: &str) -> CalcResult<Vec<f64>> {
        let value = self.raw(field).ok_or_else(|| CalcError::missing_field(field))?;
        match value {
            Value::Array(items) => items.iter().map(|v| coerce_number(field, v)).collect(),
            Value::String(s) => s
                .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                .filter(|part| !part.is_empty())
                .map(|part| parse_text(field, part))
                .collect(),
            other => coerce_number(field, other).map(|x| vec![x]),
        }
    }
}

fn coerce_number(field: &str, value: &Value) -> CalcResult<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| CalcError::invalid_parameter(field, n.to_string(), "not representable as f64")),
        Value::String(s) => parse_text(field, s.trim()),
        other => Err(CalcError::invalid_parameter(
            field,
            other.to_string(),
            "expected a number",
        )),
    }
}

fn parse_text(field: &str, text: &str) -> CalcResult<f64> {
    let x: f64 = text
        .parse()
        .map_err(|_| CalcError::invalid_parameter(field, format!("\"{}\"", text), "not a number"))?;
    if !x.is_finite() {
        return Err(CalcError::invalid_parameter(
            field,
            format!("\"{}\"", text),
            "must be finite",
        ));
    }
    Ok(x)
}

/// Conversion from raw parameters into a calculator's typed input.
pub trait FromParams: Sized {
    /// Parameter names this calculator reads, in display order
    const FIELDS: &'static [&'static str];

    /// Parse every field; no validation of domain preconditions here
    fn from_params(params: &Params) -> CalcResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_and_strings_coerce() {
        let params = Params::from_json(json!({"a": 1.5, "b": " 2.25 ", "c": 3})).unwrap();
        assert_eq!(params.number("a").unwrap(), 1.5);
        assert_eq!(params.number("b").unwrap(), 2.25);
        assert_eq!(params.count("c").unwrap(), 3);
    }

    #[test]
    fn test_missing_and_blank_fields() {
        let params = Params::new().with("blank", "  ").with("null", Value::Null);
        assert_eq!(params.number("blank").unwrap_err(), CalcError::missing_field("blank"));
        assert_eq!(params.number("null").unwrap_err(), CalcError::missing_field("null"));
        assert_eq!(params.number("absent").unwrap_err(), CalcError::missing_field("absent"));
    }

    #[test]
    fn test_non_numeric_text_is_rejected() {
        let params = Params::new().with("alpha", "five percent").with("x", "inf");
        let err = params.number("alpha").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
        assert_eq!(err.field(), Some("alpha"));
        assert!(params.number("x").is_err());
    }

    #[test]
    fn test_count_rejects_fractions_and_negatives() {
        let params = Params::new().with("a", 2.5).with("b", -1);
        assert!(params.count("a").is_err());
        assert!(params.count("b").is_err());
    }

    #[test]
    fn test_percent_accepts_suffix() {
        let params = Params::new().with("nr", "12.5%").with("dropout", 20);
        assert_eq!(params.percent("nr").unwrap(), Percent(12.5));
        assert_eq!(params.percent("dropout").unwrap(), Percent(20.0));
    }

    #[test]
    fn test_number_lists() {
        let params = Params::from_json(json!({
            "text": "0.2, 0.5;0.1  0.4",
            "array": [0.1, "0.2", 3],
            "bad": "0.1, x"
        }))
        .unwrap();
        assert_eq!(params.numbers("text").unwrap(), vec![0.2, 0.5, 0.1, 0.4]);
        assert_eq!(params.numbers("array").unwrap(), vec![0.1, 0.2, 3.0]);
        assert!(params.numbers("bad").is_err());
    }

    #[test]
    fn test_from_assignments() {
        let params = Params::from_assignments(["p=0.5", "d = 0.05"]).unwrap();
        assert_eq!(params.number("d").unwrap(), 0.05);
        assert!(Params::from_assignments(["oops"]).is_err());
    }

    #[test]
    fn test_merge_overrides() {
        let mut params = Params::new().with("p", 0.5).with("d", 0.05);
        params.merge(Params::new().with("d", "0.1").with("z", 1.96));
        assert_eq!(params.number("p").unwrap(), 0.5);
        assert_eq!(params.number("d").unwrap(), 0.1);
        assert_eq!(params.keys().count(), 3);
    }

    #[test]
    fn test_from_json_requires_object() {
        assert!(Params::from_json(json!([1, 2])).is_err());
        assert!(Params::from_json_str("{\"p\": 0.3}").is_ok());
        assert!(Params::from_json_str("not json").is_err());
    }
}
