//! # Calculation Result Contract
//!
//! Every calculator returns a [`CalculationResult`]: the single unit that
//! front ends display, export and copy. Its JSON shape (camelCase keys) is
//! the stable contract with those collaborators:
//!
//! ```json
//! {
//!   "studyType": "Descriptive / Cross-sectional",
//!   "method": "Single proportion (prevalence)",
//!   "inputs": { "Expected prevalence (p)": "0.5", "...": "..." },
//!   "formula": "n = Z² × p(1 − p) / d² × DEFF",
//!   "formulaExplanation": "Z = ..., p = ..., d = ...",
//!   "steps": [ { "title": "Base sample size", "calc": "n₀ = ... = 384.16" } ],
//!   "results": { "Required sample size": 385, "...": "..." },
//!   "interpretation": "A sample of 385 ...",
//!   "recommendations": [ "..." ],
//!   "reference": "Lwanga SK, Lemeshow S. ..."
//! }
//! ```
//!
//! A result is immutable once built: fields are private and only readable.
//! It has no identity and no lifecycle beyond the call that produced it.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::format::{fixed, round_to, trim};

// ============================================================================
// Ordered Map
// ============================================================================

/// Insertion-ordered string-keyed map that serializes as a JSON object.
///
/// Labels are few (typically < 15) so lookups scan linearly.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        OrderedMap {
            entries: Vec::new(),
        }
    }

    /// Insert a value. Re-inserting a label replaces it in place.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn first(&self) -> Option<(&str, &V)> {
        self.entries.first().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor<V>(std::marker::PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of labels to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = OrderedMap::new();
                while let Some((k, v)) = access.next_entry::<String, V>()? {
                    map.insert(k, v);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(std::marker::PhantomData))
    }
}

// ============================================================================
// Result Values
// ============================================================================

/// One output quantity: an integer count, a rounded statistic, or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultValue {
    /// Sample sizes, event counts, cluster counts (always ceiling-rounded)
    Count(u64),
    /// Statistics, already rounded to fixed decimals
    Number(f64),
    /// Labels, ranges, and values that are not finite
    Text(String),
}

impl ResultValue {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ResultValue::Count(n) => Some(*n as f64),
            ResultValue::Number(x) => Some(*x),
            ResultValue::Text(_) => None,
        }
    }

    /// Integer view; only counts qualify
    pub fn as_count(&self) -> Option<u64> {
        match self {
            ResultValue::Count(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResultValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultValue::Count(n) => write!(f, "{}", n),
            ResultValue::Number(x) => write!(f, "{}", trim(*x)),
            ResultValue::Text(s) => f.write_str(s),
        }
    }
}

/// One line of the arithmetic trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// What this step computes (e.g., "Z-score for α")
    pub title: String,
    /// Fully substituted expression with its value
    pub calc: String,
}

// ============================================================================
// Calculation Result
// ============================================================================

/// The explainable output of a calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    study_type: String,
    method: String,
    inputs: OrderedMap<String>,
    formula: String,
    formula_explanation: String,
    steps: Vec<Step>,
    results: OrderedMap<ResultValue>,
    interpretation: String,
    recommendations: Vec<String>,
    reference: String,
}

impl CalculationResult {
    pub fn study_type(&self) -> &str {
        &self.study_type
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Echoed inputs, display-formatted
    pub fn inputs(&self) -> &OrderedMap<String> {
        &self.inputs
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn formula_explanation(&self) -> &str {
        &self.formula_explanation
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn results(&self) -> &OrderedMap<ResultValue> {
        &self.results
    }

    /// Look up one output by label
    pub fn result(&self, label: &str) -> Option<&ResultValue> {
        self.results.get(label)
    }

    /// The headline output (first result entry)
    pub fn headline(&self) -> Option<(&str, &ResultValue)> {
        self.results.first()
    }

    pub fn interpretation(&self) -> &str {
        &self.interpretation
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
}

/// Assembles a [`CalculationResult`] field by field.
///
/// ```rust
/// use biostat_core::result::ResultBuilder;
///
/// let result = ResultBuilder::new("Demo", "Doubling")
///     .input("x", "2")
///     .formula("y = 2x", "x = input")
///     .step("Double", "y = 2 × 2 = 4")
///     .count("y", 4)
///     .interpretation("Doubling 2 gives 4.")
///     .reference("Arithmetic")
///     .build();
///
/// assert_eq!(result.headline().unwrap().1.as_count(), Some(4));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResultBuilder {
    study_type: String,
    method: String,
    inputs: OrderedMap<String>,
    formula: String,
    formula_explanation: String,
    steps: Vec<Step>,
    results: OrderedMap<ResultValue>,
    interpretation: String,
    recommendations: Vec<String>,
    reference: String,
}

impl ResultBuilder {
    pub fn new(study_type: impl Into<String>, method: impl Into<String>) -> Self {
        ResultBuilder {
            study_type: study_type.into(),
            method: method.into(),
            ..Default::default()
        }
    }

    /// Echo an input under a human-readable label
    pub fn input(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.inputs.insert(label, value.into());
        self
    }

    pub fn formula(mut self, formula: impl Into<String>, explanation: impl Into<String>) -> Self {
        self.formula = formula.into();
        self.formula_explanation = explanation.into();
        self
    }

    pub fn step(mut self, title: impl Into<String>, calc: impl Into<String>) -> Self {
        self.steps.push(Step {
            title: title.into(),
            calc: calc.into(),
        });
        self
    }

    /// A ceiling-rounded count
    pub fn count(mut self, label: impl Into<String>, n: u64) -> Self {
        self.results.insert(label, ResultValue::Count(n));
        self
    }

    /// A statistic rounded to `places` decimals; non-finite values become text
    pub fn number(mut self, label: impl Into<String>, x: f64, places: usize) -> Self {
        let value = if x.is_finite() {
            ResultValue::Number(round_to(x, places))
        } else {
            ResultValue::Text(fixed(x, places))
        };
        self.results.insert(label, value);
        self
    }

    pub fn text(mut self, label: impl Into<String>, text: impl Into<String>) -> Self {
        self.results.insert(label, ResultValue::Text(text.into()));
        self
    }

    pub fn interpretation(mut self, text: impl Into<String>) -> Self {
        self.interpretation = text.into();
        self
    }

    pub fn recommend(mut self, text: impl Into<String>) -> Self {
        self.recommendations.push(text.into());
        self
    }

    /// Add a recommendation only when `condition` holds
    pub fn recommend_if(self, condition: bool, text: impl Into<String>) -> Self {
        if condition {
            self.recommend(text)
        } else {
            self
        }
    }

    pub fn reference(mut self, citation: impl Into<String>) -> Self {
        self.reference = citation.into();
        self
    }

    pub fn build(self) -> CalculationResult {
        CalculationResult {
            study_type: self.study_type,
            method: self.method,
            inputs: self.inputs,
            formula: self.formula,
            formula_explanation: self.formula_explanation,
            steps: self.steps,
            results: self.results,
            interpretation: self.interpretation,
            recommendations: self.recommendations,
            reference: self.reference,
        }
    }
}
