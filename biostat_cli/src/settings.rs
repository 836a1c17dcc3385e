use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::util::read_json_file;

/// How a result is printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable report
    #[default]
    Text,
    /// The result contract as pretty JSON
    Json,
}

/// Report settings. Loaded from an optional JSON file, then overridden by flags.
///
/// ```json
/// { "format": "text", "decimals": 2, "asciiOnly": false }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub format: OutputFormat,
    /// Decimals for numeric results in text reports; `None` keeps the engine's rounding
    pub decimals: Option<usize>,
    /// Transliterate Greek letters, subscripts and math symbols in text reports
    pub ascii_only: bool,
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        read_json_file("settings", path)
    }

    /// Defaults, or the file at `path` when given
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Settings::load(path),
            None => Ok(Settings::default()),
        }
    }

    /// Apply command-line flags on top of the loaded settings
    pub fn with_overrides(
        mut self,
        format: Option<OutputFormat>,
        decimals: Option<usize>,
        ascii_only: bool,
    ) -> Self {
        if let Some(format) = format {
            self.format = format;
        }
        if decimals.is_some() {
            self.decimals = decimals;
        }
        self.ascii_only |= ascii_only;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "decimals": 2 }"#).unwrap();
        assert_eq!(settings.format, OutputFormat::Text);
        assert_eq!(settings.decimals, Some(2));
        assert!(!settings.ascii_only);
    }

    #[test]
    fn test_flags_override_file() {
        let file: Settings =
            serde_json::from_str(r#"{ "format": "json", "decimals": 3, "asciiOnly": true }"#).unwrap();

        let settings = file.clone().with_overrides(Some(OutputFormat::Text), None, false);
        assert_eq!(settings.format, OutputFormat::Text);
        assert_eq!(settings.decimals, Some(3));
        assert!(settings.ascii_only);

        let settings = file.with_overrides(None, Some(1), false);
        assert_eq!(settings.format, OutputFormat::Json);
        assert_eq!(settings.decimals, Some(1));
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let err = Settings::load(Path::new("/nonexistent/biostat-settings.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to open settings file"));
    }
}
