//! Rendering options, loadable from a YAML document.
//!
//! ```yaml
//! indent: 4          # or "tab" (the default)
//! version: "2.24.0"  # emitted as \version by to_lilypond_file
//! ```

use crate::error::ScoreError;
use serde::Deserialize;

/// Indentation unit for nested containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indent {
    #[default]
    Tab,
    Spaces(usize),
}

impl Indent {
    pub fn unit(self) -> String {
        match self {
            Indent::Tab => "\t".to_string(),
            Indent::Spaces(n) => " ".repeat(n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormatOptions {
    pub indent: Indent,
    pub version: Option<String>,
}

/// Raw options for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawFormatOptions {
    indent: Option<RawIndent>,
    version: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RawIndent {
    Spaces(usize),
    Named(String),
}

impl FormatOptions {
    /// Parses options from YAML; missing keys take their defaults.
    pub fn from_yaml(content: &str) -> Result<Self, ScoreError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawFormatOptions =
            serde_yaml::from_str(content).map_err(|e| ScoreError::ConfigError(e.to_string()))?;

        let indent = match raw.indent {
            None => Indent::default(),
            Some(RawIndent::Spaces(0)) => {
                return Err(ScoreError::ConfigError(
                    "indent must be at least one space".to_string(),
                ))
            }
            Some(RawIndent::Spaces(n)) => Indent::Spaces(n),
            Some(RawIndent::Named(name)) if name.eq_ignore_ascii_case("tab") => Indent::Tab,
            Some(RawIndent::Named(name)) => {
                return Err(ScoreError::ConfigError(format!("Invalid indent: {}", name)))
            }
        };

        let version = match raw.version {
            Some(v) if v.trim().is_empty() => {
                return Err(ScoreError::ConfigError("version cannot be empty".to_string()))
            }
            other => other,
        };

        Ok(Self { indent, version })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = FormatOptions::from_yaml("").unwrap();
        assert_eq!(options, FormatOptions::default());
        assert_eq!(options.indent.unit(), "\t");
    }

    #[test]
    fn test_spaces_and_version() {
        let options = FormatOptions::from_yaml("indent: 2\nversion: \"2.24.0\"\n").unwrap();
        assert_eq!(options.indent, Indent::Spaces(2));
        assert_eq!(options.indent.unit(), "  ");
        assert_eq!(options.version.as_deref(), Some("2.24.0"));
    }

    #[test]
    fn test_named_tab() {
        let options = FormatOptions::from_yaml("indent: tab").unwrap();
        assert_eq!(options.indent, Indent::Tab);
    }

    #[test]
    fn test_invalid_options() {
        for yaml in ["indent: 0", "indent: wide", "version: \"\"", "colour: red", "indent: [1"] {
            assert!(
                matches!(FormatOptions::from_yaml(yaml), Err(ScoreError::ConfigError(_))),
                "{} should be rejected",
                yaml
            );
        }
    }
}
