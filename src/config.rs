use crate::normalizer::DisplayPattern;
use anyhow::{Context, Result, bail};
use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

pub const DEFAULT_FALLBACK_TEXT: &str = "Not set";
pub const DEFAULT_INVALID_TEXT: &str = "Invalid date";

/// How a run normalizes documents. Loaded from an optional JSON file, then
/// overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizeOptions {
    /// Date fields to read from every document; dotted paths reach into
    /// nested objects.
    pub fields: Vec<String>,
    pub pattern: DisplayPattern,
    /// Shown for unset values.
    pub fallback_text: String,
    /// Shown for values that failed to normalize.
    pub invalid_text: String,
    /// When set, instants at exactly local midnight move to this time.
    #[serde(deserialize_with = "deserialize_time_of_day")]
    pub midnight_default: Option<NaiveTime>,
    pub sort_by: Option<String>,
    /// IANA zone name; the system zone when absent.
    pub timezone: Option<String>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions {
            fields: Vec::new(),
            pattern: DisplayPattern::default(),
            fallback_text: DEFAULT_FALLBACK_TEXT.to_string(),
            invalid_text: DEFAULT_INVALID_TEXT.to_string(),
            midnight_default: None,
            sort_by: None,
            timezone: None,
        }
    }
}

impl NormalizeOptions {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            bail!("no date fields configured; pass --field or set `fields` in the config");
        }
        if let Some(field) = &self.sort_by {
            if !self.fields.contains(field) {
                bail!("sort field `{field}` is not one of the normalized fields");
            }
        }
        Ok(())
    }
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|err| format!("`{s}` is not a time of day (HH:MM): {err}"))
}

fn deserialize_time_of_day<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|s| parse_time_of_day(&s).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let opts = NormalizeOptions::default();
        assert_eq!(opts.fallback_text, "Not set");
        assert_eq!(opts.pattern, DisplayPattern::DateTime);
        assert_eq!(opts.midnight_default, None);
    }

    #[test]
    fn partial_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"fields": ["createdAt", "launch.date"], "pattern": "date-only", "midnight_default": "09:00"}}"#
        )
        .unwrap();
        let opts = NormalizeOptions::from_file(file.path()).unwrap();
        assert_eq!(opts.fields, vec!["createdAt", "launch.date"]);
        assert_eq!(opts.pattern, DisplayPattern::DateOnly);
        assert_eq!(opts.midnight_default, NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(opts.invalid_text, "Invalid date");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = serde_json::from_str::<NormalizeOptions>(r#"{"feilds": []}"#);
        assert!(err.is_err());
    }

    #[test]
    fn validate_requires_fields_and_known_sort() {
        assert!(NormalizeOptions::default().validate().is_err());
        let opts = NormalizeOptions {
            fields: vec!["createdAt".into()],
            sort_by: Some("closedAt".into()),
            ..Default::default()
        };
        assert!(opts.validate().is_err());
        let opts = NormalizeOptions {
            sort_by: Some("createdAt".into()),
            ..opts
        };
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn time_of_day_formats() {
        assert_eq!(parse_time_of_day("09:00"), Ok(NaiveTime::from_hms_opt(9, 0, 0).unwrap()));
        assert_eq!(parse_time_of_day("17:30:15"), Ok(NaiveTime::from_hms_opt(17, 30, 15).unwrap()));
        assert!(parse_time_of_day("9am").is_err());
    }
}
