//! Normalizes the date fields of exported documents, one JSON object per
//! line.

use crate::config::NormalizeOptions;
use crate::normalizer::{Normalizer, UnsetPlacement, classify, compare_instants};
use crate::temporal::{CanonicalInstant, Shape, TemporalValue};
use chrono::TimeZone;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldStatus {
    Set,
    Unset,
    Invalid,
}

impl FieldStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldStatus::Set => "set",
            FieldStatus::Unset => "unset",
            FieldStatus::Invalid => "invalid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedField {
    pub name: String,
    pub shape: Shape,
    pub status: FieldStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instant_ms: Option<CanonicalInstant>,
    pub display: String,
    /// Only kept for rejected values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// 1-based line in the input file.
    pub line: usize,
    pub id: Option<String>,
    pub fields: Vec<NormalizedField>,
}

impl NormalizedRecord {
    pub fn field(&self, name: &str) -> Option<&NormalizedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn instant(&self, name: &str) -> Option<CanonicalInstant> {
        self.field(name).and_then(|f| f.instant_ms)
    }
}

/// Normalizes every non-blank line of `text`. Lines that are not JSON
/// objects are logged and skipped.
pub fn normalize_batch<Z>(
    text: &str,
    first_line: usize,
    normalizer: &Normalizer<Z>,
    options: &NormalizeOptions,
) -> Vec<NormalizedRecord>
where
    Z: TimeZone,
    Z::Offset: fmt::Display,
{
    let mut out = Vec::new();
    for (offset, raw_line) in text.lines().enumerate() {
        let line = first_line + offset;
        let raw_line = raw_line.trim();
        if raw_line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(raw_line) {
            Ok(doc @ Value::Object(_)) => {
                out.push(normalize_document(line, &doc, normalizer, options));
            }
            Ok(_) => warn!("event=line_skipped line={line} reason=not_an_object"),
            Err(err) => warn!("event=line_skipped line={line} reason={err}"),
        }
    }
    out
}

pub fn normalize_document<Z>(
    line: usize,
    doc: &Value,
    normalizer: &Normalizer<Z>,
    options: &NormalizeOptions,
) -> NormalizedRecord
where
    Z: TimeZone,
    Z::Offset: fmt::Display,
{
    let fields = options
        .fields
        .iter()
        .map(|name| {
            let value = lookup_field(doc, name).map_or(TemporalValue::Unset, TemporalValue::from_json);
            normalize_field(line, name, &value, normalizer, options)
        })
        .collect();

    NormalizedRecord {
        line,
        id: document_id(doc),
        fields,
    }
}

fn normalize_field<Z>(
    line: usize,
    name: &str,
    value: &TemporalValue,
    normalizer: &Normalizer<Z>,
    options: &NormalizeOptions,
) -> NormalizedField
where
    Z: TimeZone,
    Z::Offset: fmt::Display,
{
    let shape = classify(value);
    match normalizer.to_canonical_instant(value) {
        Ok(Some(instant)) => {
            let instant = match options.midnight_default {
                Some(at) => normalizer.default_midnight(instant, at),
                None => instant,
            };
            NormalizedField {
                name: name.to_string(),
                shape,
                status: FieldStatus::Set,
                instant_ms: Some(instant),
                display: normalizer.format_for_display(
                    Some(instant),
                    options.pattern,
                    &options.invalid_text,
                ),
                raw: None,
                error: None,
            }
        }
        Ok(None) => {
            debug!("event=date_unset line={line} field={name}");
            NormalizedField {
                name: name.to_string(),
                shape,
                status: FieldStatus::Unset,
                instant_ms: None,
                display: options.fallback_text.clone(),
                raw: None,
                error: None,
            }
        }
        Err(err) => {
            warn!(
                "event=date_rejected line={line} field={name} shape={} raw={:?} reason={}",
                err.shape(),
                err.raw(),
                err.reason()
            );
            NormalizedField {
                name: name.to_string(),
                shape: err.shape(),
                status: FieldStatus::Invalid,
                instant_ms: None,
                display: options.invalid_text.clone(),
                raw: Some(err.raw().to_string()),
                error: Some(err.to_string()),
            }
        }
    }
}

/// Resolves `a.b.c` through nested objects.
pub fn lookup_field<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |node, key| node.as_object()?.get(key))
}

fn document_id(doc: &Value) -> Option<String> {
    match doc.get("id").or_else(|| doc.get("_id"))? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Stable sort: records with `field` set come first, most recent first.
pub fn sort_records(records: &mut [NormalizedRecord], field: &str) {
    records.sort_by(|a, b| compare_instants(a.instant(field), b.instant(field), UnsetPlacement::Last));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::DisplayPattern;
    use chrono::{FixedOffset, NaiveTime};
    use serde_json::json;

    fn normalizer() -> Normalizer<FixedOffset> {
        Normalizer::new(FixedOffset::east_opt(5 * 3600 + 1800).unwrap())
    }

    fn options(fields: &[&str]) -> NormalizeOptions {
        NormalizeOptions {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn statuses_stay_distinct() {
        let doc = json!({
            "id": "store-17",
            "createdAt": {"_seconds": 1_760_161_260, "_nanoseconds": 0},
            "closedAt": null,
            "launchDate": "not-a-date",
        });
        let record = normalize_document(
            3,
            &doc,
            &normalizer(),
            &options(&["createdAt", "closedAt", "launchDate", "trainingDate"]),
        );

        assert_eq!(record.id.as_deref(), Some("store-17"));
        let created = record.field("createdAt").unwrap();
        assert_eq!(created.status, FieldStatus::Set);
        assert_eq!(created.shape, Shape::ServerTimestamp);
        assert_eq!(created.display, "11/10/2025 11:11");

        let closed = record.field("closedAt").unwrap();
        assert_eq!(closed.status, FieldStatus::Unset);
        assert_eq!(closed.display, "Not set");
        assert_eq!(closed.raw, None);

        let launch = record.field("launchDate").unwrap();
        assert_eq!(launch.status, FieldStatus::Invalid);
        assert_eq!(launch.display, "Invalid date");
        assert_eq!(launch.raw.as_deref(), Some("not-a-date"));

        assert_eq!(record.field("trainingDate").unwrap().status, FieldStatus::Unset);
    }

    #[test]
    fn timestamp_past_the_calendar_is_invalid() {
        let doc = json!({"d": {"seconds": 10_000_000_000_000i64, "nanoseconds": 0}});
        let record = normalize_document(1, &doc, &normalizer(), &options(&["d"]));
        let field = &record.fields[0];
        assert_eq!(field.status, FieldStatus::Invalid);
        assert_eq!(field.instant_ms, None);
        assert_eq!(field.display, "Invalid date");
        assert_eq!(field.shape, Shape::ServerTimestamp);
    }

    #[test]
    fn integral_float_timestamp_is_set() {
        let doc = json!({"d": {"seconds": 1.76016126e9, "nanoseconds": 0.0}});
        let record = normalize_document(1, &doc, &normalizer(), &options(&["d"]));
        assert_eq!(record.fields[0].status, FieldStatus::Set);
        assert_eq!(record.fields[0].display, "11/10/2025 11:11");
    }

    #[test]
    fn nested_fields_and_numeric_ids() {
        let doc = json!({"_id": 42, "rollout": {"training": {"date": "111025 11:11"}}});
        let record = normalize_document(1, &doc, &normalizer(), &options(&["rollout.training.date"]));
        assert_eq!(record.id.as_deref(), Some("42"));
        assert_eq!(record.fields[0].shape, Shape::Compact);
        assert_eq!(record.fields[0].display, "11/10/2025 11:11");
    }

    #[test]
    fn lookup_stops_at_non_objects() {
        let doc = json!({"a": {"b": 1}, "c": [1, 2]});
        assert_eq!(lookup_field(&doc, "a.b"), Some(&json!(1)));
        assert_eq!(lookup_field(&doc, "a.b.c"), None);
        assert_eq!(lookup_field(&doc, "c.0"), None);
    }

    #[test]
    fn midnight_default_only_when_configured() {
        let doc = json!({"rolloutDate": "2025-10-11"});
        let mut opts = options(&["rolloutDate"]);
        let plain = normalize_document(1, &doc, &normalizer(), &opts);
        assert_eq!(plain.fields[0].display, "11/10/2025 00:00");

        opts.midnight_default = NaiveTime::from_hms_opt(9, 0, 0);
        let moved = normalize_document(1, &doc, &normalizer(), &opts);
        assert_eq!(moved.fields[0].display, "11/10/2025 09:00");
    }

    #[test]
    fn pattern_is_applied() {
        let doc = json!({"paidAt": "2025-10-11T11:11"});
        let opts = NormalizeOptions {
            pattern: DisplayPattern::TimeOnly,
            ..options(&["paidAt"])
        };
        let record = normalize_document(1, &doc, &normalizer(), &opts);
        assert_eq!(record.fields[0].display, "11:11");
    }

    #[test]
    fn batch_skips_blank_and_non_object_lines() {
        let text = "{\"id\":\"a\",\"d\":\"2025-10-11\"}\n\n[1,2]\n{broken\r\n{\"id\":\"b\"}\n";
        let records = normalize_batch(text, 10, &normalizer(), &options(&["d"]));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 10);
        assert_eq!(records[1].line, 14);
        assert_eq!(records[1].id.as_deref(), Some("b"));
    }

    #[test]
    fn sort_records_recent_first_unset_last() {
        let text = [
            r#"{"id":"old","d":"2024-01-01"}"#,
            r#"{"id":"none"}"#,
            r#"{"id":"new","d":"111025 11:11"}"#,
            r#"{"id":"bad","d":"soon"}"#,
            r#"{"id":"mid","d":{"seconds":1750000000,"nanoseconds":0}}"#,
        ]
        .join("\n");
        let mut records = normalize_batch(&text, 1, &normalizer(), &options(&["d"]));
        sort_records(&mut records, "d");
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_deref().unwrap()).collect();
        assert_eq!(ids, ["new", "mid", "old", "none", "bad"]);
    }

    #[test]
    fn serialized_record_omits_empty_parts() {
        let doc = json!({"id": "s1", "d": null});
        let record = normalize_document(1, &doc, &normalizer(), &options(&["d"]));
        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(
            v,
            json!({
                "line": 1,
                "id": "s1",
                "fields": [{"name": "d", "shape": "unset", "status": "unset", "display": "Not set"}]
            })
        );
    }
}
