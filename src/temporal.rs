//! The shapes a "point in time" can arrive in, and the canonical instant
//! they are normalized to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Number, Value};
use std::fmt;

/// Every date-like input the normalizer accepts. Strings stay raw here;
/// which textual format they follow is decided by `classify`.
#[derive(Debug, Clone, PartialEq)]
pub enum TemporalValue {
    Unset,
    ServerTimestamp(ServerTimestamp),
    Native(DateTime<Utc>),
    Text(String),
    /// Any other JSON shape, kept as its serialized text for diagnostics.
    Opaque(String),
}

/// Document-store server timestamp as it appears in exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTimestamp {
    #[serde(alias = "_seconds", deserialize_with = "integral")]
    pub seconds: i64,
    #[serde(alias = "_nanoseconds", deserialize_with = "integral")]
    pub nanoseconds: i64,
}

/// Accepts integers and floats with no fractional part (`1.5e9`).
fn integral<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let n = Number::deserialize(deserializer)?;
    n.as_i64()
        .or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        })
        .ok_or_else(|| de::Error::custom(format!("expected a whole number, got {n}")))
}

impl TemporalValue {
    /// Reads a field value from a JSON document. Absent fields should be
    /// passed as `Value::Null`.
    ///
    /// An object with `seconds` is a server timestamp when both parts are
    /// whole numbers; floats count if they have no fractional part. Anything
    /// else (strings, `1.5` seconds, a missing `nanoseconds`) is `Opaque`.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => TemporalValue::Unset,
            Value::String(s) => TemporalValue::Text(s.clone()),
            Value::Object(map)
                if map.contains_key("seconds") || map.contains_key("_seconds") =>
            {
                match ServerTimestamp::deserialize(value) {
                    Ok(ts) => TemporalValue::ServerTimestamp(ts),
                    Err(_) => TemporalValue::Opaque(value.to_string()),
                }
            }
            other => TemporalValue::Opaque(other.to_string()),
        }
    }

    /// Raw rendering used when a value is rejected.
    pub fn raw(&self) -> String {
        match self {
            TemporalValue::Unset => String::new(),
            TemporalValue::ServerTimestamp(ts) => {
                format!("{{seconds: {}, nanoseconds: {}}}", ts.seconds, ts.nanoseconds)
            }
            TemporalValue::Native(dt) => dt.to_rfc3339(),
            TemporalValue::Text(s) | TemporalValue::Opaque(s) => s.clone(),
        }
    }
}

impl From<&str> for TemporalValue {
    fn from(s: &str) -> Self {
        TemporalValue::Text(s.to_string())
    }
}

impl From<String> for TemporalValue {
    fn from(s: String) -> Self {
        TemporalValue::Text(s)
    }
}

impl From<DateTime<Utc>> for TemporalValue {
    fn from(dt: DateTime<Utc>) -> Self {
        TemporalValue::Native(dt)
    }
}

impl From<ServerTimestamp> for TemporalValue {
    fn from(ts: ServerTimestamp) -> Self {
        TemporalValue::ServerTimestamp(ts)
    }
}

impl<T: Into<TemporalValue>> From<Option<T>> for TemporalValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(TemporalValue::Unset, Into::into)
    }
}

/// Result of `classify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Shape {
    Unset,
    #[serde(rename = "server-timestamp-like")]
    ServerTimestamp,
    Native,
    /// `DDMMYY HH:mm`
    Compact,
    /// `YYYY-MM-DD` or `YYYY-MM-DDTHH:mm`
    IsoLike,
    /// Any other string a standard parser accepts.
    Generic,
    Unrecognized,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Unset => "unset",
            Shape::ServerTimestamp => "server-timestamp-like",
            Shape::Native => "native",
            Shape::Compact => "compact",
            Shape::IsoLike => "iso-like",
            Shape::Generic => "generic",
            Shape::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalInstant(i64);

impl CanonicalInstant {
    pub const fn from_millis(millis: i64) -> Self {
        CanonicalInstant(millis)
    }

    pub const fn millis(self) -> i64 {
        self.0
    }

    /// `None` when the value lies outside chrono's calendar range.
    pub fn to_utc(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }
}

impl From<DateTime<Utc>> for CanonicalInstant {
    fn from(dt: DateTime<Utc>) -> Self {
        CanonicalInstant(dt.timestamp_millis())
    }
}
