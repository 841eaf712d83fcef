use crate::error::NormalizeError;
use crate::temporal::Shape;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}(T[0-9]{2}:[0-9]{2})?$")
            .expect("iso-like date pattern is valid")
    })
}

/// `YYYY-MM-DD` or `YYYY-MM-DDTHH:mm`, the values date and datetime input
/// fields submit.
pub fn is_iso_like(s: &str) -> bool {
    pattern().is_match(s)
}

/// Date-only values are local midnight.
pub fn parse_iso_like(s: &str) -> Result<NaiveDateTime, NormalizeError> {
    let parsed = if s.contains('T') {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
    } else {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN))
    };
    parsed.map_err(|err| NormalizeError::unparseable(Shape::IsoLike, s, err.to_string()))
}
