//! Fallback for strings that are neither compact nor iso-like: full ISO
//! datetimes, RFC 2822, and a handful of unambiguous naive layouts.
//! Day-first and month-first slash dates are deliberately absent.

use super::Parsed;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y/%m/%d"];

/// ISO 8601 datetimes with an offset that RFC 3339 does not cover:
/// minute precision and the basic `+hhmm` form.
const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

pub fn parse_generic(s: &str) -> Option<Parsed> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Parsed::Absolute(dt));
    }
    let zulu;
    let with_offset = match s.strip_suffix(['Z', 'z']) {
        Some(rest) => {
            zulu = format!("{rest}+00:00");
            zulu.as_str()
        }
        None => s,
    };
    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(with_offset, fmt) {
            return Some(Parsed::Absolute(dt));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(Parsed::Absolute(dt));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Parsed::Wall(ndt));
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(Parsed::Wall(date.and_time(NaiveTime::MIN)));
        }
    }
    None
}
