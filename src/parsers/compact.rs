//! `DDMMYY HH:mm`, the format manual-entry prompts ask for.
//!
//! Two-digit years always land in 2000-2099.

use crate::error::NormalizeError;
use crate::temporal::Shape;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

const CENTURY: i32 = 2000;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([0-9]{2})([0-9]{2})([0-9]{2})\s([0-9]{2}):([0-9]{2})$")
            .expect("compact date pattern is valid")
    })
}

pub fn is_compact(s: &str) -> bool {
    pattern().is_match(s)
}

pub fn parse_compact(s: &str) -> Result<NaiveDateTime, NormalizeError> {
    let caps = pattern()
        .captures(s)
        .ok_or_else(|| NormalizeError::unparseable(Shape::Compact, s, "expected DDMMYY HH:mm"))?;
    // Every group is exactly two ASCII digits.
    let field = |i: usize| caps[i].parse::<u32>().unwrap_or_default();
    let (day, month, year) = (field(1), field(2), CENTURY + field(3) as i32);
    let (hour, minute) = (field(4), field(5));

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        NormalizeError::unparseable(
            Shape::Compact,
            s,
            format!("day {day} month {month} year {year} is not a calendar date"),
        )
    })?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| {
        NormalizeError::unparseable(Shape::Compact, s, format!("{hour:02}:{minute:02} is not a time of day"))
    })?;
    Ok(date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_only_the_exact_layout() {
        assert!(is_compact("111025 11:11"));
        assert!(is_compact("111025\t11:11"));
        assert!(!is_compact("11102511:11"));
        assert!(!is_compact("1110 11:11"));
        assert!(!is_compact("111025 11:11:00"));
    }

    #[test]
    fn parses_day_month_year_order() {
        let got = parse_compact("111025 11:11").unwrap();
        let want = NaiveDate::from_ymd_opt(2025, 10, 11)
            .unwrap()
            .and_hms_opt(11, 11, 0)
            .unwrap();
        assert_eq!(got, want);
    }

    #[test]
    fn two_digit_year_is_2000s() {
        let got = parse_compact("010199 00:00").unwrap();
        assert_eq!(got.date(), NaiveDate::from_ymd_opt(2099, 1, 1).unwrap());
    }

    #[test]
    fn rejects_out_of_range_components() {
        assert!(parse_compact("111325 11:11").is_err());
        assert!(parse_compact("300225 11:11").is_err());
        assert!(parse_compact("111025 24:00").is_err());
        assert!(parse_compact("111025 11:60").is_err());
    }
}
