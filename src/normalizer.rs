//! The single entry point for turning date-like values into canonical
//! instants and back into display text.
//!
//! Everything here is a pure function of its inputs and the configured
//! zone. Logging rejected input is the caller's job.

use crate::error::NormalizeError;
use crate::parsers::{self, Parsed, compact, generic, iso};
use crate::temporal::{CanonicalInstant, Shape, TemporalValue};
use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::fmt::{self, Write};

/// Decides which shape `value` has. Text is trimmed first; checks run in
/// the order unset, server timestamp, native, compact, iso-like, generic.
pub fn classify(value: &TemporalValue) -> Shape {
    match value {
        TemporalValue::Unset => Shape::Unset,
        TemporalValue::ServerTimestamp(_) => Shape::ServerTimestamp,
        TemporalValue::Native(_) => Shape::Native,
        TemporalValue::Text(s) => classify_text(s.trim()),
        TemporalValue::Opaque(_) => Shape::Unrecognized,
    }
}

fn classify_text(s: &str) -> Shape {
    if s.is_empty() {
        Shape::Unset
    } else if compact::is_compact(s) {
        Shape::Compact
    } else if iso::is_iso_like(s) {
        Shape::IsoLike
    } else if generic::parse_generic(s).is_some() {
        Shape::Generic
    } else {
        Shape::Unrecognized
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayPattern {
    /// `DD/MM/YYYY HH:mm`
    #[default]
    DateTime,
    /// `DD/MM/YYYY`
    DateOnly,
    /// `HH:mm`
    TimeOnly,
    /// `YYYY-MM-DDTHH:mm`, accepted back by datetime input fields
    InputField,
}

impl DisplayPattern {
    pub fn format_str(self) -> &'static str {
        match self {
            DisplayPattern::DateTime => "%d/%m/%Y %H:%M",
            DisplayPattern::DateOnly => "%d/%m/%Y",
            DisplayPattern::TimeOnly => "%H:%M",
            DisplayPattern::InputField => "%Y-%m-%dT%H:%M",
        }
    }
}

/// Where values without an instant go when ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsetPlacement {
    First,
    #[default]
    Last,
}

/// Orders most recent first, with unset values placed per `unset`.
pub fn compare_instants(
    a: Option<CanonicalInstant>,
    b: Option<CanonicalInstant>,
    unset: UnsetPlacement,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (None, None) => Ordering::Equal,
        (Some(_), None) => match unset {
            UnsetPlacement::Last => Ordering::Less,
            UnsetPlacement::First => Ordering::Greater,
        },
        (None, Some(_)) => match unset {
            UnsetPlacement::Last => Ordering::Greater,
            UnsetPlacement::First => Ordering::Less,
        },
    }
}

/// Sort key equivalent to `compare_instants(.., UnsetPlacement::Last)`.
fn recent_first_key(instant: Option<CanonicalInstant>) -> (bool, Reverse<i64>) {
    match instant {
        Some(i) => (false, Reverse(i.millis())),
        None => (true, Reverse(0)),
    }
}

/// Converts Temporal Values in a fixed time zone. Wall-clock inputs
/// (compact, iso-like, naive generic strings) are read in that zone and
/// display output is rendered in it.
#[derive(Debug, Clone)]
pub struct Normalizer<Z: TimeZone = Local> {
    zone: Z,
}

impl Normalizer<Local> {
    pub fn local() -> Self {
        Normalizer { zone: Local }
    }
}

impl Default for Normalizer<Local> {
    fn default() -> Self {
        Self::local()
    }
}

impl<Z: TimeZone> Normalizer<Z> {
    pub fn new(zone: Z) -> Self {
        Normalizer { zone }
    }

    pub fn zone(&self) -> &Z {
        &self.zone
    }

    /// `Ok(None)` for unset input, `Ok(Some(_))` for exactly one instant,
    /// `Err` for anything malformed. Never falls back to "now" or the epoch.
    pub fn to_canonical_instant(
        &self,
        value: &TemporalValue,
    ) -> Result<Option<CanonicalInstant>, NormalizeError> {
        let shape = classify(value);
        if shape == Shape::Unset {
            return Ok(None);
        }
        let parsed = parsers::parse(shape, value)?;
        self.resolve(shape, value, parsed).map(Some)
    }

    fn resolve(
        &self,
        shape: Shape,
        value: &TemporalValue,
        parsed: Parsed,
    ) -> Result<CanonicalInstant, NormalizeError> {
        match parsed {
            Parsed::Epoch(instant) => Ok(instant),
            Parsed::Absolute(dt) => Ok(dt.with_timezone(&Utc).into()),
            // Overlaps resolve to the earlier instant; gaps have none.
            Parsed::Wall(naive) => self
                .zone
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| CanonicalInstant::from_millis(dt.timestamp_millis()))
                .ok_or_else(|| {
                    NormalizeError::invalid_instant(
                        shape,
                        value.raw(),
                        format!("{naive} does not exist in the configured time zone"),
                    )
                }),
        }
    }

    /// The instant as a datetime in this zone, `None` when out of range.
    pub fn to_zoned(&self, instant: CanonicalInstant) -> Option<DateTime<Z>> {
        self.zone.timestamp_millis_opt(instant.millis()).single()
    }

    /// Renders `instant` in this zone, or returns `fallback` when there is
    /// nothing to render or rendering fails.
    pub fn format_for_display(
        &self,
        instant: Option<CanonicalInstant>,
        pattern: DisplayPattern,
        fallback: &str,
    ) -> String
    where
        Z::Offset: fmt::Display,
    {
        let Some(dt) = instant.and_then(|i| self.to_zoned(i)) else {
            return fallback.to_string();
        };
        let mut out = String::new();
        match write!(out, "{}", dt.format(pattern.format_str())) {
            Ok(()) => out,
            Err(_) => fallback.to_string(),
        }
    }

    /// Moves an instant that falls exactly on local midnight to `at` on the
    /// same local day. Any other instant is returned unchanged, as is a
    /// midnight whose replacement does not exist locally.
    ///
    /// `to_canonical_instant` never does this on its own.
    pub fn default_midnight(&self, instant: CanonicalInstant, at: NaiveTime) -> CanonicalInstant {
        let Some(dt) = self.to_zoned(instant) else {
            return instant;
        };
        let local = dt.naive_local();
        if local.time() != NaiveTime::MIN {
            return instant;
        }
        self.zone
            .from_local_datetime(&local.date().and_time(at))
            .earliest()
            .map(|moved| CanonicalInstant::from_millis(moved.timestamp_millis()))
            .unwrap_or(instant)
    }

    /// List-view order: set before unset, most recent first. Values that
    /// fail to normalize count as unset.
    pub fn compare(&self, a: &TemporalValue, b: &TemporalValue) -> Ordering {
        self.compare_with(a, b, UnsetPlacement::Last)
    }

    pub fn compare_with(
        &self,
        a: &TemporalValue,
        b: &TemporalValue,
        unset: UnsetPlacement,
    ) -> Ordering {
        compare_instants(self.instant_or_unset(a), self.instant_or_unset(b), unset)
    }

    /// Stable sort in `compare` order, normalizing each key once.
    pub fn sort_recent_first<T, F>(&self, items: &mut [T], key: F)
    where
        F: Fn(&T) -> &TemporalValue,
    {
        items.sort_by_cached_key(|item| recent_first_key(self.instant_or_unset(key(item))));
    }

    fn instant_or_unset(&self, value: &TemporalValue) -> Option<CanonicalInstant> {
        self.to_canonical_instant(value).ok().flatten()
    }
}
