pub mod compact;
pub mod generic;
pub mod iso;
pub mod server_timestamp;

use crate::error::NormalizeError;
use crate::temporal::{CanonicalInstant, Shape, TemporalValue};
use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// What a shape parser produced, before any time zone is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parsed {
    /// Already an absolute instant.
    Epoch(CanonicalInstant),
    /// Text carrying its own offset.
    Absolute(DateTime<FixedOffset>),
    /// Local wall-clock time; the caller resolves it in its zone.
    Wall(NaiveDateTime),
}

/// Runs the parser for `shape` over `value`. `shape` must come from
/// classifying the same value; a mismatch is reported as unparseable.
pub fn parse(shape: Shape, value: &TemporalValue) -> Result<Parsed, NormalizeError> {
    match (shape, value) {
        (Shape::ServerTimestamp, TemporalValue::ServerTimestamp(ts)) => {
            server_timestamp::parse_server_timestamp(ts).map(Parsed::Epoch)
        }
        (Shape::Native, TemporalValue::Native(dt)) => Ok(Parsed::Epoch((*dt).into())),
        (Shape::Compact, TemporalValue::Text(s)) => compact::parse_compact(s.trim()).map(Parsed::Wall),
        (Shape::IsoLike, TemporalValue::Text(s)) => iso::parse_iso_like(s.trim()).map(Parsed::Wall),
        (Shape::Generic, TemporalValue::Text(s)) => generic::parse_generic(s.trim())
            .ok_or_else(|| NormalizeError::unparseable(shape, s.as_str(), "no known date format")),
        (Shape::Unrecognized, _) => Err(NormalizeError::unparseable(
            shape,
            value.raw(),
            "no known date format",
        )),
        (shape, value) => Err(NormalizeError::unparseable(
            shape,
            value.raw(),
            format!("value does not have the {shape} shape"),
        )),
    }
}
