use crate::error::NormalizeError;
use crate::temporal::{CanonicalInstant, ServerTimestamp, Shape};

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_MILLI: i64 = 1_000_000;
const MILLIS_PER_SECOND: i64 = 1_000;

/// 0001-01-01T00:00:00Z, the earliest second the document store accepts.
const MIN_SECONDS: i64 = -62_135_596_800;
/// 9999-12-31T23:59:59Z, the latest.
const MAX_SECONDS: i64 = 253_402_300_799;

/// `seconds * 1000 + floor(nanoseconds / 1e6)`, exact.
pub fn parse_server_timestamp(ts: &ServerTimestamp) -> Result<CanonicalInstant, NormalizeError> {
    if !(0..NANOS_PER_SECOND).contains(&ts.nanoseconds) {
        return Err(out_of_range(ts, "nanoseconds must be in 0..1000000000"));
    }
    if !(MIN_SECONDS..=MAX_SECONDS).contains(&ts.seconds) {
        return Err(NormalizeError::invalid_instant(
            Shape::ServerTimestamp,
            raw(ts),
            "seconds outside 0001-01-01..9999-12-31",
        ));
    }
    Ok(CanonicalInstant::from_millis(
        ts.seconds * MILLIS_PER_SECOND + ts.nanoseconds / NANOS_PER_MILLI,
    ))
}

fn out_of_range(ts: &ServerTimestamp, reason: &str) -> NormalizeError {
    NormalizeError::unparseable(Shape::ServerTimestamp, raw(ts), reason)
}

fn raw(ts: &ServerTimestamp) -> String {
    format!("{{seconds: {}, nanoseconds: {}}}", ts.seconds, ts.nanoseconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(seconds: i64, nanoseconds: i64) -> ServerTimestamp {
        ServerTimestamp { seconds, nanoseconds }
    }

    #[test]
    fn truncates_sub_millisecond_nanos() {
        let got = parse_server_timestamp(&ts(1_760_181_060, 999_999)).unwrap();
        assert_eq!(got.millis(), 1_760_181_060_000);
        let got = parse_server_timestamp(&ts(1_760_181_060, 123_456_789)).unwrap();
        assert_eq!(got.millis(), 1_760_181_060_123);
    }

    #[test]
    fn negative_seconds_before_epoch() {
        let got = parse_server_timestamp(&ts(-1, 500_000_000)).unwrap();
        assert_eq!(got.millis(), -500);
    }

    #[test]
    fn rejects_out_of_range_nanos() {
        assert!(parse_server_timestamp(&ts(0, NANOS_PER_SECOND)).is_err());
        assert!(parse_server_timestamp(&ts(0, -1)).is_err());
    }

    #[test]
    fn rejects_overflow() {
        let err = parse_server_timestamp(&ts(i64::MAX, 0)).unwrap_err();
        assert_eq!(err.shape(), Shape::ServerTimestamp);
    }

    #[test]
    fn rejects_seconds_past_the_calendar() {
        for seconds in [10_000_000_000_000, MAX_SECONDS + 1, MIN_SECONDS - 1] {
            let err = parse_server_timestamp(&ts(seconds, 0)).unwrap_err();
            assert!(matches!(err, NormalizeError::InvalidInstant { .. }));
        }
    }

    #[test]
    fn calendar_bounds_are_real_moments() {
        let last = parse_server_timestamp(&ts(MAX_SECONDS, 999_999_999)).unwrap();
        assert_eq!(last.to_utc().unwrap().to_rfc3339(), "9999-12-31T23:59:59.999+00:00");
        let first = parse_server_timestamp(&ts(MIN_SECONDS, 0)).unwrap();
        assert_eq!(first.to_utc().unwrap().to_rfc3339(), "0001-01-01T00:00:00+00:00");
    }
}
