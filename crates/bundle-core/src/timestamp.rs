//! RFC 3339 UTC timestamp helpers.
//!
//! Spec §4.1 requires "timestamps as RFC 3339 UTC with no offset
//! abbreviation". We always format through `time::OffsetDateTime` after
//! forcing the offset to UTC, so `+00:00` (never `Z`-less or
//! locale-dependent forms) is the only representation that ever reaches
//! the canonical encoder.

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::errors::{BundleError, BundleResult};

/// Format an `OffsetDateTime` as canonical RFC 3339 UTC.
pub fn to_rfc3339_utc(dt: OffsetDateTime) -> BundleResult<String> {
    let utc = dt.to_offset(time::UtcOffset::UTC);
    utc.format(&Rfc3339)
        .map_err(|e| BundleError::validation(format!("timestamp format: {e}")))
}

/// Parse an RFC 3339 timestamp string, normalizing it to UTC.
pub fn parse_rfc3339(s: &str) -> BundleResult<OffsetDateTime> {
    let dt = OffsetDateTime::parse(s, &Rfc3339)
        .map_err(|e| BundleError::validation(format!("invalid RFC 3339 timestamp {s:?}: {e}")))?;
    Ok(dt.to_offset(time::UtcOffset::UTC))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn formats_without_offset_abbreviation() {
        let dt = datetime!(2026-07-26 12:00:00 UTC);
        let s = to_rfc3339_utc(dt).unwrap();
        assert!(s.ends_with("Z") || s.ends_with("+00:00"));
    }

    #[test]
    fn round_trips() {
        let dt = datetime!(2026-07-26 12:00:00 UTC);
        let s = to_rfc3339_utc(dt).unwrap();
        let parsed = parse_rfc3339(&s).unwrap();
        assert_eq!(parsed, dt);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_rfc3339("not-a-timestamp").is_err());
    }
}
