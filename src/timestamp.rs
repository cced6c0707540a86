//! Lexicographically sortable timestamp encoding.
//!
//! Compound index terms are `$`-joined strings compared byte-for-byte by
//! the authoritative store (§6), so the timestamp component must sort the
//! same way whether compared as text or as a point in time. A fixed-width
//! `YYYY-MM-DD HH:MM:SS.mmm` representation (the platform's standard
//! envelope date format) has that property as long as every value is
//! zero-padded to the same width.

use time::{OffsetDateTime, PrimitiveDateTime, format_description::FormatItem, macros::format_description};

use crate::error::InvalidTerm;

/// Matches the wire format used by transport envelopes:
/// `2014-01-01 00:00:00.000`.
const WIRE_FORMAT: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");

/// The maximum suffix appended to a timestamp to build an inclusive upper
/// bound for a range query, per §4.3 ("or equivalent maximum suffix").
pub(crate) const MAX_TIMESTAMP_SUFFIX: char = '\u{FFFF}';

/// A message/event timestamp, stored as a fixed-width wire string and
/// convertible to a `f64` seconds-since-epoch score for the cache's
/// recency sorted sets (§3, §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(PrimitiveDateTime);

impl Timestamp {
    /// Parses the wire representation of a timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTerm`] if `raw` does not match the wire format, or
    /// contains the reserved `$` delimiter.
    pub fn parse(raw: &str) -> Result<Self, InvalidTerm> {
        if raw.contains('$') {
            return Err(InvalidTerm {
                component: raw.to_owned(),
            });
        }
        PrimitiveDateTime::parse(raw, WIRE_FORMAT)
            .map(Self)
            .map_err(|_err| InvalidTerm {
                component: raw.to_owned(),
            })
    }

    /// Renders the fixed-width, lexicographically sortable wire format.
    #[must_use]
    pub fn to_wire_string(self) -> String {
        self.0
            .format(WIRE_FORMAT)
            .expect("a parsed timestamp always re-formats")
    }

    /// The score used by the cache's recency sorted sets: seconds since
    /// the Unix epoch, as a floating-point value (§3).
    #[must_use]
    pub fn as_score(self) -> f64 {
        let odt: OffsetDateTime = self.0.assume_utc();
        odt.unix_timestamp() as f64 + f64::from(odt.millisecond()) / 1000.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_wire_string())
    }
}
