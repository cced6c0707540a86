//! Compound secondary-index term encoding (§3, §4.3, GLOSSARY).
//!
//! A compound index term is a `$`-joined composite. This is a wire-level
//! contract the authoritative store sorts lexicographically (§6), so every
//! component must be checked for the reserved `$` delimiter before being
//! joined.

use error_stack::{Report, report};

use crate::error::InvalidTerm;

/// Joins index term components with `$`, rejecting any component that
/// itself contains `$`.
///
/// # Errors
///
/// Returns [`InvalidTerm`] naming the offending component.
pub fn encode_term(components: &[&str]) -> Result<String, Report<InvalidTerm>> {
    for component in components {
        if component.contains('$') {
            return Err(report!(InvalidTerm {
                component: (*component).to_owned(),
            }));
        }
    }
    Ok(components.join("$"))
}

/// Splits a compound term produced by [`encode_term`] back into its
/// components.
#[must_use]
pub fn decode_term(term: &str) -> Vec<&str> {
    term.split('$').collect()
}

/// The `batches` index term for a message associated with `batch_id`.
///
/// # Errors
///
/// Returns [`InvalidTerm`] if `batch_id` contains `$`.
pub fn batches_term(batch_id: &str) -> Result<String, Report<InvalidTerm>> {
    encode_term(&[batch_id])
}

/// The `batches_with_timestamps` index term: `batch_id$timestamp`.
///
/// # Errors
///
/// Returns [`InvalidTerm`] if either component contains `$`.
pub fn batches_with_timestamp_term(batch_id: &str, timestamp: &str) -> Result<String, Report<InvalidTerm>> {
    encode_term(&[batch_id, timestamp])
}

/// The `batches_with_addresses` index term: `batch_id$timestamp$address`.
///
/// # Errors
///
/// Returns [`InvalidTerm`] if any component contains `$`.
pub fn batches_with_address_term(
    batch_id: &str,
    timestamp: &str,
    address: &str,
) -> Result<String, Report<InvalidTerm>> {
    encode_term(&[batch_id, timestamp, address])
}

/// The `message` index term for an event owned by `message_id`.
///
/// # Errors
///
/// Returns [`InvalidTerm`] if `message_id` contains `$`.
pub fn message_term(message_id: &str) -> Result<String, Report<InvalidTerm>> {
    encode_term(&[message_id])
}

/// The `message_with_status` index term: `message_id$timestamp$status`.
///
/// # Errors
///
/// Returns [`InvalidTerm`] if any component contains `$`.
pub fn message_with_status_term(
    message_id: &str,
    timestamp: &str,
    status: &str,
) -> Result<String, Report<InvalidTerm>> {
    encode_term(&[message_id, timestamp, status])
}

/// Computes the `status` encoding for an event's compound index (§3):
/// `event_type` normally, `"delivery_report.<delivery_status>"` for
/// delivery reports.
#[must_use]
pub fn event_status(event_type: &str, delivery_status: Option<&str>) -> String {
    match (event_type, delivery_status) {
        ("delivery_report", Some(status)) => format!("delivery_report.{status}"),
        (event_type, _) => event_type.to_owned(),
    }
}
