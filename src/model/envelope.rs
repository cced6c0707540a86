//! Transport envelopes (GLOSSARY: "Envelope"). The envelope definition
//! itself is supplied by the transport and out of scope (§1); what's
//! modeled here is the thin typed header (id, timestamp, addresses,
//! event type) the store needs to read plus an opaque JSON body for
//! forward compatibility (§9).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::timestamp::Timestamp;

/// An inbound or outbound user message envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub message_id: String,
    pub timestamp: String,
    pub from_addr: Option<String>,
    pub to_addr: Option<String>,
    /// Opaque transport-specific fields, preserved verbatim.
    #[serde(flatten)]
    pub body: Value,
}

impl MessageEnvelope {
    /// Parses the envelope's wire timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp does not match the wire format.
    pub fn parsed_timestamp(&self) -> Result<Timestamp, crate::error::InvalidTerm> {
        Timestamp::parse(&self.timestamp)
    }
}

/// The known event types (§6). `event_type` is otherwise an opaque string
/// on the wire; this enum covers the ones the store gives special
/// treatment to when computing the compound-index status (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Ack,
    Nack,
    DeliveryReport,
}

impl EventType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ack => "ack",
            Self::Nack => "nack",
            Self::DeliveryReport => "delivery_report",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The terminal delivery-report sub-statuses (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    Failed,
    Pending,
}

impl DeliveryStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::Pending => "pending",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A delivery-lifecycle event envelope (ack/nack/delivery report).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: String,
    pub user_message_id: String,
    pub timestamp: String,
    pub event_type: EventType,
    pub delivery_status: Option<DeliveryStatus>,
    #[serde(flatten)]
    pub body: Value,
}

impl EventEnvelope {
    /// Parses the envelope's wire timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp does not match the wire format.
    pub fn parsed_timestamp(&self) -> Result<Timestamp, crate::error::InvalidTerm> {
        Timestamp::parse(&self.timestamp)
    }

    /// The compound-index status encoding for this event (§3): the event
    /// type normally, `"delivery_report.<status>"` for delivery reports.
    #[must_use]
    pub fn status(&self) -> String {
        crate::index::event_status(
            self.event_type.as_str(),
            self.delivery_status.map(DeliveryStatus::as_str),
        )
    }
}
