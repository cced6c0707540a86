//! `Event` record (§3).

use serde::{Deserialize, Serialize};

use crate::{model::envelope::EventEnvelope, version::Versioned};

pub const EVENT_VERSION: u32 = 1;

/// A stored delivery-lifecycle event: its envelope plus the owning
/// outbound message id (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "$VERSION")]
    pub version: u32,
    pub event: EventEnvelope,
    /// Foreign key to the owning [`OutboundMessage`](crate::model::OutboundMessage),
    /// set from `event.user_message_id` (§4.3).
    pub message: String,
}

impl Event {
    #[must_use]
    pub fn new(event: EventEnvelope) -> Self {
        let message = event.user_message_id.clone();
        Self {
            version: EVENT_VERSION,
            event,
            message,
        }
    }
}

impl Versioned for Event {
    fn current_version() -> u32 {
        EVENT_VERSION
    }
}
