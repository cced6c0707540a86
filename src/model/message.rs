//! `InboundMessage` and `OutboundMessage` records (§3).
//!
//! These are deliberately independent structs rather than one generic
//! `Message<Direction>` type — per §9, the source's class inheritance is
//! "a coincidence of its object system", and here the two directions
//! differ only in which address field feeds the compound indexes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{model::envelope::MessageEnvelope, version::Versioned};

pub const INBOUND_MESSAGE_VERSION: u32 = 3;
pub const OUTBOUND_MESSAGE_VERSION: u32 = 3;

/// A stored inbound message: its envelope plus the set of batches it has
/// been associated with (§3, §4.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "$VERSION")]
    pub version: u32,
    pub msg: MessageEnvelope,
    pub batches: BTreeSet<String>,
}

impl InboundMessage {
    #[must_use]
    pub fn new(msg: MessageEnvelope) -> Self {
        Self {
            version: INBOUND_MESSAGE_VERSION,
            msg,
            batches: BTreeSet::new(),
        }
    }

    /// The address fed into the `batches_with_addresses` index: `from_addr`
    /// for inbound messages (§3).
    #[must_use]
    pub fn index_address(&self) -> Option<&str> {
        self.msg.from_addr.as_deref()
    }
}

impl Versioned for InboundMessage {
    fn current_version() -> u32 {
        INBOUND_MESSAGE_VERSION
    }
}

/// A stored outbound message: its envelope plus the set of batches it has
/// been associated with (§3, §4.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(rename = "$VERSION")]
    pub version: u32,
    pub msg: MessageEnvelope,
    pub batches: BTreeSet<String>,
}

impl OutboundMessage {
    #[must_use]
    pub fn new(msg: MessageEnvelope) -> Self {
        Self {
            version: OUTBOUND_MESSAGE_VERSION,
            msg,
            batches: BTreeSet::new(),
        }
    }

    /// The address fed into the `batches_with_addresses` index: `to_addr`
    /// for outbound messages (§3).
    #[must_use]
    pub fn index_address(&self) -> Option<&str> {
        self.msg.to_addr.as_deref()
    }
}

impl Versioned for OutboundMessage {
    fn current_version() -> u32 {
        OUTBOUND_MESSAGE_VERSION
    }
}
