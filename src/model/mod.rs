//! Record types for the five entities (§3).

pub mod batch;
pub mod envelope;
pub mod event;
pub mod message;

pub use batch::{Batch, CurrentTag};
pub use envelope::{DeliveryStatus, EventEnvelope, EventType, MessageEnvelope};
pub use event::Event;
pub use message::{InboundMessage, OutboundMessage};
