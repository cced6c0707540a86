//! The Operational façade (§4.5).

use error_stack::Report;
use tracing::instrument;

use crate::{
    backend::AuthoritativeBackend,
    cache::{BatchInfoCache, CacheStore},
    error::StoreUnavailable,
    model::{CurrentTag, EventEnvelope, MessageEnvelope},
    object_store::ObjectStore,
};

/// Writes authoritative first, then fans out to the cache for each
/// associated batch (§4.5, §5 — the authoritative write always
/// completes before any cache fan-out begins).
#[derive(Clone)]
pub struct Operational<S, C> {
    backend: AuthoritativeBackend<S>,
    cache: BatchInfoCache<C>,
}

impl<S: ObjectStore, C: CacheStore> Operational<S, C> {
    #[must_use]
    pub fn new(backend: AuthoritativeBackend<S>, cache: BatchInfoCache<C>) -> Self {
        Self { backend, cache }
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    #[instrument(skip(self, msg))]
    pub async fn add_inbound_message(&self, msg: MessageEnvelope, batch_ids: &[String]) -> Result<(), Report<StoreUnavailable>> {
        self.backend.add_inbound_message(msg.clone(), batch_ids).await?;
        for batch_id in batch_ids {
            if let Err(error) = self.cache.add_inbound_message(batch_id, &msg).await {
                tracing::warn!(batch_id = %batch_id, message_id = %msg.message_id, error = %error, "cache fan-out failed for inbound message; authoritative write already durable");
                return Err(error);
            }
        }
        Ok(())
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_inbound_message(&self, message_id: &str) -> Result<Option<MessageEnvelope>, Report<StoreUnavailable>> {
        self.backend.get_inbound_message(message_id).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    #[instrument(skip(self, msg))]
    pub async fn add_outbound_message(&self, msg: MessageEnvelope, batch_ids: &[String]) -> Result<(), Report<StoreUnavailable>> {
        self.backend.add_outbound_message(msg.clone(), batch_ids).await?;
        for batch_id in batch_ids {
            if let Err(error) = self.cache.add_outbound_message(batch_id, &msg).await {
                tracing::warn!(batch_id = %batch_id, message_id = %msg.message_id, error = %error, "cache fan-out failed for outbound message; authoritative write already durable");
                return Err(error);
            }
        }
        Ok(())
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_outbound_message(&self, message_id: &str) -> Result<Option<MessageEnvelope>, Report<StoreUnavailable>> {
        self.backend.get_outbound_message(message_id).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    #[instrument(skip(self, event))]
    pub async fn add_event(&self, event: EventEnvelope, batch_ids: &[String]) -> Result<(), Report<StoreUnavailable>> {
        self.backend.add_event(event.clone()).await?;
        for batch_id in batch_ids {
            if let Err(error) = self.cache.add_event(batch_id, &event).await {
                tracing::warn!(batch_id = %batch_id, event_id = %event.event_id, error = %error, "cache fan-out failed for event; authoritative write already durable");
                return Err(error);
            }
        }
        Ok(())
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_event(&self, event_id: &str) -> Result<Option<EventEnvelope>, Report<StoreUnavailable>> {
        self.backend.get_event(event_id).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_tag_info(&self, tag: &str) -> Result<CurrentTag, Report<StoreUnavailable>> {
        self.backend.get_tag_info(tag).await
    }
}
