//! The Query façade (§4.5).

use std::collections::HashMap;

use error_stack::Report;

use crate::{
    backend::AuthoritativeBackend,
    cache::{BatchInfoCache, CacheStore},
    error::StoreUnavailable,
    model::{EventEnvelope, MessageEnvelope},
    object_store::{ObjectStore, Page},
    timestamp::Timestamp,
};

/// Single-record getters and paginated listings delegate to the
/// authoritative backend; counter and status reads delegate to the cache
/// (§4.5).
#[derive(Clone)]
pub struct Query<S, C> {
    backend: AuthoritativeBackend<S>,
    cache: BatchInfoCache<C>,
}

impl<S: ObjectStore, C: CacheStore> Query<S, C> {
    #[must_use]
    pub fn new(backend: AuthoritativeBackend<S>, cache: BatchInfoCache<C>) -> Self {
        Self { backend, cache }
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_inbound_message(&self, message_id: &str) -> Result<Option<MessageEnvelope>, Report<StoreUnavailable>> {
        self.backend.get_inbound_message(message_id).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_outbound_message(&self, message_id: &str) -> Result<Option<MessageEnvelope>, Report<StoreUnavailable>> {
        self.backend.get_outbound_message(message_id).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_event(&self, event_id: &str) -> Result<Option<EventEnvelope>, Report<StoreUnavailable>> {
        self.backend.get_event(event_id).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn list_batch_inbound_keys(&self, batch_id: &str, max_results: Option<usize>) -> Result<Page<S>, Report<StoreUnavailable>> {
        self.backend.list_batch_inbound_keys(batch_id, max_results).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn list_batch_outbound_keys(&self, batch_id: &str, max_results: Option<usize>) -> Result<Page<S>, Report<StoreUnavailable>> {
        self.backend.list_batch_outbound_keys(batch_id, max_results).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn list_message_event_keys(&self, message_id: &str, max_results: Option<usize>) -> Result<Page<S>, Report<StoreUnavailable>> {
        self.backend.list_message_event_keys(message_id, max_results).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn list_batch_inbound_keys_with_timestamps(
        &self,
        batch_id: &str,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        max_results: Option<usize>,
    ) -> Result<Page<S>, Report<StoreUnavailable>> {
        self.backend
            .list_batch_inbound_keys_with_timestamps(batch_id, start, end, max_results)
            .await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn list_batch_outbound_keys_with_timestamps(
        &self,
        batch_id: &str,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        max_results: Option<usize>,
    ) -> Result<Page<S>, Report<StoreUnavailable>> {
        self.backend
            .list_batch_outbound_keys_with_timestamps(batch_id, start, end, max_results)
            .await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn list_batch_inbound_keys_with_addresses(
        &self,
        batch_id: &str,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        max_results: Option<usize>,
    ) -> Result<Page<S>, Report<StoreUnavailable>> {
        self.backend
            .list_batch_inbound_keys_with_addresses(batch_id, start, end, max_results)
            .await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn list_batch_outbound_keys_with_addresses(
        &self,
        batch_id: &str,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        max_results: Option<usize>,
    ) -> Result<Page<S>, Report<StoreUnavailable>> {
        self.backend
            .list_batch_outbound_keys_with_addresses(batch_id, start, end, max_results)
            .await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn list_message_event_keys_with_statuses(
        &self,
        message_id: &str,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        max_results: Option<usize>,
    ) -> Result<Page<S>, Report<StoreUnavailable>> {
        self.backend
            .list_message_event_keys_with_statuses(message_id, start, end, max_results)
            .await
    }

    /// Recent inbound message keys for `batch_id`, most recent first
    /// (§4.4).
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn list_recent_inbound_message_keys(&self, batch_id: &str) -> Result<Vec<String>, Report<StoreUnavailable>> {
        self.cache.list_inbound_message_keys(batch_id).await
    }

    /// Recent outbound message keys for `batch_id`, most recent first
    /// (§4.4).
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn list_recent_outbound_message_keys(&self, batch_id: &str) -> Result<Vec<String>, Report<StoreUnavailable>> {
        self.cache.list_outbound_message_keys(batch_id).await
    }

    /// Recent event keys for `batch_id`, most recent first (§4.4).
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn list_recent_event_keys(&self, batch_id: &str) -> Result<Vec<String>, Report<StoreUnavailable>> {
        self.cache.list_event_keys(batch_id).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_batch_status(&self, batch_id: &str) -> Result<HashMap<String, i64>, Report<StoreUnavailable>> {
        self.cache.get_batch_status(batch_id).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_batch_inbound_count(&self, batch_id: &str) -> Result<i64, Report<StoreUnavailable>> {
        self.cache.get_inbound_message_count(batch_id).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_batch_outbound_count(&self, batch_id: &str) -> Result<i64, Report<StoreUnavailable>> {
        self.cache.get_outbound_message_count(batch_id).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_batch_event_count(&self, batch_id: &str) -> Result<i64, Report<StoreUnavailable>> {
        self.cache.get_event_count(batch_id).await
    }
}
