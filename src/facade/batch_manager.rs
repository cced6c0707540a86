//! The Batch Manager façade (§4.5).

use std::collections::HashMap;

use error_stack::{Report, report};
use tracing::instrument;

use crate::{
    backend::AuthoritativeBackend,
    cache::{BatchInfoCache, CacheStore},
    error::{CacheInconsistent, StoreUnavailable},
    model::{Batch, CurrentTag},
    object_store::{ObjectStore, Page, RangeItem},
};

/// Fans `batch_start` out to both stores; every other operation but
/// `rebuild_cache` touches only the authoritative backend (§4.5).
#[derive(Clone)]
pub struct BatchManager<S, C> {
    backend: AuthoritativeBackend<S>,
    cache: BatchInfoCache<C>,
}

impl<S: ObjectStore, C: CacheStore> BatchManager<S, C> {
    #[must_use]
    pub fn new(backend: AuthoritativeBackend<S>, cache: BatchInfoCache<C>) -> Self {
        Self { backend, cache }
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    #[instrument(skip(self, metadata))]
    pub async fn batch_start(
        &self,
        tags: Vec<String>,
        metadata: HashMap<String, String>,
    ) -> Result<String, Report<StoreUnavailable>> {
        let batch_id = self.backend.batch_start(tags, metadata).await?;
        self.cache.batch_start(&batch_id).await?;
        Ok(batch_id)
    }

    /// Authoritative-only: does not clear the batch info cache (§4.5, §9).
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn batch_done(&self, batch_id: &str) -> Result<(), Report<StoreUnavailable>> {
        self.backend.batch_done(batch_id).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_batch(&self, batch_id: &str) -> Result<Option<Batch>, Report<StoreUnavailable>> {
        self.backend.get_batch(batch_id).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_tag_info(&self, tag: &str) -> Result<CurrentTag, Report<StoreUnavailable>> {
        self.backend.get_tag_info(tag).await
    }

    /// Rebuilds `batch_id`'s cache state from the authoritative store:
    /// clears it, then replays every inbound/outbound message and every
    /// event belonging to the batch's messages through the bulk adders
    /// (§4.4, §4.5, §9 — there is no batch-scoped event index in this
    /// design, so event reconciliation walks the `message` index of each
    /// of the batch's messages). Finishes with a sanity check comparing
    /// the freshly-rebuilt counters against the backend listings they
    /// were replayed from (§7).
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure, or
    /// [`CacheInconsistent`] if the rebuilt cache counters disagree with
    /// the authoritative listings they were just replayed from.
    #[instrument(skip(self))]
    pub async fn rebuild_cache(&self, batch_id: &str) -> Result<(), Report<StoreUnavailable>> {
        tracing::info!(batch_id = %batch_id, "reconciliation started");
        self.cache.clear_batch(batch_id).await?;
        self.cache.batch_start(batch_id).await?;

        let inbound = Self::collect_all_logged(
            self.backend.list_batch_inbound_keys_with_timestamps(batch_id, None, None, None).await?,
            "inbound",
        )
        .await?;
        for item in &inbound {
            let timestamp = Self::score_from_term(item);
            self.cache.add_inbound_message_key(batch_id, &item.key, timestamp).await?;
        }

        let outbound = Self::collect_all_logged(
            self.backend.list_batch_outbound_keys_with_timestamps(batch_id, None, None, None).await?,
            "outbound",
        )
        .await?;
        for item in &outbound {
            let timestamp = Self::score_from_term(item);
            self.cache.add_outbound_message_key(batch_id, &item.key, timestamp).await?;
        }

        let mut expected_event_count = 0_i64;
        for message in inbound.iter().chain(outbound.iter()) {
            let events = Self::collect_all_logged(
                self.backend.list_message_event_keys_with_statuses(&message.key, None, None, None).await?,
                "events",
            )
            .await?;
            for event in &events {
                let Some(term) = &event.term else { continue };
                let mut parts = term.split('$');
                let (Some(_message_id), Some(timestamp_str), Some(status)) = (parts.next(), parts.next(), parts.next()) else {
                    continue;
                };
                let timestamp = crate::timestamp::Timestamp::parse(timestamp_str).map(crate::timestamp::Timestamp::as_score).unwrap_or(0.0);
                self.cache.add_event_key(batch_id, &event.key, status, timestamp).await?;
                expected_event_count += 1;
            }
        }

        self.check_counters_consistent(batch_id, inbound.len(), outbound.len(), expected_event_count)
            .await?;

        tracing::info!(
            batch_id = %batch_id,
            inbound = inbound.len(),
            outbound = outbound.len(),
            events = expected_event_count,
            "reconciliation finished"
        );
        Ok(())
    }

    /// Drains a [`Page`] like [`Page::collect_all`], but emits a debug
    /// log per page so reconciliation progress is visible on a batch with
    /// many pages.
    async fn collect_all_logged(mut page: Page<S>, listing: &str) -> Result<Vec<RangeItem>, Report<StoreUnavailable>> {
        let mut all = Vec::new();
        loop {
            tracing::debug!(listing, page_items = page.items().len(), "reconciliation consumed a page");
            all.extend(page.items().iter().cloned());
            if !page.has_next() {
                break;
            }
            page = page.next_page().await?;
        }
        Ok(all)
    }

    /// Compares the just-rebuilt cache counters against the backend
    /// listings `rebuild_cache` replayed them from.
    async fn check_counters_consistent(
        &self,
        batch_id: &str,
        expected_inbound: usize,
        expected_outbound: usize,
        expected_events: i64,
    ) -> Result<(), Report<StoreUnavailable>> {
        let expected_inbound = expected_inbound as i64;
        let expected_outbound = expected_outbound as i64;
        let actual_inbound = self.cache.get_inbound_message_count(batch_id).await?;
        let actual_outbound = self.cache.get_outbound_message_count(batch_id).await?;
        let actual_events = self.cache.get_event_count(batch_id).await?;

        if actual_inbound != expected_inbound || actual_outbound != expected_outbound || actual_events != expected_events {
            return Err(report!(CacheInconsistent {
                detail: format!(
                    "batch {batch_id}: backend listed {expected_inbound} inbound/{expected_outbound} \
                     outbound/{expected_events} events, cache counted {actual_inbound}/{actual_outbound}/{actual_events} \
                     after rebuild"
                ),
            })
            .change_context(StoreUnavailable));
        }
        Ok(())
    }

    fn score_from_term(item: &RangeItem) -> f64 {
        item.term
            .as_deref()
            .and_then(|term| term.split('$').nth(1))
            .and_then(|raw| crate::timestamp::Timestamp::parse(raw).ok())
            .map_or(0.0, crate::timestamp::Timestamp::as_score)
    }
}
