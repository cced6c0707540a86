//! The Batch Info Cache (§4.4).
//!
//! Grounded on `examples/original_source/vumi_message_store/batch_info_cache.py`:
//! the same key-naming scheme (`:`-joined segments rooted at `"batches"`),
//! the same counter/status-histogram/recency-set shape, and the same
//! "increment only on first-time insertion into the recency set" rule
//! that makes writes idempotent under duplicate delivery (§5, §8 property 6).

use error_stack::Report;
use tracing::instrument;

use crate::{cache::CacheStore, error::StoreUnavailable, model::{EventEnvelope, MessageEnvelope}};

/// The recency sorted sets' default cap, `T` in §3/§4.4.
pub const DEFAULT_RECENCY_LIMIT: usize = 2000;

const BATCH_KEY: &str = "batches";
const OUTBOUND_KEY: &str = "outbound";
const OUTBOUND_COUNT_KEY: &str = "outbound_count";
const INBOUND_KEY: &str = "inbound";
const INBOUND_COUNT_KEY: &str = "inbound_count";
const EVENT_KEY: &str = "event";
const EVENT_COUNT_KEY: &str = "event_count";
const STATUS_KEY: &str = "status";

/// The status entries `batch_start` seeds via `hset_nx`, so a fresh
/// batch's histogram always answers with `0` rather than a missing key
/// (§4.4). Pulled from the transport's known event types plus the three
/// terminal delivery-report sub-statuses and the synthetic `sent` status
/// (§6, [SUPPLEMENT] in `SPEC_FULL.md`).
const SEEDED_STATUSES: &[&str] = &[
    "ack",
    "nack",
    "delivery_report.delivered",
    "delivery_report.failed",
    "delivery_report.pending",
    "sent",
];

/// Redis-based (or equivalent) cache for assorted batch-related
/// information that is expensive to recompute from the authoritative
/// store but useful to have low-latency access to (§4.4).
#[derive(Clone)]
pub struct BatchInfoCache<C> {
    cache: C,
    recency_limit: usize,
}

impl<C: CacheStore> BatchInfoCache<C> {
    #[must_use]
    pub fn new(cache: C) -> Self {
        Self::with_recency_limit(cache, DEFAULT_RECENCY_LIMIT)
    }

    #[must_use]
    pub fn with_recency_limit(cache: C, recency_limit: usize) -> Self {
        Self { cache, recency_limit }
    }

    fn key(&self, segments: &[&str]) -> String {
        std::iter::once(BATCH_KEY)
            .chain(segments.iter().copied())
            .collect::<Vec<_>>()
            .join(":")
    }

    fn outbound_key(&self, batch_id: &str) -> String {
        self.key(&[OUTBOUND_KEY, batch_id])
    }

    fn outbound_count_key(&self, batch_id: &str) -> String {
        self.key(&[OUTBOUND_COUNT_KEY, batch_id])
    }

    fn inbound_key(&self, batch_id: &str) -> String {
        self.key(&[INBOUND_KEY, batch_id])
    }

    fn inbound_count_key(&self, batch_id: &str) -> String {
        self.key(&[INBOUND_COUNT_KEY, batch_id])
    }

    fn event_key(&self, batch_id: &str) -> String {
        self.key(&[EVENT_KEY, batch_id])
    }

    fn event_count_key(&self, batch_id: &str) -> String {
        self.key(&[EVENT_COUNT_KEY, batch_id])
    }

    fn status_key(&self, batch_id: &str) -> String {
        self.key(&[STATUS_KEY, batch_id])
    }

    fn known_batches_key(&self) -> String {
        self.key(&[])
    }

    async fn truncate(&self, zset_key: &str) -> Result<i64, Report<StoreUnavailable>> {
        let limit = i64::try_from(self.recency_limit).unwrap_or(i64::MAX);
        self.cache.zremrangebyrank(zset_key, 0, -limit - 1).await
    }

    /// Creates the counter keys and status hash for a batch and adds the
    /// batch id to the set of known batches. Idempotent — safe to call
    /// more than once, as a call "isn't strictly necessary, but is good
    /// for general housekeeping".
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    #[instrument(skip(self))]
    pub async fn batch_start(&self, batch_id: &str) -> Result<(), Report<StoreUnavailable>> {
        self.cache.sadd(&self.known_batches_key(), batch_id).await?;
        self.cache.set(&self.inbound_count_key(batch_id), "0").await?;
        self.cache.set(&self.outbound_count_key(batch_id), "0").await?;
        self.cache.set(&self.event_count_key(batch_id), "0").await?;
        let status_key = self.status_key(batch_id);
        for status in SEEDED_STATUSES {
            self.cache.hset_nx(&status_key, status, "0").await?;
        }
        Ok(())
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn batch_exists(&self, batch_id: &str) -> Result<bool, Report<StoreUnavailable>> {
        self.cache.sismember(&self.known_batches_key(), batch_id).await
    }

    /// Removes all cached values for `batch_id`. Useful before
    /// reconciliation so counters start from scratch (§4.4, §9 — note
    /// that `batch_done` does *not* call this; callers rebuild
    /// explicitly).
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    #[instrument(skip(self))]
    pub async fn clear_batch(&self, batch_id: &str) -> Result<(), Report<StoreUnavailable>> {
        self.cache.delete(&self.inbound_key(batch_id)).await?;
        self.cache.delete(&self.inbound_count_key(batch_id)).await?;
        self.cache.delete(&self.outbound_key(batch_id)).await?;
        self.cache.delete(&self.outbound_count_key(batch_id)).await?;
        self.cache.delete(&self.event_key(batch_id)).await?;
        self.cache.delete(&self.event_count_key(batch_id)).await?;
        self.cache.delete(&self.status_key(batch_id)).await?;
        self.cache.srem(&self.known_batches_key(), batch_id).await?;
        Ok(())
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    #[instrument(skip(self, msg))]
    pub async fn add_inbound_message(&self, batch_id: &str, msg: &MessageEnvelope) -> Result<(), Report<StoreUnavailable>> {
        let timestamp = msg
            .parsed_timestamp()
            .map_or(0.0, crate::timestamp::Timestamp::as_score);
        self.add_inbound_message_key(batch_id, &msg.message_id, timestamp).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn add_inbound_message_key(
        &self,
        batch_id: &str,
        message_key: &str,
        timestamp: f64,
    ) -> Result<(), Report<StoreUnavailable>> {
        let new_entry = self.cache.zadd(&self.inbound_key(batch_id), message_key, timestamp).await?;
        if new_entry {
            self.cache.incr_by(&self.inbound_count_key(batch_id), 1).await?;
            self.truncate(&self.inbound_key(batch_id)).await?;
        }
        Ok(())
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    #[instrument(skip(self, msg))]
    pub async fn add_outbound_message(&self, batch_id: &str, msg: &MessageEnvelope) -> Result<(), Report<StoreUnavailable>> {
        let timestamp = msg
            .parsed_timestamp()
            .map_or(0.0, crate::timestamp::Timestamp::as_score);
        self.add_outbound_message_key(batch_id, &msg.message_id, timestamp).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn add_outbound_message_key(
        &self,
        batch_id: &str,
        message_key: &str,
        timestamp: f64,
    ) -> Result<(), Report<StoreUnavailable>> {
        let new_entry = self.cache.zadd(&self.outbound_key(batch_id), message_key, timestamp).await?;
        if new_entry {
            self.increment_event_status(batch_id, "sent", 1).await?;
            self.cache.incr_by(&self.outbound_count_key(batch_id), 1).await?;
            self.truncate(&self.outbound_key(batch_id)).await?;
        }
        Ok(())
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    #[instrument(skip(self, event))]
    pub async fn add_event(&self, batch_id: &str, event: &EventEnvelope) -> Result<(), Report<StoreUnavailable>> {
        let timestamp = event
            .parsed_timestamp()
            .map_or(0.0, crate::timestamp::Timestamp::as_score);
        self.add_event_key(batch_id, &event.event_id, &event.status(), timestamp).await
    }

    /// Adds the event key to the set of known event keys. `event_type`
    /// should already include the delivery status for delivery reports
    /// (e.g. `"delivery_report.delivered"`).
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn add_event_key(
        &self,
        batch_id: &str,
        event_key: &str,
        event_type: &str,
        timestamp: f64,
    ) -> Result<(), Report<StoreUnavailable>> {
        let new_entry = self.cache.zadd(&self.event_key(batch_id), event_key, timestamp).await?;
        if new_entry {
            self.cache.incr_by(&self.event_count_key(batch_id), 1).await?;
            self.truncate(&self.event_key(batch_id)).await?;
            self.increment_event_status(batch_id, event_type, 1).await?;
        }
        Ok(())
    }

    /// Increments the histogram for `event_type`, additionally rolling up
    /// into the `delivery_report` bucket when `event_type` is a
    /// `"delivery_report.<status>"` variant (§3, §4.4, §8 property 8).
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn increment_event_status(
        &self,
        batch_id: &str,
        event_type: &str,
        count: i64,
    ) -> Result<(), Report<StoreUnavailable>> {
        let status_key = self.status_key(batch_id);
        self.cache.hincr_by(&status_key, event_type, count).await?;
        if event_type.starts_with("delivery_report.") {
            self.cache.hincr_by(&status_key, "delivery_report", count).await?;
        }
        Ok(())
    }

    /// Bulk counter adder used by reconciliation.
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn add_inbound_message_count(&self, batch_id: &str, count: i64) -> Result<(), Report<StoreUnavailable>> {
        self.cache.incr_by(&self.inbound_count_key(batch_id), count).await?;
        Ok(())
    }

    /// Bulk counter adder used by reconciliation.
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn add_outbound_message_count(&self, batch_id: &str, count: i64) -> Result<(), Report<StoreUnavailable>> {
        self.increment_event_status(batch_id, "sent", count).await?;
        self.cache.incr_by(&self.outbound_count_key(batch_id), count).await?;
        Ok(())
    }

    /// Bulk counter adder used by reconciliation.
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn add_event_count(&self, batch_id: &str, status: &str, count: i64) -> Result<(), Report<StoreUnavailable>> {
        self.increment_event_status(batch_id, status, count).await?;
        self.cache.incr_by(&self.event_count_key(batch_id), count).await?;
        Ok(())
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_batch_status(&self, batch_id: &str) -> Result<std::collections::HashMap<String, i64>, Report<StoreUnavailable>> {
        let stats = self.cache.hgetall(&self.status_key(batch_id)).await?;
        Ok(stats
            .into_iter()
            .map(|(status, value)| (status, value.parse().unwrap_or(0)))
            .collect())
    }

    /// The recent inbound message keys, most recent first.
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn list_inbound_message_keys(&self, batch_id: &str) -> Result<Vec<String>, Report<StoreUnavailable>> {
        self.ranked_keys(&self.inbound_key(batch_id)).await
    }

    /// The recent outbound message keys, most recent first.
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn list_outbound_message_keys(&self, batch_id: &str) -> Result<Vec<String>, Report<StoreUnavailable>> {
        self.ranked_keys(&self.outbound_key(batch_id)).await
    }

    /// The recent event keys, most recent first.
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn list_event_keys(&self, batch_id: &str) -> Result<Vec<String>, Report<StoreUnavailable>> {
        self.ranked_keys(&self.event_key(batch_id)).await
    }

    async fn ranked_keys(&self, zset_key: &str) -> Result<Vec<String>, Report<StoreUnavailable>> {
        let entries = self.cache.zrange(zset_key, 0, -1, true).await?;
        Ok(entries.into_iter().map(|(member, _score)| member).collect())
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_inbound_message_count(&self, batch_id: &str) -> Result<i64, Report<StoreUnavailable>> {
        self.counter_value(&self.inbound_count_key(batch_id)).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_outbound_message_count(&self, batch_id: &str) -> Result<i64, Report<StoreUnavailable>> {
        self.counter_value(&self.outbound_count_key(batch_id)).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_event_count(&self, batch_id: &str) -> Result<i64, Report<StoreUnavailable>> {
        self.counter_value(&self.event_count_key(batch_id)).await
    }

    async fn counter_value(&self, key: &str) -> Result<i64, Report<StoreUnavailable>> {
        Ok(self.cache.get(key).await?.and_then(|value| value.parse().ok()).unwrap_or(0))
    }
}
