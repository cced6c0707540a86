//! The Authoritative Backend (§4.3).
//!
//! Grounded on `examples/original_source/vumi_message_store/riak_backend.py`:
//! the same load-or-create-then-union write shape for messages, the same
//! recompute-every-index-from-scratch rule before persisting, and the
//! same bucket/index naming. Listing signatures follow the table in §4.3.

use std::collections::{BTreeSet, HashMap};

use error_stack::{Report, ResultExt};
use tracing::instrument;

use crate::{
    error::StoreUnavailable,
    ids::BatchId,
    index,
    model::{Batch, CurrentTag, Event, EventEnvelope, InboundMessage, MessageEnvelope, OutboundMessage},
    object_store::{IndexEntry, ObjectStore, Page, RangeQuery},
    timestamp::{MAX_TIMESTAMP_SUFFIX, Timestamp},
    version::Versioned,
};

/// The Python Riak client's own default, carried over verbatim (§4.3).
pub const DEFAULT_MAX_RESULTS: usize = 1000;

const BATCH_BUCKET: &str = "batches";
const CURRENT_TAG_BUCKET: &str = "current_tags";
const INBOUND_BUCKET: &str = "inbound_messages";
const OUTBOUND_BUCKET: &str = "outbound_messages";
const EVENT_BUCKET: &str = "events";

const BATCHES_INDEX: &str = "batches";
const BATCHES_WITH_TIMESTAMPS_INDEX: &str = "batches_with_timestamps";
const BATCHES_WITH_ADDRESSES_INDEX: &str = "batches_with_addresses";
const MESSAGE_INDEX: &str = "message";
const MESSAGE_WITH_STATUS_INDEX: &str = "message_with_status";

fn encode_json<T: serde::Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("model types always serialize")
}

fn decode_json<T: Versioned>(bytes: &[u8]) -> T {
    T::decode(bytes).expect("stored payload always migrates onto its current model type")
}

/// Domain operations on the five entities, generic over the [`ObjectStore`]
/// a deployment wires in.
#[derive(Clone)]
pub struct AuthoritativeBackend<S> {
    store: S,
    default_max_results: usize,
}

impl<S: ObjectStore> AuthoritativeBackend<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_page_config(store, DEFAULT_MAX_RESULTS)
    }

    #[must_use]
    pub fn with_page_config(store: S, default_max_results: usize) -> Self {
        Self { store, default_max_results }
    }

    /// Creates a new batch and points each tag's [`CurrentTag`] at it.
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    #[instrument(skip(self, metadata))]
    pub async fn batch_start(
        &self,
        tags: Vec<String>,
        metadata: HashMap<String, String>,
    ) -> Result<String, Report<StoreUnavailable>> {
        let batch_id = BatchId::generate();
        let batch = Batch::new(batch_id, tags.clone(), metadata);
        self.store
            .put(
                BATCH_BUCKET,
                &batch.batch_id,
                "application/json",
                encode_json(&batch),
                Vec::new(),
            )
            .await?;

        for tag in &tags {
            let mut tag_record = match self.store.get(CURRENT_TAG_BUCKET, tag).await? {
                Some(object) => decode_json(&object.payload),
                None => CurrentTag::new(tag.clone()),
            };
            tag_record.current_batch = Some(batch.batch_id.clone());
            self.store
                .put(
                    CURRENT_TAG_BUCKET,
                    tag,
                    "application/json",
                    encode_json(&tag_record),
                    Vec::new(),
                )
                .await?;
        }

        Ok(batch.batch_id)
    }

    /// Clears `current_batch` on every tag that currently points at
    /// `batch_id`. The Batch object and indexed messages are untouched
    /// (§4.3).
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    #[instrument(skip(self))]
    pub async fn batch_done(&self, batch_id: &str) -> Result<(), Report<StoreUnavailable>> {
        let Some(batch) = self.get_batch(batch_id).await? else {
            return Ok(());
        };
        for tag in &batch.tags {
            let Some(object) = self.store.get(CURRENT_TAG_BUCKET, tag).await? else {
                continue;
            };
            let mut tag_record: CurrentTag = decode_json(&object.payload);
            if tag_record.current_batch.as_deref() == Some(batch_id) {
                tag_record.current_batch = None;
                self.store
                    .put(
                        CURRENT_TAG_BUCKET,
                        tag,
                        "application/json",
                        encode_json(&tag_record),
                        Vec::new(),
                    )
                    .await?;
            }
        }
        Ok(())
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_batch(&self, batch_id: &str) -> Result<Option<Batch>, Report<StoreUnavailable>> {
        Ok(self.store.get(BATCH_BUCKET, batch_id).await?.map(|object| decode_json(&object.payload)))
    }

    /// Returns the tag's [`CurrentTag`], creating one in memory (never
    /// persisted) if none is on record yet (§4.3, §9).
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_tag_info(&self, tag: &str) -> Result<CurrentTag, Report<StoreUnavailable>> {
        match self.store.get(CURRENT_TAG_BUCKET, tag).await? {
            Some(object) => Ok(decode_json(&object.payload)),
            None => Ok(CurrentTag::new(tag.to_owned())),
        }
    }

    async fn upsert_message_batches<T>(
        &self,
        bucket: &str,
        message_id: &str,
        batches: BTreeSet<String>,
        prior_batches: impl FnOnce(T) -> BTreeSet<String>,
    ) -> Result<BTreeSet<String>, Report<StoreUnavailable>>
    where
        T: Versioned,
    {
        let existing = self.store.get(bucket, message_id).await?;
        let mut associated = batches;
        if let Some(object) = existing {
            let prior: T = decode_json(&object.payload);
            associated.extend(prior_batches(prior));
        }
        Ok(associated)
    }

    fn message_indexes(
        batches: &BTreeSet<String>,
        timestamp: &str,
        address: Option<&str>,
    ) -> Result<Vec<IndexEntry>, Report<crate::error::InvalidTerm>> {
        let mut entries = Vec::with_capacity(batches.len() * 3);
        for batch_id in batches {
            entries.push(IndexEntry {
                name: BATCHES_INDEX.to_owned(),
                term: index::batches_term(batch_id)?,
            });
            entries.push(IndexEntry {
                name: BATCHES_WITH_TIMESTAMPS_INDEX.to_owned(),
                term: index::batches_with_timestamp_term(batch_id, timestamp)?,
            });
            if let Some(address) = address {
                entries.push(IndexEntry {
                    name: BATCHES_WITH_ADDRESSES_INDEX.to_owned(),
                    term: index::batches_with_address_term(batch_id, timestamp, address)?,
                });
            }
        }
        Ok(entries)
    }

    /// Load-or-creates by `msg.message_id`, unions `batch_ids` into the
    /// record's batch set, and recomputes all three compound indexes from
    /// scratch before persisting (§4.3). Idempotent on identical input,
    /// monotone on `batch_ids`.
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure, or an
    /// error if a batch id or address contains the reserved `$` delimiter.
    #[instrument(skip(self, msg))]
    pub async fn add_inbound_message(
        &self,
        msg: MessageEnvelope,
        batch_ids: &[String],
    ) -> Result<(), Report<StoreUnavailable>> {
        let batches = self
            .upsert_message_batches::<InboundMessage>(
                INBOUND_BUCKET,
                &msg.message_id,
                batch_ids.iter().cloned().collect(),
                |prior| prior.batches,
            )
            .await?;
        let indexes = Self::message_indexes(&batches, &msg.timestamp, msg.from_addr.as_deref())
            .change_context(StoreUnavailable)
            .attach_printable("inbound message carries a malformed index component")?;
        let key = msg.message_id.clone();
        let record = InboundMessage {
            version: crate::model::message::INBOUND_MESSAGE_VERSION,
            msg,
            batches,
        };
        self.store
            .put(INBOUND_BUCKET, &key, "application/json", encode_json(&record), indexes)
            .await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_raw_inbound_message(&self, message_id: &str) -> Result<Option<InboundMessage>, Report<StoreUnavailable>> {
        Ok(self
            .store
            .get(INBOUND_BUCKET, message_id)
            .await?
            .map(|object| decode_json(&object.payload)))
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_inbound_message(&self, message_id: &str) -> Result<Option<MessageEnvelope>, Report<StoreUnavailable>> {
        Ok(self.get_raw_inbound_message(message_id).await?.map(|record| record.msg))
    }

    /// See [`AuthoritativeBackend::add_inbound_message`]; identical shape
    /// with `to_addr` feeding the address index instead of `from_addr`.
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure, or an
    /// error if a batch id or address contains the reserved `$` delimiter.
    #[instrument(skip(self, msg))]
    pub async fn add_outbound_message(
        &self,
        msg: MessageEnvelope,
        batch_ids: &[String],
    ) -> Result<(), Report<StoreUnavailable>> {
        let batches = self
            .upsert_message_batches::<OutboundMessage>(
                OUTBOUND_BUCKET,
                &msg.message_id,
                batch_ids.iter().cloned().collect(),
                |prior| prior.batches,
            )
            .await?;
        let indexes = Self::message_indexes(&batches, &msg.timestamp, msg.to_addr.as_deref())
            .change_context(StoreUnavailable)
            .attach_printable("outbound message carries a malformed index component")?;
        let key = msg.message_id.clone();
        let record = OutboundMessage {
            version: crate::model::message::OUTBOUND_MESSAGE_VERSION,
            msg,
            batches,
        };
        self.store
            .put(OUTBOUND_BUCKET, &key, "application/json", encode_json(&record), indexes)
            .await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_raw_outbound_message(&self, message_id: &str) -> Result<Option<OutboundMessage>, Report<StoreUnavailable>> {
        Ok(self
            .store
            .get(OUTBOUND_BUCKET, message_id)
            .await?
            .map(|object| decode_json(&object.payload)))
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_outbound_message(&self, message_id: &str) -> Result<Option<MessageEnvelope>, Report<StoreUnavailable>> {
        Ok(self.get_raw_outbound_message(message_id).await?.map(|record| record.msg))
    }

    /// Load-or-creates by `event_id`, sets the owning-message foreign key
    /// from `event.user_message_id`, and recomputes the `message_with_status`
    /// index before persisting (§4.3).
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure, or an
    /// error if the message id or status contains the reserved `$`
    /// delimiter.
    #[instrument(skip(self, event))]
    pub async fn add_event(&self, event: EventEnvelope) -> Result<(), Report<StoreUnavailable>> {
        let status = event.status();
        let message_index = index::message_term(&event.user_message_id)
            .change_context(StoreUnavailable)
            .attach_printable("event carries a malformed message id")?;
        let message_with_status_index = index::message_with_status_term(&event.user_message_id, &event.timestamp, &status)
            .change_context(StoreUnavailable)
            .attach_printable("event carries a malformed index component")?;
        let key = event.event_id.clone();
        let record = Event::new(event);
        let indexes = vec![
            IndexEntry { name: MESSAGE_INDEX.to_owned(), term: message_index },
            IndexEntry { name: MESSAGE_WITH_STATUS_INDEX.to_owned(), term: message_with_status_index },
        ];
        self.store
            .put(EVENT_BUCKET, &key, "application/json", encode_json(&record), indexes)
            .await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_raw_event(&self, event_id: &str) -> Result<Option<Event>, Report<StoreUnavailable>> {
        Ok(self.store.get(EVENT_BUCKET, event_id).await?.map(|object| decode_json(&object.payload)))
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn get_event(&self, event_id: &str) -> Result<Option<EventEnvelope>, Report<StoreUnavailable>> {
        Ok(self.get_raw_event(event_id).await?.map(|record| record.event))
    }

    fn page(
        &self,
        bucket: &str,
        index_name: &str,
        start_term: String,
        end_term: Option<String>,
        max_results: Option<usize>,
        return_terms: bool,
    ) -> PageRequest {
        PageRequest {
            bucket: bucket.to_owned(),
            index_name: index_name.to_owned(),
            start_term,
            end_term,
            max_results: Some(max_results.unwrap_or(self.default_max_results)),
            return_terms,
        }
    }

    async fn first_page(&self, request: PageRequest) -> Result<Page<S>, Report<StoreUnavailable>> {
        let raw = self
            .store
            .range_page(RangeQuery {
                bucket: &request.bucket,
                index_name: &request.index_name,
                start_term: &request.start_term,
                end_term: request.end_term.as_deref(),
                max_results: request.max_results,
                continuation: None,
                return_terms: request.return_terms,
            })
            .await?;
        Ok(Page::new(
            self.store.clone(),
            request.bucket,
            request.index_name,
            request.start_term,
            request.end_term,
            request.max_results,
            request.return_terms,
            raw,
        ))
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn list_batch_inbound_keys(&self, batch_id: &str, max_results: Option<usize>) -> Result<Page<S>, Report<StoreUnavailable>> {
        let request = self.page(INBOUND_BUCKET, BATCHES_INDEX, batch_id.to_owned(), None, max_results, false);
        self.first_page(request).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn list_batch_outbound_keys(&self, batch_id: &str, max_results: Option<usize>) -> Result<Page<S>, Report<StoreUnavailable>> {
        let request = self.page(OUTBOUND_BUCKET, BATCHES_INDEX, batch_id.to_owned(), None, max_results, false);
        self.first_page(request).await
    }

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn list_message_event_keys(&self, message_id: &str, max_results: Option<usize>) -> Result<Page<S>, Report<StoreUnavailable>> {
        let request = self.page(EVENT_BUCKET, MESSAGE_INDEX, message_id.to_owned(), None, max_results, false);
        self.first_page(request).await
    }

    fn range_bounds(prefix: &str, start: Option<Timestamp>, end: Option<Timestamp>) -> (String, Option<String>) {
        let start_term = match start {
            Some(start) => format!("{prefix}${start}"),
            None => format!("{prefix}$"),
        };
        let end_term = match end {
            Some(end) => Some(format!("{prefix}${end}{MAX_TIMESTAMP_SUFFIX}")),
            None => Some(format!("{prefix}${MAX_TIMESTAMP_SUFFIX}")),
        };
        (start_term, end_term)
    }

    /// Lists inbound message keys for `batch_id` with their timestamps,
    /// in ascending timestamp order, optionally bounded to `[start, end]`
    /// (§4.3).
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn list_batch_inbound_keys_with_timestamps(
        &self,
        batch_id: &str,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        max_results: Option<usize>,
    ) -> Result<Page<S>, Report<StoreUnavailable>> {
        let (start_term, end_term) = Self::range_bounds(batch_id, start, end);
        let request = self.page(INBOUND_BUCKET, BATCHES_WITH_TIMESTAMPS_INDEX, start_term, end_term, max_results, true);
        self.first_page(request).await
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
        let (start_term, end_term) = Self::range_bounds(batch_id, start, end);
        let request = self.page(OUTBOUND_BUCKET, BATCHES_WITH_TIMESTAMPS_INDEX, start_term, end_term, max_results, true);
        self.first_page(request).await
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
        let (start_term, end_term) = Self::range_bounds(batch_id, start, end);
        let request = self.page(INBOUND_BUCKET, BATCHES_WITH_ADDRESSES_INDEX, start_term, end_term, max_results, true);
        self.first_page(request).await
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
        let (start_term, end_term) = Self::range_bounds(batch_id, start, end);
        let request = self.page(OUTBOUND_BUCKET, BATCHES_WITH_ADDRESSES_INDEX, start_term, end_term, max_results, true);
        self.first_page(request).await
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
        let (start_term, end_term) = Self::range_bounds(message_id, start, end);
        let request = self.page(EVENT_BUCKET, MESSAGE_WITH_STATUS_INDEX, start_term, end_term, max_results, true);
        self.first_page(request).await
    }
}

struct PageRequest {
    bucket: String,
    index_name: String,
    start_term: String,
    end_term: Option<String>,
    max_results: Option<usize>,
    return_terms: bool,
}
