//! In-memory [`ObjectStore`] implementation.
//!
//! Grounded on `examples/original_source/vumi_message_store/memory_backend_manager.py`'s
//! `FakeRiakState`/`FakeRiakBucket`/`FakeMemoryIndexPage`: one map of
//! objects and one map of sorted `(term, key)` index entries per bucket,
//! with continuation tokens that base64-encode the first uncovered
//! `(term, key)` pair.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use error_stack::Report;
use serde::{Deserialize, Serialize};

use crate::{
    error::StoreUnavailable,
    object_store::{IndexSet, ObjectStore, RangeItem, RangeQuery, RawPage, StoredObject},
};

#[derive(Default)]
struct Bucket {
    objects: HashMap<String, StoredObject>,
    // index_name -> sorted (term, key) pairs.
    indexes: HashMap<String, Vec<(String, String)>>,
}

/// A process-local, non-persistent [`ObjectStore`]. Useful for tests and
/// as a starting point before a real KV driver is wired in (§2 — the
/// driver is an external collaborator, out of scope for the core).
#[derive(Clone, Default)]
pub struct InMemoryObjectStore {
    buckets: Arc<Mutex<HashMap<String, Bucket>>>,
}

impl InMemoryObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Serialize, Deserialize)]
struct Continuation(String, String);

fn encode_continuation(term: &str, key: &str) -> String {
    let json = serde_json::to_vec(&Continuation(term.to_owned(), key.to_owned()))
        .expect("continuation tuple always serializes");
    BASE64.encode(json)
}

fn decode_continuation(token: &str) -> Option<(String, String)> {
    let bytes = BASE64.decode(token).ok()?;
    let Continuation(term, key) = serde_json::from_slice(&bytes).ok()?;
    Some((term, key))
}

impl ObjectStore for InMemoryObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        payload: Vec<u8>,
        indexes: IndexSet,
    ) -> Result<(), Report<StoreUnavailable>> {
        let mut buckets = self.buckets.lock().expect("object store mutex poisoned");
        let bucket = buckets.entry(bucket.to_owned()).or_default();

        // `put` replaces this object's contribution to every index (§4.1):
        // drop any entries this key holds anywhere before re-inserting.
        for entries in bucket.indexes.values_mut() {
            entries.retain(|(_, existing_key)| existing_key != key);
        }
        for entry in &indexes {
            let list = bucket.indexes.entry(entry.name.clone()).or_default();
            list.push((entry.term.clone(), key.to_owned()));
            list.sort();
        }

        bucket.objects.insert(
            key.to_owned(),
            StoredObject {
                content_type: content_type.to_owned(),
                payload,
                indexes,
            },
        );
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>, Report<StoreUnavailable>> {
        let buckets = self.buckets.lock().expect("object store mutex poisoned");
        Ok(buckets.get(bucket).and_then(|bucket| bucket.objects.get(key).cloned()))
    }

    async fn range_page(&self, query: RangeQuery<'_>) -> Result<RawPage, Report<StoreUnavailable>> {
        let buckets = self.buckets.lock().expect("object store mutex poisoned");
        let Some(index) = buckets
            .get(query.bucket)
            .and_then(|bucket| bucket.indexes.get(query.index_name))
        else {
            return Ok(RawPage::default());
        };

        let mut matching: Vec<&(String, String)> = index
            .iter()
            .filter(|(term, _)| match query.end_term {
                None => term.as_str() == query.start_term,
                Some(end) => term.as_str() >= query.start_term && term.as_str() <= end,
            })
            .collect();
        matching.sort();

        if let Some(token) = query.continuation {
            let Some(cursor) = decode_continuation(token) else {
                return Ok(RawPage::default());
            };
            matching.retain(|(term, key)| (term.clone(), key.clone()) >= cursor);
        }

        let Some(max_results) = query.max_results else {
            let items = matching
                .into_iter()
                .map(|(term, key)| to_range_item(term, key, query.return_terms))
                .collect();
            return Ok(RawPage { items, continuation: None });
        };

        let continuation = matching
            .get(max_results)
            .map(|(term, key)| encode_continuation(term, key));
        let items = matching
            .into_iter()
            .take(max_results)
            .map(|(term, key)| to_range_item(term, key, query.return_terms))
            .collect();
        Ok(RawPage { items, continuation })
    }
}

fn to_range_item(term: &str, key: &str, return_terms: bool) -> RangeItem {
    RangeItem {
        key: key.to_owned(),
        term: return_terms.then(|| term.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryObjectStore;
    use crate::object_store::{IndexEntry, ObjectStore, RangeQuery};

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = InMemoryObjectStore::new();
        store
            .put("widgets", "k1", "application/json", b"hello".to_vec(), vec![])
            .await
            .unwrap();
        let object = store.get("widgets", "k1").await.unwrap().unwrap();
        assert_eq!(object.payload, b"hello");
    }

    #[tokio::test]
    async fn get_absent_is_none_not_error() {
        let store = InMemoryObjectStore::new();
        assert!(store.get("widgets", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_prior_index_contribution() {
        let store = InMemoryObjectStore::new();
        store
            .put(
                "widgets",
                "k1",
                "application/json",
                vec![],
                vec![IndexEntry { name: "batches".into(), term: "b1".into() }],
            )
            .await
            .unwrap();
        store
            .put(
                "widgets",
                "k1",
                "application/json",
                vec![],
                vec![IndexEntry { name: "batches".into(), term: "b2".into() }],
            )
            .await
            .unwrap();

        let page = store
            .range_page(RangeQuery {
                bucket: "widgets",
                index_name: "batches",
                start_term: "b1",
                end_term: None,
                max_results: None,
                continuation: None,
                return_terms: false,
            })
            .await
            .unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn pagination_round_trips_with_any_page_size() {
        let store = InMemoryObjectStore::new();
        for index in 0..5 {
            store
                .put(
                    "widgets",
                    &format!("k{index}"),
                    "application/json",
                    vec![],
                    vec![IndexEntry { name: "batches".into(), term: "b1".into() }],
                )
                .await
                .unwrap();
        }

        let mut keys = Vec::new();
        let mut continuation = None;
        loop {
            let page = store
                .range_page(RangeQuery {
                    bucket: "widgets",
                    index_name: "batches",
                    start_term: "b1",
                    end_term: None,
                    max_results: Some(2),
                    continuation: continuation.as_deref(),
                    return_terms: false,
                })
                .await
                .unwrap();
            keys.extend(page.items.into_iter().map(|item| item.key));
            match page.continuation {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }
        keys.sort();
        assert_eq!(keys, vec!["k0", "k1", "k2", "k3", "k4"]);
    }
}
