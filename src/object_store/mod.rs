//! The Object Store Adapter and Index Page Iterator (§4.1, §4.2).
//!
//! This is a narrow façade over an external KV store, modeled as a trait
//! so the authoritative backend (§4.3) can be generic over whatever
//! driver a deployment wires in. [`memory::InMemoryObjectStore`] is a
//! complete in-memory implementation used by this crate's own tests and
//! as a reference for consumers without a real driver yet.

pub mod memory;

use std::future::Future;

use error_stack::Report;

use crate::error::StoreUnavailable;

/// One secondary-index entry: an index name plus the term an object is
/// filed under in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexEntry {
    pub name: String,
    pub term: String,
}

/// The complete, authoritative set of secondary-index entries an object
/// contributes. `put` replaces an object's prior contribution to every
/// named index with exactly this set (§4.1).
pub type IndexSet = Vec<IndexEntry>;

/// The payload and metadata `get` returns for a stored object.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: String,
    pub payload: Vec<u8>,
    pub indexes: IndexSet,
}

/// Parameters for a paginated secondary-index range scan (§4.1).
#[derive(Debug, Clone)]
pub struct RangeQuery<'a> {
    pub bucket: &'a str,
    pub index_name: &'a str,
    pub start_term: &'a str,
    pub end_term: Option<&'a str>,
    pub max_results: Option<usize>,
    pub continuation: Option<&'a str>,
    pub return_terms: bool,
}

/// One item of a range-scan result: a key, with its index term attached
/// when `return_terms` was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeItem {
    pub key: String,
    pub term: Option<String>,
}

/// The raw result of one `range_page` call: a page of items in ascending
/// `(term, key)` order, plus an opaque continuation token when more
/// results exist (§4.1).
#[derive(Debug, Clone, Default)]
pub struct RawPage {
    pub items: Vec<RangeItem>,
    pub continuation: Option<String>,
}

/// Narrow façade over an external KV store that persists versioned JSON
/// records in named buckets and maintains per-object secondary-index
/// entries (§4.1).
pub trait ObjectStore: Clone + Send + Sync + 'static {
    /// Writes `payload` under `bucket`/`key` and replaces the object's
    /// contribution to every named index with `indexes` (§4.1).
    ///
    /// # Errors
    ///
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    fn put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        payload: Vec<u8>,
        indexes: IndexSet,
    ) -> impl Future<Output = Result<(), Report<StoreUnavailable>>> + Send;

    /// Returns the most recent committed payload, or `None` if absent
    /// (§4.1 — `get` never surfaces absence as an error).
    ///
    /// # Errors
    ///
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    fn get(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = Result<Option<StoredObject>, Report<StoreUnavailable>>> + Send;

    /// Performs one page of a secondary-index range scan, in ascending
    /// `(term, key)` order (§4.1).
    ///
    /// # Errors
    ///
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    fn range_page(
        &self,
        query: RangeQuery<'_>,
    ) -> impl Future<Output = Result<RawPage, Report<StoreUnavailable>>> + Send;
}

/// A single page of a paginated range scan (§4.2). Forward-only and
/// single-use with respect to [`Page::next_page`].
pub struct Page<S> {
    store: S,
    bucket: String,
    index_name: String,
    start_term: String,
    end_term: Option<String>,
    max_results: Option<usize>,
    return_terms: bool,
    raw: RawPage,
}

impl<S: ObjectStore> Page<S> {
    pub(crate) fn new(
        store: S,
        bucket: String,
        index_name: String,
        start_term: String,
        end_term: Option<String>,
        max_results: Option<usize>,
        return_terms: bool,
        raw: RawPage,
    ) -> Self {
        Self {
            store,
            bucket,
            index_name,
            start_term,
            end_term,
            max_results,
            return_terms,
            raw,
        }
    }

    /// The keys in this page, in ascending `(term, key)` order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.raw.items.iter().map(|item| item.key.as_str()).collect()
    }

    /// The `(key, term)` pairs in this page. Only meaningful when the
    /// listing was constructed with `return_terms = true`; otherwise every
    /// `term` is `None`.
    #[must_use]
    pub fn items(&self) -> &[RangeItem] {
        &self.raw.items
    }

    /// `true` when a further page is available via [`Page::next_page`].
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.raw.continuation.is_some()
    }

    /// Fetches the next page of this scan.
    ///
    /// # Errors
    ///
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    ///
    /// # Panics
    ///
    /// Panics if called when [`Page::has_next`] is `false`.
    pub async fn next_page(&self) -> Result<Self, Report<StoreUnavailable>> {
        let continuation = self
            .raw
            .continuation
            .as_deref()
            .expect("next_page called with no continuation");
        let raw = self
            .store
            .range_page(RangeQuery {
                bucket: &self.bucket,
                index_name: &self.index_name,
                start_term: &self.start_term,
                end_term: self.end_term.as_deref(),
                max_results: self.max_results,
                continuation: Some(continuation),
                return_terms: self.return_terms,
            })
            .await?;
        Ok(Self {
            store: self.store.clone(),
            bucket: self.bucket.clone(),
            index_name: self.index_name.clone(),
            start_term: self.start_term.clone(),
            end_term: self.end_term.clone(),
            max_results: self.max_results,
            return_terms: self.return_terms,
            raw,
        })
    }

    /// Drains every page of this scan into one `Vec`, in ascending
    /// `(term, key)` order (§8 property 4 — "range-scan completeness").
    ///
    /// # Errors
    ///
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    pub async fn collect_all(mut self) -> Result<Vec<RangeItem>, Report<StoreUnavailable>> {
        let mut all = std::mem::take(&mut self.raw.items);
        while self.has_next() {
            self = self.next_page().await?;
            all.extend(self.raw.items.iter().cloned());
        }
        Ok(all)
    }
}
