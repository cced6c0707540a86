//! The cache store adapter trait and the derived [`BatchInfoCache`] (§4.4, §6).

pub mod batch_info;
pub mod memory;

use std::{collections::HashMap, future::Future};

use error_stack::Report;

use crate::error::StoreUnavailable;

pub use batch_info::BatchInfoCache;

/// Narrow façade over an external cache store providing the primitives
/// §6 requires: string get/set/incrby, hash field set/incrby/getall, set
/// add/remove/ismember, sorted set add/zrange/zremrangebyrank.
///
/// Rank arguments on [`CacheStore::zrange`] and
/// [`CacheStore::zremrangebyrank`] follow Redis conventions: `0` is the
/// lowest-scored member, and negative indices count from the
/// highest-scored end (`-1` is the highest-scored member).
pub trait CacheStore: Clone + Send + Sync + 'static {
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, Report<StoreUnavailable>>> + Send;

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), Report<StoreUnavailable>>> + Send;

    /// Increments the integer at `key` by `delta`, defaulting a missing key
    /// to `0` first, and returns the new value.
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    fn incr_by(&self, key: &str, delta: i64) -> impl Future<Output = Result<i64, Report<StoreUnavailable>>> + Send;

    /// Sets `field` to `value` only if it is not already present.
    /// Returns `true` if the field was newly set.
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    fn hset_nx(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> impl Future<Output = Result<bool, Report<StoreUnavailable>>> + Send;

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    fn hincr_by(
        &self,
        key: &str,
        field: &str,
        delta: i64,
    ) -> impl Future<Output = Result<i64, Report<StoreUnavailable>>> + Send;

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    fn hgetall(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<HashMap<String, String>, Report<StoreUnavailable>>> + Send;

    /// Returns `true` if `member` was newly added.
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    fn sadd(&self, key: &str, member: &str) -> impl Future<Output = Result<bool, Report<StoreUnavailable>>> + Send;

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    fn srem(&self, key: &str, member: &str) -> impl Future<Output = Result<bool, Report<StoreUnavailable>>> + Send;

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    fn sismember(
        &self,
        key: &str,
        member: &str,
    ) -> impl Future<Output = Result<bool, Report<StoreUnavailable>>> + Send;

    /// Adds `member` scored by `score`. Returns `true` if `member` was not
    /// already present in the set (§5 — idempotence under duplicate
    /// delivery hinges on this signal).
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    fn zadd(
        &self,
        key: &str,
        member: &str,
        score: f64,
    ) -> impl Future<Output = Result<bool, Report<StoreUnavailable>>> + Send;

    /// Returns `(member, score)` pairs for ranks `start..=stop`, ascending
    /// by score unless `desc` is set.
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    fn zrange(
        &self,
        key: &str,
        start: i64,
        stop: i64,
        desc: bool,
    ) -> impl Future<Output = Result<Vec<(String, f64)>, Report<StoreUnavailable>>> + Send;

    /// Removes members ranked `start..=stop` (ascending by score) and
    /// returns the number removed.
    ///
    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    fn zremrangebyrank(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> impl Future<Output = Result<i64, Report<StoreUnavailable>>> + Send;

    /// # Errors
    /// Returns [`StoreUnavailable`] on a transient I/O failure.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), Report<StoreUnavailable>>> + Send;
}
