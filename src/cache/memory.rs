//! In-memory [`CacheStore`] implementation.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use error_stack::Report;

use crate::{cache::CacheStore, error::StoreUnavailable};

#[derive(Default)]
struct State {
    strings: HashMap<String, String>,
    hashes: HashMap<String, HashMap<String, String>>,
    sets: HashMap<String, HashSet<String>>,
    sorted_sets: HashMap<String, Vec<(String, f64)>>,
}

/// A process-local, non-persistent [`CacheStore`]. Used by this crate's
/// own tests and as a reference before a real cache driver (e.g. Redis)
/// is wired in — §2 treats the driver as an external collaborator.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    state: Arc<Mutex<State>>,
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Resolves a Redis-style `start..=stop` rank range against a collection
/// of length `len`, returning an inclusive `(start, stop)` index pair or
/// `None` if the range is empty.
///
/// Negative indices count from the end (`-1` is the last element). Per
/// Redis's own rules, an out-of-range `start` clamps to `0`, but an
/// out-of-range `stop` stays negative and yields an empty range rather
/// than wrapping back to `0` — this is what makes `zremrangebyrank(key,
/// 0, -(T+1))` a no-op when the set holds at most `T` entries.
fn resolve_rank_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let start = if start < 0 { (start + len).max(0) } else { start };
    let stop = if stop < 0 { stop + len } else { stop };
    if start > stop || start >= len {
        return None;
    }
    let stop = stop.min(len - 1);
    Some((start as usize, stop as usize))
}

impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, Report<StoreUnavailable>> {
        let state = self.state.lock().expect("cache mutex poisoned");
        Ok(state.strings.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Report<StoreUnavailable>> {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        state.strings.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, Report<StoreUnavailable>> {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        let entry = state.strings.entry(key.to_owned()).or_insert_with(|| "0".to_owned());
        let value: i64 = entry.parse().unwrap_or(0);
        let updated = value + delta;
        *entry = updated.to_string();
        Ok(updated)
    }

    async fn hset_nx(&self, key: &str, field: &str, value: &str) -> Result<bool, Report<StoreUnavailable>> {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        let hash = state.hashes.entry(key.to_owned()).or_default();
        if hash.contains_key(field) {
            return Ok(false);
        }
        hash.insert(field.to_owned(), value.to_owned());
        Ok(true)
    }

    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64, Report<StoreUnavailable>> {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        let hash = state.hashes.entry(key.to_owned()).or_default();
        let entry = hash.entry(field.to_owned()).or_insert_with(|| "0".to_owned());
        let value: i64 = entry.parse().unwrap_or(0);
        let updated = value + delta;
        *entry = updated.to_string();
        Ok(updated)
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, Report<StoreUnavailable>> {
        let state = self.state.lock().expect("cache mutex poisoned");
        Ok(state.hashes.get(key).cloned().unwrap_or_default())
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool, Report<StoreUnavailable>> {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        Ok(state.sets.entry(key.to_owned()).or_default().insert(member.to_owned()))
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool, Report<StoreUnavailable>> {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        Ok(state.sets.get_mut(key).is_some_and(|set| set.remove(member)))
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool, Report<StoreUnavailable>> {
        let state = self.state.lock().expect("cache mutex poisoned");
        Ok(state.sets.get(key).is_some_and(|set| set.contains(member)))
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<bool, Report<StoreUnavailable>> {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        let set = state.sorted_sets.entry(key.to_owned()).or_default();
        if let Some(existing) = set.iter_mut().find(|(existing_member, _)| existing_member == member) {
            existing.1 = score;
            return Ok(false);
        }
        set.push((member.to_owned(), score));
        Ok(true)
    }

    async fn zrange(
        &self,
        key: &str,
        start: i64,
        stop: i64,
        desc: bool,
    ) -> Result<Vec<(String, f64)>, Report<StoreUnavailable>> {
        let state = self.state.lock().expect("cache mutex poisoned");
        let Some(set) = state.sorted_sets.get(key) else {
            return Ok(Vec::new());
        };
        let mut sorted = set.clone();
        sorted.sort_by(|left, right| left.1.total_cmp(&right.1).then_with(|| left.0.cmp(&right.0)));
        if desc {
            sorted.reverse();
        }
        let Some((lo, hi)) = resolve_rank_range(start, stop, sorted.len()) else {
            return Ok(Vec::new());
        };
        Ok(sorted[lo..=hi].to_vec())
    }

    async fn zremrangebyrank(&self, key: &str, start: i64, stop: i64) -> Result<i64, Report<StoreUnavailable>> {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        let Some(set) = state.sorted_sets.get_mut(key) else {
            return Ok(0);
        };
        set.sort_by(|left, right| left.1.total_cmp(&right.1).then_with(|| left.0.cmp(&right.0)));
        let Some((lo, hi)) = resolve_rank_range(start, stop, set.len()) else {
            return Ok(0);
        };
        let removed = hi - lo + 1;
        set.drain(lo..=hi);
        Ok(removed as i64)
    }

    async fn delete(&self, key: &str) -> Result<(), Report<StoreUnavailable>> {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        state.strings.remove(key);
        state.hashes.remove(key);
        state.sets.remove(key);
        state.sorted_sets.remove(key);
        Ok(())
    }
}
