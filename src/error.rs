//! Error kinds shared by the authoritative backend, the batch info cache,
//! and the façades that sit on top of them.
//!
//! Every fallible operation returns `Result<T, error_stack::Report<E>>`
//! where `E` is one of the unit structs below. Adapters attach the
//! underlying driver error as context via `error_stack::ResultExt`.

use derive_more::{Display, Error};

/// The requested object does not exist in the authoritative store.
///
/// Single-record getters never return this as an `Err` (see `spec.md`
/// §7) — they surface absence as `Ok(None)`. It exists for generic code
/// (reconciliation, raw-record lookups performed while rebuilding a
/// listing) that needs to distinguish "absent" from "failed".
#[derive(Debug, Display, Error)]
#[display("object not found")]
#[must_use]
pub struct NotFound;

/// A call into the object store or cache adapter failed transiently.
///
/// Retryable by the caller: per §7 the default policy is to propagate
/// and let the caller retry the whole operation, since every write in
/// this crate is idempotent.
#[derive(Debug, Display, Error)]
#[display("the backing store is unavailable")]
#[must_use]
pub struct StoreUnavailable;

/// A record's on-disk `$VERSION` has no registered migrator path to the
/// model's current version. Fatal — this is a deployment/schema bug,
/// not a transient condition.
#[derive(Debug, Display, Error)]
#[display("no migrator path from the stored schema version to the current version")]
#[must_use]
pub struct MigrationFailed;

/// A compound index term contains the `$` delimiter in a component
/// where it is forbidden (batch id, message id, address, status).
///
/// Programmer error: callers should never be able to produce identifiers
/// containing `$`, so this existing is a sign of a bug upstream.
#[derive(Debug, Display, Error)]
#[display("index term component {component:?} contains the reserved '$' delimiter")]
#[must_use]
pub struct InvalidTerm {
    pub component: String,
}

/// A sanity check during reconciliation found the cache disagreeing with
/// the authoritative store. Advisory — never returned from normal reads.
#[derive(Debug, Display, Error)]
#[display("cache state diverges from the authoritative store: {detail}")]
#[must_use]
pub struct CacheInconsistent {
    pub detail: String,
}
