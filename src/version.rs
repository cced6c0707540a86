//! Schema versioning (§3): every persisted entity carries an integer
//! `$VERSION` tag. Reads apply forward migrators until the on-disk
//! version equals the model's current version; writes may apply reverse
//! migrators to down-convert when a deployment is pinned to an older
//! store format.

use error_stack::{Report, report};
use serde_json::Value;

use crate::error::MigrationFailed;

/// A single version-to-version transform over the raw JSON payload.
///
/// Migrators are registered in order and applied one step at a time so
/// that a record can walk an arbitrary number of versions forward or
/// backward.
pub trait Migrator: Send + Sync {
    /// The version this migrator reads.
    fn from_version(&self) -> u32;
    /// The version this migrator produces.
    fn to_version(&self) -> u32;
    /// Transforms the payload from `from_version` to `to_version`.
    fn migrate(&self, payload: Value) -> Value;
}

/// An ordered chain of [`Migrator`]s for one entity type, plus the
/// entity's current model version.
pub struct MigrationChain {
    current_version: u32,
    forward: Vec<Box<dyn Migrator>>,
    reverse: Vec<Box<dyn Migrator>>,
}

impl MigrationChain {
    #[must_use]
    pub fn new(current_version: u32) -> Self {
        Self {
            current_version,
            forward: Vec::new(),
            reverse: Vec::new(),
        }
    }

    /// Registers a forward migrator (applied when reading an
    /// older-than-current record).
    #[must_use]
    pub fn with_forward(mut self, migrator: impl Migrator + 'static) -> Self {
        self.forward.push(Box::new(migrator));
        self
    }

    /// Registers a reverse migrator (applied when writing under a
    /// pinned older store format).
    #[must_use]
    pub fn with_reverse(mut self, migrator: impl Migrator + 'static) -> Self {
        self.reverse.push(Box::new(migrator));
        self
    }

    /// Applies forward migrators until `payload`'s `$VERSION` matches
    /// `self.current_version`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationFailed`] if no registered migrator reads the
    /// on-disk version.
    pub fn migrate_forward(&self, mut payload: Value, mut on_disk_version: u32) -> Result<Value, Report<MigrationFailed>> {
        while on_disk_version != self.current_version {
            let migrator = self
                .forward
                .iter()
                .find(|migrator| migrator.from_version() == on_disk_version)
                .ok_or_else(|| {
                    report!(MigrationFailed).attach_printable(format!(
                        "no forward migrator registered for version {on_disk_version}"
                    ))
                })?;
            payload = migrator.migrate(payload);
            on_disk_version = migrator.to_version();
        }
        Ok(payload)
    }

    /// Applies reverse migrators until `payload`'s `$VERSION` matches
    /// `target_version`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationFailed`] if no registered migrator down-converts
    /// from the current in-memory version to `target_version`.
    pub fn migrate_reverse(&self, mut payload: Value, target_version: u32) -> Result<Value, Report<MigrationFailed>> {
        let mut version = self.current_version;
        while version != target_version {
            let migrator = self
                .reverse
                .iter()
                .find(|migrator| migrator.from_version() == version)
                .ok_or_else(|| {
                    report!(MigrationFailed)
                        .attach_printable(format!("no reverse migrator registered for version {version}"))
                })?;
            payload = migrator.migrate(payload);
            version = migrator.to_version();
        }
        Ok(payload)
    }
}

/// A model type with a current on-disk version and (possibly empty)
/// forward migration chain. Every backend read goes through
/// [`Versioned::decode`] rather than a bare `serde_json::from_slice`, so a
/// future schema bump only requires registering a migrator here.
pub trait Versioned: serde::de::DeserializeOwned {
    /// The model's current in-memory version.
    fn current_version() -> u32;

    /// The migrators that bring an on-disk record up to
    /// [`Versioned::current_version`]. Empty for every type shipped so
    /// far; a schema bump adds a migrator here, not a second code path.
    fn migration_chain() -> MigrationChain {
        MigrationChain::new(Self::current_version())
    }

    /// Reads the on-disk `$VERSION`, migrates the payload forward if it
    /// predates [`Versioned::current_version`], then deserializes it.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationFailed`] if no migrator bridges the on-disk
    /// version to the current one.
    fn decode(bytes: &[u8]) -> Result<Self, Report<MigrationFailed>> {
        let mut payload: Value =
            serde_json::from_slice(bytes).expect("stored payload is well-formed JSON");
        let on_disk_version = payload
            .get("$VERSION")
            .and_then(Value::as_u64)
            .map_or(Self::current_version(), |version| version as u32);
        if on_disk_version != Self::current_version() {
            payload = Self::migration_chain().migrate_forward(payload, on_disk_version)?;
        }
        Ok(serde_json::from_value(payload).expect("migrated payload matches its current schema"))
    }
}
