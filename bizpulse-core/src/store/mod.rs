//! Record stores
//!
//! Each store is a thin repository over one collection persisted as a JSON
//! array under a fixed key. Mutations always rewrite the whole collection.
//!
//! Reads used for display degrade to an empty collection when storage fails;
//! reads that feed a write propagate the error instead, so a failed read is
//! never written back as an empty collection.

pub mod clients;
pub mod projects;
pub mod tasks;
pub mod time_entries;

pub use clients::ClientStore;
pub use projects::ProjectStore;
pub use tasks::TaskStore;
pub use time_entries::TimeEntryStore;

use crate::db::KeyValueStore;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Storage key for the client collection
pub const CLIENTS_KEY: &str = "clients";
/// Storage key for the project collection
pub const PROJECTS_KEY: &str = "projects";
/// Storage key for the task collection
pub const TASKS_KEY: &str = "tasks";
/// Storage key for the time entry collection
pub const TIME_ENTRIES_KEY: &str = "time_entries";
/// Storage key for the running timer
pub const ACTIVE_TIMER_KEY: &str = "active_timer";

/// Load a collection, propagating storage and decode failures.
pub(crate) fn load_strict<T: DeserializeOwned>(kv: &dyn KeyValueStore, key: &str) -> Result<Vec<T>> {
    match kv.get(key)? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(Vec::new()),
    }
}

/// Load a collection, falling back to empty on any failure.
pub(crate) fn load<T: DeserializeOwned>(kv: &dyn KeyValueStore, key: &str) -> Vec<T> {
    load_strict(kv, key).unwrap_or_else(|e| {
        tracing::warn!(key, error = %e, "Failed to read collection, using empty");
        Vec::new()
    })
}

/// Persist a whole collection.
///
/// Failures surface as [`Error::Storage`] so callers see one generic write error.
pub(crate) fn save<T: Serialize>(kv: &dyn KeyValueStore, key: &str, items: &[T]) -> Result<()> {
    let raw = serde_json::to_string(items)?;
    kv.set(key, &raw).map_err(|e| {
        tracing::error!(key, error = %e, "Failed to write collection");
        Error::Storage(format!("failed to save {}: {}", key, e))
    })
}

/// Generate a new record ID.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn require_non_negative(field: &str, value: f64) -> Result<()> {
    if value < 0.0 || value.is_nan() {
        return Err(Error::Validation(format!("{} must not be negative", field)));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testutil::*;
    use super::*;

    #[test]
    fn test_load_missing_key_is_empty() {
        let db = test_db();
        let items: Vec<u32> = load_strict(&db, "nothing").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_load_degrades_on_corrupt_json() {
        let db = test_db();
        db.set(CLIENTS_KEY, "{not json").unwrap();

        let items: Vec<crate::Client> = load(&db, CLIENTS_KEY);
        assert!(items.is_empty());
        assert!(load_strict::<crate::Client>(&db, CLIENTS_KEY).is_err());
    }

    #[test]
    fn test_save_maps_write_failure_to_storage_error() {
        let store = FlakyStore::new();
        store.fail_writes.set(true);

        let result = save(&store, TASKS_KEY, &[1, 2, 3]);
        assert!(matches!(result, Err(Error::Storage(_))));
    }
}
