//! Workspace: the context object that owns storage and hands out stores
//!
//! There is no process-wide state. Whoever owns a `Workspace` owns the
//! record stores borrowed from it.

use crate::analytics::Snapshot;
use crate::consistency::{self, RepairReport};
use crate::db::{Database, KeyValueStore};
use crate::error::Result;
use crate::store::{ClientStore, ProjectStore, TaskStore, TimeEntryStore};

/// Owner of the key-value store behind every record store.
pub struct Workspace<S: KeyValueStore = Database> {
    store: S,
}

impl Workspace<Database> {
    /// Open an in-memory, migrated workspace (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        db.migrate()?;
        Ok(Self::new(db))
    }
}

impl<S: KeyValueStore> Workspace<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clients(&self) -> ClientStore<'_> {
        ClientStore::new(&self.store)
    }

    pub fn projects(&self) -> ProjectStore<'_> {
        ProjectStore::new(&self.store)
    }

    pub fn tasks(&self) -> TaskStore<'_> {
        TaskStore::new(&self.store)
    }

    pub fn time_entries(&self) -> TimeEntryStore<'_> {
        TimeEntryStore::new(&self.store)
    }

    /// Read all four collections for analytics.
    ///
    /// Each collection is read independently; a collection that cannot be
    /// read comes back empty.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            clients: self.clients().get_all(),
            projects: self.projects().get_all(),
            tasks: self.tasks().get_all(),
            time_entries: self.time_entries().get_all(),
        }
    }

    /// Recompute every derived field.
    pub fn repair(&self) -> Result<RepairReport> {
        consistency::repair_all(&self.store)
    }
}
