//! Database layer for bizpulse
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - A key-value record table holding JSON documents
//! - The [`KeyValueStore`] seam the record stores are written against

pub mod repo;
pub mod schema;

pub use repo::Database;

use crate::error::Result;

/// Persistence contract consumed by the record stores.
///
/// Values are opaque JSON documents; each key holds one whole collection.
pub trait KeyValueStore {
    /// Read the value under `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
