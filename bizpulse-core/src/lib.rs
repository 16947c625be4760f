//! # bizpulse-core
//!
//! Core library for bizpulse - client, project and time tracking with
//! business analytics.
//!
//! This library provides:
//! - Domain types for clients, projects, tasks and time entries
//! - Record stores over a SQLite-backed key-value store
//! - Cross-store consistency updates for derived fields
//! - The analytics engine (revenue, productivity, time, trends)
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Storage:** one JSON document per collection in the `records` table
//! - **Records:** stores that create, update and delete whole records, keeping
//!   derived counts in sync
//! - **Analytics:** pure functions over a [`Snapshot`] of all collections,
//!   recomputed on every request
//!
//! ## Example
//!
//! ```rust,no_run
//! use bizpulse_core::analytics::AnalyticsEngine;
//! use bizpulse_core::{Config, Database, Workspace};
//!
//! let config = Config::load().expect("failed to load config");
//!
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//! let workspace = Workspace::new(db);
//!
//! let engine = AnalyticsEngine::new(config.analytics);
//! let overview = engine.overview(&workspace.snapshot(), None, chrono::Utc::now());
//! println!("{} billable hours", overview.billable_hours);
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{AnalyticsEngine, AnalyticsFilter, Snapshot};
pub use config::Config;
pub use db::{Database, KeyValueStore};
pub use error::{Error, Result};
pub use store::{ClientStore, ProjectStore, TaskStore, TimeEntryStore};
pub use types::*;
pub use workspace::Workspace;

// Public modules
pub mod analytics;
pub mod config;
pub mod consistency;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod store;
pub mod types;
pub mod workspace;
