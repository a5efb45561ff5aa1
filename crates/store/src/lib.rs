//! SQLite persistence for normalized file metadata.
//!
//! This crate owns the `files` table and its full-text index. The database
//! is not the source of truth - the files on disk are. If the database is
//! deleted, it can be rebuilt by rescanning the filesystem.
//!
//! # Architecture
//! - [`Database`] opens the pool, applies PRAGMAs to every connection and
//!   runs the embedded migrations.
//! - [`Store`] is the repository: one row per absolute path, replaced in
//!   full on re-scan, queried through [`SearchQuery`] predicates, facet
//!   listings and aggregate [`Statistics`].
//! - An external-content FTS5 table over name, author, title and keywords
//!   backs free-text search and is kept in sync by triggers.

mod db;
pub mod error;
mod models;
mod repo;
mod search;

pub use crate::db::Database;
pub use crate::repo::{Statistics, Store};
pub use crate::search::{DEFAULT_LIMIT, Facet, SearchQuery};
