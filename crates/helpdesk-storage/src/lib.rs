//! Helpdesk storage crate - record sources and the repository with fallback.
//!
//! Provides a WAL-mode SQLite database with migrations, a json-server style
//! REST client, a read-only static snapshot, and `FallbackRepository` which
//! serves reads from the static snapshot whenever the primary source fails.

pub mod db;
pub mod fallback;
pub mod migrations;
pub mod remote;
pub mod repository;
pub mod source;

pub use db::Database;
pub use fallback::{FallbackRepository, Fetched, Origin, StaticSource};
pub use remote::RemoteSource;
pub use repository::SqliteRepository;
pub use source::{Mutation, Record, RecordSource};
