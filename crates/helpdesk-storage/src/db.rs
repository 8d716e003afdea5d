//! Database connection management.
//!
//! Wraps a single rusqlite Connection in a Mutex for thread-safe access.
//! Configures WAL mode on initialization and runs migrations.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use helpdesk_core::error::HelpdeskError;
use helpdesk_core::types::{KnowledgeEntry, UserRecord};

use crate::migrations;

/// Thread-safe SQLite database wrapper.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database at the given path and run pending
    /// migrations.
    pub fn new(path: &Path) -> Result<Self, HelpdeskError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| HelpdeskError::Storage(format!("Failed to open database: {}", e)))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(|e| HelpdeskError::Storage(format!("Failed to set pragmas: {}", e)))?;

        info!("Database opened at {}", path.display());

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, HelpdeskError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| HelpdeskError::Storage(format!("Failed to open in-memory db: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Execute a closure with a reference to the underlying connection.
    ///
    /// The mutex is held for the duration of the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, HelpdeskError>
    where
        F: FnOnce(&Connection) -> Result<T, HelpdeskError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| HelpdeskError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Populate empty tables with the given knowledge base and accounts.
    ///
    /// Tables that already hold rows are left alone. Returns whether
    /// anything was inserted.
    pub fn seed_if_empty(
        &self,
        entries: &[KnowledgeEntry],
        users: &[UserRecord],
    ) -> Result<bool, HelpdeskError> {
        self.with_conn(|conn| {
            let mut seeded = false;

            let qa_count: i64 = conn
                .query_row("SELECT COUNT(*) FROM qa", [], |row| row.get(0))
                .map_err(|e| HelpdeskError::Storage(e.to_string()))?;
            if qa_count == 0 && !entries.is_empty() {
                for entry in entries {
                    conn.execute(
                        "INSERT INTO qa (id, question, steps) VALUES (?1, ?2, ?3)",
                        rusqlite::params![
                            entry.id,
                            entry.question,
                            serde_json::to_string(&entry.steps)?,
                        ],
                    )
                    .map_err(|e| HelpdeskError::Storage(format!("Failed to seed qa: {}", e)))?;
                }
                info!(count = entries.len(), "Seeded knowledge base");
                seeded = true;
            }

            let user_count: i64 = conn
                .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
                .map_err(|e| HelpdeskError::Storage(e.to_string()))?;
            if user_count == 0 && !users.is_empty() {
                for user in users {
                    conn.execute(
                        "INSERT INTO users (id, email, password, name, role)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        rusqlite::params![
                            user.id,
                            user.email,
                            user.password,
                            user.name,
                            user.role.as_str(),
                        ],
                    )
                    .map_err(|e| HelpdeskError::Storage(format!("Failed to seed users: {}", e)))?;
                }
                info!(count = users.len(), "Seeded user accounts");
                seeded = true;
            }

            Ok(seeded)
        })
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}
