//! Database schema migrations.
//!
//! Applies the initial schema: the qa, submitted_issues, users and
//! schema_migrations tables.

use rusqlite::Connection;
use tracing::info;

use helpdesk_core::error::HelpdeskError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), HelpdeskError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| HelpdeskError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| HelpdeskError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), HelpdeskError> {
    conn.execute_batch(
        "
        -- Knowledge base. Steps are a JSON array of strings.
        CREATE TABLE IF NOT EXISTS qa (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            question    TEXT NOT NULL,
            steps       TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS submitted_issues (
            id                  TEXT PRIMARY KEY NOT NULL,
            name                TEXT NOT NULL,
            email               TEXT NOT NULL,
            subject             TEXT NOT NULL,
            message             TEXT NOT NULL,
            original_question   TEXT,
            status              TEXT NOT NULL DEFAULT 'pending'
                                CHECK (status IN ('pending', 'resolved')),
            timestamp_ms        INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_submitted_issues_timestamp
            ON submitted_issues (timestamp_ms DESC);

        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            name        TEXT NOT NULL,
            role        TEXT NOT NULL DEFAULT 'user'
                        CHECK (role IN ('admin', 'user'))
        );

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| HelpdeskError::Storage(format!("Migration v1 failed: {}", e)))?;

    Ok(())
}
