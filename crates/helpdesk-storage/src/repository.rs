//! SQLite-backed record sources.
//!
//! `SqliteRepository` implements `RecordSource` for the knowledge base, the
//! escalated issues and the user list, operating on the shared `Database`
//! with raw SQL.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use helpdesk_core::error::{HelpdeskError, Result};
use helpdesk_core::types::{EscalatedIssue, IssueStatus, KnowledgeEntry, Role, UserRecord};

use crate::db::Database;
use crate::source::{Mutation, RecordSource};

/// Record source over the local SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    db: Arc<Database>,
}

impl SqliteRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

fn storage_err(e: rusqlite::Error) -> HelpdeskError {
    HelpdeskError::Storage(e.to_string())
}

// =============================================================================
// Knowledge base
// =============================================================================

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn decode_entry((id, question, steps): (i64, String, String)) -> Result<KnowledgeEntry> {
    Ok(KnowledgeEntry {
        id,
        question,
        steps: serde_json::from_str(&steps)?,
    })
}

#[async_trait]
impl RecordSource<KnowledgeEntry> for SqliteRepository {
    async fn fetch_all(&self) -> Result<Vec<KnowledgeEntry>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, question, steps FROM qa ORDER BY id ASC")
                .map_err(storage_err)?;
            let rows = stmt.query_map([], row_to_entry).map_err(storage_err)?;
            let mut entries = Vec::new();
            for row in rows {
                entries.push(decode_entry(row.map_err(storage_err)?)?);
            }
            Ok(entries)
        })
    }

    async fn fetch_one(&self, id: &i64) -> Result<Option<KnowledgeEntry>> {
        self.db.with_conn(|conn| {
            let raw = conn
                .query_row(
                    "SELECT id, question, steps FROM qa WHERE id = ?1",
                    rusqlite::params![id],
                    row_to_entry,
                )
                .optional()
                .map_err(storage_err)?;
            raw.map(decode_entry).transpose()
        })
    }

    async fn mutate(&self, mutation: Mutation<KnowledgeEntry>) -> Result<Option<KnowledgeEntry>> {
        self.db.with_conn(|conn| match mutation {
            Mutation::Create(draft) => {
                conn.execute(
                    "INSERT INTO qa (question, steps) VALUES (?1, ?2)",
                    rusqlite::params![draft.question, serde_json::to_string(&draft.steps)?],
                )
                .map_err(|e| HelpdeskError::Storage(format!("Failed to create qa: {}", e)))?;
                let id = conn.last_insert_rowid();
                Ok(Some(KnowledgeEntry::from_draft(id, draft)))
            }
            Mutation::Update(id, draft) => {
                let changed = conn
                    .execute(
                        "UPDATE qa SET question = ?1, steps = ?2 WHERE id = ?3",
                        rusqlite::params![
                            draft.question,
                            serde_json::to_string(&draft.steps)?,
                            id
                        ],
                    )
                    .map_err(|e| HelpdeskError::Storage(format!("Failed to update qa: {}", e)))?;
                if changed == 0 {
                    return Err(HelpdeskError::NotFound(format!("qa/{}", id)));
                }
                Ok(Some(KnowledgeEntry::from_draft(id, draft)))
            }
            Mutation::Delete(id) => {
                let changed = conn
                    .execute("DELETE FROM qa WHERE id = ?1", rusqlite::params![id])
                    .map_err(storage_err)?;
                if changed == 0 {
                    return Err(HelpdeskError::NotFound(format!("qa/{}", id)));
                }
                Ok(None)
            }
        })
    }
}

// =============================================================================
// Escalated issues
// =============================================================================

const ISSUE_COLUMNS: &str =
    "id, name, email, subject, message, original_question, status, timestamp_ms";

fn row_to_issue(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<EscalatedIssue>> {
    let status: String = row.get(6)?;
    let timestamp_ms: i64 = row.get(7)?;
    Ok(build_issue(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        &status,
        timestamp_ms,
    ))
}

#[allow(clippy::too_many_arguments)]
fn build_issue(
    id: String,
    name: String,
    email: String,
    subject: String,
    message: String,
    original_question: Option<String>,
    status: &str,
    timestamp_ms: i64,
) -> Result<EscalatedIssue> {
    Ok(EscalatedIssue {
        id,
        name,
        email,
        subject,
        message,
        original_question,
        status: status.parse::<IssueStatus>()?,
        timestamp: millis_to_datetime(timestamp_ms)?,
    })
}

fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| HelpdeskError::Storage(format!("invalid timestamp {}", ms)))
}

#[async_trait]
impl RecordSource<EscalatedIssue> for SqliteRepository {
    async fn fetch_all(&self) -> Result<Vec<EscalatedIssue>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM submitted_issues ORDER BY rowid ASC",
                    ISSUE_COLUMNS
                ))
                .map_err(storage_err)?;
            let rows = stmt.query_map([], row_to_issue).map_err(storage_err)?;
            let mut issues = Vec::new();
            for row in rows {
                issues.push(row.map_err(storage_err)??);
            }
            Ok(issues)
        })
    }

    async fn fetch_one(&self, id: &String) -> Result<Option<EscalatedIssue>> {
        self.db.with_conn(|conn| {
            let found = conn
                .query_row(
                    &format!("SELECT {} FROM submitted_issues WHERE id = ?1", ISSUE_COLUMNS),
                    rusqlite::params![id],
                    row_to_issue,
                )
                .optional()
                .map_err(storage_err)?;
            found.transpose()
        })
    }

    async fn mutate(&self, mutation: Mutation<EscalatedIssue>) -> Result<Option<EscalatedIssue>> {
        self.db.with_conn(|conn| match mutation {
            Mutation::Create(draft) => {
                let id = Uuid::new_v4().simple().to_string();
                conn.execute(
                    "INSERT INTO submitted_issues
                        (id, name, email, subject, message, original_question, status, timestamp_ms)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    rusqlite::params![
                        id,
                        draft.name,
                        draft.email,
                        draft.subject,
                        draft.message,
                        draft.original_question,
                        draft.status.as_str(),
                        draft.timestamp.timestamp_millis(),
                    ],
                )
                .map_err(|e| HelpdeskError::Storage(format!("Failed to create issue: {}", e)))?;
                Ok(Some(EscalatedIssue::from_draft(id, draft)))
            }
            Mutation::Update(id, draft) => {
                let current: Option<String> = conn
                    .query_row(
                        "SELECT status FROM submitted_issues WHERE id = ?1",
                        rusqlite::params![id],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(storage_err)?;
                let Some(current) = current else {
                    return Err(HelpdeskError::NotFound(format!("submittedIssues/{}", id)));
                };
                let current = current.parse::<IssueStatus>()?;
                if !current.can_transition_to(draft.status) {
                    return Err(HelpdeskError::Conflict(format!(
                        "issue {} is {} and cannot move to {}",
                        id,
                        current.as_str(),
                        draft.status.as_str()
                    )));
                }
                let changed = conn
                    .execute(
                        "UPDATE submitted_issues
                         SET name = ?1, email = ?2, subject = ?3, message = ?4,
                             original_question = ?5, status = ?6, timestamp_ms = ?7
                         WHERE id = ?8",
                        rusqlite::params![
                            draft.name,
                            draft.email,
                            draft.subject,
                            draft.message,
                            draft.original_question,
                            draft.status.as_str(),
                            draft.timestamp.timestamp_millis(),
                            id,
                        ],
                    )
                    .map_err(|e| HelpdeskError::Storage(format!("Failed to update issue: {}", e)))?;
                if changed == 0 {
                    return Err(HelpdeskError::NotFound(format!("submittedIssues/{}", id)));
                }
                Ok(Some(EscalatedIssue::from_draft(id, draft)))
            }
            Mutation::Delete(id) => {
                let changed = conn
                    .execute(
                        "DELETE FROM submitted_issues WHERE id = ?1",
                        rusqlite::params![id],
                    )
                    .map_err(storage_err)?;
                if changed == 0 {
                    return Err(HelpdeskError::NotFound(format!("submittedIssues/{}", id)));
                }
                Ok(None)
            }
        })
    }
}

// =============================================================================
// Users (read-only)
// =============================================================================

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<UserRecord>> {
    let role: String = row.get(4)?;
    let role = match role.parse::<Role>() {
        Ok(role) => role,
        Err(e) => return Ok(Err(e)),
    };
    Ok(Ok(UserRecord {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        name: row.get(3)?,
        role,
    }))
}

#[async_trait]
impl RecordSource<UserRecord> for SqliteRepository {
    async fn fetch_all(&self) -> Result<Vec<UserRecord>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, email, password, name, role FROM users ORDER BY id ASC")
                .map_err(storage_err)?;
            let rows = stmt.query_map([], row_to_user).map_err(storage_err)?;
            let mut users = Vec::new();
            for row in rows {
                users.push(row.map_err(storage_err)??);
            }
            Ok(users)
        })
    }

    async fn fetch_one(&self, id: &i64) -> Result<Option<UserRecord>> {
        self.db.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT id, email, password, name, role FROM users WHERE id = ?1",
                    rusqlite::params![id],
                    row_to_user,
                )
                .optional()
                .map_err(storage_err)?;
            found.transpose()
        })
    }

    async fn mutate(&self, _mutation: Mutation<UserRecord>) -> Result<Option<UserRecord>> {
        Err(HelpdeskError::ReadOnly("users".to_string()))
    }
}
