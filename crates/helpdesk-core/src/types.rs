use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HelpdeskError, Result};

// =============================================================================
// Enums
// =============================================================================

/// Role of an authenticated account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May manage the knowledge base and resolve issues.
    Admin,
    /// May only use the chat.
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::str::FromStr for Role {
    type Err = HelpdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(HelpdeskError::Serialization(format!(
                "unknown role '{}'",
                other
            ))),
        }
    }
}

/// Lifecycle of an escalated issue. Moves pending -> resolved only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    #[default]
    Pending,
    Resolved,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Pending => "pending",
            IssueStatus::Resolved => "resolved",
        }
    }

    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: IssueStatus) -> bool {
        matches!(
            (self, next),
            (IssueStatus::Pending, _) | (IssueStatus::Resolved, IssueStatus::Resolved)
        )
    }
}

impl std::str::FromStr for IssueStatus {
    type Err = HelpdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(IssueStatus::Pending),
            "resolved" => Ok(IssueStatus::Resolved),
            other => Err(HelpdeskError::Serialization(format!(
                "unknown issue status '{}'",
                other
            ))),
        }
    }
}

// =============================================================================
// Knowledge base
// =============================================================================

/// One troubleshooting question with its ordered remediation steps.
///
/// The REST store dialect names the step list `answer`; both spellings are
/// accepted on input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: i64,
    pub question: String,
    #[serde(alias = "answer")]
    pub steps: Vec<String>,
}

impl KnowledgeEntry {
    pub fn from_draft(id: i64, draft: KnowledgeDraft) -> Self {
        Self {
            id,
            question: draft.question,
            steps: draft.steps,
        }
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

/// Create/update payload for a knowledge-base entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeDraft {
    pub question: String,
    #[serde(alias = "answer")]
    pub steps: Vec<String>,
}

impl KnowledgeDraft {
    /// Trim the question and steps, drop blank steps, and reject drafts
    /// without a question or without any remaining step.
    pub fn normalized(self) -> Result<Self> {
        let question = self.question.trim().to_string();
        if question.is_empty() {
            return Err(HelpdeskError::Validation(
                "question must not be empty".to_string(),
            ));
        }
        let steps: Vec<String> = self
            .steps
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if steps.is_empty() {
            return Err(HelpdeskError::Validation(
                "at least one non-empty step is required".to_string(),
            ));
        }
        Ok(Self { question, steps })
    }
}

impl From<KnowledgeEntry> for KnowledgeDraft {
    fn from(entry: KnowledgeEntry) -> Self {
        Self {
            question: entry.question,
            steps: entry.steps,
        }
    }
}

// =============================================================================
// Escalated issues
// =============================================================================

/// An unresolved problem forwarded to human support.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalatedIssue {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    #[serde(default, alias = "originalQuestion")]
    pub original_question: Option<String>,
    #[serde(default)]
    pub status: IssueStatus,
    pub timestamp: DateTime<Utc>,
}

impl EscalatedIssue {
    pub fn from_draft(id: String, draft: IssueDraft) -> Self {
        Self {
            id,
            name: draft.name,
            email: draft.email,
            subject: draft.subject,
            message: draft.message,
            original_question: draft.original_question,
            status: draft.status,
            timestamp: draft.timestamp,
        }
    }
}

/// REST stores hand out either numeric or string ids for new issues.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Create/update payload for an escalated issue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDraft {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    #[serde(default, alias = "originalQuestion")]
    pub original_question: Option<String>,
    #[serde(default)]
    pub status: IssueStatus,
    pub timestamp: DateTime<Utc>,
}

impl IssueDraft {
    /// A freshly submitted, pending issue stamped with the current time.
    pub fn pending(
        name: String,
        email: String,
        subject: String,
        message: String,
        original_question: Option<String>,
    ) -> Self {
        Self {
            name,
            email,
            subject,
            message,
            original_question,
            status: IssueStatus::Pending,
            timestamp: Utc::now(),
        }
    }
}

impl From<EscalatedIssue> for IssueDraft {
    fn from(issue: EscalatedIssue) -> Self {
        Self {
            name: issue.name,
            email: issue.email,
            subject: issue.subject,
            message: issue.message,
            original_question: issue.original_question,
            status: issue.status,
            timestamp: issue.timestamp,
        }
    }
}

// =============================================================================
// Accounts
// =============================================================================

/// Public view of an account. Never carries the password.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Stored account record including the credential it is matched against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
}

impl UserRecord {
    /// Exact email + password match, as the login form submits them.
    pub fn matches(&self, email: &str, password: &str) -> bool {
        self.email == email && self.password == password
    }

    pub fn account(&self) -> UserAccount {
        UserAccount {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}
