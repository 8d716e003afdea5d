use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use helpdesk_core::types::EscalatedIssue;

use crate::error::ChatError;
use crate::session::SessionSnapshot;

/// Subject pre-filled in the escalation form.
pub const DEFAULT_SUBJECT: &str = "IT Support Query";

// =============================================================================
// Turns
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// One displayed chat message. Never mutated after it is logged.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// 1-based step number when this turn carries a remediation step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_count: Option<usize>,
    /// Show the "It worked!" / "Still not working" / "Contact support" buttons.
    #[serde(default)]
    pub offers_actions: bool,
    /// Show the send-mail option.
    #[serde(default)]
    pub offers_escalation: bool,
}

impl ConversationTurn {
    fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker,
            text: text.into(),
            timestamp: Utc::now(),
            step_index: None,
            step_count: None,
            offers_actions: false,
            offers_escalation: false,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Speaker::Assistant, text)
    }

    /// A remediation step, `index` being 0-based.
    pub fn step(text: impl Into<String>, index: usize, count: usize) -> Self {
        Self {
            step_index: Some(index + 1),
            step_count: Some(count),
            offers_actions: true,
            ..Self::new(Speaker::Assistant, text)
        }
    }

    pub fn with_escalation(mut self) -> Self {
        self.offers_escalation = true;
        self
    }

    pub fn is_step(&self) -> bool {
        self.step_index.is_some()
    }
}

// =============================================================================
// Actions
// =============================================================================

/// Outcome buttons offered under a step turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Worked,
    NotWorking,
    ContactSupport,
}

impl Action {
    /// Button label, echoed into the log as the user's turn.
    pub fn label(&self) -> &'static str {
        match self {
            Action::Worked => "It worked!",
            Action::NotWorking => "Still not working",
            Action::ContactSupport => "Contact support",
        }
    }
}

// =============================================================================
// Escalation form
// =============================================================================

/// The mail form a user fills in to reach human support.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EscalationForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}

impl EscalationForm {
    /// Trim every field and require all four to be non-empty.
    pub fn validate(&self) -> Result<EscalationForm, ChatError> {
        let form = EscalationForm {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        };

        let missing: Vec<&'static str> = [
            ("name", &form.name),
            ("email", &form.email),
            ("subject", &form.subject),
            ("message", &form.message),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(form)
        } else {
            Err(ChatError::MissingFields(missing))
        }
    }
}

// =============================================================================
// Request / response bodies
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub action: Action,
}

/// Turns appended by one call, plus the resulting session state.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub session_id: Uuid,
    pub turns: Vec<ConversationTurn>,
    pub state: SessionSnapshot,
    /// The knowledge base was served from built-in data.
    pub offline: bool,
}

/// Result of a successful escalation.
#[derive(Debug, Clone, Serialize)]
pub struct EscalationReceipt {
    pub session_id: Uuid,
    pub turn: ConversationTurn,
    /// The stored issue, in store mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<EscalatedIssue>,
    /// The compose link, in mailto mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mailto: Option<String>,
}

// =============================================================================
// Conversations
// =============================================================================

/// The account acting on a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participant {
    pub account_id: i64,
    pub admin: bool,
}

impl Participant {
    pub fn user(account_id: i64) -> Self {
        Self {
            account_id,
            admin: false,
        }
    }

    pub fn admin(account_id: i64) -> Self {
        Self {
            account_id,
            admin: true,
        }
    }

    /// Admins reach every conversation; users only their own.
    pub fn can_access(&self, owner_id: i64) -> bool {
        self.admin || self.account_id == owner_id
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub owner_id: i64,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub turn_count: usize,
    pub in_progress: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationDetail {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub state: SessionSnapshot,
    pub turns: Vec<ConversationTurn>,
}
