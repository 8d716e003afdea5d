//! Guided troubleshooting conversations.
//!
//! Matches user input to knowledge-base entries, walks the user through
//! their steps one at a time, and escalates unresolved issues to support.

pub mod engine;
pub mod error;
pub mod escalation;
pub mod log;
pub mod matcher;
pub mod orchestrator;
pub mod session;
pub mod types;

pub use error::ChatError;
pub use orchestrator::ChatOrchestrator;
pub use session::{SessionSnapshot, SessionState};
pub use types::{
    Action, ActionRequest, ChatReply, ConversationDetail, ConversationSummary, ConversationTurn,
    EscalationForm, EscalationReceipt, MessageRequest, Participant, Speaker,
};
