//! Application state shared across all route handlers.
//!
//! AppState holds references to all services and shared resources.
//! It is passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use helpdesk_chat::ChatOrchestrator;
use helpdesk_core::config::HelpdeskConfig;
use helpdesk_core::types::{EscalatedIssue, KnowledgeEntry};
use helpdesk_storage::FallbackRepository;

use crate::auth::AuthGate;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<HelpdeskConfig>,
    /// Conversation table and engine.
    pub chat: Arc<ChatOrchestrator>,
    /// Knowledge base with static fallback.
    pub knowledge: Arc<FallbackRepository<KnowledgeEntry>>,
    /// Escalated issues; the fallback is empty.
    pub issues: Arc<FallbackRepository<EscalatedIssue>>,
    /// Login and session tokens.
    pub auth: Arc<AuthGate>,
    /// Broadcast sender for SSE events.
    pub event_tx: tokio::sync::broadcast::Sender<serde_json::Value>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: HelpdeskConfig,
        chat: Arc<ChatOrchestrator>,
        knowledge: Arc<FallbackRepository<KnowledgeEntry>>,
        issues: Arc<FallbackRepository<EscalatedIssue>>,
        auth: AuthGate,
    ) -> Self {
        let (event_tx, _) = tokio::sync::broadcast::channel(256);
        Self {
            config: Arc::new(config),
            chat,
            knowledge,
            issues,
            auth: Arc::new(auth),
            event_tx,
            start_time: Instant::now(),
        }
    }

    /// Publish an event to SSE subscribers. Dropped when nobody listens.
    pub fn emit(&self, kind: &str, payload: serde_json::Value) {
        let event = serde_json::json!({
            "type": kind,
            "payload": payload,
            "timestamp": chrono::Utc::now(),
        });
        let _ = self.event_tx.send(event);
    }
}
