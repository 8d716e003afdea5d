//! Chat orchestrator: owns the conversation table and wires the engine to
//! the knowledge-base and issue repositories.
//!
//! Every conversation carries its own `SessionState`, message log and
//! knowledge-base snapshot, and belongs to the account that opened it. A
//! conversation owned by someone else looks exactly like a missing one. The
//! simulated typing delay is awaited with no lock held.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use helpdesk_core::config::{ChatConfig, EscalationConfig, EscalationMode};
use helpdesk_core::types::{EscalatedIssue, KnowledgeEntry};
use helpdesk_storage::{FallbackRepository, Mutation};

use crate::engine;
use crate::error::ChatError;
use crate::escalation;
use crate::log::MessageLog;
use crate::session::{SessionSnapshot, SessionState};
use crate::types::{
    Action, ChatReply, ConversationDetail, ConversationSummary, ConversationTurn, EscalationForm,
    EscalationReceipt, Participant,
};

struct Conversation {
    id: Uuid,
    owner_id: i64,
    started_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
    state: SessionState,
    log: MessageLog,
    knowledge: Vec<KnowledgeEntry>,
}

impl Conversation {
    fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }

    fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id,
            owner_id: self.owner_id,
            started_at: self.started_at,
            last_activity_at: self.last_activity_at,
            turn_count: self.log.len(),
            in_progress: self.state.in_progress(),
        }
    }
}

/// Central coordinator for guided troubleshooting conversations.
pub struct ChatOrchestrator {
    conversations: Mutex<HashMap<Uuid, Conversation>>,
    knowledge: Arc<FallbackRepository<KnowledgeEntry>>,
    issues: Arc<FallbackRepository<EscalatedIssue>>,
    config: ChatConfig,
    escalation: EscalationConfig,
}

impl ChatOrchestrator {
    pub fn new(
        knowledge: Arc<FallbackRepository<KnowledgeEntry>>,
        issues: Arc<FallbackRepository<EscalatedIssue>>,
        config: ChatConfig,
        escalation: EscalationConfig,
    ) -> Self {
        Self {
            conversations: Mutex::new(HashMap::new()),
            knowledge,
            issues,
            config,
            escalation,
        }
    }

    /// Open a conversation owned by `caller` and greet them.
    pub async fn start_session(&self, caller: Participant) -> Result<ChatReply, ChatError> {
        let fetched = self.knowledge.fetch_all().await;
        let offline = fetched.is_fallback();
        let now = Utc::now();
        let welcome = ConversationTurn::assistant(engine::welcome_text(fetched.records.len()));

        let mut log = MessageLog::new();
        log.push(welcome.clone());
        let conversation = Conversation {
            id: Uuid::new_v4(),
            owner_id: caller.account_id,
            started_at: now,
            last_activity_at: now,
            state: SessionState::Idle,
            log,
            knowledge: fetched.records,
        };
        let id = conversation.id;

        let mut conversations = self.lock()?;
        self.evict_expired(&mut conversations);
        conversations.insert(id, conversation);
        info!(session_id = %id, owner_id = caller.account_id, offline, "Conversation started");

        Ok(ChatReply {
            session_id: id,
            turns: vec![welcome],
            state: SessionSnapshot::idle(),
            offline,
        })
    }

    /// Handle one typed message.
    ///
    /// The user turn is logged immediately; the assistant turns follow after
    /// the typing delay.
    pub async fn handle_message(
        &self,
        caller: Participant,
        session_id: Uuid,
        text: &str,
    ) -> Result<ChatReply, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.chars().count() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }
        self.ensure_access(caller, session_id)?;

        let fetched = self.knowledge.fetch_all().await;
        let offline = fetched.is_fallback();

        let user_turn = {
            let mut conversations = self.lock()?;
            let conversation = owned_mut(&mut conversations, caller, session_id)?;
            conversation.knowledge = fetched.records;
            conversation.touch();
            conversation.log.push_question(text)
        };

        self.typing_pause().await;

        let mut conversations = self.lock()?;
        let conversation = owned_mut(&mut conversations, caller, session_id)?;
        let replies = engine::respond(&mut conversation.state, &conversation.knowledge, text);
        conversation.log.extend(replies.iter().cloned());
        conversation.touch();
        debug!(
            session_id = %session_id,
            in_progress = conversation.state.in_progress(),
            next_step = conversation.state.next_step_index(),
            "Message handled"
        );

        let mut turns = Vec::with_capacity(replies.len() + 1);
        turns.push(user_turn);
        turns.extend(replies);
        Ok(ChatReply {
            session_id,
            turns,
            state: conversation.state.snapshot(),
            offline,
        })
    }

    /// Handle an action button under a step turn.
    pub async fn handle_action(
        &self,
        caller: Participant,
        session_id: Uuid,
        action: Action,
    ) -> Result<ChatReply, ChatError> {
        let user_turn = {
            let mut conversations = self.lock()?;
            let conversation = owned_mut(&mut conversations, caller, session_id)?;
            let turn = ConversationTurn::user(action.label());
            conversation.log.push(turn.clone());
            conversation.touch();
            turn
        };

        self.typing_pause().await;

        let mut conversations = self.lock()?;
        let conversation = owned_mut(&mut conversations, caller, session_id)?;
        let replies = engine::handle_action(&mut conversation.state, action, &self.escalation);
        conversation.log.extend(replies.iter().cloned());
        conversation.touch();
        debug!(session_id = %session_id, ?action, "Action handled");

        let mut turns = vec![user_turn];
        turns.extend(replies);
        Ok(ChatReply {
            session_id,
            turns,
            state: conversation.state.snapshot(),
            offline: !self.knowledge.is_online(),
        })
    }

    /// Forward the conversation to human support.
    ///
    /// An incomplete form or an unreachable issue store leaves the
    /// conversation exactly as it was.
    pub async fn escalate(
        &self,
        caller: Participant,
        session_id: Uuid,
        form: &EscalationForm,
    ) -> Result<EscalationReceipt, ChatError> {
        let original_question = {
            let conversations = self.lock()?;
            let conversation = owned(&conversations, caller, session_id)?;
            conversation.log.last_user_question().map(str::to_string)
        };
        let form = form.validate()?;

        let (issue, mailto, text) = match self.escalation.mode {
            EscalationMode::Store => {
                let draft = escalation::issue_draft(&form, original_question.as_deref());
                let issue = self.issues.mutate(Mutation::Create(draft)).await?;
                (issue, None, escalation::STORED_CONFIRMATION)
            }
            EscalationMode::Mailto => {
                let link = escalation::mailto_link(
                    &self.escalation.support_email,
                    &form,
                    original_question.as_deref(),
                );
                (None, Some(link), escalation::MAILTO_CONFIRMATION)
            }
        };

        let turn = ConversationTurn::assistant(text);
        {
            let mut conversations = self.lock()?;
            let conversation = owned_mut(&mut conversations, caller, session_id)?;
            conversation.log.push(turn.clone());
            conversation.touch();
        }
        info!(
            session_id = %session_id,
            issue_id = issue.as_ref().map(|i| i.id.as_str()).unwrap_or("-"),
            "Issue escalated"
        );

        Ok(EscalationReceipt {
            session_id,
            turn,
            issue,
            mailto,
        })
    }

    pub fn get_session(
        &self,
        caller: Participant,
        session_id: Uuid,
    ) -> Result<ConversationDetail, ChatError> {
        let conversations = self.lock()?;
        let conversation = owned(&conversations, caller, session_id)?;
        Ok(ConversationDetail {
            id: conversation.id,
            started_at: conversation.started_at,
            last_activity_at: conversation.last_activity_at,
            state: conversation.state.snapshot(),
            turns: conversation.log.turns().to_vec(),
        })
    }

    pub fn get_history(
        &self,
        caller: Participant,
        session_id: Uuid,
    ) -> Result<Vec<ConversationTurn>, ChatError> {
        let conversations = self.lock()?;
        let conversation = owned(&conversations, caller, session_id)?;
        Ok(conversation.log.turns().to_vec())
    }

    pub fn get_state(
        &self,
        caller: Participant,
        session_id: Uuid,
    ) -> Result<SessionSnapshot, ChatError> {
        let conversations = self.lock()?;
        let conversation = owned(&conversations, caller, session_id)?;
        Ok(conversation.state.snapshot())
    }

    /// Live conversations `caller` may see, oldest first.
    pub fn list_sessions(&self, caller: Participant) -> Vec<ConversationSummary> {
        let conversations = match self.conversations.lock() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut summaries: Vec<ConversationSummary> = conversations
            .values()
            .filter(|c| caller.can_access(c.owner_id))
            .map(Conversation::summary)
            .collect();
        summaries.sort_by_key(|s| s.started_at);
        summaries
    }

    /// Number of live conversations across all accounts.
    pub fn session_count(&self) -> usize {
        self.conversations.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn delete_session(&self, caller: Participant, session_id: Uuid) -> Result<(), ChatError> {
        let mut conversations = self.lock()?;
        owned(&conversations, caller, session_id)?;
        conversations.remove(&session_id);
        info!(session_id = %session_id, "Conversation deleted");
        Ok(())
    }

    // -- Private helpers --

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Conversation>>, ChatError> {
        self.conversations
            .lock()
            .map_err(|e| ChatError::StorageError(format!("conversation lock poisoned: {}", e)))
    }

    fn ensure_access(&self, caller: Participant, session_id: Uuid) -> Result<(), ChatError> {
        let conversations = self.lock()?;
        owned(&conversations, caller, session_id)?;
        Ok(())
    }

    async fn typing_pause(&self) {
        if self.config.typing_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.typing_delay_ms)).await;
        }
    }

    fn evict_expired(&self, conversations: &mut HashMap<Uuid, Conversation>) {
        let timeout = chrono::Duration::minutes(i64::from(self.config.session_timeout_minutes));
        let cutoff = Utc::now() - timeout;
        let before = conversations.len();
        conversations.retain(|_, c| c.last_activity_at >= cutoff);
        let evicted = before - conversations.len();
        if evicted > 0 {
            info!(evicted, "Evicted idle conversations");
        }
    }
}

fn owned<'a>(
    conversations: &'a HashMap<Uuid, Conversation>,
    caller: Participant,
    session_id: Uuid,
) -> Result<&'a Conversation, ChatError> {
    conversations
        .get(&session_id)
        .filter(|c| caller.can_access(c.owner_id))
        .ok_or(ChatError::SessionNotFound(session_id))
}

fn owned_mut<'a>(
    conversations: &'a mut HashMap<Uuid, Conversation>,
    caller: Participant,
    session_id: Uuid,
) -> Result<&'a mut Conversation, ChatError> {
    conversations
        .get_mut(&session_id)
        .filter(|c| caller.can_access(c.owner_id))
        .ok_or(ChatError::SessionNotFound(session_id))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use helpdesk_core::error::HelpdeskError;
    use helpdesk_core::seed;
    use helpdesk_storage::{Database, Record, RecordSource, SqliteRepository, StaticSource};

    use crate::engine::{CLOSING_TEXT, WORKED_TEXT};
    use crate::types::Speaker;

    const USER: Participant = Participant {
        account_id: 2,
        admin: false,
    };
    const OTHER: Participant = Participant {
        account_id: 3,
        admin: false,
    };
    const ADMIN: Participant = Participant {
        account_id: 1,
        admin: true,
    };

    struct Harness {
        orch: ChatOrchestrator,
        issues: Arc<FallbackRepository<EscalatedIssue>>,
    }

    fn chat_config() -> ChatConfig {
        ChatConfig {
            typing_delay_ms: 0,
            ..ChatConfig::default()
        }
    }

    fn harness_with(escalation: EscalationConfig) -> Harness {
        let db = Database::in_memory().unwrap();
        db.seed_if_empty(&seed::knowledge_base(), &seed::demo_users())
            .unwrap();
        let repo = Arc::new(SqliteRepository::new(Arc::new(db)));
        let knowledge = Arc::new(FallbackRepository::new(
            repo.clone() as Arc<dyn RecordSource<KnowledgeEntry>>,
            StaticSource::new(seed::knowledge_base()),
        ));
        let issues = Arc::new(FallbackRepository::new(
            repo as Arc<dyn RecordSource<EscalatedIssue>>,
            StaticSource::empty(),
        ));
        Harness {
            orch: ChatOrchestrator::new(knowledge, issues.clone(), chat_config(), escalation),
            issues,
        }
    }

    fn harness() -> Harness {
        harness_with(EscalationConfig::default())
    }

    /// A primary store that never answers.
    struct Unreachable;

    #[async_trait]
    impl<T: Record> RecordSource<T> for Unreachable {
        async fn fetch_all(&self) -> helpdesk_core::Result<Vec<T>> {
            Err(HelpdeskError::Unavailable("connection refused".into()))
        }

        async fn fetch_one(&self, _id: &T::Id) -> helpdesk_core::Result<Option<T>> {
            Err(HelpdeskError::Unavailable("connection refused".into()))
        }

        async fn mutate(&self, _mutation: Mutation<T>) -> helpdesk_core::Result<Option<T>> {
            Err(HelpdeskError::Unavailable("connection refused".into()))
        }
    }

    /// Both stores unreachable: reads come from the built-in snapshot.
    fn offline_harness() -> Harness {
        let knowledge = Arc::new(FallbackRepository::new(
            Arc::new(Unreachable) as Arc<dyn RecordSource<KnowledgeEntry>>,
            StaticSource::new(seed::knowledge_base()),
        ));
        let issues = Arc::new(FallbackRepository::new(
            Arc::new(Unreachable) as Arc<dyn RecordSource<EscalatedIssue>>,
            StaticSource::empty(),
        ));
        Harness {
            orch: ChatOrchestrator::new(
                knowledge,
                issues.clone(),
                chat_config(),
                EscalationConfig::default(),
            ),
            issues,
        }
    }

    fn valid_form() -> EscalationForm {
        EscalationForm {
            name: "Jane Smith".into(),
            email: "jane@example.com".into(),
            subject: "IT Support Query".into(),
            message: "Nothing worked".into(),
        }
    }

    #[tokio::test]
    async fn test_start_session_greets() {
        let h = harness();
        let reply = h.orch.start_session(USER).await.unwrap();
        assert_eq!(reply.turns.len(), 1);
        assert!(reply.turns[0].text.contains("(1-5)"));
        assert!(!reply.offline);
        assert!(!reply.state.in_progress);
        assert_eq!(h.orch.list_sessions(USER).len(), 1);
    }

    #[tokio::test]
    async fn test_empty_message_rejected_without_logging() {
        let h = harness();
        let sid = h.orch.start_session(USER).await.unwrap().session_id;
        let err = h.orch.handle_message(USER, sid, "   ").await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));
        assert_eq!(h.orch.get_history(USER, sid).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_message_too_long() {
        let h = harness();
        let sid = h.orch.start_session(USER).await.unwrap().session_id;
        let long = "a".repeat(2001);
        let err = h.orch.handle_message(USER, sid, &long).await.unwrap_err();
        assert!(matches!(err, ChatError::MessageTooLong(2000)));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let h = harness();
        let err = h.orch.handle_message(USER, Uuid::new_v4(), "3").await.unwrap_err();
        assert!(matches!(err, ChatError::SessionNotFound(_)));
        assert!(h.orch.get_state(USER, Uuid::new_v4()).is_err());
    }

    #[tokio::test]
    async fn test_message_appends_user_then_assistant() {
        let h = harness();
        let sid = h.orch.start_session(USER).await.unwrap().session_id;
        let reply = h.orch.handle_message(USER, sid, "3").await.unwrap();

        assert_eq!(reply.turns.len(), 3);
        assert_eq!(reply.turns[0].speaker, Speaker::User);
        assert_eq!(reply.turns[0].text, "3");
        assert_eq!(reply.turns[2].text, "Close the application completely and restart it");
        assert_eq!(reply.turns[2].step_index, Some(1));
        assert_eq!(reply.turns[2].step_count, Some(6));
        assert!(reply.state.in_progress);
        assert_eq!(reply.state.next_step_index, 1);

        let history = h.orch.get_history(USER, sid).unwrap();
        assert_eq!(history.len(), 4);
    }

    #[tokio::test]
    async fn test_full_walkthrough_ends_idle() {
        let h = harness();
        let sid = h.orch.start_session(USER).await.unwrap().session_id;
        h.orch.handle_message(USER, sid, "2").await.unwrap();
        for _ in 0..5 {
            h.orch.handle_message(USER, sid, "next").await.unwrap();
        }
        let reply = h.orch.handle_message(USER, sid, "next").await.unwrap();
        // All six steps shown; one more "next" closes out.
        assert_eq!(reply.turns[1].text, CLOSING_TEXT);
        assert_eq!(reply.state, SessionSnapshot::idle());

        let history = h.orch.get_history(USER, sid).unwrap();
        let steps = history.iter().filter(|t| t.is_step()).count();
        assert_eq!(steps, 6);
    }

    #[tokio::test]
    async fn test_actions_echo_labels() {
        let h = harness();
        let sid = h.orch.start_session(USER).await.unwrap().session_id;
        h.orch.handle_message(USER, sid, "1").await.unwrap();

        let reply = h.orch.handle_action(USER, sid, Action::NotWorking).await.unwrap();
        assert_eq!(reply.turns[0].text, "Still not working");
        assert_eq!(reply.turns[1].step_index, Some(2));

        let reply = h.orch.handle_action(USER, sid, Action::Worked).await.unwrap();
        assert_eq!(reply.turns[0].text, "It worked!");
        assert_eq!(reply.turns[1].text, WORKED_TEXT);
        assert_eq!(reply.state, SessionSnapshot::idle());
    }

    #[tokio::test]
    async fn test_three_not_working_advance_cursor() {
        let h = harness();
        let sid = h.orch.start_session(USER).await.unwrap().session_id;
        h.orch.handle_message(USER, sid, "4").await.unwrap();
        let start = h.orch.get_state(USER, sid).unwrap().next_step_index;
        for _ in 0..3 {
            h.orch.handle_action(USER, sid, Action::NotWorking).await.unwrap();
        }
        assert_eq!(h.orch.get_state(USER, sid).unwrap().next_step_index, start + 3);
    }

    #[tokio::test]
    async fn test_escalation_stores_issue_with_original_question() {
        let h = harness();
        let sid = h.orch.start_session(USER).await.unwrap().session_id;
        h.orch.handle_message(USER, sid, "printer").await.unwrap();
        h.orch.handle_action(USER, sid, Action::ContactSupport).await.unwrap();

        let receipt = h.orch.escalate(USER, sid, &valid_form()).await.unwrap();
        let issue = receipt.issue.unwrap();
        assert_eq!(issue.original_question.as_deref(), Some("printer"));
        assert!(receipt.mailto.is_none());
        assert_eq!(receipt.turn.text, escalation::STORED_CONFIRMATION);

        let stored = h.issues.fetch_all().await.records;
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_escalation_changes_nothing() {
        let h = harness();
        let sid = h.orch.start_session(USER).await.unwrap().session_id;
        h.orch.handle_message(USER, sid, "3").await.unwrap();
        let state_before = h.orch.get_state(USER, sid).unwrap();
        let turns_before = h.orch.get_history(USER, sid).unwrap().len();

        let form = EscalationForm {
            email: String::new(),
            ..valid_form()
        };
        let err = h.orch.escalate(USER, sid, &form).await.unwrap_err();
        assert!(matches!(err, ChatError::MissingFields(_)));

        assert_eq!(h.orch.get_state(USER, sid).unwrap(), state_before);
        assert_eq!(h.orch.get_history(USER, sid).unwrap().len(), turns_before);
        assert!(h.issues.fetch_all().await.records.is_empty());
    }

    #[tokio::test]
    async fn test_mailto_mode_stores_nothing() {
        let h = harness_with(EscalationConfig {
            mode: EscalationMode::Mailto,
            ..EscalationConfig::default()
        });
        let sid = h.orch.start_session(USER).await.unwrap().session_id;
        h.orch.handle_message(USER, sid, "vpn").await.unwrap();
        let receipt = h.orch.escalate(USER, sid, &valid_form()).await.unwrap();
        let link = receipt.mailto.unwrap();
        assert!(link.starts_with("mailto:support@example.com?subject=IT%20Support%20Query"));
        assert!(receipt.issue.is_none());
        assert!(h.issues.fetch_all().await.records.is_empty());
    }

    #[tokio::test]
    async fn test_offline_store_serves_fallback_and_rejects_escalation() {
        let h = offline_harness();
        let reply = h.orch.start_session(USER).await.unwrap();
        assert!(reply.offline);
        let sid = reply.session_id;

        let reply = h.orch.handle_message(USER, sid, "3").await.unwrap();
        assert!(reply.offline);
        assert_eq!(reply.turns[2].text, "Close the application completely and restart it");

        let turns_before = h.orch.get_history(USER, sid).unwrap().len();
        let err = h.orch.escalate(USER, sid, &valid_form()).await.unwrap_err();
        assert!(matches!(err, ChatError::Offline(_)));
        assert_eq!(h.orch.get_history(USER, sid).unwrap().len(), turns_before);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let h = harness();
        let sid = h.orch.start_session(USER).await.unwrap().session_id;
        h.orch.delete_session(USER, sid).unwrap();
        assert!(h.orch.list_sessions(USER).is_empty());
        assert!(matches!(
            h.orch.delete_session(USER, sid),
            Err(ChatError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_conversations_evicted_on_start() {
        let h = harness();
        let stale = h.orch.start_session(USER).await.unwrap().session_id;
        {
            let mut conversations = h.orch.lock().unwrap();
            let c = conversations.get_mut(&stale).unwrap();
            c.last_activity_at = Utc::now() - chrono::Duration::minutes(31);
        }
        let fresh = h.orch.start_session(USER).await.unwrap().session_id;
        let ids: Vec<Uuid> = h.orch.list_sessions(USER).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![fresh]);
    }

    #[tokio::test]
    async fn test_admin_edit_does_not_touch_active_walkthrough() {
        let h = harness();
        let sid = h.orch.start_session(USER).await.unwrap().session_id;
        h.orch.handle_message(USER, sid, "1").await.unwrap();

        h.orch
            .knowledge
            .mutate(Mutation::Update(
                1,
                helpdesk_core::types::KnowledgeDraft {
                    question: "Edited".into(),
                    steps: vec!["Only step".into()],
                },
            ))
            .await
            .unwrap();

        let reply = h.orch.handle_message(USER, sid, "next").await.unwrap();
        assert_eq!(reply.turns[1].step_index, Some(2));
        assert_eq!(reply.turns[1].step_count, Some(6));
    }

    #[tokio::test]
    async fn test_conversation_hidden_from_other_accounts() {
        let h = harness();
        let sid = h.orch.start_session(USER).await.unwrap().session_id;
        h.orch.handle_message(USER, sid, "3").await.unwrap();

        assert!(h.orch.list_sessions(OTHER).is_empty());
        assert!(matches!(
            h.orch.get_history(OTHER, sid),
            Err(ChatError::SessionNotFound(_))
        ));
        assert!(matches!(
            h.orch.handle_message(OTHER, sid, "next").await,
            Err(ChatError::SessionNotFound(_))
        ));
        assert!(matches!(
            h.orch.handle_action(OTHER, sid, Action::Worked).await,
            Err(ChatError::SessionNotFound(_))
        ));
        assert!(matches!(
            h.orch.escalate(OTHER, sid, &valid_form()).await,
            Err(ChatError::SessionNotFound(_))
        ));
        assert!(matches!(
            h.orch.delete_session(OTHER, sid),
            Err(ChatError::SessionNotFound(_))
        ));

        // Nothing the other account tried reached the conversation.
        assert_eq!(h.orch.get_history(USER, sid).unwrap().len(), 4);
        assert!(h.issues.fetch_all().await.records.is_empty());
        assert_eq!(h.orch.list_sessions(USER)[0].owner_id, USER.account_id);
    }

    #[tokio::test]
    async fn test_admin_sees_every_conversation() {
        let h = harness();
        let mine = h.orch.start_session(USER).await.unwrap().session_id;
        let theirs = h.orch.start_session(OTHER).await.unwrap().session_id;

        assert_eq!(h.orch.list_sessions(USER).len(), 1);
        assert_eq!(h.orch.list_sessions(ADMIN).len(), 2);
        assert_eq!(h.orch.session_count(), 2);
        assert_eq!(h.orch.get_session(ADMIN, theirs).unwrap().id, theirs);
        h.orch.delete_session(ADMIN, mine).unwrap();
        assert_eq!(h.orch.session_count(), 1);
    }
}
