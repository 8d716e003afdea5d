//! Append-only message log of one conversation.

use crate::types::ConversationTurn;

#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    turns: Vec<ConversationTurn>,
    /// Last free-text question typed by the user. Action-button echoes do
    /// not count.
    last_question: Option<String>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn extend(&mut self, turns: impl IntoIterator<Item = ConversationTurn>) {
        self.turns.extend(turns);
    }

    /// Log a typed user message and remember it as the latest question.
    pub fn push_question(&mut self, text: &str) -> ConversationTurn {
        let turn = ConversationTurn::user(text);
        self.last_question = Some(text.to_string());
        self.turns.push(turn.clone());
        turn
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last_user_question(&self) -> Option<&str> {
        self.last_question.as_deref()
    }
}
