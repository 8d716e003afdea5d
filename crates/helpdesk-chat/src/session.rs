//! Per-conversation cursor into the active knowledge-base entry.

use serde::Serialize;

use helpdesk_core::types::KnowledgeEntry;

/// Where a conversation stands in a guided walkthrough.
///
/// `Active` owns a clone of the entry, so knowledge-base edits never reach an
/// in-progress walkthrough. `next_step_index` stays within
/// `0..=entry.steps.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Active {
        entry: KnowledgeEntry,
        next_step_index: usize,
    },
}

impl SessionState {
    /// Cursor positioned after `shown` steps of `entry`, clamped to its length.
    pub fn active(entry: KnowledgeEntry, shown: usize) -> Self {
        let next_step_index = shown.min(entry.steps.len());
        SessionState::Active {
            entry,
            next_step_index,
        }
    }

    pub fn in_progress(&self) -> bool {
        matches!(self, SessionState::Active { .. })
    }

    pub fn active_entry(&self) -> Option<&KnowledgeEntry> {
        match self {
            SessionState::Idle => None,
            SessionState::Active { entry, .. } => Some(entry),
        }
    }

    pub fn next_step_index(&self) -> usize {
        match self {
            SessionState::Idle => 0,
            SessionState::Active {
                next_step_index, ..
            } => *next_step_index,
        }
    }

    pub fn reset(&mut self) {
        *self = SessionState::Idle;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            active_entry: self.active_entry().cloned(),
            next_step_index: self.next_step_index(),
            in_progress: self.in_progress(),
        }
    }
}

/// Wire view of `SessionState`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub active_entry: Option<KnowledgeEntry>,
    pub next_step_index: usize,
    pub in_progress: bool,
}

impl SessionSnapshot {
    pub fn idle() -> Self {
        SessionState::Idle.snapshot()
    }
}
