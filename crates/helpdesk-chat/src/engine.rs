//! Conversation engine: input lookup, step walker and action handler.
//!
//! Pure functions over a `SessionState` and the knowledge-base snapshot.
//! Each returns the assistant turns to append; the caller owns the log.

use helpdesk_core::config::EscalationConfig;
use helpdesk_core::types::KnowledgeEntry;

use crate::escalation;
use crate::matcher::{self, MatchKind};
use crate::session::SessionState;
use crate::types::{Action, ConversationTurn};

pub const CLOSING_TEXT: &str =
    "If none of the above steps helped, please contact our support team for further assistance.";

pub const WORKED_TEXT: &str =
    "Great! I'm glad that solved your problem. Is there anything else I can help you with?";

pub const ESCALATION_OFFER_TEXT: &str = "Sorry that didn't help. \
Would you like to send a message to our support team? Use the form below to describe your issue.";

pub fn welcome_text(topic_count: usize) -> String {
    format!(
        "Welcome to IT Support Assistant!\n\n\
         I can help you with technical issues. You can:\n\
         \u{2022} Type a full question (e.g., \"My computer won't start after a Windows update\")\n\
         \u{2022} Type a number (1-{}) to see a specific solution\n\n\
         How can I help you today?",
        topic_count
    )
}

fn selection_text(kind: MatchKind, question: &str) -> String {
    match kind {
        MatchKind::Number => format!(
            "Great! I found a solution for: \"{}\"\n\nLet me walk you through the steps:",
            question
        ),
        MatchKind::Substring | MatchKind::Words => format!(
            "I found a solution for your issue: \"{}\"\n\nLet me guide you through the troubleshooting steps:",
            question
        ),
    }
}

fn no_match_text(input: &str, entries: &[KnowledgeEntry]) -> String {
    let topics: Vec<String> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("{}. {}", i + 1, entry.question))
        .collect();
    format!(
        "I couldn't find a specific solution for \"{}\". Here are the available topics:\n\n{}\n\n\
         Please type the number of the topic that best matches your issue, or try rephrasing your question.",
        input,
        topics.join("\n")
    )
}

/// Show step `step_index` of `entry`, or close out once every step is shown.
pub fn walk_step(
    state: &mut SessionState,
    entry: KnowledgeEntry,
    step_index: usize,
) -> ConversationTurn {
    match entry.steps.get(step_index) {
        Some(step) => {
            let turn = ConversationTurn::step(step.clone(), step_index, entry.steps.len());
            *state = SessionState::active(entry, step_index + 1);
            turn
        }
        None => {
            state.reset();
            ConversationTurn::assistant(CLOSING_TEXT).with_escalation()
        }
    }
}

/// Answer one line of trimmed, non-empty user text.
pub fn respond(
    state: &mut SessionState,
    entries: &[KnowledgeEntry],
    input: &str,
) -> Vec<ConversationTurn> {
    if matcher::is_continuation(input) {
        if let SessionState::Active {
            entry,
            next_step_index,
        } = state.clone()
        {
            return vec![walk_step(state, entry, next_step_index)];
        }
    }

    match matcher::select(input, entries) {
        Some(selection) => {
            let entry = selection.entry.clone();
            let intro = ConversationTurn::assistant(selection_text(selection.kind, &entry.question));
            let step = walk_step(state, entry, 0);
            vec![intro, step]
        }
        None => {
            state.reset();
            vec![ConversationTurn::assistant(no_match_text(input, entries))]
        }
    }
}

/// Answer an action button.
pub fn handle_action(
    state: &mut SessionState,
    action: Action,
    contact: &EscalationConfig,
) -> Vec<ConversationTurn> {
    match action {
        Action::Worked => {
            state.reset();
            vec![ConversationTurn::assistant(WORKED_TEXT)]
        }
        Action::NotWorking => match state.clone() {
            SessionState::Active {
                entry,
                next_step_index,
            } => vec![walk_step(state, entry, next_step_index)],
            SessionState::Idle => {
                vec![ConversationTurn::assistant(ESCALATION_OFFER_TEXT).with_escalation()]
            }
        },
        Action::ContactSupport => {
            state.reset();
            vec![ConversationTurn::assistant(escalation::contact_text(
                &contact.support_email,
                &contact.support_phone,
            ))
            .with_escalation()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::seed;

    fn contact() -> EscalationConfig {
        EscalationConfig::default()
    }

    #[test]
    fn test_walk_n_steps_then_close() {
        let entry = seed::knowledge_base()[1].clone();
        let n = entry.steps.len();
        let mut state = SessionState::Idle;

        let mut turns = Vec::new();
        let mut cursor = 0;
        for _ in 0..=n {
            turns.push(walk_step(&mut state, entry.clone(), cursor));
            cursor = state.next_step_index();
        }

        let step_turns: Vec<_> = turns.iter().filter(|t| t.is_step()).collect();
        assert_eq!(step_turns.len(), n);
        for (i, turn) in step_turns.iter().enumerate() {
            assert_eq!(turn.step_index, Some(i + 1));
            assert_eq!(turn.step_count, Some(n));
            assert_eq!(turn.text, entry.steps[i]);
        }
        let last = turns.last().unwrap();
        assert_eq!(last.text, CLOSING_TEXT);
        assert!(last.offers_escalation);
        assert_eq!(state, SessionState::Idle);
    }

    #[test]
    fn test_input_three_selects_crashing_app() {
        let kb = seed::knowledge_base();
        let mut state = SessionState::Idle;
        let turns = respond(&mut state, &kb, "3");

        assert_eq!(turns.len(), 2);
        assert!(turns[0]
            .text
            .starts_with("Great! I found a solution for: \"Application keeps crashing or freezing\""));
        assert_eq!(turns[1].text, "Close the application completely and restart it");
        assert_eq!(turns[1].step_index, Some(1));
        assert_eq!(turns[1].step_count, Some(6));
        assert!(turns[1].offers_actions);
        assert_eq!(state.next_step_index(), 1);
        assert_eq!(state.active_entry().unwrap().id, 3);
    }

    #[test]
    fn test_free_text_uses_guide_prefix() {
        let kb = seed::knowledge_base();
        let mut state = SessionState::Idle;
        let turns = respond(&mut state, &kb, "internet slow");
        assert!(turns[0].text.starts_with(
            "I found a solution for your issue: \"Internet connection is slow or not working\""
        ));
        assert_eq!(turns[1].text, kb[1].steps[0]);
    }

    #[test]
    fn test_continuation_keyword_advances() {
        let kb = seed::knowledge_base();
        let mut state = SessionState::Idle;
        respond(&mut state, &kb, "5");
        let turns = respond(&mut state, &kb, "ok, next");
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].step_index, Some(2));
        assert_eq!(state.next_step_index(), 2);
    }

    #[test]
    fn test_keyword_while_idle_is_a_lookup() {
        let kb = seed::knowledge_base();
        let mut state = SessionState::Idle;
        // "not working" is part of entry 2's question.
        let turns = respond(&mut state, &kb, "not working");
        assert_eq!(turns.len(), 2);
        assert_eq!(state.active_entry().unwrap().id, 2);
    }

    #[test]
    fn test_new_topic_restarts_cursor() {
        let kb = seed::knowledge_base();
        let mut state = SessionState::Idle;
        respond(&mut state, &kb, "1");
        respond(&mut state, &kb, "next");
        assert_eq!(state.next_step_index(), 2);
        respond(&mut state, &kb, "4");
        assert_eq!(state.active_entry().unwrap().id, 4);
        assert_eq!(state.next_step_index(), 1);
    }

    #[test]
    fn test_no_match_lists_topics_and_resets() {
        let kb = seed::knowledge_base();
        let mut state = SessionState::active(kb[0].clone(), 2);
        let turns = respond(&mut state, &kb, "bluetooth headphones");
        assert_eq!(turns.len(), 1);
        assert!(turns[0]
            .text
            .starts_with("I couldn't find a specific solution for \"bluetooth headphones\""));
        assert!(turns[0].text.contains("3. Application keeps crashing or freezing"));
        assert!(turns[0].text.ends_with("or try rephrasing your question."));
        assert_eq!(state, SessionState::Idle);
    }

    #[test]
    fn test_worked_resets_to_idle() {
        let kb = seed::knowledge_base();
        let mut state = SessionState::Idle;
        respond(&mut state, &kb, "2");
        let turns = handle_action(&mut state, Action::Worked, &contact());
        assert_eq!(turns[0].text, WORKED_TEXT);
        let snap = state.snapshot();
        assert_eq!(snap.active_entry, None);
        assert_eq!(snap.next_step_index, 0);
        assert!(!snap.in_progress);
    }

    #[test]
    fn test_three_not_working_advance_by_three() {
        let kb = seed::knowledge_base();
        let mut state = SessionState::Idle;
        respond(&mut state, &kb, "1");
        let start = state.next_step_index();
        for _ in 0..3 {
            handle_action(&mut state, Action::NotWorking, &contact());
        }
        assert_eq!(state.next_step_index(), start + 3);
        assert!(state.next_step_index() <= kb[0].steps.len());
    }

    #[test]
    fn test_not_working_past_last_step_closes() {
        let kb = seed::knowledge_base();
        let mut state = SessionState::active(kb[0].clone(), kb[0].steps.len());
        let turns = handle_action(&mut state, Action::NotWorking, &contact());
        assert_eq!(turns[0].text, CLOSING_TEXT);
        assert_eq!(state, SessionState::Idle);
    }

    #[test]
    fn test_not_working_while_idle_offers_escalation() {
        let mut state = SessionState::Idle;
        let turns = handle_action(&mut state, Action::NotWorking, &contact());
        assert_eq!(turns.len(), 1);
        assert!(turns[0].offers_escalation);
        assert_eq!(state, SessionState::Idle);
    }

    #[test]
    fn test_contact_support_shows_channels() {
        let kb = seed::knowledge_base();
        let mut state = SessionState::Idle;
        respond(&mut state, &kb, "3");
        let turns = handle_action(&mut state, Action::ContactSupport, &contact());
        assert!(turns[0].text.contains("support@example.com"));
        assert!(turns[0].text.contains("+1 (555) 123-4567"));
        assert!(turns[0].offers_escalation);
        assert!(!state.in_progress());
    }

    #[test]
    fn test_welcome_mentions_range() {
        let text = welcome_text(5);
        assert!(text.starts_with("Welcome to IT Support Assistant!"));
        assert!(text.contains("(1-5)"));
    }
}
