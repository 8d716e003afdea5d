//! Maps one line of user input to a knowledge-base entry.
//!
//! Lookup order: 1-based topic number, then case-insensitive substring in
//! either direction, then whole-word containment in either direction. The
//! first entry in store order wins at each stage.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use helpdesk_core::types::KnowledgeEntry;

/// Phrases that mean "show me the next step" while a walkthrough is active.
pub const CONTINUATION_KEYWORDS: &[&str] = &[
    "next",
    "continue",
    "step",
    "didn't work",
    "not working",
    "try next",
];

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9]+(?:'[a-z0-9]+)*").expect("Invalid word regex"));

static LEADING_INT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+").expect("Invalid leading integer regex"));

/// How an entry was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Number,
    Substring,
    Words,
}

#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub entry: &'a KnowledgeEntry,
    pub kind: MatchKind,
}

pub fn is_continuation(input: &str) -> bool {
    let lower = input.to_lowercase();
    CONTINUATION_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Entry at 1-based position `n` when the input starts with such a number.
///
/// Anything after the leading integer is ignored, so "3.", "2)" and
/// "3 please" all select by position.
pub fn select_by_number<'a>(input: &str, entries: &'a [KnowledgeEntry]) -> Option<&'a KnowledgeEntry> {
    let digits = LEADING_INT_RE.find(input.trim())?;
    let n: i64 = digits.as_str().parse().ok()?;
    if n < 1 {
        return None;
    }
    entries.get(usize::try_from(n - 1).ok()?)
}

pub fn find_by_substring<'a>(
    input: &str,
    entries: &'a [KnowledgeEntry],
) -> Option<&'a KnowledgeEntry> {
    let needle = input.to_lowercase();
    entries.iter().find(|entry| {
        let question = entry.question.to_lowercase();
        question.contains(&needle) || needle.contains(&question)
    })
}

fn words(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    WORD_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Every input word appears in the question, or every question word appears
/// in the input.
pub fn find_by_words<'a>(input: &str, entries: &'a [KnowledgeEntry]) -> Option<&'a KnowledgeEntry> {
    let input_words = words(input);
    if input_words.is_empty() {
        return None;
    }
    entries.iter().find(|entry| {
        let question_words = words(&entry.question);
        !question_words.is_empty()
            && (input_words.is_subset(&question_words) || question_words.is_subset(&input_words))
    })
}

/// Run the full lookup. `None` means nothing matched.
pub fn select<'a>(input: &str, entries: &'a [KnowledgeEntry]) -> Option<Selection<'a>> {
    if let Some(entry) = select_by_number(input, entries) {
        return Some(Selection {
            entry,
            kind: MatchKind::Number,
        });
    }
    if let Some(entry) = find_by_substring(input, entries) {
        return Some(Selection {
            entry,
            kind: MatchKind::Substring,
        });
    }
    find_by_words(input, entries).map(|entry| Selection {
        entry,
        kind: MatchKind::Words,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::seed;

    #[test]
    fn test_continuation_keywords() {
        assert!(is_continuation("Next"));
        assert!(is_continuation("that DIDN'T WORK"));
        assert!(is_continuation("show me the next step please"));
        assert!(!is_continuation("printer jam"));
    }

    #[test]
    fn test_number_selects_position() {
        let kb = seed::knowledge_base();
        for k in 1..=kb.len() {
            let entry = select_by_number(&k.to_string(), &kb).unwrap();
            assert_eq!(entry, &kb[k - 1]);
        }
        assert_eq!(
            select_by_number(" 3 ", &kb).unwrap().question,
            "Application keeps crashing or freezing"
        );
    }

    #[test]
    fn test_number_out_of_range() {
        let kb = seed::knowledge_base();
        assert!(select_by_number("0", &kb).is_none());
        assert!(select_by_number("6", &kb).is_none());
        assert!(select_by_number("-1", &kb).is_none());
        assert!(select_by_number("12 printers", &kb).is_none());
        assert!(select_by_number("99999999999999999999", &kb).is_none());
    }

    #[test]
    fn test_number_with_trailing_text() {
        let kb = seed::knowledge_base();
        assert_eq!(select_by_number("3.", &kb).unwrap().id, kb[2].id);
        assert_eq!(select_by_number("2)", &kb).unwrap().id, kb[1].id);
        assert_eq!(select_by_number("+4", &kb).unwrap().id, kb[3].id);

        let found = select("3 please", &kb).unwrap();
        assert_eq!(found.kind, MatchKind::Number);
        assert_eq!(found.entry.question, "Application keeps crashing or freezing");

        assert!(select_by_number("printer 3", &kb).is_none());
    }

    #[test]
    fn test_substring_both_directions() {
        let kb = seed::knowledge_base();
        let found = find_by_substring("CAN'T PRINT", &kb).unwrap();
        assert_eq!(found.id, 5);

        let found = find_by_substring(
            "Hi, my computer is running very slowly since Monday",
            &kb,
        )
        .unwrap();
        assert_eq!(found.id, 4);
    }

    #[test]
    fn test_words_match_is_symmetric() {
        let kb = seed::knowledge_base();
        let question = "Internet connection is slow or not working";

        let found = select("internet slow", &kb).unwrap();
        assert_eq!(found.entry.question, question);
        assert_eq!(found.kind, MatchKind::Words);

        let found = select("Help: internet connection is slow or not working again", &kb).unwrap();
        assert_eq!(found.entry.question, question);
        assert_eq!(found.kind, MatchKind::Substring);

        let found = select("slow internet", &kb).unwrap();
        assert_eq!(found.entry.id, 2);
    }

    #[test]
    fn test_no_match() {
        let kb = seed::knowledge_base();
        assert!(select("bluetooth headphones", &kb).is_none());
        assert!(select("???", &kb).is_none());
        assert!(select("1", &[]).is_none());
    }

    #[test]
    fn test_first_match_in_store_order_wins() {
        let kb = seed::knowledge_base();
        // "computer" appears in entries 1, 4 and 5.
        let found = select("computer", &kb).unwrap();
        assert_eq!(found.entry.id, 1);
    }
}
