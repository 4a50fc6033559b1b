use lazy_static::lazy_static;
use regex::Regex;

use crate::roster::document::{ItemStatus, RosterDocument, UserId};

// Keyword vocabularies for the free-text status sniffing. The Cyrillic
// entries are the original deployment's wording and remain accepted.
const READY_KEYWORDS: [&str; 2] = ["готов", "ready"];
const OFF_KEYWORDS: [&str; 2] = ["выход", "off"];

pub const ALREADY_SUBMITTED: &str = "You have already sent your status";
pub const ACCEPTED: &str = "Accepted ✅";

lazy_static! {
    static ref DIGIT_RUN: Regex = Regex::new(r"\d+").expect("digit pattern is valid");
}

/// Typed result of scanning a participant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Ready(u32),
    Off(u32),
    NoMatch,
}

/// Scan free text for an item number (first contiguous digit run) and a
/// status keyword. Anything ambiguous or out of range is `NoMatch` and gets
/// dropped by the caller, never rejected with an error.
pub fn classify(text: &str, item_count: usize) -> Classification {
    let lowered = text.to_lowercase();

    let Some(run) = DIGIT_RUN.find(&lowered) else {
        return Classification::NoMatch;
    };
    let Ok(num) = run.as_str().parse::<u32>() else {
        return Classification::NoMatch;
    };
    if num == 0 || num as usize > item_count {
        return Classification::NoMatch;
    }

    if READY_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        Classification::Ready(num)
    } else if OFF_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        Classification::Off(num)
    } else {
        Classification::NoMatch
    }
}

/// Apply a participant's status report. At most one submission per
/// participant per shift; while the roster is inactive submissions are
/// ignored without feedback.
pub fn submit(doc: &mut RosterDocument, sender: UserId, text: &str) -> Option<String> {
    if !doc.active {
        return None;
    }
    if doc.submitted_users.contains(&sender) {
        return Some(ALREADY_SUBMITTED.to_string());
    }

    let (num, status) = match classify(text, doc.items.len()) {
        Classification::Ready(num) => (num, ItemStatus::Ready),
        Classification::Off(num) => (num, ItemStatus::Off),
        Classification::NoMatch => return None,
    };

    doc.statuses.insert(num, status);
    doc.submitted_users.push(sender);
    Some(ACCEPTED.to_string())
}
