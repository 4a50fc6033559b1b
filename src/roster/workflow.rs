use std::collections::BTreeMap;

use crate::roster::document::{ItemStatus, PendingAdmin, RosterDocument};

/// Resolve the argument message for whichever multi-turn admin command is
/// pending. Invalid input is a self-loop: no reply, no state change, the
/// pending state stays set. There is no cancel transition; only a wholesale
/// document reset clears a waiting state by another path.
pub fn resolve_pending(doc: &mut RosterDocument, text: &str) -> Option<String> {
    match doc.admin_state {
        Some(PendingAdmin::Delete) => resolve_delete(doc, text),
        Some(PendingAdmin::SetStatus) => resolve_status_update(doc, text),
        None => None,
    }
}

fn resolve_delete(doc: &mut RosterDocument, text: &str) -> Option<String> {
    let num: u32 = text.trim().parse().ok()?;
    if num == 0 || num as usize > doc.items.len() {
        return None;
    }

    doc.items.remove(num as usize - 1);
    doc.statuses = reindex_after_delete(&doc.statuses, num);
    doc.admin_state = None;
    Some("Item deleted".to_string())
}

fn resolve_status_update(doc: &mut RosterDocument, text: &str) -> Option<String> {
    let mut parts = text.split_whitespace();
    let num_token = parts.next()?;
    let status_token = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let num: u32 = num_token.parse().ok()?;
    let status = match status_token {
        "ready" => ItemStatus::Ready,
        "off" => ItemStatus::Off,
        _ => return None,
    };
    if num == 0 || num as usize > doc.items.len() {
        return None;
    }

    doc.statuses.insert(num, status);
    doc.admin_state = None;
    Some("Status updated".to_string())
}

/// Re-index the status map after removing item `removed`: its own entry is
/// dropped, entries above it shift down by one so numbers and statuses
/// stay aligned.
fn reindex_after_delete(
    statuses: &BTreeMap<u32, ItemStatus>,
    removed: u32,
) -> BTreeMap<u32, ItemStatus> {
    let mut out = BTreeMap::new();
    for (&num, &status) in statuses {
        if num < removed {
            out.insert(num, status);
        } else if num > removed {
            out.insert(num - 1, status);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_items(items: &[&str]) -> RosterDocument {
        RosterDocument {
            active: true,
            items: items.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn malformed_delete_target_is_a_silent_self_loop() {
        let mut doc = doc_with_items(&["A", "B"]);
        doc.admin_state = Some(PendingAdmin::Delete);
        let before = doc.clone();

        assert_eq!(resolve_pending(&mut doc, "abc"), None);
        assert_eq!(doc, before);
        assert_eq!(doc.admin_state, Some(PendingAdmin::Delete));
    }

    #[test]
    fn out_of_range_delete_target_is_ignored() {
        let mut doc = doc_with_items(&["A", "B"]);
        doc.admin_state = Some(PendingAdmin::Delete);

        assert_eq!(resolve_pending(&mut doc, "3"), None);
        assert_eq!(resolve_pending(&mut doc, "0"), None);
        assert_eq!(doc.items.len(), 2);
        assert_eq!(doc.admin_state, Some(PendingAdmin::Delete));
    }

    #[test]
    fn valid_delete_removes_and_clears_state() {
        let mut doc = doc_with_items(&["A", "B"]);
        doc.admin_state = Some(PendingAdmin::Delete);

        let reply = resolve_pending(&mut doc, "1").unwrap();
        assert_eq!(reply, "Item deleted");
        assert_eq!(doc.items, vec!["B"]);
        assert_eq!(doc.admin_state, None);
    }

    #[test]
    fn delete_renumbers_statuses_above_the_removed_item() {
        let mut doc = doc_with_items(&["A", "B", "C"]);
        doc.statuses.insert(2, ItemStatus::Ready);
        doc.statuses.insert(3, ItemStatus::Off);
        doc.admin_state = Some(PendingAdmin::Delete);

        resolve_pending(&mut doc, "2").unwrap();

        assert_eq!(doc.items, vec!["A", "C"]);
        // Old item 3's status migrates to number 2; old item 2's is gone.
        assert_eq!(doc.statuses.len(), 1);
        assert_eq!(doc.statuses.get(&2), Some(&ItemStatus::Off));
    }

    #[test]
    fn status_update_requires_exactly_two_valid_tokens() {
        let mut doc = doc_with_items(&["A", "B"]);
        doc.admin_state = Some(PendingAdmin::SetStatus);
        let before = doc.clone();

        for bad in ["2", "2 maybe", "2 ready now", "x ready", "9 ready", ""] {
            assert_eq!(resolve_pending(&mut doc, bad), None, "input: {:?}", bad);
            assert_eq!(doc, before, "input: {:?}", bad);
        }

        let reply = resolve_pending(&mut doc, "2 ready").unwrap();
        assert_eq!(reply, "Status updated");
        assert_eq!(doc.statuses.get(&2), Some(&ItemStatus::Ready));
        assert_eq!(doc.admin_state, None);
    }

    #[test]
    fn status_update_accepts_off() {
        let mut doc = doc_with_items(&["A"]);
        doc.admin_state = Some(PendingAdmin::SetStatus);

        resolve_pending(&mut doc, "1 off").unwrap();
        assert_eq!(doc.statuses.get(&1), Some(&ItemStatus::Off));
    }

    #[test]
    fn admin_override_wins_over_participant_report() {
        let mut doc = doc_with_items(&["A"]);
        doc.statuses.insert(1, ItemStatus::Ready);
        doc.admin_state = Some(PendingAdmin::SetStatus);

        resolve_pending(&mut doc, "1 off").unwrap();
        assert_eq!(doc.statuses.get(&1), Some(&ItemStatus::Off));
    }

    #[test]
    fn no_pending_state_resolves_nothing() {
        let mut doc = doc_with_items(&["A"]);
        let before = doc.clone();

        assert_eq!(resolve_pending(&mut doc, "1"), None);
        assert_eq!(doc, before);
    }
}
