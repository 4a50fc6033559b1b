use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sender identity on the transport channel.
pub type UserId = i64;

/// Reported status of a single roster item. Absence from the status map
/// means "no report yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Ready,
    Off,
}

/// Pending multi-turn admin command. `None` on the document means no
/// command is mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingAdmin {
    #[serde(rename = "delete")]
    Delete,
    #[serde(rename = "set_status")]
    SetStatus,
}

/// The single shared roster document. One logical "shift" per lifetime;
/// it is only ever reset in place, never deleted.
///
/// Status keys always reference a currently valid item number in
/// `1..=items.len()`; deletion re-indexes the map to keep that true.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterDocument {
    /// True while accepting list creation/edits and participant submissions.
    pub active: bool,
    /// The roster; index+1 is the stable public item number.
    #[serde(rename = "list")]
    pub items: Vec<String>,
    /// Sparse per-item reports, keyed by item number.
    pub statuses: BTreeMap<u32, ItemStatus>,
    /// Participants who already submitted once this shift.
    pub submitted_users: Vec<UserId>,
    pub admin_state: Option<PendingAdmin>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_document_is_inactive_and_empty() {
        let doc = RosterDocument::default();
        assert!(!doc.active);
        assert!(doc.items.is_empty());
        assert!(doc.statuses.is_empty());
        assert!(doc.submitted_users.is_empty());
        assert_eq!(doc.admin_state, None);
    }

    #[test]
    fn serializes_with_legacy_field_names() {
        let mut doc = RosterDocument {
            active: true,
            items: vec!["Task1".to_string(), "Task2".to_string()],
            ..Default::default()
        };
        doc.statuses.insert(2, ItemStatus::Ready);
        doc.submitted_users.push(42);

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["active"], serde_json::json!(true));
        assert_eq!(value["list"], serde_json::json!(["Task1", "Task2"]));
        assert_eq!(value["statuses"], serde_json::json!({"2": "ready"}));
        assert_eq!(value["submitted_users"], serde_json::json!([42]));
        assert_eq!(value["admin_state"], serde_json::Value::Null);
    }

    #[test]
    fn loads_legacy_store_shape() {
        let raw = r#"{
            "active": true,
            "list": ["Task1", "Task2", "Task3"],
            "statuses": {"1": "ready", "3": "off"},
            "submitted_users": [100, 200],
            "admin_state": "set_status"
        }"#;

        let doc: RosterDocument = serde_json::from_str(raw).unwrap();
        assert!(doc.active);
        assert_eq!(doc.items.len(), 3);
        assert_eq!(doc.statuses.get(&1), Some(&ItemStatus::Ready));
        assert_eq!(doc.statuses.get(&3), Some(&ItemStatus::Off));
        assert_eq!(doc.submitted_users, vec![100, 200]);
        assert_eq!(doc.admin_state, Some(PendingAdmin::SetStatus));
    }

    #[test]
    fn admin_state_round_trips_through_wire_names() {
        for (state, wire) in [
            (Some(PendingAdmin::Delete), r#""delete""#),
            (Some(PendingAdmin::SetStatus), r#""set_status""#),
            (None, "null"),
        ] {
            let doc = RosterDocument {
                admin_state: state,
                ..Default::default()
            };
            let json = serde_json::to_string(&doc).unwrap();
            assert!(json.contains(&format!(r#""admin_state":{}"#, wire)));
            let back: RosterDocument = serde_json::from_str(&json).unwrap();
            assert_eq!(back, doc);
        }
    }
}
