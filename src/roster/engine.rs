use crate::roster::document::{ItemStatus, PendingAdmin, RosterDocument};
use crate::roster::workflow;

// Fixed menu labels. Matched against inbound admin text by exact equality,
// so the labels double as the command keywords.
pub const CREATE_LIST: &str = "➕ New list";
pub const SHOW_LIST: &str = "📋 Show list";
pub const SET_STATUS: &str = "🛠 Set status";
pub const DELETE_ITEM: &str = "❌ Delete item";
pub const FINAL_LIST: &str = "📤 Final list";
pub const CLOSE_SHIFT: &str = "🔒 Close shift";
pub const FULL_RESET: &str = "🧹 Full reset";

/// Admin menu, in display order.
pub const ADMIN_MENU: [&str; 7] = [
    CREATE_LIST,
    SHOW_LIST,
    SET_STATUS,
    DELETE_ITEM,
    FINAL_LIST,
    CLOSE_SHIFT,
    FULL_RESET,
];

pub const EMPTY_LIST: &str = "The list is empty";

/// Admin-side dispatch. Precedence order matters: the fixed menu labels win
/// unconditionally, then list-body capture, then any pending workflow state.
pub fn handle_admin_text(doc: &mut RosterDocument, text: &str) -> Option<String> {
    let text = text.trim();

    match text {
        CREATE_LIST => Some(create_list(doc)),
        SHOW_LIST => Some(show_current(doc)),
        FINAL_LIST => Some(finalize(doc)),
        CLOSE_SHIFT => Some(close_shift(doc)),
        FULL_RESET => Some(full_reset(doc)),
        DELETE_ITEM => Some(begin_delete(doc)),
        SET_STATUS => Some(begin_status_update(doc)),
        _ => {
            if doc.active && doc.items.is_empty() {
                return Some(submit_list_body(doc, text));
            }
            workflow::resolve_pending(doc, text)
        }
    }
}

pub fn create_list(doc: &mut RosterDocument) -> String {
    *doc = RosterDocument::default();
    doc.active = true;
    "Send the list items, one per line".to_string()
}

pub fn show_current(doc: &RosterDocument) -> String {
    let rendered = render(doc, false);
    if rendered.is_empty() {
        EMPTY_LIST.to_string()
    } else {
        rendered
    }
}

pub fn finalize(doc: &RosterDocument) -> String {
    let rendered = render(doc, true);
    if rendered.is_empty() {
        EMPTY_LIST.to_string()
    } else {
        rendered
    }
}

pub fn close_shift(doc: &mut RosterDocument) -> String {
    doc.active = false;
    format!("Shift closed.\n\n{}", finalize(doc))
}

pub fn full_reset(doc: &mut RosterDocument) -> String {
    *doc = RosterDocument::default();
    "Everything has been reset".to_string()
}

pub fn begin_delete(doc: &mut RosterDocument) -> String {
    doc.admin_state = Some(PendingAdmin::Delete);
    "Send the number of the item to delete".to_string()
}

pub fn begin_status_update(doc: &mut RosterDocument) -> String {
    doc.admin_state = Some(PendingAdmin::SetStatus);
    "Format:\n<number> ready/off\nExample:\n2 ready".to_string()
}

/// Capture the message body as the roster, one item per non-blank line,
/// preserving order.
pub fn submit_list_body(doc: &mut RosterDocument, text: &str) -> String {
    doc.items = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();
    doc.admin_state = None;
    format!("List created:\n\n{}", render(doc, false))
}

/// Render the roster. With `final_` set, unreported items are marked ❌;
/// otherwise they carry no icon. An empty list renders as the empty string
/// and callers substitute the "list is empty" message.
pub fn render(doc: &RosterDocument, final_: bool) -> String {
    let mut lines = Vec::new();
    for (i, item) in doc.items.iter().enumerate() {
        let number = (i + 1) as u32;
        let icon = match doc.statuses.get(&number) {
            Some(ItemStatus::Ready) => "✅",
            Some(ItemStatus::Off) => "🌙",
            None if final_ => "❌",
            None => "",
        };
        lines.push(format!("{} {}. {}", icon, number, item).trim().to_string());
    }
    lines.join("\n\n")
}
