use std::collections::HashSet;

use log::warn;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::roster::document::{RosterDocument, UserId};
use crate::roster::store::DocumentStore;
use crate::roster::{engine, submission};

pub const START_COMMAND: &str = "/start";
pub const ADMIN_GREETING: &str = "Admin panel active";
pub const USAGE_HINT: &str = "Send:\nready <number>\noff <number>\n\nExample:\nready 1";

/// Single text reply to an inbound message. `actions` carries the admin
/// menu and is only attached to the panel greeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
}

impl Reply {
    fn plain(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            actions: None,
        }
    }

    fn with_menu(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            actions: Some(engine::ADMIN_MENU.iter().map(|s| s.to_string()).collect()),
        }
    }
}

/// Routes inbound messages to the admin or participant handler and runs
/// each one as a serialized load → compute → save transaction. The single
/// Mutex is the serialization primitive: cross-field invariants (numbering
/// vs statuses) always change atomically under it.
pub struct Dispatcher {
    store: Mutex<DocumentStore>,
    admins: HashSet<UserId>,
}

impl Dispatcher {
    pub fn new(store: DocumentStore, admins: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            store: Mutex::new(store),
            admins: admins.into_iter().collect(),
        }
    }

    pub fn is_admin(&self, sender: UserId) -> bool {
        self.admins.contains(&sender)
    }

    pub async fn handle_inbound(&self, sender: UserId, text: &str) -> Option<Reply> {
        let text = text.trim();

        if text == START_COMMAND {
            return Some(if self.is_admin(sender) {
                Reply::with_menu(ADMIN_GREETING)
            } else {
                Reply::plain(USAGE_HINT)
            });
        }

        let store = self.store.lock().await;
        let mut doc = store.load().await;
        let before = doc.clone();

        let reply = if self.is_admin(sender) {
            engine::handle_admin_text(&mut doc, text)
        } else {
            submission::submit(&mut doc, sender, text)
        };

        if doc != before {
            if let Err(e) = store.save(&doc).await {
                warn!("Failed to persist roster document: {}", e);
            }
        }

        reply.map(Reply::plain)
    }

    /// Current document, read under the same lock as message handling.
    pub async fn snapshot(&self) -> RosterDocument {
        let store = self.store.lock().await;
        store.load().await
    }
}
