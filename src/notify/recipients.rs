use std::collections::BTreeSet;

use parking_lot::RwLock;

use crate::config::RecipientMode;

/// Chats that receive alerts.
#[derive(Debug)]
pub struct Recipients {
    mode: RecipientMode,
    inner: RwLock<BTreeSet<i64>>,
}

impl Recipients {
    pub fn new(mode: RecipientMode, initial: impl IntoIterator<Item = i64>) -> Self {
        Self {
            mode,
            inner: RwLock::new(initial.into_iter().collect()),
        }
    }

    pub fn mode(&self) -> RecipientMode {
        self.mode
    }

    /// Returns true if the chat was not already a recipient. In single mode the
    /// chat replaces every other recipient.
    pub fn register(&self, chat_id: i64) -> bool {
        let mut guard = self.inner.write();
        let added = !guard.contains(&chat_id);
        if self.mode == RecipientMode::Single {
            guard.clear();
        }
        guard.insert(chat_id);
        added
    }

    pub fn remove(&self, chat_id: i64) -> bool {
        self.inner.write().remove(&chat_id)
    }

    pub fn snapshot(&self) -> Vec<i64> {
        self.inner.read().iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
