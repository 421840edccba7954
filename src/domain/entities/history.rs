use std::slice;
use std::sync::Arc;
use std::vec;

use super::{Message, SearchCursor};

/// Ordered log of the messages one user has received.
///
/// Entries stay in append order. Cloning a history is cheap: entries are
/// shared `Arc<Message>` values, so a clone is a point-in-time snapshot.
#[derive(Debug, Clone, Default)]
pub struct History {
    owner: String,
    entries: Vec<Arc<Message>>,
}

impl History {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            entries: Vec::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn append(&mut self, message: Arc<Message>) {
        self.entries.push(message);
    }

    /// Drop the most recent entry. Returns what was removed, `None` on an empty history.
    pub fn undo_last(&mut self) -> Option<Arc<Message>> {
        self.entries.pop()
    }

    pub fn last(&self) -> Option<&Arc<Message>> {
        self.entries.last()
    }

    pub fn iter(&self) -> slice::Iter<'_, Arc<Message>> {
        self.entries.iter()
    }

    pub fn messages(&self) -> &[Arc<Message>] {
        &self.entries
    }

    /// Lazily filter for messages sent by or addressed to `correspondent`
    pub fn search_by(&self, correspondent: impl Into<String>) -> SearchCursor<slice::Iter<'_, Arc<Message>>> {
        SearchCursor::new(self.entries.iter(), correspondent)
    }

    /// Owning variant of [`History::search_by`], for snapshots handed out by the server
    pub fn into_search(self, correspondent: impl Into<String>) -> SearchCursor<vec::IntoIter<Arc<Message>>> {
        SearchCursor::new(self.entries.into_iter(), correspondent)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Arc<Message>;
    type IntoIter = slice::Iter<'a, Arc<Message>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for History {
    type Item = Arc<Message>;
    type IntoIter = vec::IntoIter<Arc<Message>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(sender: &str, to: &[&str], body: &str) -> Arc<Message> {
        Arc::new(Message::new(sender, to.iter().map(|s| s.to_string()).collect(), body))
    }

    fn bodies(history: &History) -> Vec<&str> {
        history.iter().map(|m| m.body()).collect()
    }

    #[test]
    fn test_append_keeps_order() {
        let mut history = History::new("bob");
        history.append(msg("alice", &["bob"], "one"));
        history.append(msg("carol", &["bob"], "two"));

        assert_eq!(history.owner(), "bob");
        assert_eq!(history.len(), 2);
        assert_eq!(bodies(&history), vec!["one", "two"]);
        assert_eq!(history.last().unwrap().body(), "two");
    }

    #[test]
    fn test_undo_removes_last_only() {
        let mut history = History::new("bob");
        history.append(msg("alice", &["bob"], "one"));
        history.append(msg("alice", &["bob"], "two"));

        let removed = history.undo_last().unwrap();
        assert_eq!(removed.body(), "two");
        assert_eq!(bodies(&history), vec!["one"]);
    }

    #[test]
    fn test_undo_on_empty_is_noop() {
        let mut history = History::new("bob");
        assert!(history.undo_last().is_none());
        assert!(history.is_empty());
        assert!(history.last().is_none());
    }

    #[test]
    fn test_iteration_is_restartable() {
        let mut history = History::new("bob");
        history.append(msg("alice", &["bob"], "one"));
        history.append(msg("alice", &["bob"], "two"));

        let first: Vec<_> = (&history).into_iter().map(|m| m.id()).collect();
        let second: Vec<_> = history.iter().map(|m| m.id()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_search_on_history_and_snapshot() {
        let mut history = History::new("bob");
        history.append(msg("alice", &["bob"], "from alice"));
        history.append(msg("carol", &["bob"], "from carol"));
        history.append(msg("carol", &["bob", "alice"], "to both"));

        let found: Vec<_> = history.search_by("alice").map(|m| m.body()).collect();
        assert_eq!(found, vec!["from alice", "to both"]);

        let snapshot = history.clone();
        history.undo_last();

        let owned: Vec<_> = snapshot.into_search("alice").map(|m| m.body().to_string()).collect();
        assert_eq!(owned, vec!["from alice", "to both"]);
    }

    #[test]
    fn test_shared_message_survives_undo_elsewhere() {
        let shared = msg("alice", &["bob", "carol"], "hi");
        let mut bob = History::new("bob");
        let mut carol = History::new("carol");
        bob.append(Arc::clone(&shared));
        carol.append(Arc::clone(&shared));

        bob.undo_last();

        assert!(bob.is_empty());
        assert_eq!(carol.last().unwrap().id(), shared.id());
    }
}
