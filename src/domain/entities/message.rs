use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single chat message routed through the server.
///
/// Once delivered, a message is shared read-only between every recipient's
/// history, so there is no public mutation apart from [`Message::restore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: Uuid,
    sender: String,
    recipients: Vec<String>,
    timestamp: DateTime<Utc>,
    body: String,
}

impl Message {
    pub fn new(sender: impl Into<String>, recipients: Vec<String>, body: impl Into<String>) -> Self {
        Self::new_at(sender, recipients, body, Utc::now())
    }

    /// Build a message with an explicit timestamp (the server stamps from its own clock)
    pub fn new_at(
        sender: impl Into<String>,
        recipients: Vec<String>,
        body: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: sender.into(),
            recipients,
            timestamp,
            body: body.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Recipients exactly as the sender listed them, duplicates and unknown ids included
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// True if `correspondent` sent this message or is one of its recipients
    pub fn involves(&self, correspondent: &str) -> bool {
        self.sender == correspondent || self.recipients.iter().any(|r| r == correspondent)
    }

    /// Capture body and timestamp for a later [`Message::restore`]
    pub fn snapshot(&self) -> MessageMemento {
        MessageMemento {
            body: self.body.clone(),
            timestamp: self.timestamp,
        }
    }

    /// Overwrite body and timestamp from a memento. Identity, sender and
    /// recipients are left alone.
    pub fn restore(&mut self, memento: MessageMemento) {
        self.body = memento.body;
        self.timestamp = memento.timestamp;
    }
}

/// Opaque capture of a message's body and timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageMemento {
    body: String,
    timestamp: DateTime<Utc>,
}

impl MessageMemento {
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_involves_sender_and_recipients() {
        let msg = Message::new("alice", ids(&["bob", "carol"]), "hi");

        assert!(msg.involves("alice"));
        assert!(msg.involves("bob"));
        assert!(msg.involves("carol"));
        assert!(!msg.involves("dave"));
    }

    #[test]
    fn test_recipients_kept_verbatim() {
        let msg = Message::new("alice", ids(&["bob", "ghost", "bob"]), "hi");
        assert_eq!(msg.recipients(), &ids(&["bob", "ghost", "bob"])[..]);
    }

    #[test]
    fn test_snapshot_and_restore() {
        let t0 = Utc::now();
        let older = Message::new_at("alice", ids(&["bob"]), "first draft", t0);
        let mut msg = Message::new_at("alice", ids(&["bob"]), "second draft", t0 + Duration::seconds(5));
        let id = msg.id();

        let memento = older.snapshot();
        assert_eq!(memento.body(), "first draft");

        msg.restore(memento);

        assert_eq!(msg.id(), id);
        assert_eq!(msg.body(), "first draft");
        assert_eq!(msg.timestamp(), t0);
        assert_eq!(msg.sender(), "alice");
    }

    #[test]
    fn test_fresh_ids() {
        let a = Message::new("alice", ids(&["bob"]), "same");
        let b = Message::new("alice", ids(&["bob"]), "same");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_serializes_to_json() {
        let msg = Message::new("alice", ids(&["bob"]), "hello");
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["sender"], "alice");
        assert_eq!(json["recipients"][0], "bob");
        assert_eq!(json["body"], "hello");
    }
}
