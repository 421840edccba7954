use std::sync::Arc;

use crate::application::errors::ChatError;
use crate::domain::entities::{History, Message, User};

/// Mediator trait - the single routing point between chat users.
///
/// Users never talk to each other directly; every send, block and undo goes
/// through an implementation of this trait.
pub trait Mediator: Send + Sync {
    /// Register a user, keyed by its id
    fn register(&self, user: User) -> Result<Registration, ChatError>;

    /// Remove a user from routing. Copies already delivered elsewhere are kept.
    fn unregister(&self, user_id: &str) -> Result<Option<User>, ChatError>;

    /// Snapshot of the currently registered users
    fn list_users(&self) -> Result<Vec<User>, ChatError>;

    /// Build one message and deliver it to every eligible recipient
    fn send(&self, sender_id: &str, recipients: Vec<String>, body: String) -> Result<DeliveryReport, ChatError>;

    /// Append a message straight to a registered user's history
    fn deliver(&self, recipient_id: &str, message: Arc<Message>) -> Result<(), ChatError>;

    /// Stop delivery from `blocked_id` to `blocker_id`. Returns true if newly blocked.
    fn block(&self, blocker_id: &str, blocked_id: &str) -> Result<bool, ChatError>;

    /// Lift a block. Returns true if an entry was removed.
    fn unblock(&self, blocker_id: &str, blocked_id: &str) -> Result<bool, ChatError>;

    /// True if `recipient_id` has blocked `sender_id`
    fn is_blocked(&self, recipient_id: &str, sender_id: &str) -> Result<bool, ChatError>;

    /// Drop the last history entry of every registered user
    fn undo_last(&self) -> Result<UndoReport, ChatError>;

    /// Point-in-time copy of a registered user's history
    fn history(&self, user_id: &str) -> Result<History, ChatError>;
}

/// Result of registering a user
#[derive(Debug)]
pub enum Registration {
    Registered,
    /// Id was already taken; the previous user (and its history) was replaced
    Replaced(User),
}

impl Registration {
    pub fn is_replaced(&self) -> bool {
        matches!(self, Registration::Replaced(_))
    }
}

/// Why a listed recipient did not get a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Blocked,
    Unregistered,
}

impl SkipReason {
    pub fn as_str(&self) -> &str {
        match self {
            SkipReason::Blocked => "blocked",
            SkipReason::Unregistered => "unregistered",
        }
    }
}

/// Soft summary of a send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { count: usize },
    NoDelivery,
}

/// What happened to each recipient of a send
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub message: Arc<Message>,
    pub delivered: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
}

impl DeliveryReport {
    pub fn new(message: Arc<Message>) -> Self {
        Self {
            message,
            delivered: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn outcome(&self) -> DeliveryOutcome {
        if self.delivered.is_empty() {
            DeliveryOutcome::NoDelivery
        } else {
            DeliveryOutcome::Delivered { count: self.delivered.len() }
        }
    }

    pub fn is_delivered(&self) -> bool {
        !self.delivered.is_empty()
    }
}

/// Entries removed by a global undo, one per user that had any
#[derive(Debug, Clone, Default)]
pub struct UndoReport {
    pub removed: Vec<(String, Arc<Message>)>,
}

impl UndoReport {
    pub fn len(&self) -> usize {
        self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }

    pub fn removed_from(&self, user_id: &str) -> Option<&Arc<Message>> {
        self.removed.iter().find(|(id, _)| id == user_id).map(|(_, m)| m)
    }
}
