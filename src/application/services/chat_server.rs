//! Chat server - the mediator that routes messages between users

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::application::errors::{lock_poisoned, ChatError, ConfigError};
use crate::domain::entities::{History, Message, User};
use crate::domain::traits::{DeliveryReport, Mediator, Registration, SkipReason, UndoReport};

/// What to do when a user registers with an id that is already taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Last registration wins
    #[default]
    Overwrite,
    Reject,
}

impl FromStr for DuplicatePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => Ok(DuplicatePolicy::Overwrite),
            "reject" => Ok(DuplicatePolicy::Reject),
            other => Err(ConfigError::InvalidValue(format!("unknown duplicate policy '{}'", other))),
        }
    }
}

type UserHandle = Arc<RwLock<User>>;

/// In-memory mediator.
///
/// Every user sits behind its own lock; the registry and blocklist have
/// separate locks. A send holds a user lock only while appending to that
/// one recipient.
pub struct ChatServer {
    name: String,
    on_duplicate: DuplicatePolicy,
    users: RwLock<HashMap<String, UserHandle>>,
    blocklist: RwLock<HashMap<String, HashSet<String>>>,
    clock: Mutex<Option<DateTime<Utc>>>,
}

impl ChatServer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_duplicate: DuplicatePolicy::default(),
            users: RwLock::new(HashMap::new()),
            blocklist: RwLock::new(HashMap::new()),
            clock: Mutex::new(None),
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.on_duplicate = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.on_duplicate
    }

    pub fn is_registered(&self, user_id: &str) -> Result<bool, ChatError> {
        Ok(self.users.read().map_err(lock_poisoned)?.contains_key(user_id))
    }

    pub fn user_count(&self) -> Result<usize, ChatError> {
        Ok(self.users.read().map_err(lock_poisoned)?.len())
    }

    /// Ids `user_id` has blocked, sorted
    pub fn blocked_by(&self, user_id: &str) -> Result<Vec<String>, ChatError> {
        let blocklist = self.blocklist.read().map_err(lock_poisoned)?;
        let mut blocked: Vec<String> = blocklist
            .get(user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        blocked.sort();
        Ok(blocked)
    }

    fn lookup(&self, user_id: &str) -> Result<Option<UserHandle>, ChatError> {
        Ok(self.users.read().map_err(lock_poisoned)?.get(user_id).cloned())
    }

    /// Registered users at this instant, sorted by id
    fn snapshot(&self) -> Result<Vec<(String, UserHandle)>, ChatError> {
        let users = self.users.read().map_err(lock_poisoned)?;
        let mut handles: Vec<(String, UserHandle)> = users
            .iter()
            .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
            .collect();
        handles.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(handles)
    }

    /// Wall-clock time, never earlier than the previous stamp
    fn next_timestamp(&self) -> Result<DateTime<Utc>, ChatError> {
        let mut last = self.clock.lock().map_err(lock_poisoned)?;
        let now = match *last {
            Some(prev) if prev > Utc::now() => prev,
            _ => Utc::now(),
        };
        *last = Some(now);
        Ok(now)
    }
}

fn into_user(handle: UserHandle) -> Result<User, ChatError> {
    match Arc::try_unwrap(handle) {
        Ok(lock) => lock.into_inner().map_err(lock_poisoned),
        // Someone is mid-operation on the old entry; hand back a copy
        Err(shared) => {
            let user = shared.read().map_err(lock_poisoned)?.clone();
            Ok(user)
        }
    }
}

impl Default for ChatServer {
    fn default() -> Self {
        Self::new("chat-mediator")
    }
}

impl Mediator for ChatServer {
    fn register(&self, user: User) -> Result<Registration, ChatError> {
        let id = user.id.clone();
        let previous = {
            let mut users = self.users.write().map_err(lock_poisoned)?;
            if self.on_duplicate == DuplicatePolicy::Reject && users.contains_key(&id) {
                warn!("Rejected duplicate registration: {}", id);
                return Err(ChatError::DuplicateUser(id));
            }
            users.insert(id.clone(), Arc::new(RwLock::new(user)))
        };

        match previous {
            Some(handle) => {
                info!("Replaced registered user: {}", id);
                Ok(Registration::Replaced(into_user(handle)?))
            }
            None => {
                info!("Registered user: {}", id);
                Ok(Registration::Registered)
            }
        }
    }

    fn unregister(&self, user_id: &str) -> Result<Option<User>, ChatError> {
        let removed = self.users.write().map_err(lock_poisoned)?.remove(user_id);
        match removed {
            Some(handle) => {
                info!("Unregistered user: {}", user_id);
                Ok(Some(into_user(handle)?))
            }
            None => Ok(None),
        }
    }

    fn list_users(&self) -> Result<Vec<User>, ChatError> {
        self.snapshot()?
            .into_iter()
            .map(|(_, handle)| {
                let user = handle.read().map_err(lock_poisoned)?.clone();
                Ok(user)
            })
            .collect()
    }

    fn send(&self, sender_id: &str, recipients: Vec<String>, body: String) -> Result<DeliveryReport, ChatError> {
        let timestamp = self.next_timestamp()?;
        let message = Arc::new(Message::new_at(sender_id, recipients, body, timestamp));
        let mut report = DeliveryReport::new(Arc::clone(&message));

        for recipient_id in message.recipients() {
            if self.is_blocked(recipient_id, sender_id)? {
                debug!("{} -> {}: blocked", sender_id, recipient_id);
                report.skipped.push((recipient_id.clone(), SkipReason::Blocked));
                continue;
            }

            match self.lookup(recipient_id)? {
                Some(handle) => {
                    handle.write().map_err(lock_poisoned)?.receive(Arc::clone(&message));
                    debug!("{} -> {}: delivered", sender_id, recipient_id);
                    report.delivered.push(recipient_id.clone());
                }
                None => {
                    debug!("{} -> {}: not registered", sender_id, recipient_id);
                    report.skipped.push((recipient_id.clone(), SkipReason::Unregistered));
                }
            }
        }

        if !report.is_delivered() {
            debug!("Message {} from {} reached nobody", message.id(), sender_id);
        }
        Ok(report)
    }

    fn deliver(&self, recipient_id: &str, message: Arc<Message>) -> Result<(), ChatError> {
        let handle = self
            .lookup(recipient_id)?
            .ok_or_else(|| ChatError::UnknownUser(recipient_id.to_string()))?;
        handle.write().map_err(lock_poisoned)?.receive(message);
        Ok(())
    }

    fn block(&self, blocker_id: &str, blocked_id: &str) -> Result<bool, ChatError> {
        let added = self
            .blocklist
            .write()
            .map_err(lock_poisoned)?
            .entry(blocker_id.to_string())
            .or_default()
            .insert(blocked_id.to_string());
        if added {
            info!("{} blocked {}", blocker_id, blocked_id);
        }
        Ok(added)
    }

    fn unblock(&self, blocker_id: &str, blocked_id: &str) -> Result<bool, ChatError> {
        let mut blocklist = self.blocklist.write().map_err(lock_poisoned)?;
        let removed = match blocklist.get_mut(blocker_id) {
            Some(set) => {
                let removed = set.remove(blocked_id);
                if set.is_empty() {
                    blocklist.remove(blocker_id);
                }
                removed
            }
            None => false,
        };
        if removed {
            info!("{} unblocked {}", blocker_id, blocked_id);
        }
        Ok(removed)
    }

    fn is_blocked(&self, recipient_id: &str, sender_id: &str) -> Result<bool, ChatError> {
        let blocklist = self.blocklist.read().map_err(lock_poisoned)?;
        Ok(blocklist
            .get(recipient_id)
            .map(|set| set.contains(sender_id))
            .unwrap_or(false))
    }

    fn undo_last(&self) -> Result<UndoReport, ChatError> {
        let mut report = UndoReport::default();

        for (id, handle) in self.snapshot()? {
            let removed = handle.write().map_err(lock_poisoned)?.history_mut().undo_last();
            if let Some(message) = removed {
                report.removed.push((id, message));
            }
        }

        info!("Undo removed {} history entries", report.len());
        Ok(report)
    }

    fn history(&self, user_id: &str) -> Result<History, ChatError> {
        let handle = self
            .lookup(user_id)?
            .ok_or_else(|| ChatError::UnknownUser(user_id.to_string()))?;
        let history = handle.read().map_err(lock_poisoned)?.history().clone();
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::DeliveryOutcome;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn server_with(names: &[&str]) -> ChatServer {
        let server = ChatServer::new("test");
        for name in names {
            server.register(User::new(*name)).unwrap();
        }
        server
    }

    fn bodies(server: &ChatServer, user: &str) -> Vec<String> {
        server
            .history(user)
            .unwrap()
            .iter()
            .map(|m| m.body().to_string())
            .collect()
    }

    #[test]
    fn test_register_overwrites_by_default() {
        let server = server_with(&["alice"]);
        server.send("bob", ids(&["alice"]), "old".into()).unwrap();

        let outcome = server.register(User::new("alice").with_display_name("Alice 2")).unwrap();

        match outcome {
            Registration::Replaced(previous) => assert_eq!(previous.history().len(), 1),
            Registration::Registered => panic!("expected replacement"),
        }
        assert_eq!(server.user_count().unwrap(), 1);
        assert!(server.history("alice").unwrap().is_empty());
    }

    #[test]
    fn test_register_reject_policy() {
        let server = ChatServer::new("test").with_duplicate_policy(DuplicatePolicy::Reject);
        server.register(User::new("alice")).unwrap();

        let err = server.register(User::new("alice")).unwrap_err();
        assert!(matches!(err, ChatError::DuplicateUser(id) if id == "alice"));
    }

    #[test]
    fn test_unregister_is_safe_when_absent() {
        let server = server_with(&["alice"]);

        assert!(server.unregister("nobody").unwrap().is_none());
        let removed = server.unregister("alice").unwrap().unwrap();
        assert_eq!(removed.id, "alice");
        assert!(!server.is_registered("alice").unwrap());
    }

    #[test]
    fn test_list_users_sorted() {
        let server = server_with(&["clay", "ashley", "michael"]);
        let names: Vec<String> = server.list_users().unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(names, ids(&["ashley", "clay", "michael"]));
    }

    #[test]
    fn test_send_does_not_echo_to_sender() {
        let server = server_with(&["a", "b"]);
        server.send("a", ids(&["b"]), "hi".into()).unwrap();

        assert!(server.history("a").unwrap().is_empty());
        assert_eq!(bodies(&server, "b"), vec!["hi"]);
    }

    #[test]
    fn test_send_to_self_is_delivered() {
        let server = server_with(&["a"]);
        server.send("a", ids(&["a"]), "note".into()).unwrap();
        assert_eq!(bodies(&server, "a"), vec!["note"]);
    }

    #[test]
    fn test_report_lists_skips() {
        let server = server_with(&["a", "b", "c"]);
        server.block("c", "a").unwrap();

        let report = server.send("a", ids(&["b", "ghost", "c"]), "hi".into()).unwrap();

        assert_eq!(report.delivered, ids(&["b"]));
        assert_eq!(
            report.skipped,
            vec![
                ("ghost".to_string(), SkipReason::Unregistered),
                ("c".to_string(), SkipReason::Blocked),
            ]
        );
        assert_eq!(report.outcome(), DeliveryOutcome::Delivered { count: 1 });
        assert_eq!(report.message.recipients(), &ids(&["b", "ghost", "c"])[..]);
    }

    #[test]
    fn test_no_delivery_is_soft() {
        let server = server_with(&["a"]);
        let report = server.send("a", ids(&["ghost"]), "anyone?".into()).unwrap();

        assert_eq!(report.outcome(), DeliveryOutcome::NoDelivery);
        assert!(!report.is_delivered());

        let empty = server.send("a", Vec::new(), "nobody".into()).unwrap();
        assert_eq!(empty.outcome(), DeliveryOutcome::NoDelivery);
    }

    #[test]
    fn test_duplicate_recipient_delivered_per_occurrence() {
        let server = server_with(&["a", "b"]);
        let report = server.send("a", ids(&["b", "b"]), "twice".into()).unwrap();

        assert_eq!(report.delivered.len(), 2);
        assert_eq!(bodies(&server, "b"), vec!["twice", "twice"]);
    }

    #[test]
    fn test_recipients_share_one_message() {
        let server = server_with(&["a", "b", "c"]);
        server.send("a", ids(&["b", "c"]), "hi".into()).unwrap();

        let b = server.history("b").unwrap();
        let c = server.history("c").unwrap();
        assert!(Arc::ptr_eq(b.last().unwrap(), c.last().unwrap()));
    }

    #[test]
    fn test_block_idempotent_and_directional() {
        let server = server_with(&["a", "b"]);

        assert!(server.block("b", "a").unwrap());
        assert!(!server.block("b", "a").unwrap());
        assert_eq!(server.blocked_by("b").unwrap(), ids(&["a"]));

        assert!(server.is_blocked("b", "a").unwrap());
        assert!(!server.is_blocked("a", "b").unwrap());
    }

    #[test]
    fn test_block_unknown_target_allowed() {
        let server = server_with(&["a"]);
        assert!(server.block("a", "ghost").unwrap());
        assert!(server.is_blocked("a", "ghost").unwrap());
    }

    #[test]
    fn test_unblock_restores_delivery() {
        let server = server_with(&["a", "b"]);
        server.block("b", "a").unwrap();
        server.send("a", ids(&["b"]), "dropped".into()).unwrap();

        assert!(server.unblock("b", "a").unwrap());
        assert!(!server.unblock("b", "a").unwrap());
        server.send("a", ids(&["b"]), "through".into()).unwrap();

        assert_eq!(bodies(&server, "b"), vec!["through"]);
        assert!(server.blocked_by("b").unwrap().is_empty());
    }

    #[test]
    fn test_undo_truncates_every_user() {
        let server = server_with(&["a", "b", "c"]);
        server.send("a", ids(&["b"]), "m1".into()).unwrap();
        server.send("b", ids(&["a"]), "m2".into()).unwrap();

        let report = server.undo_last().unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report.removed_from("a").unwrap().body(), "m2");
        assert_eq!(report.removed_from("b").unwrap().body(), "m1");
        assert!(report.removed_from("c").is_none());
        assert!(server.history("a").unwrap().is_empty());
        assert!(server.history("b").unwrap().is_empty());
    }

    #[test]
    fn test_undo_on_empty_server() {
        let server = server_with(&["a"]);
        assert!(server.undo_last().unwrap().is_empty());
    }

    #[test]
    fn test_deliver_requires_registration() {
        let server = server_with(&["a"]);
        let msg = Arc::new(Message::new("x", ids(&["a"]), "direct"));

        server.deliver("a", Arc::clone(&msg)).unwrap();
        assert_eq!(bodies(&server, "a"), vec!["direct"]);

        let err = server.deliver("ghost", msg).unwrap_err();
        assert!(matches!(err, ChatError::UnknownUser(_)));
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let server = server_with(&["a"]);
        for i in 0..20 {
            server.send("x", ids(&["a"]), format!("m{}", i)).unwrap();
        }

        let history = server.history("a").unwrap();
        let stamps: Vec<_> = history.iter().map(|m| m.timestamp()).collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_duplicate_policy_from_str() {
        assert_eq!("Reject".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Reject);
        assert_eq!(" overwrite ".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Overwrite);
        assert!("maybe".parse::<DuplicatePolicy>().is_err());
    }
}
