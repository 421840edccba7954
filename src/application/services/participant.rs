use std::sync::Arc;
use std::vec;

use crate::application::errors::ChatError;
use crate::domain::entities::{History, Message, SearchCursor, User};
use crate::domain::traits::{DeliveryReport, Mediator, Registration, UndoReport};

/// A user's entry point into the chat, bound to a shared mediator.
///
/// Everything except reads of the user's own history is forwarded to the
/// mediator; participants never reach each other directly.
pub struct Participant<M: Mediator> {
    id: String,
    mediator: Arc<M>,
}

impl<M: Mediator> Participant<M> {
    /// Handle for an id, registered or not
    pub fn new(id: impl Into<String>, mediator: Arc<M>) -> Self {
        Self {
            id: id.into(),
            mediator,
        }
    }

    /// Register `user` with the mediator and return its handle
    pub fn join(mediator: Arc<M>, user: User) -> Result<(Self, Registration), ChatError> {
        let id = user.id.clone();
        let registration = mediator.register(user)?;
        Ok((Self::new(id, mediator), registration))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mediator(&self) -> &Arc<M> {
        &self.mediator
    }

    pub fn send<S: Into<String>>(&self, recipients: impl IntoIterator<Item = S>, body: impl Into<String>) -> Result<DeliveryReport, ChatError> {
        let recipients = recipients.into_iter().map(Into::into).collect();
        self.mediator.send(&self.id, recipients, body.into())
    }

    pub fn receive(&self, message: Arc<Message>) -> Result<(), ChatError> {
        self.mediator.deliver(&self.id, message)
    }

    /// Global undo: every registered user loses its own last entry.
    ///
    /// Nothing happens when this participant's own history is empty.
    pub fn undo_last(&self) -> Result<UndoReport, ChatError> {
        if self.last_message()?.is_none() {
            tracing::debug!("{} has nothing to undo", self.id);
            return Ok(UndoReport::default());
        }
        self.mediator.undo_last()
    }

    pub fn block(&self, username: &str) -> Result<bool, ChatError> {
        self.mediator.block(&self.id, username)
    }

    pub fn unblock(&self, username: &str) -> Result<bool, ChatError> {
        self.mediator.unblock(&self.id, username)
    }

    pub fn history(&self) -> Result<History, ChatError> {
        self.mediator.history(&self.id)
    }

    pub fn last_message(&self) -> Result<Option<Arc<Message>>, ChatError> {
        Ok(self.history()?.last().cloned())
    }

    /// Messages to or from `correspondent`, filtered lazily over a snapshot
    pub fn search_by(&self, correspondent: impl Into<String>) -> Result<SearchCursor<vec::IntoIter<Arc<Message>>>, ChatError> {
        Ok(self.history()?.into_search(correspondent))
    }
}

impl<M: Mediator> Clone for Participant<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            mediator: Arc::clone(&self.mediator),
        }
    }
}
