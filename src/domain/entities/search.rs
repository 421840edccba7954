use std::iter::FusedIterator;

use super::Message;

/// Lazy filter over a history traversal, yielding only messages that
/// involve a given correspondent.
///
/// Works over borrowed entries (`&Arc<Message>`) as well as owned ones, so a
/// cursor can run directly on a [`History`](super::History) or on a snapshot
/// taken out of the server.
#[derive(Debug, Clone)]
pub struct SearchCursor<I> {
    inner: I,
    correspondent: String,
    exhausted: bool,
}

impl<I> SearchCursor<I> {
    pub fn new(inner: I, correspondent: impl Into<String>) -> Self {
        Self {
            inner,
            correspondent: correspondent.into(),
            exhausted: false,
        }
    }

    pub fn correspondent(&self) -> &str {
        &self.correspondent
    }
}

impl<I> Iterator for SearchCursor<I>
where
    I: Iterator,
    I::Item: AsRef<Message>,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        for item in self.inner.by_ref() {
            if item.as_ref().involves(&self.correspondent) {
                return Some(item);
            }
        }
        self.exhausted = true;
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.exhausted {
            (0, Some(0))
        } else {
            (0, self.inner.size_hint().1)
        }
    }
}

impl<I> FusedIterator for SearchCursor<I>
where
    I: Iterator,
    I::Item: AsRef<Message>,
{
}
