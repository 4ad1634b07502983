use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard,
    },
};

use crate::entities::{DecodedUpdate, Identity};

/// Which senders a consumption pass drains.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsumeFilter {
    All,
    One(i64),
    Any(Vec<i64>),
}

impl ConsumeFilter {
    pub fn sender(who: &impl Identity) -> Self {
        ConsumeFilter::One(who.id())
    }

    pub fn any_of<'a, I: Identity + 'a>(who: impl IntoIterator<Item = &'a I>) -> Self {
        ConsumeFilter::Any(who.into_iter().map(Identity::id).collect())
    }

    fn matches(&self, update: &DecodedUpdate) -> bool {
        match self {
            ConsumeFilter::All => true,
            ConsumeFilter::One(id) => update.sender_id() == *id,
            ConsumeFilter::Any(ids) => ids.contains(&update.sender_id()),
        }
    }
}

/// In-memory mailbox of decoded updates, in arrival order.
///
/// The poller appends; consumers drain. Each update is handed out exactly
/// once: consuming removes it.
#[derive(Debug, Default)]
pub struct UpdateStore {
    queue: Mutex<VecDeque<DecodedUpdate>>,
    news: AtomicBool,
}

impl UpdateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<DecodedUpdate>> {
        // A panicking consumer cannot leave the queue half-updated: every
        // mutation is a single push/remove.
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn append(&self, batch: Vec<DecodedUpdate>) -> usize {
        let n = batch.len();
        if n == 0 {
            return 0;
        }
        self.lock().extend(batch);
        self.news.store(true, Ordering::SeqCst);
        n
    }

    pub fn has_pending(&self) -> bool {
        !self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once after any append since the previous call.
    pub fn take_news(&self) -> bool {
        self.news.swap(false, Ordering::SeqCst)
    }

    /// Lazily drain the updates matching `filter`.
    ///
    /// The set of matching updates is fixed when this is called; updates
    /// appended afterwards are left for the next pass. Each item is removed
    /// from the store as it is yielded, so dropping the iterator early leaves
    /// the remaining matches in place.
    pub fn consume(&self, filter: ConsumeFilter) -> Consume<'_> {
        let ids = self
            .lock()
            .iter()
            .filter(|u| filter.matches(u))
            .map(|u| u.id)
            .collect();
        Consume { store: self, ids }
    }

    fn remove_id(&self, id: i64) -> Option<DecodedUpdate> {
        let mut queue = self.lock();
        let pos = queue.iter().position(|u| u.id == id)?;
        queue.remove(pos)
    }
}

/// Iterator returned by [`UpdateStore::consume`].
pub struct Consume<'a> {
    store: &'a UpdateStore,
    ids: VecDeque<i64>,
}

impl Iterator for Consume<'_> {
    type Item = DecodedUpdate;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.ids.pop_front() {
            // Another consumer may have taken it in the meantime.
            if let Some(u) = self.store.remove_id(id) {
                return Some(u);
            }
        }
        None
    }
}
