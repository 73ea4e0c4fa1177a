//! The pool of short URLs shared by all simulated users.

use std::sync::{Arc, PoisonError, RwLock};

use rand::seq::IndexedRandom;

/// An append-only collection of short URLs created during a run.
///
/// Cloning the pool is cheap and yields a handle to the same collection. Every simulated user gets
/// a clone at construction time; entries are only ever appended by successful creations and are
/// read by random selection.
#[derive(Clone, Debug, Default)]
pub struct ShortUrlPool {
    inner: Arc<RwLock<Vec<String>>>,
}

impl ShortUrlPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a short URL returned by the service.
    pub fn push(&self, short_url: impl Into<String>) {
        // Entries are never modified in place, so a poisoned lock still guards a valid vector.
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(short_url.into());
    }

    /// Picks a short URL uniformly at random, or `None` if the pool is empty.
    pub fn choose(&self) -> Option<String> {
        let short_urls = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        short_urls.choose(&mut rand::rng()).cloned()
    }

    /// Number of short URLs in the pool.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if no short URL has been created yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of all short URLs in insertion order.
    pub fn snapshot(&self) -> Vec<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
