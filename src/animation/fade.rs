//! Cancellable delayed removals keyed by id.
//!
//! A marker that is hidden first receives a fade-out class; the actual detach
//! happens once its deadline passes. Showing the marker again before then
//! cancels the entry, so a stale removal can never fire.

use crate::prelude::HashMap;
use std::hash::Hash;
use std::time::Duration;

#[derive(Debug, Clone)]
struct PendingRemoval<P> {
    due: Duration,
    payload: P,
}

/// Per-id delayed removal queue driven by an external clock
#[derive(Debug, Clone)]
pub struct FadeScheduler<K, P = ()> {
    delay: Duration,
    pending: HashMap<K, PendingRemoval<P>>,
}

impl<K, P> FadeScheduler<K, P>
where
    K: Eq + Hash + Clone,
{
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: HashMap::default(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules a removal `delay` after `now`, replacing any entry for the same key
    pub fn schedule(&mut self, key: K, payload: P, now: Duration) {
        self.pending.remove(&key);
        self.pending.insert(
            key,
            PendingRemoval {
                due: now + self.delay,
                payload,
            },
        );
    }

    /// Cancels a pending removal, returning its payload
    pub fn cancel(&mut self, key: &K) -> Option<P> {
        self.pending.remove(key).map(|entry| entry.payload)
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn payload(&self, key: &K) -> Option<&P> {
        self.pending.get(key).map(|entry| &entry.payload)
    }

    /// Removes and returns every entry whose deadline is at or before `now`, oldest first
    pub fn take_due(&mut self, now: Duration) -> Vec<(K, P)> {
        let due_keys: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, entry)| entry.due <= now)
            .map(|(key, _)| key.clone())
            .collect();

        let mut fired: Vec<(Duration, K, P)> = due_keys
            .into_iter()
            .filter_map(|key| {
                self.pending
                    .remove(&key)
                    .map(|entry| (entry.due, key, entry.payload))
            })
            .collect();
        fired.sort_by_key(|(due, _, _)| *due);
        fired.into_iter().map(|(_, key, payload)| (key, payload)).collect()
    }

    /// Earliest pending deadline
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.values().map(|entry| entry.due).min()
    }

    /// Drops every pending entry, returning the keys that were pending
    pub fn clear(&mut self) -> Vec<K> {
        self.pending.drain().map(|(key, _)| key).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
