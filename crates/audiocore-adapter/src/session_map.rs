//! Sink-input index <-> session id mapping table.
//!
//! Populated by `SINK_INPUT_NEW`, consulted by `SINK_INPUT_REMOVE` to map
//! the daemon's ephemeral sink-input index back to the session the policy
//! layer knows about. Uses a copy-on-write snapshot so the subscribe
//! callback (invoked from the service adapter's connection thread) never
//! blocks on a lock the IO threads or policy layer might be holding.

use arc_swap::ArcSwap;
use audiocore_types::SessionId;
use std::collections::HashMap;
use std::sync::Arc;

/// Sink-input or source-output index as reported by the mixing daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkInputIndex(pub u32);

/// Copy-on-write sink-input-index -> session-id table.
#[derive(Debug, Default)]
pub struct SessionMap {
    inner: ArcSwap<HashMap<SinkInputIndex, SessionId>>,
}

impl SessionMap {
    /// An empty map.
    pub fn new() -> Self {
        Self {
            inner: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Record the mapping learned from a `SINK_INPUT_NEW` event.
    pub fn insert(&self, index: SinkInputIndex, session: SessionId) {
        self.inner.rcu(|old| {
            let mut next = HashMap::clone(old);
            next.insert(index, session);
            next
        });
    }

    /// Look up and remove the session for a `SINK_INPUT_REMOVE` event.
    pub fn remove(&self, index: SinkInputIndex) -> Option<SessionId> {
        let mut removed = None;
        self.inner.rcu(|old| {
            let mut next = HashMap::clone(old);
            removed = next.remove(&index);
            next
        });
        removed
    }

    /// Current session for a sink-input index, without removing it.
    pub fn get(&self, index: SinkInputIndex) -> Option<SessionId> {
        self.inner.load().get(&index).copied()
    }

    /// Number of tracked mappings.
    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Clone for SessionMap {
    fn clone(&self) -> Self {
        Self {
            inner: ArcSwap::new(Arc::clone(&self.inner.load())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_then_remove_round_trips() {
        let map = SessionMap::new();
        map.insert(SinkInputIndex(7), SessionId(42));
        assert_eq!(map.get(SinkInputIndex(7)), Some(SessionId(42)));
        assert_eq!(map.remove(SinkInputIndex(7)), Some(SessionId(42)));
        assert!(map.is_empty());
    }

    #[test]
    fn remove_of_unknown_index_returns_none() {
        let map = SessionMap::new();
        assert_eq!(map.remove(SinkInputIndex(1)), None);
    }
}
