//! Snapshot store.
//!
//! The server broadcasts complete snapshots. The client keeps only the most
//! recent one: each arrival replaces the previous snapshot wholesale, with no
//! merging and no staleness check.

use arena_shared::world::Snapshot;

/// Latest authoritative snapshot.
#[derive(Debug, Default)]
pub struct StateStore {
    current: Option<Snapshot>,
    received: u64,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `snap` the render source of truth and returns the one it
    /// displaced.
    pub fn replace(&mut self, snap: Snapshot) -> Option<Snapshot> {
        self.received += 1;
        self.current.replace(snap)
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }

    /// Number of snapshots accepted since creation.
    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Drops the snapshot (session teardown).
    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_shared::world::Bush;

    fn with_bushes(n: usize) -> Snapshot {
        Snapshot {
            bushes: vec![
                Bush {
                    x: 0.0,
                    y: 0.0,
                    width: 60.0,
                    height: 60.0
                };
                n
            ],
            ..Snapshot::default()
        }
    }

    #[test]
    fn replace_discards_previous() {
        let mut store = StateStore::new();
        assert!(store.is_empty());
        assert_eq!(store.replace(with_bushes(3)), None);

        let old = store.replace(with_bushes(1)).unwrap();
        assert_eq!(old.bushes.len(), 3);
        assert_eq!(store.current().unwrap().bushes.len(), 1);
        assert_eq!(store.received(), 2);
    }

    #[test]
    fn empty_snapshot_replaces_full_one() {
        let mut store = StateStore::new();
        store.replace(with_bushes(4));
        store.replace(Snapshot::default());
        assert_eq!(store.current().unwrap().entity_count(), 0);

        store.clear();
        assert!(store.current().is_none());
        assert_eq!(store.received(), 2);
    }
}
