//! Peer Table
//!
//! Last known snapshot per subscribed peer.

use std::collections::HashMap;

use super::message::PeerSnapshot;

/// Map of peer id to that peer's latest snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeerTable {
    peers: HashMap<String, PeerSnapshot>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entry for the snapshot's peer.
    pub fn upsert(&mut self, snapshot: PeerSnapshot) {
        self.peers.insert(snapshot.peer_id.clone(), snapshot);
    }

    /// Removes a peer, returning its last snapshot.
    pub fn remove(&mut self, peer_id: &str) -> Option<PeerSnapshot> {
        self.peers.remove(peer_id)
    }

    pub fn get(&self, peer_id: &str) -> Option<&PeerSnapshot> {
        self.peers.get(peer_id)
    }

    pub fn contains(&self, peer_id: &str) -> bool {
        self.peers.contains_key(peer_id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Snapshots ordered by peer id.
    pub fn sorted(&self) -> Vec<&PeerSnapshot> {
        let mut peers: Vec<_> = self.peers.values().collect();
        peers.sort_by(|a, b| a.peer_id.cmp(&b.peer_id));
        peers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::Fix;

    fn snapshot(id: &str, ts: u64) -> PeerSnapshot {
        PeerSnapshot {
            peer_id: id.into(),
            display_name: id.to_uppercase(),
            last_fix: Fix::new(1.0, 1.0, ts),
            is_active: true,
            distance_meters: 0.0,
            duration_ms: 0,
        }
    }

    #[test]
    fn test_upsert_replaces_entry() {
        let mut table = PeerTable::new();
        table.upsert(snapshot("p", 1));
        table.upsert(snapshot("p", 2));

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("p").unwrap().last_fix.timestamp, 2);
    }

    #[test]
    fn test_remove_and_sorted() {
        let mut table = PeerTable::new();
        table.upsert(snapshot("b", 1));
        table.upsert(snapshot("a", 1));

        let ids: Vec<_> = table.sorted().iter().map(|p| p.peer_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(table.remove("a").is_some());
        assert!(table.remove("a").is_none());
        assert!(!table.contains("a"));
        assert_eq!(table.len(), 1);
    }
}
