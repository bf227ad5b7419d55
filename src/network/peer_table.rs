use crate::network::message::PeerAddr;
use std::sync::RwLock;

/// The peer address table, refreshed from discovery snapshots.
///
/// Every mutation goes through a method and takes the table's own lock.
pub struct PeerTable {
    inner: RwLock<Vec<PeerAddr>>,
}

impl Default for PeerTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerTable {
    pub fn new() -> PeerTable {
        PeerTable {
            inner: RwLock::new(vec![]),
        }
    }

    pub fn add(&self, addr: PeerAddr) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on peer table - this should never happen");
        if !inner.contains(&addr) {
            inner.push(addr);
        }
    }

    pub fn evict(&self, addr: &PeerAddr) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on peer table - this should never happen");
        if let Some(idx) = inner.iter().position(|x| x == addr) {
            inner.remove(idx);
        }
    }

    /// Replace the whole table with a discovery snapshot, excluding `own`.
    pub fn replace_all(&self, peers: Vec<PeerAddr>, own: &PeerAddr) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on peer table - this should never happen");
        inner.clear();
        for peer in peers {
            if peer != *own && !inner.contains(&peer) {
                inner.push(peer);
            }
        }
    }

    pub fn snapshot(&self) -> Vec<PeerAddr> {
        self.inner
            .read()
            .expect("Failed to acquire read lock on peer table - this should never happen")
            .clone()
    }

    pub fn contains(&self, addr: &PeerAddr) -> bool {
        self.inner
            .read()
            .expect("Failed to acquire read lock on peer table - this should never happen")
            .contains(addr)
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .expect("Failed to acquire read lock on peer table - this should never happen")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let table = PeerTable::new();
        table.add(PeerAddr::new("127.0.0.1", 7101));
        table.add(PeerAddr::new("127.0.0.1", 7101));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_evict() {
        let table = PeerTable::new();
        let addr = PeerAddr::new("127.0.0.1", 7101);
        table.add(addr.clone());
        table.evict(&addr);
        assert!(table.is_empty());
    }

    #[test]
    fn test_replace_all_excludes_self() {
        let table = PeerTable::new();
        table.add(PeerAddr::new("127.0.0.1", 1));

        let own = PeerAddr::new("127.0.0.1", 7101);
        table.replace_all(
            vec![
                PeerAddr::new("127.0.0.1", 7102),
                own.clone(),
                PeerAddr::new("127.0.0.1", 7103),
            ],
            &own,
        );

        let snapshot = table.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot.contains(&own));
        assert!(!snapshot.contains(&PeerAddr::new("127.0.0.1", 1)));
    }
}
