//! In-memory transaction pool.

use chrono::Utc;
use parking_lot::RwLock;

use crate::domain::{PoolEntry, TxId};
use crate::port::outbound::TxPool;

#[derive(Debug)]
struct Pooled {
    entry: PoolEntry,
    raw: Vec<u8>,
}

/// In-memory [`TxPool`]; used for both the mempool and the regpool.
#[derive(Debug)]
pub struct MemoryPool {
    name: &'static str,
    txs: RwLock<Vec<Pooled>>,
}

impl MemoryPool {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            txs: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn mempool() -> Self {
        Self::new("mempool")
    }

    #[must_use]
    pub fn regpool() -> Self {
        Self::new("regpool")
    }

    /// Pool a transaction; its id is the hash of its bytes.
    pub fn add(&self, raw: Vec<u8>, fee: u64) -> TxId {
        let id = TxId::digest(&raw);
        let mut txs = self.txs.write();
        if !txs.iter().any(|p| p.entry.id == id) {
            txs.push(Pooled {
                entry: PoolEntry {
                    id,
                    size: raw.len(),
                    fee,
                    added_at: Utc::now(),
                },
                raw,
            });
        }
        id
    }
}

impl TxPool for MemoryPool {
    fn name(&self) -> &'static str {
        self.name
    }

    fn len(&self) -> usize {
        self.txs.read().len()
    }

    fn entries(&self) -> Vec<PoolEntry> {
        let mut entries: Vec<PoolEntry> = self.txs.read().iter().map(|p| p.entry.clone()).collect();
        entries.sort_by(|a, b| b.fee.cmp(&a.fee));
        entries
    }

    fn raw(&self, id: &TxId) -> Option<Vec<u8>> {
        self.txs
            .read()
            .iter()
            .find(|p| p.entry.id == *id)
            .map(|p| p.raw.clone())
    }

    fn flush(&self) -> usize {
        let mut txs = self.txs.write();
        let count = txs.len();
        txs.clear();
        count
    }

    fn delete(&self, id: &TxId) -> bool {
        let mut txs = self.txs.write();
        let before = txs.len();
        txs.retain(|p| p.entry.id != *id);
        txs.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_sorted_by_fee() {
        let pool = MemoryPool::mempool();
        pool.add(b"cheap".to_vec(), 1);
        pool.add(b"rich".to_vec(), 9);
        let entries = pool.entries();
        assert_eq!(entries[0].fee, 9);
        assert_eq!(entries[1].size, 5);
    }

    #[test]
    fn delete_reports_presence() {
        let pool = MemoryPool::regpool();
        let id = pool.add(b"reg".to_vec(), 0);
        assert!(pool.delete(&id));
        assert!(!pool.delete(&id));
        assert!(pool.is_empty());
    }
}
