//! Transaction pool port, implemented by both the mempool and the regpool.

use crate::domain::{PoolEntry, TxId};

pub trait TxPool: Send + Sync {
    /// `mempool` or `regpool`.
    fn name(&self) -> &'static str;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries ordered by fee, highest first.
    fn entries(&self) -> Vec<PoolEntry>;

    /// Serialized transaction bytes.
    fn raw(&self, id: &TxId) -> Option<Vec<u8>>;

    /// Remove everything. Returns how many transactions were dropped.
    fn flush(&self) -> usize;

    /// Returns `false` when the transaction was not pooled.
    fn delete(&self, id: &TxId) -> bool;
}
