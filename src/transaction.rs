//! Read-only and read-write scopes over the store.
//!
//! Grounded on the reference implementation's `transaction.go`
//! (`readOnlyTransaction` / `readWriteTransaction`), reshaped around
//! Rust ownership: where the original tracks an `isOpen` flag and
//! panics-by-log on reuse, `commit`/`cancel` here *consume* `self`, so a
//! transaction cannot be used after it closes — the compiler enforces
//! what the original checked at runtime. See `DESIGN.md` for the
//! corresponding Open Question resolution.

use crate::codec::Operation;
use crate::engine::EngineState;
use crate::error::Result;
use crate::store::Record;
use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// A read-only view over the store as of the moment it was opened.
/// Holds the engine's shared lock for its entire lifetime.
pub struct ReadOnlyTransaction<'a> {
    id: Uuid,
    guard: RwLockReadGuard<'a, EngineState>,
}

impl<'a> ReadOnlyTransaction<'a> {
    pub(crate) fn new(guard: RwLockReadGuard<'a, EngineState>) -> Self {
        let id = Uuid::new_v4();
        tracing::trace!(tx_id = %id, "opened read-only transaction");
        Self { id, guard }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn get(&self, key: &str) -> Option<Record> {
        self.guard.store.get(key)
    }

    pub fn list(&self, tags: &[String]) -> Vec<Record> {
        self.guard.store.list(tags)
    }

    /// Releases the shared lock. Equivalent to dropping the transaction;
    /// provided so callers can close explicitly rather than relying on
    /// scope exit.
    pub fn close(self) {
        tracing::trace!(tx_id = %self.id, "closed read-only transaction");
    }
}

/// An exclusive read-write scope. Buffers operations and only writes
/// them to the WAL (and applies them to the store) on `commit`. Reads
/// performed through this transaction see the store's pre-transaction
/// state: buffered writes are not visible until commit.
pub struct ReadWriteTransaction<'a> {
    id: Uuid,
    guard: RwLockWriteGuard<'a, EngineState>,
    buffer: Vec<Operation>,
}

impl<'a> ReadWriteTransaction<'a> {
    pub(crate) fn new(guard: RwLockWriteGuard<'a, EngineState>) -> Self {
        let id = Uuid::new_v4();
        tracing::trace!(tx_id = %id, "opened read-write transaction");
        Self {
            id,
            guard,
            buffer: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn get(&self, key: &str) -> Option<Record> {
        self.guard.store.get(key)
    }

    pub fn list(&self, tags: &[String]) -> Vec<Record> {
        self.guard.store.list(tags)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.buffer.push(Operation::Set {
            tx_id: self.id,
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn delete(&mut self, key: impl Into<String>) {
        self.buffer.push(Operation::Delete {
            tx_id: self.id,
            key: key.into(),
        });
    }

    pub fn tag(&mut self, key: impl Into<String>, tag: impl Into<String>) {
        self.buffer.push(Operation::Tag {
            tx_id: self.id,
            key: key.into(),
            tag: tag.into(),
        });
    }

    pub fn untag(&mut self, key: impl Into<String>, tag: impl Into<String>) {
        self.buffer.push(Operation::Untag {
            tx_id: self.id,
            key: key.into(),
            tag: tag.into(),
        });
    }

    /// Appends the closing `Commit` record, durably writes the whole
    /// buffer to the current WAL segment, and only then applies it to
    /// the in-memory store. If the WAL write fails the store is left
    /// untouched and the error is returned — the segment may now hold
    /// uncommitted trailing records, which the next recovery filters out.
    pub fn commit(mut self) -> Result<()> {
        self.buffer.push(Operation::Commit { tx_id: self.id });

        self.guard.wal.current().append(&self.buffer)?;
        self.guard.store.apply(&self.buffer);

        tracing::debug!(tx_id = %self.id, ops = self.buffer.len(), "committed transaction");
        Ok(())
    }

    /// Discards the buffer without touching the WAL or the store.
    pub fn cancel(self) {
        tracing::trace!(tx_id = %self.id, ops = self.buffer.len(), "cancelled transaction");
    }
}
