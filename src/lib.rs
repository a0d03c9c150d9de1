//! `tagkv` — an embedded, single-node, tagged key-value store.
//!
//! A [`Record`] pairs a unique string key with a free-text value and a
//! set of user-defined tags; durability comes from an append-only
//! write-ahead log, and the in-memory index is rebuilt from it on every
//! [`Engine::open`]. See [`Engine`] for the public surface.

pub mod bimap;
pub mod codec;
pub mod engine;
pub mod error;
pub mod store;
pub mod transaction;
pub mod validation;
pub mod wal;

pub use engine::{Engine, EngineConfig};
pub use error::{Error, Result};
pub use store::Record;
