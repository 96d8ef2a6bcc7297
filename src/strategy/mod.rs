//! Persistence strategies.
//!
//! [`PersistenceStrategy`] is the contract persistent items are written
//! against. [`SyncStrategy`] and [`AsyncStrategy`] adapt raw backends to it
//! with one shared encode/decode/validate policy ([`codec`]), so the only
//! observable difference between backends is whether `get_sync` can answer.

pub mod async_adapter;
pub mod codec;
pub mod factory;
pub mod sync_adapter;
pub mod traits;

pub use async_adapter::AsyncStrategy;
pub use factory::{Strategy, create_default_strategy, create_strategy};
pub use sync_adapter::SyncStrategy;
pub use traits::{
    DeserializeFn, PersistenceStrategy, ReadOptions, SerializeFn, ValidateFn, WriteOptions,
};
