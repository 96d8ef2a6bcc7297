//! Raw storage backends.
//!
//! Backends move opaque text under a key and know nothing about the values'
//! types. Synchronous backends implement [`SyncBackend`], backends that
//! suspend on I/O implement [`AsyncBackend`].

pub mod file;
pub mod memory;
pub mod remote;
pub mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use remote::RemoteStore;
pub use traits::{AsyncBackend, SyncBackend};
