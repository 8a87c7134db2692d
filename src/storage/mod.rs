//! Session persistence.
//!
//! A [`StorageBackend`] is the device's durable key-value store. The
//! [`SessionStore`] on top of it knows the two slots that make up a
//! persisted session and how each is encoded.

mod backend;
mod store;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use store::{SessionStore, StorageSlot};
