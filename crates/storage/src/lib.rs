//! Credential storage for Roombook
//!
//! This crate defines the secure storage seam the session layer persists
//! credentials through, plus a file-backed and an in-memory implementation.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod vault;

pub use vault::{FileStore, FileStoreConfig, MemoryStore, SecureStore, StorageError};
