//! # Persistent Storage Backends
//!
//! Disk-backed implementations of the `DirectoryStore` trait.

mod redb_directory;

pub use redb_directory::RedbDirectory;
