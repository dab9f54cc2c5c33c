//! Trait-based storage abstractions with an in-memory backend.

pub mod inmemory;
pub mod traits;

// Re-export commonly used types and traits
pub use inmemory::{MemoryGrantVerifier, MemoryOAuthStorage, SeedData};
pub use traits::*;

use std::sync::Arc;

/// Storage backend configuration and factory
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
}

/// Create a storage backend based on configuration
pub fn create_storage_backend(backend: StorageBackend) -> Arc<MemoryOAuthStorage> {
    match backend {
        StorageBackend::Memory => Arc::new(MemoryOAuthStorage::new()),
    }
}
