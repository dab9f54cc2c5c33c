//! In-memory storage implementations
//!
//! This module provides in-memory implementations of all storage traits and of
//! the grant verifier. These implementations are suitable for development and testing.

mod grants;
mod oauth;

pub use grants::{MemoryGrantVerifier, SeedAssertion, SeedUser};
pub use oauth::{MemoryOAuthStorage, SeedData};
