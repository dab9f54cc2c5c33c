//! Collaborator contract for grants the engine cannot decide by itself.

use async_trait::async_trait;

use crate::errors::StorageError;

/// Answer from a grant verifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantCheck {
    Denied,
    /// Granted, optionally bounded by the returned scope
    Granted(Option<String>),
}

/// External checks backing the `user_basic_credentials`, `assertion`, and `none` grants
#[async_trait]
pub trait GrantVerifier: Send + Sync {
    /// Verify resource owner credentials presented by a client
    async fn check_user_credentials(
        &self,
        client_id: &str,
        username: &str,
        password: &str,
    ) -> Result<GrantCheck, StorageError>;

    /// Verify an assertion of the given format
    async fn check_assertion(
        &self,
        client_id: &str,
        assertion_type: &str,
        assertion: &str,
    ) -> Result<GrantCheck, StorageError>;

    /// Decide whether a client is trusted to obtain a token with no grant at all
    async fn check_implicit_trust(&self, client_id: &str) -> Result<GrantCheck, StorageError>;
}
