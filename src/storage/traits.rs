//! Storage trait definitions for OAuth clients, codes, and tokens.
//!
//! Defines async storage interfaces the engine calls as collaborators. Backends
//! must make each operation atomic per entity; in particular `consume_code`
//! is a check-and-invalidate that succeeds at most once per code.

use crate::errors::StorageError;
use crate::oauth::types::*;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Trait for storing and retrieving OAuth clients
#[async_trait]
pub trait OAuthClientStore {
    /// Store or replace an OAuth client
    async fn store_client(&self, client: &OAuthClient) -> Result<()>;

    /// Retrieve a client by ID
    async fn get_client(&self, client_id: &str) -> Result<Option<OAuthClient>>;

    /// Delete a client
    async fn delete_client(&self, client_id: &str) -> Result<()>;

    /// List all clients (for admin purposes)
    async fn list_clients(&self, limit: Option<usize>) -> Result<Vec<OAuthClient>>;
}

/// Trait for storing and redeeming authorization codes
#[async_trait]
pub trait AuthorizationCodeStore {
    /// Store a new authorization code
    async fn store_code(&self, code: &AuthorizationCode) -> Result<()>;

    /// Atomically retrieve and invalidate an authorization code.
    ///
    /// The first call for a stored code returns it (expired or not) and marks
    /// it used; every later call returns `None`.
    async fn consume_code(&self, code: &str) -> Result<Option<AuthorizationCode>>;

    /// Clean up expired codes
    async fn cleanup_expired_codes(&self) -> Result<usize>;
}

/// Trait for storing and retrieving access tokens
#[async_trait]
pub trait AccessTokenStore {
    /// Store a new access token
    async fn store_token(&self, token: &AccessToken) -> Result<()>;

    /// Retrieve an access token, including expired ones
    async fn get_token(&self, token: &str) -> Result<Option<AccessToken>>;

    /// Clean up expired tokens
    async fn cleanup_expired_tokens(&self) -> Result<usize>;
}

/// Trait for storing and retrieving refresh tokens
#[async_trait]
pub trait RefreshTokenStore {
    /// Store a new refresh token
    async fn store_refresh_token(&self, token: &RefreshToken) -> Result<()>;

    /// Retrieve a refresh token without consuming it
    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>>;

    /// Cleanup expired refresh tokens
    async fn cleanup_expired_refresh_tokens(&self) -> Result<usize>;
}

// ===== Combined Storage Trait =====

/// Combined OAuth storage trait
pub trait OAuthStorage:
    OAuthClientStore + AuthorizationCodeStore + AccessTokenStore + RefreshTokenStore + Send + Sync
{
}

impl<T> OAuthStorage for T where
    T: OAuthClientStore
        + AuthorizationCodeStore
        + AccessTokenStore
        + RefreshTokenStore
        + Send
        + Sync
{
}
