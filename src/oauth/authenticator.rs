//! Client authentication and per-client grant authorization.

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::StorageError;
use crate::oauth::types::GrantType;
use crate::storage::traits::OAuthStorage;

/// Contract the engine uses to validate clients
#[async_trait]
pub trait ClientAuthenticator: Send + Sync {
    /// Validate a client identifier and optional secret
    async fn authenticate(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> Result<bool, StorageError>;

    /// Check that a client may use a grant type
    async fn is_authorized(
        &self,
        client_id: &str,
        grant_type: GrantType,
    ) -> Result<bool, StorageError>;

    /// Registered redirect URI of a client, if any
    async fn lookup_redirect_uri(&self, client_id: &str) -> Result<Option<String>, StorageError>;
}

/// Client authenticator backed by the client store
pub struct StorageClientAuthenticator {
    storage: Arc<dyn OAuthStorage>,
}

impl StorageClientAuthenticator {
    pub fn new(storage: Arc<dyn OAuthStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ClientAuthenticator for StorageClientAuthenticator {
    async fn authenticate(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> Result<bool, StorageError> {
        let Some(client) = self.storage.get_client(client_id).await? else {
            return Ok(false);
        };

        Ok(client.client_secret.as_deref() == client_secret)
    }

    async fn is_authorized(
        &self,
        client_id: &str,
        grant_type: GrantType,
    ) -> Result<bool, StorageError> {
        Ok(self
            .storage
            .get_client(client_id)
            .await?
            .is_some_and(|client| client.grant_types.contains(&grant_type)))
    }

    async fn lookup_redirect_uri(&self, client_id: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .storage
            .get_client(client_id)
            .await?
            .map(|client| client.redirect_uri)
            .filter(|redirect_uri| !redirect_uri.is_empty()))
    }
}
