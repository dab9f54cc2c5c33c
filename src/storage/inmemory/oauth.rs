//! In-memory OAuth storage implementation
//!
//! This module provides in-memory implementations for OAuth-related storage traits.

use crate::errors::StorageError;
use crate::oauth::types::*;
use crate::storage::inmemory::grants::{SeedAssertion, SeedUser};
use crate::storage::traits::*;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

pub type Result<T> = std::result::Result<T, StorageError>;

/// Seed document loaded at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub clients: Vec<OAuthClient>,
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub assertions: Vec<SeedAssertion>,
    /// Clients accepted by the `none` grant
    #[serde(default)]
    pub trusted_clients: Vec<String>,
}

impl SeedData {
    /// Parse a seed document from JSON
    pub fn from_json(value: &str) -> Result<Self> {
        serde_json::from_str(value).map_err(|e| StorageError::SerializationFailed(e.to_string()))
    }
}

/// In-memory implementation for OAuth storage
#[derive(Default)]
pub struct MemoryOAuthStorage {
    clients: Mutex<HashMap<String, OAuthClient>>,
    auth_codes: Mutex<HashMap<String, AuthorizationCode>>,
    access_tokens: Mutex<HashMap<String, AccessToken>>,
    refresh_tokens: Mutex<HashMap<String, RefreshToken>>,
}

impl MemoryOAuthStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store every client of a seed document
    pub async fn seed(&self, seed: &SeedData) -> Result<usize> {
        for client in &seed.clients {
            self.store_client(client).await?;
        }
        Ok(seed.clients.len())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|e| StorageError::LockPoisoned(format!("Lock error: {}", e)))
}

#[async_trait]
impl OAuthClientStore for MemoryOAuthStorage {
    async fn store_client(&self, client: &OAuthClient) -> Result<()> {
        let mut clients = lock(&self.clients)?;
        clients.insert(client.client_id.clone(), client.clone());
        Ok(())
    }

    async fn get_client(&self, client_id: &str) -> Result<Option<OAuthClient>> {
        let clients = lock(&self.clients)?;
        Ok(clients.get(client_id).cloned())
    }

    async fn delete_client(&self, client_id: &str) -> Result<()> {
        let mut clients = lock(&self.clients)?;
        clients.remove(client_id);
        Ok(())
    }

    async fn list_clients(&self, limit: Option<usize>) -> Result<Vec<OAuthClient>> {
        let clients = lock(&self.clients)?;
        let mut result: Vec<_> = clients.values().cloned().collect();
        result.sort_by(|a, b| a.client_id.cmp(&b.client_id));
        if let Some(limit) = limit {
            result.truncate(limit);
        }
        Ok(result)
    }
}

#[async_trait]
impl AuthorizationCodeStore for MemoryOAuthStorage {
    async fn store_code(&self, code: &AuthorizationCode) -> Result<()> {
        let mut codes = lock(&self.auth_codes)?;
        codes.insert(code.code.clone(), code.clone());
        Ok(())
    }

    async fn consume_code(&self, code: &str) -> Result<Option<AuthorizationCode>> {
        let mut codes = lock(&self.auth_codes)?;

        match codes.get_mut(code) {
            Some(auth_code) if !auth_code.used => {
                auth_code.used = true;
                Ok(Some(auth_code.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn cleanup_expired_codes(&self) -> Result<usize> {
        let mut codes = lock(&self.auth_codes)?;

        let now = Utc::now();
        let initial_count = codes.len();
        codes.retain(|_, code| code.expires_at >= now);

        Ok(initial_count - codes.len())
    }
}

#[async_trait]
impl AccessTokenStore for MemoryOAuthStorage {
    async fn store_token(&self, token: &AccessToken) -> Result<()> {
        let mut tokens = lock(&self.access_tokens)?;
        tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn get_token(&self, token: &str) -> Result<Option<AccessToken>> {
        let tokens = lock(&self.access_tokens)?;
        Ok(tokens.get(token).cloned())
    }

    async fn cleanup_expired_tokens(&self) -> Result<usize> {
        let mut tokens = lock(&self.access_tokens)?;

        let now = Utc::now();
        let initial_count = tokens.len();
        tokens.retain(|_, token| token.expires_at >= now);

        Ok(initial_count - tokens.len())
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryOAuthStorage {
    async fn store_refresh_token(&self, token: &RefreshToken) -> Result<()> {
        let mut tokens = lock(&self.refresh_tokens)?;
        tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>> {
        let tokens = lock(&self.refresh_tokens)?;
        Ok(tokens.get(token).cloned())
    }

    async fn cleanup_expired_refresh_tokens(&self) -> Result<usize> {
        let mut tokens = lock(&self.refresh_tokens)?;

        let now = Utc::now();
        let initial_count = tokens.len();
        tokens.retain(|_, token| token.expires_at >= now);

        Ok(initial_count - tokens.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn code(value: &str, expires_in: Duration) -> AuthorizationCode {
        AuthorizationCode {
            code: value.to_string(),
            client_id: "abc12".to_string(),
            redirect_uri: "https://example.com/cb".to_string(),
            scope: None,
            expires_at: Utc::now() + expires_in,
            used: false,
        }
    }

    #[tokio::test]
    async fn test_consume_code_only_once() {
        let storage = MemoryOAuthStorage::new();
        storage.store_code(&code("code-1", Duration::seconds(30))).await.unwrap();

        let first = storage.consume_code("code-1").await.unwrap();
        assert!(first.is_some());
        assert!(first.unwrap().used);

        assert!(storage.consume_code("code-1").await.unwrap().is_none());
        assert!(storage.consume_code("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_consume_returns_expired_code() {
        let storage = MemoryOAuthStorage::new();
        storage.store_code(&code("old", Duration::seconds(-5))).await.unwrap();

        let consumed = storage.consume_code("old").await.unwrap().unwrap();
        assert!(consumed.expires_at < Utc::now());
    }

    #[tokio::test]
    async fn test_concurrent_consume_single_winner() {
        let storage = Arc::new(MemoryOAuthStorage::new());
        storage.store_code(&code("race", Duration::seconds(30))).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                storage.consume_code("race").await.unwrap().is_some()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_get_token_returns_expired() {
        let storage = MemoryOAuthStorage::new();
        let token = AccessToken {
            token: "expired".to_string(),
            client_id: "abc12".to_string(),
            expires_at: Utc::now() - Duration::hours(1),
            scope: None,
        };
        storage.store_token(&token).await.unwrap();

        assert_eq!(storage.get_token("expired").await.unwrap(), Some(token));
        assert_eq!(storage.cleanup_expired_tokens().await.unwrap(), 1);
        assert_eq!(storage.get_token("expired").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_refresh_token_read_is_not_destructive() {
        let storage = MemoryOAuthStorage::new();
        let token = RefreshToken {
            token: "refresh".to_string(),
            client_id: "abc12".to_string(),
            expires_at: Utc::now() + Duration::days(14),
            scope: Some("read".to_string()),
        };
        storage.store_refresh_token(&token).await.unwrap();

        assert!(storage.get_refresh_token("refresh").await.unwrap().is_some());
        assert!(storage.get_refresh_token("refresh").await.unwrap().is_some());
        assert_eq!(storage.cleanup_expired_refresh_tokens().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_seed_clients() {
        let seed = SeedData::from_json(
            r#"{
                "clients": [
                    {"client_id": "abc12", "client_secret": "s3cret",
                     "redirect_uri": "https://example.com/cb",
                     "grant_types": ["authorization_code", "refresh_token"]},
                    {"client_id": "public-app"}
                ],
                "trusted_clients": ["public-app"]
            }"#,
        )
        .unwrap();

        let storage = MemoryOAuthStorage::new();
        assert_eq!(storage.seed(&seed).await.unwrap(), 2);

        let clients = storage.list_clients(None).await.unwrap();
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0].client_id, "abc12");
        assert_eq!(
            clients[0].grant_types,
            vec![GrantType::AuthorizationCode, GrantType::RefreshToken]
        );
        assert_eq!(clients[1].redirect_uri, "");
        assert!(clients[1].grant_types.is_empty());

        storage.delete_client("abc12").await.unwrap();
        assert!(storage.get_client("abc12").await.unwrap().is_none());
        assert_eq!(storage.list_clients(Some(0)).await.unwrap().len(), 0);
    }
}
