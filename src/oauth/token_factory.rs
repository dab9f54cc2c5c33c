//! Mints and persists access tokens, refresh tokens, and authorization codes.

use chrono::Utc;
use std::sync::Arc;

use crate::config::OAuthSettings;
use crate::errors::OAuthError;
use crate::oauth::types::*;
use crate::storage::traits::OAuthStorage;

/// Token Factory
pub struct TokenFactory {
    storage: Arc<dyn OAuthStorage>,
    settings: Arc<OAuthSettings>,
}

impl TokenFactory {
    pub fn new(storage: Arc<dyn OAuthStorage>, settings: Arc<OAuthSettings>) -> Self {
        Self { storage, settings }
    }

    /// Issue an access token, plus a refresh token when the refresh grant is enabled.
    pub async fn issue_access_token(
        &self,
        client_id: &str,
        scope: Option<String>,
    ) -> Result<TokenResponse, OAuthError> {
        let now = Utc::now();
        let lifetime = self.settings.access_token_lifetime;

        let access_token = AccessToken {
            token: generate_token(),
            client_id: client_id.to_string(),
            expires_at: now + lifetime,
            scope: scope.clone(),
        };
        self.storage.store_token(&access_token).await?;

        let refresh_token = if self.settings.supports(GrantType::RefreshToken) {
            let refresh_token = RefreshToken {
                token: generate_token(),
                client_id: client_id.to_string(),
                expires_at: now + self.settings.refresh_token_lifetime,
                scope: scope.clone(),
            };
            self.storage.store_refresh_token(&refresh_token).await?;
            Some(refresh_token.token)
        } else {
            None
        };

        tracing::info!(
            client_id,
            with_refresh_token = refresh_token.is_some(),
            "issued access token"
        );

        Ok(TokenResponse {
            access_token: access_token.token,
            expires_in: lifetime.num_seconds(),
            scope,
            refresh_token,
        })
    }

    /// Issue a single-use authorization code bound to a client and redirect URI.
    pub async fn issue_authorization_code(
        &self,
        client_id: &str,
        redirect_uri: &str,
        scope: Option<String>,
    ) -> Result<String, OAuthError> {
        let auth_code = AuthorizationCode {
            code: generate_token(),
            client_id: client_id.to_string(),
            redirect_uri: redirect_uri.to_string(),
            scope,
            expires_at: Utc::now() + self.settings.auth_code_lifetime,
            used: false,
        };
        self.storage.store_code(&auth_code).await?;

        tracing::info!(client_id, "issued authorization code");

        Ok(auth_code.code)
    }
}
