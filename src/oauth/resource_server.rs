//! Resource guard protecting endpoints with bearer token verification.
//!
//! A token may arrive in an `Authorization: Token token="..."` header, a query
//! parameter, or a form field. Failures either reject the request with a
//! `WWW-Authenticate` challenge or, when the [`GuardPolicy`] allows it, come back
//! as a soft [`Denial`] the caller can fall back from.

use axum::response::{IntoResponse, Response};
use chrono::Utc;
use http::{HeaderValue, StatusCode, header};
use serde_json::json;
use std::sync::Arc;

use crate::config::OAuthSettings;
use crate::errors::OAuthError;
use crate::oauth::request::RequestContext;
use crate::oauth::scope::scope_satisfied;
use crate::oauth::types::AccessToken;
use crate::storage::traits::OAuthStorage;

/// Which verification failures terminate the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardPolicy {
    pub exit_not_present: bool,
    pub exit_invalid: bool,
    pub exit_expired: bool,
    pub exit_scope: bool,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            exit_not_present: true,
            exit_invalid: true,
            exit_expired: true,
            exit_scope: true,
        }
    }
}

impl GuardPolicy {
    /// Policy that never terminates on a policy-gated failure
    pub fn soft() -> Self {
        Self {
            exit_not_present: false,
            exit_invalid: false,
            exit_expired: false,
            exit_scope: false,
        }
    }
}

/// Soft verification failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    NotPresent,
    InvalidToken,
    TokenExpired,
    AccessOutOfScope,
}

impl Denial {
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Denial::NotPresent => None,
            Denial::InvalidToken => Some("invalid_token"),
            Denial::TokenExpired => Some("token_expired"),
            Denial::AccessOutOfScope => Some("access_out_of_scope"),
        }
    }
}

/// Result of a verification that did not terminate the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Verified(AccessToken),
    Denied(Denial),
}

/// Terminal verification failure carrying its challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRejection {
    realm: String,
    error: Option<OAuthError>,
    scope: Option<String>,
}

impl GuardRejection {
    pub fn error(&self) -> Option<&OAuthError> {
        self.error.as_ref()
    }

    pub fn status(&self) -> StatusCode {
        self.error
            .as_ref()
            .map(OAuthError::status)
            .unwrap_or(StatusCode::UNAUTHORIZED)
    }

    /// `WWW-Authenticate` challenge value
    pub fn challenge(&self) -> String {
        let mut challenge = format!("Token realm='{}'", self.realm);
        if let Some(ref error) = self.error {
            challenge.push_str(&format!(", error='{}'", error.code()));
        }
        if let Some(ref scope) = self.scope {
            challenge.push_str(&format!(", scope='{}'", scope));
        }
        challenge
    }
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        let challenge = self.challenge();
        let body = match self.error {
            Some(ref error) => json!({
                "error": error.code(),
                "error_description": error.to_string(),
            }),
            None => json!({}),
        };

        let mut response = (self.status(), axum::Json(body)).into_response();
        let headers = response.headers_mut();
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        match HeaderValue::from_str(&challenge) {
            Ok(value) => {
                headers.insert(header::WWW_AUTHENTICATE, value);
            }
            Err(err) => {
                tracing::error!(error = ?err, "invalid WWW-Authenticate challenge");
            }
        }
        response
    }
}

/// Bearer token verifier for protected resources
pub struct ResourceGuard {
    storage: Arc<dyn OAuthStorage>,
    realm: String,
    token_param_name: String,
}

impl ResourceGuard {
    pub fn new(storage: Arc<dyn OAuthStorage>, settings: &OAuthSettings) -> Self {
        Self {
            storage,
            realm: settings.realm.clone(),
            token_param_name: settings.token_param_name.clone(),
        }
    }

    /// Verify the token presented with a request
    pub async fn verify(
        &self,
        context: &RequestContext,
        required_scope: Option<&str>,
        policy: &GuardPolicy,
    ) -> Result<GuardOutcome, GuardRejection> {
        let token = match self.extract_token(context) {
            Ok(Some(token)) => token,
            Ok(None) => return self.deny(Denial::NotPresent, policy.exit_not_present, None),
            Err(err) => return Err(self.reject(err, None)),
        };

        let access_token = match self.storage.get_token(&token).await {
            Ok(Some(access_token)) => access_token,
            Ok(None) => return self.deny(Denial::InvalidToken, policy.exit_invalid, None),
            Err(err) => return Err(self.reject(err.into(), None)),
        };

        if Utc::now() > access_token.expires_at {
            return self.deny(Denial::TokenExpired, policy.exit_expired, None);
        }

        if let Some(required) = required_scope {
            if !scope_satisfied(required, access_token.scope.as_deref()) {
                return self.deny(Denial::AccessOutOfScope, policy.exit_scope, Some(required));
            }
        }

        tracing::debug!(client_id = %access_token.client_id, "access token verified");
        Ok(GuardOutcome::Verified(access_token))
    }

    fn extract_token(&self, context: &RequestContext) -> Result<Option<String>, OAuthError> {
        let header_token = context.header("authorization").and_then(parse_token_header);
        let query_values = context.query_values(&self.token_param_name);
        let form_values = context.form_values(&self.token_param_name);

        let presented = usize::from(header_token.is_some()) + query_values.len() + form_values.len();
        if presented > 1 {
            return Err(OAuthError::MultipleAccessTokens(format!(
                "{} access tokens presented",
                presented
            )));
        }

        Ok(header_token
            .or_else(|| query_values.first().cloned())
            .or_else(|| form_values.first().cloned())
            .filter(|token| !token.is_empty()))
    }

    fn deny(
        &self,
        denial: Denial,
        exit: bool,
        required_scope: Option<&str>,
    ) -> Result<GuardOutcome, GuardRejection> {
        if !exit {
            tracing::debug!(denial = ?denial, "access token check failed softly");
            return Ok(GuardOutcome::Denied(denial));
        }

        let error = match denial {
            Denial::NotPresent => {
                tracing::warn!("access token not present");
                return Err(GuardRejection {
                    realm: self.realm.clone(),
                    error: None,
                    scope: None,
                });
            }
            Denial::InvalidToken => OAuthError::InvalidToken("Unknown access token".to_string()),
            Denial::TokenExpired => OAuthError::TokenExpired("Access token expired".to_string()),
            Denial::AccessOutOfScope => OAuthError::AccessOutOfScope(format!(
                "Access token lacks scope '{}'",
                required_scope.unwrap_or_default()
            )),
        };
        Err(self.reject(error, required_scope))
    }

    fn reject(&self, error: OAuthError, required_scope: Option<&str>) -> GuardRejection {
        tracing::warn!(error = error.code(), description = %error, "resource request rejected");
        let scope = match error {
            OAuthError::AccessOutOfScope(_) => required_scope.map(str::to_string),
            _ => None,
        };
        GuardRejection {
            realm: self.realm.clone(),
            error: Some(error),
            scope,
        }
    }
}

/// Token value of an `Authorization: Token token="..."` header
fn parse_token_header(value: &str) -> Option<String> {
    let (scheme, params) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("token") {
        return None;
    }

    params.split(',').find_map(|param| {
        let (name, value) = param.trim().split_once('=')?;
        if name.trim() != "token" {
            return None;
        }
        Some(
            value
                .trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .to_string(),
        )
    })
}
