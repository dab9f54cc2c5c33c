//! Standardized error types following the `error-draftauth-<domain>-<number>` format.

use axum::response::{IntoResponse, Response};
use http::{HeaderValue, StatusCode, header};
use serde_json::json;
use thiserror::Error;

/// Configuration errors that occur during application startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error when PORT cannot be parsed
    #[error("error-draftauth-config-1 Parsing PORT into u16 failed: {0:?}")]
    PortParsingFailed(std::num::ParseIntError),

    /// Error when version information is not available
    #[error("error-draftauth-config-2 One of GIT_HASH or CARGO_PKG_VERSION must be set")]
    VersionNotSet,

    /// Error when duration string cannot be parsed
    #[error("error-draftauth-config-3 Failed to parse duration '{0}': {1}")]
    DurationParsingFailed(String, String),

    /// Error when a grant type name is not recognized
    #[error("error-draftauth-config-4 Unknown grant type '{0}'")]
    UnknownGrantType(String),

    /// Error when the realm is empty or contains a quote
    #[error("error-draftauth-config-5 Invalid authentication realm '{0}'")]
    InvalidRealm(String),

    /// Error when the seed file cannot be read or parsed
    #[error("error-draftauth-config-6 Failed to load seed file '{0}': {1}")]
    SeedLoadFailed(String, String),
}

/// HTTP server errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Error when template rendering fails
    #[error("error-draftauth-http-1 Template rendering failed: {0}")]
    TemplateRenderingFailed(String),
}

/// Protocol errors produced by the grant, authorization, and resource engines.
///
/// Every variant maps to exactly one machine-readable code and transport status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OAuthError {
    /// Unknown, missing, or malformed request fields
    #[error("error-draftauth-oauth-1 Invalid request: {0}")]
    InvalidRequest(String),

    /// Grant type recognized but not enabled for this deployment
    #[error("error-draftauth-oauth-2 Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    /// Client identifier or secret rejected
    #[error("error-draftauth-oauth-3 Invalid client credentials: {0}")]
    InvalidClientCredentials(String),

    /// Client is not permitted to use the requested grant type
    #[error("error-draftauth-oauth-4 Unauthorized client: {0}")]
    UnauthorizedClient(String),

    /// Supplied redirect URI does not match the registered one
    #[error("error-draftauth-oauth-5 Redirect URI mismatch: {0}")]
    RedirectUriMismatch(String),

    /// Authorization code or refresh token unknown, consumed, or bound elsewhere
    #[error("error-draftauth-oauth-6 Bad authorization code: {0}")]
    BadAuthorizationCode(String),

    /// Authorization code or refresh token past its expiration
    #[error("error-draftauth-oauth-7 Authorization expired: {0}")]
    AuthorizationExpired(String),

    /// Assertion rejected by the assertion checker
    #[error("error-draftauth-oauth-8 Invalid assertion: {0}")]
    InvalidAssertion(String),

    /// Resource owner credentials rejected
    #[error("error-draftauth-oauth-9 Invalid user credentials: {0}")]
    InvalidUserCredentials(String),

    /// Resource owner denied the authorization request
    #[error("error-draftauth-oauth-10 User denied: {0}")]
    UserDenied(String),

    /// Client credentials presented through more than one channel
    #[error("error-draftauth-oauth-11 Multiple credentials: {0}")]
    MultipleCredentials(String),

    /// More than one authorization scheme presented
    #[error("error-draftauth-oauth-12 Multiple authorization methods: {0}")]
    MultipleAuthorizationMethods(String),

    /// Bearer token presented through more than one channel
    #[error("error-draftauth-oauth-13 Multiple access tokens: {0}")]
    MultipleAccessTokens(String),

    /// Bearer token past its expiration
    #[error("error-draftauth-oauth-14 Token expired: {0}")]
    TokenExpired(String),

    /// Requested scope not covered by the granted scope
    #[error("error-draftauth-oauth-15 Access out of scope: {0}")]
    AccessOutOfScope(String),

    /// Bearer token unknown
    #[error("error-draftauth-oauth-16 Invalid token: {0}")]
    InvalidToken(String),

    /// Storage collaborator failure; aborts the current request
    #[error("error-draftauth-oauth-17 Server error: {0}")]
    ServerError(String),
}

impl OAuthError {
    /// Machine-readable error code placed in response bodies and challenges.
    pub fn code(&self) -> &'static str {
        match self {
            OAuthError::InvalidRequest(_) => "invalid_request",
            OAuthError::UnsupportedGrantType(_) => "unsupported_grant_type",
            OAuthError::InvalidClientCredentials(_) => "invalid_client_credentials",
            OAuthError::UnauthorizedClient(_) => "unauthorized_client",
            OAuthError::RedirectUriMismatch(_) => "redirect_uri_mismatch",
            OAuthError::BadAuthorizationCode(_) => "bad_authorization_code",
            OAuthError::AuthorizationExpired(_) => "authorization_expired",
            OAuthError::InvalidAssertion(_) => "invalid_assertion",
            OAuthError::InvalidUserCredentials(_) => "invalid_user_credentials",
            OAuthError::UserDenied(_) => "user_denied",
            OAuthError::MultipleCredentials(_) => "multiple_credentials",
            OAuthError::MultipleAuthorizationMethods(_) => "multiple_authorization_methods",
            OAuthError::MultipleAccessTokens(_) => "multiple_access_tokens",
            OAuthError::TokenExpired(_) => "token_expired",
            OAuthError::AccessOutOfScope(_) => "access_out_of_scope",
            OAuthError::InvalidToken(_) => "invalid_token",
            OAuthError::ServerError(_) => "server_error",
        }
    }

    /// Transport status class for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            OAuthError::InvalidClientCredentials(_)
            | OAuthError::UnauthorizedClient(_)
            | OAuthError::InvalidToken(_)
            | OAuthError::TokenExpired(_)
            | OAuthError::AccessOutOfScope(_) => StatusCode::UNAUTHORIZED,
            OAuthError::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<StorageError> for OAuthError {
    fn from(err: StorageError) -> Self {
        tracing::error!(error = ?err, "storage collaborator failed");
        OAuthError::ServerError(err.to_string())
    }
}

/// Database/storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Error when a lock guarding in-memory state is poisoned
    #[error("error-draftauth-storage-1 Lock poisoned: {0}")]
    LockPoisoned(String),

    /// Error when data serialization fails
    #[error("error-draftauth-storage-2 Data serialization failed: {0}")]
    SerializationFailed(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        tracing::error!(error = ?self, "internal server error");
        (StatusCode::INTERNAL_SERVER_ERROR).into_response()
    }
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.code(),
            "error_description": self.to_string(),
        });

        let mut response = (self.status(), axum::Json(body)).into_response();
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        let cases = [
            (OAuthError::InvalidRequest(String::new()), "invalid_request", 400),
            (OAuthError::UnsupportedGrantType(String::new()), "unsupported_grant_type", 400),
            (
                OAuthError::InvalidClientCredentials(String::new()),
                "invalid_client_credentials",
                401,
            ),
            (OAuthError::UnauthorizedClient(String::new()), "unauthorized_client", 401),
            (OAuthError::RedirectUriMismatch(String::new()), "redirect_uri_mismatch", 400),
            (OAuthError::BadAuthorizationCode(String::new()), "bad_authorization_code", 400),
            (OAuthError::AuthorizationExpired(String::new()), "authorization_expired", 400),
            (OAuthError::InvalidAssertion(String::new()), "invalid_assertion", 400),
            (OAuthError::InvalidUserCredentials(String::new()), "invalid_user_credentials", 400),
            (OAuthError::UserDenied(String::new()), "user_denied", 400),
            (OAuthError::MultipleCredentials(String::new()), "multiple_credentials", 400),
            (
                OAuthError::MultipleAuthorizationMethods(String::new()),
                "multiple_authorization_methods",
                400,
            ),
            (OAuthError::MultipleAccessTokens(String::new()), "multiple_access_tokens", 400),
            (OAuthError::TokenExpired(String::new()), "token_expired", 401),
            (OAuthError::AccessOutOfScope(String::new()), "access_out_of_scope", 401),
            (OAuthError::InvalidToken(String::new()), "invalid_token", 401),
            (OAuthError::ServerError(String::new()), "server_error", 500),
        ];

        for (error, code, status) in cases {
            assert_eq!(error.code(), code);
            assert_eq!(error.status().as_u16(), status, "status for {code}");
        }
    }

    #[test]
    fn test_error_response_is_not_cached() {
        let response = OAuthError::InvalidRequest("missing grant_type".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store"
        );
    }

    #[test]
    fn test_storage_error_becomes_server_error() {
        let err: OAuthError = StorageError::LockPoisoned("boom".to_string()).into();
        assert_eq!(err.code(), "server_error");
        assert!(err.to_string().contains("boom"));
    }
}
