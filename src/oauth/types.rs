//! Core OAuth types and data structures.
//!
//! Defines the grant and client-type enumerations, the persisted code and token
//! records, and the transient token / authorization requests.

use base64::prelude::*;
use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::errors::OAuthError;

/// Grant types understood by the token endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    UserBasicCredentials,
    Assertion,
    RefreshToken,
    None,
}

impl GrantType {
    pub const ALL: [GrantType; 5] = [
        GrantType::AuthorizationCode,
        GrantType::UserBasicCredentials,
        GrantType::Assertion,
        GrantType::RefreshToken,
        GrantType::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::UserBasicCredentials => "user_basic_credentials",
            GrantType::Assertion => "assertion",
            GrantType::RefreshToken => "refresh_token",
            GrantType::None => "none",
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrantType {
    type Err = OAuthError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        GrantType::ALL
            .into_iter()
            .find(|grant_type| grant_type.as_str() == value)
            .ok_or_else(|| OAuthError::InvalidRequest(format!("Unknown grant type: {value}")))
    }
}

/// Client type named by the `type` authorization parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    /// Receives an authorization code in the query component
    WebServer,
    /// Receives an access token in the fragment component
    UserAgent,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::WebServer => "web_server",
            ClientType::UserAgent => "user_agent",
        }
    }
}

impl FromStr for ClientType {
    type Err = OAuthError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "web_server" => Ok(ClientType::WebServer),
            "user_agent" => Ok(ClientType::UserAgent),
            _ => Err(OAuthError::InvalidRequest(format!(
                "Unknown client type: {value}"
            ))),
        }
    }
}

/// Registered OAuth client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthClient {
    /// Unique client identifier
    pub client_id: String,
    /// Client secret (absent for clients that authenticate by id alone)
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Registered redirect URI, empty when none was registered
    #[serde(default)]
    pub redirect_uri: String,
    /// Grant types this client may use at the token endpoint
    #[serde(default)]
    pub grant_types: Vec<GrantType>,
}

/// Validated authorization endpoint request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Client ID
    pub client_id: String,
    /// Client type selecting code or implicit token delivery
    pub client_type: ClientType,
    /// Effective redirect URI (registered or supplied)
    pub redirect_uri: String,
    /// Opaque state echoed back to the client
    pub state: Option<String>,
    /// Requested scope
    pub scope: Option<String>,
}

/// Authorization code issued after the resource owner approves a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCode {
    /// The authorization code
    pub code: String,
    /// Client ID that requested this code
    pub client_id: String,
    /// Redirect URI the code was issued for
    pub redirect_uri: String,
    /// Granted scope
    pub scope: Option<String>,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Whether this code has been redeemed
    pub used: bool,
}

/// Bearer access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// The access token
    pub token: String,
    /// Client ID
    pub client_id: String,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Granted scope
    pub scope: Option<String>,
}

/// Refresh token minted alongside an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    /// The refresh token
    pub token: String,
    /// Client ID
    pub client_id: String,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Granted scope
    pub scope: Option<String>,
}

/// Token endpoint request after field extraction
#[derive(Debug, Clone, Default)]
pub struct TokenRequest {
    /// Requested scope
    pub scope: Option<String>,
    /// Authorization code (authorization_code grant)
    pub code: Option<String>,
    /// Redirect URI (authorization_code grant)
    pub redirect_uri: Option<String>,
    /// Resource owner name (user_basic_credentials grant)
    pub username: Option<String>,
    /// Resource owner password (user_basic_credentials grant)
    pub password: Option<String>,
    /// Assertion format (assertion grant)
    pub assertion_type: Option<String>,
    /// Assertion value (assertion grant)
    pub assertion: Option<String>,
    /// Refresh token (refresh_token grant)
    pub refresh_token: Option<String>,
    /// Client credentials, whichever channel carried them
    pub client_credentials: Option<ClientCredentials>,
}

/// Client identifier and optional secret presented at the token endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: Option<String>,
}

/// Token endpoint success payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    /// Granted scope, `null` when unrestricted
    pub scope: Option<String>,
    /// Refresh token, only when the deployment supports the refresh grant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenResponse {
    /// Field pairs in wire order for fragment encoding.
    pub fn fragment_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("access_token", self.access_token.clone()),
            ("expires_in", self.expires_in.to_string()),
            ("scope", self.scope.clone().unwrap_or_default()),
        ];
        if let Some(ref refresh_token) = self.refresh_token {
            pairs.push(("refresh_token", refresh_token.clone()));
        }
        pairs
    }
}

/// Generate an opaque token from 32 bytes of operating-system randomness
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// Check a client identifier against `^[a-z0-9-_]{3,12}$`, case-insensitively
pub fn is_valid_client_id(client_id: &str) -> bool {
    (3..=12).contains(&client_id.len())
        && client_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parse scope string into a set
pub fn parse_scope(scope: &str) -> HashSet<String> {
    scope.split_whitespace().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_type_round_trip_names() {
        for grant_type in GrantType::ALL {
            assert_eq!(grant_type.as_str().parse::<GrantType>().unwrap(), grant_type);
        }
        assert!(matches!(
            "client_credentials".parse::<GrantType>(),
            Err(OAuthError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_client_type_parse() {
        assert_eq!("web_server".parse::<ClientType>().unwrap(), ClientType::WebServer);
        assert_eq!("user_agent".parse::<ClientType>().unwrap(), ClientType::UserAgent);
        assert!("USER_AGENT".parse::<ClientType>().is_err());
    }

    #[test]
    fn test_client_id_pattern() {
        for valid in ["abc", "abc12", "ABC-def_12", "a_b-c", "123456789012"] {
            assert!(is_valid_client_id(valid), "{valid} should be accepted");
        }
        for invalid in ["", "ab", "1234567890123", "abc def", "abc.def", "clïent", "abc/"] {
            assert!(!is_valid_client_id(invalid), "{invalid} should be rejected");
        }
    }

    #[test]
    fn test_generate_token_is_unique_and_url_safe() {
        let first = generate_token();
        let second = generate_token();
        assert_ne!(first, second);
        assert_eq!(first.len(), 43);
        assert!(
            first
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_token_response_serialization() {
        let response = TokenResponse {
            access_token: "abc".to_string(),
            expires_in: 3600,
            scope: None,
            refresh_token: None,
        };
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"access_token":"abc","expires_in":3600,"scope":null}"#
        );
    }

    #[test]
    fn test_fragment_pairs_order() {
        let response = TokenResponse {
            access_token: "abc".to_string(),
            expires_in: 3600,
            scope: Some("read".to_string()),
            refresh_token: Some("def".to_string()),
        };
        let keys: Vec<_> = response.fragment_pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["access_token", "expires_in", "scope", "refresh_token"]);
    }
}
