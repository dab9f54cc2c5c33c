//! Environment-based configuration types for draftauth server runtime settings.

use anyhow::Result;

use crate::errors::ConfigError;
use crate::oauth::types::GrantType;

/// HTTP server port configuration
#[derive(Clone)]
pub struct HttpPort(u16);

/// Access token lifetime configuration
#[derive(Clone)]
pub struct AccessTokenLifetime(chrono::Duration);

/// Authorization code lifetime configuration
#[derive(Clone)]
pub struct AuthCodeLifetime(chrono::Duration);

/// Refresh token lifetime configuration
#[derive(Clone)]
pub struct RefreshTokenLifetime(chrono::Duration);

/// Default realm advertised in `WWW-Authenticate` challenges
#[derive(Clone)]
pub struct AuthRealm(String);

/// Grant types enabled at the token endpoint
#[derive(Clone)]
pub struct SupportedGrantTypes(Vec<GrantType>);

/// Query/form key carrying a bearer token at protected resources
#[derive(Clone)]
pub struct TokenParamName(String);

/// Main application configuration
#[derive(Clone)]
pub struct Config {
    pub version: String,
    pub http_port: HttpPort,
    pub access_token_lifetime: AccessTokenLifetime,
    pub auth_code_lifetime: AuthCodeLifetime,
    pub refresh_token_lifetime: RefreshTokenLifetime,
    pub auth_realm: AuthRealm,
    pub supported_grant_types: SupportedGrantTypes,
    pub token_param_name: TokenParamName,
    pub seed_file: Option<String>,
}

/// Read-only settings consumed by the OAuth engine
#[derive(Clone, Debug)]
pub struct OAuthSettings {
    pub access_token_lifetime: chrono::Duration,
    pub auth_code_lifetime: chrono::Duration,
    pub refresh_token_lifetime: chrono::Duration,
    pub realm: String,
    pub supported_grant_types: Vec<GrantType>,
    pub token_param_name: String,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            access_token_lifetime: chrono::Duration::seconds(3600),
            auth_code_lifetime: chrono::Duration::seconds(30),
            refresh_token_lifetime: chrono::Duration::seconds(1_209_600),
            realm: "Service".to_string(),
            supported_grant_types: DEFAULT_GRANT_TYPES.to_vec(),
            token_param_name: "oauth_token".to_string(),
        }
    }
}

impl OAuthSettings {
    pub fn supports(&self, grant_type: GrantType) -> bool {
        self.supported_grant_types.contains(&grant_type)
    }
}

const DEFAULT_GRANT_TYPES: [GrantType; 4] = [
    GrantType::AuthorizationCode,
    GrantType::UserBasicCredentials,
    GrantType::Assertion,
    GrantType::None,
];

impl Config {
    /// Create a new configuration from environment variables
    pub fn new() -> Result<Self> {
        let http_port: HttpPort = default_env("HTTP_PORT", "8080").try_into()?;
        let access_token_lifetime: AccessTokenLifetime =
            default_env("ACCESS_TOKEN_LIFETIME", "3600s").try_into()?;
        let auth_code_lifetime: AuthCodeLifetime =
            default_env("AUTH_CODE_LIFETIME", "30s").try_into()?;
        let refresh_token_lifetime: RefreshTokenLifetime =
            default_env("REFRESH_TOKEN_LIFETIME", "14d").try_into()?;
        let auth_realm: AuthRealm = default_env("AUTH_REALM", "Service").try_into()?;
        let supported_grant_types: SupportedGrantTypes =
            optional_env("SUPPORTED_GRANT_TYPES").try_into()?;
        let token_param_name: TokenParamName =
            default_env("TOKEN_PARAM_NAME", "oauth_token").try_into()?;
        let seed_file = optional_env("SEED_FILE").filter(|value| !value.is_empty());

        Ok(Self {
            version: version()?,
            http_port,
            access_token_lifetime,
            auth_code_lifetime,
            refresh_token_lifetime,
            auth_realm,
            supported_grant_types,
            token_param_name,
            seed_file,
        })
    }

    /// Engine settings derived from this configuration
    pub fn oauth_settings(&self) -> OAuthSettings {
        OAuthSettings {
            access_token_lifetime: *self.access_token_lifetime.as_ref(),
            auth_code_lifetime: *self.auth_code_lifetime.as_ref(),
            refresh_token_lifetime: *self.refresh_token_lifetime.as_ref(),
            realm: self.auth_realm.as_ref().clone(),
            supported_grant_types: self.supported_grant_types.as_ref().clone(),
            token_param_name: self.token_param_name.as_ref().clone(),
        }
    }
}

/// Get application version from build environment
pub fn version() -> Result<String> {
    option_env!("GIT_HASH")
        .or(option_env!("CARGO_PKG_VERSION"))
        .map(|val| val.to_string())
        .ok_or(ConfigError::VersionNotSet.into())
}

pub(crate) fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn default_env(name: &str, default_value: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default_value.to_string())
}

fn parse_lifetime(value: String) -> Result<chrono::Duration> {
    let duration = duration_str::parse(&value)
        .map_err(|e| ConfigError::DurationParsingFailed(value, e.to_string()))?;
    Ok(chrono::Duration::from_std(duration)?)
}

impl TryFrom<String> for HttpPort {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Ok(Self(8080))
        } else {
            value
                .parse::<u16>()
                .map(Self)
                .map_err(|err| ConfigError::PortParsingFailed(err).into())
        }
    }
}

impl AsRef<u16> for HttpPort {
    fn as_ref(&self) -> &u16 {
        &self.0
    }
}

impl TryFrom<String> for AccessTokenLifetime {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_lifetime(value).map(Self)
    }
}

impl AsRef<chrono::Duration> for AccessTokenLifetime {
    fn as_ref(&self) -> &chrono::Duration {
        &self.0
    }
}

impl TryFrom<String> for AuthCodeLifetime {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_lifetime(value).map(Self)
    }
}

impl AsRef<chrono::Duration> for AuthCodeLifetime {
    fn as_ref(&self) -> &chrono::Duration {
        &self.0
    }
}

impl TryFrom<String> for RefreshTokenLifetime {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_lifetime(value).map(Self)
    }
}

impl AsRef<chrono::Duration> for RefreshTokenLifetime {
    fn as_ref(&self) -> &chrono::Duration {
        &self.0
    }
}

impl TryFrom<String> for AuthRealm {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        // Embedded in a single-quoted challenge parameter
        if value.trim().is_empty() || value.contains('\'') {
            return Err(ConfigError::InvalidRealm(value).into());
        }
        Ok(Self(value))
    }
}

impl AsRef<String> for AuthRealm {
    fn as_ref(&self) -> &String {
        &self.0
    }
}

impl TryFrom<Option<String>> for SupportedGrantTypes {
    type Error = anyhow::Error;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        let value = value.unwrap_or_default();
        if value.trim().is_empty() {
            return Ok(Self(DEFAULT_GRANT_TYPES.to_vec()));
        }

        let mut grant_types = Vec::new();
        for name in value.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
            let grant_type = name
                .parse::<GrantType>()
                .map_err(|_| ConfigError::UnknownGrantType(name.to_string()))?;
            if !grant_types.contains(&grant_type) {
                grant_types.push(grant_type);
            }
        }

        Ok(Self(grant_types))
    }
}

impl TryFrom<String> for SupportedGrantTypes {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(Some(value))
    }
}

impl AsRef<Vec<GrantType>> for SupportedGrantTypes {
    fn as_ref(&self) -> &Vec<GrantType> {
        &self.0
    }
}

impl TryFrom<String> for TokenParamName {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Ok(Self("oauth_token".to_string()));
        }
        Ok(Self(value))
    }
}

impl AsRef<String> for TokenParamName {
    fn as_ref(&self) -> &String {
        &self.0
    }
}
