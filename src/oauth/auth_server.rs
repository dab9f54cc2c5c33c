//! Grant dispatcher for the token endpoint.
//!
//! A token request moves through `Received -> ClientAuthenticated -> GrantValidated`
//! before a token is minted. Every transition either produces the next state or
//! rejects the request with exactly one [`OAuthError`].

use base64::prelude::*;
use chrono::Utc;
use std::sync::Arc;
use url::Url;

use crate::config::OAuthSettings;
use crate::errors::OAuthError;
use crate::oauth::authenticator::ClientAuthenticator;
use crate::oauth::grants::{GrantCheck, GrantVerifier};
use crate::oauth::request::RequestContext;
use crate::oauth::scope::scope_satisfied;
use crate::oauth::token_factory::TokenFactory;
use crate::oauth::types::*;
use crate::storage::traits::OAuthStorage;

/// Token request with a recognized and enabled grant type
struct Received {
    grant_type: GrantType,
    request: TokenRequest,
}

/// Token request whose client has been authenticated and authorized
struct ClientAuthenticated {
    grant_type: GrantType,
    client_id: String,
    request: TokenRequest,
}

/// Token request whose grant has been accepted
struct GrantValidated {
    client_id: String,
    scope: Option<String>,
}

/// OAuth draft authorization server token endpoint
pub struct AuthorizationServer {
    storage: Arc<dyn OAuthStorage>,
    authenticator: Arc<dyn ClientAuthenticator>,
    verifier: Arc<dyn GrantVerifier>,
    token_factory: Arc<TokenFactory>,
    settings: Arc<OAuthSettings>,
}

impl AuthorizationServer {
    pub fn new(
        storage: Arc<dyn OAuthStorage>,
        authenticator: Arc<dyn ClientAuthenticator>,
        verifier: Arc<dyn GrantVerifier>,
        settings: Arc<OAuthSettings>,
    ) -> Self {
        let token_factory = Arc::new(TokenFactory::new(storage.clone(), settings.clone()));
        Self {
            storage,
            authenticator,
            verifier,
            token_factory,
            settings,
        }
    }

    pub fn token_factory(&self) -> Arc<TokenFactory> {
        self.token_factory.clone()
    }

    /// Handle a token request
    pub async fn token(&self, context: &RequestContext) -> Result<TokenResponse, OAuthError> {
        let result = self.dispatch(context).await;
        if let Err(ref err) = result {
            tracing::warn!(error = err.code(), description = %err, "token request rejected");
        }
        result
    }

    async fn dispatch(&self, context: &RequestContext) -> Result<TokenResponse, OAuthError> {
        let received = self.receive(context)?;
        tracing::debug!(grant_type = %received.grant_type, "token request received");

        let authenticated = self.authenticate_client(received).await?;
        tracing::debug!(
            client_id = %authenticated.client_id,
            grant_type = %authenticated.grant_type,
            "client authenticated"
        );

        let requested_scope = authenticated.request.scope.clone();
        let validated = self.validate_grant(authenticated).await?;
        tracing::debug!(client_id = %validated.client_id, "grant validated");

        let scope = match requested_scope {
            Some(requested) => {
                if !scope_satisfied(&requested, validated.scope.as_deref()) {
                    return Err(OAuthError::AccessOutOfScope(format!(
                        "Requested scope '{}' exceeds granted scope",
                        requested
                    )));
                }
                Some(requested)
            }
            None => validated.scope,
        };

        self.token_factory
            .issue_access_token(&validated.client_id, scope)
            .await
    }

    fn receive(&self, context: &RequestContext) -> Result<Received, OAuthError> {
        let grant_type = context
            .form_field("grant_type")?
            .ok_or_else(|| OAuthError::InvalidRequest("Missing grant_type".to_string()))?
            .parse::<GrantType>()?;

        if !self.settings.supports(grant_type) {
            return Err(OAuthError::UnsupportedGrantType(grant_type.to_string()));
        }

        let request = TokenRequest::from_context(context)?;
        Ok(Received {
            grant_type,
            request,
        })
    }

    async fn authenticate_client(
        &self,
        received: Received,
    ) -> Result<ClientAuthenticated, OAuthError> {
        let Received {
            grant_type,
            mut request,
        } = received;

        let credentials = request.client_credentials.take().ok_or_else(|| {
            OAuthError::InvalidClientCredentials("Missing client credentials".to_string())
        })?;

        let authenticated = self
            .authenticator
            .authenticate(&credentials.client_id, credentials.client_secret.as_deref())
            .await?;
        if !authenticated {
            return Err(OAuthError::InvalidClientCredentials(format!(
                "Client '{}' failed authentication",
                credentials.client_id
            )));
        }

        let authorized = self
            .authenticator
            .is_authorized(&credentials.client_id, grant_type)
            .await?;
        if !authorized {
            return Err(OAuthError::UnauthorizedClient(format!(
                "Client '{}' may not use the {} grant",
                credentials.client_id, grant_type
            )));
        }

        Ok(ClientAuthenticated {
            grant_type,
            client_id: credentials.client_id,
            request,
        })
    }

    async fn validate_grant(
        &self,
        authenticated: ClientAuthenticated,
    ) -> Result<GrantValidated, OAuthError> {
        let ClientAuthenticated {
            grant_type,
            client_id,
            request,
        } = authenticated;

        let scope = match grant_type {
            GrantType::AuthorizationCode => {
                self.handle_authorization_code_grant(&client_id, &request)
                    .await?
            }
            GrantType::UserBasicCredentials => {
                let username = required(&request.username, "username")?;
                let password = required(&request.password, "password")?;
                match self
                    .verifier
                    .check_user_credentials(&client_id, username, password)
                    .await?
                {
                    GrantCheck::Granted(scope) => scope,
                    GrantCheck::Denied => {
                        return Err(OAuthError::InvalidUserCredentials(
                            "Resource owner credentials rejected".to_string(),
                        ));
                    }
                }
            }
            GrantType::Assertion => {
                let assertion_type = required(&request.assertion_type, "assertion_type")?;
                let assertion = required(&request.assertion, "assertion")?;
                match self
                    .verifier
                    .check_assertion(&client_id, assertion_type, assertion)
                    .await?
                {
                    GrantCheck::Granted(scope) => scope,
                    GrantCheck::Denied => {
                        return Err(OAuthError::InvalidAssertion(format!(
                            "Assertion of type '{}' rejected",
                            assertion_type
                        )));
                    }
                }
            }
            GrantType::RefreshToken => {
                self.handle_refresh_token_grant(&client_id, &request)
                    .await?
            }
            GrantType::None => match self.verifier.check_implicit_trust(&client_id).await? {
                GrantCheck::Granted(scope) => scope,
                GrantCheck::Denied => {
                    return Err(OAuthError::InvalidRequest(format!(
                        "Client '{}' is not trusted for the none grant",
                        client_id
                    )));
                }
            },
        };

        Ok(GrantValidated { client_id, scope })
    }

    /// Handle authorization code grant
    async fn handle_authorization_code_grant(
        &self,
        client_id: &str,
        request: &TokenRequest,
    ) -> Result<Option<String>, OAuthError> {
        let code = required(&request.code, "code")?;
        let redirect_uri = required(&request.redirect_uri, "redirect_uri")?;
        Url::parse(redirect_uri)
            .map_err(|e| OAuthError::InvalidRequest(format!("Invalid redirect_uri: {}", e)))?;

        let auth_code = self.storage.consume_code(code).await?.ok_or_else(|| {
            OAuthError::BadAuthorizationCode("Unknown or already used code".to_string())
        })?;

        if auth_code.redirect_uri != redirect_uri {
            return Err(OAuthError::BadAuthorizationCode(
                "Redirect URI mismatch".to_string(),
            ));
        }
        if auth_code.client_id != client_id {
            return Err(OAuthError::BadAuthorizationCode(
                "Code was issued to another client".to_string(),
            ));
        }
        if Utc::now() > auth_code.expires_at {
            return Err(OAuthError::AuthorizationExpired(
                "Authorization code expired".to_string(),
            ));
        }

        Ok(auth_code.scope)
    }

    /// Handle refresh token grant
    async fn handle_refresh_token_grant(
        &self,
        client_id: &str,
        request: &TokenRequest,
    ) -> Result<Option<String>, OAuthError> {
        let refresh_token = required(&request.refresh_token, "refresh_token")?;

        let stored = self
            .storage
            .get_refresh_token(refresh_token)
            .await?
            .filter(|stored| stored.client_id == client_id)
            .ok_or_else(|| OAuthError::BadAuthorizationCode("Invalid refresh token".to_string()))?;

        if Utc::now() > stored.expires_at {
            return Err(OAuthError::AuthorizationExpired(
                "Refresh token expired".to_string(),
            ));
        }

        Ok(stored.scope)
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, OAuthError> {
    value
        .as_deref()
        .ok_or_else(|| OAuthError::InvalidRequest(format!("Missing {}", name)))
}

impl TokenRequest {
    /// Extract token request fields and client credentials from a request context
    pub fn from_context(context: &RequestContext) -> Result<Self, OAuthError> {
        let field = |name: &str| -> Result<Option<String>, OAuthError> {
            Ok(context.form_field(name)?.map(str::to_string))
        };

        Ok(TokenRequest {
            scope: field("scope")?,
            code: field("code")?,
            redirect_uri: field("redirect_uri")?,
            username: field("username")?,
            password: field("password")?,
            assertion_type: field("assertion_type")?,
            assertion: field("assertion")?,
            refresh_token: field("refresh_token")?,
            client_credentials: extract_client_credentials(context)?,
        })
    }
}

/// Extract client credentials from HTTP Basic authorization or form fields
pub fn extract_client_credentials(
    context: &RequestContext,
) -> Result<Option<ClientCredentials>, OAuthError> {
    let form_client_id = context.form_field("client_id")?;
    let form_client_secret = context.form_field("client_secret")?;
    let form_present = form_client_id.is_some() || form_client_secret.is_some();

    let header_credentials = match context.header("authorization") {
        Some(value) => match split_scheme(value) {
            Some((scheme, encoded)) if scheme.eq_ignore_ascii_case("basic") => {
                Some(decode_basic(encoded)?)
            }
            _ if form_present => {
                return Err(OAuthError::MultipleAuthorizationMethods(
                    "Authorization header combined with form credentials".to_string(),
                ));
            }
            _ => None,
        },
        None => None,
    };

    match (header_credentials, form_present) {
        (Some(_), true) => Err(OAuthError::MultipleCredentials(
            "Client credentials supplied in both header and form".to_string(),
        )),
        (Some(credentials), false) => Ok(Some(credentials)),
        (None, true) => {
            let client_id = form_client_id.ok_or_else(|| {
                OAuthError::InvalidClientCredentials("Missing client_id".to_string())
            })?;
            Ok(Some(ClientCredentials {
                client_id: client_id.to_string(),
                client_secret: form_client_secret.map(str::to_string),
            }))
        }
        (None, false) => Ok(None),
    }
}

fn split_scheme(value: &str) -> Option<(&str, &str)> {
    value
        .trim()
        .split_once(' ')
        .map(|(scheme, rest)| (scheme, rest.trim()))
}

fn decode_basic(encoded: &str) -> Result<ClientCredentials, OAuthError> {
    let malformed =
        || OAuthError::InvalidClientCredentials("Malformed Basic authorization".to_string());

    let decoded = BASE64_STANDARD.decode(encoded).map_err(|_| malformed())?;
    let decoded = String::from_utf8(decoded).map_err(|_| malformed())?;
    let (client_id, client_secret) = decoded.split_once(':').ok_or_else(malformed)?;
    if client_id.is_empty() {
        return Err(malformed());
    }

    Ok(ClientCredentials {
        client_id: client_id.to_string(),
        client_secret: Some(client_secret)
            .filter(|secret| !secret.is_empty())
            .map(str::to_string),
    })
}
