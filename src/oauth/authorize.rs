//! Authorization endpoint request validation and redirect construction.

use std::sync::Arc;
use url::Url;
use url::form_urlencoded;

use crate::errors::OAuthError;
use crate::oauth::authenticator::ClientAuthenticator;
use crate::oauth::request::RequestContext;
use crate::oauth::token_factory::TokenFactory;
use crate::oauth::types::*;

/// Resource owner decision on an authorization request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Denied,
}

/// Validates authorization requests and finalizes them into redirects
pub struct AuthorizationProcessor {
    authenticator: Arc<dyn ClientAuthenticator>,
    token_factory: Arc<TokenFactory>,
}

impl AuthorizationProcessor {
    pub fn new(
        authenticator: Arc<dyn ClientAuthenticator>,
        token_factory: Arc<TokenFactory>,
    ) -> Self {
        Self {
            authenticator,
            token_factory,
        }
    }

    /// Validate an authorization request from its query parameters
    pub async fn parse_authorization_request(
        &self,
        context: &RequestContext,
    ) -> Result<AuthorizationRequest, OAuthError> {
        let result = self.parse(context).await;
        if let Err(ref err) = result {
            tracing::warn!(error = err.code(), description = %err, "authorization request rejected");
        }
        result
    }

    async fn parse(&self, context: &RequestContext) -> Result<AuthorizationRequest, OAuthError> {
        let client_id = context
            .query_param("client_id")?
            .ok_or_else(|| OAuthError::InvalidRequest("Missing client_id".to_string()))?;
        if !is_valid_client_id(client_id) {
            return Err(OAuthError::InvalidRequest(format!(
                "Malformed client_id '{}'",
                client_id
            )));
        }

        let client_type = context
            .query_param("type")?
            .ok_or_else(|| OAuthError::InvalidRequest("Missing type".to_string()))?
            .parse::<ClientType>()?;

        let supplied = context.query_param("redirect_uri")?;
        if let Some(supplied) = supplied {
            Url::parse(supplied)
                .map_err(|e| OAuthError::InvalidRequest(format!("Invalid redirect_uri: {}", e)))?;
        }

        let stored = self.authenticator.lookup_redirect_uri(client_id).await?;
        let redirect_uri = match (stored, supplied) {
            (None, None) => {
                return Err(OAuthError::InvalidRequest(
                    "No redirect_uri supplied or registered".to_string(),
                ));
            }
            (Some(stored), Some(supplied)) => {
                if !supplied
                    .to_lowercase()
                    .starts_with(&stored.to_lowercase())
                {
                    return Err(OAuthError::RedirectUriMismatch(format!(
                        "'{}' is not under the registered redirect URI",
                        supplied
                    )));
                }
                supplied.to_string()
            }
            (Some(stored), None) => stored,
            (None, Some(supplied)) => supplied.to_string(),
        };

        let request = AuthorizationRequest {
            client_id: client_id.to_string(),
            client_type,
            redirect_uri,
            state: context.query_param("state")?.map(str::to_string),
            scope: context.query_param("scope")?.map(str::to_string),
        };
        tracing::debug!(
            client_id = %request.client_id,
            client_type = request.client_type.as_str(),
            "authorization request validated"
        );
        Ok(request)
    }

    /// Turn a resource owner decision into the redirect target
    pub async fn finish_authorization(
        &self,
        decision: Decision,
        request: &AuthorizationRequest,
    ) -> Result<String, OAuthError> {
        let (separator, mut params) = match (decision, request.client_type) {
            (Decision::Denied, _) => {
                tracing::warn!(
                    error = "user_denied",
                    client_id = %request.client_id,
                    "authorization denied by resource owner"
                );
                ('?', vec![("error", "user_denied".to_string())])
            }
            (Decision::Approved, ClientType::UserAgent) => {
                let token = self
                    .token_factory
                    .issue_access_token(&request.client_id, request.scope.clone())
                    .await?;
                ('#', token.fragment_pairs())
            }
            (Decision::Approved, ClientType::WebServer) => {
                let code = self
                    .token_factory
                    .issue_authorization_code(
                        &request.client_id,
                        &request.redirect_uri,
                        request.scope.clone(),
                    )
                    .await?;
                ('?', vec![("code", code)])
            }
        };

        if let Some(ref state) = request.state {
            params.push(("state", state.clone()));
        }

        Ok(append_params(&request.redirect_uri, separator, &params))
    }
}

/// Append encoded parameters to a URI's query (`?`) or fragment (`#`) component
/// without clobbering parameters already present there.
pub fn append_params(uri: &str, separator: char, params: &[(&str, String)]) -> String {
    let encoded = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(name, value)| (*name, value.as_str())))
        .finish();

    if separator == '#' {
        return join(uri, '#', &encoded);
    }

    match uri.split_once('#') {
        Some((base, fragment)) => format!("{}#{}", join(base, '?', &encoded), fragment),
        None => join(uri, '?', &encoded),
    }
}

fn join(base: &str, separator: char, encoded: &str) -> String {
    match base.find(separator) {
        None => format!("{}{}{}", base, separator, encoded),
        Some(index) if index + 1 == base.len() || base.ends_with('&') => {
            format!("{}{}", base, encoded)
        }
        Some(_) => format!("{}&{}", base, encoded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OAuthSettings;
    use crate::oauth::authenticator::StorageClientAuthenticator;
    use crate::storage::inmemory::MemoryOAuthStorage;
    use crate::storage::traits::{AccessTokenStore, AuthorizationCodeStore, OAuthClientStore};

    async fn processor() -> (AuthorizationProcessor, Arc<MemoryOAuthStorage>) {
        let storage = Arc::new(MemoryOAuthStorage::new());
        storage
            .store_client(&OAuthClient {
                client_id: "abc12".to_string(),
                client_secret: Some("s3cret".to_string()),
                redirect_uri: "https://Example.com/cb".to_string(),
                grant_types: vec![GrantType::AuthorizationCode],
            })
            .await
            .unwrap();

        let factory = Arc::new(TokenFactory::new(
            storage.clone(),
            Arc::new(OAuthSettings::default()),
        ));
        let processor = AuthorizationProcessor::new(
            Arc::new(StorageClientAuthenticator::new(storage.clone())),
            factory,
        );
        (processor, storage)
    }

    fn query(client_id: &str, client_type: &str) -> RequestContext {
        RequestContext::new()
            .with_query("client_id", client_id)
            .with_query("type", client_type)
    }

    #[tokio::test]
    async fn test_parse_uses_registered_redirect() {
        let (processor, _) = processor().await;

        let request = processor
            .parse_authorization_request(&query("abc12", "web_server").with_query("state", "xyz"))
            .await
            .unwrap();
        assert_eq!(request.redirect_uri, "https://Example.com/cb");
        assert_eq!(request.client_type, ClientType::WebServer);
        assert_eq!(request.state.as_deref(), Some("xyz"));
        assert_eq!(request.scope, None);
    }

    #[tokio::test]
    async fn test_parse_redirect_prefix_match() {
        let (processor, _) = processor().await;

        let request = processor
            .parse_authorization_request(
                &query("abc12", "user_agent").with_query("redirect_uri", "https://example.COM/cb/deep"),
            )
            .await
            .unwrap();
        assert_eq!(request.redirect_uri, "https://example.COM/cb/deep");

        let err = processor
            .parse_authorization_request(
                &query("abc12", "user_agent").with_query("redirect_uri", "https://evil.com/cb"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "redirect_uri_mismatch");
    }

    #[tokio::test]
    async fn test_parse_rejections() {
        let (processor, _) = processor().await;

        for context in [
            query("ab", "web_server"),
            query("abc.12", "web_server"),
            query("abc12", "code"),
            RequestContext::new().with_query("client_id", "abc12"),
            RequestContext::new().with_query("type", "web_server"),
            // No stored redirect and none supplied
            query("unknown", "web_server"),
            query("abc12", "web_server").with_query("redirect_uri", "relative/path"),
        ] {
            let err = processor.parse_authorization_request(&context).await.unwrap_err();
            assert_eq!(err.code(), "invalid_request");
        }

        let request = processor
            .parse_authorization_request(
                &query("unknown", "web_server").with_query("redirect_uri", "https://app.test/cb"),
            )
            .await
            .unwrap();
        assert_eq!(request.redirect_uri, "https://app.test/cb");
    }

    fn request(client_type: ClientType, redirect_uri: &str, state: Option<&str>) -> AuthorizationRequest {
        AuthorizationRequest {
            client_id: "abc12".to_string(),
            client_type,
            redirect_uri: redirect_uri.to_string(),
            state: state.map(str::to_string),
            scope: None,
        }
    }

    #[tokio::test]
    async fn test_finish_denied() {
        let (processor, _) = processor().await;

        let location = processor
            .finish_authorization(
                Decision::Denied,
                &request(ClientType::UserAgent, "https://example.com/cb", Some("xyz")),
            )
            .await
            .unwrap();
        assert_eq!(location, "https://example.com/cb?error=user_denied&state=xyz");
    }

    #[tokio::test]
    async fn test_finish_user_agent() {
        let (processor, storage) = processor().await;

        let location = processor
            .finish_authorization(
                Decision::Approved,
                &request(ClientType::UserAgent, "https://example.com/cb", None),
            )
            .await
            .unwrap();

        let (base, fragment) = location.split_once('#').unwrap();
        assert_eq!(base, "https://example.com/cb");
        assert!(fragment.starts_with("access_token="));
        assert!(fragment.ends_with("&expires_in=3600&scope="));

        let token = fragment
            .trim_start_matches("access_token=")
            .split('&')
            .next()
            .unwrap();
        assert!(storage.get_token(token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_finish_web_server() {
        let (processor, storage) = processor().await;

        let location = processor
            .finish_authorization(
                Decision::Approved,
                &request(ClientType::WebServer, "https://example.com/cb?lang=en", Some("s1")),
            )
            .await
            .unwrap();

        let url = Url::parse(&location).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("lang".to_string(), "en".to_string()));
        assert_eq!(pairs[1].0, "code");
        assert_eq!(pairs[2], ("state".to_string(), "s1".to_string()));

        let code = storage.consume_code(&pairs[1].1).await.unwrap().unwrap();
        assert_eq!(code.redirect_uri, "https://example.com/cb?lang=en");
        assert_eq!(code.client_id, "abc12");
    }

    #[test]
    fn test_append_params() {
        let params = [("code", "c1".to_string())];
        assert_eq!(append_params("https://a.test/cb", '?', &params), "https://a.test/cb?code=c1");
        assert_eq!(append_params("https://a.test/cb?", '?', &params), "https://a.test/cb?code=c1");
        assert_eq!(
            append_params("https://a.test/cb?x=1", '?', &params),
            "https://a.test/cb?x=1&code=c1"
        );
        assert_eq!(
            append_params("https://a.test/cb?x=1&", '?', &params),
            "https://a.test/cb?x=1&code=c1"
        );
        assert_eq!(
            append_params("https://a.test/cb#frag", '?', &params),
            "https://a.test/cb?code=c1#frag"
        );
        assert_eq!(
            append_params("https://a.test/cb#x=1", '#', &params),
            "https://a.test/cb#x=1&code=c1"
        );
        assert_eq!(
            append_params("https://a.test/cb", '#', &[("scope", "read write".to_string())]),
            "https://a.test/cb#scope=read+write"
        );
    }
}
