//! Application state shared by every handler.

use axum_template::engine::Engine;
use minijinja::Environment;
use std::sync::Arc;

use crate::config::OAuthSettings;
use crate::oauth::{
    AuthorizationProcessor, AuthorizationServer, ClientAuthenticator, GrantVerifier,
    ResourceGuard, StorageClientAuthenticator,
};
use crate::storage::traits::OAuthStorage;

/// Template engine used for HTML responses.
pub type AppEngine = Engine<Environment<'static>>;

#[derive(Clone)]
pub struct AppState {
    /// Template engine for rendering HTML responses.
    pub template_env: AppEngine,
    /// Token endpoint grant dispatcher
    pub auth_server: Arc<AuthorizationServer>,
    /// Authorization endpoint request processor
    pub authorization: Arc<AuthorizationProcessor>,
    pub resource_guard: Arc<ResourceGuard>,
}

impl AppState {
    /// Wire the engine components over one storage backend and grant verifier
    pub fn new(
        oauth_storage: Arc<dyn OAuthStorage>,
        verifier: Arc<dyn GrantVerifier>,
        settings: OAuthSettings,
        template_env: AppEngine,
    ) -> Self {
        let settings = Arc::new(settings);
        let authenticator: Arc<dyn ClientAuthenticator> =
            Arc::new(StorageClientAuthenticator::new(oauth_storage.clone()));

        let auth_server = Arc::new(AuthorizationServer::new(
            oauth_storage.clone(),
            authenticator.clone(),
            verifier,
            settings.clone(),
        ));
        let authorization = Arc::new(AuthorizationProcessor::new(
            authenticator,
            auth_server.token_factory(),
        ));
        let resource_guard = Arc::new(ResourceGuard::new(oauth_storage, &settings));

        Self {
            template_env,
            auth_server,
            authorization,
            resource_guard,
        }
    }
}
