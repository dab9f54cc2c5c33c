//! OAuth draft authorization engine: grant dispatch, authorization requests, and resource protection.

pub mod auth_server;
pub mod authenticator;
pub mod authorize;
pub mod grants;
pub mod request;
pub mod resource_server;
pub mod scope;
pub mod token_factory;
pub mod types;

// Re-export frequently used items from each module
pub use crate::storage::{
    inmemory::MemoryOAuthStorage,
    traits::{
        AccessTokenStore, AuthorizationCodeStore, OAuthClientStore, OAuthStorage, RefreshTokenStore,
    },
};
pub use auth_server::{AuthorizationServer, extract_client_credentials};
pub use authenticator::{ClientAuthenticator, StorageClientAuthenticator};
pub use authorize::{AuthorizationProcessor, Decision, append_params};
pub use grants::{GrantCheck, GrantVerifier};
pub use request::RequestContext;
pub use resource_server::{Denial, GuardOutcome, GuardPolicy, GuardRejection, ResourceGuard};
pub use scope::scope_satisfied;
pub use token_factory::TokenFactory;
pub use types::{
    AccessToken, AuthorizationCode, AuthorizationRequest, ClientCredentials, ClientType,
    GrantType, OAuthClient, RefreshToken, TokenRequest, TokenResponse, generate_token,
    is_valid_client_id, parse_scope,
};
