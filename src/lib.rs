//! draftauth library crate.
//!
//! Provides an OAuth2 draft-protocol authorization server engine: token issuance for
//! the authorization_code, user_basic_credentials, assertion, refresh_token and none
//! grants, authorization endpoint processing, and bearer token resource protection.

pub mod config;
pub mod errors;
pub mod http;
pub mod oauth;
pub mod storage;
pub mod templates;
