//! Handles POST /oauth/token - Exchanges grants for access tokens

use axum::{
    Json,
    body::Bytes,
    extract::{RawQuery, State},
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};

use super::{context::AppState, utils_request::request_context};
use crate::errors::OAuthError;

/// Handle token requests
/// POST /oauth/token - Dispatches the form-encoded grant and returns a token payload
pub async fn handle_oauth_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
    body: Bytes,
) -> Result<Response, OAuthError> {
    let context = request_context(&headers, raw_query, body);
    let token = state.auth_server.token(&context).await?;

    let mut response = Json(token).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}
