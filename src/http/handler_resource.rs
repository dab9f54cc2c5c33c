//! Handles /api/resource and /api/public - Sample endpoints behind the resource guard

use axum::{
    Json,
    body::Bytes,
    extract::{RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::{context::AppState, utils_request::request_context};
use crate::oauth::{GuardOutcome, GuardPolicy};

/// GET|POST /api/resource - Requires a valid, unexpired access token
pub async fn handle_protected_resource(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
    body: Bytes,
) -> Response {
    let context = request_context(&headers, raw_query, body);

    match state
        .resource_guard
        .verify(&context, None, &GuardPolicy::default())
        .await
    {
        Ok(GuardOutcome::Verified(access_token)) => Json(json!({
            "client_id": access_token.client_id,
            "scope": access_token.scope,
            "expires_at": access_token.expires_at,
        }))
        .into_response(),
        Ok(GuardOutcome::Denied(denial)) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": denial.code() })),
        )
            .into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

/// GET /api/public - Serves anonymous data when no usable token is presented
pub async fn handle_public_resource(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
) -> Response {
    let context = request_context(&headers, raw_query, Bytes::new());

    match state
        .resource_guard
        .verify(&context, None, &GuardPolicy::soft())
        .await
    {
        Ok(GuardOutcome::Verified(access_token)) => Json(json!({
            "access": "authenticated",
            "client_id": access_token.client_id,
        }))
        .into_response(),
        Ok(GuardOutcome::Denied(denial)) => Json(json!({
            "access": "anonymous",
            "reason": denial.code(),
        }))
        .into_response(),
        Err(rejection) => rejection.into_response(),
    }
}
