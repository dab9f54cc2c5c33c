//! Handles GET and POST /oauth/authorize - Consent page and resource owner decision

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_template::RenderHtml;
use minijinja::context;

use super::{context::AppState, utils_request::request_context};
use crate::errors::OAuthError;
use crate::oauth::{Decision, RequestContext};
use crate::templates::CONSENT_TEMPLATE;

/// Fields carried from the consent page back to the decision endpoint
const AUTHORIZATION_FIELDS: [&str; 5] = ["client_id", "type", "redirect_uri", "state", "scope"];

/// GET /oauth/authorize - Validates the request and renders the consent page
pub async fn handle_oauth_authorize(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
) -> Result<impl IntoResponse, OAuthError> {
    let context = request_context(&headers, raw_query, Bytes::new());
    let request = state
        .authorization
        .parse_authorization_request(&context)
        .await?;

    Ok(RenderHtml(
        CONSENT_TEMPLATE,
        state.template_env.clone(),
        context! {
            client_id => request.client_id,
            client_type => request.client_type.as_str(),
            redirect_uri => request.redirect_uri,
            state => request.state,
            scope => request.scope,
        },
    ))
}

/// POST /oauth/authorize - Re-validates the submitted request and redirects with the outcome
pub async fn handle_oauth_authorize_decision(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, OAuthError> {
    let submitted = request_context(&headers, None, body);

    // The hidden fields are client-controlled, so they pass through validation again
    let mut context = RequestContext::new();
    for name in AUTHORIZATION_FIELDS {
        for value in submitted.form_values(name) {
            context = context.with_query(name, value.as_str());
        }
    }
    let request = state
        .authorization
        .parse_authorization_request(&context)
        .await?;

    let decision = match submitted.form_field("approve")? {
        Some("yes") => Decision::Approved,
        _ => Decision::Denied,
    };

    let location = state
        .authorization
        .finish_authorization(decision, &request)
        .await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}
