//! Conversion from axum request parts to the engine's request context.

use axum::body::Bytes;
use http::{HeaderMap, header};
use std::collections::HashMap;
use url::form_urlencoded;

use crate::oauth::RequestContext;

/// Build a request context from headers, the raw query string, and a form body.
///
/// The body is decoded only when it is declared as
/// `application/x-www-form-urlencoded`. Repeated headers are joined with `", "`.
pub fn build_request_context(
    headers: &HeaderMap,
    raw_query: Option<&str>,
    body: &[u8],
) -> RequestContext {
    let mut header_values: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            tracing::debug!(header = %name, "skipping non-ascii header value");
            continue;
        };
        header_values
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    let query: Vec<(String, String)> = raw_query
        .map(|query| form_urlencoded::parse(query.as_bytes()).into_owned().collect())
        .unwrap_or_else(Vec::new);

    let form: Vec<(String, String)> = if is_form_body(headers) {
        form_urlencoded::parse(body).into_owned().collect()
    } else {
        Vec::new()
    };

    RequestContext::from_pairs(header_values, query, form)
}

/// Convenience wrapper for handlers that extract the body as [`Bytes`]
pub fn request_context(headers: &HeaderMap, raw_query: Option<String>, body: Bytes) -> RequestContext {
    build_request_context(headers, raw_query.as_deref(), &body)
}

fn is_form_body(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_build_request_context() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded; charset=utf-8"),
        );
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));

        let context = build_request_context(
            &headers,
            Some("state=a%20b&oauth_token=1&oauth_token=2"),
            b"grant_type=none&scope=read+write",
        );

        assert_eq!(context.header("Authorization"), Some("Basic abc"));
        assert_eq!(context.query_param("state").unwrap(), Some("a b"));
        assert_eq!(context.query_values("oauth_token").len(), 2);
        assert_eq!(context.form_field("scope").unwrap(), Some("read write"));
    }

    #[test]
    fn test_non_form_body_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let context = build_request_context(&headers, None, b"grant_type=none");
        assert_eq!(context.form_field("grant_type").unwrap(), None);
    }
}
