//! Transport-neutral request context passed into every engine entry point.

use std::collections::HashMap;

use crate::errors::OAuthError;

/// Headers, query parameters, and form fields of one inbound request.
///
/// Header names are stored lowercased. Query and form values keep every
/// occurrence so repeated parameters can be detected.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    headers: HashMap<String, String>,
    query: HashMap<String, Vec<String>>,
    form: HashMap<String, Vec<String>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(name.into()).or_default().push(value.into());
        self
    }

    pub fn with_form(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Build a context from already-decoded `name=value` pairs.
    pub fn from_pairs<Q, F>(headers: HashMap<String, String>, query: Q, form: F) -> Self
    where
        Q: IntoIterator<Item = (String, String)>,
        F: IntoIterator<Item = (String, String)>,
    {
        let mut context = Self {
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value))
                .collect(),
            ..Self::default()
        };
        for (name, value) in query {
            context = context.with_query(name, value);
        }
        for (name, value) in form {
            context = context.with_form(name, value);
        }
        context
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn query_values(&self, name: &str) -> &[String] {
        self.query.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn form_values(&self, name: &str) -> &[String] {
        self.form.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Single-valued query parameter; empty values count as absent.
    pub fn query_param(&self, name: &str) -> Result<Option<&str>, OAuthError> {
        single(name, self.query_values(name))
    }

    /// Single-valued form field; empty values count as absent.
    pub fn form_field(&self, name: &str) -> Result<Option<&str>, OAuthError> {
        single(name, self.form_values(name))
    }
}

fn single<'a>(name: &str, values: &'a [String]) -> Result<Option<&'a str>, OAuthError> {
    match values {
        [] => Ok(None),
        [value] if value.is_empty() => Ok(None),
        [value] => Ok(Some(value.as_str())),
        _ => Err(OAuthError::InvalidRequest(format!(
            "Parameter '{name}' supplied more than once"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_are_case_insensitive() {
        let context = RequestContext::new().with_header("Authorization", "Basic abc");
        assert_eq!(context.header("authorization"), Some("Basic abc"));
        assert_eq!(context.header("AUTHORIZATION"), Some("Basic abc"));
        assert_eq!(context.header("accept"), None);
    }

    #[test]
    fn test_repeated_parameter_rejected() {
        let context = RequestContext::new()
            .with_form("grant_type", "none")
            .with_form("grant_type", "assertion");
        assert!(matches!(
            context.form_field("grant_type"),
            Err(OAuthError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_empty_value_is_absent() {
        let context = RequestContext::new().with_query("state", "");
        assert_eq!(context.query_param("state").unwrap(), None);
        assert_eq!(context.query_values("state").len(), 1);
    }

    #[test]
    fn test_from_pairs() {
        let mut headers = HashMap::new();
        headers.insert("X-Test".to_string(), "1".to_string());
        let context = RequestContext::from_pairs(
            headers,
            vec![("a".to_string(), "1".to_string())],
            vec![("b".to_string(), "2".to_string())],
        );
        assert_eq!(context.header("x-test"), Some("1"));
        assert_eq!(context.query_param("a").unwrap(), Some("1"));
        assert_eq!(context.form_field("b").unwrap(), Some("2"));
        assert_eq!(context.form_field("a").unwrap(), None);
    }
}
