//! Minijinja template environment holding the authorization consent page.

use minijinja::Environment;

use crate::errors::HttpError;

/// Template name of the consent page
pub const CONSENT_TEMPLATE: &str = "consent.html";

/// Build the template environment with the bundled templates
pub fn build_env(realm: String) -> Result<Environment<'static>, HttpError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_global("realm", realm);
    env.add_template(
        CONSENT_TEMPLATE,
        include_str!("../templates/consent.html"),
    )
    .map_err(|e| HttpError::TemplateRenderingFailed(e.to_string()))?;
    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_consent_page_escapes_fields() {
        let env = build_env("Service".to_string()).unwrap();
        let html = env
            .get_template(CONSENT_TEMPLATE)
            .unwrap()
            .render(context! {
                client_id => "abc12",
                client_type => "web_server",
                redirect_uri => "https://example.com/cb?a=1&b=2",
                state => "\"><script>",
                scope => None::<String>,
            })
            .unwrap();

        assert!(html.contains("Authorize abc12"));
        assert!(html.contains("an authorization code"));
        assert!(html.contains("cb?a=1&amp;b=2"));
        assert!(!html.contains("\"><script>"));
        assert!(!html.contains("name=\"scope\""));
    }
}
