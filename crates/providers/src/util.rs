//! Shared utility functions for HTTP-backed adapters.

use cp_domain::config::AuthConfig;
use cp_domain::error::{Error, Result};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Resolve an API key from an [`AuthConfig`].
///
/// Precedence:
/// 1. `key` field (plaintext, warns)
/// 2. `env` field (reads environment variable)
pub fn resolve_api_key(auth: &AuthConfig) -> Result<String> {
    if let Some(ref key) = auth.key {
        tracing::warn!(
            "API key loaded from plaintext config field 'key'; prefer 'env' instead"
        );
        return Ok(key.clone());
    }

    if let Some(ref env_var) = auth.env {
        return std::env::var(env_var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "environment variable '{env_var}' not set or not valid UTF-8"
                ))
            });
    }

    Err(Error::Config(
        "no API key configured: set 'key' or 'env' in the auth section".into(),
    ))
}

/// Read a non-success response into a provider error.
pub async fn error_for_status(provider: &str, resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Provider {
        provider: provider.to_string(),
        message: format!("HTTP {} - {}", status.as_u16(), body),
    })
}

/// Redact the `key=` query parameter from a URL for safe logging.
pub fn redact_url_key(url: &str) -> String {
    if let Some(idx) = url.find("key=") {
        let prefix = &url[..idx + 4];
        let rest = &url[idx + 4..];
        let end = rest.find('&').unwrap_or(rest.len());
        format!("{prefix}[REDACTED]{}", &rest[end..])
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_api_key_plaintext() {
        let auth = AuthConfig {
            key: Some("sk-test-123".into()),
            env: None,
        };
        assert_eq!(resolve_api_key(&auth).unwrap(), "sk-test-123");
    }

    #[test]
    fn resolve_api_key_env_var() {
        let var_name = "CP_TEST_RESOLVE_ENV_KEY_1234";
        std::env::set_var(var_name, "env-secret-value");
        let auth = AuthConfig::from_env(var_name);
        assert_eq!(resolve_api_key(&auth).unwrap(), "env-secret-value");
        std::env::remove_var(var_name);
    }

    #[test]
    fn resolve_api_key_env_var_missing() {
        let auth = AuthConfig::from_env("CP_TEST_NONEXISTENT_VAR_8888");
        let err = resolve_api_key(&auth).unwrap_err();
        assert!(err.to_string().contains("CP_TEST_NONEXISTENT_VAR_8888"));
    }

    #[test]
    fn resolve_api_key_no_config() {
        let auth = AuthConfig { env: None, key: None };
        let err = resolve_api_key(&auth).unwrap_err();
        assert!(err.to_string().contains("no API key configured"));
    }

    #[test]
    fn redacts_key_param() {
        assert_eq!(
            redact_url_key("https://x/v1beta/models/m:generateContent?key=secret&alt=sse"),
            "https://x/v1beta/models/m:generateContent?key=[REDACTED]&alt=sse"
        );
        assert_eq!(redact_url_key("https://x/y"), "https://x/y");
    }
}
