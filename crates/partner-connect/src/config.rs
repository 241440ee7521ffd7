//! Configuration for the partner application.

use std::time::Duration;

/// Default limits and endpoint paths.
pub mod defaults {
    use std::time::Duration;

    /// Provider authorize endpoint path.
    pub const AUTHORIZE_PATH: &str = "/oauth/authorize";

    /// Provider token endpoint path.
    pub const TOKEN_PATH: &str = "/oauth/token";

    /// Downstream resource endpoint path.
    pub const RESOURCE_PATH: &str = "/oauth-test";

    /// Callback path registered with the provider.
    pub const CALLBACK_PATH: &str = "/callback";

    /// Scopes requested during authorization.
    pub const SCOPES: &str = "profile email";

    /// Request timeout for outbound HTTP calls.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Session inactivity lifetime.
    pub const SESSION_TTL: Duration = Duration::from_secs(6 * 3600);
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity provider base URL (authorize and token endpoints live here).
    pub provider_base_url: String,

    /// OAuth client id registered with the provider.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: String,

    /// Public base URL of this application (used to build the redirect URI).
    pub app_base_url: String,

    /// Downstream resource API base URL.
    pub resource_api_url: String,

    /// Request timeout for outbound HTTP calls.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Session inactivity lifetime.
    pub session_ttl: Duration,
}

impl Config {
    /// Create a configuration from explicit values, trimming trailing slashes
    /// so endpoint paths can be appended uniformly.
    #[must_use]
    pub fn new(
        provider_base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        app_base_url: impl Into<String>,
        resource_api_url: impl Into<String>,
    ) -> Self {
        Self {
            provider_base_url: trim_base(provider_base_url.into()),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            app_base_url: trim_base(app_base_url.into()),
            resource_api_url: trim_base(resource_api_url.into()),
            request_timeout: defaults::REQUEST_TIMEOUT,
            connect_timeout: defaults::CONNECT_TIMEOUT,
            session_ttl: defaults::SESSION_TTL,
        }
    }

    /// Create a test configuration pointing provider and resource API at a
    /// mock server.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            provider_base_url: trim_base(base_url.to_owned()),
            client_id: "test-client-id".to_owned(),
            client_secret: "test-client-secret".to_owned(),
            app_base_url: "http://localhost:3000".to_owned(),
            resource_api_url: trim_base(base_url.to_owned()),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            session_ttl: Duration::from_secs(60),
        }
    }

    /// The provider's authorize endpoint.
    #[must_use]
    pub fn authorize_url(&self) -> String {
        format!("{}{}", self.provider_base_url, defaults::AUTHORIZE_PATH)
    }

    /// The provider's token endpoint.
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}{}", self.provider_base_url, defaults::TOKEN_PATH)
    }

    /// The downstream resource endpoint.
    #[must_use]
    pub fn resource_url(&self) -> String {
        format!("{}{}", self.resource_api_url, defaults::RESOURCE_PATH)
    }

    /// The redirect URI registered with the provider.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("{}{}", self.app_base_url, defaults::CALLBACK_PATH)
    }
}

fn trim_base(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let config = Config::new(
            "https://id.example.com",
            "cid",
            "secret",
            "https://app.example.com",
            "https://api.example.com",
        );
        assert_eq!(config.authorize_url(), "https://id.example.com/oauth/authorize");
        assert_eq!(config.token_url(), "https://id.example.com/oauth/token");
        assert_eq!(config.resource_url(), "https://api.example.com/oauth-test");
        assert_eq!(config.redirect_uri(), "https://app.example.com/callback");
    }

    #[test]
    fn test_trailing_slashes_trimmed() {
        let config = Config::new(
            "https://id.example.com/",
            "cid",
            "secret",
            "https://app.example.com//",
            "https://api.example.com/",
        );
        assert_eq!(config.token_url(), "https://id.example.com/oauth/token");
        assert_eq!(config.redirect_uri(), "https://app.example.com/callback");
    }

    #[test]
    fn test_for_testing_points_both_apis_at_mock() {
        let config = Config::for_testing("http://127.0.0.1:9999");
        assert_eq!(config.token_url(), "http://127.0.0.1:9999/oauth/token");
        assert_eq!(config.resource_url(), "http://127.0.0.1:9999/oauth-test");
    }
}
