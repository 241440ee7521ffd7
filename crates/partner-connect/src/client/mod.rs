//! HTTP client for the identity provider and the downstream resource API.
//!
//! One `reqwest` client backs both calls. Failures are never retried here:
//! every downstream problem is reported immediately to the caller, which
//! converts it into an error view or a structured JSON error.

use serde::Deserialize;

use crate::config::Config;
use crate::error::{ClientError, ClientResult};

/// The provider's token-exchange reply.
///
/// Deserialized against this explicit shape before anything touches the
/// session; a non-conforming body is its own error category rather than
/// untyped data propagating.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer credential for downstream API calls.
    pub access_token: String,

    /// Long-lived credential for obtaining new access tokens. Stored but
    /// never exchanged here (automatic refresh is out of scope).
    pub refresh_token: String,

    /// Token type reported by the provider, usually `bearer`.
    #[serde(default)]
    pub token_type: Option<String>,

    /// Access token lifetime in seconds. Parsed and ignored; no expiry
    /// policy is applied.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Client for the identity provider's token endpoint and the Bearer-authenticated
/// resource API.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    /// Shared HTTP client.
    http: reqwest::Client,

    /// Provider token endpoint.
    token_url: String,

    /// Downstream resource endpoint.
    resource_url: String,

    /// OAuth client id.
    client_id: String,

    /// OAuth client secret.
    client_secret: String,

    /// Redirect URI, echoed in the token exchange per RFC 6749 §4.1.3.
    redirect_uri: String,
}

impl ProviderClient {
    /// Create a new client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http,
            token_url: config.token_url(),
            resource_url: config.resource_url(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri(),
        })
    }

    /// Exchange an authorization code for tokens.
    ///
    /// Server-to-server POST with a form-encoded body. A non-success status
    /// surfaces the response body as diagnostic detail; a 2xx body that does
    /// not parse as a [`TokenResponse`] is a shape failure.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::TokenExchange`] on a non-2xx reply,
    /// [`ClientError::TokenShape`] on a malformed body, or
    /// [`ClientError::Http`] on transport failure.
    pub async fn exchange_code(&self, code: &str) -> ClientResult<TokenResponse> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable response body>".to_owned());
            return Err(ClientError::token_exchange(status.as_u16(), body));
        }

        let body = response.text().await?;
        serde_json::from_str::<TokenResponse>(&body)
            .map_err(|err| ClientError::TokenShape(err.to_string()))
    }

    /// Call the downstream resource API with a Bearer access token and return
    /// the JSON body as-is.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Downstream`] on a non-2xx reply or
    /// [`ClientError::Http`] on transport failure.
    pub async fn fetch_test_resource(&self, access_token: &str) -> ClientResult<serde_json::Value> {
        let response = self
            .http
            .get(&self.resource_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unknown error");
            return Err(ClientError::downstream(status.as_u16(), reason));
        }

        Ok(response.json::<serde_json::Value>().await?)
    }
}
