//! Error types for the partner application.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.

/// Errors from outbound HTTP calls to the provider and the downstream API.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Token endpoint answered with a non-success status
    #[error("token exchange failed (HTTP {status}): {body}")]
    TokenExchange {
        /// HTTP status code returned by the token endpoint
        status: u16,
        /// Raw response body, relayed as diagnostic detail
        body: String,
    },

    /// Token endpoint answered 2xx but the body did not match the expected shape
    #[error("token response did not match the expected shape: {0}")]
    TokenShape(String),

    /// Downstream resource API answered with a non-success status
    #[error("downstream API error: HTTP {status} {reason}")]
    Downstream {
        /// HTTP status code returned by the downstream API
        status: u16,
        /// Canonical reason phrase for the status
        reason: String,
    },
}

impl ClientError {
    /// Create a token exchange error from a non-success response.
    #[must_use]
    pub fn token_exchange(status: u16, body: impl Into<String>) -> Self {
        Self::TokenExchange { status, body: body.into() }
    }

    /// Create a downstream API error.
    #[must_use]
    pub fn downstream(status: u16, reason: impl Into<String>) -> Self {
        Self::Downstream { status, reason: reason.into() }
    }
}

/// Failure categories for the OAuth callback.
///
/// Each maps to a `type` tag on the error-view redirect, optionally carrying
/// diagnostic detail. The browser sees only the category and detail; full
/// context goes to the server log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    /// Callback query was malformed or lacked an authorization code
    MissingCode,
    /// Provider reported an authorization error via the `error` parameter
    Provider {
        /// Provider-supplied error text
        detail: String,
    },
    /// State parameter did not match the value stored for this session
    CsrfMismatch,
    /// Code-for-token exchange failed (transport, HTTP status, or shape)
    TokenFailed {
        /// Diagnostic text for the error view
        detail: String,
    },
}

impl AuthFailure {
    /// Create a provider-reported authorization failure.
    #[must_use]
    pub fn provider(detail: impl Into<String>) -> Self {
        Self::Provider { detail: detail.into() }
    }

    /// Create a token-exchange failure.
    #[must_use]
    pub fn token_failed(detail: impl Into<String>) -> Self {
        Self::TokenFailed { detail: detail.into() }
    }

    /// Category tag carried in the error-view `type` query parameter.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::MissingCode => "missing_code",
            Self::Provider { .. } => "auth",
            Self::CsrfMismatch => "csrf",
            Self::TokenFailed { .. } => "token_failed",
        }
    }

    /// Diagnostic detail for the error view, if any.
    #[must_use]
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Provider { detail } | Self::TokenFailed { detail } => Some(detail),
            Self::MissingCode | Self::CsrfMismatch => None,
        }
    }
}

impl From<ClientError> for AuthFailure {
    fn from(err: ClientError) -> Self {
        Self::token_failed(err.to_string())
    }
}

/// Result type alias for outbound HTTP operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::token_exchange(400, "invalid_grant");
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("invalid_grant"));

        let err = ClientError::downstream(503, "Service Unavailable");
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("Service Unavailable"));
    }

    #[test]
    fn test_failure_categories() {
        assert_eq!(AuthFailure::MissingCode.category(), "missing_code");
        assert_eq!(AuthFailure::provider("access_denied").category(), "auth");
        assert_eq!(AuthFailure::CsrfMismatch.category(), "csrf");
        assert_eq!(AuthFailure::token_failed("boom").category(), "token_failed");
    }

    #[test]
    fn test_failure_details() {
        assert_eq!(AuthFailure::MissingCode.details(), None);
        assert_eq!(AuthFailure::CsrfMismatch.details(), None);
        assert_eq!(AuthFailure::provider("access_denied").details(), Some("access_denied"));
    }

    #[test]
    fn test_client_error_maps_to_token_failed() {
        let failure = AuthFailure::from(ClientError::token_exchange(500, "oops"));
        assert_eq!(failure.category(), "token_failed");
        assert!(failure.details().unwrap().contains("500"));
    }
}
