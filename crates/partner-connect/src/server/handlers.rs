//! Request handlers for the OAuth flow and the authenticated API call.
//!
//! Every callback failure is converted into a 302 to the static error view
//! with a `type` query parameter naming the category (`missing_code`, `auth`,
//! `csrf`, `token_failed`) plus an optional `details` parameter; nothing
//! propagates past the request boundary.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use url::{Url, form_urlencoded};

use super::AppState;
use super::session::{self, SessionData};
use crate::config::{Config, defaults};
use crate::error::AuthFailure;

/// Cookie carrying the opaque session id.
const SESSION_COOKIE: &str = "partner_connect_sid";

/// Redirect target after a successful callback or logout.
const LANDING_VIEW: &str = "/";

/// Static error page; failure category and details travel in the query string.
const ERROR_VIEW: &str = "/error.html";

/// Query parameters of the provider's redirect back to `/callback`.
///
/// Everything is optional: the provider may send `code` + `state`, an `error`,
/// or (on a forged request) anything at all.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange for tokens.
    pub code: Option<String>,

    /// Provider-reported authorization error.
    pub error: Option<String>,

    /// Anti-forgery state value round-tripped through the provider.
    pub state: Option<String>,
}

/// Body of the `/api/auth-status` probe.
#[derive(Debug, Serialize)]
pub struct AuthStatus {
    /// Whether the current session holds an access token.
    #[serde(rename = "isAuthenticated")]
    pub is_authenticated: bool,
}

// ─── Landing & health ────────────────────────────────────────────────────────

/// `GET /`
///
/// Minimal landing page; the redirect target for callback success and logout.
pub async fn landing() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Partner Connect</title>
</head>
<body>
<h1>Partner Connect</h1>
<p><a href="/login">Sign in with the identity provider</a></p>
<p><a href="/api/auth-status">Check auth status</a> &middot;
<a href="/api/test-connection">Test API connection</a> &middot;
<a href="/logout">Log out</a></p>
</body>
</html>"#,
    )
}

/// `GET /health`
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ─── Authorization initiation ────────────────────────────────────────────────

/// `GET /login`
///
/// Generate a fresh anti-forgery state token, store it in the session
/// (creating the session if this browser has none), and redirect to the
/// provider's authorize endpoint.
pub async fn login(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (session_id, mut data, jar) = match existing_session(&state, &jar).await {
        Some((id, data)) => (id, data, jar),
        None => {
            let id = session::generate_token();
            let jar = jar.add(session_cookie(&id));
            (id, SessionData::default(), jar)
        }
    };

    let state_token = session::generate_token();
    data.oauth_state = Some(state_token.clone());
    state.sessions.save(&session_id, data).await;

    let authorize_url = match build_authorize_url(&state.config, &state_token) {
        Ok(url) => url,
        Err(err) => {
            tracing::error!(error = %err, "provider authorize URL is not parseable");
            return (StatusCode::INTERNAL_SERVER_ERROR, "provider URL misconfigured")
                .into_response();
        }
    };

    tracing::info!("redirecting browser to the provider authorize endpoint");
    (jar, redirect(&authorize_url)).into_response()
}

/// Build the provider authorize URL for one flow initiation.
fn build_authorize_url(config: &Config, state_token: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(&config.authorize_url())?;
    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", &config.redirect_uri())
        .append_pair("response_type", "code")
        .append_pair("scope", defaults::SCOPES)
        .append_pair("state", state_token);
    Ok(url.to_string())
}

// ─── Callback ────────────────────────────────────────────────────────────────

/// `GET /callback`
///
/// Terminal branches, in order: malformed query, provider error, state
/// mismatch, missing code, token exchange. The state comparison happens
/// before any outbound call; a mismatch never reaches the token endpoint.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(params)) = query else {
        tracing::warn!("callback query failed shape validation");
        return failure_redirect(&AuthFailure::MissingCode);
    };

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "provider reported an authorization error");
        return failure_redirect(&AuthFailure::provider(error));
    }

    let Some((session_id, mut data)) = existing_session(&state, &jar).await else {
        tracing::warn!("callback without a live session; rejecting as forged");
        return failure_redirect(&AuthFailure::CsrfMismatch);
    };

    // The stored state is single-use: consume it before the comparison so a
    // second callback can never replay it.
    let expected_state = data.oauth_state.take();
    state.sessions.save(&session_id, data.clone()).await;

    let state_matches = matches!(
        (expected_state.as_deref(), params.state.as_deref()),
        (Some(expected), Some(received)) if expected == received
    );
    if !state_matches {
        tracing::warn!("state parameter did not match the stored anti-forgery value");
        return failure_redirect(&AuthFailure::CsrfMismatch);
    }

    let Some(code) = params.code else {
        tracing::warn!("callback carried no authorization code");
        return failure_redirect(&AuthFailure::MissingCode);
    };

    match state.provider.exchange_code(&code).await {
        Ok(tokens) => {
            data.access_token = Some(tokens.access_token);
            data.refresh_token = Some(tokens.refresh_token);
            state.sessions.save(&session_id, data).await;
            tracing::info!("token exchange succeeded; session is authenticated");
            redirect(LANDING_VIEW)
        }
        Err(err) => {
            tracing::error!(error = %err, "token exchange failed");
            failure_redirect(&AuthFailure::from(err))
        }
    }
}

// ─── Session probe & authenticated API call ──────────────────────────────────

/// `GET /api/auth-status`
///
/// Reports whether the session holds an access token. No side effects.
pub async fn auth_status(State(state): State<Arc<AppState>>, jar: CookieJar) -> Json<AuthStatus> {
    let is_authenticated = existing_session(&state, &jar)
        .await
        .is_some_and(|(_, data)| data.access_token.is_some_and(|t| !t.is_empty()));
    Json(AuthStatus { is_authenticated })
}

/// `GET /api/test-connection`
///
/// Calls the downstream resource API with the session's Bearer token and
/// relays the JSON body. Without a token this is a 401 and no network call
/// is made.
pub async fn test_connection(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let access_token = existing_session(&state, &jar)
        .await
        .and_then(|(_, data)| data.access_token)
        .filter(|token| !token.is_empty());

    let Some(access_token) = access_token else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "not authenticated; start the flow at /login"
            })),
        )
            .into_response();
    };

    match state.provider.fetch_test_resource(&access_token).await {
        Ok(body) => Json(body).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "downstream API call failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

// ─── Logout ──────────────────────────────────────────────────────────────────

/// `GET /logout`
///
/// Destroys the session and clears the cookie. Destruction failure is logged
/// but never blocks the redirect; a second logout is a no-op.
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(err) = state.sessions.destroy(cookie.value()).await {
            tracing::warn!(error = %err, "failed to destroy session");
        }
    }

    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    (jar, redirect(LANDING_VIEW)).into_response()
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Load the session named by the request's cookie, if any.
async fn existing_session(state: &AppState, jar: &CookieJar) -> Option<(String, SessionData)> {
    let session_id = jar.get(SESSION_COOKIE)?.value().to_owned();
    let data = state.sessions.load(&session_id).await?;
    Some((session_id, data))
}

fn session_cookie(session_id: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id.to_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [("Location", location.to_owned())]).into_response()
}

/// Build the 302 to the error view with `type` and optional `details`.
fn failure_redirect(failure: &AuthFailure) -> Response {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("type", failure.category());
    if let Some(details) = failure.details() {
        query.append_pair("details", details);
    }
    redirect(&format!("{ERROR_VIEW}?{}", query.finish()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(response: &Response) -> String {
        response
            .headers()
            .get("location")
            .expect("redirect should carry a Location header")
            .to_str()
            .unwrap()
            .to_owned()
    }

    #[test]
    fn test_authorize_url_carries_all_parameters() {
        let config = Config::new(
            "https://id.example.com",
            "my-client",
            "secret",
            "https://app.example.com",
            "https://api.example.com",
        );
        let url = build_authorize_url(&config, "tok123").unwrap();

        assert!(url.starts_with("https://id.example.com/oauth/authorize?"));
        assert!(url.contains("client_id=my-client"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=profile+email"));
        assert!(url.contains("state=tok123"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Fcallback"));
    }

    #[test]
    fn test_authorize_url_rejects_garbage_base() {
        let config = Config::new("not a url", "cid", "secret", "http://app", "http://api");
        assert!(build_authorize_url(&config, "tok").is_err());
    }

    #[test]
    fn test_redirect_is_302() {
        let response = redirect("/somewhere");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/somewhere");
    }

    #[test]
    fn test_failure_redirect_without_details() {
        let response = failure_redirect(&AuthFailure::CsrfMismatch);
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/error.html?type=csrf");
    }

    #[test]
    fn test_failure_redirect_encodes_details() {
        let response = failure_redirect(&AuthFailure::provider("access denied & more"));
        assert_eq!(
            location(&response),
            "/error.html?type=auth&details=access+denied+%26+more"
        );
    }
}
