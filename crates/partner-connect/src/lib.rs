//! Partner Connect
//!
//! A partner web application demonstrating the OAuth 2.0 authorization-code
//! flow against an identity provider, followed by an authenticated call to a
//! downstream resource API.
//!
//! # Flow
//!
//! - `/login` generates a single-use anti-forgery state token and redirects
//!   the browser to the provider's authorize endpoint
//! - `/callback` validates the redirect, exchanges the authorization code for
//!   tokens server-to-server, and stores the tokens in the session
//! - `/api/test-connection` replays the stored access token as a Bearer
//!   credential against the downstream API
//!
//! # Example
//!
//! ```no_run
//! use partner_connect::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::for_testing("http://localhost:9000");
//!     server::serve(config, 3000).await
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod server;

pub use client::ProviderClient;
pub use config::Config;
pub use error::{AuthFailure, ClientError};
