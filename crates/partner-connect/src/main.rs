//! Partner Connect - Entry Point
//!
//! Loads configuration from the environment (or flags), initializes tracing,
//! and runs the HTTP server.

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use partner_connect::{config::Config, server};

#[derive(Parser, Debug)]
#[command(name = "partner-connect")]
#[command(about = "Partner web app demonstrating the OAuth 2.0 authorization-code flow")]
#[command(version)]
struct Cli {
    /// Identity provider base URL (hosts /oauth/authorize and /oauth/token)
    #[arg(long, env = "PROVIDER_BASE_URL")]
    provider_base_url: String,

    /// OAuth client id registered with the provider
    #[arg(long, env = "OAUTH_CLIENT_ID")]
    client_id: String,

    /// OAuth client secret
    #[arg(long, env = "OAUTH_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// Public base URL of this application (used for the redirect URI)
    #[arg(long, default_value = "http://localhost:3000", env = "APP_BASE_URL")]
    app_base_url: String,

    /// Downstream resource API base URL
    #[arg(long, env = "RESOURCE_API_URL")]
    resource_api_url: String,

    /// HTTP server port
    #[arg(long, default_value = "3000", env = "PORT")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        provider = %cli.provider_base_url,
        port = cli.port,
        "Starting partner-connect"
    );

    let config = Config::new(
        cli.provider_base_url,
        cli.client_id,
        cli.client_secret,
        cli.app_base_url,
        cli.resource_api_url,
    );

    server::serve(config, cli.port).await
}
