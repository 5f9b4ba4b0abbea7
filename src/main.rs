//! Job Board Cache - command-line client
//!
//! Fetches API paths through the cached client and prints the payloads
//! followed by cache statistics. Useful for checking cache behaviour against
//! a running backend.

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobboard_cache::{spawn_cleanup_task, ApiClient, CacheOptions, ClientConfig, CookieTtl};

#[derive(Parser, Debug)]
#[command(name = "jobboard-cache", about = "Fetch job board API paths through the response cache")]
struct Cli {
    /// API paths to fetch, relative to the base URL
    #[arg(required = true)]
    paths: Vec<String>,

    /// Overrides API_BASE_URL
    #[arg(long)]
    base_url: Option<String>,

    /// Bearer token stored before the first request
    #[arg(long)]
    token: Option<String>,

    /// How many times each path is fetched
    #[arg(long, default_value_t = 2)]
    repeat: usize,

    /// Also use the cookie tier
    #[arg(long)]
    cookies: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobboard_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(base_url) = cli.base_url.clone() {
        config = config.with_base_url(base_url);
    }
    info!(
        "Configuration loaded: base_url={}, timeout={:?}, cleanup_interval={:?}",
        config.base_url, config.request_timeout, config.cleanup_interval
    );

    let client = ApiClient::from_config(&config).context("failed to build API client")?;
    if let Some(token) = cli.token.as_deref() {
        client.set_auth_token(Some(token));
    }

    let cleanup_handle = spawn_cleanup_task(client.tiers().clone(), config.cleanup_interval);

    tokio::select! {
        result = run(&client, &cli) => result?,
        _ = signal::ctrl_c() => warn!("Received Ctrl+C, stopping"),
    }

    cleanup_handle.abort();

    let stats = client.cache_stats().await;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

async fn run(client: &ApiClient, cli: &Cli) -> anyhow::Result<()> {
    for path in &cli.paths {
        for attempt in 1..=cli.repeat {
            let mut options = CacheOptions::new();
            if cli.cookies {
                options = options.with_cookies(CookieTtl::Medium);
            }

            match client.get_cached::<serde_json::Value>(path, options).await {
                Ok(data) => {
                    info!("{} (attempt {}) ok", path, attempt);
                    println!("{}", serde_json::to_string_pretty(&data)?);
                }
                Err(e) if e.is_transient() => {
                    warn!("{} (attempt {}) failed, retry later: {}", path, attempt, e);
                }
                Err(e) => return Err(e).with_context(|| format!("GET {} failed", path)),
            }
        }
    }
    Ok(())
}
