use clap::Parser;
use pkg_api::AppState;
use pkg_constants::network::{DEFAULT_API_PORT, DEFAULT_VAULT_URL};
use pkg_constants::paths::{DEFAULT_CONFIG, DEFAULT_DATA_DIR};
use pkg_constants::refresh::{
    DEFAULT_INITIAL_DELAY_SECS, DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_REFRESH_MARGIN_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use pkg_controllers::handler::EventHandler;
use pkg_controllers::keyvalue::KeyValueRefresh;
use pkg_controllers::notification::StoreEventNotification;
use pkg_controllers::pki::PkiRefresh;
use pkg_controllers::refresh::TypeRefreshFactory;
use pkg_controllers::scheduled::{RefreshSettings, ScheduledRefresh};
use pkg_state::client::StateStore;
use pkg_state::registry::{Cluster, Registry};
use pkg_types::config::{OperatorConfigFile, load_config_file};
use pkg_vault::{VaultClient, VaultClientConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "vault-crd", about = "Keeps cluster secrets in sync with a Vault backend")]
struct Cli {
    /// Path to YAML config file
    #[arg(long, short, default_value = DEFAULT_CONFIG)]
    config: String,

    /// Port for the management API
    #[arg(long)]
    port: Option<u16>,

    /// Directory for SlateDB state storage
    #[arg(long)]
    data_dir: Option<String>,

    /// Bearer token required by the management API
    #[arg(long)]
    token: Option<String>,

    /// Base URL of the backend, including the API version segment
    #[arg(long)]
    vault_url: Option<String>,

    /// Token sent to the backend
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    vault_token: Option<String>,

    /// Seconds between reconciliation passes
    #[arg(long)]
    interval: Option<u64>,

    /// Seconds before the first reconciliation pass
    #[arg(long)]
    initial_delay: Option<u64>,

    /// Seconds a single backend request may take
    #[arg(long)]
    request_timeout: Option<u64>,

    /// Seconds a certificate is renewed ahead of its expiry
    #[arg(long)]
    refresh_margin: Option<u64>,
}

/// First few characters of a secret, safe to log.
fn token_hint(token: &str) -> String {
    token.chars().take(4).collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    // Load config file (returns defaults if file not found)
    let file_cfg: OperatorConfigFile = load_config_file(&cli.config)?;
    info!("Config file: {}", cli.config);

    // Merge: CLI args > config file > defaults
    let port = cli.port.or(file_cfg.port).unwrap_or(DEFAULT_API_PORT);
    let data_dir = cli
        .data_dir
        .or(file_cfg.data_dir)
        .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
    let token = match cli.token.or(file_cfg.token) {
        Some(token) => token,
        None => {
            let generated = uuid::Uuid::new_v4().to_string();
            warn!("No API token configured, generated one for this run");
            generated
        }
    };
    let vault_url = cli
        .vault_url
        .or(file_cfg.vault_url)
        .unwrap_or_else(|| DEFAULT_VAULT_URL.to_string());
    let vault_token = cli.vault_token.or(file_cfg.vault_token);
    let interval = cli
        .interval
        .or(file_cfg.interval)
        .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS);
    let initial_delay = cli
        .initial_delay
        .or(file_cfg.initial_delay)
        .unwrap_or(DEFAULT_INITIAL_DELAY_SECS);
    let request_timeout = cli
        .request_timeout
        .or(file_cfg.request_timeout)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    let refresh_margin = cli
        .refresh_margin
        .or(file_cfg.refresh_margin)
        .unwrap_or(DEFAULT_REFRESH_MARGIN_SECS);

    if interval == 0 {
        anyhow::bail!("interval must be at least one second");
    }

    info!("Starting vault-crd");
    info!("  Port:           {}", port);
    info!("  Data dir:       {}", data_dir);
    info!("  Token:          {}***", token_hint(&token));
    info!("  Vault URL:      {}", vault_url);
    info!("  Interval:       {}s", interval);
    info!("  Initial delay:  {}s", initial_delay);
    info!("  Refresh margin: {}s", refresh_margin);

    let store = StateStore::new(&data_dir).await?;
    let registry = Registry::new(store.clone());
    let cluster: Arc<dyn Cluster> = Arc::new(registry.clone());

    let vault = VaultClient::new(VaultClientConfig {
        base_url: vault_url,
        token: vault_token,
        request_timeout: Duration::from_secs(request_timeout),
    })?;
    if let Err(e) = vault.lookup_self().await {
        warn!("Backend token check failed, continuing anyway: {}", e);
    }

    let margin = chrono::Duration::seconds(i64::try_from(refresh_margin)?);
    let factory = Arc::new(
        TypeRefreshFactory::new()
            .register(Arc::new(
                PkiRefresh::new(cluster.clone(), vault.clone()).with_refresh_margin(margin),
            ))
            .register(Arc::new(KeyValueRefresh::new(cluster.clone(), vault))),
    );
    let handler = Arc::new(EventHandler::new(cluster.clone(), factory.clone()));
    let notifier = Arc::new(StoreEventNotification::new(registry.clone()));

    let settings = RefreshSettings {
        interval: Duration::from_secs(interval),
        initial_delay: Duration::from_secs(initial_delay),
        binding_timeout: Duration::from_secs(request_timeout * 3),
    };
    let refresh = ScheduledRefresh::new(
        cluster,
        factory,
        handler.clone(),
        notifier.clone(),
        settings,
    )
    .start();

    let state = AppState {
        registry,
        handler,
        notifier,
        api_token: token,
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let served = pkg_api::server::serve(addr, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    })
    .await;

    refresh.stop().await;
    store.close().await?;
    info!("vault-crd stopped");
    served
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hint_respects_char_boundaries() {
        assert_eq!(token_hint("abcdefgh"), "abcd");
        assert_eq!(token_hint("ab"), "ab");
        assert_eq!(token_hint("abcé-token"), "abcé");
        assert_eq!(token_hint("ééééé"), "éééé");
    }
}
