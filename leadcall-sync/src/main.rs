//! leadcall-sync - Call-status reconciliation service
//!
//! Polls the voice-call provider for recent calls and writes the resolved
//! call status onto matching leads. Serves health, reconciler status, phone
//! validation and an SSE event stream for the dashboard.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use leadcall_common::config::{self, ConfigOverrides, DeliveryPolicy};
use leadcall_common::events::EventBus;
use leadcall_sync::clients::{HttpLeadStore, VapiCallSource};
use leadcall_sync::reconciler::{Poller, ReconcilerConfig};
use leadcall_sync::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::filter::Directive;

/// Event bus capacity per subscriber
const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DeliveryArg {
    AtMostOnce,
    RetryFailedUpdates,
}

impl From<DeliveryArg> for DeliveryPolicy {
    fn from(arg: DeliveryArg) -> Self {
        match arg {
            DeliveryArg::AtMostOnce => DeliveryPolicy::AtMostOnce,
            DeliveryArg::RetryFailedUpdates => DeliveryPolicy::RetryFailedUpdates,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "leadcall-sync", version, about = "Reconcile voice-call outcomes onto leads")]
struct Args {
    /// Config file (default: $LEADCALL_CONFIG, then ~/.config/leadcall/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long, env = "LEADCALL_PROVIDER_URL")]
    provider_url: Option<String>,

    #[arg(long, env = "LEADCALL_PROVIDER_API_KEY", hide_env_values = true)]
    provider_api_key: Option<String>,

    #[arg(long, env = "LEADCALL_LEAD_STORE_URL")]
    lead_store_url: Option<String>,

    #[arg(long, env = "LEADCALL_LEAD_STORE_TOKEN", hide_env_values = true)]
    lead_store_token: Option<String>,

    #[arg(long, env = "LEADCALL_TICK_INTERVAL_MS")]
    tick_interval_ms: Option<u64>,

    #[arg(long, env = "LEADCALL_RECENT_CALL_LIMIT")]
    recent_call_limit: Option<usize>,

    #[arg(long, env = "LEADCALL_DELIVERY", value_enum)]
    delivery: Option<DeliveryArg>,

    /// HTTP listen address
    #[arg(long, env = "LEADCALL_BIND")]
    bind: Option<String>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, env = "LEADCALL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Print the effective configuration (secrets masked) and exit
    #[arg(long)]
    print_config: bool,

    /// Save the effective configuration to PATH and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,

    /// Run a single reconcile tick, print its report and exit
    #[arg(long)]
    once: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            provider_url: self.provider_url.clone(),
            provider_api_key: self.provider_api_key.clone(),
            lead_store_url: self.lead_store_url.clone(),
            lead_store_token: self.lead_store_token.clone(),
            tick_interval_ms: self.tick_interval_ms,
            recent_call_limit: self.recent_call_limit,
            delivery: self.delivery.map(DeliveryPolicy::from),
            bind: self.bind.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = config::load_config(args.config.as_deref())?;
    settings.apply_overrides(args.overrides());

    if args.print_config {
        print!("{}", settings.to_redacted_toml()?);
        return Ok(());
    }

    if let Some(path) = &args.write_config {
        config::write_toml_config(&settings, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    let default_directive: Directive = settings
        .logging
        .level
        .parse()
        .unwrap_or_else(|_| tracing::Level::INFO.into());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_directive)
                .from_env_lossy(),
        )
        .init();

    // Build identification first, before any network delay
    info!(
        "Starting leadcall-sync v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match config::locate_config_file(args.config.as_deref()) {
        Some(path) => info!("Configuration: {}", path.display()),
        None => warn!("Configuration: no config file, using defaults and overrides"),
    }

    settings.validate()?;

    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);

    let poller = if settings.reconciler.enabled {
        let api_key = settings.provider.api_key.clone().unwrap_or_default();
        let calls = VapiCallSource::new(
            &settings.provider.base_url,
            api_key,
            Duration::from_millis(settings.provider.timeout_ms),
        )
        .context("Failed to create call provider client")?;
        let leads = HttpLeadStore::new(
            &settings.lead_store.base_url,
            settings.lead_store.api_token.clone(),
            Duration::from_millis(settings.lead_store.timeout_ms),
        )
        .context("Failed to create lead store client")?;

        info!(
            "Provider: {}  Lead store: {}",
            settings.provider.base_url, settings.lead_store.base_url
        );

        Some(Arc::new(Poller::new(
            ReconcilerConfig::from(&settings.reconciler),
            Arc::new(calls),
            Arc::new(leads),
            event_bus.clone(),
        )))
    } else {
        warn!("Reconciler disabled by configuration");
        None
    };

    if args.once {
        let poller = poller.context("--once requires the reconciler to be enabled")?;
        let report = poller.tick().await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if let Some(poller) = &poller {
        poller.start();
    }

    if settings.server.enabled {
        let state = AppState::new(poller.clone(), event_bus.clone());
        let app = build_router(state);

        let listener = tokio::net::TcpListener::bind(&settings.server.bind)
            .await
            .with_context(|| format!("Failed to bind {}", settings.server.bind))?;
        info!("leadcall-sync listening on http://{}", settings.server.bind);
        info!("Health check: http://{}/health", settings.server.bind);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        shutdown_signal().await;
    }

    if let Some(poller) = poller {
        poller.shutdown().await;
    }
    info!("leadcall-sync stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
