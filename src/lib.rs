pub mod api;
pub mod cli;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;
use state::SharedState;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    config.validate()?;

    init_tracing(&config)?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config, prometheus_handle).await,

        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists, leaving it untouched.");
            }
            Ok(())
        }

        Commands::Generate { count } => {
            with_state(config, |state| async move {
                cli::cmd_generate(&state, count).await
            })
            .await
        }

        Commands::List {
            status,
            search,
            sort,
            page,
            limit,
        } => {
            with_state(config, |state| async move {
                cli::cmd_list_codes(
                    &state,
                    status.as_deref(),
                    search.as_deref(),
                    &sort,
                    page,
                    limit,
                )
                .await
            })
            .await
        }

        Commands::Redeem { code } => {
            with_state(config, |state| async move { cli::cmd_redeem(&state, &code).await }).await
        }

        Commands::Stats => {
            with_state(config, |state| async move { cli::cmd_stats(&state).await }).await
        }
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "qrpromo")?
            .extra_field("env", "production")?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

/// Runs a one-shot command against a fully initialised state, then closes
/// the pool.
async fn with_state<F, Fut>(config: Config, command: F) -> anyhow::Result<()>
where
    F: FnOnce(Arc<SharedState>) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let state = Arc::new(SharedState::new(config).await?);
    let result = command(Arc::clone(&state)).await;

    if let Err(e) = state.store.clone().close().await {
        error!("Failed to close database: {e:#}");
    }

    result
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("qrpromo v{} starting...", env!("CARGO_PKG_VERSION"));

    let port = config.server.port;
    let app_state = api::create_app_state_from_config(config, prometheus_handle).await?;
    let store = app_state.store().clone();
    let pruning = app_state.sessions.spawn_pruning(std::time::Duration::from_secs(
        constants::session::PRUNE_INTERVAL_SECS,
    ));

    let app = api::router(app_state);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 Web Server running at http://0.0.0.0:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    pruning.abort();
    store.close().await?;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Error listening for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Error listening for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
