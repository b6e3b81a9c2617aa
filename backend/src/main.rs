//! Interpreter Web GUI
//!
//! Serves the browser control panel, the live chat channel and the settings
//! and history API for a code-executing assistant.

use clap::Parser;
use interpreter_web_gui::{
    cli::Cli,
    router::build_router,
    state::{persistence::SettingsFile, AppState, Settings, SettingsStore},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let config = cli.config();
    info!("Configuration loaded: {:?}", config);

    // Initial settings: file (if any), then CLI flags on top
    let mut settings = match &config.storage.settings_file {
        Some(path) => match SettingsFile::load_from_file(path).await {
            Ok(Some(settings)) => {
                info!(path = %path.display(), "Loaded settings file");
                settings
            }
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable settings file");
                Settings::default()
            }
        },
        None => Settings::default(),
    };
    cli.apply_overrides(&mut settings);
    if let Err(e) = settings.validate() {
        warn!(error = %e, "Initial settings invalid, using defaults");
        settings = Settings::default();
    }

    let store = SettingsStore::new(settings, config.storage.settings_file.clone());
    let app_state = AppState::from_config(&config, store);
    info!(
        history_dir = %config.storage.history_dir.display(),
        bridge = %config.bridge.command,
        "Application state ready"
    );

    let app = build_router(app_state);

    // Bind to address from config
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(addr.as_str())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;

    info!("Server running on http://{}", listener.local_addr()?);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Setup graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals (Ctrl+C, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
