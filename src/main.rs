use anyhow::Context;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boarding_api::app::{build_router, AppState};
use boarding_api::config::{config, Environment};
use boarding_api::database::{DatabaseManager, PgStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = config().clone();
    init_tracing(config.logging.json);
    tracing::info!(
        "Starting Boarding API v{} in {} mode",
        env!("CARGO_PKG_VERSION"),
        config.environment.as_str()
    );

    if config.environment != Environment::Development && config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set outside development");
    }

    let store = match config.database.url.as_deref() {
        Some(url) => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .with_context(|| format!("failed to connect to {}", DatabaseManager::redacted_url(url)))?;
            if config.database.run_migrations {
                DatabaseManager::migrate(&pool).await?;
            }
            Store::Postgres(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store (data is lost on exit)");
            Store::memory()
        }
    };

    let sweep_every = config.billing.overdue_sweep_interval_secs;
    if sweep_every > 0 {
        tokio::spawn(overdue_sweep(store.clone(), Duration::from_secs(sweep_every)));
    }

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let app = build_router(AppState::new(store, config));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Boarding API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "boarding_api=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Flip PENDING payments past their due date to OVERDUE, across tenants.
async fn overdue_sweep(store: Store, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let today = chrono::Utc::now().date_naive();
        match store.mark_overdue(None, today).await {
            Ok(0) => tracing::debug!("Overdue sweep: nothing to update"),
            Ok(n) => tracing::info!("Overdue sweep marked {} payments overdue", n),
            Err(e) => tracing::error!("Overdue sweep failed: {}", e),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
