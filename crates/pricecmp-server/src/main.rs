mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, rate_limit_state_from_config, AppState, SearchLimits},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = pricecmp_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let catalog = pricecmp_core::load_catalog(&config.catalog_path)?;
    tracing::info!(
        chains = catalog.chains.len(),
        path = %config.catalog_path.display(),
        "catalog loaded"
    );

    let pool_config = pricecmp_db::PoolConfig::from_app_config(&config);
    let pool = pricecmp_db::connect_pool(&config.database_url, pool_config).await?;
    pricecmp_db::run_migrations(&pool).await?;

    let auth = AuthState::from_env(config.is_development())?;
    let state = AppState {
        prices: Arc::new(pricecmp_db::PgPriceRepository::new(pool.clone())),
        pool,
        city_aliases: Arc::new(catalog.city_aliases()),
        search_limits: SearchLimits::from_app_config(&config),
    };
    let app = build_app(state, auth, rate_limit_state_from_config(&config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "pricecmp-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
