//! `reelgate` server entry point.

use std::sync::Arc;

use anyhow::{Context, Result};
use gate_chain_sui::{SuiChainClient, SuiConfig, SuiTransactionExecutor};
use gate_core::{
    ChainReader, InMemorySessionStore, MarketplaceConfig, SharedObjectRef, SystemClock,
};
use gate_server::{
    AppState, Collaborators, ServerConfig, logging, marketplace_from_env, router,
    session_from_env, spawn_session_sweep,
};
use gate_storage_walrus::{BlobResolver, PoolConfig};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let server_config = ServerConfig::from_env().context("Invalid server configuration")?;
    let _log_guard = logging::init_logging(server_config.log_dir.as_deref())?;

    let marketplace = marketplace_from_env().context("Invalid marketplace configuration")?;
    let session = session_from_env(&marketplace).context("Invalid session configuration")?;
    let sui_config = SuiConfig::from_env().context("Invalid Sui configuration")?;
    let pool_config = PoolConfig::from_env().context("Invalid Walrus pool configuration")?;

    let chain = SuiChainClient::connect(&sui_config)
        .await
        .context("Failed to connect to Sui")?;
    let executor = SuiTransactionExecutor::from_config(chain.sui_client().clone(), &sui_config)
        .context("Failed to load sponsor wallet")?;
    let blobs = BlobResolver::from_config(&pool_config).context("Invalid Walrus endpoint pool")?;
    tracing::info!(
        publishers = blobs.pool().publishers().len(),
        aggregators = blobs.pool().aggregators().len(),
        "Walrus endpoint pool loaded"
    );

    check_shared_objects(&chain, &marketplace).await;

    let state = AppState::new(
        Collaborators {
            chain: Arc::new(chain),
            executor: Arc::new(executor),
            blobs: Arc::new(blobs),
            store: Arc::new(InMemorySessionStore::new()),
            clock: Arc::new(SystemClock),
        },
        marketplace,
        session,
    )?;

    let sweep = spawn_session_sweep(Arc::clone(&state.sessions), server_config.sweep_interval);

    let addr = server_config.addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweep.abort();
    tracing::info!("Server stopped");
    Ok(())
}

/// Warn when configured initial shared versions disagree with the chain;
/// purchases against a wrong version fail on submission.
async fn check_shared_objects(chain: &SuiChainClient, marketplace: &MarketplaceConfig) {
    let objects: [(&str, &SharedObjectRef); 2] = [
        ("kiosk", &marketplace.kiosk),
        ("transfer policy", &marketplace.transfer_policy),
    ];

    for (name, object) in objects {
        match chain.shared_version(&object.id).await {
            Ok(Some(version)) if version == object.initial_shared_version => {}
            Ok(Some(version)) => tracing::warn!(
                object = name,
                id = %object.id,
                configured = object.initial_shared_version,
                on_chain = version,
                "Initial shared version mismatch"
            ),
            Ok(None) => tracing::warn!(object = name, id = %object.id, "Object is not shared"),
            Err(e) => tracing::warn!(object = name, error = %e, "Could not check shared version"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
