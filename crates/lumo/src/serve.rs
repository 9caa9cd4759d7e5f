// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lumo serve` command implementation.

use std::sync::Arc;

use lumo_config::LumoConfig;
use lumo_core::{LumoError, ProviderAdapter, StorageAdapter};
use lumo_evaluation::EvaluationService;
use lumo_gateway::GatewayState;
use lumo_gemini::GeminiProvider;
use lumo_interview::SessionService;
use lumo_storage::SqliteStorage;
use tracing::info;

/// Opens storage, wires the services and serves the API until a shutdown signal.
pub async fn run_serve(config: LumoConfig) -> Result<(), LumoError> {
    info!("starting lumo serve");

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

    let provider: Arc<dyn ProviderAdapter> = Arc::new(GeminiProvider::new(&config.gemini)?);

    let evaluation = Arc::new(EvaluationService::from_config(
        storage.clone(),
        provider.clone(),
        &config,
    ));
    let sessions = Arc::new(SessionService::new(
        storage.clone(),
        provider,
        evaluation,
        &config,
    ));

    let state = GatewayState::new(sessions, &config.server);
    let served = lumo_gateway::serve(&config.server, state, shutdown_signal()).await;

    storage.close().await?;
    info!("lumo serve shutdown complete");
    served
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
        _ = terminate => info!("received SIGTERM, initiating shutdown"),
    }
}
