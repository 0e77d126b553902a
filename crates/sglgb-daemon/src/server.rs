//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::evidence::open_gateway;
use sglgb_engine::{InMemoryStore, LifecycleEngine, LifecycleEvent};
use sglgb_types::IndicatorCatalogue;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// SGLGB Daemon Server
pub struct Server {
    config: DaemonConfig,
    catalogue: IndicatorCatalogue,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let catalogue = match &config.catalogue_path {
            Some(path) => load_catalogue(path)?,
            None => IndicatorCatalogue::builtin(),
        };

        Ok(Self { config, catalogue })
    }

    /// Run the server
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;

        let gateway = open_gateway(&self.config.evidence.backend).await?;
        let engine = Arc::new(LifecycleEngine::new(
            Arc::new(InMemoryStore::new()),
            gateway,
            self.catalogue,
            self.config.policy.clone(),
        ));

        // Log lifecycle events in the background
        tokio::spawn(log_events(engine.subscribe()));

        let state = AppState::new(engine.clone(), self.config.evidence.uploads.clone());
        let app = create_router(state, &self.config.server);

        let listener = TcpListener::bind(addr).await?;

        tracing::info!("SGLGB daemon listening on {}", addr);
        tracing::info!(
            areas = engine.catalogue().areas().len(),
            indicators = engine.catalogue().indicator_count(),
            essential_areas_required = engine.policy().essential_areas_required,
            max_rework_cycles = ?engine.policy().max_rework_cycles,
            "Lifecycle engine ready"
        );

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("SGLGB daemon shutting down");
        Ok(())
    }
}

/// Read and validate a catalogue JSON file (an array of governance areas)
pub fn load_catalogue(path: &Path) -> DaemonResult<IndicatorCatalogue> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| DaemonError::Catalogue(format!("{}: {}", path.display(), e)))?;
    let catalogue: IndicatorCatalogue = serde_json::from_str(&raw)
        .map_err(|e| DaemonError::Catalogue(format!("{}: {}", path.display(), e)))?;
    tracing::info!(
        path = %path.display(),
        indicators = catalogue.indicator_count(),
        "Loaded indicator catalogue"
    );
    Ok(catalogue)
}

async fn log_events(mut events: broadcast::Receiver<LifecycleEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => tracing::info!(target: "sglgb::events", event = %json, "Lifecycle event"),
                Err(e) => tracing::warn!(error = %e, "Failed to encode lifecycle event"),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Lifecycle event log lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_catalogue_when_unset() {
        let server = Server::new(DaemonConfig::development()).unwrap();
        assert_eq!(server.catalogue.indicator_count(), 7);
    }

    #[test]
    fn test_catalogue_loaded_from_file() {
        let areas = serde_json::to_string(IndicatorCatalogue::builtin().areas()).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(areas.as_bytes()).unwrap();

        let config = DaemonConfig {
            catalogue_path: Some(file.path().to_path_buf()),
            ..DaemonConfig::default()
        };
        let server = Server::new(config).unwrap();
        assert_eq!(server.catalogue, IndicatorCatalogue::builtin());
    }

    #[test]
    fn test_invalid_catalogue_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[]").unwrap();
        let config = DaemonConfig {
            catalogue_path: Some(file.path().to_path_buf()),
            ..DaemonConfig::default()
        };
        assert!(matches!(Server::new(config), Err(DaemonError::Catalogue(_))));
    }
}
