//! Shared application state

use std::sync::Arc;

use tokio::sync::watch;

use super::broadcaster::BoardBroadcaster;
use super::gateway::Gateway;
use super::registry::ConnectionRegistry;
use crate::activity::ActivityLogger;
use crate::auth::SharedVerifier;
use crate::config::ServerConfig;
use crate::service::BoardService;
use crate::store::DocumentStore;

/// Everything a request handler needs, owned by the process entry point
pub struct AppState {
    registry: Arc<ConnectionRegistry>,
    broadcaster: Arc<BoardBroadcaster>,
    gateway: Gateway,
    service: BoardService,
    verifier: SharedVerifier,
    closing: watch::Sender<bool>,
}

impl AppState {
    /// Build a fresh registry and wire the gateway, broadcaster and service to it
    pub fn init(
        config: &ServerConfig,
        verifier: SharedVerifier,
        store: Arc<dyn DocumentStore>,
        activity: Arc<dyn ActivityLogger>,
    ) -> Arc<Self> {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Arc::new(BoardBroadcaster::new(registry.clone()));
        let gateway = Gateway::new(verifier.clone(), registry.clone(), config.outbound_buffer);
        let service = BoardService::new(store, activity, broadcaster.clone());
        let (closing, _) = watch::channel(false);

        tracing::info!(
            "Realtime state ready (outbound buffer {})",
            config.outbound_buffer
        );

        Arc::new(Self {
            registry,
            broadcaster,
            gateway,
            service,
            verifier,
            closing,
        })
    }

    /// Forget every subscription and tell every socket loop to close
    pub fn shutdown(&self) {
        let connections = self.registry.connection_count();
        self.registry.clear();
        self.closing.send_replace(true);
        tracing::info!("Realtime state shut down ({} connection(s) dropped)", connections);
    }

    /// Flips to `true` once `shutdown` has run
    pub fn closing(&self) -> watch::Receiver<bool> {
        self.closing.subscribe()
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn broadcaster(&self) -> &Arc<BoardBroadcaster> {
        &self.broadcaster
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn service(&self) -> &BoardService {
        &self.service
    }

    pub fn verifier(&self) -> &SharedVerifier {
        &self.verifier
    }
}
