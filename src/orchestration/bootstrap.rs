//! # Dialer Bootstrap
//!
//! Builds the dialer from configuration and runs it: dispatch worker,
//! staleness sweeper and HTTP server, with one shutdown signal for all three.

use super::{
    BatchTrigger, CallbackEndpoints, DispatchEngine, DispatchWorker, StalenessSweeper,
    StatusCallbackHandler,
};
use crate::config::{DialerConfig, QueueKind};
use crate::error::{DialerError, Result};
use crate::provider::{build_client, CallPlacementClient, VoicePrompt};
use crate::queue::{DispatchQueue, InMemoryDispatchQueue, PgDispatchQueue};
use crate::store::{DialerStore, PgDialerStore};
use crate::web::{self, state::AppState};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

/// Fully wired dialer.
pub struct DialerSystem {
    pub config: DialerConfig,
    pub store: Arc<dyn DialerStore>,
    pub queue: Arc<dyn DispatchQueue>,
    pub client: Arc<dyn CallPlacementClient>,
    pub engine: Arc<DispatchEngine>,
    pub callbacks: Arc<StatusCallbackHandler>,
    pub trigger: Arc<BatchTrigger>,
    pub voice_prompt: Arc<VoicePrompt>,
}

impl DialerSystem {
    /// Wire the components around an existing store, queue and client.
    pub fn from_parts(
        config: DialerConfig,
        store: Arc<dyn DialerStore>,
        queue: Arc<dyn DispatchQueue>,
        client: Arc<dyn CallPlacementClient>,
    ) -> Self {
        let endpoints = CallbackEndpoints::new(
            config.callbacks.clone(),
            config.dispatch.event_subscription,
        );
        let engine = Arc::new(DispatchEngine::new(
            Arc::clone(&store),
            Arc::clone(&client),
            Arc::clone(&queue),
            endpoints,
        ));
        let callbacks = Arc::new(StatusCallbackHandler::new(
            Arc::clone(&store),
            Arc::clone(&queue),
        ));
        let trigger = Arc::new(BatchTrigger::new(
            Arc::clone(&store),
            Arc::clone(&queue),
            config.dispatch.default_country_code.clone(),
        ));
        let voice_prompt = Arc::new(VoicePrompt::from(&config.voice_prompt));

        Self {
            config,
            store,
            queue,
            client,
            engine,
            callbacks,
            trigger,
            voice_prompt,
        }
    }

    /// Connect to Postgres, run migrations if enabled and build the
    /// configured queue and placement client.
    pub async fn bootstrap(config: DialerConfig) -> Result<Self> {
        info!(
            environment = %config.environment,
            provider = ?config.provider.kind,
            queue = ?config.dispatch.queue,
            "🚀 BOOTSTRAP: Starting autodialer"
        );

        let pg_store = PgDialerStore::connect(
            &config.database.url,
            config.database.max_connections,
        )
        .await?;
        if config.database.run_migrations {
            pg_store.run_migrations().await?;
        }

        let queue: Arc<dyn DispatchQueue> = match config.dispatch.queue {
            QueueKind::Postgres => Arc::new(PgDispatchQueue::new(pg_store.pool().clone())),
            QueueKind::Memory => Arc::new(InMemoryDispatchQueue::new()),
        };
        let client = build_client(&config.provider)?;

        Ok(Self::from_parts(config, Arc::new(pg_store), queue, client))
    }

    pub fn worker(&self) -> DispatchWorker {
        DispatchWorker::new(
            Arc::clone(&self.engine),
            Arc::clone(&self.queue),
            self.config.dispatch.poll_interval(),
        )
    }

    pub fn sweeper(&self) -> StalenessSweeper {
        StalenessSweeper::new(
            Arc::clone(&self.store),
            Arc::clone(&self.queue),
            self.config.sweep.clone(),
        )
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            trigger: Arc::clone(&self.trigger),
            callbacks: Arc::clone(&self.callbacks),
            store: Arc::clone(&self.store),
            queue: Arc::clone(&self.queue),
            voice_prompt: Arc::clone(&self.voice_prompt),
            environment: self.config.environment.clone(),
        }
    }

    pub fn router(&self) -> Router {
        web::create_app(self.app_state())
    }

    /// Serve HTTP and run the background tasks until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(&self.config.web.bind_address)
            .await
            .map_err(|e| {
                DialerError::Configuration(format!(
                    "cannot bind {}: {e}",
                    self.config.web.bind_address
                ))
            })?;
        info!(bind_address = %self.config.web.bind_address, "🌐 HTTP server listening");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = self.worker();
        let worker_rx = shutdown_rx.clone();
        let worker_handle = tokio::spawn(async move { worker.run(worker_rx).await });

        let sweeper_handle = if self.config.sweep.enabled {
            let sweeper = self.sweeper();
            let sweeper_rx = shutdown_rx.clone();
            Some(tokio::spawn(async move { sweeper.run(sweeper_rx).await }))
        } else {
            info!("Staleness sweep disabled");
            None
        };

        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await;

        info!("🛑 Shutdown requested, stopping background tasks");
        let _ = shutdown_tx.send(true);
        if let Err(e) = worker_handle.await {
            error!(error = %e, "Dispatch worker task panicked");
        }
        if let Some(handle) = sweeper_handle {
            if let Err(e) = handle.await {
                error!(error = %e, "Staleness sweeper task panicked");
            }
        }

        served.map_err(|e| DialerError::Configuration(format!("HTTP server error: {e}")))
    }
}
