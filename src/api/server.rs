//! # API Server
//!
//! Runs the control API router on an already-bound listener until the
//! application's shutdown signal fires. Binding is done by the caller so a
//! port clash is reported at start-up, before any task is spawned.

use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

pub struct ApiServer {
    listener: TcpListener,
    router: Router,
    shutdown_rx: watch::Receiver<bool>,
}

impl ApiServer {
    pub fn new(listener: TcpListener, router: Router, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            listener,
            router,
            shutdown_rx,
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Returns a future that serves requests until shutdown. In-flight
    /// requests are allowed to finish.
    pub fn run(self) -> impl Future<Output = ()> {
        let ApiServer {
            listener,
            router,
            mut shutdown_rx,
        } = self;

        async move {
            let shutdown = async move {
                let _ = shutdown_rx.changed().await;
                info!("API server received shutdown signal.");
            };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!("API server error: {}", e);
            }
            info!("API server finished.");
        }
    }
}
