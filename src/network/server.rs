//! HTTP Server
//!
//! Builds the router and serves it until Ctrl+C.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, put};
use axum::Router;
use tokio::net::TcpListener;

use crate::error::Result;
use crate::slicer::DaySlicer;
use crate::store::SliceStore;

use super::handlers;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SliceStore>,
    pub slicer: Arc<DaySlicer>,
}

impl AppState {
    pub fn new(store: SliceStore, slicer: DaySlicer) -> Self {
        Self {
            store: Arc::new(store),
            slicer: Arc::new(slicer),
        }
    }
}

/// All routes with their state attached
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/dayslice/:timestamp", get(handlers::get_day))
        .route("/dayslice/:timestamp/:slice", put(handlers::set_slice))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serve until `shutdown` resolves, then drain the store
pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    let store = Arc::clone(&state.store);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("HTTP server stopped, draining store");
    store.close()
}
