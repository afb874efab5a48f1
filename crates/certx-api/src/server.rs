//! API Server setup

use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::create_router;
use crate::state::{ApiConfig, AppState};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Build the router with middleware and resolve the listen address.
pub fn create_server(config: &ApiConfig, state: AppState) -> Result<(Router, SocketAddr), BoxError> {
    let mut router = create_router(state).layer(TraceLayer::new_for_http());

    if config.enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    Ok((router, addr))
}

/// Run the API server until the listener fails.
pub async fn run_server(config: &ApiConfig, state: AppState) -> Result<(), BoxError> {
    let (router, addr) = create_server(config, state)?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "REST API listening");
    axum::serve(listener, router).await?;
    Ok(())
}

/// Start the server on a background task and return the bound address
/// (useful when `port` is 0).
pub async fn start_background_server(config: &ApiConfig, state: AppState) -> Result<SocketAddr, BoxError> {
    let (router, addr) = create_server(config, state)?;
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "REST API server error");
        }
    });

    tracing::info!(addr = %actual_addr, "REST API listening");
    Ok(actual_addr)
}
