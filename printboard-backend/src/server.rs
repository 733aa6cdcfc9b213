/// HTTP server: spawns axum on a background tokio task.
use axum::Router;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

use crate::api::api_router;
use crate::state::ServerState;

pub fn build_router(state: ServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api_router().layer(cors).with_state(state)
}

/// Bind and serve. Returns the bound port (useful when configured as 0)
/// and the server task.
pub async fn spawn_server(
    state: ServerState,
) -> Result<(u16, JoinHandle<()>), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", state.bind_address, state.port);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local = listener.local_addr()?;
    log::info!("[printboard.server] Listening on http://{}", local);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            log::error!("[printboard.server] HTTP server exited with error: {}", e);
        }
    });

    Ok((local.port(), handle))
}
