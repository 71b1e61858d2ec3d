//! Host HTTP server.
//!
//! # Responsibilities
//! - Create the Axum Router for the host's own endpoints
//! - Forward requests under the mounted prefix to the attached service
//! - Serve on the host listener until shutdown is signalled

use std::net::SocketAddr;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::trace::TraceLayer;

use crate::host::listener::{ListenerHandle, UpgradeSlot};

/// Body of `GET /healthz`.
#[derive(Debug, Serialize)]
pub struct HostStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub transport: Option<String>,
}

/// HTTP server for the host application.
pub struct HostServer {
    router: Router,
    handle: ListenerHandle,
}

impl HostServer {
    /// Create a server bound to the listener described by `handle`.
    pub fn new(handle: ListenerHandle) -> Self {
        let router = Self::build_router(handle.upgrade_slot().clone());
        Self { router, handle }
    }

    fn build_router(slot: UpgradeSlot) -> Router {
        Router::new()
            .route("/healthz", get(health))
            .fallback(dispatch_mounted)
            .with_state(slot)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %self.handle.local_addr(), "Host server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Host shutdown requested");
            })
            .await?;

        tracing::info!("Host server stopped");
        Ok(())
    }

    pub fn handle(&self) -> &ListenerHandle {
        &self.handle
    }
}

async fn health(State(slot): State<UpgradeSlot>) -> Json<HostStatus> {
    Json(HostStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        transport: slot.mounted_path(),
    })
}

/// Hand requests under the mounted prefix to the attached router.
async fn dispatch_mounted(State(slot): State<UpgradeSlot>, request: Request) -> Response {
    let Some(route) = slot.route_for(request.uri().path()) else {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };

    match route.router.clone().oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}
