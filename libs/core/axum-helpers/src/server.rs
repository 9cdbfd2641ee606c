//! Server bootstrap and common middleware layers.

use crate::{
    envelope::{ApiError, ApiResponse, ResponseDetails},
    session::{request_details, RequestDetails},
};
use axum::{
    extract::Request,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    Json, Router,
};
use core_config::server::ServerConfig;
use std::io;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

use crate::shutdown::ShutdownCoordinator;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Wrap a router with the layers every service carries: request details,
/// HTTP tracing, a request timeout, and the envelope-shaped 404 fallback.
pub fn apply_common_layers(router: Router) -> Router {
    router
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(middleware::from_fn(request_details))
}

/// Fallback for unknown routes, rendered in the standard envelope.
pub async fn not_found(request: Request) -> Response {
    let details = request
        .extensions()
        .get::<RequestDetails>()
        .map(|details| details.response_details(None))
        .unwrap_or_else(|| ResponseDetails::new(uuid::Uuid::new_v4().simple().to_string()));

    let body = ApiResponse::with_error(
        details,
        ApiError {
            code: "not_found".to_string(),
            message: format!("no route for {} {}", request.method(), request.uri().path()),
        },
    );

    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

/// Serve the router until SIGINT/SIGTERM, no cleanup coordination.
///
/// Prefer [`create_production_app`] for anything with connections to drain.
pub async fn create_app(router: Router, server_config: &ServerConfig) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;

    info!("Server starting on {}", listener.local_addr()?);
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(crate::shutdown::shutdown_signal())
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        })?;

    Ok(())
}

/// Serve the router with coordinated shutdown and bounded cleanup.
///
/// On SIGINT/SIGTERM the server stops accepting connections, in-flight
/// requests drain, and `cleanup` runs with `shutdown_timeout` to finish
/// (closing publishers, relays, and subscriber maps).
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let (coordinator, _rx) = ShutdownCoordinator::new();
    let cleanup_coordinator = coordinator.clone();
    let serve_coordinator = coordinator.clone();

    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    let cleanup_handle = tokio::spawn(async move {
        let mut rx = cleanup_coordinator.subscribe();
        let _ = rx.recv().await;

        info!("Running cleanup tasks (timeout: {:?})", shutdown_timeout);
        if tokio::time::timeout(shutdown_timeout, cleanup).await.is_err() {
            tracing::warn!(
                "Cleanup exceeded timeout of {:?}, forcing shutdown",
                shutdown_timeout
            );
        }
    });

    let serve_result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            serve_coordinator.wait_for_signal().await;
        })
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        });

    cleanup_handle.await.ok();

    serve_result
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn unknown_route_gets_envelope_404() {
        let app = apply_common_layers(Router::new());
        let response = app
            .oneshot(
                axum::http::Request::get("/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"]["code"], "not_found");
        assert!(value["details"]["traceID"].as_str().is_some_and(|s| !s.is_empty()));
    }
}
