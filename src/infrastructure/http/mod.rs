use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::{
    controllers::{artifacts, health, synthesis::SynthesisController, ARTIFACT_ROUTE_PREFIX},
    domain::synthesis::SynthesisService,
    infrastructure::{config::Config, middleware::request_id_middleware},
};

/// Build the application router with all routes configured
pub fn build_router(
    synthesis_service: Arc<SynthesisService>,
    synthesis_controller: Arc<SynthesisController>,
) -> Router {
    let synthesis_routes = Router::new()
        .route("/synthesize", post(SynthesisController::synthesize_json))
        .route("/api/audio", post(SynthesisController::synthesize_audio))
        .with_state(synthesis_controller);

    let artifact_routes = Router::new()
        .route(
            &format!("/{}/:file_name", ARTIFACT_ROUTE_PREFIX),
            get(artifacts::get_artifact),
        )
        .with_state(synthesis_service.clone());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(synthesis_service)
        .merge(synthesis_routes)
        .merge(artifact_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Bind the configured address and serve `app` until Ctrl-C / SIGTERM
pub async fn start_http_server(
    config: Arc<Config>,
    app: Router,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
