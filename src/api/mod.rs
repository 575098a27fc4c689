//! REST API server module
//!
//! Provides the HTTP surface of the export service: job creation,
//! inspection, streaming downloads, the benchmark endpoint, and the
//! OpenAPI document.

use crate::Result;
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Export Jobs
/// - `POST /exports` - Create an export job
/// - `GET /exports/:export_id` - Get an export job record
/// - `GET /exports/:export_id/download` - Stream the encoded export
/// - `GET /exports/benchmark` - Run the benchmark harness
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /api-docs/openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        // Export jobs; the static benchmark path is registered alongside
        // the :export_id routes, axum prefers the static match
        .route("/exports", post(routes::create_export))
        .route("/exports/benchmark", get(routes::run_export_benchmark))
        .route("/exports/:export_id", get(routes::get_export))
        .route(
            "/exports/:export_id/download",
            get(routes::download_export),
        )
        // System
        .route("/health", get(routes::health_check));

    // Swagger UI serves the spec itself; without it the plain handler
    // keeps the document reachable at the same path
    let router = if config.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router.route("/api-docs/openapi.json", get(routes::openapi_spec))
    };

    let router = router.with_state(state);

    let cors = build_cors_layer(&config.cors_origins);
    router.layer(cors).layer(TraceLayer::new_for_http())
}

/// Build a CORS layer based on configured origins
///
/// # Arguments
///
/// * `origins` - List of allowed origins (supports "*" for any origin)
///
/// # Returns
///
/// A configured CorsLayer that allows the specified origins, all methods,
/// and all headers for cross-origin requests.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    // Check if "*" (all origins) is in the list
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        // Allow all origins (default for local development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Allow specific origins
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Creates a TCP listener, binds it to the configured address, and
/// serves the API router until the server is shut down.
pub async fn start_api_server(state: AppState) -> Result<()> {
    let bind_address = state.config.bind_address();

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
