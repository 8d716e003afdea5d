//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression,
//! and all endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use helpdesk_core::config::HelpdeskConfig;
use helpdesk_core::error::HelpdeskError;

use crate::auth::{require_admin, require_auth};
use crate::handlers;
use crate::state::AppState;

/// Localhost origins for the configured port and the dev server on port+1.
fn allowed_origins(port: u16) -> Vec<HeaderValue> {
    let dev_port = port.saturating_add(1);
    [port, dev_port]
        .iter()
        .flat_map(|p| {
            [
                format!("http://127.0.0.1:{}", p),
                format!("http://localhost:{}", p),
            ]
        })
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect()
}

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins(state.config.general.port)))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Routes that do NOT require authentication.
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/login", post(handlers::login));

    // Admin routes; require_admin runs after require_auth has set the caller.
    let admin_routes = Router::new()
        .route(
            "/admin/qa",
            get(handlers::admin_list_qa).post(handlers::admin_create_qa),
        )
        .route(
            "/admin/qa/{id}",
            get(handlers::admin_get_qa)
                .put(handlers::admin_update_qa)
                .delete(handlers::admin_delete_qa),
        )
        .route("/admin/issues", get(handlers::admin_list_issues))
        .route("/admin/issues/{id}/resolve", put(handlers::resolve_issue))
        .route("/admin/events", get(handlers::stream))
        .route_layer(axum::middleware::from_fn(require_admin));

    let user_routes = Router::new()
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/me", get(handlers::me))
        .route("/qa", get(handlers::list_qa))
        .route(
            "/chat/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route(
            "/chat/sessions/{id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/chat/sessions/{id}/messages", post(handlers::post_message))
        .route("/chat/sessions/{id}/actions", post(handlers::post_action))
        .route(
            "/chat/sessions/{id}/escalations",
            post(handlers::post_escalation),
        )
        .route("/chat/sessions/{id}/history", get(handlers::history));

    // Combine all protected routes behind auth.
    let protected_routes = user_routes.merge(admin_routes).route_layer(
        axum::middleware::from_fn_with_state(state.clone(), require_auth),
    );

    public_routes
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(64 * 1024)) // 64KB is plenty for chat and admin bodies
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured address.
///
/// Binds to 127.0.0.1 (localhost only) on the port from config.
pub async fn start_server(config: &HelpdeskConfig, state: AppState) -> Result<(), HelpdeskError> {
    let addr = format!("127.0.0.1:{}", config.general.port);

    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HelpdeskError::Api(format!("Failed to bind: {}", e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| HelpdeskError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
