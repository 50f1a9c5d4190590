use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use chatgate_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;


pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let monitoring_routes = Router::new()
        .route(
            "/api/abuse-monitoring",
            get(handlers::monitoring::monitoring_handler),
        )
        .route("/monitoring", get(handlers::monitoring::monitoring_handler))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_admin_token,
        ));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/api/chat", post(handlers::chat::chat_handler))
        .merge(monitoring_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .with_state(app_state))
}
