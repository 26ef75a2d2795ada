pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub auth_service: Arc<auth::AuthService>,
    pub services: handlers::AppServices,
}

/// Full v1 API router.
///
/// The cart is usable by anonymous sessions, so it sits outside the
/// auth layer; every other resource requires a bearer token.
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    let protected = Router::new()
        .nest("/customers", handlers::customers::customers_routes())
        .nest("/products", handlers::products::products_routes())
        .nest("/sales", handlers::sales::sales_routes())
        .nest("/boards", handlers::boards::boards_routes())
        .nest("/columns", handlers::boards::columns_routes())
        .nest("/cards", handlers::boards::cards_routes())
        .nest("/rules", handlers::boards::rules_routes())
        .route_layer(axum::middleware::from_fn(auth::auth_middleware));

    Router::new()
        .nest("/auth", auth_routes())
        .nest("/cart", handlers::carts::carts_routes())
        .merge(protected)
}

fn auth_routes() -> Router<Arc<AppState>> {
    handlers::auth::public_routes().merge(
        handlers::auth::protected_routes()
            .route_layer(axum::middleware::from_fn(auth::auth_middleware)),
    )
}

/// Liveness/status routes mounted at the root, outside `/api/v1`.
pub fn status_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
}

async fn status_handler() -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let database = match db::check_connection(&state.db).await {
        Ok(()) => "up",
        Err(_) => "down",
    };
    Json(json!({
        "status": if database == "up" { "healthy" } else { "degraded" },
        "database": database,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
