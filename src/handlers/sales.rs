use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    errors::ApiError,
    handlers::common::{
        created_response, default_page, default_per_page, map_service_error, no_content_response,
        success_response,
    },
    services::carts::CartOwner,
    services::sales::{CreateSaleInput, SaleFilter},
    AppState,
};

pub fn sales_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_sales).post(create_sale))
        .route("/from-cart", post(create_sale_from_cart))
        .route("/:id", get(get_sale).delete(delete_sale))
        .route("/:id/lines", get(get_sale_lines))
}

#[derive(Debug, Deserialize)]
struct SaleListQuery {
    customer: Option<Uuid>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    #[serde(default = "default_page")]
    page: u64,
    #[serde(default = "default_per_page")]
    per_page: u64,
}

#[derive(Debug, Deserialize)]
struct FromCartRequest {
    session_id: Option<String>,
    user_id: Option<Uuid>,
    customer_id: Option<Uuid>,
}

async fn create_sale(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSaleInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let sale = state
        .services
        .sales
        .create_sale(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(sale))
}

async fn create_sale_from_cart(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FromCartRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let owner = CartOwner::resolve(payload.session_id, payload.user_id)
        .map_err(ApiError::ServiceError)?;
    let sale = state
        .services
        .sales
        .create_sale_from_cart(owner, payload.customer_id)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(sale))
}

async fn list_sales(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SaleListQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let filter = SaleFilter {
        customer_id: query.customer,
        from: query.from,
        to: query.to,
    };
    let page = state
        .services
        .sales
        .list_sales(filter, query.page, query.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(page))
}

async fn get_sale(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let sale = state
        .services
        .sales
        .get_sale(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(sale))
}

async fn get_sale_lines(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    // 404 for an unknown sale rather than an empty list
    state
        .services
        .sales
        .get_sale(id)
        .await
        .map_err(map_service_error)?;
    let lines = state
        .services
        .sales
        .get_sale_lines(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(lines))
}

async fn delete_sale(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .sales
        .delete_sale(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
