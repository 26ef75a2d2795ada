use axum::{
    extract::{Json, Path, Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    errors::ApiError,
    handlers::common::{
        created_response, default_page, default_per_page, map_service_error, no_content_response,
        success_response,
    },
    services::customers::{CreateCustomerInput, UpdateCustomerInput},
    AppState,
};

pub fn customers_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

#[derive(Debug, Deserialize)]
struct CustomerListQuery {
    search: Option<String>,
    #[serde(default = "default_page")]
    page: u64,
    #[serde(default = "default_per_page")]
    per_page: u64,
}

async fn create_customer(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCustomerInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let customer = state
        .services
        .customers
        .create_customer(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(customer))
}

async fn list_customers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CustomerListQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let page = state
        .services
        .customers
        .list_customers(query.search, query.page, query.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(page))
}

async fn get_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let customer = state
        .services
        .customers
        .get_customer(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(customer))
}

async fn update_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let customer = state
        .services
        .customers
        .update_customer(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(customer))
}

async fn delete_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .customers
        .delete_customer(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
