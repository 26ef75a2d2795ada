use axum::{
    extract::{Json, Path, Query, State},
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, no_content_response, success_response,
    },
    services::carts::{AddCartLineInput, CartOwner},
    AppState,
};

pub fn carts_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_cart).post(add_line))
        .route("/:id", put(update_line))
        .route("/:id", delete(remove_line))
        .route("/clear", post(clear_cart))
}

/// Owner key as carried by query string or body; exactly one side set.
#[derive(Debug, Deserialize)]
struct OwnerParams {
    session_id: Option<String>,
    user_id: Option<Uuid>,
}

impl OwnerParams {
    fn resolve(self) -> Result<CartOwner, ApiError> {
        CartOwner::resolve(self.session_id, self.user_id)
            .map_err(ApiError::ServiceError)
    }
}

#[derive(Debug, Deserialize)]
struct AddLineRequest {
    session_id: Option<String>,
    user_id: Option<Uuid>,
    product_id: Uuid,
    quantity: i32,
}

#[derive(Debug, Deserialize)]
struct UpdateLineRequest {
    quantity: i32,
}

async fn get_cart(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OwnerParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let owner = params.resolve()?;
    let cart = state
        .services
        .carts
        .list_lines(owner)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(cart))
}

async fn add_line(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AddLineRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let owner = OwnerParams {
        session_id: payload.session_id,
        user_id: payload.user_id,
    }
    .resolve()?;

    let line = state
        .services
        .carts
        .add_line(
            owner,
            AddCartLineInput {
                product_id: payload.product_id,
                quantity: payload.quantity,
            },
        )
        .await
        .map_err(map_service_error)?;
    Ok(created_response(line))
}

async fn update_line(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLineRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let line = state
        .services
        .carts
        .update_quantity(id, payload.quantity)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(line))
}

async fn remove_line(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .carts
        .remove_line(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

async fn clear_cart(
    State(state): State<Arc<AppState>>,
    Json(params): Json<OwnerParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let owner = params.resolve()?;
    state
        .services
        .carts
        .clear(owner)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
