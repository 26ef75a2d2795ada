use axum::{
    extract::{Extension, Json, Path, Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::{ApiError, ServiceError},
    handlers::common::{
        created_response, default_page, default_per_page, map_service_error, no_content_response,
        success_response,
    },
    services::products::{CreateProductInput, UpdateProductInput},
    AppState,
};

pub fn products_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[derive(Debug, Deserialize)]
struct ProductListQuery {
    category: Option<String>,
    search: Option<String>,
    #[serde(default = "default_page")]
    page: u64,
    #[serde(default = "default_per_page")]
    per_page: u64,
}

/// Catalog mutations are reserved for managers.
fn require_manager(auth_user: &AuthUser) -> Result<(), ApiError> {
    if !auth_user.is_manager() {
        return Err(ApiError::ServiceError(ServiceError::Forbidden(
            "Only managers may modify the catalog".to_string(),
        )));
    }
    Ok(())
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateProductInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    require_manager(&auth_user)?;
    let product = state
        .services
        .products
        .create_product(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(product))
}

async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let page = state
        .services
        .products
        .list_products(
            query.category,
            query.search,
            query.page,
            query.per_page,
        )
        .await
        .map_err(map_service_error)?;
    Ok(success_response(page))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .get_product(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(product))
}

async fn update_product(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    require_manager(&auth_user)?;
    let product = state
        .services
        .products
        .update_product(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(product))
}

async fn delete_product(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    require_manager(&auth_user)?;
    state
        .services
        .products
        .delete_product(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
