use axum::{
    extract::{Extension, Json, Path, State},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, no_content_response, success_response,
    },
    services::boards::{
        CreateBoardInput, CreateCardInput, CreateColumnInput, CreateRuleInput, MoveCardInput,
        UpdateBoardInput, UpdateCardInput, UpdateColumnInput, UpdateRuleInput,
    },
    AppState,
};

/// `/boards` routes, including board-scoped column, card and rule
/// collections.
pub fn boards_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_boards).post(create_board))
        .route("/:id", get(get_board).put(update_board).delete(delete_board))
        .route("/:id/columns", get(list_columns).post(create_column))
        .route("/:id/cards", get(list_cards).post(create_card))
        .route("/:id/rules", get(list_rules).post(create_rule))
}

/// `/columns/:id` routes for individual columns.
pub fn columns_routes() -> Router<Arc<AppState>> {
    Router::new().route("/:id", put(update_column).delete(delete_column))
}

/// `/cards/:id` routes for individual cards.
pub fn cards_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:id", get(get_card).put(update_card).delete(delete_card))
        .route("/:id/move", post(move_card))
        .route("/:id/history", get(card_history))
        .route("/:id/notifications", get(card_notifications))
}

/// `/rules/:id` routes for individual automation rules.
pub fn rules_routes() -> Router<Arc<AppState>> {
    Router::new().route("/:id", put(update_rule).delete(delete_rule))
}

// ----- Boards -----

async fn create_board(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateBoardInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let board = state
        .services
        .boards
        .create_board(&auth_user, payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(board))
}

async fn list_boards(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let boards = state
        .services
        .boards
        .list_boards(&auth_user)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(boards))
}

async fn get_board(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let board = state
        .services
        .boards
        .get_board(&auth_user, id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(board))
}

async fn update_board(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBoardInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let board = state
        .services
        .boards
        .update_board(&auth_user, id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(board))
}

async fn delete_board(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .boards
        .delete_board(&auth_user, id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

// ----- Columns -----

async fn create_column(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(board_id): Path<Uuid>,
    Json(payload): Json<CreateColumnInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let column = state
        .services
        .boards
        .create_column(&auth_user, board_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(column))
}

async fn list_columns(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let columns = state
        .services
        .boards
        .list_columns(board_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(columns))
}

async fn update_column(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateColumnInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let column = state
        .services
        .boards
        .update_column(&auth_user, id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(column))
}

async fn delete_column(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .boards
        .delete_column(&auth_user, id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

// ----- Cards -----

async fn create_card(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(board_id): Path<Uuid>,
    Json(payload): Json<CreateCardInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let card = state
        .services
        .boards
        .create_card(&auth_user, board_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(card))
}

async fn list_cards(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cards = state
        .services
        .boards
        .list_cards(board_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(cards))
}

async fn get_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let card = state
        .services
        .boards
        .get_card(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(card))
}

async fn update_card(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCardInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let card = state
        .services
        .boards
        .update_card(&auth_user, id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(card))
}

async fn move_card(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MoveCardInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let card = state
        .services
        .boards
        .move_card(&auth_user, id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(card))
}

async fn delete_card(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .boards
        .delete_card(&auth_user, id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

async fn card_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let history = state
        .services
        .boards
        .card_history(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(history))
}

async fn card_notifications(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let notifications = state
        .services
        .boards
        .card_notifications(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(notifications))
}

// ----- Automation rules -----

async fn create_rule(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(board_id): Path<Uuid>,
    Json(payload): Json<CreateRuleInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let rule = state
        .services
        .boards
        .create_rule(&auth_user, board_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(rule))
}

async fn list_rules(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(board_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let rules = state
        .services
        .boards
        .list_rules(&auth_user, board_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(rules))
}

async fn update_rule(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRuleInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let rule = state
        .services
        .boards
        .update_rule(&auth_user, id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(rule))
}

async fn delete_rule(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .boards
        .delete_rule(&auth_user, id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
