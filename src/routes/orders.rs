//! Order routes: listing, creation, and status transitions.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::middleware::rbac::RequireManager;
use crate::models::order::{CreateOrder, Order, TransitionOrder};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::order::{self as order_service, OrderFilters};
use crate::AppState;

/// GET /api/v1/orders — list orders with filters and pagination.
pub async fn list(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<OrderFilters>,
) -> Result<Json<ApiResponse<PagedResult<Order>>>, AppError> {
    let result = order_service::list(
        &state.db,
        current_user.organization_id,
        &filters,
        &pagination,
    )
    .await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/v1/orders — create an order in Draft status (manager+).
pub async fn create(
    State(state): State<AppState>,
    RequireManager(manager): RequireManager,
    Json(body): Json<CreateOrder>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    let order =
        order_service::create(&state.db, manager.organization_id, &body, manager.id).await?;
    Ok(ApiResponse::success(order))
}

/// GET /api/v1/orders/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    let order = order_service::find_by_id(&state.db, current_user.organization_id, id).await?;
    Ok(ApiResponse::success(order))
}

/// PATCH /api/v1/orders/:id/status — transition order status (manager+);
/// fires ON_ORDER_STATUS_CHANGE.
pub async fn transition(
    State(state): State<AppState>,
    RequireManager(manager): RequireManager,
    Path(id): Path<Uuid>,
    Json(body): Json<TransitionOrder>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    let order = order_service::transition(
        &state.db,
        manager.organization_id,
        id,
        body.new_status,
    )
    .await?;
    Ok(ApiResponse::success(order))
}
