//! Inventory item routes: CRUD and stock adjustment.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::middleware::rbac::RequireManager;
use crate::models::item::{AdjustStock, CreateItem, InventoryItem, UpdateItem};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::inventory::{self, ItemFilters};
use crate::AppState;

/// GET /api/v1/items — list items with filters and pagination.
pub async fn list(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<ItemFilters>,
) -> Result<Json<ApiResponse<PagedResult<InventoryItem>>>, AppError> {
    let result = inventory::list(
        &state.db,
        current_user.organization_id,
        &filters,
        &pagination,
    )
    .await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/v1/items — create an item (manager+); fires ON_NEW_INVENTORY_ITEM.
pub async fn create(
    State(state): State<AppState>,
    RequireManager(manager): RequireManager,
    Json(body): Json<CreateItem>,
) -> Result<Json<ApiResponse<InventoryItem>>, AppError> {
    let item = inventory::create(&state.db, manager.organization_id, &body).await?;
    Ok(ApiResponse::success(item))
}

/// GET /api/v1/items/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<InventoryItem>>, AppError> {
    let item = inventory::find_by_id(&state.db, current_user.organization_id, id).await?;
    Ok(ApiResponse::success(item))
}

/// PUT /api/v1/items/:id — update item metadata (manager+).
pub async fn update(
    State(state): State<AppState>,
    RequireManager(manager): RequireManager,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateItem>,
) -> Result<Json<ApiResponse<InventoryItem>>, AppError> {
    let item = inventory::update(&state.db, manager.organization_id, id, &body).await?;
    Ok(ApiResponse::success(item))
}

/// DELETE /api/v1/items/:id (manager+).
pub async fn delete(
    State(state): State<AppState>,
    RequireManager(manager): RequireManager,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    inventory::delete(&state.db, manager.organization_id, id).await?;
    Ok(ApiResponse::success(()))
}

/// POST /api/v1/items/:id/adjust — relative stock change (manager+);
/// fires ON_STOCK_LEVEL_CHANGE.
pub async fn adjust_stock(
    State(state): State<AppState>,
    RequireManager(manager): RequireManager,
    Path(id): Path<Uuid>,
    Json(body): Json<AdjustStock>,
) -> Result<Json<ApiResponse<InventoryItem>>, AppError> {
    let item = inventory::adjust_stock(&state.db, manager.organization_id, id, &body).await?;
    Ok(ApiResponse::success(item))
}
