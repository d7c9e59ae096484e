//! In-app notification routes.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::models::notification::Notification;
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::notification as notification_service;
use crate::AppState;

/// GET /api/v1/notifications — newest first.
pub async fn list(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<PagedResult<Notification>>>, AppError> {
    let result =
        notification_service::list(&state.db, current_user.organization_id, &pagination).await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/v1/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Notification>>, AppError> {
    let notification =
        notification_service::mark_read(&state.db, current_user.organization_id, id).await?;
    Ok(ApiResponse::success(notification))
}
