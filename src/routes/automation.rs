//! Automation rule routes: rule CRUD and the evaluation log.
//!
//! Listing is open to any authenticated user; mutations require the
//! organization admin role.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::middleware::rbac::RequireAdmin;
use crate::models::automation::{
    AutomationLogEntry, AutomationRule, CreateAutomationRule, UpdateAutomationRule,
};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::automation as automation_service;
use crate::AppState;

/// GET /api/v1/automation/rules — list rules in dispatch order.
pub async fn list_rules(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<PagedResult<AutomationRule>>>, AppError> {
    let result =
        automation_service::list_rules(&state.db, current_user.organization_id, &pagination)
            .await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/v1/automation/rules/:id
pub async fn get_rule(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AutomationRule>>, AppError> {
    let rule =
        automation_service::find_rule(&state.db, current_user.organization_id, id).await?;
    Ok(ApiResponse::success(rule))
}

/// POST /api/v1/automation/rules — create a rule (admin).
pub async fn create_rule(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<CreateAutomationRule>,
) -> Result<Json<ApiResponse<AutomationRule>>, AppError> {
    let rule =
        automation_service::create_rule(&state.db, admin.organization_id, &body, admin.id).await?;
    Ok(ApiResponse::success(rule))
}

/// PUT /api/v1/automation/rules/:id — update a rule (admin).
pub async fn update_rule(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateAutomationRule>,
) -> Result<Json<ApiResponse<AutomationRule>>, AppError> {
    let rule =
        automation_service::update_rule(&state.db, admin.organization_id, id, &body).await?;
    Ok(ApiResponse::success(rule))
}

/// DELETE /api/v1/automation/rules/:id (admin).
pub async fn delete_rule(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    automation_service::delete_rule(&state.db, admin.organization_id, id).await?;
    Ok(ApiResponse::success(()))
}

/// GET /api/v1/automation/log — evaluation outcomes, newest first (admin).
pub async fn list_log(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<PagedResult<AutomationLogEntry>>>, AppError> {
    let result =
        automation_service::list_log(&state.db, admin.organization_id, &pagination).await?;
    Ok(ApiResponse::success(result))
}
