//! In-app notification listing and read tracking.

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::notification::Notification;
use crate::models::pagination::{PagedResult, Pagination};

pub async fn list(
    pool: &PgPool,
    organization_id: Uuid,
    pagination: &Pagination,
) -> Result<PagedResult<Notification>, AppError> {
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE organization_id = $1",
    )
    .bind(organization_id)
    .fetch_one(pool)
    .await?;

    let notifications = sqlx::query_as::<_, Notification>(
        r#"
        SELECT * FROM notifications
        WHERE organization_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(organization_id)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;

    Ok(PagedResult::new(notifications, total, pagination))
}

pub async fn mark_read(
    pool: &PgPool,
    organization_id: Uuid,
    id: Uuid,
) -> Result<Notification, AppError> {
    sqlx::query_as::<_, Notification>(
        r#"
        UPDATE notifications SET is_read = true
        WHERE id = $1 AND organization_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(organization_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Notification {id} not found")))
}
