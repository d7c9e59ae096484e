//! Inventory item service: CRUD, stock adjustment, and trigger firing.
//!
//! Item creation fires `ON_NEW_INVENTORY_ITEM` and stock adjustments fire
//! `ON_STOCK_LEVEL_CHANGE`, dispatched synchronously after the write
//! commits. A dispatch failure is logged but never fails the triggering
//! request.

use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::models::item::{AdjustStock, CreateItem, InventoryItem, ItemStatus, UpdateItem};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::dispatcher;
use crate::services::evaluator::{ItemSnapshot, TriggerEvent};

/// Filters for the item list endpoint.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ItemFilters {
    pub category: Option<String>,
    pub status: Option<ItemStatus>,
}

/// Capture an item's state for rule evaluation and template rendering.
pub fn snapshot(item: &InventoryItem) -> ItemSnapshot {
    ItemSnapshot {
        id: item.id,
        name: item.name.clone(),
        sku: item.sku.clone(),
        quantity: item.quantity,
        status: item.status.as_str().to_string(),
        category: item.category.clone(),
        folder_id: item.folder_id,
        unit_cost: item.unit_cost,
        retail_price: item.retail_price,
    }
}

pub async fn list(
    pool: &PgPool,
    organization_id: Uuid,
    filters: &ItemFilters,
    pagination: &Pagination,
) -> Result<PagedResult<InventoryItem>, AppError> {
    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM inventory_items
        WHERE organization_id = $1
          AND ($2::text IS NULL OR category = $2)
          AND ($3::item_status IS NULL OR status = $3)
        "#,
    )
    .bind(organization_id)
    .bind(&filters.category)
    .bind(filters.status)
    .fetch_one(pool)
    .await?;

    let items = sqlx::query_as::<_, InventoryItem>(
        r#"
        SELECT * FROM inventory_items
        WHERE organization_id = $1
          AND ($2::text IS NULL OR category = $2)
          AND ($3::item_status IS NULL OR status = $3)
        ORDER BY name ASC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(organization_id)
    .bind(&filters.category)
    .bind(filters.status)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;

    Ok(PagedResult::new(items, total, pagination))
}

pub async fn find_by_id(
    pool: &PgPool,
    organization_id: Uuid,
    id: Uuid,
) -> Result<InventoryItem, AppError> {
    sqlx::query_as::<_, InventoryItem>(
        "SELECT * FROM inventory_items WHERE id = $1 AND organization_id = $2",
    )
    .bind(id)
    .bind(organization_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Inventory item {id} not found")))
}

/// Create an item and fire `ON_NEW_INVENTORY_ITEM`.
pub async fn create(
    pool: &PgPool,
    organization_id: Uuid,
    input: &CreateItem,
) -> Result<InventoryItem, AppError> {
    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let quantity = input.quantity.unwrap_or(0);
    let threshold = input.low_stock_threshold.unwrap_or(0);
    let status = ItemStatus::for_quantity(quantity, threshold);

    let item = sqlx::query_as::<_, InventoryItem>(
        r#"
        INSERT INTO inventory_items
            (organization_id, name, sku, description, category, folder_id,
             quantity, low_stock_threshold, unit_cost, retail_price, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(organization_id)
    .bind(&input.name)
    .bind(&input.sku)
    .bind(&input.description)
    .bind(&input.category)
    .bind(input.folder_id)
    .bind(quantity)
    .bind(threshold)
    .bind(input.unit_cost.unwrap_or(0.0))
    .bind(input.retail_price.unwrap_or(0.0))
    .bind(status)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(format!("SKU '{}' already exists", input.sku))
        }
        other => AppError::Database(other),
    })?;

    fire(pool, organization_id, TriggerEvent::NewInventoryItem(snapshot(&item))).await;

    Ok(item)
}

pub async fn update(
    pool: &PgPool,
    organization_id: Uuid,
    id: Uuid,
    input: &UpdateItem,
) -> Result<InventoryItem, AppError> {
    let existing = find_by_id(pool, organization_id, id).await?;

    let name = input.name.as_deref().unwrap_or(&existing.name);
    let description = input
        .description
        .as_deref()
        .or(existing.description.as_deref());
    let category = input.category.as_deref().or(existing.category.as_deref());
    let folder_id = input.folder_id.or(existing.folder_id);
    let threshold = input.low_stock_threshold.unwrap_or(existing.low_stock_threshold);
    let unit_cost = input.unit_cost.unwrap_or(existing.unit_cost);
    let retail_price = input.retail_price.unwrap_or(existing.retail_price);
    // Threshold edits can reclassify the current quantity.
    let status = ItemStatus::for_quantity(existing.quantity, threshold);

    let item = sqlx::query_as::<_, InventoryItem>(
        r#"
        UPDATE inventory_items
        SET name = $1, description = $2, category = $3, folder_id = $4,
            low_stock_threshold = $5, unit_cost = $6, retail_price = $7,
            status = $8, updated_at = NOW()
        WHERE id = $9 AND organization_id = $10
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(description)
    .bind(category)
    .bind(folder_id)
    .bind(threshold)
    .bind(unit_cost)
    .bind(retail_price)
    .bind(status)
    .bind(id)
    .bind(organization_id)
    .fetch_one(pool)
    .await?;

    Ok(item)
}

pub async fn delete(pool: &PgPool, organization_id: Uuid, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query(
        "DELETE FROM inventory_items WHERE id = $1 AND organization_id = $2",
    )
    .bind(id)
    .bind(organization_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Inventory item {id} not found")));
    }
    Ok(())
}

/// Core of a stock adjustment, runnable inside a caller's transaction so the
/// movement commits together with whatever write caused it. Locks the item
/// row, rejects adjustments that would take the quantity below zero, and
/// returns the updated item plus the prior quantity.
pub(crate) async fn apply_adjustment(
    conn: &mut PgConnection,
    organization_id: Uuid,
    id: Uuid,
    change: i64,
) -> Result<(InventoryItem, i64), AppError> {
    let existing = sqlx::query_as::<_, InventoryItem>(
        "SELECT * FROM inventory_items WHERE id = $1 AND organization_id = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(organization_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Inventory item {id} not found")))?;

    let new_quantity = existing.quantity + change;
    if new_quantity < 0 {
        return Err(AppError::Validation(format!(
            "adjustment of {} would take quantity below zero (current {})",
            change, existing.quantity
        )));
    }
    let status = ItemStatus::for_quantity(new_quantity, existing.low_stock_threshold);

    let item = sqlx::query_as::<_, InventoryItem>(
        r#"
        UPDATE inventory_items
        SET quantity = $1, status = $2, updated_at = NOW()
        WHERE id = $3 AND organization_id = $4
        RETURNING *
        "#,
    )
    .bind(new_quantity)
    .bind(status)
    .bind(id)
    .bind(organization_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok((item, existing.quantity))
}

/// Apply a relative stock adjustment and fire `ON_STOCK_LEVEL_CHANGE`.
pub async fn adjust_stock(
    pool: &PgPool,
    organization_id: Uuid,
    id: Uuid,
    input: &AdjustStock,
) -> Result<InventoryItem, AppError> {
    let mut tx = pool.begin().await?;
    let (item, previous_quantity) =
        apply_adjustment(&mut tx, organization_id, id, input.change).await?;
    tx.commit().await?;

    tracing::info!(
        item_id = %item.id,
        sku = %item.sku,
        change = input.change,
        quantity = item.quantity,
        reason = input.reason.as_deref().unwrap_or(""),
        "stock adjusted"
    );

    fire(
        pool,
        organization_id,
        TriggerEvent::StockLevelChange {
            item: snapshot(&item),
            previous_quantity,
        },
    )
    .await;

    Ok(item)
}

/// Dispatch an event after a committed write. Rule evaluation problems are
/// already isolated per rule inside the dispatcher; an infrastructure
/// failure here is logged rather than failing the triggering request.
pub(crate) async fn fire(pool: &PgPool, organization_id: Uuid, event: TriggerEvent) {
    match dispatcher::dispatch(pool, organization_id, &event).await {
        Ok(outcome) => {
            if outcome.rules_evaluated > 0 {
                tracing::debug!(
                    evaluated = outcome.rules_evaluated,
                    matched = outcome.rules_matched,
                    failed = outcome.actions_failed,
                    "automation dispatch complete"
                );
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "automation dispatch failed");
        }
    }
}
