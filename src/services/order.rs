//! Order service: creation, status transitions, and trigger firing.
//!
//! Status changes are validated against the transition graph below, move
//! stock for fulfilment transitions, and fire `ON_ORDER_STATUS_CHANGE`
//! synchronously after the write commits.

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::models::order::{CreateOrder, Order, OrderStatus, OrderType};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::dispatcher;
use crate::services::evaluator::{OrderSnapshot, TriggerEvent};
use crate::services::inventory;

/// Filters for the order list endpoint.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OrderFilters {
    pub order_type: Option<OrderType>,
    pub status: Option<OrderStatus>,
}

/// Check whether a status transition is valid per the order state machine.
pub fn is_valid_transition(order_type: OrderType, from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    match (from, to) {
        (Draft, Pending) | (Draft, Cancelled) => true,
        (Pending, Processing) | (Pending, Cancelled) => true,
        (Processing, Cancelled) => true,
        (Processing, Shipped) => order_type == OrderType::Sales,
        (Processing, Received) => order_type == OrderType::Purchase,
        (Shipped, Delivered) => true,
        _ => false,
    }
}

pub async fn list(
    pool: &PgPool,
    organization_id: Uuid,
    filters: &OrderFilters,
    pagination: &Pagination,
) -> Result<PagedResult<Order>, AppError> {
    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM orders
        WHERE organization_id = $1
          AND ($2::order_type IS NULL OR order_type = $2)
          AND ($3::order_status IS NULL OR status = $3)
        "#,
    )
    .bind(organization_id)
    .bind(filters.order_type)
    .bind(filters.status)
    .fetch_one(pool)
    .await?;

    let orders = sqlx::query_as::<_, Order>(
        r#"
        SELECT * FROM orders
        WHERE organization_id = $1
          AND ($2::order_type IS NULL OR order_type = $2)
          AND ($3::order_status IS NULL OR status = $3)
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(organization_id)
    .bind(filters.order_type)
    .bind(filters.status)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;

    Ok(PagedResult::new(orders, total, pagination))
}

pub async fn find_by_id(
    pool: &PgPool,
    organization_id: Uuid,
    id: Uuid,
) -> Result<Order, AppError> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 AND organization_id = $2")
        .bind(id)
        .bind(organization_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id} not found")))
}

/// Create an order in `Draft` status. `unit_price` defaults to the item's
/// unit cost for purchases and retail price for sales.
pub async fn create(
    pool: &PgPool,
    organization_id: Uuid,
    input: &CreateOrder,
    created_by: Uuid,
) -> Result<Order, AppError> {
    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let item = inventory::find_by_id(pool, organization_id, input.item_id).await?;

    let unit_price = input.unit_price.unwrap_or(match input.order_type {
        OrderType::Purchase => item.unit_cost,
        OrderType::Sales => item.retail_price,
    });
    let total = unit_price * input.quantity as f64;
    let prefix = match input.order_type {
        OrderType::Sales => "SO",
        OrderType::Purchase => "PO",
    };
    let order_number = format!(
        "{prefix}-{}",
        &Uuid::new_v4().simple().to_string()[..8].to_uppercase()
    );

    let order = sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders
            (organization_id, order_number, order_type, status, counterparty_name,
             item_id, quantity, unit_price, total, notes, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(organization_id)
    .bind(&order_number)
    .bind(input.order_type)
    .bind(OrderStatus::Draft)
    .bind(&input.counterparty_name)
    .bind(item.id)
    .bind(input.quantity)
    .bind(unit_price)
    .bind(total)
    .bind(&input.notes)
    .bind(created_by)
    .fetch_one(pool)
    .await?;

    Ok(order)
}

/// Transition an order's status, moving stock for fulfilment transitions
/// and firing `ON_ORDER_STATUS_CHANGE`.
pub async fn transition(
    pool: &PgPool,
    organization_id: Uuid,
    id: Uuid,
    new_status: OrderStatus,
) -> Result<Order, AppError> {
    let existing = find_by_id(pool, organization_id, id).await?;

    if !is_valid_transition(existing.order_type, existing.status, new_status) {
        return Err(AppError::InvalidTransition(format!(
            "{} order cannot go from {} to {}",
            existing.order_type.as_str(),
            existing.status.as_str(),
            new_status.as_str()
        )));
    }

    // The status update and the fulfilment stock movement commit together:
    // a failed adjustment (insufficient stock, concurrent item changes)
    // rolls back the whole transition, so the order never reaches a
    // terminal state with its stock movement lost.
    let mut tx = pool.begin().await?;

    // Shipping a sales order consumes stock; an insufficient balance aborts
    // the transition. Receiving a purchase order adds the goods to stock.
    let stock_change = match (existing.order_type, new_status) {
        (OrderType::Sales, OrderStatus::Shipped) => Some(-existing.quantity),
        (OrderType::Purchase, OrderStatus::Received) => Some(existing.quantity),
        _ => None,
    };

    let mut stock_event = None;
    if let (Some(change), Some(item_id)) = (stock_change, existing.item_id) {
        let (item, previous_quantity) =
            inventory::apply_adjustment(&mut tx, organization_id, item_id, change).await?;
        tracing::info!(
            item_id = %item.id,
            sku = %item.sku,
            change,
            quantity = item.quantity,
            order_number = %existing.order_number,
            "stock moved for order fulfilment"
        );
        stock_event = Some(TriggerEvent::StockLevelChange {
            item: inventory::snapshot(&item),
            previous_quantity,
        });
    }

    let order = sqlx::query_as::<_, Order>(
        r#"
        UPDATE orders SET status = $1, updated_at = NOW()
        WHERE id = $2 AND organization_id = $3
        RETURNING *
        "#,
    )
    .bind(new_status)
    .bind(id)
    .bind(organization_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    // The stock movement fires its own trigger, after commit like any
    // manual adjustment.
    if let Some(event) = stock_event {
        inventory::fire(pool, organization_id, event).await;
    }

    let (item_name, item_sku) = match order.item_id {
        Some(item_id) => match inventory::find_by_id(pool, organization_id, item_id).await {
            Ok(item) => (Some(item.name), Some(item.sku)),
            Err(_) => (None, None),
        },
        None => (None, None),
    };

    let event = TriggerEvent::OrderStatusChange(OrderSnapshot {
        order_type: order.order_type,
        old_status: existing.status.as_str().to_string(),
        new_status: new_status.as_str().to_string(),
        item_name,
        item_sku,
        quantity: order.quantity,
    });

    if let Err(e) = dispatcher::dispatch(pool, organization_id, &event).await {
        tracing::warn!(order_id = %order.id, error = %e, "automation dispatch failed");
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_sales_flow() {
        use OrderStatus::*;
        let t = OrderType::Sales;
        assert!(is_valid_transition(t, Draft, Pending));
        assert!(is_valid_transition(t, Pending, Processing));
        assert!(is_valid_transition(t, Processing, Shipped));
        assert!(is_valid_transition(t, Shipped, Delivered));
    }

    #[test]
    fn happy_path_purchase_flow() {
        use OrderStatus::*;
        let t = OrderType::Purchase;
        assert!(is_valid_transition(t, Draft, Pending));
        assert!(is_valid_transition(t, Pending, Processing));
        assert!(is_valid_transition(t, Processing, Received));
    }

    #[test]
    fn fulfilment_respects_order_type() {
        use OrderStatus::*;
        assert!(!is_valid_transition(OrderType::Purchase, Processing, Shipped));
        assert!(!is_valid_transition(OrderType::Sales, Processing, Received));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        use OrderStatus::*;
        for from in [Delivered, Received, Cancelled] {
            for to in [Draft, Pending, Processing, Shipped, Delivered, Received, Cancelled] {
                assert!(!is_valid_transition(OrderType::Sales, from, to));
            }
        }
    }

    #[test]
    fn cancellation_only_before_fulfilment() {
        use OrderStatus::*;
        assert!(is_valid_transition(OrderType::Sales, Draft, Cancelled));
        assert!(is_valid_transition(OrderType::Sales, Pending, Cancelled));
        assert!(is_valid_transition(OrderType::Sales, Processing, Cancelled));
        assert!(!is_valid_transition(OrderType::Sales, Shipped, Cancelled));
    }

    #[test]
    fn no_skipping_states() {
        use OrderStatus::*;
        assert!(!is_valid_transition(OrderType::Sales, Draft, Shipped));
        assert!(!is_valid_transition(OrderType::Sales, Pending, Delivered));
    }
}
