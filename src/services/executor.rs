//! Action executor for matched automation rules.
//!
//! Each action performs a single insert after all lookups have succeeded,
//! so a failure (missing item, unresolvable recipient) leaves nothing
//! partially applied.

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::automation::{AutomationRule, RuleAction};
use crate::models::item::InventoryItem;
use crate::models::notification::OutboxEmail;
use crate::models::order::{OrderStatus, OrderType};
use crate::models::user::UserRole;
use crate::services::evaluator::TriggerEvent;
use crate::services::template::TemplateContext;

/// Execute the action attached to a matched rule.
pub async fn execute(
    pool: &PgPool,
    rule: &AutomationRule,
    event: &TriggerEvent,
) -> Result<(), AppError> {
    let action: RuleAction = serde_json::from_value(rule.action.clone()).map_err(|e| {
        AppError::Validation(format!("rule {} has a malformed action: {e}", rule.id))
    })?;
    let ctx = TemplateContext::from_event(event);

    match action {
        RuleAction::SendNotification { message } => {
            send_notification(pool, rule, &ctx.render(&message)).await
        }
        RuleAction::SendEmail { to, subject, body } => {
            let recipient = resolve_recipient(pool, rule.organization_id, &to).await?;
            enqueue_email(pool, rule, &recipient, &ctx.render(&subject), &ctx.render(&body)).await
        }
        RuleAction::CreatePurchaseOrder { item_id, quantity } => {
            create_purchase_order(pool, rule, item_id, quantity).await
        }
    }
}

async fn send_notification(
    pool: &PgPool,
    rule: &AutomationRule,
    message: &str,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO notifications (organization_id, message, rule_id) VALUES ($1, $2, $3)",
    )
    .bind(rule.organization_id)
    .bind(message)
    .bind(rule.id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Resolve an action's `to` field: `admin` and `manager` map to the email of
/// the organization's first active user with the corresponding role; any
/// other value is treated as a literal address.
async fn resolve_recipient(
    pool: &PgPool,
    organization_id: Uuid,
    to: &str,
) -> Result<String, AppError> {
    let role = match to {
        "admin" => UserRole::OrgAdmin,
        "manager" => UserRole::InventoryManager,
        literal => return Ok(literal.to_string()),
    };

    sqlx::query_scalar::<_, String>(
        r#"
        SELECT email FROM users
        WHERE organization_id = $1 AND role = $2 AND is_active = true
        ORDER BY created_at ASC
        LIMIT 1
        "#,
    )
    .bind(organization_id)
    .bind(role)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("No active {to} user to receive email")))
}

async fn enqueue_email(
    pool: &PgPool,
    rule: &AutomationRule,
    recipient: &str,
    subject: &str,
    body: &str,
) -> Result<(), AppError> {
    let email = sqlx::query_as::<_, OutboxEmail>(
        r#"
        INSERT INTO email_outbox (organization_id, recipient, subject, body, rule_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(rule.organization_id)
    .bind(recipient)
    .bind(subject)
    .bind(body)
    .bind(rule.id)
    .fetch_one(pool)
    .await?;

    tracing::debug!(email_id = %email.id, recipient = %email.recipient, "email queued");
    Ok(())
}

/// Draft a purchase order for `quantity` units of the referenced item at its
/// current unit cost. The item must exist in the rule's organization.
async fn create_purchase_order(
    pool: &PgPool,
    rule: &AutomationRule,
    item_id: Uuid,
    quantity: i64,
) -> Result<(), AppError> {
    let item = sqlx::query_as::<_, InventoryItem>(
        "SELECT * FROM inventory_items WHERE id = $1 AND organization_id = $2",
    )
    .bind(item_id)
    .bind(rule.organization_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Inventory item {item_id} not found")))?;

    let total = item.unit_cost * quantity as f64;

    sqlx::query(
        r#"
        INSERT INTO orders
            (organization_id, order_number, order_type, status, item_id, quantity,
             unit_price, total, notes, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(rule.organization_id)
    .bind(draft_order_number())
    .bind(OrderType::Purchase)
    .bind(OrderStatus::Draft)
    .bind(item.id)
    .bind(quantity)
    .bind(item.unit_cost)
    .bind(total)
    .bind(format!("Auto-created by rule '{}'", rule.name))
    .bind(rule.created_by)
    .execute(pool)
    .await?;

    Ok(())
}

fn draft_order_number() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("PO-{}", &id[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_order_numbers_are_prefixed_and_unique() {
        let a = draft_order_number();
        let b = draft_order_number();
        assert!(a.starts_with("PO-"));
        assert_eq!(a.len(), 11);
        assert_ne!(a, b);
    }
}
