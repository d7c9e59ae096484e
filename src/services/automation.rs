//! Automation rule store: CRUD, shape validation, and the evaluation log.
//!
//! Separates DB-dependent operations from the pure matching logic in
//! [`crate::services::evaluator`]. Shape validation runs at the edit
//! boundary so a stored rule's condition always matches its trigger type;
//! the evaluator still treats any mismatch it sees as a non-match.

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::models::automation::{
    AutomationLogEntry, AutomationRule, CompareOp, CreateAutomationRule, RuleAction,
    RuleCondition, TriggerType, UpdateAutomationRule,
};
use crate::models::pagination::{PagedResult, Pagination};

/// Validate that a condition/action pair is well-formed for a trigger type.
pub fn validate_rule_shape(
    trigger: TriggerType,
    condition: &serde_json::Value,
    action: &serde_json::Value,
) -> Result<(), AppError> {
    let parsed = RuleCondition::parse(trigger, condition)
        .map_err(|e| AppError::Validation(format!("condition does not fit trigger type: {e}")))?;

    if let RuleCondition::Item(item) = &parsed {
        if !item.field.is_numeric() && item.operator != CompareOp::Eq {
            return Err(AppError::Validation(format!(
                "field {:?} only supports the eq operator",
                item.field
            )));
        }
    }

    let parsed_action: RuleAction = serde_json::from_value(action.clone())
        .map_err(|e| AppError::Validation(format!("malformed action: {e}")))?;

    if let RuleAction::CreatePurchaseOrder { quantity, .. } = parsed_action {
        if quantity < 1 {
            return Err(AppError::Validation(
                "purchase order quantity must be at least 1".to_string(),
            ));
        }
    }

    Ok(())
}

/// List all rules for an organization, newest last (dispatch order).
pub async fn list_rules(
    pool: &PgPool,
    organization_id: Uuid,
    pagination: &Pagination,
) -> Result<PagedResult<AutomationRule>, AppError> {
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM automation_rules WHERE organization_id = $1",
    )
    .bind(organization_id)
    .fetch_one(pool)
    .await?;

    let rules = sqlx::query_as::<_, AutomationRule>(
        r#"
        SELECT * FROM automation_rules
        WHERE organization_id = $1
        ORDER BY created_at ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(organization_id)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;

    Ok(PagedResult::new(rules, total, pagination))
}

pub async fn find_rule(
    pool: &PgPool,
    organization_id: Uuid,
    id: Uuid,
) -> Result<AutomationRule, AppError> {
    sqlx::query_as::<_, AutomationRule>(
        "SELECT * FROM automation_rules WHERE id = $1 AND organization_id = $2",
    )
    .bind(id)
    .bind(organization_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Automation rule {id} not found")))
}

pub async fn create_rule(
    pool: &PgPool,
    organization_id: Uuid,
    input: &CreateAutomationRule,
    created_by: Uuid,
) -> Result<AutomationRule, AppError> {
    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    validate_rule_shape(input.trigger_type, &input.condition, &input.action)?;

    let rule = sqlx::query_as::<_, AutomationRule>(
        r#"
        INSERT INTO automation_rules
            (organization_id, name, description, is_active, trigger_type, condition, action, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(organization_id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.is_active.unwrap_or(true))
    .bind(input.trigger_type)
    .bind(&input.condition)
    .bind(&input.action)
    .bind(created_by)
    .fetch_one(pool)
    .await?;

    Ok(rule)
}

/// Update a rule, revalidating the merged trigger/condition/action shape.
pub async fn update_rule(
    pool: &PgPool,
    organization_id: Uuid,
    id: Uuid,
    input: &UpdateAutomationRule,
) -> Result<AutomationRule, AppError> {
    let existing = find_rule(pool, organization_id, id).await?;

    let trigger_type = input.trigger_type.unwrap_or(existing.trigger_type);
    let condition = input.condition.as_ref().unwrap_or(&existing.condition);
    let action = input.action.as_ref().unwrap_or(&existing.action);
    validate_rule_shape(trigger_type, condition, action)?;

    let name = input.name.as_deref().unwrap_or(&existing.name);
    let description = input
        .description
        .as_deref()
        .or(existing.description.as_deref());
    let is_active = input.is_active.unwrap_or(existing.is_active);

    let rule = sqlx::query_as::<_, AutomationRule>(
        r#"
        UPDATE automation_rules
        SET name = $1, description = $2, is_active = $3, trigger_type = $4,
            condition = $5, action = $6, updated_at = NOW()
        WHERE id = $7 AND organization_id = $8
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(description)
    .bind(is_active)
    .bind(trigger_type)
    .bind(condition)
    .bind(action)
    .bind(id)
    .bind(organization_id)
    .fetch_one(pool)
    .await?;

    Ok(rule)
}

pub async fn delete_rule(pool: &PgPool, organization_id: Uuid, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query(
        "DELETE FROM automation_rules WHERE id = $1 AND organization_id = $2",
    )
    .bind(id)
    .bind(organization_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Automation rule {id} not found")));
    }
    Ok(())
}

/// List evaluation log entries for an organization, newest first.
pub async fn list_log(
    pool: &PgPool,
    organization_id: Uuid,
    pagination: &Pagination,
) -> Result<PagedResult<AutomationLogEntry>, AppError> {
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM automation_log WHERE organization_id = $1",
    )
    .bind(organization_id)
    .fetch_one(pool)
    .await?;

    let entries = sqlx::query_as::<_, AutomationLogEntry>(
        r#"
        SELECT * FROM automation_log
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

    Ok(PagedResult::new(entries, total, pagination))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOTIFY: &str = r#"{"type": "SEND_NOTIFICATION", "message": "m"}"#;

    fn notify_action() -> serde_json::Value {
        serde_json::from_str(NOTIFY).unwrap()
    }

    #[test]
    fn valid_stock_rule_shape() {
        let cond = json!({"field": "quantity", "operator": "lt", "value": 10});
        assert!(validate_rule_shape(TriggerType::OnStockLevelChange, &cond, &notify_action()).is_ok());
    }

    #[test]
    fn valid_order_rule_shape() {
        let cond = json!({"orderType": "Sales", "oldStatus": "any", "newStatus": "Shipped"});
        assert!(validate_rule_shape(TriggerType::OnOrderStatusChange, &cond, &notify_action()).is_ok());
    }

    #[test]
    fn condition_shape_must_match_trigger() {
        let order_cond = json!({"orderType": "Sales", "oldStatus": "any", "newStatus": "Shipped"});
        let err =
            validate_rule_shape(TriggerType::OnStockLevelChange, &order_cond, &notify_action())
                .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn categorical_field_rejects_ordering_operators() {
        let cond = json!({"field": "status", "operator": "gt", "value": "In Stock"});
        let err = validate_rule_shape(TriggerType::OnNewInventoryItem, &cond, &notify_action())
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn malformed_action_rejected() {
        let cond = json!({"field": "quantity", "operator": "lt", "value": 10});
        let action = json!({"type": "SEND_EMAIL", "to": "admin"});
        assert!(validate_rule_shape(TriggerType::OnStockLevelChange, &cond, &action).is_err());
    }

    #[test]
    fn zero_quantity_purchase_order_rejected() {
        let cond = json!({"field": "quantity", "operator": "lt", "value": 10});
        let action = json!({
            "type": "CREATE_PURCHASE_ORDER",
            "itemId": "00000000-0000-0000-0000-000000000000",
            "quantity": 0
        });
        assert!(validate_rule_shape(TriggerType::OnStockLevelChange, &cond, &action).is_err());
    }
}
