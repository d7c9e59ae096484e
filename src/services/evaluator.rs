//! Condition evaluator for automation rules.
//!
//! Pure matching logic: given a trigger event snapshot and a rule's raw
//! condition, decide whether the rule fires. Malformed or type-mismatched
//! conditions never error; they evaluate to a non-match.
//!
//! This module contains no database access — the dispatcher is responsible
//! for fetching rules and executing the actions of those that match.

use uuid::Uuid;

use crate::models::automation::{
    CompareOp, ItemCondition, ItemField, RuleCondition, TriggerType,
};
use crate::models::order::OrderType;

/// Inventory item state captured at the moment a trigger fires.
#[derive(Debug, Clone)]
pub struct ItemSnapshot {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub quantity: i64,
    pub status: String,
    pub category: Option<String>,
    pub folder_id: Option<Uuid>,
    pub unit_cost: f64,
    pub retail_price: f64,
}

/// Order state around a status transition.
#[derive(Debug, Clone)]
pub struct OrderSnapshot {
    pub order_type: OrderType,
    pub old_status: String,
    pub new_status: String,
    pub item_name: Option<String>,
    pub item_sku: Option<String>,
    pub quantity: i64,
}

/// An event that may fire automation rules.
#[derive(Debug, Clone)]
pub enum TriggerEvent {
    StockLevelChange {
        item: ItemSnapshot,
        previous_quantity: i64,
    },
    OrderStatusChange(OrderSnapshot),
    NewInventoryItem(ItemSnapshot),
}

impl TriggerEvent {
    pub fn trigger_type(&self) -> TriggerType {
        match self {
            Self::StockLevelChange { .. } => TriggerType::OnStockLevelChange,
            Self::OrderStatusChange(_) => TriggerType::OnOrderStatusChange,
            Self::NewInventoryItem(_) => TriggerType::OnNewInventoryItem,
        }
    }
}

/// Evaluate a rule's raw condition against an event.
///
/// Returns false (never an error) when the condition does not parse for the
/// rule's trigger type, when the trigger type does not match the event, or
/// when an operand cannot be coerced for a numeric comparison.
pub fn matches(event: &TriggerEvent, trigger: TriggerType, raw_condition: &serde_json::Value) -> bool {
    if event.trigger_type() != trigger {
        return false;
    }
    let Ok(condition) = RuleCondition::parse(trigger, raw_condition) else {
        return false;
    };

    match (event, &condition) {
        (
            TriggerEvent::StockLevelChange { item, .. } | TriggerEvent::NewInventoryItem(item),
            RuleCondition::Item(cond),
        ) => item_matches(item, cond),
        (TriggerEvent::OrderStatusChange(order), RuleCondition::OrderStatus(cond)) => {
            cond.order_type == order.order_type
                && cond.new_status == order.new_status
                && (cond.old_status_is_wildcard() || cond.old_status == order.old_status)
        }
        _ => false,
    }
}

fn item_matches(item: &ItemSnapshot, cond: &ItemCondition) -> bool {
    match cond.field {
        ItemField::Quantity => numeric_compare(item.quantity as f64, cond.operator, &cond.value),
        ItemField::UnitCost => numeric_compare(item.unit_cost, cond.operator, &cond.value),
        ItemField::RetailPrice => numeric_compare(item.retail_price, cond.operator, &cond.value),
        ItemField::Status => categorical_eq(Some(item.status.as_str()), cond),
        ItemField::Category => categorical_eq(item.category.as_deref(), cond),
        ItemField::FolderId => {
            let folder = item.folder_id.map(|id| id.to_string());
            categorical_eq(folder.as_deref(), cond)
        }
    }
}

/// Case-sensitive exact string equality; only `eq` is meaningful for
/// categorical fields, any other operator is a non-match.
fn categorical_eq(actual: Option<&str>, cond: &ItemCondition) -> bool {
    if cond.operator != CompareOp::Eq {
        return false;
    }
    match (actual, cond.value.as_str()) {
        (Some(a), Some(expected)) => a == expected,
        _ => false,
    }
}

fn numeric_compare(lhs: f64, op: CompareOp, value: &serde_json::Value) -> bool {
    let Some(rhs) = coerce_numeric(value) else {
        return false;
    };
    match op {
        CompareOp::Lt => lhs < rhs,
        CompareOp::Eq => lhs == rhs,
        CompareOp::Gt => lhs > rhs,
    }
}

/// Coerce a JSON scalar to f64. Numbers pass through, strings are parsed;
/// anything else is non-numeric.
fn coerce_numeric(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn widget(quantity: i64) -> ItemSnapshot {
        ItemSnapshot {
            id: Uuid::new_v4(),
            name: "Widget".to_string(),
            sku: "W-1".to_string(),
            quantity,
            status: "In Stock".to_string(),
            category: Some("Hardware".to_string()),
            folder_id: None,
            unit_cost: 2.5,
            retail_price: 9.99,
        }
    }

    fn stock_event(quantity: i64) -> TriggerEvent {
        TriggerEvent::StockLevelChange {
            item: widget(quantity),
            previous_quantity: quantity + 1,
        }
    }

    fn order_event(old: &str, new: &str) -> TriggerEvent {
        TriggerEvent::OrderStatusChange(OrderSnapshot {
            order_type: OrderType::Sales,
            old_status: old.to_string(),
            new_status: new.to_string(),
            item_name: Some("Widget".to_string()),
            item_sku: Some("W-1".to_string()),
            quantity: 3,
        })
    }

    // -- Numeric comparisons --------------------------------------------------

    #[test]
    fn quantity_lt_matches_below_threshold() {
        let cond = json!({"field": "quantity", "operator": "lt", "value": 10});
        assert!(matches(&stock_event(5), TriggerType::OnStockLevelChange, &cond));
        assert!(!matches(&stock_event(20), TriggerType::OnStockLevelChange, &cond));
        assert!(!matches(&stock_event(10), TriggerType::OnStockLevelChange, &cond));
    }

    #[test]
    fn gt_and_eq_operators() {
        let gt = json!({"field": "quantity", "operator": "gt", "value": 10});
        assert!(matches(&stock_event(11), TriggerType::OnStockLevelChange, &gt));
        assert!(!matches(&stock_event(10), TriggerType::OnStockLevelChange, &gt));

        let eq = json!({"field": "quantity", "operator": "eq", "value": 10});
        assert!(matches(&stock_event(10), TriggerType::OnStockLevelChange, &eq));
        assert!(!matches(&stock_event(9), TriggerType::OnStockLevelChange, &eq));
    }

    #[test]
    fn numeric_value_coerced_from_string() {
        let cond = json!({"field": "quantity", "operator": "lt", "value": "10"});
        assert!(matches(&stock_event(5), TriggerType::OnStockLevelChange, &cond));

        let cost = json!({"field": "unitCost", "operator": "gt", "value": " 2.0 "});
        assert!(matches(&stock_event(5), TriggerType::OnStockLevelChange, &cost));
    }

    #[test]
    fn non_numeric_operand_is_non_match() {
        for value in [json!("not-a-number"), json!(true), json!(null), json!([1])] {
            let cond = json!({"field": "quantity", "operator": "lt", "value": value});
            assert!(
                !matches(&stock_event(5), TriggerType::OnStockLevelChange, &cond),
                "value {cond} should not match"
            );
        }
    }

    // -- Categorical comparisons ----------------------------------------------

    #[test]
    fn status_eq_is_case_sensitive() {
        let cond = json!({"field": "status", "operator": "eq", "value": "In Stock"});
        assert!(matches(&stock_event(50), TriggerType::OnStockLevelChange, &cond));

        let wrong_case = json!({"field": "status", "operator": "eq", "value": "in stock"});
        assert!(!matches(&stock_event(50), TriggerType::OnStockLevelChange, &wrong_case));
    }

    #[test]
    fn categorical_field_with_ordering_operator_is_non_match() {
        let cond = json!({"field": "category", "operator": "lt", "value": "Hardware"});
        assert!(!matches(&stock_event(5), TriggerType::OnStockLevelChange, &cond));
    }

    #[test]
    fn folder_id_compares_against_uuid_string() {
        let folder = Uuid::new_v4();
        let mut item = widget(5);
        item.folder_id = Some(folder);
        let event = TriggerEvent::NewInventoryItem(item);

        let cond = json!({"field": "folderId", "operator": "eq", "value": folder.to_string()});
        assert!(matches(&event, TriggerType::OnNewInventoryItem, &cond));

        let other = json!({"field": "folderId", "operator": "eq", "value": Uuid::new_v4().to_string()});
        assert!(!matches(&event, TriggerType::OnNewInventoryItem, &other));
    }

    #[test]
    fn missing_categorical_value_is_non_match() {
        // No folder assigned: any folderId condition fails.
        let event = TriggerEvent::NewInventoryItem(widget(5));
        let cond = json!({"field": "folderId", "operator": "eq", "value": Uuid::nil().to_string()});
        assert!(!matches(&event, TriggerType::OnNewInventoryItem, &cond));
    }

    // -- Order status conditions ----------------------------------------------

    #[test]
    fn wildcard_old_status_depends_only_on_new_status() {
        let cond = json!({"orderType": "Sales", "oldStatus": "any", "newStatus": "Shipped"});
        for prior in ["Draft", "Pending", "Processing"] {
            assert!(matches(
                &order_event(prior, "Shipped"),
                TriggerType::OnOrderStatusChange,
                &cond
            ));
        }
        assert!(!matches(
            &order_event("Processing", "Delivered"),
            TriggerType::OnOrderStatusChange,
            &cond
        ));
    }

    #[test]
    fn explicit_old_status_requires_exact_equality() {
        let cond = json!({"orderType": "Sales", "oldStatus": "Processing", "newStatus": "Shipped"});
        assert!(matches(
            &order_event("Processing", "Shipped"),
            TriggerType::OnOrderStatusChange,
            &cond
        ));
        assert!(!matches(
            &order_event("Pending", "Shipped"),
            TriggerType::OnOrderStatusChange,
            &cond
        ));
    }

    #[test]
    fn order_type_must_match() {
        let cond = json!({"orderType": "Purchase", "oldStatus": "any", "newStatus": "Shipped"});
        assert!(!matches(
            &order_event("Processing", "Shipped"),
            TriggerType::OnOrderStatusChange,
            &cond
        ));
    }

    // -- Shape and trigger mismatches -----------------------------------------

    #[test]
    fn malformed_condition_is_non_match_not_error() {
        for cond in [
            json!({"field": "quantity"}),
            json!({"field": "warehouse", "operator": "lt", "value": 1}),
            json!({"field": "quantity", "operator": "between", "value": 1}),
            json!("garbage"),
            json!(null),
        ] {
            assert!(!matches(&stock_event(5), TriggerType::OnStockLevelChange, &cond));
        }
    }

    #[test]
    fn order_condition_under_stock_trigger_is_non_match() {
        let cond = json!({"orderType": "Sales", "oldStatus": "any", "newStatus": "Shipped"});
        assert!(!matches(&stock_event(5), TriggerType::OnStockLevelChange, &cond));
    }

    #[test]
    fn trigger_event_mismatch_is_non_match() {
        let cond = json!({"field": "quantity", "operator": "lt", "value": 10});
        // Rule is wired for new items but the event is a stock change.
        assert!(!matches(&stock_event(5), TriggerType::OnNewInventoryItem, &cond));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let cond = json!({"field": "quantity", "operator": "lt", "value": 10});
        let event = stock_event(5);
        let first = matches(&event, TriggerType::OnStockLevelChange, &cond);
        let second = matches(&event, TriggerType::OnStockLevelChange, &cond);
        assert_eq!(first, second);
        assert!(first);
    }
}
