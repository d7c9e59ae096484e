//! Automation rule model: triggers, conditions, and actions.
//!
//! Conditions and actions are stored as JSONB whose shape depends on the
//! rule's trigger type. They are parsed into the tagged enums below at the
//! evaluator and executor boundaries, so malformed or mismatched payloads
//! surface as explicit parse failures rather than ad hoc field checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::order::OrderType;

/// Event class a rule listens for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "trigger_type")]
pub enum TriggerType {
    #[sqlx(rename = "ON_STOCK_LEVEL_CHANGE")]
    #[serde(rename = "ON_STOCK_LEVEL_CHANGE")]
    OnStockLevelChange,
    #[sqlx(rename = "ON_ORDER_STATUS_CHANGE")]
    #[serde(rename = "ON_ORDER_STATUS_CHANGE")]
    OnOrderStatusChange,
    #[sqlx(rename = "ON_NEW_INVENTORY_ITEM")]
    #[serde(rename = "ON_NEW_INVENTORY_ITEM")]
    OnNewInventoryItem,
}

/// Item attribute an item-shaped condition compares against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ItemField {
    Quantity,
    Status,
    Category,
    FolderId,
    UnitCost,
    RetailPrice,
}

impl ItemField {
    /// Numeric fields support all three comparison operators; categorical
    /// fields support only equality.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Quantity | Self::UnitCost | Self::RetailPrice)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Lt,
    Eq,
    Gt,
}

/// Condition shape for stock-change and new-item triggers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ItemCondition {
    pub field: ItemField,
    pub operator: CompareOp,
    pub value: serde_json::Value,
}

/// Condition shape for the order-status trigger. `old_status` may be the
/// literal `"any"`, which makes the prior status a wildcard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrderStatusCondition {
    pub order_type: OrderType,
    pub old_status: String,
    pub new_status: String,
}

pub const OLD_STATUS_WILDCARD: &str = "any";

impl OrderStatusCondition {
    pub fn old_status_is_wildcard(&self) -> bool {
        self.old_status == OLD_STATUS_WILDCARD
    }
}

/// A rule's condition, typed per trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleCondition {
    Item(ItemCondition),
    OrderStatus(OrderStatusCondition),
}

impl RuleCondition {
    /// Parse a raw condition for a given trigger type. Fails when the JSON
    /// shape does not belong to the trigger's vocabulary.
    pub fn parse(trigger: TriggerType, raw: &serde_json::Value) -> Result<Self, serde_json::Error> {
        match trigger {
            TriggerType::OnStockLevelChange | TriggerType::OnNewInventoryItem => {
                serde_json::from_value::<ItemCondition>(raw.clone()).map(Self::Item)
            }
            TriggerType::OnOrderStatusChange => {
                serde_json::from_value::<OrderStatusCondition>(raw.clone()).map(Self::OrderStatus)
            }
        }
    }
}

/// The effect produced when a rule's condition matches. Message, subject,
/// and body templates support the placeholder tokens `{itemName}`, `{sku}`,
/// `{quantity}`, `{oldStatus}`, and `{newStatus}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum RuleAction {
    #[serde(rename = "SEND_NOTIFICATION")]
    SendNotification { message: String },
    #[serde(rename = "SEND_EMAIL")]
    SendEmail {
        /// `admin`, `manager`, or a literal email address.
        to: String,
        subject: String,
        body: String,
    },
    #[serde(rename = "CREATE_PURCHASE_ORDER", rename_all = "camelCase")]
    CreatePurchaseOrder { item_id: Uuid, quantity: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AutomationRule {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub trigger_type: TriggerType,
    pub condition: serde_json::Value,
    pub action: serde_json::Value,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAutomationRule {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    pub trigger_type: TriggerType,
    pub condition: serde_json::Value,
    pub action: serde_json::Value,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateAutomationRule {
    pub name: Option<String>,
    pub description: Option<String>,
    pub trigger_type: Option<TriggerType>,
    pub condition: Option<serde_json::Value>,
    pub action: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

/// One row per (dispatch, rule) evaluation outcome.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AutomationLogEntry {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub rule_id: Option<Uuid>,
    pub trigger_type: TriggerType,
    pub matched: bool,
    /// None when the condition did not match; otherwise whether the action
    /// completed successfully.
    pub action_ok: Option<bool>,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_condition_parses_for_stock_trigger() {
        let raw = json!({"field": "quantity", "operator": "lt", "value": 10});
        let cond = RuleCondition::parse(TriggerType::OnStockLevelChange, &raw).unwrap();
        assert_eq!(
            cond,
            RuleCondition::Item(ItemCondition {
                field: ItemField::Quantity,
                operator: CompareOp::Lt,
                value: json!(10),
            })
        );
    }

    #[test]
    fn order_condition_parses_for_order_trigger() {
        let raw = json!({"orderType": "Sales", "oldStatus": "any", "newStatus": "Shipped"});
        let cond = RuleCondition::parse(TriggerType::OnOrderStatusChange, &raw).unwrap();
        match cond {
            RuleCondition::OrderStatus(c) => {
                assert_eq!(c.order_type, OrderType::Sales);
                assert!(c.old_status_is_wildcard());
                assert_eq!(c.new_status, "Shipped");
            }
            other => panic!("expected order condition, got {other:?}"),
        }
    }

    #[test]
    fn condition_vocabulary_must_match_trigger() {
        let order_shaped = json!({"orderType": "Sales", "oldStatus": "any", "newStatus": "Shipped"});
        assert!(RuleCondition::parse(TriggerType::OnStockLevelChange, &order_shaped).is_err());

        let item_shaped = json!({"field": "quantity", "operator": "lt", "value": 10});
        assert!(RuleCondition::parse(TriggerType::OnOrderStatusChange, &item_shaped).is_err());
    }

    #[test]
    fn camel_case_fields_round_trip() {
        let raw = json!({"field": "unitCost", "operator": "gt", "value": "4.5"});
        let cond = RuleCondition::parse(TriggerType::OnNewInventoryItem, &raw).unwrap();
        let RuleCondition::Item(c) = cond else {
            panic!("expected item condition")
        };
        assert_eq!(c.field, ItemField::UnitCost);
        assert!(c.field.is_numeric());
        assert!(!ItemField::FolderId.is_numeric());
    }

    #[test]
    fn actions_deserialize_from_tagged_json() {
        let notify: RuleAction =
            serde_json::from_value(json!({"type": "SEND_NOTIFICATION", "message": "hi"})).unwrap();
        assert_eq!(
            notify,
            RuleAction::SendNotification {
                message: "hi".to_string()
            }
        );

        let po: RuleAction = serde_json::from_value(json!({
            "type": "CREATE_PURCHASE_ORDER",
            "itemId": "00000000-0000-0000-0000-000000000000",
            "quantity": 25
        }))
        .unwrap();
        assert_eq!(
            po,
            RuleAction::CreatePurchaseOrder {
                item_id: Uuid::nil(),
                quantity: 25
            }
        );
    }

    #[test]
    fn unknown_action_tag_rejected() {
        let result: Result<RuleAction, _> =
            serde_json::from_value(json!({"type": "LAUNCH_ROCKET", "message": "no"}));
        assert!(result.is_err());
    }
}
