//! Placeholder substitution for action message templates.

use crate::services::evaluator::TriggerEvent;

/// Values available to a message template for one event. Tokens the event
/// has no value for render as the empty string, so no literal `{...}`
/// survives in the output.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub item_name: String,
    pub sku: String,
    pub quantity: String,
    pub old_status: String,
    pub new_status: String,
}

impl TemplateContext {
    pub fn from_event(event: &TriggerEvent) -> Self {
        match event {
            TriggerEvent::StockLevelChange { item, .. } => Self {
                item_name: item.name.clone(),
                sku: item.sku.clone(),
                quantity: item.quantity.to_string(),
                old_status: String::new(),
                new_status: item.status.clone(),
            },
            TriggerEvent::NewInventoryItem(item) => Self {
                item_name: item.name.clone(),
                sku: item.sku.clone(),
                quantity: item.quantity.to_string(),
                old_status: String::new(),
                new_status: item.status.clone(),
            },
            TriggerEvent::OrderStatusChange(order) => Self {
                item_name: order.item_name.clone().unwrap_or_default(),
                sku: order.item_sku.clone().unwrap_or_default(),
                quantity: order.quantity.to_string(),
                old_status: order.old_status.clone(),
                new_status: order.new_status.clone(),
            },
        }
    }

    /// Substitute all five placeholder tokens into `template`.
    ///
    /// Substitution is sequential in the order below, so a field value that
    /// itself contains a later token's literal text (an item named `{sku}`,
    /// say) is substituted again by the following pass.
    pub fn render(&self, template: &str) -> String {
        template
            .replace("{itemName}", &self.item_name)
            .replace("{sku}", &self.sku)
            .replace("{quantity}", &self.quantity)
            .replace("{oldStatus}", &self.old_status)
            .replace("{newStatus}", &self.new_status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::OrderType;
    use crate::services::evaluator::{ItemSnapshot, OrderSnapshot};
    use uuid::Uuid;

    #[test]
    fn all_tokens_replaced() {
        let ctx = TemplateContext {
            item_name: "Widget".to_string(),
            sku: "W-1".to_string(),
            quantity: "3".to_string(),
            old_status: "In Stock".to_string(),
            new_status: "Low Stock".to_string(),
        };
        let rendered = ctx.render(
            "{itemName} ({sku}) x{quantity} went from {oldStatus} to {newStatus}",
        );
        assert_eq!(rendered, "Widget (W-1) x3 went from In Stock to Low Stock");
        assert!(!rendered.contains('{'));
        assert!(!rendered.contains('}'));
    }

    #[test]
    fn stock_event_context() {
        let event = TriggerEvent::StockLevelChange {
            item: ItemSnapshot {
                id: Uuid::new_v4(),
                name: "Widget".to_string(),
                sku: "W-1".to_string(),
                quantity: 5,
                status: "Low Stock".to_string(),
                category: None,
                folder_id: None,
                unit_cost: 1.0,
                retail_price: 2.0,
            },
            previous_quantity: 12,
        };
        let ctx = TemplateContext::from_event(&event);
        assert_eq!(ctx.render("{itemName} low: {quantity} left"), "Widget low: 5 left");
        // Stock events have no prior status; the token renders empty.
        assert_eq!(ctx.render("was [{oldStatus}]"), "was []");
    }

    #[test]
    fn order_event_context() {
        let event = TriggerEvent::OrderStatusChange(OrderSnapshot {
            order_type: OrderType::Sales,
            old_status: "Processing".to_string(),
            new_status: "Shipped".to_string(),
            item_name: Some("Widget".to_string()),
            item_sku: Some("W-1".to_string()),
            quantity: 2,
        });
        let ctx = TemplateContext::from_event(&event);
        assert_eq!(
            ctx.render("{sku}: {oldStatus} -> {newStatus}"),
            "W-1: Processing -> Shipped"
        );
    }

    #[test]
    fn template_without_tokens_is_unchanged() {
        let ctx = TemplateContext::default();
        assert_eq!(ctx.render("plain message"), "plain message");
    }

    #[test]
    fn substitution_is_sequential() {
        // A value containing a later token's literal text is re-substituted
        // by the following pass.
        let ctx = TemplateContext {
            item_name: "{sku}".to_string(),
            sku: "W-1".to_string(),
            ..TemplateContext::default()
        };
        assert_eq!(ctx.render("{itemName}"), "W-1");
    }
}
