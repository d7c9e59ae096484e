//! Inventory item model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Stock status derived from quantity vs the low-stock threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "item_status")]
pub enum ItemStatus {
    #[sqlx(rename = "In Stock")]
    #[serde(rename = "In Stock")]
    InStock,
    #[sqlx(rename = "Low Stock")]
    #[serde(rename = "Low Stock")]
    LowStock,
    #[sqlx(rename = "Out of Stock")]
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "In Stock",
            Self::LowStock => "Low Stock",
            Self::OutOfStock => "Out of Stock",
        }
    }

    /// Derive the status for a quantity against a low-stock threshold.
    pub fn for_quantity(quantity: i64, low_stock_threshold: i64) -> Self {
        if quantity <= 0 {
            Self::OutOfStock
        } else if quantity <= low_stock_threshold {
            Self::LowStock
        } else {
            Self::InStock
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventoryItem {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub folder_id: Option<Uuid>,
    pub quantity: i64,
    pub low_stock_threshold: i64,
    pub unit_cost: f64,
    pub retail_price: f64,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateItem {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub folder_id: Option<Uuid>,
    #[validate(range(min = 0))]
    pub quantity: Option<i64>,
    #[validate(range(min = 0))]
    pub low_stock_threshold: Option<i64>,
    #[validate(range(min = 0.0))]
    pub unit_cost: Option<f64>,
    #[validate(range(min = 0.0))]
    pub retail_price: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateItem {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub folder_id: Option<Uuid>,
    pub low_stock_threshold: Option<i64>,
    pub unit_cost: Option<f64>,
    pub retail_price: Option<f64>,
}

/// Relative stock adjustment applied by `POST /items/{id}/adjust`.
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustStock {
    pub change: i64,
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_derivation() {
        assert_eq!(ItemStatus::for_quantity(0, 5), ItemStatus::OutOfStock);
        assert_eq!(ItemStatus::for_quantity(-3, 5), ItemStatus::OutOfStock);
        assert_eq!(ItemStatus::for_quantity(3, 5), ItemStatus::LowStock);
        assert_eq!(ItemStatus::for_quantity(5, 5), ItemStatus::LowStock);
        assert_eq!(ItemStatus::for_quantity(6, 5), ItemStatus::InStock);
    }

    #[test]
    fn status_serializes_with_spaces() {
        let json = serde_json::to_string(&ItemStatus::LowStock).unwrap();
        assert_eq!(json, "\"Low Stock\"");
        assert_eq!(ItemStatus::LowStock.as_str(), "Low Stock");
    }
}
