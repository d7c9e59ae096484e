//! Sales and purchase order model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "order_type")]
pub enum OrderType {
    Sales,
    Purchase,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sales => "Sales",
            Self::Purchase => "Purchase",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "order_status")]
pub enum OrderStatus {
    Draft,
    Pending,
    Processing,
    Shipped,
    Delivered,
    Received,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Received => "Received",
            Self::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub order_number: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub counterparty_name: Option<String>,
    pub item_id: Option<Uuid>,
    pub quantity: i64,
    pub unit_price: f64,
    pub total: f64,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrder {
    pub order_type: OrderType,
    pub counterparty_name: Option<String>,
    pub item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i64,
    #[validate(range(min = 0.0))]
    pub unit_price: Option<f64>,
    pub notes: Option<String>,
}

/// Request body for `PATCH /orders/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionOrder {
    pub new_status: OrderStatus,
}
