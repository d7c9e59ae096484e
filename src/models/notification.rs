//! In-app notification and email outbox models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub message: String,
    pub rule_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Queued outbound email. Delivery is handled by an external collaborator
/// draining this table; the action executor only enqueues.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OutboxEmail {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub rule_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
