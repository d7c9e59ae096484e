//! Trigger dispatcher: walks the active rule list for one event.
//!
//! Rules are fetched once per dispatch into an immutable in-memory snapshot,
//! so concurrent rule edits cannot be observed mid-cycle. Evaluation order
//! is insertion order; there is no priority system, and repeated firings of
//! the same trigger are each dispatched independently (at-least-once
//! semantics, no deduplication).

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::automation::AutomationRule;
use crate::services::evaluator::{self, TriggerEvent};
use crate::services::executor;

/// Counters for one dispatch cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchOutcome {
    pub rules_evaluated: usize,
    pub rules_matched: usize,
    pub actions_succeeded: usize,
    pub actions_failed: usize,
}

/// Evaluate all active rules for the organization against `event`, executing
/// the actions of those that match. One rule's action failure is recorded
/// and does not block the remaining rules.
pub async fn dispatch(
    pool: &PgPool,
    organization_id: Uuid,
    event: &TriggerEvent,
) -> Result<DispatchOutcome, AppError> {
    let trigger = event.trigger_type();

    // Copy-on-read snapshot in insertion order.
    let rules = sqlx::query_as::<_, AutomationRule>(
        r#"
        SELECT * FROM automation_rules
        WHERE organization_id = $1 AND trigger_type = $2 AND is_active = true
        ORDER BY created_at ASC
        "#,
    )
    .bind(organization_id)
    .bind(trigger)
    .fetch_all(pool)
    .await?;

    let mut outcome = DispatchOutcome::default();

    for rule in &rules {
        outcome.rules_evaluated += 1;
        let matched = evaluator::matches(event, rule.trigger_type, &rule.condition);

        let (action_ok, detail) = if matched {
            outcome.rules_matched += 1;
            match executor::execute(pool, rule, event).await {
                Ok(()) => {
                    outcome.actions_succeeded += 1;
                    tracing::debug!(rule_id = %rule.id, rule = %rule.name, "automation action executed");
                    (Some(true), None)
                }
                Err(e) => {
                    outcome.actions_failed += 1;
                    tracing::warn!(rule_id = %rule.id, rule = %rule.name, error = %e, "automation action failed");
                    (Some(false), Some(e.to_string()))
                }
            }
        } else {
            (None, None)
        };

        record_evaluation(pool, organization_id, rule, matched, action_ok, detail).await;
    }

    Ok(outcome)
}

/// Best-effort automation log write; a logging failure must not abort the
/// remaining rules.
async fn record_evaluation(
    pool: &PgPool,
    organization_id: Uuid,
    rule: &AutomationRule,
    matched: bool,
    action_ok: Option<bool>,
    detail: Option<String>,
) {
    let result = sqlx::query(
        r#"
        INSERT INTO automation_log (organization_id, rule_id, trigger_type, matched, action_ok, detail)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(organization_id)
    .bind(rule.id)
    .bind(rule.trigger_type)
    .bind(matched)
    .bind(action_ok)
    .bind(detail)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!(rule_id = %rule.id, error = %e, "failed to write automation log entry");
    }
}
