//! Call event recording.

use sqlx::SqlitePool;
use tracing::info;

use database::models::NewCallLog;

use crate::bot_resolver::BotRef;
use crate::payload::WebhookPayload;
use crate::Result;

/// Status recorded when the platform reports none.
pub const DEFAULT_STATUS: &str = "completed";

/// Duration recorded when a post-call payload carries no timing.
pub const DEFAULT_DURATION_SECS: i64 = 30;

/// Persist one immutable call log for a processed webhook.
///
/// `bot` and `patient_id` may be absent when resolution degraded; the event
/// is recorded regardless. Placeholder bots have no storage row, so their
/// calls are stored unlinked.
pub async fn record_call(
    pool: &SqlitePool,
    bot: Option<&BotRef>,
    patient_id: Option<i64>,
    payload: &WebhookPayload,
) -> Result<i64> {
    let log = NewCallLog {
        bot_id: bot.and_then(BotRef::storage_id),
        patient_id,
        call_sid: payload.call_id.clone(),
        transcript: payload.transcript.clone(),
        summary: payload.summary.clone(),
        duration: Some(
            payload
                .duration
                .map(|secs| secs.round() as i64)
                .unwrap_or(DEFAULT_DURATION_SECS),
        ),
        status: payload
            .status
            .clone()
            .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
        metadata: payload.metadata.as_ref().map(|v| v.to_string()),
        function_calls: payload.function_calls.as_ref().map(|v| v.to_string()),
    };

    let id = database::call_log::insert_call_log(pool, &log).await?;
    info!(call_log_id = id, call_sid = ?payload.call_id, "call logged");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::Database;
    use serde_json::json;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn applies_defaults_for_missing_fields() {
        let db = test_db().await;

        let payload = WebhookPayload {
            call_id: Some("CA1".to_string()),
            ..Default::default()
        };
        record_call(db.pool(), None, None, &payload).await.unwrap();

        let logs = database::call_log::list_call_logs(db.pool(), None, 10)
            .await
            .unwrap();
        assert_eq!(logs[0].status, DEFAULT_STATUS);
        assert_eq!(logs[0].duration, Some(DEFAULT_DURATION_SECS));
        assert!(logs[0].bot_id.is_none());
    }

    #[tokio::test]
    async fn serializes_structured_fields() {
        let db = test_db().await;

        let payload = WebhookPayload {
            call_id: Some("CA2".to_string()),
            duration: Some(95.4),
            status: Some("failed".to_string()),
            metadata: Some(json!({"region": "us-east"})),
            function_calls: Some(json!([{"name": "fetch_patient"}])),
            ..Default::default()
        };
        record_call(db.pool(), None, None, &payload).await.unwrap();

        let logs = database::call_log::list_call_logs(db.pool(), None, 10)
            .await
            .unwrap();
        assert_eq!(logs[0].status, "failed");
        assert_eq!(logs[0].duration, Some(95));
        assert_eq!(logs[0].metadata.as_deref(), Some(r#"{"region":"us-east"}"#));
    }

    #[tokio::test]
    async fn placeholder_bot_recorded_unlinked() {
        let db = test_db().await;

        let bot = BotRef::Placeholder {
            name: "Night Desk".to_string(),
        };
        let payload = WebhookPayload {
            call_id: Some("CA3".to_string()),
            ..Default::default()
        };
        record_call(db.pool(), Some(&bot), None, &payload).await.unwrap();

        let logs = database::call_log::list_call_logs(db.pool(), None, 10)
            .await
            .unwrap();
        assert!(logs[0].bot_id.is_none());
    }
}
