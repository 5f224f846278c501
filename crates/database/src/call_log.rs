//! Call log persistence.

use sqlx::SqlitePool;

use crate::models::{CallLogView, NewCallLog};
use crate::Result;

/// Insert a call log row and return its storage id.
///
/// Rows are immutable once inserted; there is no update path.
pub async fn insert_call_log(pool: &SqlitePool, log: &NewCallLog) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO call_logs (bot_id, patient_id, call_sid, transcript, summary,
                               duration, status, metadata, function_calls)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(log.bot_id)
    .bind(log.patient_id)
    .bind(&log.call_sid)
    .bind(&log.transcript)
    .bind(&log.summary)
    .bind(log.duration)
    .bind(&log.status)
    .bind(&log.metadata)
    .bind(&log.function_calls)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// List call logs, most recent first, joined with bot and patient names.
///
/// `bot_id` narrows the listing to one bot when given.
pub async fn list_call_logs(
    pool: &SqlitePool,
    bot_id: Option<i64>,
    limit: i64,
) -> Result<Vec<CallLogView>> {
    let rows = sqlx::query_as::<_, CallLogView>(
        r#"
        SELECT c.id, c.bot_id, c.patient_id, c.call_sid, c.transcript, c.summary,
               c.duration, c.status, c.metadata, c.function_calls, c.created_at,
               b.name AS bot_name, b.uid AS bot_uid,
               p.name AS patient_name, p.medical_id AS patient_medical_id
        FROM call_logs c
        LEFT JOIN bots b ON b.id = c.bot_id
        LEFT JOIN patients p ON p.id = c.patient_id
        WHERE (? IS NULL OR c.bot_id = ?)
        ORDER BY c.created_at DESC, c.id DESC
        LIMIT ?
        "#,
    )
    .bind(bot_id)
    .bind(bot_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
