//! Pre- and post-call webhook pipelines.
//!
//! Each pipeline sequences the resolution stages for one webhook; the
//! stages depend on each other's output (a call log needs the resolved
//! ids), so data-access calls are awaited in order, never raced.

use sqlx::SqlitePool;
use tracing::warn;

use database::models::Patient;

use crate::bot_resolver::{self, BotRef};
use crate::patient_resolver::{self, PatientLookup, ResolvedPatient};
use crate::payload::WebhookPayload;
use crate::recorder;
use crate::{CallflowError, Result};

/// Outcome of the pre-call pipeline: the context to inject into the call.
#[derive(Debug, Clone)]
pub struct PreCallOutcome {
    pub patient: Option<Patient>,
    pub context: String,
    /// True when the context is demo data rather than an identity match.
    pub demo: bool,
}

/// Outcome of the post-call pipeline.
#[derive(Debug, Clone)]
pub struct PostCallOutcome {
    /// Storage id of the recorded call log.
    pub call_log_id: i64,
    /// How the bot resolved.
    pub bot: BotRef,
    /// How the patient resolved.
    pub patient: ResolvedPatient,
}

/// Run the pre-call pipeline: look the caller up and build the context
/// string. Never fails on identification; unknown callers get the demo
/// fallback.
pub async fn pre_call(pool: &SqlitePool, payload: &WebhookPayload) -> Result<PreCallOutcome> {
    let PatientLookup {
        patient,
        context,
        demo,
    } = patient_resolver::lookup_patient(
        pool,
        payload.from.as_deref(),
        payload.medical_id.as_deref(),
    )
    .await?;

    Ok(PreCallOutcome {
        patient,
        context,
        demo,
    })
}

/// Run the post-call pipeline: resolve the bot, resolve the patient, record
/// the call.
///
/// A payload from which no bot can be identified is rejected. Patient
/// resolution may degrade to an unlinked record, but a payload with no
/// patient identification at all is rejected before anything is written.
pub async fn post_call(pool: &SqlitePool, payload: &WebhookPayload) -> Result<PostCallOutcome> {
    let bot = bot_resolver::resolve_bot(
        pool,
        payload.bot_id.as_deref(),
        payload.bot_name.as_deref(),
        payload.summary.as_deref(),
    )
    .await?
    .ok_or_else(|| {
        CallflowError::BotResolution("no bot identifier or name in payload".to_string())
    })?;

    if matches!(bot, BotRef::Placeholder { .. }) {
        warn!(name = bot.display_name(), "recording call against placeholder bot");
    }

    let patient = patient_resolver::resolve_post_call(pool, payload).await?;

    let call_log_id = recorder::record_call(pool, Some(&bot), patient.storage_id(), payload).await?;

    Ok(PostCallOutcome {
        call_log_id,
        bot,
        patient,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::models::{NewBot, NewPatient};
    use database::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn pre_call_matches_known_phone() {
        let db = test_db().await;
        database::patient::create_patient(
            db.pool(),
            &NewPatient {
                medical_id: "MED001".to_string(),
                name: "John Doe".to_string(),
                phone: Some("+15551234567".to_string()),
            },
        )
        .await
        .unwrap();

        let payload = WebhookPayload {
            from: Some("+15551234567".to_string()),
            ..Default::default()
        };
        let outcome = pre_call(db.pool(), &payload).await.unwrap();

        assert!(!outcome.demo);
        assert_eq!(outcome.patient.unwrap().medical_id, "MED001");
        assert!(outcome.context.starts_with("Patient Information"));
    }

    #[tokio::test]
    async fn post_call_without_bot_identification_is_rejected() {
        let db = test_db().await;

        let payload = WebhookPayload {
            summary: Some("Routine call, nothing to report.".to_string()),
            medical_id: Some("MED001".to_string()),
            ..Default::default()
        };
        let result = post_call(db.pool(), &payload).await;

        assert!(matches!(result, Err(CallflowError::BotResolution(_))));
    }

    #[tokio::test]
    async fn post_call_happy_path_links_bot_and_patient() {
        let db = test_db().await;
        let bot = database::bot::create_bot(
            db.pool(),
            &NewBot {
                uid: "agent_001".to_string(),
                name: "Dr. Sarah".to_string(),
                prompt: "p".to_string(),
                domain: "medical".to_string(),
            },
        )
        .await
        .unwrap();
        let patient = database::patient::create_patient(
            db.pool(),
            &NewPatient {
                medical_id: "MED042".to_string(),
                name: "Jane Roe".to_string(),
                phone: None,
            },
        )
        .await
        .unwrap();

        let payload = WebhookPayload {
            call_id: Some("CA900".to_string()),
            bot_id: Some("agent_001".to_string()),
            transcript: Some("Caller: it's MED042 confirmed, thanks".to_string()),
            summary: Some("Refill confirmed.".to_string()),
            ..Default::default()
        };
        let outcome = post_call(db.pool(), &payload).await.unwrap();

        assert_eq!(outcome.bot.storage_id(), Some(bot.id));
        assert_eq!(outcome.patient.storage_id(), Some(patient.id));

        let logs = database::call_log::list_call_logs(db.pool(), None, 10)
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].id, outcome.call_log_id);
        assert_eq!(logs[0].bot_id, Some(bot.id));
        assert_eq!(logs[0].patient_id, Some(patient.id));
    }

    #[tokio::test]
    async fn post_call_created_patient_is_linked() {
        let db = test_db().await;

        let payload = WebhookPayload {
            bot_id: Some("ghost_bot".to_string()),
            bot_name: Some("Ghost".to_string()),
            customer_name: Some("New Caller".to_string()),
            summary: Some("First contact.".to_string()),
            ..Default::default()
        };
        let outcome = post_call(db.pool(), &payload).await.unwrap();

        let ResolvedPatient::Created(created) = &outcome.patient else {
            panic!("expected created patient");
        };

        let logs = database::call_log::list_call_logs(db.pool(), None, 10)
            .await
            .unwrap();
        assert_eq!(logs[0].patient_id, Some(created.id));
        // Unknown bot degrades to the placeholder; the event is still logged.
        assert!(matches!(outcome.bot, BotRef::Placeholder { .. }));
        assert!(logs[0].bot_id.is_none());
    }
}
