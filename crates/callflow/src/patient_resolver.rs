//! Patient resolution: mapping call identifiers to a patient record.
//!
//! Pre-call lookups ([`lookup_patient`]) build the context string injected
//! into the live call and never fail; an unidentified caller gets a
//! demo-marked fallback. Post-call resolution ([`resolve_post_call`]) digs
//! through every identifier the payload offers, creates a patient from a
//! name hint when nothing matches, and records the call outcome on the
//! matched row.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};

use database::models::{NewPatient, Patient};

use crate::extract;
use crate::payload::WebhookPayload;
use crate::sanitize::{is_valid_medical_id, sanitize_text};
use crate::{CallflowError, Result};

/// Context string when no patient could be identified before the call.
pub const NO_PATIENT_CONTEXT: &str = "No patient data available. Please have the caller provide \
                                      their medical ID during the conversation.";

/// How many transcript characters stand in for a missing summary.
const SUMMARY_FALLBACK_CHARS: usize = 500;

/// A pre-call lookup result: the patient (if any) and the context string to
/// inject into the live call.
#[derive(Debug, Clone)]
pub struct PatientLookup {
    pub patient: Option<Patient>,
    pub context: String,
    /// True when the context is the demo fallback rather than a real
    /// identity match.
    pub demo: bool,
}

/// A post-call resolution result.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedPatient {
    /// An existing record matched one of the payload identifiers.
    Matched(Patient),
    /// No record matched; a new one was created from a name hint.
    Created(Patient),
    /// An identifier was present but matched no record. The call is still
    /// recorded, unlinked.
    Unmatched,
}

impl ResolvedPatient {
    /// Storage id to link call logs against, if any.
    pub fn storage_id(&self) -> Option<i64> {
        match self {
            ResolvedPatient::Matched(p) | ResolvedPatient::Created(p) => Some(p.id),
            ResolvedPatient::Unmatched => None,
        }
    }

    /// The resolved record, if any.
    pub fn patient(&self) -> Option<&Patient> {
        match self {
            ResolvedPatient::Matched(p) | ResolvedPatient::Created(p) => Some(p),
            ResolvedPatient::Unmatched => None,
        }
    }
}

/// Build the full context string for an identified patient, substituting
/// stock phrases for missing optional fields.
pub fn describe_patient(patient: &Patient) -> String {
    format!(
        "Patient Information: Name: {}, Medical ID: {}, Allergies: {}, Current Medications: {}, \
         Medical History: {}, Last Call Summary: {}",
        patient.name,
        patient.medical_id,
        patient.allergies.as_deref().unwrap_or("None reported"),
        patient.current_medications.as_deref().unwrap_or("None"),
        patient.medical_history.as_deref().unwrap_or("No significant history"),
        patient.last_call_summary.as_deref().unwrap_or("No previous calls"),
    )
}

/// Build the explicitly demo-marked context used when no caller identity is
/// available and an arbitrary record is substituted.
fn describe_demo_patient(patient: &Patient) -> String {
    format!(
        "Example Patient Data (for demo): Name: {}, Medical ID: {}. In a real scenario, verify \
         patient identity during the call.",
        patient.name, patient.medical_id,
    )
}

/// Pre-call lookup by medical ID, then phone, then the demo fallback.
///
/// A valid medical ID always wins over the phone number. Never fails on
/// missing identification; the caller gets [`NO_PATIENT_CONTEXT`] when even
/// the fallback has nothing to offer.
pub async fn lookup_patient(
    pool: &SqlitePool,
    from: Option<&str>,
    medical_id: Option<&str>,
) -> Result<PatientLookup> {
    if let Some(id) = medical_id.filter(|id| is_valid_medical_id(id)) {
        let id = id.to_ascii_uppercase();
        if let Some(patient) = database::patient::find_by_medical_id(pool, &id).await? {
            let context = describe_patient(&patient);
            return Ok(PatientLookup {
                patient: Some(patient),
                context,
                demo: false,
            });
        }
    }

    if let Some(from) = from {
        let phone = sanitize_text(from);
        if let Some(patient) = database::patient::find_by_phone(pool, &phone).await? {
            let context = describe_patient(&patient);
            return Ok(PatientLookup {
                patient: Some(patient),
                context,
                demo: false,
            });
        }
    }

    // No identity available. Hand back an arbitrary record, clearly marked,
    // so environments without caller ID still get a working call.
    if let Some(patient) = database::patient::most_recent(pool).await? {
        let context = describe_demo_patient(&patient);
        return Ok(PatientLookup {
            patient: Some(patient),
            context,
            demo: true,
        });
    }

    Ok(PatientLookup {
        patient: None,
        context: NO_PATIENT_CONTEXT.to_string(),
        demo: true,
    })
}

/// Post-call resolution over every identifier the payload offers.
///
/// Identifier precedence: explicit medical ID, caller phone, function-call
/// records, transcript text. A matched patient gets its last-call summary
/// and date updated as part of resolution. When nothing matches but a name
/// hint exists, a patient is created under a freshly synthesized medical
/// ID. A payload with no identifier and no name hint is rejected.
pub async fn resolve_post_call(
    pool: &SqlitePool,
    payload: &WebhookPayload,
) -> Result<ResolvedPatient> {
    let mut identified = false;
    let mut patient = None;

    if let Some(id) = &payload.medical_id {
        identified = true;
        info!(medical_id = %id, "looking up patient by medical ID");
        patient = database::patient::find_by_medical_id(pool, id).await?;
    }

    if patient.is_none() {
        if let Some(from) = &payload.from {
            identified = true;
            patient = database::patient::find_by_phone(pool, &sanitize_text(from)).await?;
        }
    }

    if patient.is_none() {
        if let Some(id) = payload
            .function_calls
            .as_ref()
            .and_then(extract::medical_id_from_function_calls)
        {
            identified = true;
            info!(medical_id = %id, "patient ID recovered from function calls");
            patient = database::patient::find_by_medical_id(pool, &id).await?;
        }
    }

    if patient.is_none() {
        if let Some(id) = payload
            .transcript
            .as_deref()
            .and_then(extract::extract_medical_id)
        {
            identified = true;
            info!(medical_id = %id, "patient ID recovered from transcript");
            patient = database::patient::find_by_medical_id(pool, &id).await?;
        }
    }

    if let Some(patient) = patient {
        if let Some(summary) = call_material(payload) {
            database::patient::record_call_outcome(pool, patient.id, &summary).await?;
        }
        return Ok(ResolvedPatient::Matched(patient));
    }

    let name_hint = payload
        .customer_name
        .clone()
        .or_else(|| payload.summary.as_deref().and_then(extract::extract_patient_name));

    if let Some(name) = name_hint {
        let medical_id = synthesize_medical_id(pool).await?;
        info!(%name, %medical_id, "creating patient for unmatched caller");
        let patient = database::patient::create_patient(
            pool,
            &NewPatient {
                medical_id,
                name,
                phone: payload.from.clone(),
            },
        )
        .await?;
        return Ok(ResolvedPatient::Created(patient));
    }

    if identified {
        warn!("patient identification matched no record");
        return Ok(ResolvedPatient::Unmatched);
    }

    Err(CallflowError::PatientResolution(
        "no patient identifier or name in payload".to_string(),
    ))
}

/// The text recorded on the patient row: explicit summary, else the leading
/// transcript excerpt.
fn call_material(payload: &WebhookPayload) -> Option<String> {
    payload.summary.clone().or_else(|| {
        payload
            .transcript
            .as_ref()
            .map(|t| t.chars().take(SUMMARY_FALLBACK_CHARS).collect())
    })
}

/// Synthesize an unused medical ID within the canonical `MED###` space.
///
/// The starting point is time-derived; collisions probe linearly until a
/// free slot turns up. The UNIQUE column backstops a concurrent insert of
/// the same candidate.
pub async fn synthesize_medical_id(pool: &SqlitePool) -> Result<String> {
    let start = (Utc::now().timestamp().rem_euclid(1000)) as u32;

    for offset in 0..1000 {
        let candidate = format!("MED{:03}", (start + offset) % 1000);
        if !database::patient::medical_id_exists(pool, &candidate).await? {
            return Ok(candidate);
        }
    }

    Err(CallflowError::PatientResolution(
        "medical ID space exhausted".to_string(),
    ))
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

    async fn seed_patient(db: &Database, medical_id: &str, name: &str, phone: Option<&str>) -> Patient {
        database::patient::create_patient(
            db.pool(),
            &NewPatient {
                medical_id: medical_id.to_string(),
                name: name.to_string(),
                phone: phone.map(str::to_string),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn lookup_by_phone_builds_full_context() {
        let db = test_db().await;
        seed_patient(&db, "MED001", "John Doe", Some("+15551234567")).await;

        let lookup = lookup_patient(db.pool(), Some("+15551234567"), None)
            .await
            .unwrap();

        let patient = lookup.patient.unwrap();
        assert_eq!(patient.medical_id, "MED001");
        assert!(!lookup.demo);
        assert!(lookup.context.starts_with("Patient Information: Name: John Doe"));
        assert!(lookup.context.contains("Allergies: None reported"));
        assert!(lookup.context.contains("Last Call Summary: No previous calls"));
    }

    #[tokio::test]
    async fn medical_id_wins_over_phone() {
        let db = test_db().await;
        seed_patient(&db, "MED001", "By Id", None).await;
        seed_patient(&db, "MED002", "By Phone", Some("+15550000001")).await;

        let lookup = lookup_patient(db.pool(), Some("+15550000001"), Some("med001"))
            .await
            .unwrap();

        assert_eq!(lookup.patient.unwrap().name, "By Id");
    }

    #[tokio::test]
    async fn unknown_caller_gets_demo_context() {
        let db = test_db().await;
        seed_patient(&db, "MED009", "Demo Patient", None).await;

        let lookup = lookup_patient(db.pool(), Some("+15559999999"), None)
            .await
            .unwrap();

        assert!(lookup.demo);
        assert!(lookup.context.starts_with("Example Patient Data (for demo)"));
    }

    #[tokio::test]
    async fn empty_table_gets_stock_context() {
        let db = test_db().await;

        let lookup = lookup_patient(db.pool(), None, None).await.unwrap();

        assert!(lookup.patient.is_none());
        assert!(lookup.demo);
        assert_eq!(lookup.context, NO_PATIENT_CONTEXT);
    }

    #[tokio::test]
    async fn post_call_resolves_from_transcript() {
        let db = test_db().await;
        let seeded = seed_patient(&db, "MED042", "Jane Roe", None).await;

        let payload = WebhookPayload {
            transcript: Some("Caller: my ID is med042 confirmed, thanks".to_string()),
            ..Default::default()
        };

        let resolved = resolve_post_call(db.pool(), &payload).await.unwrap();
        assert_eq!(resolved.storage_id(), Some(seeded.id));
    }

    #[tokio::test]
    async fn post_call_match_records_outcome() {
        let db = test_db().await;
        let seeded = seed_patient(&db, "MED001", "John Doe", None).await;

        let payload = WebhookPayload {
            medical_id: Some("MED001".to_string()),
            summary: Some("Asked about refills.".to_string()),
            ..Default::default()
        };

        resolve_post_call(db.pool(), &payload).await.unwrap();

        let updated = database::patient::get_patient(db.pool(), seeded.id).await.unwrap();
        assert_eq!(updated.last_call_summary.as_deref(), Some("Asked about refills."));
        assert!(updated.last_call_date.is_some());
    }

    #[tokio::test]
    async fn post_call_falls_back_to_transcript_excerpt() {
        let db = test_db().await;
        let seeded = seed_patient(&db, "MED001", "John Doe", None).await;

        let long_transcript = "x".repeat(600);
        let payload = WebhookPayload {
            medical_id: Some("MED001".to_string()),
            transcript: Some(long_transcript),
            ..Default::default()
        };

        resolve_post_call(db.pool(), &payload).await.unwrap();

        let updated = database::patient::get_patient(db.pool(), seeded.id).await.unwrap();
        assert_eq!(updated.last_call_summary.unwrap().len(), 500);
    }

    #[tokio::test]
    async fn post_call_function_calls_beat_transcript() {
        let db = test_db().await;
        let by_function = seed_patient(&db, "MED010", "Function Hit", None).await;
        seed_patient(&db, "MED042", "Transcript Hit", None).await;

        let payload = WebhookPayload {
            function_calls: Some(json!([
                {"name": "fetch_patient", "arguments": {"medical_id": "MED010"}}
            ])),
            transcript: Some("mentioned MED042 in passing".to_string()),
            ..Default::default()
        };

        let resolved = resolve_post_call(db.pool(), &payload).await.unwrap();
        assert_eq!(resolved.storage_id(), Some(by_function.id));
    }

    #[tokio::test]
    async fn post_call_phone_beats_transcript_extraction() {
        let db = test_db().await;
        let by_phone = seed_patient(&db, "MED001", "Phone Hit", Some("+15551234567")).await;
        seed_patient(&db, "MED042", "Transcript Hit", None).await;

        let payload = WebhookPayload {
            from: Some("+15551234567".to_string()),
            transcript: Some("mentioned MED042 in passing".to_string()),
            ..Default::default()
        };

        let resolved = resolve_post_call(db.pool(), &payload).await.unwrap();
        assert_eq!(resolved.storage_id(), Some(by_phone.id));
    }

    #[tokio::test]
    async fn post_call_creates_patient_from_name_hint() {
        let db = test_db().await;

        let payload = WebhookPayload {
            customer_name: Some("New Caller".to_string()),
            from: Some("+15557654321".to_string()),
            ..Default::default()
        };

        let resolved = resolve_post_call(db.pool(), &payload).await.unwrap();
        let ResolvedPatient::Created(patient) = resolved else {
            panic!("expected a created patient");
        };
        assert_eq!(patient.name, "New Caller");
        assert!(is_valid_medical_id(&patient.medical_id));
        assert_eq!(patient.phone.as_deref(), Some("+15557654321"));
    }

    #[tokio::test]
    async fn post_call_creates_patient_from_summary_name() {
        let db = test_db().await;

        let payload = WebhookPayload {
            summary: Some("Caller identified the patient as Maria Silva. Refill request.".to_string()),
            ..Default::default()
        };

        let resolved = resolve_post_call(db.pool(), &payload).await.unwrap();
        assert_eq!(resolved.patient().unwrap().name, "Maria Silva");
    }

    #[tokio::test]
    async fn post_call_identified_but_unmatched_degrades() {
        let db = test_db().await;

        let payload = WebhookPayload {
            medical_id: Some("MED777".to_string()),
            ..Default::default()
        };

        let resolved = resolve_post_call(db.pool(), &payload).await.unwrap();
        assert_eq!(resolved, ResolvedPatient::Unmatched);
    }

    #[tokio::test]
    async fn post_call_with_nothing_is_rejected() {
        let db = test_db().await;

        let payload = WebhookPayload::default();
        let result = resolve_post_call(db.pool(), &payload).await;

        assert!(matches!(result, Err(CallflowError::PatientResolution(_))));
    }

    #[tokio::test]
    async fn synthesized_ids_are_unique_and_canonical() {
        let db = test_db().await;

        let first = synthesize_medical_id(db.pool()).await.unwrap();
        assert!(is_valid_medical_id(&first));

        seed_patient(&db, &first, "Occupant", None).await;

        let second = synthesize_medical_id(db.pool()).await.unwrap();
        assert!(is_valid_medical_id(&second));
        assert_ne!(first, second);
    }
}
