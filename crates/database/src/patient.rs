//! Patient lookups, creation, and post-call updates.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{NewPatient, Patient};

/// Create a new patient record.
///
/// `medical_id` must already be canonical (uppercase `MED` + three digits);
/// the webhook pipeline validates and normalizes before calling in.
pub async fn create_patient(pool: &SqlitePool, patient: &NewPatient) -> Result<Patient> {
    let result = sqlx::query(
        r#"
        INSERT INTO patients (medical_id, name, phone)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&patient.medical_id)
    .bind(&patient.name)
    .bind(&patient.phone)
    .execute(pool)
    .await
    .map_err(DatabaseError::insert_conflict(
        "Patient",
        patient.medical_id.clone(),
    ))?;

    get_patient(pool, result.last_insert_rowid()).await
}

/// Get a patient by storage id.
pub async fn get_patient(pool: &SqlitePool, id: i64) -> Result<Patient> {
    sqlx::query_as::<_, Patient>(
        r#"
        SELECT id, medical_id, name, phone, allergies, current_medications,
               medical_history, last_call_summary, last_call_date, created_at
        FROM patients
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Patient",
        id: id.to_string(),
    })
}

/// Find a patient by canonical medical ID.
///
/// Returns `None` when no patient carries that ID.
pub async fn find_by_medical_id(pool: &SqlitePool, medical_id: &str) -> Result<Option<Patient>> {
    let patient = sqlx::query_as::<_, Patient>(
        r#"
        SELECT id, medical_id, name, phone, allergies, current_medications,
               medical_history, last_call_summary, last_call_date, created_at
        FROM patients
        WHERE medical_id = ?
        "#,
    )
    .bind(medical_id)
    .fetch_optional(pool)
    .await?;

    Ok(patient)
}

/// Find a patient by exact phone match.
pub async fn find_by_phone(pool: &SqlitePool, phone: &str) -> Result<Option<Patient>> {
    let patient = sqlx::query_as::<_, Patient>(
        r#"
        SELECT id, medical_id, name, phone, allergies, current_medications,
               medical_history, last_call_summary, last_call_date, created_at
        FROM patients
        WHERE phone = ?
        "#,
    )
    .bind(phone)
    .fetch_optional(pool)
    .await?;

    Ok(patient)
}

/// Check whether a medical ID is already taken.
pub async fn medical_id_exists(pool: &SqlitePool, medical_id: &str) -> Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM patients WHERE medical_id = ?
        "#,
    )
    .bind(medical_id)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Fetch the most recently created patient, if any.
///
/// Used by the pre-call demo fallback when a caller cannot be identified.
pub async fn most_recent(pool: &SqlitePool) -> Result<Option<Patient>> {
    let patient = sqlx::query_as::<_, Patient>(
        r#"
        SELECT id, medical_id, name, phone, allergies, current_medications,
               medical_history, last_call_summary, last_call_date, created_at
        FROM patients
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(patient)
}

/// Record the outcome of a resolved call on the patient row:
/// last call summary and timestamp.
pub async fn record_call_outcome(pool: &SqlitePool, id: i64, summary: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE patients
        SET last_call_summary = ?, last_call_date = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(summary)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Patient",
            id: id.to_string(),
        });
    }

    Ok(())
}
