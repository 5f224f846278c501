//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A voice bot registered with the call platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Bot {
    /// Storage-assigned key.
    pub id: i64,
    /// Platform-supplied identifier.
    pub uid: String,
    /// Display name.
    pub name: String,
    /// System prompt given to the voice agent.
    pub prompt: String,
    /// Practice area (e.g. "medical").
    pub domain: String,
    /// Whether the bot accepts calls.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Fields required to register a bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBot {
    pub uid: String,
    pub name: String,
    pub prompt: String,
    pub domain: String,
}

/// A patient record.
///
/// `medical_id` is canonical: `MED` followed by exactly three digits,
/// stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Patient {
    /// Storage-assigned key.
    pub id: i64,
    /// Canonical medical ID (e.g. "MED001").
    pub medical_id: String,
    /// Patient name.
    pub name: String,
    /// Phone number, if known.
    pub phone: Option<String>,
    /// Known allergies.
    pub allergies: Option<String>,
    /// Current medications.
    pub current_medications: Option<String>,
    /// Relevant medical history.
    pub medical_history: Option<String>,
    /// Summary of the most recent call.
    pub last_call_summary: Option<String>,
    /// Timestamp of the most recent call.
    pub last_call_date: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

/// Fields required to create a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub medical_id: String,
    pub name: String,
    pub phone: Option<String>,
}

/// Fields for inserting a call log. Rows are immutable once written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCallLog {
    pub bot_id: Option<i64>,
    pub patient_id: Option<i64>,
    pub call_sid: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub duration: Option<i64>,
    pub status: String,
    pub metadata: Option<String>,
    pub function_calls: Option<String>,
}

/// A call log joined with the names of its resolved bot and patient,
/// as listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CallLogView {
    pub id: i64,
    pub bot_id: Option<i64>,
    pub patient_id: Option<i64>,
    pub call_sid: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub duration: Option<i64>,
    pub status: String,
    pub metadata: Option<String>,
    pub function_calls: Option<String>,
    pub created_at: String,
    pub bot_name: Option<String>,
    pub bot_uid: Option<String>,
    pub patient_name: Option<String>,
    pub patient_medical_id: Option<String>,
}
