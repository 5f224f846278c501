//! Bot resolution: mapping a platform identifier to a stored bot.
//!
//! Strategies are tried in order, stopping at the first success:
//! exact uid match, case-insensitive name substring match, then heuristic
//! name recovery from the call summary. When only a name can be recovered
//! the result is [`BotRef::Placeholder`], so the call can still be logged
//! at the cost of possible misattribution.

use sqlx::SqlitePool;
use tracing::{info, warn};

use database::models::Bot;

use crate::extract;
use crate::Result;

/// Well-known uid reported for calls that could not be attributed to a
/// stored bot.
pub const PLACEHOLDER_BOT_UID: &str = "unknown-bot";

/// A resolved bot reference.
///
/// The placeholder variant makes the degraded state explicit instead of
/// hiding it behind a magic identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum BotRef {
    /// A stored bot record.
    Known(Bot),
    /// No stored record matched; only a name was recovered.
    Placeholder {
        /// Name recovered from the payload or summary.
        name: String,
    },
}

impl BotRef {
    /// Storage id to link call logs against, if any.
    pub fn storage_id(&self) -> Option<i64> {
        match self {
            BotRef::Known(bot) => Some(bot.id),
            BotRef::Placeholder { .. } => None,
        }
    }

    /// The platform-facing identifier.
    pub fn uid(&self) -> &str {
        match self {
            BotRef::Known(bot) => &bot.uid,
            BotRef::Placeholder { .. } => PLACEHOLDER_BOT_UID,
        }
    }

    /// Display name for logs and responses.
    pub fn display_name(&self) -> &str {
        match self {
            BotRef::Known(bot) => &bot.name,
            BotRef::Placeholder { name } => name,
        }
    }
}

/// Resolve a bot from whatever the payload offered.
///
/// Returns `Ok(None)` when neither an identifier nor a name can be
/// recovered; the caller decides whether that is fatal.
pub async fn resolve_bot(
    pool: &SqlitePool,
    identifier: Option<&str>,
    name_hint: Option<&str>,
    summary: Option<&str>,
) -> Result<Option<BotRef>> {
    if let Some(identifier) = identifier.filter(|s| !s.is_empty()) {
        if let Some(bot) = database::bot::find_by_uid(pool, identifier).await? {
            return Ok(Some(BotRef::Known(bot)));
        }

        // The platform sometimes sends a display name where the uid belongs.
        let matches = database::bot::find_by_name_like(pool, identifier).await?;
        if let Some(bot) = matches.into_iter().next() {
            info!(uid = %bot.uid, name = %bot.name, "bot matched by name search");
            return Ok(Some(BotRef::Known(bot)));
        }
    }

    let name = name_hint
        .map(str::to_string)
        .filter(|s| !s.is_empty())
        .or_else(|| summary.and_then(extract::extract_bot_name));

    if let Some(name) = name {
        let matches = database::bot::find_by_name_like(pool, &name).await?;
        if let Some(bot) = matches.into_iter().next() {
            info!(uid = %bot.uid, name = %bot.name, "bot matched by recovered name");
            return Ok(Some(BotRef::Known(bot)));
        }

        warn!(%name, "no stored bot matched, attributing call to placeholder");
        return Ok(Some(BotRef::Placeholder { name }));
    }

    Ok(None)
}
