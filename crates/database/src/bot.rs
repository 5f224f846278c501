//! Bot CRUD operations and resolver lookups.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Bot, NewBot};

/// Register a new bot.
pub async fn create_bot(pool: &SqlitePool, bot: &NewBot) -> Result<Bot> {
    let result = sqlx::query(
        r#"
        INSERT INTO bots (uid, name, prompt, domain)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&bot.uid)
    .bind(&bot.name)
    .bind(&bot.prompt)
    .bind(&bot.domain)
    .execute(pool)
    .await
    .map_err(DatabaseError::insert_conflict("Bot", bot.uid.clone()))?;

    get_bot(pool, result.last_insert_rowid()).await
}

/// Get a bot by storage id.
pub async fn get_bot(pool: &SqlitePool, id: i64) -> Result<Bot> {
    sqlx::query_as::<_, Bot>(
        r#"
        SELECT id, uid, name, prompt, domain, is_active, created_at, updated_at
        FROM bots
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Bot",
        id: id.to_string(),
    })
}

/// Find a bot by its platform-supplied uid.
///
/// Returns `None` when no bot carries that uid.
pub async fn find_by_uid(pool: &SqlitePool, uid: &str) -> Result<Option<Bot>> {
    let bot = sqlx::query_as::<_, Bot>(
        r#"
        SELECT id, uid, name, prompt, domain, is_active, created_at, updated_at
        FROM bots
        WHERE uid = ?
        "#,
    )
    .bind(uid)
    .fetch_optional(pool)
    .await?;

    Ok(bot)
}

/// Find bots whose display name contains the given fragment,
/// case-insensitively, in insertion order.
pub async fn find_by_name_like(pool: &SqlitePool, fragment: &str) -> Result<Vec<Bot>> {
    let bots = sqlx::query_as::<_, Bot>(
        r#"
        SELECT id, uid, name, prompt, domain, is_active, created_at, updated_at
        FROM bots
        WHERE lower(name) LIKE '%' || lower(?) || '%'
        ORDER BY id
        "#,
    )
    .bind(fragment)
    .fetch_all(pool)
    .await?;

    Ok(bots)
}

/// List all bots, most recently created first.
pub async fn list_bots(pool: &SqlitePool) -> Result<Vec<Bot>> {
    let bots = sqlx::query_as::<_, Bot>(
        r#"
        SELECT id, uid, name, prompt, domain, is_active, created_at, updated_at
        FROM bots
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(bots)
}

/// Update an existing bot.
pub async fn update_bot(
    pool: &SqlitePool,
    id: i64,
    uid: &str,
    name: &str,
    prompt: &str,
    domain: &str,
    is_active: bool,
) -> Result<Bot> {
    let result = sqlx::query(
        r#"
        UPDATE bots
        SET uid = ?, name = ?, prompt = ?, domain = ?, is_active = ?,
            updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(uid)
    .bind(name)
    .bind(prompt)
    .bind(domain)
    .bind(is_active)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Bot",
            id: id.to_string(),
        });
    }

    get_bot(pool, id).await
}

/// Delete a bot by storage id.
pub async fn delete_bot(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM bots
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Bot",
            id: id.to_string(),
        });
    }

    Ok(())
}
