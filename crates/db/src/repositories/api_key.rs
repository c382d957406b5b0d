use crate::models::DbApiKey;
use chrono::Utc;
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// Stores the key hash for `email`, replacing any earlier key for that email.
pub async fn upsert_api_key(
    pool: &Pool<Postgres>,
    id: Uuid,
    email: &str,
    key_hash: &str,
) -> Result<DbApiKey> {
    let now = Utc::now();

    let api_key = sqlx::query_as::<_, DbApiKey>(
        r#"
        INSERT INTO api_keys (id, email, key_hash, created_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email)
        DO UPDATE SET id = $1, key_hash = $3, created_at = $4, last_used_at = NULL
        RETURNING id, email, key_hash, created_at, last_used_at
        "#,
    )
    .bind(id)
    .bind(email)
    .bind(key_hash)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(api_key)
}

pub async fn get_api_key_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbApiKey>> {
    let api_key = sqlx::query_as::<_, DbApiKey>(
        r#"
        SELECT id, email, key_hash, created_at, last_used_at
        FROM api_keys
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(api_key)
}

pub async fn touch_api_key(pool: &Pool<Postgres>, id: Uuid) -> Result<()> {
    sqlx::query("UPDATE api_keys SET last_used_at = $2 WHERE id = $1")
        .bind(id)
        .bind(Utc::now())
        .execute(pool)
        .await?;

    Ok(())
}
