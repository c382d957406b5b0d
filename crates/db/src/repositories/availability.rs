use crate::models::DbAvailabilityRule;
use chrono::Utc;
use eyre::Result;
use slotbook_core::models::availability::{format_time_of_day, RuleDraft};
use sqlx::PgExecutor;
use uuid::Uuid;

const RULE_COLUMNS: &str = "id, user_id, day_of_week, start_time, end_time, \
    slot_length_minutes, title, available, created_at, updated_at";

pub async fn insert_rule<'e, E>(
    executor: E,
    user_id: &str,
    draft: &RuleDraft,
) -> Result<DbAvailabilityRule>
where
    E: PgExecutor<'e>,
{
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!(
        "Creating availability rule: id={}, user_id={}, day_of_week={}",
        id, user_id, draft.day_of_week
    );

    let rule = sqlx::query_as::<_, DbAvailabilityRule>(&format!(
        r#"
        INSERT INTO availability_rules
            (id, user_id, day_of_week, start_time, end_time, slot_length_minutes,
             title, available, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
        RETURNING {RULE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(user_id)
    .bind(i16::from(draft.day_of_week))
    .bind(format_time_of_day(draft.start_time))
    .bind(format_time_of_day(draft.end_time))
    .bind(draft.slot_length_minutes)
    .bind(draft.title.as_deref())
    .bind(draft.available)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(rule)
}

pub async fn get_rule<'e, E>(
    executor: E,
    user_id: &str,
    rule_id: Uuid,
) -> Result<Option<DbAvailabilityRule>>
where
    E: PgExecutor<'e>,
{
    let rule = sqlx::query_as::<_, DbAvailabilityRule>(&format!(
        r#"
        SELECT {RULE_COLUMNS}
        FROM availability_rules
        WHERE id = $1 AND user_id = $2
        "#
    ))
    .bind(rule_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(rule)
}

pub async fn list_rules<'e, E>(executor: E, user_id: &str) -> Result<Vec<DbAvailabilityRule>>
where
    E: PgExecutor<'e>,
{
    let rules = sqlx::query_as::<_, DbAvailabilityRule>(&format!(
        r#"
        SELECT {RULE_COLUMNS}
        FROM availability_rules
        WHERE user_id = $1
        ORDER BY created_at ASC, id ASC
        "#
    ))
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(rules)
}

pub async fn update_rule<'e, E>(
    executor: E,
    user_id: &str,
    rule_id: Uuid,
    draft: &RuleDraft,
) -> Result<Option<DbAvailabilityRule>>
where
    E: PgExecutor<'e>,
{
    let rule = sqlx::query_as::<_, DbAvailabilityRule>(&format!(
        r#"
        UPDATE availability_rules
        SET day_of_week = $1, start_time = $2, end_time = $3, slot_length_minutes = $4,
            title = $5, available = $6, updated_at = $7
        WHERE id = $8 AND user_id = $9
        RETURNING {RULE_COLUMNS}
        "#
    ))
    .bind(i16::from(draft.day_of_week))
    .bind(format_time_of_day(draft.start_time))
    .bind(format_time_of_day(draft.end_time))
    .bind(draft.slot_length_minutes)
    .bind(draft.title.as_deref())
    .bind(draft.available)
    .bind(Utc::now())
    .bind(rule_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(rule)
}
