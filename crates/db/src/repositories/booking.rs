use crate::models::DbBooking;
use chrono::{DateTime, Utc};
use eyre::Result;
use slotbook_core::models::booking::NewBooking;
use sqlx::PgExecutor;
use uuid::Uuid;

const BOOKING_COLUMNS: &str = "id, user_id, candidate_email, start_at_utc, end_at_utc, status, \
    source, type, description, title, created_at";

/// Non-cancelled bookings, optionally limited to `from <= start_at_utc < to`.
pub async fn list_bookings<'e, E>(
    executor: E,
    user_id: &str,
    range: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> Result<Vec<DbBooking>>
where
    E: PgExecutor<'e>,
{
    let bookings = match range {
        Some((from, to)) => {
            sqlx::query_as::<_, DbBooking>(&format!(
                r#"
                SELECT {BOOKING_COLUMNS}
                FROM bookings
                WHERE user_id = $1 AND start_at_utc >= $2 AND start_at_utc < $3
                  AND status != 'cancelled'
                ORDER BY start_at_utc ASC
                "#
            ))
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(executor)
            .await?
        }
        None => {
            sqlx::query_as::<_, DbBooking>(&format!(
                r#"
                SELECT {BOOKING_COLUMNS}
                FROM bookings
                WHERE user_id = $1 AND status != 'cancelled'
                ORDER BY start_at_utc ASC
                "#
            ))
            .bind(user_id)
            .fetch_all(executor)
            .await?
        }
    };

    Ok(bookings)
}

/// Confirmed bookings with `from <= start_at_utc < to`.
pub async fn list_confirmed_in_range<'e, E>(
    executor: E,
    user_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<DbBooking>>
where
    E: PgExecutor<'e>,
{
    let bookings = sqlx::query_as::<_, DbBooking>(&format!(
        r#"
        SELECT {BOOKING_COLUMNS}
        FROM bookings
        WHERE user_id = $1 AND start_at_utc >= $2 AND start_at_utc < $3
          AND status = 'confirmed'
        ORDER BY start_at_utc ASC
        "#
    ))
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(executor)
    .await?;

    Ok(bookings)
}

/// Takes a transaction-scoped advisory lock on `(user_id, start)`.
///
/// Row locks alone cannot serialize two attempts on a slot that has no booking
/// row yet, so the key itself is locked. Released on commit or rollback.
pub async fn acquire_slot_lock<'e, E>(executor: E, user_id: &str, start: DateTime<Utc>) -> Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1), hashtext($2))")
        .bind(user_id)
        .bind(start.to_rfc3339())
        .execute(executor)
        .await?;

    Ok(())
}

/// Id of the confirmed booking at exactly `start`, locking its row.
pub async fn find_confirmed_at_start_for_update<'e, E>(
    executor: E,
    user_id: &str,
    start: DateTime<Utc>,
) -> Result<Option<Uuid>>
where
    E: PgExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id FROM bookings
        WHERE user_id = $1 AND status = 'confirmed' AND start_at_utc = $2
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .bind(start)
    .fetch_optional(executor)
    .await?;

    Ok(id)
}

pub async fn insert_booking<'e, E>(executor: E, booking: &NewBooking) -> Result<DbBooking>
where
    E: PgExecutor<'e>,
{
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row = sqlx::query_as::<_, DbBooking>(&format!(
        r#"
        INSERT INTO bookings
            (id, user_id, candidate_email, start_at_utc, end_at_utc, status,
             source, type, description, title, created_at)
        VALUES ($1, $2, $3, $4, $5, 'confirmed', $6, $7, $8, $9, $10)
        RETURNING {BOOKING_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&booking.user_id)
    .bind(&booking.candidate_email)
    .bind(booking.start_at)
    .bind(booking.end_at)
    .bind(booking.source.as_deref())
    .bind(booking.booking_type.as_deref())
    .bind(booking.description.as_deref())
    .bind(booking.title.as_deref())
    .bind(now)
    .fetch_one(executor)
    .await?;

    tracing::debug!("Booking inserted: id={}, user_id={}", row.id, row.user_id);
    Ok(row)
}

pub async fn get_booking_status<'e, E>(executor: E, id: Uuid) -> Result<Option<String>>
where
    E: PgExecutor<'e>,
{
    let status = sqlx::query_scalar::<_, String>("SELECT status FROM bookings WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(status)
}

/// Conditionally cancels; returns the number of rows changed (0 or 1).
pub async fn cancel_booking<'e, E>(executor: E, id: Uuid) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE bookings SET status = 'cancelled'
        WHERE id = $1 AND status != 'cancelled'
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// True when `err` wraps a Postgres unique-constraint violation.
pub fn is_unique_violation(err: &eyre::Report) -> bool {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
