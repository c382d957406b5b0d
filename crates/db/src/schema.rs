use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create availability_rules table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS availability_rules (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id VARCHAR(255) NOT NULL,
            day_of_week SMALLINT NOT NULL,
            start_time VARCHAR(8) NOT NULL,
            end_time VARCHAR(8) NOT NULL,
            slot_length_minutes INTEGER NOT NULL,
            title TEXT NULL,
            available BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_day_of_week CHECK (day_of_week BETWEEN 0 AND 6),
            CONSTRAINT positive_slot_length CHECK (slot_length_minutes > 0)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create bookings table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bookings (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id VARCHAR(255) NOT NULL,
            candidate_email VARCHAR(320) NOT NULL,
            start_at_utc TIMESTAMP WITH TIME ZONE NOT NULL,
            end_at_utc TIMESTAMP WITH TIME ZONE NOT NULL,
            status VARCHAR(16) NOT NULL DEFAULT 'confirmed',
            source TEXT NULL,
            type TEXT NULL,
            description TEXT NULL,
            title TEXT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_booking_range CHECK (end_at_utc > start_at_utc),
            CONSTRAINT valid_booking_status CHECK (status IN ('confirmed', 'cancelled'))
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create api_keys table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS api_keys (
            id UUID PRIMARY KEY,
            email VARCHAR(320) NOT NULL UNIQUE,
            key_hash VARCHAR(255) NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            last_used_at TIMESTAMP WITH TIME ZONE NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes. The partial unique index backs the slot lock: at most one
    // confirmed booking per user and start instant.
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_availability_rules_user_id ON availability_rules(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_bookings_user_start ON bookings(user_id, start_at_utc)",
        "CREATE UNIQUE INDEX IF NOT EXISTS uniq_bookings_confirmed_start \
         ON bookings(user_id, start_at_utc) WHERE status = 'confirmed'",
    ];
    for statement in indexes {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
