use color_eyre::eyre::Result;
use dotenv::dotenv;
use slotbook_api::config::ApiConfig;
use slotbook_db::{create_pool, schema::initialize_database};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();

    let config = ApiConfig::from_env()?;
    let db_pool = create_pool(&config.database_url, config.database_max_connections).await?;

    // Bootstrap is idempotent, so running it on every start is safe.
    initialize_database(&db_pool).await?;

    slotbook_api::start_server(config, db_pool).await?;

    Ok(())
}
