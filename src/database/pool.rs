use crate::config::StoreConfig;
use crate::error::Result;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

pub fn connect_options(config: &StoreConfig) -> Result<PgConnectOptions> {
    if let Some(url) = &config.database_url {
        return Ok(url.parse()?);
    }

    Ok(PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.database)
        .username(&config.user)
        .password(&config.password))
}

pub async fn create_pool(config: &StoreConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect_with(connect_options(config)?)
        .await?;
    Ok(pool)
}
