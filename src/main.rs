use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vacancy_search::{
    config::Config,
    database::pool::create_pool,
    router,
    services::vacancy_store::{PgVacancyStore, VacancyStore},
    AppState,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    let pool = create_pool(&config.store).await?;
    PgVacancyStore::new(pool.clone()).ensure_schema().await?;
    info!(
        host = %config.store.host,
        database = %config.store.database,
        "Vacancy table ready"
    );

    let app_state = AppState::new(pool, &config.source)?;
    info!(source = %config.source.base_url, "Using job board");

    let app = router(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
