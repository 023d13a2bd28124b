pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod testing;
pub mod utils;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::SourceConfig;
use crate::error::Result;
use crate::services::{
    hh_client::{HhClient, VacancySource},
    ingest_service::IngestService,
    listing_service::ListingService,
    vacancy_store::{PgVacancyStore, VacancyStore},
};

#[derive(Clone)]
pub struct AppState {
    pub ingest_service: IngestService,
    pub listing_service: ListingService,
}

impl AppState {
    pub fn new(pool: PgPool, source_config: &SourceConfig) -> Result<Self> {
        let store: Arc<dyn VacancyStore> = Arc::new(PgVacancyStore::new(pool));
        let source: Arc<dyn VacancySource> = Arc::new(HhClient::new(source_config)?);
        Ok(Self::from_parts(source, store))
    }

    pub fn from_parts(source: Arc<dyn VacancySource>, store: Arc<dyn VacancyStore>) -> Self {
        Self {
            ingest_service: IngestService::new(source, store.clone()),
            listing_service: ListingService::new(store),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/search", post(routes::vacancy::search_vacancies))
        .route("/results", get(routes::vacancy::show_vacancies))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
