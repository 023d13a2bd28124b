pub mod hh_client;
pub mod ingest_service;
pub mod listing_service;
pub mod vacancy_filter;
pub mod vacancy_store;
