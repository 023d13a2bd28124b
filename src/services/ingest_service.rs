use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::error::{Error, Result};
use crate::models::vacancy::NewVacancy;
use crate::services::hh_client::{map_item, VacancySource};
use crate::services::vacancy_store::VacancyStore;

/// Items requested per upstream call; the job board caps this at 100.
pub const PER_PAGE: u32 = 100;
/// Paging stops once `page * PER_PAGE` reaches this ceiling.
pub const MAX_ITEMS: u32 = 2000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Items returned by the job board, including ones that were skipped.
    pub total_saved: usize,
    /// Rows actually written to the store.
    pub persisted: usize,
    pub pages_fetched: u32,
}

#[derive(Clone)]
pub struct IngestService {
    source: Arc<dyn VacancySource>,
    store: Arc<dyn VacancyStore>,
    // Serializes searches so two resets never interleave within this process.
    running: Arc<Mutex<()>>,
}

impl IngestService {
    pub fn new(source: Arc<dyn VacancySource>, store: Arc<dyn VacancyStore>) -> Self {
        Self {
            source,
            store,
            running: Arc::new(Mutex::new(())),
        }
    }

    /// Replaces the stored vacancies with the job board's results for `keyword`.
    #[instrument(skip(self))]
    pub async fn ingest(&self, keyword: &str) -> Result<IngestReport> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(Error::InvalidInput("Keyword is required".to_string()));
        }

        let _running = self.running.lock().await;

        self.store.ensure_schema().await?;
        self.store.reset().await?;

        let mut report = IngestReport::default();
        let mut page = 0u32;
        while page * PER_PAGE < MAX_ITEMS {
            let items = self.source.fetch_page(keyword, page, PER_PAGE).await?;
            report.pages_fetched += 1;

            if items.is_empty() {
                info!(page, "Job board returned no more vacancies");
                break;
            }

            let records = map_page(&items, page);
            let ids = self.store.insert_page(&records).await?;

            report.total_saved += items.len();
            report.persisted += ids.len();
            info!(
                page,
                received = items.len(),
                inserted = ids.len(),
                "Vacancy page stored"
            );

            page += 1;
        }

        info!(
            total_saved = report.total_saved,
            persisted = report.persisted,
            pages = report.pages_fetched,
            "Vacancy search finished"
        );
        Ok(report)
    }
}

fn map_page(items: &[JsonValue], page: u32) -> Vec<NewVacancy> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match map_item(item) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(page, index, error = %err, "Skipping vacancy");
                None
            }
        })
        .collect()
}
