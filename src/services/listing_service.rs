use std::sync::Arc;

use tracing::instrument;

use crate::error::{Error, Result};
use crate::models::vacancy::Vacancy;
use crate::services::vacancy_filter::VacancyFilters;
use crate::services::vacancy_store::VacancyStore;

pub const PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone)]
pub struct VacancyPage {
    pub items: Vec<Vacancy>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Clone)]
pub struct ListingService {
    store: Arc<dyn VacancyStore>,
}

impl ListingService {
    pub fn new(store: Arc<dyn VacancyStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn list_page(&self, filters: &VacancyFilters, page: i64) -> Result<VacancyPage> {
        if page < 1 {
            return Err(Error::InvalidInput(format!(
                "Page must be a positive integer, got {}",
                page
            )));
        }
        let offset = (page - 1)
            .checked_mul(PAGE_SIZE)
            .ok_or_else(|| Error::InvalidInput(format!("Page {} is out of range", page)))?;

        let (items, total) = self.store.query(filters, PAGE_SIZE, offset).await?;

        Ok(VacancyPage {
            items,
            page,
            per_page: PAGE_SIZE,
            total,
            total_pages: total_pages(total, PAGE_SIZE),
        })
    }
}

pub fn total_pages(total: i64, per_page: i64) -> i64 {
    if total <= 0 || per_page <= 0 {
        return 0;
    }
    (total + per_page - 1) / per_page
}
