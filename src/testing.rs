// In-memory stand-ins for the store and the job board.
//
// Used by unit tests and by the router tests under tests/.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use crate::error::{Error, Result};
use crate::models::vacancy::{NewVacancy, Vacancy};
use crate::services::hh_client::VacancySource;
use crate::services::vacancy_filter::VacancyFilters;
use crate::services::vacancy_store::VacancyStore;

/// Calls observed by [`InMemoryVacancyStore`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    EnsureSchema,
    Reset,
    Insert,
    InsertPage(usize),
    Query,
}

#[derive(Debug, Default)]
struct StoreState {
    rows: Vec<Vacancy>,
    next_id: i32,
    ops: Vec<StoreOp>,
    fail_writes: bool,
}

impl StoreState {
    fn push(&mut self, record: NewVacancy) -> i32 {
        self.next_id += 1;
        let id = self.next_id;
        self.rows.push(record.into_vacancy(id));
        id
    }
}

/// Vacancy store backed by a `Vec`, applying the same filter clauses as PostgreSQL.
#[derive(Debug, Default, Clone)]
pub struct InMemoryVacancyStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryVacancyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds rows without recording operations.
    pub fn with_rows(self, records: Vec<NewVacancy>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for record in records {
                state.push(record);
            }
        }
        self
    }

    /// Makes every subsequent insert fail as a constraint violation would.
    pub fn failing_writes(self) -> Self {
        self.state.lock().unwrap().fail_writes = true;
        self
    }

    pub fn operations(&self) -> Vec<StoreOp> {
        self.state.lock().unwrap().ops.clone()
    }

    pub fn rows(&self) -> Vec<Vacancy> {
        self.state.lock().unwrap().rows.clone()
    }
}

fn write_error() -> Error {
    Error::StorageWrite(sqlx::Error::Protocol(
        "simulated insert failure".to_string(),
    ))
}

#[async_trait]
impl VacancyStore for InMemoryVacancyStore {
    async fn ensure_schema(&self) -> Result<()> {
        self.state.lock().unwrap().ops.push(StoreOp::EnsureSchema);
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(StoreOp::Reset);
        state.rows.clear();
        state.next_id = 0;
        Ok(())
    }

    async fn insert(&self, record: &NewVacancy) -> Result<i32> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(StoreOp::Insert);
        if state.fail_writes {
            return Err(write_error());
        }
        Ok(state.push(record.clone()))
    }

    async fn insert_page(&self, records: &[NewVacancy]) -> Result<Vec<i32>> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(StoreOp::InsertPage(records.len()));
        if records.is_empty() {
            return Ok(Vec::new());
        }
        if state.fail_writes {
            return Err(write_error());
        }
        Ok(records.iter().map(|r| state.push(r.clone())).collect())
    }

    async fn query(
        &self,
        filters: &VacancyFilters,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Vacancy>, i64)> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(StoreOp::Query);

        let matching: Vec<&Vacancy> = state.rows.iter().filter(|v| filters.matches(v)).collect();
        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();

        Ok((items, total))
    }
}

/// Arguments captured from a `fetch_page` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub keyword: String,
    pub page: u32,
    pub per_page: u32,
}

/// Job board that serves a fixed list of pages; pages past the end are empty.
#[derive(Debug, Default, Clone)]
pub struct ScriptedVacancySource {
    pages: Vec<Vec<JsonValue>>,
    fail_at: Option<(u32, u16)>,
    calls: Arc<Mutex<Vec<FetchCall>>>,
}

impl ScriptedVacancySource {
    pub fn new(pages: Vec<Vec<JsonValue>>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    /// Answers `page` with the given HTTP status instead of items.
    pub fn failing_at(mut self, page: u32, status: u16) -> Self {
        self.fail_at = Some((page, status));
        self
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VacancySource for ScriptedVacancySource {
    async fn fetch_page(&self, keyword: &str, page: u32, per_page: u32) -> Result<Vec<JsonValue>> {
        self.calls.lock().unwrap().push(FetchCall {
            keyword: keyword.to_string(),
            page,
            per_page,
        });

        if let Some((fail_page, status)) = self.fail_at {
            if fail_page == page {
                return Err(Error::Upstream { status });
            }
        }

        Ok(self.pages.get(page as usize).cloned().unwrap_or_default())
    }
}

/// A complete hh.ru-shaped posting.
pub fn sample_item(index: usize) -> JsonValue {
    json!({
        "id": index.to_string(),
        "name": format!("Rust developer #{}", index),
        "employer": { "id": "1455", "name": format!("Company {}", index % 7) },
        "salary": {
            "from": 100_000 + (index as i64) * 1_000,
            "to": 200_000 + (index as i64) * 1_000,
            "currency": "RUR",
            "gross": false
        },
        "alternate_url": format!("https://hh.ru/vacancy/{}", 90_000_000 + index),
        "area": { "id": "1", "name": "Москва", "url": "https://api.hh.ru/areas/1" },
        "experience": { "id": "between1And3", "name": "От 1 года до 3 лет" },
        "employment": { "id": "full", "name": "Полная занятость" }
    })
}

/// `count` sample postings numbered from `first`.
pub fn sample_page(first: usize, count: usize) -> Vec<JsonValue> {
    (first..first + count).map(sample_item).collect()
}

pub fn sample_record(name: &str, region: Option<&str>, salary_from: Option<i32>) -> NewVacancy {
    NewVacancy {
        name: name.to_string(),
        company: "Acme".to_string(),
        salary_from,
        salary_to: None,
        currency: Some("RUR".to_string()),
        url: format!("https://hh.ru/vacancy/{}", name.len()),
        region_id: None,
        region: region.map(str::to_string),
        experience: None,
        employment: None,
    }
}
