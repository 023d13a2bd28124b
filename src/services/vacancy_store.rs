use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::models::vacancy::{NewVacancy, Vacancy};
use crate::services::vacancy_filter::{like_pattern, FilterClause, FilterValue, VacancyFilters};

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS vacancies (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        company VARCHAR(255) NOT NULL,
        salary_from INTEGER,
        salary_to INTEGER,
        currency VARCHAR(10),
        url TEXT,
        region_id INTEGER,
        region VARCHAR(255),
        experience VARCHAR(255),
        employment VARCHAR(255)
    )
"#;

const INSERT_SQL: &str = r#"
    INSERT INTO vacancies (
        name, company, salary_from, salary_to, currency,
        url, region_id, region, experience, employment
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
    RETURNING id
"#;

const SELECT_COLUMNS: &str = "SELECT id, name, company, salary_from, salary_to, currency, url, region_id, region, experience, employment FROM vacancies";

/// Persistence boundary for vacancy records.
#[async_trait]
pub trait VacancyStore: Send + Sync {
    /// Creates the vacancies table when it is missing.
    async fn ensure_schema(&self) -> Result<()>;

    /// Removes every row and restarts id assignment from 1.
    async fn reset(&self) -> Result<()>;

    async fn insert(&self, record: &NewVacancy) -> Result<i32>;

    /// Inserts all records in a single transaction.
    async fn insert_page(&self, records: &[NewVacancy]) -> Result<Vec<i32>>;

    /// Matching rows in insertion order plus the unpaginated match count.
    async fn query(
        &self,
        filters: &VacancyFilters,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Vacancy>, i64)>;
}

#[derive(Clone)]
pub struct PgVacancyStore {
    pool: PgPool,
}

impl PgVacancyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VacancyStore for PgVacancyStore {
    #[instrument(skip(self))]
    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE_SQL).execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn reset(&self) -> Result<()> {
        sqlx::query("TRUNCATE TABLE vacancies RESTART IDENTITY")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert(&self, record: &NewVacancy) -> Result<i32> {
        debug!(name = %record.name, company = %record.company, "Inserting vacancy");
        insert_row(&self.pool, record)
            .await
            .map_err(Error::StorageWrite)
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn insert_page(&self, records: &[NewVacancy]) -> Result<Vec<i32>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            let id = insert_row(&mut *tx, record)
                .await
                .map_err(Error::StorageWrite)?;
            ids.push(id);
        }
        tx.commit().await.map_err(Error::StorageWrite)?;

        Ok(ids)
    }

    #[instrument(skip(self, filters))]
    async fn query(
        &self,
        filters: &VacancyFilters,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Vacancy>, i64)> {
        let clauses = filters.clauses();
        debug!(filters = clauses.len(), "Querying vacancies");

        let mut select = select_query(&clauses, limit, offset);
        let items = select
            .build_query_as::<Vacancy>()
            .fetch_all(&self.pool)
            .await?;

        let mut count = count_query(&clauses);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok((items, total))
    }
}

async fn insert_row<'e, E>(executor: E, record: &NewVacancy) -> sqlx::Result<i32>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i32>(INSERT_SQL)
        .bind(&record.name)
        .bind(&record.company)
        .bind(record.salary_from)
        .bind(record.salary_to)
        .bind(&record.currency)
        .bind(&record.url)
        .bind(record.region_id)
        .bind(&record.region)
        .bind(&record.experience)
        .bind(&record.employment)
        .fetch_one(executor)
        .await
}

pub fn select_query(
    clauses: &[FilterClause],
    limit: i64,
    offset: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(SELECT_COLUMNS);
    push_where(&mut qb, clauses);
    qb.push(" ORDER BY id LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    qb
}

pub fn count_query(clauses: &[FilterClause]) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM vacancies");
    push_where(&mut qb, clauses);
    qb
}

fn push_where(qb: &mut QueryBuilder<'static, Postgres>, clauses: &[FilterClause]) {
    qb.push(" WHERE 1=1");
    for clause in clauses {
        qb.push(" AND ")
            .push(clause.column.as_str())
            .push(clause.comparison.sql_operator());
        match &clause.value {
            FilterValue::Int(value) => {
                qb.push_bind(*value);
            }
            FilterValue::Text(value) => {
                qb.push_bind(like_pattern(value));
            }
        }
    }
}
