use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::vacancy::Vacancy;
use crate::services::listing_service::VacancyPage;
use crate::services::vacancy_filter::VacancyFilters;
use crate::utils::validation::not_blank;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Keyword is required"))]
    pub keyword: String,
}

/// Raw `/results` query string. Values stay strings so empty form fields
/// (`?region=`) are accepted and mean "no filter".
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ResultsQuery {
    pub page: Option<String>,
    pub salary_from: Option<String>,
    pub salary_to: Option<String>,
    pub region: Option<String>,
    pub experience: Option<String>,
    pub keyword: Option<String>,
    pub currency: Option<String>,
}

impl ResultsQuery {
    pub fn page(&self) -> Result<i64> {
        match non_empty(&self.page) {
            None => Ok(1),
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::InvalidInput(format!("Invalid page number: {}", raw))),
        }
    }

    pub fn filters(&self) -> Result<VacancyFilters> {
        Ok(VacancyFilters {
            salary_from: parse_salary(&self.salary_from, "salary_from")?,
            salary_to: parse_salary(&self.salary_to, "salary_to")?,
            // Text values are normalised by the clause table, not here.
            region: self.region.clone(),
            experience: self.experience.clone(),
            keyword: self.keyword.clone(),
            currency: self.currency.clone(),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_salary(value: &Option<String>, field: &str) -> Result<Option<i32>> {
    non_empty(value)
        .map(|raw| {
            raw.parse::<i32>()
                .map_err(|_| Error::InvalidInput(format!("Invalid value for {}: {}", field, raw)))
        })
        .transpose()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacancyListResponse {
    pub items: Vec<Vacancy>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub filters: VacancyFilters,
}

impl VacancyListResponse {
    pub fn new(page: VacancyPage, filters: VacancyFilters) -> Self {
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages,
            filters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_to_one() {
        assert_eq!(ResultsQuery::default().page().unwrap(), 1);
        let query = ResultsQuery {
            page: Some(" ".into()),
            ..Default::default()
        };
        assert_eq!(query.page().unwrap(), 1);
    }

    #[test]
    fn non_numeric_page_is_invalid_input() {
        let query = ResultsQuery {
            page: Some("two".into()),
            ..Default::default()
        };
        assert!(matches!(query.page(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn empty_fields_are_not_filters() {
        let query = ResultsQuery {
            salary_from: Some(String::new()),
            region: Some("  ".into()),
            currency: Some("usd".into()),
            ..Default::default()
        };
        let filters = query.filters().unwrap();
        assert_eq!(filters.salary_from, None);
        assert_eq!(
            filters.clauses(),
            VacancyFilters {
                currency: Some("usd".into()),
                ..Default::default()
            }
            .clauses()
        );
    }

    #[test]
    fn parsed_and_direct_filters_build_the_same_clauses() {
        let query = ResultsQuery {
            region: Some("  Moscow ".into()),
            keyword: Some("rust".into()),
            experience: Some(" ".into()),
            ..Default::default()
        };
        let direct = VacancyFilters {
            region: Some("  Moscow ".into()),
            keyword: Some("rust".into()),
            experience: Some(" ".into()),
            ..Default::default()
        };

        let parsed = query.filters().unwrap();
        assert_eq!(parsed, direct);
        assert_eq!(parsed.clauses(), direct.clauses());
        assert_eq!(parsed.clauses().len(), 2);
    }

    #[test]
    fn salary_must_be_an_integer() {
        let query = ResultsQuery {
            salary_to: Some("100k".into()),
            ..Default::default()
        };
        assert!(matches!(query.filters(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn blank_keyword_fails_validation() {
        let form = SearchForm {
            keyword: "   ".into(),
        };
        assert!(form.validate().is_err());
        let form = SearchForm {
            keyword: "rust".into(),
        };
        assert!(form.validate().is_ok());
    }
}
