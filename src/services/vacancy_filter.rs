use serde::{Deserialize, Serialize};

use crate::models::vacancy::Vacancy;

/// Optional listing criteria. Every present value narrows the result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacancyFilters {
    pub salary_from: Option<i32>,
    pub salary_to: Option<i32>,
    pub region: Option<String>,
    pub experience: Option<String>,
    pub keyword: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Name,
    SalaryFrom,
    SalaryTo,
    Currency,
    Region,
    Experience,
}

impl Column {
    pub fn as_str(self) -> &'static str {
        match self {
            Column::Name => "name",
            Column::SalaryFrom => "salary_from",
            Column::SalaryTo => "salary_to",
            Column::Currency => "currency",
            Column::Region => "region",
            Column::Experience => "experience",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    AtLeast,
    AtMost,
    ContainsIgnoreCase,
}

impl Comparison {
    pub fn sql_operator(self) -> &'static str {
        match self {
            Comparison::AtLeast => " >= ",
            Comparison::AtMost => " <= ",
            Comparison::ContainsIgnoreCase => " ILIKE ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Int(i32),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub column: Column,
    pub comparison: Comparison,
    pub value: FilterValue,
}

struct FilterRule {
    column: Column,
    comparison: Comparison,
    extract: fn(&VacancyFilters) -> Option<FilterValue>,
}

// Iteration order fixes the order of placeholders in the generated SQL.
const FILTER_RULES: [FilterRule; 6] = [
    FilterRule {
        column: Column::SalaryFrom,
        comparison: Comparison::AtLeast,
        extract: salary_from,
    },
    FilterRule {
        column: Column::SalaryTo,
        comparison: Comparison::AtMost,
        extract: salary_to,
    },
    FilterRule {
        column: Column::Region,
        comparison: Comparison::ContainsIgnoreCase,
        extract: region,
    },
    FilterRule {
        column: Column::Experience,
        comparison: Comparison::ContainsIgnoreCase,
        extract: experience,
    },
    FilterRule {
        column: Column::Name,
        comparison: Comparison::ContainsIgnoreCase,
        extract: keyword,
    },
    FilterRule {
        column: Column::Currency,
        comparison: Comparison::ContainsIgnoreCase,
        extract: currency,
    },
];

fn salary_from(filters: &VacancyFilters) -> Option<FilterValue> {
    filters.salary_from.map(FilterValue::Int)
}

fn salary_to(filters: &VacancyFilters) -> Option<FilterValue> {
    filters.salary_to.map(FilterValue::Int)
}

fn region(filters: &VacancyFilters) -> Option<FilterValue> {
    text(&filters.region)
}

fn experience(filters: &VacancyFilters) -> Option<FilterValue> {
    text(&filters.experience)
}

fn keyword(filters: &VacancyFilters) -> Option<FilterValue> {
    text(&filters.keyword)
}

fn currency(filters: &VacancyFilters) -> Option<FilterValue> {
    text(&filters.currency)
}

fn text(value: &Option<String>) -> Option<FilterValue> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| FilterValue::Text(v.to_string()))
}

impl VacancyFilters {
    /// Clauses for every filter that carries a non-empty value, in table order.
    pub fn clauses(&self) -> Vec<FilterClause> {
        FILTER_RULES
            .iter()
            .filter_map(|rule| {
                (rule.extract)(self).map(|value| FilterClause {
                    column: rule.column,
                    comparison: rule.comparison,
                    value,
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses().is_empty()
    }

    pub fn matches(&self, vacancy: &Vacancy) -> bool {
        self.clauses().iter().all(|clause| clause.matches(vacancy))
    }
}

impl FilterClause {
    /// Evaluates the clause the way PostgreSQL does: NULL columns never match.
    pub fn matches(&self, vacancy: &Vacancy) -> bool {
        match (&self.value, self.comparison) {
            (FilterValue::Int(bound), Comparison::AtLeast) => {
                int_column(vacancy, self.column).is_some_and(|v| v >= *bound)
            }
            (FilterValue::Int(bound), Comparison::AtMost) => {
                int_column(vacancy, self.column).is_some_and(|v| v <= *bound)
            }
            (FilterValue::Text(needle), Comparison::ContainsIgnoreCase) => {
                text_column(vacancy, self.column)
                    .is_some_and(|v| v.to_lowercase().contains(&needle.to_lowercase()))
            }
            _ => false,
        }
    }
}

fn int_column(vacancy: &Vacancy, column: Column) -> Option<i32> {
    match column {
        Column::SalaryFrom => vacancy.salary_from,
        Column::SalaryTo => vacancy.salary_to,
        _ => None,
    }
}

fn text_column(vacancy: &Vacancy, column: Column) -> Option<&str> {
    match column {
        Column::Name => Some(vacancy.name.as_str()),
        Column::Currency => vacancy.currency.as_deref(),
        Column::Region => vacancy.region.as_deref(),
        Column::Experience => vacancy.experience.as_deref(),
        _ => None,
    }
}

/// `%needle%` with LIKE metacharacters escaped so the needle matches literally.
pub fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
