use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json, Redirect},
    Form,
};
use tracing::info;
use validator::Validate;

use crate::{
    dto::vacancy_dto::{ResultsQuery, SearchForm, VacancyListResponse},
    error::Result,
    AppState,
};

pub const FIRST_RESULTS_PAGE: &str = "/results?page=1";

#[utoipa::path(
    post,
    path = "/search",
    request_body(content = SearchForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Search finished, redirect to the first results page"),
        (status = 400, description = "Keyword is missing"),
        (status = 502, description = "Job board request failed")
    )
)]
#[axum::debug_handler]
pub async fn search_vacancies(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> Result<impl IntoResponse> {
    form.validate()?;
    let report = state.ingest_service.ingest(&form.keyword).await?;
    info!(
        keyword = %form.keyword,
        total_saved = report.total_saved,
        "Search stored, redirecting to results"
    );
    Ok(Redirect::to(FIRST_RESULTS_PAGE))
}

#[utoipa::path(
    get,
    path = "/results",
    params(
        ("page" = Option<i64>, Query, description = "Page number, starting at 1"),
        ("salary_from" = Option<i32>, Query, description = "Minimum salary_from"),
        ("salary_to" = Option<i32>, Query, description = "Maximum salary_to"),
        ("region" = Option<String>, Query, description = "Region substring"),
        ("experience" = Option<String>, Query, description = "Experience substring"),
        ("keyword" = Option<String>, Query, description = "Vacancy name substring"),
        ("currency" = Option<String>, Query, description = "Currency substring")
    ),
    responses(
        (status = 200, description = "Page of stored vacancies", body = Json<VacancyListResponse>),
        (status = 400, description = "Invalid page or filter value")
    )
)]
#[axum::debug_handler]
pub async fn show_vacancies(
    State(state): State<AppState>,
    Query(query): Query<ResultsQuery>,
) -> Result<impl IntoResponse> {
    let page = query.page()?;
    let filters = query.filters()?;
    let result = state.listing_service.list_page(&filters, page).await?;
    Ok(Json(VacancyListResponse::new(result, filters)))
}
