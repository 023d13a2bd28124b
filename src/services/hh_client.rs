use async_trait::async_trait;
use reqwest::Client;
use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::Value as JsonValue;
use tracing::{debug, instrument, warn};
use url::Url;
use validator::Validate;

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::models::vacancy::NewVacancy;

/// One page of raw postings from the external job board.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VacancySource: Send + Sync {
    /// Returns the raw `items` of the requested page. Any non-success status is
    /// reported as [`Error::Upstream`].
    async fn fetch_page(&self, keyword: &str, page: u32, per_page: u32) -> Result<Vec<JsonValue>>;
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    // Missing and null lists both mean the board has nothing more.
    #[serde(default)]
    items: Option<Vec<JsonValue>>,
    found: Option<u64>,
    pages: Option<u32>,
}

#[derive(Clone)]
pub struct HhClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
    user_agent: String,
}

impl HhClient {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        let token = config.token.clone().filter(|t| !t.trim().is_empty());

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token,
            user_agent: config.user_agent.clone(),
        })
    }
}

#[async_trait]
impl VacancySource for HhClient {
    #[instrument(skip(self))]
    async fn fetch_page(&self, keyword: &str, page: u32, per_page: u32) -> Result<Vec<JsonValue>> {
        let mut request = self
            .client
            .get(self.base_url.clone())
            .query(&[("text", keyword)])
            .query(&[("per_page", per_page), ("page", page)])
            .header("HH-User-Agent", &self.user_agent);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Vacancy API returned an error status");
            return Err(Error::Upstream {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        let data: SearchPage = serde_json::from_slice(&bytes)?;
        let items = data.items.unwrap_or_default();
        debug!(
            received = items.len(),
            found = ?data.found,
            pages = ?data.pages,
            "Fetched vacancy page"
        );
        Ok(items)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("malformed item: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid item: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

#[derive(Debug, Deserialize)]
struct HhVacancy {
    name: Option<String>,
    employer: Option<HhNamed>,
    salary: Option<HhSalary>,
    alternate_url: Option<String>,
    area: Option<HhArea>,
    experience: Option<HhNamed>,
    employment: Option<HhNamed>,
}

#[derive(Debug, Deserialize)]
struct HhNamed {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HhSalary {
    from: Option<i32>,
    to: Option<i32>,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HhArea {
    #[serde(default, deserialize_with = "deserialize_area_id")]
    id: Option<i32>,
    name: Option<String>,
}

// hh.ru sends area ids as strings ("1"), other boards as numbers.
fn deserialize_area_id<'de, D>(deserializer: D) -> std::result::Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AreaId {
        Int(i64),
        String(String),
    }

    match Option::<AreaId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(AreaId::Int(i)) => i32::try_from(i)
            .map(Some)
            .map_err(|_| D::Error::custom(format!("Area id out of range: {}", i))),
        Some(AreaId::String(s)) => s
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("Invalid area id: {}", s))),
    }
}

fn required(value: Option<String>, field: &'static str) -> std::result::Result<String, MappingError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(MappingError::MissingField(field))
}

fn named(value: Option<HhNamed>) -> Option<String> {
    value.and_then(|n| n.name)
}

/// Flattens one raw posting into the stored schema.
pub fn map_item(item: &JsonValue) -> std::result::Result<NewVacancy, MappingError> {
    let raw: HhVacancy = serde_json::from_value(item.clone())?;

    let name = required(raw.name, "name")?;
    let company = required(named(raw.employer), "employer.name")?;
    let url = required(raw.alternate_url, "alternate_url")?;

    let (salary_from, salary_to, currency) = match raw.salary {
        Some(s) => (s.from, s.to, s.currency),
        None => (None, None, None),
    };
    let (region_id, region) = match raw.area {
        Some(a) => (a.id, a.name),
        None => (None, None),
    };

    let record = NewVacancy {
        name,
        company,
        salary_from,
        salary_to,
        currency,
        url,
        region_id,
        region,
        experience: named(raw.experience),
        employment: named(raw.employment),
    };
    record.validate()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_item;
    use serde_json::json;

    #[test]
    fn maps_nested_objects_to_flat_columns() {
        let item = json!({
            "name": "Rust developer",
            "employer": { "name": "Acme" },
            "salary": { "from": 150000, "to": 250000, "currency": "RUR" },
            "alternate_url": "https://hh.ru/vacancy/42",
            "area": { "id": "1", "name": "Москва" },
            "experience": { "name": "От 3 до 6 лет" },
            "employment": { "name": "Полная занятость" }
        });

        let record = map_item(&item).unwrap();
        assert_eq!(
            record,
            NewVacancy {
                name: "Rust developer".into(),
                company: "Acme".into(),
                salary_from: Some(150_000),
                salary_to: Some(250_000),
                currency: Some("RUR".into()),
                url: "https://hh.ru/vacancy/42".into(),
                region_id: Some(1),
                region: Some("Москва".into()),
                experience: Some("От 3 до 6 лет".into()),
                employment: Some("Полная занятость".into()),
            }
        );
    }

    #[test]
    fn null_salary_and_missing_optionals_are_absent() {
        let item = json!({
            "name": "Intern",
            "employer": { "name": "Acme" },
            "salary": null,
            "alternate_url": "https://hh.ru/vacancy/7",
            "area": { "id": 2, "name": "Санкт-Петербург" }
        });

        let record = map_item(&item).unwrap();
        assert_eq!(record.salary_from, None);
        assert_eq!(record.salary_to, None);
        assert_eq!(record.currency, None);
        assert_eq!(record.region_id, Some(2));
        assert_eq!(record.experience, None);
        assert_eq!(record.employment, None);
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let mut item = sample_item(1);
        item["employer"] = JsonValue::Null;
        assert!(matches!(
            map_item(&item),
            Err(MappingError::MissingField("employer.name"))
        ));

        let mut item = sample_item(2);
        item.as_object_mut().unwrap().remove("alternate_url");
        assert!(matches!(
            map_item(&item),
            Err(MappingError::MissingField("alternate_url"))
        ));

        let mut item = sample_item(3);
        item["name"] = json!("  ");
        assert!(matches!(
            map_item(&item),
            Err(MappingError::MissingField("name"))
        ));
    }

    #[test]
    fn wrong_types_are_malformed() {
        let mut item = sample_item(1);
        item["salary"] = json!({ "from": "a lot" });
        assert!(matches!(map_item(&item), Err(MappingError::Malformed(_))));

        let mut item = sample_item(2);
        item["area"] = json!({ "id": "moscow", "name": "Москва" });
        assert!(matches!(map_item(&item), Err(MappingError::Malformed(_))));

        assert!(matches!(
            map_item(&json!("not an object")),
            Err(MappingError::Malformed(_))
        ));
    }

    mod board {
        use std::collections::HashMap;
        use std::sync::{Arc, Mutex};
        use std::time::Duration;

        use axum::extract::{Query, RawQuery, State};
        use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
        use axum::routing::get;
        use axum::{Json, Router};
        use serde_json::json;

        use super::*;
        use crate::services::ingest_service::IngestService;
        use crate::testing::{sample_item, InMemoryVacancyStore};

        #[derive(Debug, Clone, PartialEq)]
        struct Seen {
            query: Option<String>,
            authorization: Option<String>,
        }

        type Requests = Arc<Mutex<Vec<Seen>>>;

        fn record(requests: &Requests, query: Option<String>, headers: &HeaderMap) {
            let authorization = headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            requests.lock().unwrap().push(Seen {
                query,
                authorization,
            });
        }

        async fn ok(
            State(requests): State<Requests>,
            RawQuery(query): RawQuery,
            headers: HeaderMap,
        ) -> Json<JsonValue> {
            record(&requests, query, &headers);
            Json(json!({ "items": [sample_item(1)], "found": 1, "pages": 1 }))
        }

        async fn forbidden() -> (StatusCode, Json<JsonValue>) {
            (
                StatusCode::FORBIDDEN,
                Json(json!({ "errors": [{ "type": "forbidden" }] })),
            )
        }

        async fn null_items() -> Json<JsonValue> {
            Json(json!({ "items": null, "found": 0 }))
        }

        async fn no_items() -> Json<JsonValue> {
            Json(json!({ "found": 0 }))
        }

        // First page has two postings, the next one reports a null list.
        async fn paged(Query(params): Query<HashMap<String, String>>) -> Json<JsonValue> {
            match params.get("page").map(String::as_str) {
                Some("0") => Json(json!({ "items": [sample_item(1), sample_item(2)] })),
                _ => Json(json!({ "items": null })),
            }
        }

        async fn serve() -> (String, Requests) {
            let requests = Requests::default();
            let app = Router::new()
                .route("/ok", get(ok))
                .route("/forbidden", get(forbidden))
                .route("/null", get(null_items))
                .route("/empty", get(no_items))
                .route("/paged", get(paged))
                .with_state(requests.clone());

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                let _ = axum::serve(listener, app).await;
            });
            (format!("http://{}", addr), requests)
        }

        fn client(base: &str, path: &str, token: Option<&str>) -> HhClient {
            HhClient::new(&SourceConfig {
                base_url: Url::parse(&format!("{}{}", base, path)).unwrap(),
                token: token.map(str::to_string),
                user_agent: "vacancy-search-tests".into(),
                timeout: Duration::from_secs(5),
            })
            .unwrap()
        }

        #[tokio::test]
        async fn sends_keyword_paging_and_token() {
            let (base, requests) = serve().await;

            let items = client(&base, "/ok", Some("tok"))
                .fetch_page("rust dev", 3, 100)
                .await
                .unwrap();

            assert_eq!(items, vec![sample_item(1)]);
            assert_eq!(
                requests.lock().unwrap().clone(),
                vec![Seen {
                    query: Some("text=rust+dev&per_page=100&page=3".into()),
                    authorization: Some("Bearer tok".into()),
                }]
            );
        }

        #[tokio::test]
        async fn blank_token_sends_no_authorization() {
            let (base, requests) = serve().await;

            client(&base, "/ok", Some("  "))
                .fetch_page("rust", 0, 100)
                .await
                .unwrap();

            let seen = requests.lock().unwrap().clone();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].authorization, None);
        }

        #[tokio::test]
        async fn error_status_is_reported_as_upstream() {
            let (base, _) = serve().await;

            let err = client(&base, "/forbidden", None)
                .fetch_page("rust", 0, 100)
                .await
                .unwrap_err();

            assert!(matches!(err, Error::Upstream { status: 403 }));
        }

        #[tokio::test]
        async fn null_or_missing_items_are_an_empty_page() {
            let (base, _) = serve().await;

            for path in ["/null", "/empty"] {
                let items = client(&base, path, None)
                    .fetch_page("rust", 0, 100)
                    .await
                    .unwrap();
                assert!(items.is_empty(), "{} should yield no items", path);
            }
        }

        #[tokio::test]
        async fn null_items_end_a_search_cleanly() {
            let (base, _) = serve().await;
            let store = InMemoryVacancyStore::new();
            let service = IngestService::new(
                Arc::new(client(&base, "/paged", None)),
                Arc::new(store.clone()),
            );

            let report = service.ingest("rust").await.unwrap();

            assert_eq!(report.pages_fetched, 2);
            assert_eq!(report.persisted, 2);
            assert_eq!(store.rows().len(), 2);
        }
    }

    #[test]
    fn oversized_columns_are_rejected() {
        let mut item = sample_item(1);
        item["salary"]["currency"] = json!("NOT-A-CURRENCY");
        assert!(matches!(map_item(&item), Err(MappingError::Invalid(_))));
    }
}
