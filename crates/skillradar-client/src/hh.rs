//! HeadHunter (api.hh.ru) vacancy and region fetching.

use std::collections::HashSet;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Deserialize;
use serde_json::Value;
use skillradar_core::error::{AppError, FetchCause};
use skillradar_core::models::{RawVacancy, Region};
use skillradar_core::traits::{JsonClient, RegionFetcher, VacancyFetcher};
use url::Url;

use crate::http::{ReqwestJsonClient, decode};

pub const DEFAULT_API_URL: &str = "https://api.hh.ru/";
/// Largest page the list endpoint serves.
pub const PAGE_SIZE: usize = 100;

/// Connection and paging settings for the HeadHunter API.
#[derive(Debug, Clone)]
pub struct HhConfig {
    pub base_url: Url,
    /// HeadHunter rejects requests without a descriptive User-Agent.
    pub user_agent: String,
    pub timeout: Duration,
    pub page_size: usize,
    /// Detail requests in flight at once. Results keep list order.
    pub detail_concurrency: usize,
}

impl HhConfig {
    /// Point at a different API root, e.g. a local stub.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, AppError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        self.base_url = Url::parse(&normalized)
            .map_err(|e| AppError::Config(format!("Invalid API URL '{base_url}': {e}")))?;
        Ok(self)
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, PAGE_SIZE);
        self
    }

    pub fn with_detail_concurrency(mut self, concurrency: usize) -> Self {
        self.detail_concurrency = concurrency.max(1);
        self
    }
}

impl Default for HhConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            user_agent: "SkillRadar/0.1 (vacancy research)".to_string(),
            timeout: Duration::from_secs(30),
            page_size: PAGE_SIZE,
            detail_concurrency: 1,
        }
    }
}

/// Fetches vacancies and regions from HeadHunter.
///
/// The list endpoint returns abbreviated records, so every accepted list
/// item costs one more request to the detail endpoint. A failed detail
/// request, or a list item without an id, fails the whole fetch.
#[derive(Clone)]
pub struct HhFetcher<C = ReqwestJsonClient> {
    client: C,
    config: HhConfig,
}

impl HhFetcher<ReqwestJsonClient> {
    /// Build a fetcher with a reqwest client configured from `config`.
    pub fn new(config: HhConfig) -> Result<Self, AppError> {
        let client = ReqwestJsonClient::with_options(&config.user_agent, config.timeout)?;
        Ok(Self { client, config })
    }
}

impl<C: JsonClient> HhFetcher<C> {
    pub fn with_client(client: C, config: HhConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self, path: &str) -> Result<String, AppError> {
        self.config
            .base_url
            .join(path)
            .map(String::from)
            .map_err(|e| AppError::Config(format!("Invalid endpoint '{path}': {e}")))
    }

    /// Enrich list items into full records, preserving their order.
    async fn fetch_details(&self, ids: Vec<String>) -> Result<Vec<RawVacancy>, AppError> {
        let requests = ids
            .into_iter()
            .map(|id| -> Result<(String, String), AppError> {
                Ok((self.endpoint(&format!("vacancies/{id}"))?, id))
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        let client = self.client.clone();
        stream::iter(requests)
            .map(move |(url, id)| fetch_detail(client.clone(), url, id))
            .buffered(self.config.detail_concurrency.max(1))
            .try_collect()
            .await
    }
}

async fn fetch_detail<C: JsonClient>(
    client: C,
    url: String,
    list_id: String,
) -> Result<RawVacancy, AppError> {
    let detail = client.get_json(&url, &[]).await?;
    Ok(raw_from_detail(list_id, detail))
}

/// One page of the list endpoint. Only the fields pagination needs.
#[derive(Deserialize)]
struct VacancyPage {
    #[serde(default)]
    items: Vec<Value>,
    #[serde(default)]
    pages: Option<u32>,
}

/// HeadHunter sends ids as strings; accept numbers too.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn str_field(detail: &Value, key: &str) -> Option<String> {
    detail.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Map a detail document into the raw transport shape.
///
/// The id stays the one the list endpoint reported, since deduplication is
/// keyed on it.
fn raw_from_detail(list_id: String, detail: Value) -> RawVacancy {
    RawVacancy {
        id: list_id,
        name: str_field(&detail, "name").unwrap_or_default(),
        description: str_field(&detail, "description"),
        branded_description: str_field(&detail, "branded_description"),
        key_skills: detail
            .get("key_skills")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        area: detail.get("area").and_then(Value::as_object).cloned(),
        detail: Some(detail),
    }
}

impl<C: JsonClient> VacancyFetcher for HhFetcher<C> {
    async fn fetch(
        &self,
        search_query: &str,
        total_vacancies: usize,
        region_id: Option<u32>,
    ) -> Result<Vec<RawVacancy>, AppError> {
        let mut vacancies: Vec<RawVacancy> = Vec::new();
        if total_vacancies == 0 {
            return Ok(vacancies);
        }

        let list_url = self.endpoint("vacancies")?;
        let mut seen = HashSet::new();
        let mut page: u32 = 0;

        loop {
            let mut query = vec![
                ("text", search_query.to_string()),
                ("per_page", self.config.page_size.to_string()),
                ("page", page.to_string()),
            ];
            if let Some(region) = region_id {
                query.push(("area", region.to_string()));
            }

            let body = self.client.get_json(&list_url, &query).await?;
            let listing: VacancyPage = decode(&list_url, body)?;
            if listing.items.is_empty() {
                tracing::debug!(page, "Empty page, stopping");
                break;
            }

            let remaining = total_vacancies - vacancies.len();
            let mut ids: Vec<String> = Vec::new();
            for item in &listing.items {
                if ids.len() == remaining {
                    break;
                }
                let Some(id) = item.get("id").and_then(id_string) else {
                    return Err(AppError::fetch(
                        FetchCause::Request,
                        format!("List item without an id on page {page} of {list_url}"),
                    ));
                };
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
            let new_on_page = ids.len();

            vacancies.extend(self.fetch_details(ids).await?);
            tracing::info!(
                page,
                pages = ?listing.pages,
                fetched = vacancies.len(),
                "Fetched page"
            );

            if vacancies.len() >= total_vacancies {
                break;
            }
            match listing.pages {
                Some(pages) if page + 1 >= pages => break,
                // Without a page count, a page of repeats means the source is stuck.
                None if new_on_page == 0 => break,
                _ => page += 1,
            }
        }

        vacancies.truncate(total_vacancies);
        Ok(vacancies)
    }
}

/// A node of the `/areas` tree.
#[derive(Deserialize)]
struct AreaNode {
    id: Value,
    name: String,
    #[serde(default)]
    parent_id: Option<Value>,
    #[serde(default)]
    areas: Vec<AreaNode>,
}

/// Flatten the area tree depth-first, parents before children.
fn flatten_areas(nodes: Vec<AreaNode>, out: &mut Vec<Region>) {
    for node in nodes {
        let Some(id) = id_string(&node.id) else {
            continue;
        };
        out.push(Region {
            id,
            name: node.name,
            parent_id: node.parent_id.as_ref().and_then(id_string),
        });
        flatten_areas(node.areas, out);
    }
}

impl<C: JsonClient> RegionFetcher for HhFetcher<C> {
    async fn fetch_regions(&self) -> Result<Vec<Region>, AppError> {
        let url = self.endpoint("areas")?;
        let body = self.client.get_json(&url, &[]).await?;
        let tree: Vec<AreaNode> = decode(&url, body)?;

        let mut regions = Vec::new();
        flatten_areas(tree, &mut regions);
        tracing::info!(count = regions.len(), "Fetched regions");
        Ok(regions)
    }
}
