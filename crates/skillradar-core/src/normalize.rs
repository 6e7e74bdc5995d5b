//! HeadHunter record normalization.

use serde_json::Value;

use crate::error::AppError;
use crate::models::{NormalizedVacancy, RawVacancy};
use crate::traits::Normalizer;

pub const HH_SOURCE: &str = "HeadHunter";
pub const HH_LISTING_URL_BASE: &str = "https://hh.ru/vacancy/";

const DESCRIPTION_SEPARATOR: &str = "\n\n---\n\n";

/// Normalizes records produced by the HeadHunter fetcher.
#[derive(Debug, Clone)]
pub struct HhNormalizer {
    listing_url_base: String,
}

impl HhNormalizer {
    pub fn new() -> Self {
        Self {
            listing_url_base: HH_LISTING_URL_BASE.to_string(),
        }
    }

    /// Use a different public listing host, e.g. a regional mirror.
    pub fn with_listing_url_base(mut self, base: impl Into<String>) -> Self {
        self.listing_url_base = base.into();
        self
    }

    fn listing_url(&self, id: &str) -> String {
        format!("{}{}", self.listing_url_base, id)
    }
}

impl Default for HhNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for HhNormalizer {
    fn normalize(&self, raw: &RawVacancy) -> Result<NormalizedVacancy, AppError> {
        let detail = raw.detail.as_ref();

        let id = Some(raw.id.as_str()).filter(|id| !id.trim().is_empty());
        let url = id.map(|id| self.listing_url(id));
        let title = Some(raw.name.as_str()).filter(|name| !name.is_empty());

        let mut missing = Vec::new();
        if id.is_none() {
            missing.push("id");
        }
        if title.is_none() {
            missing.push("title");
        }
        if url.is_none() {
            missing.push("url");
        }
        let (Some(id), Some(title), Some(url)) = (id, title, url) else {
            return Err(AppError::Normalization {
                vacancy_id: id.map(str::to_string),
                missing,
            });
        };

        let company_name = detail
            .and_then(|d| d.get("employer"))
            .and_then(|e| e.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let location = raw
            .area
            .as_ref()
            .and_then(|area| area.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(NormalizedVacancy {
            id: id.to_string(),
            title: title.to_string(),
            url,
            source: HH_SOURCE.to_string(),
            company_name,
            description: Some(compose_description(
                detail_str(detail, "description").or(raw.description.as_deref()),
                detail_str(detail, "branded_description")
                    .or(raw.branded_description.as_deref()),
                raw.description.as_deref(),
            )),
            skills: skill_names(&raw.key_skills),
            location,
        })
    }
}

fn detail_str<'a>(detail: Option<&'a Value>, key: &str) -> Option<&'a str> {
    detail.and_then(|d| d.get(key)).and_then(Value::as_str)
}

/// Combine the full and branded descriptions.
///
/// The normalizer reads both from the detail document, falling back to the
/// record's own fields when the detail lacks them.
///
/// The branded text is appended after a separator when it differs from the
/// full text, or used alone when the full text is empty. If the result is
/// blank, the record-level description is used instead.
pub fn compose_description(
    full: Option<&str>,
    branded: Option<&str>,
    fallback: Option<&str>,
) -> String {
    let full = full.unwrap_or_default();
    let mut description = match branded {
        Some(branded) if !branded.is_empty() && branded != full => {
            if full.is_empty() {
                branded.to_string()
            } else {
                format!("{full}{DESCRIPTION_SEPARATOR}{branded}")
            }
        }
        _ => full.to_string(),
    };

    if description.trim().is_empty() {
        if let Some(fallback) = fallback.filter(|f| !f.is_empty()) {
            description = fallback.to_string();
        }
    }
    description
}

/// Pull the `name` out of each skill entry, dropping entries without one.
pub fn skill_names(key_skills: &[Value]) -> Vec<String> {
    key_skills
        .iter()
        .filter_map(|skill| skill.get("name").and_then(Value::as_str))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
