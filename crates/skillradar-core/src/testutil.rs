//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests. All mocks use
//! `Arc<Mutex<_>>` for interior mutability so tests can assert on recorded
//! calls. Compiled for this crate's tests and, through the `testutil`
//! feature, for dependants.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, FetchCause};
use crate::models::{AnalysisResult, ArtifactKind, ExtractionResult, NormalizedVacancy, RawVacancy};
use crate::traits::{Analyzer, ArtifactStore, Cleaner, Extractor, JsonClient, VacancyFetcher};

// ---------------------------------------------------------------------------
// MockJsonClient
// ---------------------------------------------------------------------------

/// A request seen by [`MockJsonClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

type Handler = dyn Fn(&str, &[(&str, String)]) -> Result<Value, AppError> + Send + Sync;

/// Mock JSON client answering from a handler function or a response queue.
#[derive(Clone)]
pub struct MockJsonClient {
    handler: Option<Arc<Handler>>,
    /// Each call pops the first element when no handler is set.
    responses: Arc<Mutex<Vec<Result<Value, AppError>>>>,
    pub calls: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockJsonClient {
    /// Route every request through `handler`.
    pub fn from_fn<H>(handler: H) -> Self
    where
        H: Fn(&str, &[(&str, String)]) -> Result<Value, AppError> + Send + Sync + 'static,
    {
        Self {
            handler: Some(Arc::new(handler)),
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer every request with the same document.
    pub fn always(value: Value) -> Self {
        Self::from_fn(move |_, _| Ok(value.clone()))
    }

    pub fn with_responses(responses: Vec<Result<Value, AppError>>) -> Self {
        Self {
            handler: None,
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl JsonClient for MockJsonClient {
    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, AppError> {
        self.calls.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });

        if let Some(handler) = &self.handler {
            return handler(url, query);
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(AppError::fetch(
                FetchCause::Request,
                format!("no mock response queued for {url}"),
            ))
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Recorded fetch call: (search_query, total_vacancies, region_id).
pub type FetchCall = (String, usize, Option<u32>);

/// Mock vacancy fetcher returning a fixed batch or a one-shot error.
#[derive(Clone)]
pub struct MockFetcher {
    vacancies: Vec<RawVacancy>,
    error: Arc<Mutex<Option<AppError>>>,
    pub calls: Arc<Mutex<Vec<FetchCall>>>,
}

impl MockFetcher {
    pub fn new(vacancies: Vec<RawVacancy>) -> Self {
        Self {
            vacancies,
            error: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            vacancies: Vec::new(),
            error: Arc::new(Mutex::new(Some(error))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl VacancyFetcher for MockFetcher {
    async fn fetch(
        &self,
        search_query: &str,
        total_vacancies: usize,
        region_id: Option<u32>,
    ) -> Result<Vec<RawVacancy>, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push((search_query.to_string(), total_vacancies, region_id));
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(self.vacancies.iter().take(total_vacancies).cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// MockCleaner
// ---------------------------------------------------------------------------

/// Mock cleaner that strips `<p>` tags, or fails for every input.
#[derive(Clone)]
pub struct MockCleaner {
    error: Option<String>,
}

impl MockCleaner {
    pub fn strip_paragraphs() -> Self {
        Self { error: None }
    }

    pub fn with_error(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
        }
    }
}

impl Cleaner for MockCleaner {
    fn clean(&self, html: &str) -> Result<String, AppError> {
        if let Some(message) = &self.error {
            return Err(AppError::Cleaner(message.clone()));
        }
        Ok(html.replace("<p>", "").replace("</p>", ""))
    }
}

// ---------------------------------------------------------------------------
// MockExtractor / MockAnalyzer
// ---------------------------------------------------------------------------

/// Mock extractor emitting one entity per whitespace-separated word.
/// Fails for the vacancy ids it was told to.
#[derive(Clone, Default)]
pub struct MockExtractor {
    failing: HashSet<String>,
    /// (vacancy_id, text) pairs seen so far.
    pub seen: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(ids: &[&str]) -> Self {
        Self {
            failing: ids.iter().map(|id| id.to_string()).collect(),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Extractor for MockExtractor {
    async fn extract(&self, vacancy_id: &str, text: &str) -> Result<ExtractionResult, AppError> {
        self.seen
            .lock()
            .unwrap()
            .push((vacancy_id.to_string(), text.to_string()));
        if self.failing.contains(vacancy_id) {
            return Err(AppError::Stage(format!("extractor rejected {vacancy_id}")));
        }
        let data = text
            .split_whitespace()
            .map(|word| {
                let mut entity = serde_json::Map::new();
                entity.insert("skill".into(), Value::String(word.to_string()));
                entity
            })
            .collect();
        Ok(ExtractionResult {
            vacancy_id: vacancy_id.to_string(),
            data,
        })
    }
}

/// Mock analyzer reporting the text length. Fails for chosen ids.
#[derive(Clone, Default)]
pub struct MockAnalyzer {
    failing: HashSet<String>,
    pub seen: Arc<Mutex<Vec<String>>>,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(ids: &[&str]) -> Self {
        Self {
            failing: ids.iter().map(|id| id.to_string()).collect(),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Analyzer for MockAnalyzer {
    async fn analyze(&self, vacancy_id: &str, text: &str) -> Result<AnalysisResult, AppError> {
        self.seen.lock().unwrap().push(vacancy_id.to_string());
        if self.failing.contains(vacancy_id) {
            return Err(AppError::Stage(format!("analyzer rejected {vacancy_id}")));
        }
        let mut result = AnalysisResult::new(vacancy_id);
        result
            .data
            .insert("length".into(), Value::from(text.chars().count()));
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// In-memory artifact store with optional save failures.
#[derive(Clone, Default)]
pub struct MockStore {
    pub raw: Arc<Mutex<HashMap<String, Value>>>,
    pub normalized: Arc<Mutex<HashMap<String, Vec<NormalizedVacancy>>>>,
    pub analysis: Arc<Mutex<HashMap<String, AnalysisResult>>>,
    pub extraction: Arc<Mutex<HashMap<String, ExtractionResult>>>,
    save_error: Option<String>,
}

impl MockStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Store whose every save fails with a storage error.
    pub fn with_save_error(message: &str) -> Self {
        Self {
            save_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    fn check_save(&self) -> Result<(), AppError> {
        match &self.save_error {
            Some(message) => Err(AppError::Storage(message.clone())),
            None => Ok(()),
        }
    }
}

fn not_found(namespace: ArtifactKind, name: &str) -> AppError {
    AppError::NotFound {
        namespace,
        name: name.to_string(),
    }
}

impl ArtifactStore for MockStore {
    fn ensure_storage_ready(&self) -> Result<(), AppError> {
        Ok(())
    }

    fn save_raw<T>(&self, name: &str, data: &T) -> Result<(), AppError>
    where
        T: Serialize + ?Sized,
    {
        self.check_save()?;
        let value = serde_json::to_value(data)?;
        self.raw.lock().unwrap().insert(name.to_string(), value);
        Ok(())
    }

    fn load_raw(&self, name: &str) -> Result<Value, AppError> {
        self.raw
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(ArtifactKind::Raw, name))
    }

    fn save_normalized(&self, name: &str, data: &[NormalizedVacancy]) -> Result<(), AppError> {
        self.check_save()?;
        self.normalized
            .lock()
            .unwrap()
            .insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn load_normalized(&self, name: &str) -> Result<Vec<NormalizedVacancy>, AppError> {
        self.normalized
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(ArtifactKind::Normalized, name))
    }

    fn save_analysis(&self, result: &AnalysisResult) -> Result<(), AppError> {
        self.check_save()?;
        self.analysis
            .lock()
            .unwrap()
            .insert(result.vacancy_id.clone(), result.clone());
        Ok(())
    }

    fn load_analysis(&self, vacancy_id: &str) -> Result<AnalysisResult, AppError> {
        self.analysis
            .lock()
            .unwrap()
            .get(vacancy_id)
            .cloned()
            .ok_or_else(|| not_found(ArtifactKind::Analysis, vacancy_id))
    }

    fn save_extraction(&self, result: &ExtractionResult) -> Result<(), AppError> {
        self.check_save()?;
        self.extraction
            .lock()
            .unwrap()
            .insert(result.vacancy_id.clone(), result.clone());
        Ok(())
    }

    fn load_extraction(&self, vacancy_id: &str) -> Result<ExtractionResult, AppError> {
        self.extraction
            .lock()
            .unwrap()
            .get(vacancy_id)
            .cloned()
            .ok_or_else(|| not_found(ArtifactKind::Extraction, vacancy_id))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A raw HeadHunter-shaped record with a detail document.
pub fn make_raw_vacancy(id: &str, name: &str) -> RawVacancy {
    let description = format!("<p>{name} wanted</p>");
    RawVacancy {
        id: id.to_string(),
        name: name.to_string(),
        description: Some(description.clone()),
        branded_description: None,
        key_skills: vec![serde_json::json!({"name": "Rust"})],
        area: Some(
            serde_json::json!({"id": "1", "name": "Москва"})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        ),
        detail: Some(serde_json::json!({
            "id": id,
            "name": name,
            "description": description,
            "employer": {"name": "Acme"},
        })),
    }
}
