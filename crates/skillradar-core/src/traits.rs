use std::future::Future;

use serde::Serialize;

use crate::error::AppError;
use crate::models::{AnalysisResult, ExtractionResult, NormalizedVacancy, RawVacancy, Region};

/// Issues a GET request and decodes the JSON response body.
///
/// Every transport failure comes back as [`AppError::Fetch`].
pub trait JsonClient: Send + Sync + Clone {
    fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> impl Future<Output = Result<serde_json::Value, AppError>> + Send;
}

/// Fetches vacancies matching a search query from one source.
pub trait VacancyFetcher: Send + Sync + Clone {
    /// Returns at most `total_vacancies` records in source order.
    ///
    /// `region_id` of `None` applies no region filter.
    fn fetch(
        &self,
        search_query: &str,
        total_vacancies: usize,
        region_id: Option<u32>,
    ) -> impl Future<Output = Result<Vec<RawVacancy>, AppError>> + Send;
}

/// Fetches the regions a source accepts as search filters.
pub trait RegionFetcher: Send + Sync + Clone {
    fn fetch_regions(&self) -> impl Future<Output = Result<Vec<Region>, AppError>> + Send;
}

/// Maps one source record into the canonical vacancy shape.
pub trait Normalizer: Send + Sync + Clone {
    /// Fails with [`AppError::Normalization`] when id, title or url cannot be
    /// resolved.
    fn normalize(&self, raw: &RawVacancy) -> Result<NormalizedVacancy, AppError>;
}

/// Converts HTML-bearing text into plain text for the extraction stages.
pub trait Cleaner: Send + Sync + Clone {
    fn clean(&self, html: &str) -> Result<String, AppError>;
}

/// Extracts skills or other entities from a vacancy's text.
pub trait Extractor: Send + Sync + Clone {
    fn extract(
        &self,
        vacancy_id: &str,
        text: &str,
    ) -> impl Future<Output = Result<ExtractionResult, AppError>> + Send;
}

/// Produces an analyzer-specific summary of a vacancy's text.
pub trait Analyzer: Send + Sync + Clone {
    fn analyze(
        &self,
        vacancy_id: &str,
        text: &str,
    ) -> impl Future<Output = Result<AnalysisResult, AppError>> + Send;
}

/// Persists and reloads pipeline artifacts.
///
/// Each artifact class lives in its own namespace, so a raw and a normalized
/// artifact may share a name. Saving over an existing name replaces it.
pub trait ArtifactStore: Send + Sync + Clone {
    /// Create whatever backing structure the store needs. Idempotent.
    fn ensure_storage_ready(&self) -> Result<(), AppError>;

    /// Save any JSON-serializable payload verbatim.
    fn save_raw<T>(&self, name: &str, data: &T) -> Result<(), AppError>
    where
        T: Serialize + ?Sized;

    fn load_raw(&self, name: &str) -> Result<serde_json::Value, AppError>;

    fn save_normalized(&self, name: &str, data: &[NormalizedVacancy]) -> Result<(), AppError>;

    fn load_normalized(&self, name: &str) -> Result<Vec<NormalizedVacancy>, AppError>;

    /// Keyed by `result.vacancy_id`.
    fn save_analysis(&self, result: &AnalysisResult) -> Result<(), AppError>;

    fn load_analysis(&self, vacancy_id: &str) -> Result<AnalysisResult, AppError>;

    /// Keyed by `result.vacancy_id`.
    fn save_extraction(&self, result: &ExtractionResult) -> Result<(), AppError>;

    fn load_extraction(&self, vacancy_id: &str) -> Result<ExtractionResult, AppError>;
}

/// Cleaner that hands text through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCleaner;

impl Cleaner for PassthroughCleaner {
    fn clean(&self, html: &str) -> Result<String, AppError> {
        Ok(html.to_string())
    }
}

/// Placeholder for a pipeline stage that is not configured.
///
/// Never invoked: the pipeline only calls stages it was given.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStage;

impl Extractor for NullStage {
    async fn extract(&self, vacancy_id: &str, _text: &str) -> Result<ExtractionResult, AppError> {
        Ok(ExtractionResult::new(vacancy_id))
    }
}

impl Analyzer for NullStage {
    async fn analyze(&self, vacancy_id: &str, _text: &str) -> Result<AnalysisResult, AppError> {
        Ok(AnalysisResult::new(vacancy_id))
    }
}
