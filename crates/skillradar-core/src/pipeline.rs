use chrono::Utc;

use crate::error::AppError;
use crate::models::NormalizedVacancy;
use crate::traits::{
    Analyzer, ArtifactStore, Cleaner, Extractor, Normalizer, NullStage, PassthroughCleaner,
    VacancyFetcher,
};
use crate::util::run_name;

/// Orchestrates one run: fetch → save raw → normalize → save normalized →
/// optional extract/analyze stages.
///
/// Generic over all collaborators via traits, so tests inject mocks and no
/// real HTTP is needed. Extraction and analysis are off until a stage is
/// attached with [`with_extractor`](Self::with_extractor) or
/// [`with_analyzer`](Self::with_analyzer).
pub struct Pipeline<F, N, S, C = PassthroughCleaner, X = NullStage, A = NullStage>
where
    F: VacancyFetcher,
    N: Normalizer,
    S: ArtifactStore,
    C: Cleaner,
    X: Extractor,
    A: Analyzer,
{
    fetcher: F,
    normalizer: N,
    store: S,
    cleaner: C,
    extractor: Option<X>,
    analyzer: Option<A>,
}

impl<F, N, S> Pipeline<F, N, S>
where
    F: VacancyFetcher,
    N: Normalizer,
    S: ArtifactStore,
{
    /// Create a pipeline without extraction or analysis stages.
    pub fn new(fetcher: F, normalizer: N, store: S) -> Self {
        Self {
            fetcher,
            normalizer,
            store,
            cleaner: PassthroughCleaner,
            extractor: None,
            analyzer: None,
        }
    }
}

impl<F, N, S, C, X, A> Pipeline<F, N, S, C, X, A>
where
    F: VacancyFetcher,
    N: Normalizer,
    S: ArtifactStore,
    C: Cleaner,
    X: Extractor,
    A: Analyzer,
{
    /// Clean descriptions with `cleaner` before handing them to the stages.
    pub fn with_cleaner<C2: Cleaner>(self, cleaner: C2) -> Pipeline<F, N, S, C2, X, A> {
        Pipeline {
            fetcher: self.fetcher,
            normalizer: self.normalizer,
            store: self.store,
            cleaner,
            extractor: self.extractor,
            analyzer: self.analyzer,
        }
    }

    pub fn with_extractor<X2: Extractor>(self, extractor: X2) -> Pipeline<F, N, S, C, X2, A> {
        Pipeline {
            fetcher: self.fetcher,
            normalizer: self.normalizer,
            store: self.store,
            cleaner: self.cleaner,
            extractor: Some(extractor),
            analyzer: self.analyzer,
        }
    }

    pub fn with_analyzer<A2: Analyzer>(self, analyzer: A2) -> Pipeline<F, N, S, C, X, A2> {
        Pipeline {
            fetcher: self.fetcher,
            normalizer: self.normalizer,
            store: self.store,
            cleaner: self.cleaner,
            extractor: self.extractor,
            analyzer: Some(analyzer),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the pipeline, naming artifacts after the current UTC time.
    pub async fn run(
        &self,
        search_query: &str,
        total_vacancies: usize,
        region_id: Option<u32>,
    ) -> Result<Vec<NormalizedVacancy>, AppError> {
        let name = run_name(Utc::now());
        self.run_named(&name, search_query, total_vacancies, region_id)
            .await
    }

    /// Run the pipeline, storing the raw and normalized batches as `name`.
    ///
    /// 1. Fetch raw vacancies
    /// 2. Persist the raw batch
    /// 3. Normalize each record, dropping the ones that fail
    /// 4. Persist the normalized batch
    /// 5. Extract/analyze each vacancy, if stages are attached
    ///
    /// A fetch or storage error aborts the run. Per-record normalization and
    /// stage failures are logged and skipped.
    pub async fn run_named(
        &self,
        name: &str,
        search_query: &str,
        total_vacancies: usize,
        region_id: Option<u32>,
    ) -> Result<Vec<NormalizedVacancy>, AppError> {
        // 1. Fetch
        tracing::info!(
            query = %search_query,
            total = total_vacancies,
            region = ?region_id,
            "Fetching vacancies"
        );
        let raw = self
            .fetcher
            .fetch(search_query, total_vacancies, region_id)
            .await?;
        tracing::info!(count = raw.len(), "Fetched raw vacancies");

        // 2. Persist raw
        self.store.save_raw(name, &raw)?;
        tracing::debug!(run = %name, "Saved raw batch");

        // 3. Normalize
        let mut normalized = Vec::with_capacity(raw.len());
        for record in &raw {
            match self.normalizer.normalize(record) {
                Ok(vacancy) => normalized.push(vacancy),
                Err(e) => {
                    tracing::warn!(
                        vacancy_id = %record.id,
                        error = %e,
                        "Dropping vacancy that failed normalization"
                    );
                }
            }
        }
        tracing::info!(
            normalized = normalized.len(),
            dropped = raw.len() - normalized.len(),
            "Normalization complete"
        );

        // 4. Persist normalized
        self.store.save_normalized(name, &normalized)?;

        // 5. Downstream stages
        if self.extractor.is_some() || self.analyzer.is_some() {
            for vacancy in &normalized {
                self.run_stages(vacancy).await?;
            }
        }

        Ok(normalized)
    }

    /// Only storage failures escape; stage failures are logged.
    async fn run_stages(&self, vacancy: &NormalizedVacancy) -> Result<(), AppError> {
        let html = vacancy.description.as_deref().unwrap_or_default();
        let text = match self.cleaner.clean(html) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(vacancy_id = %vacancy.id, error = %e, "Skipping stages");
                return Ok(());
            }
        };

        if let Some(extractor) = &self.extractor {
            match extractor.extract(&vacancy.id, &text).await {
                Ok(result) => self.store.save_extraction(&result)?,
                Err(e) => {
                    tracing::warn!(vacancy_id = %vacancy.id, error = %e, "Extraction failed");
                }
            }
        }

        if let Some(analyzer) = &self.analyzer {
            match analyzer.analyze(&vacancy.id, &text).await {
                Ok(result) => self.store.save_analysis(&result)?,
                Err(e) => {
                    tracing::warn!(vacancy_id = %vacancy.id, error = %e, "Analysis failed");
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchCause;
    use crate::models::RawVacancy;
    use crate::normalize::HhNormalizer;
    use crate::testutil::*;

    fn three_with_bad_middle() -> Vec<RawVacancy> {
        vec![
            make_raw_vacancy("1", "Rust Developer"),
            RawVacancy {
                id: String::new(),
                name: "No id".into(),
                ..Default::default()
            },
            make_raw_vacancy("3", "Backend Engineer"),
        ]
    }

    #[tokio::test]
    async fn happy_path_saves_raw_and_normalized() {
        let store = MockStore::empty();
        let fetcher = MockFetcher::new(vec![
            make_raw_vacancy("1", "Rust Developer"),
            make_raw_vacancy("2", "Go Developer"),
        ]);
        let pipeline = Pipeline::new(fetcher.clone(), HhNormalizer::new(), store.clone());

        let result = pipeline
            .run_named("run_1", "rust", 10, Some(1))
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "1");
        assert_eq!(result[1].url, "https://hh.ru/vacancy/2");
        assert_eq!(
            fetcher.calls.lock().unwrap()[0],
            ("rust".to_string(), 10, Some(1))
        );

        let raw = store.load_raw("run_1").unwrap();
        assert_eq!(raw.as_array().unwrap().len(), 2);
        assert_eq!(store.load_normalized("run_1").unwrap(), result);
    }

    #[tokio::test]
    async fn normalization_failure_drops_record_only() {
        let store = MockStore::empty();
        let pipeline = Pipeline::new(
            MockFetcher::new(three_with_bad_middle()),
            HhNormalizer::new(),
            store.clone(),
        );

        let result = pipeline.run_named("run", "dev", 3, None).await.unwrap();

        let ids: Vec<_> = result.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        // The raw artifact keeps every fetched record, including the bad one.
        assert_eq!(store.load_raw("run").unwrap().as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn fetch_error_propagates_and_saves_nothing() {
        let store = MockStore::empty();
        let pipeline = Pipeline::new(
            MockFetcher::with_error(AppError::fetch(FetchCause::NoConnection, "offline")),
            HhNormalizer::new(),
            store.clone(),
        );

        let err = pipeline.run_named("run", "dev", 5, None).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Fetch {
                cause: FetchCause::NoConnection,
                ..
            }
        ));
        assert!(store.raw.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_error_aborts_run() {
        let pipeline = Pipeline::new(
            MockFetcher::new(vec![make_raw_vacancy("1", "Dev")]),
            HhNormalizer::new(),
            MockStore::with_save_error("disk full"),
        );

        let err = pipeline.run_named("run", "dev", 5, None).await.unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
    }

    #[tokio::test]
    async fn run_names_artifacts_by_timestamp() {
        let store = MockStore::empty();
        let pipeline = Pipeline::new(
            MockFetcher::new(vec![make_raw_vacancy("1", "Dev")]),
            HhNormalizer::new(),
            store.clone(),
        );

        pipeline.run("dev", 1, None).await.unwrap();

        let names: Vec<String> = store.raw.lock().unwrap().keys().cloned().collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("vacancies_"));
        assert!(store.load_normalized(&names[0]).is_ok());
    }

    #[tokio::test]
    async fn zero_total_yields_empty_batch() {
        let store = MockStore::empty();
        let pipeline = Pipeline::new(
            MockFetcher::new(vec![make_raw_vacancy("1", "Dev")]),
            HhNormalizer::new(),
            store.clone(),
        );

        let result = pipeline.run_named("empty", "dev", 0, None).await.unwrap();

        assert!(result.is_empty());
        assert_eq!(store.load_raw("empty").unwrap(), serde_json::json!([]));
    }

    #[tokio::test]
    async fn stages_receive_cleaned_text_and_persist_results() {
        let store = MockStore::empty();
        let extractor = MockExtractor::new();
        let analyzer = MockAnalyzer::new();
        let pipeline = Pipeline::new(
            MockFetcher::new(vec![make_raw_vacancy("1", "Rust Developer")]),
            HhNormalizer::new(),
            store.clone(),
        )
        .with_cleaner(MockCleaner::strip_paragraphs())
        .with_extractor(extractor.clone())
        .with_analyzer(analyzer.clone());

        pipeline.run_named("run", "rust", 1, None).await.unwrap();

        let seen = extractor.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![("1".to_string(), "Rust Developer wanted".to_string())]
        );
        let extraction = store.load_extraction("1").unwrap();
        assert_eq!(extraction.data.len(), 3);
        let analysis = store.load_analysis("1").unwrap();
        assert_eq!(analysis.data["length"], serde_json::json!(21));
    }

    #[tokio::test]
    async fn stage_failure_skips_vacancy_and_continues() {
        let store = MockStore::empty();
        let pipeline = Pipeline::new(
            MockFetcher::new(vec![
                make_raw_vacancy("1", "Dev"),
                make_raw_vacancy("2", "Dev"),
            ]),
            HhNormalizer::new(),
            store.clone(),
        )
        .with_extractor(MockExtractor::failing_for(&["1"]))
        .with_analyzer(MockAnalyzer::failing_for(&["2"]));

        let result = pipeline.run_named("run", "dev", 2, None).await.unwrap();

        assert_eq!(result.len(), 2);
        assert!(store.load_extraction("1").unwrap_err().is_not_found());
        assert!(store.load_extraction("2").is_ok());
        assert!(store.load_analysis("1").is_ok());
        assert!(store.load_analysis("2").unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn cleaner_failure_skips_stages_for_that_vacancy() {
        let store = MockStore::empty();
        let extractor = MockExtractor::new();
        let pipeline = Pipeline::new(
            MockFetcher::new(vec![make_raw_vacancy("1", "Dev")]),
            HhNormalizer::new(),
            store.clone(),
        )
        .with_cleaner(MockCleaner::with_error("bad html"))
        .with_extractor(extractor.clone());

        let result = pipeline.run_named("run", "dev", 1, None).await.unwrap();

        assert_eq!(result.len(), 1);
        assert!(extractor.seen.lock().unwrap().is_empty());
        assert!(store.extraction.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_stages_means_no_stage_artifacts() {
        let store = MockStore::empty();
        let pipeline = Pipeline::new(
            MockFetcher::new(vec![make_raw_vacancy("1", "Dev")]),
            HhNormalizer::new(),
            store.clone(),
        );

        pipeline.run_named("run", "dev", 1, None).await.unwrap();

        assert!(store.analysis.lock().unwrap().is_empty());
        assert!(store.extraction.lock().unwrap().is_empty());
    }
}
