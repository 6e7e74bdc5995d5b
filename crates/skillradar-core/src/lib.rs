pub mod error;
pub mod models;
pub mod normalize;
pub mod pipeline;
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;
pub mod throttle;
pub mod traits;
pub mod util;

pub use error::{AppError, FetchCause};
pub use models::{
    AnalysisResult, ArtifactKind, ExtractionResult, NormalizedVacancy, RawVacancy, Region,
};
pub use normalize::HhNormalizer;
pub use pipeline::Pipeline;
pub use traits::{
    Analyzer, ArtifactStore, Cleaner, Extractor, JsonClient, Normalizer, RegionFetcher,
    VacancyFetcher,
};
pub use util::run_name;
