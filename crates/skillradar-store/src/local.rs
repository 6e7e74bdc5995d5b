use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;
use skillradar_core::AppError;
use skillradar_core::models::{AnalysisResult, ArtifactKind, ExtractionResult, NormalizedVacancy};
use skillradar_core::traits::ArtifactStore;

use crate::config::StorageConfig;

/// Stores pipeline artifacts as pretty-printed UTF-8 JSON files, one
/// directory per artifact class.
///
/// Nothing is created on disk until the first save.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    config: StorageConfig,
}

impl LocalStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self::new(StorageConfig::from_env()?))
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// File backing the artifact `name` of class `kind`.
    ///
    /// Names are file stems: empty names, `.`/`..`, and names containing
    /// path separators are rejected.
    pub fn artifact_path(&self, kind: ArtifactKind, name: &str) -> Result<PathBuf, AppError> {
        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\', '\0']);
        if invalid {
            return Err(AppError::Storage(format!(
                "Invalid {kind} artifact name: {name:?}"
            )));
        }
        Ok(self
            .config
            .namespace_dir(kind)
            .join(format!("{name}.json")))
    }

    fn write_json<T>(&self, kind: ArtifactKind, name: &str, data: &T) -> Result<(), AppError>
    where
        T: Serialize + ?Sized,
    {
        let path = self.artifact_path(kind, name)?;
        self.ensure_storage_ready()?;

        // serde_json leaves non-ASCII characters unescaped.
        let json = serde_json::to_string_pretty(data)?;
        std::fs::write(&path, json).map_err(|e| {
            AppError::Storage(format!("Failed to write {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "Saved {kind} artifact");
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, kind: ArtifactKind, name: &str) -> Result<T, AppError> {
        let path = self.artifact_path(kind, name)?;
        let contents = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::NotFound {
                namespace: kind,
                name: name.to_string(),
            },
            _ => AppError::Storage(format!("Failed to read {}: {e}", path.display())),
        })?;
        Ok(serde_json::from_str(&contents)?)
    }
}

impl ArtifactStore for LocalStorage {
    fn ensure_storage_ready(&self) -> Result<(), AppError> {
        for kind in ArtifactKind::ALL {
            let dir = self.config.namespace_dir(kind);
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Storage(format!("Failed to create {}: {e}", dir.display()))
            })?;
        }
        Ok(())
    }

    fn save_raw<T>(&self, name: &str, data: &T) -> Result<(), AppError>
    where
        T: Serialize + ?Sized,
    {
        self.write_json(ArtifactKind::Raw, name, data)
    }

    fn load_raw(&self, name: &str) -> Result<serde_json::Value, AppError> {
        self.read_json(ArtifactKind::Raw, name)
    }

    fn save_normalized(&self, name: &str, data: &[NormalizedVacancy]) -> Result<(), AppError> {
        self.write_json(ArtifactKind::Normalized, name, data)
    }

    fn load_normalized(&self, name: &str) -> Result<Vec<NormalizedVacancy>, AppError> {
        self.read_json(ArtifactKind::Normalized, name)
    }

    fn save_analysis(&self, result: &AnalysisResult) -> Result<(), AppError> {
        self.write_json(ArtifactKind::Analysis, &result.vacancy_id, result)
    }

    fn load_analysis(&self, vacancy_id: &str) -> Result<AnalysisResult, AppError> {
        self.read_json(ArtifactKind::Analysis, vacancy_id)
    }

    fn save_extraction(&self, result: &ExtractionResult) -> Result<(), AppError> {
        self.write_json(ArtifactKind::Extraction, &result.vacancy_id, result)
    }

    fn load_extraction(&self, vacancy_id: &str) -> Result<ExtractionResult, AppError> {
        self.read_json(ArtifactKind::Extraction, vacancy_id)
    }
}
