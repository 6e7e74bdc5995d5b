use std::path::{Path, PathBuf};

use skillradar_core::AppError;
use skillradar_core::models::ArtifactKind;

const APP_DIR_NAME: &str = ".skillradar";

/// Where artifacts live on disk.
///
/// Layout: `<root>/data/{raw,normalized,analysis,extraction}/<name>.json`.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub root: PathBuf,
}

impl StorageConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Read configuration from environment variables.
    ///
    /// - `SKILLRADAR_HOME` (optional, the application root)
    /// - otherwise `$HOME/.skillradar` (`%USERPROFILE%` on Windows)
    pub fn from_env() -> Result<Self, AppError> {
        if let Ok(root) = std::env::var("SKILLRADAR_HOME") {
            if root.trim().is_empty() {
                return Err(AppError::Config("SKILLRADAR_HOME is set but empty".into()));
            }
            return Ok(Self::new(root));
        }

        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| {
                AppError::Config(
                    "Cannot locate home directory: set SKILLRADAR_HOME or HOME".into(),
                )
            })?;
        Ok(Self::new(Path::new(&home).join(APP_DIR_NAME)))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Directory holding one artifact class.
    pub fn namespace_dir(&self, kind: ArtifactKind) -> PathBuf {
        self.data_dir().join(kind.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_are_siblings_under_data() {
        let config = StorageConfig::new("/tmp/sr");
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/sr/data"));
        assert_eq!(
            config.namespace_dir(ArtifactKind::Raw),
            PathBuf::from("/tmp/sr/data/raw")
        );
        assert_eq!(
            config.namespace_dir(ArtifactKind::Extraction),
            PathBuf::from("/tmp/sr/data/extraction")
        );
    }
}
