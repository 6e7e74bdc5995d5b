use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A vacancy as returned by the source, before normalization.
///
/// Built by a fetcher from the detail endpoint. `key_skills` and `area` are
/// kept in the source's own shape; `detail` holds the full detail document
/// so the normalizer can reach employer metadata and both description
/// variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawVacancy {
    #[serde(default)]
    pub id: String,
    /// Becomes the normalized `title`.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub branded_description: Option<String>,
    #[serde(default)]
    pub key_skills: Vec<Value>,
    #[serde(default)]
    pub area: Option<Map<String, Value>>,
    #[serde(default)]
    pub detail: Option<Value>,
}

/// The canonical vacancy shape every downstream stage consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedVacancy {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Name of the originating system, e.g. `"HeadHunter"`.
    pub source: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Analyzer output for one vacancy. `data` is analyzer-specific.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub vacancy_id: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl AnalysisResult {
    pub fn new(vacancy_id: impl Into<String>) -> Self {
        Self {
            vacancy_id: vacancy_id.into(),
            data: Map::new(),
        }
    }
}

/// Extractor output for one vacancy: one map per extracted entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub vacancy_id: String,
    #[serde(default)]
    pub data: Vec<Map<String, Value>>,
}

impl ExtractionResult {
    pub fn new(vacancy_id: impl Into<String>) -> Self {
        Self {
            vacancy_id: vacancy_id.into(),
            data: Vec::new(),
        }
    }
}

/// A region the source accepts as a search filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// The four artifact classes, each stored in its own namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Raw,
    Normalized,
    Analysis,
    Extraction,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Raw,
        ArtifactKind::Normalized,
        ArtifactKind::Analysis,
        ArtifactKind::Extraction,
    ];

    /// Namespace name, also used as the directory name on disk.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Raw => "raw",
            ArtifactKind::Normalized => "normalized",
            ArtifactKind::Analysis => "analysis",
            ArtifactKind::Extraction => "extraction",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
