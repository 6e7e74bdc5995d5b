use std::fmt;

use thiserror::Error;

use crate::models::ArtifactKind;

/// Boxed transport error kept as the source of a [`AppError::Fetch`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Transport failure category behind a [`AppError::Fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchCause {
    /// The host could not be reached at all.
    NoConnection,
    /// The request did not complete in time.
    Timeout,
    /// Non-2xx status, unreadable body, or JSON that failed to decode.
    Request,
}

impl fmt::Display for FetchCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchCause::NoConnection => f.write_str("no connection"),
            FetchCause::Timeout => f.write_str("request timed out"),
            FetchCause::Request => f.write_str("request failed"),
        }
    }
}

/// Application-wide error types for SkillRadar.
#[derive(Error, Debug)]
pub enum AppError {
    /// A call to the vacancy source failed.
    #[error("Fetch error ({cause}): {message}")]
    Fetch {
        cause: FetchCause,
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<BoxError>,
    },

    /// A raw record is missing fields the canonical shape requires.
    #[error("Missing required fields for normalization: {} (vacancy id: {})", .missing.join(", "), .vacancy_id.as_deref().unwrap_or("unknown"))]
    Normalization {
        vacancy_id: Option<String>,
        missing: Vec<&'static str>,
    },

    /// No artifact with this name exists in the namespace.
    #[error("{namespace} artifact not found: {name}")]
    NotFound { namespace: ArtifactKind, name: String },

    /// Reading or writing an artifact failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// HTML-to-text conversion failed.
    #[error("Cleaner error: {0}")]
    Cleaner(String),

    /// A downstream extraction or analysis stage failed for one vacancy.
    #[error("Stage error: {0}")]
    Stage(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Build a fetch error that carries no underlying transport error.
    pub fn fetch(cause: FetchCause, message: impl Into<String>) -> Self {
        AppError::Fetch {
            cause,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Returns true if this error is transient and worth retrying.
    ///
    /// The library never retries on its own; this is for callers that do.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Fetch {
                cause: FetchCause::NoConnection | FetchCause::Timeout,
                ..
            } => true,
            AppError::Fetch {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(AppError::fetch(FetchCause::NoConnection, "down").is_retryable());
        assert!(AppError::fetch(FetchCause::Timeout, "slow").is_retryable());
        assert!(
            AppError::Fetch {
                cause: FetchCause::Request,
                message: "HTTP 503".into(),
                status: Some(503),
                source: None,
            }
            .is_retryable()
        );
        assert!(
            !AppError::Fetch {
                cause: FetchCause::Request,
                message: "HTTP 404".into(),
                status: Some(404),
                source: None,
            }
            .is_retryable()
        );
        assert!(!AppError::fetch(FetchCause::Request, "bad json").is_retryable());
        assert!(!AppError::Storage("disk full".into()).is_retryable());
    }

    #[test]
    fn fetch_error_keeps_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = AppError::Fetch {
            cause: FetchCause::NoConnection,
            message: "GET https://api.hh.ru/vacancies".into(),
            status: None,
            source: Some(Box::new(io)),
        };

        let source = err.source().expect("source must be preserved");
        assert_eq!(source.to_string(), "refused");
        assert!(err.to_string().contains("no connection"));
    }

    #[test]
    fn normalization_error_names_missing_fields() {
        let err = AppError::Normalization {
            vacancy_id: None,
            missing: vec!["id", "url"],
        };
        let msg = err.to_string();
        assert!(msg.contains("Missing required fields for normalization"));
        assert!(msg.contains("id, url"));
        assert!(msg.contains("unknown"));
    }

    #[test]
    fn not_found_names_namespace() {
        let err = AppError::NotFound {
            namespace: ArtifactKind::Normalized,
            name: "run_1".into(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "normalized artifact not found: run_1");
    }
}
