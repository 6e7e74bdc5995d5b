use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use skillradar_core::error::{AppError, FetchCause};
use skillradar_core::traits::JsonClient;
use url::Url;

const DEFAULT_USER_AGENT: &str = "SkillRadar/0.1 (vacancy research)";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-over-HTTP client using reqwest.
///
/// One attempt per call, no retries. Every failure is reported through
/// [`classify`] as a single [`AppError::Fetch`].
#[derive(Clone)]
pub struct ReqwestJsonClient {
    client: Client,
}

impl ReqwestJsonClient {
    pub fn new() -> Result<Self, AppError> {
        Self::with_options(DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)
    }

    pub fn with_options(user_agent: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Wrap a preconfigured reqwest client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn send(&self, url: Url) -> reqwest::Result<serde_json::Value> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

impl JsonClient for ReqwestJsonClient {
    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, AppError> {
        let mut target = Url::parse(url).map_err(|e| AppError::Fetch {
            cause: FetchCause::Request,
            message: format!("Invalid URL {url}: {e}"),
            status: None,
            source: Some(Box::new(e)),
        })?;
        if !query.is_empty() {
            target.query_pairs_mut().extend_pairs(query);
        }

        tracing::debug!(url = %target, "GET");
        self.send(target).await.map_err(|e| classify(url, e))
    }
}

/// Collapse a transport failure into [`AppError::Fetch`].
///
/// Connection failures become `NoConnection`, timeouts `Timeout`, and
/// everything else (non-2xx status, unreadable or undecodable body)
/// `Request`. The reqwest error is kept as the source.
pub fn classify(url: &str, err: reqwest::Error) -> AppError {
    let cause = if err.is_timeout() {
        FetchCause::Timeout
    } else if err.is_connect() {
        FetchCause::NoConnection
    } else {
        FetchCause::Request
    };
    let status = err.status().map(|s| s.as_u16());

    let message = match status {
        Some(code) => format!("HTTP {code} for {url}"),
        None if err.is_decode() => format!("Invalid JSON from {url}: {err}"),
        None => format!("{url}: {err}"),
    };

    AppError::Fetch {
        cause,
        message,
        status,
        source: Some(Box::new(err)),
    }
}

/// Decode a fetched document into `T`; a shape mismatch is a request failure.
pub(crate) fn decode<T: DeserializeOwned>(
    url: &str,
    value: serde_json::Value,
) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|e| AppError::Fetch {
        cause: FetchCause::Request,
        message: format!("Unexpected response shape from {url}: {e}"),
        status: None,
        source: Some(Box::new(e)),
    })
}
