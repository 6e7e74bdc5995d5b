//! Per-host request spacing for rate-limited sources.
//!
//! Wraps any [`JsonClient`] so that consecutive requests to the same host are
//! at least `delay` apart. The fetcher issues one request per page plus one
//! per vacancy, so an unthrottled run easily trips the source's rate limit.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use skillradar_core::throttle::{ThrottledClient, ThrottleConfig};
//!
//! # use skillradar_core::traits::JsonClient;
//! # #[derive(Clone)] struct MyClient;
//! # impl JsonClient for MyClient {
//! #     async fn get_json(&self, _: &str, _: &[(&str, String)])
//! #         -> Result<serde_json::Value, skillradar_core::error::AppError> { todo!() }
//! # }
//! let config = ThrottleConfig::new(Duration::from_millis(250))
//!     .with_jitter(Duration::from_millis(100));
//! let client = ThrottledClient::new(MyClient, config);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use url::Url;

use crate::error::AppError;
use crate::traits::JsonClient;

/// Configuration for the throttled client.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Minimum delay between consecutive requests to the same host.
    pub delay: Duration,

    /// Maximum random jitter added on top of `delay` (uniform [0, jitter]).
    pub jitter: Duration,
}

impl ThrottleConfig {
    /// Create a new config with the given per-host delay and no jitter.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            jitter: Duration::ZERO,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    fn effective_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.delay;
        }
        let jitter_ms = rand_jitter_ms(self.jitter.as_millis() as u64);
        self.delay + Duration::from_millis(jitter_ms)
    }
}

impl Default for ThrottleConfig {
    /// 250ms delay, no jitter. Keeps a full run under HeadHunter's
    /// per-client request rate.
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}

/// A [`JsonClient`] wrapper that enforces per-host spacing.
///
/// Tracks the last reserved request time per host (scheme + host + port)
/// and sleeps before a new request until its slot comes up.
#[derive(Clone)]
pub struct ThrottledClient<C> {
    inner: C,
    config: ThrottleConfig,
    last_request: Arc<Mutex<HashMap<String, Instant>>>,
}

impl<C: JsonClient> ThrottledClient<C> {
    pub fn new(inner: C, config: ThrottleConfig) -> Self {
        Self {
            inner,
            config,
            last_request: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Extract the host key from a URL (scheme://host:port).
    fn host_key(url_str: &str) -> Option<String> {
        let url = Url::parse(url_str).ok()?;
        let host = url.host_str()?;
        let port = url
            .port_or_known_default()
            .map(|p| format!(":{p}"))
            .unwrap_or_default();
        Some(format!("{}://{}{}", url.scheme(), host, port))
    }

    /// Reserve the next free slot for `host` and sleep until it.
    ///
    /// The slot is claimed under the lock, so concurrent callers queue up
    /// one `delay` apart instead of waking together.
    async fn wait_for_host(&self, host: &str) {
        let wait = {
            let mut slots = self.last_request.lock().await;
            let now = Instant::now();
            let slot = match slots.get(host) {
                Some(&last) => (last + self.config.effective_delay()).max(now),
                None => now,
            };
            slots.insert(host.to_string(), slot);
            slot - now
        };

        if !wait.is_zero() {
            tracing::debug!(
                host = %host,
                sleep_ms = %wait.as_millis(),
                "Throttling request"
            );
            tokio::time::sleep(wait).await;
        }
    }
}

impl<C: JsonClient> JsonClient for ThrottledClient<C> {
    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, AppError> {
        if let Some(host) = Self::host_key(url) {
            self.wait_for_host(&host).await;
        }
        self.inner.get_json(url, query).await
    }
}

// xorshift seeded from the clock; jitter needs spread, not quality.
fn rand_jitter_ms(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }
    let mut x = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x % max_ms
}
