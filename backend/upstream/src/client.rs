use std::time::Duration;

use reqwest::{
    Client,
    header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, USER_AGENT},
};
use serde::de::DeserializeOwned;
use tokio::time::timeout;
use tracing::{debug, error};

use crate::{
    backoff::{RetryPolicy, execute},
    error::{FetchError, PolicyError},
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const AGENT: &str = "MatisseAD-Website/1.0";

const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Transport failures and transient statuses are worth another attempt.
/// Everything else (403 quota, 404 absence, undecodable bodies) is terminal.
pub fn should_retry_http_error(error: &FetchError) -> bool {
    match error {
        FetchError::Network(_) | FetchError::Timeout(_) => true,
        FetchError::Status { status, .. } => RETRYABLE_STATUSES.contains(status),
        FetchError::Unknown(_) => false,
    }
}

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub headers: HeaderMap,
    pub timeout: Option<Duration>,
    pub retry_policy: RetryPolicy<FetchError>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            headers: HeaderMap::new(),
            timeout: None,
            retry_policy: RetryPolicy::default().retry_if(should_retry_http_error),
        }
    }
}

impl RequestOptions {
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Exponential policy (factor 2) filtered by [`should_retry_http_error`].
    pub fn with_retry(
        mut self,
        max_retries: u32,
        base_delay: Duration,
        max_delay: Duration,
    ) -> Result<Self, PolicyError> {
        self.retry_policy = RetryPolicy::new(max_retries, base_delay, max_delay, 2.0)?
            .retry_if(should_retry_http_error);
        Ok(self)
    }

    pub fn with_policy(mut self, policy: RetryPolicy<FetchError>) -> Self {
        self.retry_policy = policy;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    default_headers: HeaderMap,
    default_timeout: Duration,
}

impl ApiClient {
    pub fn new(default_timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder().build()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(AGENT));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Ok(Self {
            http,
            default_headers,
            default_timeout,
        })
    }

    /// GET `url` and decode the JSON body, retrying per `options.retry_policy`.
    pub async fn get<T>(&self, url: &str, options: &RequestOptions) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let limit = options.timeout.unwrap_or(self.default_timeout);

        let mut headers = self.default_headers.clone();
        for (name, value) in &options.headers {
            headers.insert(name, value.clone());
        }
        let headers = &headers;

        let outcome = execute(
            move || self.fetch_once(url, headers, limit),
            &options.retry_policy,
        )
        .await;

        let attempts = outcome.attempts_made();
        match outcome.into_result() {
            Ok(body) => {
                debug!("GET {url} succeeded after {attempts} attempt(s)");
                Ok(body)
            }
            Err(fetch_error) => {
                error!("GET {url} failed after {attempts} attempt(s): {fetch_error}");
                Err(fetch_error)
            }
        }
    }

    async fn fetch_once<T>(&self, url: &str, headers: &HeaderMap, limit: Duration) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let request = async {
            let response = self.http.get(url).headers(headers.clone()).send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::from_status(status));
            }

            let bytes = response.bytes().await?;
            serde_json::from_slice(&bytes)
                .map_err(|e| FetchError::Unknown(format!("Malformed response body: {e}")))
        };

        timeout(limit, request)
            .await
            .map_err(|_| FetchError::Timeout(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)))?
    }
}
