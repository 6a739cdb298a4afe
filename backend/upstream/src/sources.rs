use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::{
    client::{ApiClient, RequestOptions},
    error::{FetchError, PolicyError},
    models::{GITHUB_API_URL, MODRINTH_API_URL},
};

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    GitHub,
    Modrinth,
}

impl Source {
    /// Status each platform answers with once the caller's quota is spent.
    pub const fn rate_limit_status(self) -> u16 {
        match self {
            Self::GitHub => 403,
            Self::Modrinth => 429,
        }
    }

    pub fn is_rate_limited(self, error: &FetchError) -> bool {
        error.status() == Some(self.rate_limit_status())
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::Modrinth => "modrinth",
        }
    }
}

/// The four upstream resources a profile is built from.
///
/// Payloads come back as raw JSON; shape validation is left to the caller.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn github_user(&self) -> Result<Value, FetchError>;

    async fn github_repos(&self) -> Result<Value, FetchError>;

    async fn modrinth_user(&self) -> Result<Value, FetchError>;

    async fn modrinth_projects(&self) -> Result<Value, FetchError>;
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub github_api_url: String,
    pub modrinth_api_url: String,
    pub github_username: String,
    pub modrinth_username: String,
    pub github_token: Option<String>,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            github_api_url: GITHUB_API_URL.to_string(),
            modrinth_api_url: MODRINTH_API_URL.to_string(),
            github_username: "MatisseAD".to_string(),
            modrinth_username: "Matisse".to_string(),
            github_token: None,
        }
    }
}

pub struct UpstreamSource {
    client: ApiClient,
    endpoints: Endpoints,
    github: RequestOptions,
    modrinth: RequestOptions,
    modrinth_lookup: RequestOptions,
}

impl UpstreamSource {
    pub fn new(client: ApiClient, endpoints: Endpoints) -> Result<Self, PolicyError> {
        let standard = RequestOptions::default().with_retry(
            3,
            Duration::from_millis(1_000),
            Duration::from_millis(8_000),
        )?;

        let mut github = standard
            .clone()
            .with_header(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        if let Some(token) = &endpoints.github_token {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => github = github.with_header(AUTHORIZATION, value),
                Err(_) => warn!("GitHub token contains invalid header characters, ignoring it"),
            }
        }

        let modrinth_lookup = RequestOptions::default().with_retry(
            2,
            Duration::from_millis(500),
            Duration::from_millis(4_000),
        )?;

        Ok(Self {
            client,
            endpoints,
            github,
            modrinth: standard,
            modrinth_lookup,
        })
    }

    pub fn with_options(
        mut self,
        github: RequestOptions,
        modrinth: RequestOptions,
        modrinth_lookup: RequestOptions,
    ) -> Self {
        self.github = github;
        self.modrinth = modrinth;
        self.modrinth_lookup = modrinth_lookup;
        self
    }

    fn github_url(&self, path: &str) -> String {
        format!(
            "{}/users/{}{path}",
            self.endpoints.github_api_url, self.endpoints.github_username
        )
    }

    fn modrinth_url(&self, user: &str, path: &str) -> String {
        format!("{}/user/{user}{path}", self.endpoints.modrinth_api_url)
    }
}

#[async_trait]
impl ProfileSource for UpstreamSource {
    async fn github_user(&self) -> Result<Value, FetchError> {
        self.client.get(&self.github_url(""), &self.github).await
    }

    async fn github_repos(&self) -> Result<Value, FetchError> {
        self.client
            .get(&self.github_url("/repos?sort=updated&per_page=10"), &self.github)
            .await
    }

    async fn modrinth_user(&self) -> Result<Value, FetchError> {
        let url = self.modrinth_url(&self.endpoints.modrinth_username, "");
        self.client.get(&url, &self.modrinth).await
    }

    async fn modrinth_projects(&self) -> Result<Value, FetchError> {
        let lookup = self.modrinth_url(&self.endpoints.modrinth_username, "");
        let user: Value = self.client.get(&lookup, &self.modrinth_lookup).await?;

        let Some(id) = user.get("id").and_then(Value::as_str) else {
            warn!("Modrinth user has no id, no projects to fetch");
            return Ok(Value::Array(Vec::new()));
        };

        let url = self.modrinth_url(id, "/projects");
        self.client.get(&url, &self.modrinth).await
    }
}
