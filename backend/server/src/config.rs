use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use regex::Regex;
use tracing::{info, warn};
use upstream::{
    Endpoints,
    models::{GITHUB_API_URL, MODRINTH_API_URL},
};

use crate::error::AppError;

/// GitHub caps logins at 39 characters; Modrinth usernames fit the same shape.
const USERNAME_PATTERN: &str = r"^[A-Za-z0-9_-]{1,39}$";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub github_username: String,
    pub modrinth_username: String,
    pub github_api_url: String,
    pub modrinth_api_url: String,
    pub refresh_interval: Duration,
    pub request_timeout: Duration,
    pub github_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            github_username: "MatisseAD".to_string(),
            modrinth_username: "Matisse".to_string(),
            github_api_url: GITHUB_API_URL.to_string(),
            modrinth_api_url: MODRINTH_API_URL.to_string(),
            refresh_interval: Duration::from_secs(15 * 60),
            request_timeout: Duration::from_millis(10_000),
            github_token: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        let username = Regex::new(USERNAME_PATTERN).map_err(|e| AppError::Config(e.to_string()))?;

        let refresh_secs: u64 = try_load("REFRESH_INTERVAL_SECS", "900")?;
        if refresh_secs == 0 {
            return Err(AppError::Config(
                "REFRESH_INTERVAL_SECS must be positive".to_string(),
            ));
        }

        Ok(Self {
            port: try_load("RUST_PORT", "8080")?,
            github_username: validate_username(
                &username,
                "GITHUB_USERNAME",
                try_load("GITHUB_USERNAME", "MatisseAD")?,
            )?,
            modrinth_username: validate_username(
                &username,
                "MODRINTH_USERNAME",
                try_load("MODRINTH_USERNAME", "Matisse")?,
            )?,
            github_api_url: try_load("GITHUB_API_URL", GITHUB_API_URL)?,
            modrinth_api_url: try_load("MODRINTH_API_URL", MODRINTH_API_URL)?,
            refresh_interval: Duration::from_secs(refresh_secs),
            request_timeout: Duration::from_millis(try_load("REQUEST_TIMEOUT_MS", "10000")?),
            github_token: read_secret("GITHUB_TOKEN"),
        })
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            github_api_url: self.github_api_url.trim_end_matches('/').to_string(),
            modrinth_api_url: self.modrinth_api_url.trim_end_matches('/').to_string(),
            github_username: self.github_username.clone(),
            modrinth_username: self.modrinth_username.clone(),
            github_token: self.github_token.clone(),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key)
        .map_err(|_| {
            warn!("Environment variable {key} not found, using default");
        })
        .ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, AppError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            AppError::Config(format!("invalid {key}: {e}"))
        })
}

/// Usernames are spliced into upstream URL paths.
fn validate_username(pattern: &Regex, key: &str, value: String) -> Result<String, AppError> {
    if pattern.is_match(&value) {
        Ok(value)
    } else {
        warn!("Rejected {key} value: {value:?}");
        Err(AppError::Config(format!("{key} must match {USERNAME_PATTERN}")))
    }
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            info!("No {secret_name} secret ({e}), continuing without it");
        })
        .ok()
        .filter(|secret| !secret.is_empty())
}
