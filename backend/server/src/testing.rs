use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::{Value, json};
use upstream::{FetchError, ProfileSource};

pub(crate) fn status(code: u16) -> FetchError {
    FetchError::Status {
        status: code,
        reason: String::new(),
    }
}

pub(crate) fn github_user() -> Value {
    json!({
        "login": "MatisseAD",
        "name": "Matisse",
        "bio": "Minecraft plugin developer",
        "avatar_url": "https://avatars.githubusercontent.com/u/1",
        "location": "France",
        "public_repos": 24,
        "followers": 80,
        "following": 5,
        "created_at": "2019-06-01T10:00:00Z"
    })
}

pub(crate) fn github_repos() -> Value {
    json!([{
        "id": 7,
        "name": "SkyBlockCore",
        "description": "SkyBlock engine for Paper",
        "html_url": "https://github.com/MatisseAD/SkyBlockCore",
        "language": "Java",
        "stargazers_count": 41,
        "forks_count": 6,
        "updated_at": "2024-04-30T08:15:00Z",
        "topics": ["minecraft", "paper"]
    }])
}

pub(crate) fn modrinth_user() -> Value {
    json!({
        "id": "u-42",
        "username": "Matisse",
        "name": null,
        "bio": "Plugins",
        "avatar_url": "https://cdn.modrinth.com/avatar.png",
        "created": "2021-02-03T04:05:06.789Z"
    })
}

pub(crate) fn modrinth_projects() -> Value {
    json!([{
        "id": "AANobbMI",
        "slug": "better-spawners",
        "title": "Better Spawners",
        "description": "Configurable spawners",
        "categories": ["utility"],
        "downloads": 48210,
        "followers": 311,
        "icon_url": null,
        "updated": "2024-03-09T18:22:41Z",
        "published": "2023-01-02T08:00:00Z",
        "status": "approved",
        "game_versions": ["1.20.4"],
        "loaders": ["paper"]
    }])
}

/// Canned answers for the four profile calls.
pub(crate) struct FakeSource {
    pub github_user: Result<Value, FetchError>,
    pub github_repos: Result<Value, FetchError>,
    pub modrinth_user: Result<Value, FetchError>,
    pub modrinth_projects: Result<Value, FetchError>,
    pub latency: Duration,
    pub calls: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn healthy() -> Self {
        Self {
            github_user: Ok(github_user()),
            github_repos: Ok(github_repos()),
            modrinth_user: Ok(modrinth_user()),
            modrinth_projects: Ok(modrinth_projects()),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(error: FetchError) -> Self {
        Self {
            github_user: Err(error.clone()),
            github_repos: Err(error.clone()),
            modrinth_user: Err(error.clone()),
            modrinth_projects: Err(error),
            ..Self::healthy()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer(&self, canned: &Result<Value, FetchError>) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        canned.clone()
    }
}

#[async_trait]
impl ProfileSource for FakeSource {
    async fn github_user(&self) -> Result<Value, FetchError> {
        self.answer(&self.github_user).await
    }

    async fn github_repos(&self) -> Result<Value, FetchError> {
        self.answer(&self.github_repos).await
    }

    async fn modrinth_user(&self) -> Result<Value, FetchError> {
        self.answer(&self.modrinth_user).await
    }

    async fn modrinth_projects(&self) -> Result<Value, FetchError> {
        self.answer(&self.modrinth_projects).await
    }
}
