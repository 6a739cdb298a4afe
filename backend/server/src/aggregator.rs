//! # Profile Aggregation
//!
//! Builds one consolidated [`ProfileSnapshot`] out of the four upstream calls.
//!
//! ## Cycle
//!
//! 1. Publish the current snapshot with `loading: true`
//! 2. Fire all four calls at once and wait for every one of them to settle
//! 3. Reduce each platform's pair of results into a [`SourceStatus`]
//! 4. Validate payloads into typed records, coercing collections to lists
//! 5. Publish the next snapshot with `loading: false`, whatever happened
//!
//! Readers only ever see whole snapshots. Each publish swaps an `Arc` inside a
//! `watch` channel, so there is no partially written state to observe.
//!
//! ## Status
//!
//! | User call            | Collection call      | Status         |
//! |----------------------|----------------------|----------------|
//! | quota error          | any                  | `rate-limited` |
//! | other error          | any                  | `error`        |
//! | ok                   | quota error          | `rate-limited` |
//! | ok                   | ok or other error    | `success`      |
//!
//! ## Refresh
//!
//! - Automatic refreshes run on a fixed period and reset `retryCount` to 0
//! - Manual refreshes bump `retryCount`
//! - A refresh requested while another is in flight is skipped
use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::{
    sync::{Mutex, oneshot, watch},
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{error, info, warn};
use upstream::{
    FetchError, GitHubRepo, GitHubUser, ModrinthProject, ModrinthUser, ProfileSource, Source,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceStatus {
    #[default]
    Success,
    RateLimited,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApiStatus {
    pub github: SourceStatus,
    pub modrinth: SourceStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    pub github_user: Option<GitHubUser>,
    pub github_repos: Vec<GitHubRepo>,
    pub modrinth_user: Option<ModrinthUser>,
    pub modrinth_projects: Vec<ModrinthProject>,
    pub loading: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub retry_count: u32,
    pub api_status: ApiStatus,
    pub error: Option<String>,
}

impl ProfileSnapshot {
    pub fn is_rate_limited(&self) -> bool {
        self.api_status.github == SourceStatus::RateLimited
            || self.api_status.modrinth == SourceStatus::RateLimited
    }

    /// Anything worth rendering: decides between a soft warning and a hard failure page.
    pub fn has_partial_data(&self) -> bool {
        self.github_user.is_some()
            || self.modrinth_user.is_some()
            || !self.github_repos.is_empty()
            || !self.modrinth_projects.is_empty()
    }
}

/// Rate limiting on either of a platform's calls marks the whole platform.
pub fn source_status<U, C>(
    source: Source,
    user: &Result<U, FetchError>,
    collection: &Result<C, FetchError>,
) -> SourceStatus {
    match (user, collection) {
        (Err(error), _) if source.is_rate_limited(error) => SourceStatus::RateLimited,
        (Err(_), _) => SourceStatus::Error,
        (Ok(_), Err(error)) if source.is_rate_limited(error) => SourceStatus::RateLimited,
        (Ok(_), _) => SourceStatus::Success,
    }
}

struct Fetched {
    github_user: Result<Value, FetchError>,
    github_repos: Result<Value, FetchError>,
    modrinth_user: Result<Value, FetchError>,
    modrinth_projects: Result<Value, FetchError>,
}

pub struct Aggregator {
    source: Arc<dyn ProfileSource>,
    snapshot: watch::Sender<Arc<ProfileSnapshot>>,
    in_flight: Mutex<()>,
}

impl Aggregator {
    pub fn new(source: Arc<dyn ProfileSource>) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(ProfileSnapshot::default()));

        Self {
            source,
            snapshot,
            in_flight: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> Arc<ProfileSnapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ProfileSnapshot>> {
        self.snapshot.subscribe()
    }

    /// Runs one fetch cycle and returns the snapshot it published.
    ///
    /// Returns the current snapshot untouched when another cycle is still running.
    pub async fn refresh(&self, is_manual_retry: bool) -> Arc<ProfileSnapshot> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            info!("Profile refresh already in flight, skipping");
            return self.snapshot();
        };

        let previous = self.snapshot();
        self.publish(ProfileSnapshot {
            loading: true,
            ..(*previous).clone()
        });
        let restore = RestoreOnCancel {
            snapshot: &self.snapshot,
            previous: Some(Arc::clone(&previous)),
        };

        info!("Refreshing profile data (manual: {is_manual_retry})");
        let (github_user, github_repos, modrinth_user, modrinth_projects) = tokio::join!(
            self.source.github_user(),
            self.source.github_repos(),
            self.source.modrinth_user(),
            self.source.modrinth_projects(),
        );

        let next = assemble(
            &previous,
            is_manual_retry,
            Fetched {
                github_user,
                github_repos,
                modrinth_user,
                modrinth_projects,
            },
        );

        info!(
            "Profile refreshed: github {:?}, modrinth {:?}, retries {}",
            next.api_status.github, next.api_status.modrinth, next.retry_count
        );

        restore.disarm();
        self.publish(next)
    }

    /// Refreshes immediately, then once per `period` until the handle is stopped or dropped.
    pub fn start(self: &Arc<Self>, period: Duration) -> RefreshHandle {
        let (shutdown, mut stop) = oneshot::channel::<()>();
        let aggregator = Arc::clone(self);

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    _ = ticker.tick() => {}
                }

                tokio::select! {
                    _ = &mut stop => break,
                    _ = aggregator.refresh(false) => {}
                }
            }

            info!("Periodic profile refresh stopped");
        });

        RefreshHandle {
            shutdown: Some(shutdown),
            task,
        }
    }

    fn publish(&self, snapshot: ProfileSnapshot) -> Arc<ProfileSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.snapshot.send_replace(Arc::clone(&snapshot));

        snapshot
    }
}

/// Puts the pre-cycle snapshot back when a refresh is dropped before it publishes.
struct RestoreOnCancel<'a> {
    snapshot: &'a watch::Sender<Arc<ProfileSnapshot>>,
    previous: Option<Arc<ProfileSnapshot>>,
}

impl RestoreOnCancel<'_> {
    fn disarm(mut self) {
        self.previous = None;
    }
}

impl Drop for RestoreOnCancel<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            warn!("Profile refresh cancelled, keeping previous snapshot");
            self.snapshot.send_replace(previous);
        }
    }
}

pub struct RefreshHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        if let Err(e) = (&mut self.task).await {
            warn!("Refresh task ended abnormally: {e}");
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn assemble(previous: &ProfileSnapshot, is_manual_retry: bool, fetched: Fetched) -> ProfileSnapshot {
    let api_status = ApiStatus {
        github: source_status(Source::GitHub, &fetched.github_user, &fetched.github_repos),
        modrinth: source_status(
            Source::Modrinth,
            &fetched.modrinth_user,
            &fetched.modrinth_projects,
        ),
    };

    let mut faults = Vec::new();

    let github_user = decode_record(
        "GitHub user",
        fetched.github_user,
        previous.github_user.as_ref(),
        &mut faults,
    );
    let github_repos = decode_collection(
        "GitHub repos",
        fetched.github_repos,
        &previous.github_repos,
        &mut faults,
    );
    let modrinth_user = decode_record(
        "Modrinth user",
        fetched.modrinth_user,
        previous.modrinth_user.as_ref(),
        &mut faults,
    );
    let modrinth_projects = decode_collection(
        "Modrinth projects",
        fetched.modrinth_projects,
        &previous.modrinth_projects,
        &mut faults,
    );

    ProfileSnapshot {
        github_user,
        github_repos,
        modrinth_user,
        modrinth_projects,
        loading: false,
        last_updated: Some(Utc::now()),
        retry_count: if is_manual_retry {
            previous.retry_count.saturating_add(1)
        } else {
            0
        },
        api_status,
        error: (!faults.is_empty()).then(|| faults.join("; ")),
    }
}

fn decode_record<T>(
    label: &str,
    fetched: Result<Value, FetchError>,
    previous: Option<&T>,
    faults: &mut Vec<String>,
) -> Option<T>
where
    T: DeserializeOwned + Clone,
{
    let value = match fetched {
        Ok(Value::Null) => return None,
        Ok(value) => value,
        Err(e) => {
            warn!("{label} unavailable: {e}");
            return None;
        }
    };

    serde_json::from_value(value)
        .map_err(|e| {
            error!("Malformed {label} payload: {e}");
            faults.push(format!("Malformed {label} payload: {e}"));
        })
        .ok()
        .or_else(|| previous.cloned())
}

fn decode_collection<T>(
    label: &str,
    fetched: Result<Value, FetchError>,
    previous: &[T],
    faults: &mut Vec<String>,
) -> Vec<T>
where
    T: DeserializeOwned + Clone,
{
    let items = match fetched {
        Ok(Value::Array(items)) => items,
        Ok(other) => {
            warn!("{label} returned a non-array payload ({other}), using an empty list");
            return Vec::new();
        }
        Err(e) => {
            warn!("{label} unavailable: {e}");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .unwrap_or_else(|e| {
            error!("Malformed {label} payload: {e}");
            faults.push(format!("Malformed {label} payload: {e}"));
            previous.to_vec()
        })
}
