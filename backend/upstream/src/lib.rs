//! # Upstream
//!
//! Everything that talks to the two third-party platforms shown on the profile page.
//!
//! ## Layers
//!
//! - [`backoff`]: generic retry with exponential backoff and jitter
//! - [`client`]: timeout-bounded JSON GET with failure classification, composed with [`backoff`]
//! - [`sources`]: the GitHub and Modrinth calls behind the [`ProfileSource`] trait
//! - [`models`]: typed records for the fields the site consumes
//!
//! ## Rate Limits
//!
//! | Platform | Quota exhausted | Not found |
//! |----------|-----------------|-----------|
//! | GitHub   | 403             | 404       |
//! | Modrinth | 429             | 404       |
//!
//! Neither 403 nor 404 is retried. 429 is retried like any other transient status,
//! so a Modrinth quota failure only surfaces once retries run out.
pub mod backoff;
pub mod client;
pub mod error;
pub mod models;
pub mod sources;

pub use backoff::{AttemptOutcome, RetryPolicy, execute};
pub use client::{ApiClient, RequestOptions, should_retry_http_error};
pub use error::{ErrorKind, FetchError, PolicyError};
pub use models::{GitHubRepo, GitHubUser, ModrinthProject, ModrinthUser};
pub use sources::{Endpoints, ProfileSource, Source, UpstreamSource};
