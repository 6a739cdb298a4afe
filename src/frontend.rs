//! # Frontend Contract
//!
//! What the profile page expects from the backend.
//!
//! ## Payloads
//!
//! ### Profile
//! `GET /api/profile`, JSON, camelCase
//! - githubUser / modrinthUser: object or `null`
//! - githubRepos / modrinthProjects: always a list, possibly empty
//! - loading, lastUpdated (RFC 3339 or `null`), retryCount, error (string or `null`)
//! - apiStatus: `{ github, modrinth }`, each `success`, `rate-limited` or `error`
//! - isRateLimited, hasPartialData: derived, so the page never recomputes them
//!
//! ### Retry
//! `POST /api/profile/refresh`, no body
//! - Same payload as the profile, with retryCount bumped
//! - Answers with the current profile untouched if a refresh is already running
//!
//! ### Maintenance
//! `GET /api/maintenance`
//! - `{ isMaintenanceActivated, lastUpdated, updatedBy }`
//!
//! `POST /api/maintenance`
//! - `{ isMaintenanceActivated: bool, updatedBy?: string }`
//! - 200 `{ success: true, state }`, or 400 `{ error }`
//!
//!
//!
//! ## Rendering
//!
//! - Nothing at all and an error: full page failure with a retry button
//! - Some data and an error: warning banner, render what is there
//! - isRateLimited: mention the quota in the banner, the next scheduled refresh will pick it up
//! - loading is only a hint, the last good data stays on screen
//!
//!
//!
//! ## Maintenance Gate
//!
//! - Poll the flag on load
//! - Mirror it in local storage so a reload during an outage still shows the maintenance page
//! - The flag resets to off whenever the server restarts
