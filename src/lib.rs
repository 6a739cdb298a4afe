//! # Portfolio Documentation
//!
//! Backend for a Minecraft plugin developer portfolio: profile data pulled from GitHub and
//! Modrinth, a maintenance switch, and a Minesweeper game.
//!
//! ## Crates
//! - `upstream`: retrying HTTP client and the GitHub/Modrinth calls
//! - `server`: axum routes, profile aggregation, maintenance flag
//! - `minesweeper`: board engine and terminal front end
//!
//! ## Notes
//!
//! ### Rate limits
//! - Unauthenticated GitHub allows 60 requests an hour per IP, hence the 15 minute refresh
//! - GitHub answers 403 once spent, Modrinth answers 429
//! - A token in `/run/secrets/GITHUB_TOKEN` lifts the GitHub quota

pub mod frontend;

pub use server::start_server;
