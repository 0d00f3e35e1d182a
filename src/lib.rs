//! tunedash: listening-history dashboard with on-demand track predictions.
//!
//! The library is split along the two client-side pipelines plus the
//! plumbing around them:
//!
//! - [`activity`]: densifies sparse day/hour play counts into a 7 × 24 matrix
//! - [`predict`]: validates, normalizes and dispatches the two prediction
//!   requests, then reduces their outcomes
//! - [`api`]: blocking HTTP client for the statistics backend
//! - [`overview`]: read-only display fetches that degrade to empty state
//! - [`config`], [`diagnostics`]: layered TOML config and JSONL diagnostics
//! - [`cli`], [`web`]: the terminal and browser front ends

pub mod activity;
pub mod api;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod overview;
pub mod predict;
pub mod web;
