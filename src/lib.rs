// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activities: incremental Strava sync with geographic annotation
//!
//! This crate mirrors an athlete's Strava activities into a local SQLite
//! database, annotates them with visited points of interest and running
//! streaks, and exports them as a script for a static web front-end.

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod value_range;

use config::Config;
use db::ActivityStore;

/// Shared state of the registration server.
pub struct AppState<C> {
    pub config: Config,
    pub store: ActivityStore,
    pub strava: C,
}
