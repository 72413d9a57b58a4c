// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod annotate;
pub mod geo;
pub mod strava;
pub mod streak;
pub mod sync;
pub mod token;

pub use annotate::Annotator;
pub use geo::GeoMatcher;
pub use strava::{StravaApi, StravaClient};
pub use streak::StreakCalculator;
pub use sync::{FetchWindow, SyncEngine, SyncMode, SyncOptions, SyncReport};
pub use token::{TokenManager, TokenState};
