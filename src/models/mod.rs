// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod athlete;
pub mod credential;
pub mod poi;

pub use activity::{Activity, ActivityOutput, AnnotatedActivity, Coordinate, Track};
pub use athlete::Athlete;
pub use credential::TokenCredential;
pub use poi::PointOfInterest;
