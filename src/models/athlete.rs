// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Athlete model for storage and output.

use serde::{Deserialize, Serialize};

/// Locally stored athlete profile. Written once, on first sync or registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Athlete {
    /// Strava athlete ID
    pub id: u64,
    pub firstname: String,
    pub lastname: String,
}
