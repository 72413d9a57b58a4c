// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! OAuth credential model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single live Strava credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCredential {
    pub access_token: String,
    pub refresh_token: String,
    /// When the access token expires
    pub expires_at: DateTime<Utc>,
}
