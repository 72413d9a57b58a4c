// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Point of interest model.

use serde::{Deserialize, Serialize};

/// A named location that activities are matched against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    /// Unique name (e.g., "Schauinsland")
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl PointOfInterest {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
        }
    }
}
