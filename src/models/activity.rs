// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava activity model for storage and output.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::time_utils::{format_duration_secs, format_local, format_utc_rfc3339};

/// A single decoded path point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Decoded activity path, in recording order.
pub type Track = Vec<Coordinate>;

/// Stored activity record.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    /// Strava activity ID (primary key)
    pub strava_id: u64,
    /// Strava athlete ID (owner)
    pub athlete_id: u64,
    /// Activity name/title
    pub name: String,
    /// Distance in meters
    pub distance: f64,
    /// Moving time in seconds
    pub moving_time: i64,
    /// Elapsed time in seconds
    pub elapsed_time: i64,
    /// Elevation gain in meters
    pub total_elevation_gain: f64,
    /// Activity type (Ride, Run, Hike, etc.)
    pub activity_type: String,
    pub start_date: DateTime<Utc>,
    /// Start time in the athlete's local time zone
    pub start_date_local: NaiveDateTime,
    pub location_country: Option<String>,
    /// Encoded summary polyline as received from Strava
    pub summary_polyline: Option<String>,
    /// Decoded polyline; never empty when present
    pub track: Option<Track>,
    pub average_heartrate: Option<f64>,
    pub average_speed: Option<f64>,
}

/// An activity together with the values derived on load.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedActivity {
    pub activity: Activity,
    /// Names of matched points of interest
    pub pois: BTreeSet<String>,
    /// Consecutive-day streak, only for the tracked activity type
    pub streak: Option<u32>,
}

impl AnnotatedActivity {
    pub fn new(activity: Activity) -> Self {
        Self {
            activity,
            pois: BTreeSet::new(),
            streak: None,
        }
    }
}

/// Activity as emitted to the static front-end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityOutput {
    pub strava_id: u64,
    pub athlete_id: u64,
    pub name: String,
    pub distance: f64,
    pub moving_time: String,
    pub elapsed_time: String,
    pub total_elevation_gain: f64,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub start_date: String,
    pub start_date_local: String,
    pub location_country: Option<String>,
    pub summary_polyline: Option<String>,
    pub average_heartrate: Option<f64>,
    pub average_speed: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pois: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak: Option<u32>,
}

impl From<&AnnotatedActivity> for ActivityOutput {
    fn from(annotated: &AnnotatedActivity) -> Self {
        let activity = &annotated.activity;
        Self {
            strava_id: activity.strava_id,
            athlete_id: activity.athlete_id,
            name: activity.name.clone(),
            distance: activity.distance,
            moving_time: format_duration_secs(activity.moving_time),
            elapsed_time: format_duration_secs(activity.elapsed_time),
            total_elevation_gain: activity.total_elevation_gain,
            activity_type: activity.activity_type.clone(),
            start_date: format_utc_rfc3339(activity.start_date),
            start_date_local: format_local(activity.start_date_local),
            location_country: activity.location_country.clone(),
            summary_polyline: activity.summary_polyline.clone(),
            average_heartrate: activity.average_heartrate,
            average_speed: activity.average_speed,
            pois: annotated.pois.iter().cloned().collect(),
            streak: annotated.streak,
        }
    }
}
