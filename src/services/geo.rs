// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Polyline decoding and point-of-interest matching.

use geo::{Distance, Geodesic, Point};
use std::collections::BTreeSet;

use crate::models::{Coordinate, PointOfInterest, Track};
use crate::value_range::ValueRange;

/// Strava polylines use precision 5.
const POLYLINE_PRECISION: u32 = 5;

/// A path point only counts when both coordinate deltas are below this (degrees).
pub const POINT_DELTA_DEGREES: f64 = 0.01;

/// Default proximity for a point of interest to count as visited (meters).
pub const DEFAULT_PROXIMITY_METERS: f64 = 100.0;

/// Default widening of the track bounding box before the per-point check (degrees).
pub const DEFAULT_BBOX_SLACK_DEGREES: f64 = 0.01;

/// Decode an encoded polyline into `(lat, lon)` points.
///
/// Returns `None` when the polyline is absent, malformed, or empty.
pub fn decode(encoded: Option<&str>) -> Option<Track> {
    let encoded = encoded?;
    match polyline::decode_polyline(encoded, POLYLINE_PRECISION) {
        Ok(line) => {
            let track: Track = line
                .coords()
                .map(|c| Coordinate::new(c.y, c.x))
                .collect();
            (!track.is_empty()).then_some(track)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to decode polyline");
            None
        }
    }
}

/// Axis-aligned bounding box of a track.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub lat: ValueRange,
    pub lon: ValueRange,
}

impl BoundingBox {
    /// Bounding box of `track`; both ranges are empty for an empty track.
    pub fn of(track: &[Coordinate]) -> Self {
        Self {
            lat: track.iter().map(|c| c.lat).collect(),
            lon: track.iter().map(|c| c.lon).collect(),
        }
    }

    pub fn contains(&self, lat: f64, lon: f64, slack: f64) -> bool {
        self.lat.contains(lat, slack) && self.lon.contains(lon, slack)
    }
}

/// Matches points of interest against activity tracks.
#[derive(Debug, Clone, Copy)]
pub struct GeoMatcher {
    proximity_meters: f64,
    bbox_slack_degrees: f64,
}

impl Default for GeoMatcher {
    fn default() -> Self {
        Self {
            proximity_meters: DEFAULT_PROXIMITY_METERS,
            bbox_slack_degrees: DEFAULT_BBOX_SLACK_DEGREES,
        }
    }
}

impl GeoMatcher {
    /// Create a matcher.
    ///
    /// The slack is raised to at least [`POINT_DELTA_DEGREES`]; anything
    /// smaller could reject points the per-point check would accept.
    pub fn new(proximity_meters: f64, bbox_slack_degrees: f64) -> Self {
        Self {
            proximity_meters,
            bbox_slack_degrees: bbox_slack_degrees.max(POINT_DELTA_DEGREES),
        }
    }

    pub fn proximity_meters(&self) -> f64 {
        self.proximity_meters
    }

    pub fn bbox_slack_degrees(&self) -> f64 {
        self.bbox_slack_degrees
    }

    /// Names of all points of interest passed by `track`, sorted.
    pub fn match_pois(&self, track: &[Coordinate], pois: &[PointOfInterest]) -> BTreeSet<String> {
        if track.is_empty() || pois.is_empty() {
            return BTreeSet::new();
        }

        let bbox = BoundingBox::of(track);
        pois.iter()
            .filter(|poi| bbox.contains(poi.lat, poi.lon, self.bbox_slack_degrees))
            .filter(|poi| self.is_point_on_track(poi, track))
            .map(|poi| poi.name.clone())
            .collect()
    }

    /// Whether any track point lies within the proximity radius of `poi`.
    pub fn is_point_on_track(&self, poi: &PointOfInterest, track: &[Coordinate]) -> bool {
        let target = Point::new(poi.lon, poi.lat);
        track.iter().any(|c| {
            (poi.lat - c.lat).abs() < POINT_DELTA_DEGREES
                && (poi.lon - c.lon).abs() < POINT_DELTA_DEGREES
                && Geodesic.distance(target, Point::new(c.lon, c.lat)) < self.proximity_meters
        })
    }
}
