// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity loading and annotation.
//!
//! Handles the post-sync workflow:
//! 1. Load the athlete and their activities in local-date order
//! 2. Match each track against the points of interest
//! 3. Compute the consecutive-day streak

use crate::db::{ActivityStore, SortOrder};
use crate::error::{AppError, Result};
use crate::models::{Activity, AnnotatedActivity, Athlete, PointOfInterest};
use crate::services::geo::GeoMatcher;
use crate::services::streak::StreakCalculator;

/// Annotates stored activities with derived values.
pub struct Annotator<'a> {
    matcher: GeoMatcher,
    pois: &'a [PointOfInterest],
    streak_type: String,
}

impl<'a> Annotator<'a> {
    pub fn new(matcher: GeoMatcher, pois: &'a [PointOfInterest], streak_type: &str) -> Self {
        Self {
            matcher,
            pois,
            streak_type: streak_type.to_string(),
        }
    }

    /// Load the stored athlete and their annotated activities, oldest first.
    pub async fn load(&self, store: &ActivityStore) -> Result<(Athlete, Vec<AnnotatedActivity>)> {
        let athlete = store
            .first_athlete()
            .await?
            .ok_or_else(|| AppError::NotFound("No athlete stored; run a sync first".to_string()))?;

        let activities = store
            .list_activities(athlete.id, SortOrder::Ascending)
            .await?;
        tracing::debug!(
            athlete_id = athlete.id,
            count = activities.len(),
            "Loaded activities"
        );

        Ok((athlete, self.annotate(activities)))
    }

    /// Annotate activities given in ascending `start_date_local` order.
    pub fn annotate(&self, activities: Vec<Activity>) -> Vec<AnnotatedActivity> {
        let mut streak = StreakCalculator::new(self.streak_type.as_str());

        activities
            .into_iter()
            .map(|activity| {
                let mut annotated = AnnotatedActivity::new(activity);
                let activity = &annotated.activity;

                if let Some(track) = &activity.track {
                    annotated.pois = self.matcher.match_pois(track, self.pois);
                }
                annotated.streak = streak.observe(
                    &activity.activity_type,
                    activity.start_date_local.date(),
                );

                if !annotated.pois.is_empty() {
                    tracing::debug!(
                        strava_id = annotated.activity.strava_id,
                        pois = ?annotated.pois,
                        "Matched points of interest"
                    );
                }
                annotated
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;
    use crate::time_utils::parse_local;
    use chrono::{TimeZone, Utc};

    fn activity(id: u64, activity_type: &str, local: &str, track: Option<Vec<Coordinate>>) -> Activity {
        Activity {
            strava_id: id,
            athlete_id: 1,
            name: format!("Activity {}", id),
            distance: 1000.0,
            moving_time: 300,
            elapsed_time: 320,
            total_elevation_gain: 0.0,
            activity_type: activity_type.to_string(),
            start_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            start_date_local: parse_local(local).unwrap(),
            location_country: None,
            summary_polyline: None,
            track,
            average_heartrate: None,
            average_speed: None,
        }
    }

    #[test]
    fn test_annotate_streak_and_pois() {
        let pois = vec![PointOfInterest::new("Summit", 47.9119, 7.8985)];
        let annotator = Annotator::new(GeoMatcher::default(), &pois, "Run");

        let annotated = annotator.annotate(vec![
            activity(1, "Run", "2024-01-01 07:00:00", None),
            activity(2, "Ride", "2024-01-01 18:00:00", Some(vec![Coordinate::new(47.9119, 7.8985)])),
            activity(3, "Run", "2024-01-02 07:00:00", Some(vec![Coordinate::new(10.0, 10.0)])),
        ]);

        let streaks: Vec<_> = annotated.iter().map(|a| a.streak).collect();
        assert_eq!(streaks, vec![Some(1), None, Some(2)]);
        assert!(annotated[0].pois.is_empty());
        assert!(annotated[1].pois.contains("Summit"));
        assert!(annotated[2].pois.is_empty());
    }

    #[test]
    fn test_annotate_without_pois() {
        let annotator = Annotator::new(GeoMatcher::default(), &[], "Run");
        let annotated = annotator.annotate(vec![activity(
            1,
            "Run",
            "2024-01-01 07:00:00",
            Some(vec![Coordinate::new(47.9119, 7.8985)]),
        )]);
        assert!(annotated[0].pois.is_empty());
        assert_eq!(annotated[0].streak, Some(1));
    }
}
