// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync pass tests against an in-memory store and a fake Strava.

mod common;

use activities::db::SortOrder;
use activities::models::PointOfInterest;
use activities::services::{
    Annotator, FetchWindow, GeoMatcher, SyncEngine, SyncMode, SyncOptions, TokenManager,
};
use chrono::{DateTime, Duration, Utc};
use common::{remote_activity, test_now, test_store, valid_credential, FakeStrava, SAMPLE_POLYLINE};

fn tokens() -> TokenManager {
    TokenManager::new(valid_credential(test_now()))
}

fn small_pages(page_size: u32) -> SyncOptions {
    SyncOptions {
        page_size,
        ..SyncOptions::default()
    }
}

#[tokio::test]
async fn test_first_sync_fetches_full_history() {
    let store = test_store().await;
    let strava = FakeStrava::new(vec![
        remote_activity(1, "Run", "2024-01-01T07:00:00Z", Some(SAMPLE_POLYLINE)),
        remote_activity(2, "Ride", "2024-01-05T07:00:00Z", None),
    ]);

    let report = SyncEngine::new(&strava, &store)
        .sync(&mut tokens(), SyncMode::Normal, test_now())
        .await
        .unwrap();

    assert_eq!(report.window, FetchWindow::Full);
    assert_eq!(report.created, 2);
    assert_eq!(report.updated, 0);
    assert_eq!(strava.queries()[0].after, None);
    assert_eq!(store.count_activities().await.unwrap(), 2);

    let athlete = store.get_athlete(strava.athlete_id()).await.unwrap().unwrap();
    assert_eq!(athlete.firstname, "Ada");
}

#[tokio::test]
async fn test_next_sync_overlaps_latest_activity_by_seven_days() {
    let store = test_store().await;
    let strava = FakeStrava::new(vec![
        remote_activity(1, "Run", "2024-01-01T07:00:00Z", None),
        remote_activity(2, "Run", "2024-01-05T07:00:00Z", None),
        remote_activity(3, "Run", "2024-01-20T07:00:00Z", None),
    ]);
    let engine = SyncEngine::new(&strava, &store);
    engine
        .sync(&mut tokens(), SyncMode::Normal, test_now())
        .await
        .unwrap();

    let latest = store
        .max_start_date(strava.athlete_id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest, "2024-01-20T07:00:00Z".parse::<DateTime<Utc>>().unwrap());

    let report = engine
        .sync(&mut tokens(), SyncMode::Normal, test_now())
        .await
        .unwrap();

    let expected_after = latest - Duration::days(7);
    assert_eq!(report.window, FetchWindow::After(expected_after));
    assert_eq!(
        strava.queries().last().unwrap().after,
        Some(expected_after.timestamp())
    );
    // Only the activity inside the window is fetched again
    assert_eq!(report.created, 0);
    assert_eq!(report.updated, 1);
    assert_eq!(store.count_activities().await.unwrap(), 3);
}

#[tokio::test]
async fn test_reconcile_is_idempotent_and_last_write_wins() {
    let store = test_store().await;
    let strava = FakeStrava::new(vec![remote_activity(
        7,
        "Run",
        "2024-01-01T07:00:00Z",
        None,
    )]);
    let engine = SyncEngine::new(&strava, &store);
    engine
        .sync(&mut tokens(), SyncMode::Normal, test_now())
        .await
        .unwrap();

    let mut renamed = remote_activity(7, "Run", "2024-01-01T07:00:00Z", Some(SAMPLE_POLYLINE));
    renamed.name = "Renamed".to_string();
    strava.set_activities(vec![renamed]);

    let report = engine
        .sync(&mut tokens(), SyncMode::Normal, test_now())
        .await
        .unwrap();
    assert_eq!(report.created, 0);
    assert_eq!(report.updated, 1);
    assert_eq!(store.count_activities().await.unwrap(), 1);

    let stored = store.get_activity(7).await.unwrap().unwrap();
    assert_eq!(stored.name, "Renamed");
    assert_eq!(stored.track.map(|t| t.len()), Some(3));
}

#[tokio::test]
async fn test_force_clears_storage_and_fetches_full_history() {
    let store = test_store().await;
    let strava = FakeStrava::new(vec![remote_activity(
        99,
        "Run",
        "2024-02-01T07:00:00Z",
        None,
    )]);
    let engine = SyncEngine::new(&strava, &store);
    engine
        .sync(&mut tokens(), SyncMode::Normal, test_now())
        .await
        .unwrap();

    // Activity 99 was deleted remotely
    strava.set_activities(vec![remote_activity(1, "Run", "2024-01-01T07:00:00Z", None)]);

    let report = engine
        .sync(&mut tokens(), SyncMode::Force, test_now())
        .await
        .unwrap();

    assert_eq!(report.window, FetchWindow::Full);
    assert_eq!(report.cleared, 1);
    assert_eq!(report.created, 1);
    assert_eq!(strava.queries().last().unwrap().after, None);
    assert!(store.get_activity(99).await.unwrap().is_none());
    assert!(store.get_activity(1).await.unwrap().is_some());
}

#[tokio::test]
async fn test_failed_pass_leaves_activities_untouched() {
    let store = test_store().await;
    let strava = FakeStrava::new(vec![
        remote_activity(1, "Run", "2024-01-01T07:00:00Z", None),
        remote_activity(2, "Run", "2024-01-02T07:00:00Z", None),
        remote_activity(3, "Run", "2024-01-03T07:00:00Z", None),
    ]);
    strava.fail_on_page(Some(2));

    let result = SyncEngine::with_options(&strava, &store, small_pages(2))
        .sync(&mut tokens(), SyncMode::Normal, test_now())
        .await;

    assert!(result.is_err());
    assert_eq!(store.count_activities().await.unwrap(), 0);
    // The athlete row is written before the pass and survives
    assert!(store
        .get_athlete(strava.athlete_id())
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_failed_forced_pass_keeps_previous_history() {
    let store = test_store().await;
    let strava = FakeStrava::new(vec![remote_activity(
        1,
        "Run",
        "2024-01-01T07:00:00Z",
        None,
    )]);
    let engine = SyncEngine::new(&strava, &store);
    engine
        .sync(&mut tokens(), SyncMode::Normal, test_now())
        .await
        .unwrap();

    strava.fail_on_page(Some(1));
    let result = engine
        .sync(&mut tokens(), SyncMode::Force, test_now())
        .await;

    assert!(result.is_err());
    assert!(store.get_activity(1).await.unwrap().is_some());
}

#[tokio::test]
async fn test_pagination_stops_on_short_page() {
    let store = test_store().await;
    let strava = FakeStrava::new(vec![
        remote_activity(1, "Run", "2024-01-01T07:00:00Z", None),
        remote_activity(2, "Run", "2024-01-02T07:00:00Z", None),
        remote_activity(3, "Run", "2024-01-03T07:00:00Z", None),
    ]);

    let report = SyncEngine::with_options(&strava, &store, small_pages(2))
        .sync(&mut tokens(), SyncMode::Normal, test_now())
        .await
        .unwrap();

    let pages: Vec<u32> = strava.queries().iter().map(|q| q.page).collect();
    assert_eq!(pages, vec![1, 2]);
    assert!(strava.queries().iter().all(|q| q.per_page == 2));
    assert_eq!(report.created, 3);
}

#[tokio::test]
async fn test_pagination_stops_on_empty_page() {
    let store = test_store().await;
    let strava = FakeStrava::new(vec![
        remote_activity(1, "Run", "2024-01-01T07:00:00Z", None),
        remote_activity(2, "Run", "2024-01-02T07:00:00Z", None),
    ]);

    SyncEngine::with_options(&strava, &store, small_pages(2))
        .sync(&mut tokens(), SyncMode::Normal, test_now())
        .await
        .unwrap();

    let pages: Vec<u32> = strava.queries().iter().map(|q| q.page).collect();
    assert_eq!(pages, vec![1, 2]);
}

#[tokio::test]
async fn test_undecodable_polyline_does_not_abort_sync() {
    let store = test_store().await;
    let strava = FakeStrava::new(vec![
        remote_activity(1, "Run", "2024-01-01T07:00:00Z", Some("invalid!!!")),
        remote_activity(2, "Run", "2024-01-02T07:00:00Z", Some(SAMPLE_POLYLINE)),
    ]);

    let report = SyncEngine::new(&strava, &store)
        .sync(&mut tokens(), SyncMode::Normal, test_now())
        .await
        .unwrap();
    assert_eq!(report.created, 2);

    let broken = store.get_activity(1).await.unwrap().unwrap();
    assert_eq!(broken.summary_polyline.as_deref(), Some("invalid!!!"));
    assert_eq!(broken.track, None);
    assert!(store.get_activity(2).await.unwrap().unwrap().track.is_some());
}

#[tokio::test]
async fn test_athlete_name_is_not_updated_on_resync() {
    let store = test_store().await;
    let strava = FakeStrava::new(Vec::new());

    store
        .insert_athlete_if_absent(&activities::models::Athlete {
            id: strava.athlete_id(),
            firstname: "Old".to_string(),
            lastname: "Name".to_string(),
        })
        .await
        .unwrap();

    SyncEngine::new(&strava, &store)
        .sync(&mut tokens(), SyncMode::Normal, test_now())
        .await
        .unwrap();

    let athlete = store.get_athlete(strava.athlete_id()).await.unwrap().unwrap();
    assert_eq!(athlete.firstname, "Old");
}

#[tokio::test]
async fn test_end_to_end_sync_and_annotate() {
    let store = test_store().await;
    let strava = FakeStrava::new(vec![
        remote_activity(1, "Run", "2024-01-01T07:00:00Z", Some(SAMPLE_POLYLINE)),
        remote_activity(2, "Ride", "2024-01-02T07:00:00Z", None),
    ]);

    SyncEngine::new(&strava, &store)
        .sync(&mut tokens(), SyncMode::Normal, test_now())
        .await
        .unwrap();
    assert_eq!(store.count_activities().await.unwrap(), 2);

    let pois = vec![
        PointOfInterest::new("Start", 38.5, -120.2),
        PointOfInterest::new("Elsewhere", 10.0, 10.0),
    ];
    let annotator = Annotator::new(GeoMatcher::default(), &pois, "Run");
    let (athlete, annotated) = annotator.load(&store).await.unwrap();

    assert_eq!(athlete.id, strava.athlete_id());
    assert_eq!(annotated.len(), 2);

    let run = &annotated[0];
    assert_eq!(run.activity.strava_id, 1);
    assert_eq!(run.pois.iter().collect::<Vec<_>>(), vec!["Start"]);
    assert_eq!(run.streak, Some(1));

    let ride = &annotated[1];
    assert_eq!(ride.activity.strava_id, 2);
    assert!(ride.pois.is_empty());
    assert_eq!(ride.streak, None);
}

#[tokio::test]
async fn test_load_without_athlete_is_not_found() {
    let store = test_store().await;
    let annotator = Annotator::new(GeoMatcher::default(), &[], "Run");

    let err = annotator.load(&store).await.unwrap_err();
    assert!(matches!(err, activities::error::AppError::NotFound(_)));
}

#[tokio::test]
async fn test_activities_listed_in_local_date_order() {
    let store = test_store().await;
    // Served out of order by the remote
    let strava = FakeStrava::new(vec![
        remote_activity(2, "Run", "2024-01-03T07:00:00Z", None),
        remote_activity(1, "Run", "2024-01-01T07:00:00Z", None),
    ]);
    SyncEngine::new(&strava, &store)
        .sync(&mut tokens(), SyncMode::Normal, test_now())
        .await
        .unwrap();

    let ascending = store
        .list_activities(strava.athlete_id(), SortOrder::Ascending)
        .await
        .unwrap();
    let descending = store
        .list_activities(strava.athlete_id(), SortOrder::Descending)
        .await
        .unwrap();

    let ids = |list: &[activities::models::Activity]| -> Vec<u64> {
        list.iter().map(|a| a.strava_id).collect()
    };
    assert_eq!(ids(&ascending), vec![1, 2]);
    assert_eq!(ids(&descending), vec![2, 1]);
}
