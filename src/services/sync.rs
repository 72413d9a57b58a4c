// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Incremental activity synchronization.
//!
//! Handles the core workflow:
//! 1. Make sure the access token is valid
//! 2. Create the local athlete row on first sync
//! 3. Pick the fetch window (full history, or since the last stored activity)
//! 4. Upsert every fetched activity, decoding its polyline
//! 5. Commit the whole pass in one transaction

use chrono::{DateTime, Duration, Utc};
use futures_util::{stream, Stream, TryStreamExt};
use std::io::Write;

use crate::db::{ActivityStore, StoreTransaction};
use crate::error::{AppError, Result};
use crate::models::{Activity, Athlete};
use crate::services::geo;
use crate::services::strava::{ActivityQuery, StravaActivity, StravaApi};
use crate::services::token::TokenManager;

/// Days re-fetched before the latest stored activity, to pick up late edits and uploads.
pub const DEFAULT_SYNC_OVERLAP_DAYS: i64 = 7;

/// Page size for activity listing (Strava allows at most 200).
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// Whether to keep or discard the stored history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Fetch activities since the last stored one (minus the overlap).
    Normal,
    /// Clear all stored activities and fetch the full history.
    Force,
}

/// Lower bound of the activities requested from Strava.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchWindow {
    Full,
    After(DateTime<Utc>),
}

impl FetchWindow {
    /// Choose the window for a normal sync given the latest stored `start_date`.
    pub fn select(latest_start: Option<DateTime<Utc>>, overlap: Duration) -> Self {
        match latest_start {
            Some(latest) => FetchWindow::After(latest - overlap),
            None => FetchWindow::Full,
        }
    }

    fn after_timestamp(self) -> Option<i64> {
        match self {
            FetchWindow::Full => None,
            FetchWindow::After(after) => Some(after.timestamp()),
        }
    }
}

/// Tunables of a sync pass.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub overlap: Duration,
    pub page_size: u32,
    /// Print `+` (created) and `.` (updated) per activity to stdout.
    pub show_progress: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            overlap: Duration::days(DEFAULT_SYNC_OVERLAP_DAYS),
            page_size: DEFAULT_PAGE_SIZE,
            show_progress: false,
        }
    }
}

/// Outcome of reconciling one remote activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    Created,
    Updated,
}

impl Reconciled {
    fn marker(self) -> &'static str {
        match self {
            Reconciled::Created => "+",
            Reconciled::Updated => ".",
        }
    }
}

/// Result of a sync pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub athlete_id: u64,
    pub window: FetchWindow,
    pub created: usize,
    pub updated: usize,
    /// Activities removed up front by a forced sync
    pub cleared: u64,
}

/// Runs synchronization passes against a Strava client and the local store.
pub struct SyncEngine<'a, C> {
    client: &'a C,
    store: &'a ActivityStore,
    options: SyncOptions,
}

impl<'a, C: StravaApi> SyncEngine<'a, C> {
    pub fn new(client: &'a C, store: &'a ActivityStore) -> Self {
        Self::with_options(client, store, SyncOptions::default())
    }

    pub fn with_options(client: &'a C, store: &'a ActivityStore, options: SyncOptions) -> Self {
        Self {
            client,
            store,
            options,
        }
    }

    /// Run one synchronization pass.
    ///
    /// Activity writes are committed together at the end; on any error the
    /// store keeps its previous activities. The athlete row is written on
    /// its own before the pass starts.
    pub async fn sync(
        &self,
        tokens: &mut TokenManager,
        mode: SyncMode,
        now: DateTime<Utc>,
    ) -> Result<SyncReport> {
        let access_token = tokens.check_access(self.client, now).await?;

        let remote_athlete = self.client.get_athlete(&access_token).await?;
        let athlete: Athlete = remote_athlete.into();
        if self.store.insert_athlete_if_absent(&athlete).await? {
            tracing::info!(athlete_id = athlete.id, "Created athlete");
        }

        let mut tx = self.store.begin().await?;

        let (window, cleared) = match mode {
            SyncMode::Force => {
                let cleared = tx.clear_activities().await?;
                tracing::info!(cleared, "Forced sync, cleared existing activities");
                (FetchWindow::Full, cleared)
            }
            SyncMode::Normal => {
                let latest = tx.max_start_date(athlete.id).await?;
                (FetchWindow::select(latest, self.options.overlap), 0)
            }
        };

        tracing::info!(athlete_id = athlete.id, ?window, "Start syncing");

        let mut report = SyncReport {
            athlete_id: athlete.id,
            window,
            created: 0,
            updated: 0,
            cleared,
        };

        let pages = activity_pages(self.client, &access_token, window, self.options.page_size);
        let mut pages = std::pin::pin!(pages);

        while let Some(page) = pages.try_next().await? {
            for remote in page {
                let outcome = reconcile(&mut tx, athlete.id, remote).await?;
                match outcome {
                    Reconciled::Created => report.created += 1,
                    Reconciled::Updated => report.updated += 1,
                }
                if self.options.show_progress {
                    print_progress(outcome);
                }
            }
        }
        if self.options.show_progress {
            println!();
        }

        tx.commit().await?;

        tracing::info!(
            athlete_id = athlete.id,
            created = report.created,
            updated = report.updated,
            "Sync complete"
        );
        Ok(report)
    }
}

/// Lazily fetch activity pages until Strava returns a short or empty page.
fn activity_pages<'a, C: StravaApi>(
    client: &'a C,
    access_token: &'a str,
    window: FetchWindow,
    page_size: u32,
) -> impl Stream<Item = Result<Vec<StravaActivity>>> + 'a {
    stream::try_unfold(Some(1u32), move |page| async move {
        let Some(page) = page else {
            return Ok::<_, AppError>(None);
        };

        let query = ActivityQuery {
            after: window.after_timestamp(),
            before: None,
            page,
            per_page: page_size,
        };
        let activities = client.list_activities(access_token, &query).await?;
        tracing::debug!(page, count = activities.len(), "Fetched activity page");

        if activities.is_empty() {
            return Ok(None);
        }
        let next = (activities.len() as u32 >= page_size).then_some(page + 1);
        Ok(Some((activities, next)))
    })
}

/// Insert or update one remote activity, keyed by its Strava ID.
async fn reconcile(
    tx: &mut StoreTransaction,
    athlete_id: u64,
    remote: StravaActivity,
) -> Result<Reconciled> {
    let outcome = match tx.get_activity(remote.id).await? {
        Some(_) => Reconciled::Updated,
        None => Reconciled::Created,
    };

    let activity = activity_from_remote(athlete_id, remote);
    tracing::debug!(
        strava_id = activity.strava_id,
        ?outcome,
        has_track = activity.track.is_some(),
        "Reconciled activity"
    );
    tx.upsert_activity(&activity).await?;

    Ok(outcome)
}

/// Build the stored record from a remote activity. The track is decoded best-effort.
pub fn activity_from_remote(athlete_id: u64, remote: StravaActivity) -> Activity {
    let track = geo::decode(remote.summary_polyline());
    let summary_polyline = remote
        .map
        .and_then(|map| map.summary_polyline)
        .filter(|p| !p.is_empty());

    Activity {
        strava_id: remote.id,
        athlete_id,
        name: remote.name,
        distance: remote.distance,
        moving_time: remote.moving_time,
        elapsed_time: remote.elapsed_time,
        total_elevation_gain: remote.total_elevation_gain,
        activity_type: remote.activity_type,
        start_date: remote.start_date,
        start_date_local: remote.start_date_local.naive_utc(),
        location_country: remote.location_country,
        summary_polyline,
        track,
        average_heartrate: remote.average_heartrate,
        average_speed: remote.average_speed,
    }
}

fn print_progress(outcome: Reconciled) {
    let mut stdout = std::io::stdout().lock();
    // Progress output is best-effort
    let _ = stdout.write_all(outcome.marker().as_bytes());
    let _ = stdout.flush();
}
