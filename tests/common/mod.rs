// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use activities::config::Config;
use activities::db::ActivityStore;
use activities::error::AppError;
use activities::models::TokenCredential;
use activities::routes::create_router;
use activities::services::strava::{
    ActivityQuery, StravaActivity, StravaApi, StravaAthlete, StravaMap, TokenExchangeResponse,
    TokenResponse,
};
use activities::AppState;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Canonical example from the polyline format documentation.
/// Decodes to (38.5, -120.2), (40.7, -120.95), (43.252, -126.453).
#[allow(dead_code)]
pub const SAMPLE_POLYLINE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

/// Expiry of the credential issued by a refresh.
#[allow(dead_code)]
pub const REFRESHED_EXPIRES_AT: i64 = 1_900_000_000;

/// In-memory Strava double.
///
/// Activities are served oldest first and filtered by `after`, like the
/// real listing endpoint.
pub struct FakeStrava {
    athlete: StravaAthlete,
    activities: Mutex<Vec<StravaActivity>>,
    queries: Mutex<Vec<ActivityQuery>>,
    refreshes: AtomicUsize,
    fail_on_page: Mutex<Option<u32>>,
    fail_refresh: bool,
}

#[allow(dead_code)]
impl FakeStrava {
    pub fn new(activities: Vec<StravaActivity>) -> Self {
        Self {
            athlete: StravaAthlete {
                id: 42,
                firstname: "Ada".to_string(),
                lastname: "Lovelace".to_string(),
            },
            activities: Mutex::new(activities),
            queries: Mutex::new(Vec::new()),
            refreshes: AtomicUsize::new(0),
            fail_on_page: Mutex::new(None),
            fail_refresh: false,
        }
    }

    /// A client whose token endpoint always rejects refreshes.
    pub fn with_failing_refresh(mut self) -> Self {
        self.fail_refresh = true;
        self
    }

    pub fn athlete_id(&self) -> u64 {
        self.athlete.id
    }

    /// Make the listing fail when `page` is requested.
    pub fn fail_on_page(&self, page: Option<u32>) {
        *self.fail_on_page.lock().unwrap() = page;
    }

    pub fn set_activities(&self, activities: Vec<StravaActivity>) {
        *self.activities.lock().unwrap() = activities;
    }

    pub fn queries(&self) -> Vec<ActivityQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl StravaApi for FakeStrava {
    async fn get_athlete(&self, _access_token: &str) -> Result<StravaAthlete, AppError> {
        Ok(self.athlete.clone())
    }

    async fn list_activities(
        &self,
        _access_token: &str,
        query: &ActivityQuery,
    ) -> Result<Vec<StravaActivity>, AppError> {
        self.queries.lock().unwrap().push(*query);

        if *self.fail_on_page.lock().unwrap() == Some(query.page) {
            return Err(AppError::StravaApi("HTTP 500: upstream failure".to_string()));
        }

        let per_page = query.per_page as usize;
        let skip = (query.page as usize - 1) * per_page;
        let page = self
            .activities
            .lock()
            .unwrap()
            .iter()
            .filter(|a| query.after.map_or(true, |after| a.start_date.timestamp() > after))
            .skip(skip)
            .take(per_page)
            .cloned()
            .collect();
        Ok(page)
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        let count = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_refresh {
            return Err(AppError::Auth("Bad Request: invalid refresh_token".to_string()));
        }
        Ok(TokenResponse {
            access_token: format!("access-{}", count),
            refresh_token: format!("{}-next", refresh_token),
            expires_at: REFRESHED_EXPIRES_AT,
        })
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenExchangeResponse, AppError> {
        if code == "bad" {
            return Err(AppError::Auth("Authorization code invalid".to_string()));
        }
        Ok(TokenExchangeResponse {
            token: TokenResponse {
                access_token: format!("access-for-{}", code),
                refresh_token: "refresh".to_string(),
                expires_at: REFRESHED_EXPIRES_AT,
            },
            athlete: Some(self.athlete.clone()),
        })
    }
}

/// Remote activity starting at `start_date` (RFC 3339), one hour ahead locally.
#[allow(dead_code)]
pub fn remote_activity(
    id: u64,
    activity_type: &str,
    start_date: &str,
    polyline: Option<&str>,
) -> StravaActivity {
    let start_date: DateTime<Utc> = start_date.parse().unwrap();
    StravaActivity {
        id,
        name: format!("Activity {}", id),
        distance: 5000.0,
        moving_time: 1800,
        elapsed_time: 1900,
        total_elevation_gain: 40.0,
        activity_type: activity_type.to_string(),
        start_date,
        start_date_local: start_date + chrono::Duration::hours(1),
        location_country: Some("Germany".to_string()),
        map: Some(StravaMap {
            summary_polyline: polyline.map(str::to_string),
        }),
        average_heartrate: None,
        average_speed: Some(2.8),
    }
}

/// Credential valid for a long time after `now`.
#[allow(dead_code)]
pub fn valid_credential(now: DateTime<Utc>) -> TokenCredential {
    TokenCredential {
        access_token: "access-0".to_string(),
        refresh_token: "refresh-0".to_string(),
        expires_at: now + chrono::Duration::hours(6),
    }
}

#[allow(dead_code)]
pub fn test_now() -> DateTime<Utc> {
    "2024-06-01T12:00:00Z".parse().unwrap()
}

#[allow(dead_code)]
pub async fn test_store() -> ActivityStore {
    ActivityStore::in_memory()
        .await
        .expect("Failed to open in-memory store")
}

/// Create a test app backed by an in-memory store and a fake Strava.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (axum::Router, Arc<AppState<FakeStrava>>) {
    let state = Arc::new(AppState {
        config: Config::test_default(),
        store: test_store().await,
        strava: FakeStrava::new(Vec::new()),
    });

    (create_router(state.clone()), state)
}
