// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client.
//!
//! Handles:
//! - Athlete profile fetching
//! - Paginated activity listing
//! - Token refresh and authorization-code exchange
//! - Rate limit and token error detection

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::future::Future;

use crate::error::AppError;
use crate::models::{Athlete, TokenCredential};

const API_BASE_URL: &str = "https://www.strava.com/api/v3";
const TOKEN_URL: &str = "https://www.strava.com/oauth/token";

/// Remote activity-service capability used by the sync pipeline.
///
/// [`StravaClient`] talks to Strava; tests substitute an in-memory fake.
pub trait StravaApi {
    /// Get the authenticated athlete profile.
    fn get_athlete(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<StravaAthlete, AppError>> + Send;

    /// List one page of the athlete's activities.
    fn list_activities(
        &self,
        access_token: &str,
        query: &ActivityQuery,
    ) -> impl Future<Output = Result<Vec<StravaActivity>, AppError>> + Send;

    /// Exchange a refresh token for a new credential.
    fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<TokenResponse, AppError>> + Send;

    /// Exchange an OAuth authorization code for a credential.
    fn exchange_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<TokenExchangeResponse, AppError>> + Send;
}

/// Filter and paging parameters for activity listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityQuery {
    /// Only activities starting after this Unix timestamp
    pub after: Option<i64>,
    /// Only activities starting before this Unix timestamp
    pub before: Option<i64>,
    pub page: u32,
    pub per_page: u32,
}

impl ActivityQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        if let Some(after) = self.after {
            params.push(("after", after.to_string()));
        }
        if let Some(before) = self.before {
            params.push(("before", before.to_string()));
        }
        params
    }
}

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a new Strava client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: API_BASE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            client_id,
            client_secret,
        }
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        check_response_json(response).await
    }

    /// POST a form to the OAuth token endpoint.
    async fn post_token_form<T: for<'de> Deserialize<'de>>(
        &self,
        grant: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let mut form = vec![
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        form.extend_from_slice(grant);

        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Strava token request failed");
            return Err(AppError::Auth(format!(
                "Token request failed with status {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to parse token response: {}", e)))
    }
}

impl StravaApi for StravaClient {
    async fn get_athlete(&self, access_token: &str) -> Result<StravaAthlete, AppError> {
        let url = format!("{}/athlete", self.base_url);
        self.get_json(&url, access_token, &[]).await
    }

    async fn list_activities(
        &self,
        access_token: &str,
        query: &ActivityQuery,
    ) -> Result<Vec<StravaActivity>, AppError> {
        let url = format!("{}/athlete/activities", self.base_url);
        self.get_json(&url, access_token, &query.params()).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        self.post_token_form(&[
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .await
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenExchangeResponse, AppError> {
        self.post_token_form(&[("code", code), ("grant_type", "authorization_code")])
            .await
    }
}

/// Check response and parse JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            tracing::warn!("Strava rate limit hit (429)");
            return Err(AppError::StravaApi(AppError::STRAVA_RATE_LIMIT.to_string()));
        }

        if status.as_u16() == 401 {
            return Err(AppError::StravaApi(
                AppError::STRAVA_TOKEN_ERROR.to_string(),
            ));
        }

        return Err(AppError::StravaApi(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::StravaApi(format!("JSON parse error: {}", e)))
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp
    pub expires_at: i64,
}

impl TokenResponse {
    /// Convert into a credential. Fails on an out-of-range expiry.
    pub fn into_credential(self) -> Result<TokenCredential, AppError> {
        let expires_at = DateTime::from_timestamp(self.expires_at, 0).ok_or_else(|| {
            AppError::Auth(format!("Invalid token expiry: {}", self.expires_at))
        })?;
        Ok(TokenCredential {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
        })
    }
}

/// Token exchange response from Strava OAuth (includes athlete info).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchangeResponse {
    #[serde(flatten)]
    pub token: TokenResponse,
    pub athlete: Option<StravaAthlete>,
}

/// Authenticated athlete profile.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaAthlete {
    pub id: u64,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
}

impl From<StravaAthlete> for Athlete {
    fn from(athlete: StravaAthlete) -> Self {
        Self {
            id: athlete.id,
            firstname: athlete.firstname,
            lastname: athlete.lastname,
        }
    }
}

/// Summary activity from the list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaActivity {
    pub id: u64,
    pub name: String,
    pub distance: f64,
    /// Seconds
    pub moving_time: i64,
    /// Seconds
    pub elapsed_time: i64,
    #[serde(default)]
    pub total_elevation_gain: f64,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub start_date: DateTime<Utc>,
    /// Local wall-clock time; Strava encodes it with a `Z` suffix.
    pub start_date_local: DateTime<Utc>,
    #[serde(default)]
    pub location_country: Option<String>,
    #[serde(default)]
    pub map: Option<StravaMap>,
    #[serde(default)]
    pub average_heartrate: Option<f64>,
    #[serde(default)]
    pub average_speed: Option<f64>,
}

impl StravaActivity {
    /// Get the summary polyline, if any.
    pub fn summary_polyline(&self) -> Option<&str> {
        self.map.as_ref()?.summary_polyline.as_deref()
    }
}

/// Activity map data with polylines.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StravaMap {
    #[serde(default)]
    pub summary_polyline: Option<String>,
}
