// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth credential lifecycle.

use chrono::{DateTime, Duration, Utc};

use crate::error::AppError;
use crate::models::TokenCredential;
use crate::services::strava::{StravaApi, TokenResponse};

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Where the credential is in its refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Valid,
    Refreshing,
    /// The last refresh failed; the old credential is kept.
    Error,
}

/// Holds the live credential and refreshes it shortly before it expires.
#[derive(Debug, Clone)]
pub struct TokenManager {
    credential: TokenCredential,
    state: TokenState,
    changed: bool,
}

impl TokenManager {
    pub fn new(credential: TokenCredential) -> Self {
        Self {
            credential,
            state: TokenState::Valid,
            changed: false,
        }
    }

    pub fn credential(&self) -> &TokenCredential {
        &self.credential
    }

    pub fn state(&self) -> TokenState {
        self.state
    }

    /// True once the credential was refreshed and must be persisted.
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Whether the access token expires within the refresh margin of `now`.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) >= self.credential.expires_at
    }

    /// Return a usable access token, refreshing it first if it is about to expire.
    ///
    /// A failed refresh is returned as [`AppError::Auth`] and is not retried.
    pub async fn check_access<C: StravaApi>(
        &mut self,
        client: &C,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        tracing::debug!(
            expires_at = %self.credential.expires_at,
            now = %now,
            "Checking access token"
        );

        if self.needs_refresh(now) {
            tracing::info!("Access token expiring, refreshing");
            self.state = TokenState::Refreshing;

            let refreshed = client
                .refresh_token(&self.credential.refresh_token)
                .await
                .and_then(TokenResponse::into_credential);

            match refreshed {
                Ok(credential) => {
                    self.credential = credential;
                    self.changed = true;
                    self.state = TokenState::Valid;
                    tracing::info!(
                        expires_at = %self.credential.expires_at,
                        "Access token refreshed"
                    );
                }
                Err(e) => {
                    self.state = TokenState::Error;
                    tracing::error!(error = %e, "Token refresh failed");
                    return Err(match e {
                        AppError::Auth(msg) => AppError::Auth(msg),
                        other => AppError::Auth(other.to_string()),
                    });
                }
            }
        }

        Ok(self.credential.access_token.clone())
    }
}
