// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava OAuth registration routes.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::Athlete;
use crate::services::strava::StravaApi;
use crate::AppState;

const AUTHORIZE_URL: &str = "https://www.strava.com/oauth/authorize";

pub fn routes<C>() -> Router<Arc<AppState<C>>>
where
    C: StravaApi + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(index::<C>))
        .route("/auth", get(auth_callback::<C>))
        .route("/complete", get(complete))
}

/// Strava authorization URL that redirects back to the local `/auth` route.
pub fn authorize_url(client_id: &str, port: u16) -> String {
    let callback_url = format!("http://localhost:{}/auth", port);
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}",
        AUTHORIZE_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(&callback_url),
        urlencoding::encode("activity:read_all"),
    )
}

/// Landing page: link to Strava, or skip ahead when already registered.
async fn index<C>(State(state): State<Arc<AppState<C>>>) -> Result<Response>
where
    C: StravaApi + Send + Sync + 'static,
{
    if state.store.load_credential().await?.is_some() {
        tracing::info!("Credential already stored, skipping registration");
        return Ok(Redirect::temporary("/complete").into_response());
    }

    let url = authorize_url(&state.config.strava_client_id, state.config.port);
    tracing::info!(client_id = %state.config.strava_client_id, "Serving registration page");

    Ok(Html(format!(
        "<!DOCTYPE html>\n<html><head><title>Register</title></head><body>\
         <h1>Connect with Strava</h1>\
         <p><a href=\"{}\">Authorize access to your activities</a></p>\
         </body></html>\n",
        url.replace('&', "&amp;")
    ))
    .into_response())
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback: exchange the code, store credential and athlete.
async fn auth_callback<C>(
    State(state): State<Arc<AppState<C>>>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect>
where
    C: StravaApi + Send + Sync + 'static,
{
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Strava");
        return Err(AppError::BadRequest(format!("Authorization denied: {}", error)));
    }
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    tracing::info!("Exchanging authorization code for tokens");
    let response = state.strava.exchange_code(&code).await?;

    let credential = response.token.into_credential()?;
    state.store.save_credential(&credential).await?;

    if let Some(athlete) = response.athlete {
        let athlete: Athlete = athlete.into();
        let created = state.store.insert_athlete_if_absent(&athlete).await?;
        tracing::info!(
            athlete_id = athlete.id,
            firstname = %athlete.firstname,
            created,
            "OAuth successful, credential stored"
        );
    }

    Ok(Redirect::temporary("/complete"))
}

async fn complete() -> Html<&'static str> {
    Html(
        "<!DOCTYPE html>\n<html><head><title>Registered</title></head><body>\
         <h1>Registration complete</h1>\
         <p>You can close this window and run a sync.</p>\
         </body></html>\n",
    )
}
