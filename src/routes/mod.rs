// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers for the local registration server.

pub mod auth;

use crate::services::strava::StravaApi;
use crate::AppState;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Build the complete router with all routes.
pub fn create_router<C>(state: Arc<AppState<C>>) -> Router
where
    C: StravaApi + Send + Sync + 'static,
{
    Router::new()
        .merge(auth::routes::<C>())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
