// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! `activities.js` generation for the static web front-end.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{ActivityOutput, AnnotatedActivity, Athlete, PointOfInterest};
use crate::time_utils::format_local;

/// Render the script that declares the synced data as JS constants.
pub fn render_activities_js(
    last_sync: NaiveDateTime,
    athlete: &Athlete,
    activities: &[AnnotatedActivity],
    pois: &[PointOfInterest],
) -> Result<String> {
    let outputs: Vec<ActivityOutput> = activities.iter().map(ActivityOutput::from).collect();

    let mut js = String::new();
    writeln!(js, "const the_last_sync = '{}';", format_local(last_sync))
        .map_err(|e| AppError::Internal(e.into()))?;
    push_const(&mut js, "the_strava_athlete", athlete)?;
    push_const(&mut js, "the_activities", &outputs)?;
    push_const(&mut js, "the_pois", pois)?;
    Ok(js)
}

/// Render and write the script to `path`, creating parent directories.
pub fn write_activities_js(
    path: &Path,
    last_sync: NaiveDateTime,
    athlete: &Athlete,
    activities: &[AnnotatedActivity],
    pois: &[PointOfInterest],
) -> Result<()> {
    let js = render_activities_js(last_sync, athlete, activities, pois)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, js)?;

    tracing::info!(
        path = %path.display(),
        activities = activities.len(),
        "Wrote activities script"
    );
    Ok(())
}

fn push_const<T: Serialize + ?Sized>(js: &mut String, name: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize {}: {}", name, e)))?;
    js.push_str("const ");
    js.push_str(name);
    js.push_str(" = ");
    js.push_str(&json);
    js.push_str(";\n");
    Ok(())
}
