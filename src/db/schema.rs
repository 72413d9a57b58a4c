//! SQL DDL applied at connect time. Every statement is idempotent.

/// SQLite schema:
/// - `athletes` (one row per Strava account)
/// - `activities` (keyed by Strava activity ID)
/// - `auth` (the single stored OAuth credential, `id` is always 1)
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS athletes (
    id INTEGER PRIMARY KEY NOT NULL,
    firstname TEXT NOT NULL,
    lastname TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS activities (
    strava_id INTEGER PRIMARY KEY NOT NULL,
    athlete_id INTEGER NOT NULL REFERENCES athletes(id),
    name TEXT NOT NULL,
    distance REAL NOT NULL,
    moving_time INTEGER NOT NULL, -- seconds
    elapsed_time INTEGER NOT NULL, -- seconds
    total_elevation_gain REAL NOT NULL,
    type TEXT NOT NULL,
    start_date TEXT NOT NULL, -- RFC3339, Z suffix
    start_date_local TEXT NOT NULL, -- YYYY-MM-DD HH:MM:SS
    location_country TEXT NULL,
    summary_polyline TEXT NULL,
    track TEXT NULL, -- JSON array of {lat, lon}
    average_heartrate REAL NULL,
    average_speed REAL NULL
);

CREATE INDEX IF NOT EXISTS idx_activities_athlete_start
    ON activities(athlete_id, start_date_local);

CREATE TABLE IF NOT EXISTS auth (
    id INTEGER PRIMARY KEY NOT NULL CHECK (id = 1),
    access_token TEXT NOT NULL,
    refresh_token TEXT NOT NULL,
    expires_at TEXT NOT NULL -- RFC3339, Z suffix
);
"#;
