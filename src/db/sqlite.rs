// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite store with typed operations.
//!
//! Provides high-level operations for:
//! - Athletes (first-write-wins profile rows)
//! - Activities (upsert keyed by Strava ID, ordered scans)
//! - Auth (the single stored OAuth credential)
//!
//! A sync pass runs inside a [`StoreTransaction`] so that it either commits
//! as a whole or leaves storage untouched.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::str::FromStr;
use std::time::Duration;

use crate::db::schema::SQLITE_INIT;
use crate::error::AppError;
use crate::models::{Activity, Athlete, TokenCredential, Track};
use crate::time_utils::{format_local, format_utc_rfc3339, parse_local, parse_utc_rfc3339};

const ACTIVITY_COLUMNS: &str = "strava_id, athlete_id, name, distance, moving_time, \
     elapsed_time, total_elevation_gain, type, start_date, start_date_local, \
     location_country, summary_polyline, track, average_heartrate, average_speed";

/// Scan order over `start_date_local`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn sql(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// Local activity store.
#[derive(Clone)]
pub struct ActivityStore {
    pool: SqlitePool,
}

impl ActivityStore {
    /// Open (and create if missing) a SQLite database at `path`.
    pub async fn open(path: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path))
            .map_err(|e| AppError::Database(format!("Invalid database path: {}", e)))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        tracing::info!(path, "Opened activity database");
        Self::with_pool(pool).await
    }

    /// Open a private in-memory database (tests and dry runs).
    ///
    /// The pool holds exactly one connection that never expires, since every
    /// SQLite connection to `:memory:` sees its own database.
    pub async fn in_memory() -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, AppError> {
        for stmt in SQLITE_INIT.split(';') {
            let stmt = stmt.trim();
            if stmt.is_empty() {
                continue;
            }
            sqlx::query(stmt).execute(&pool).await?;
        }
        Ok(Self { pool })
    }

    /// Begin a transaction for a sync pass.
    pub async fn begin(&self) -> Result<StoreTransaction, AppError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        Ok(StoreTransaction { tx })
    }

    // ─── Athlete Operations ──────────────────────────────────────

    /// Get an athlete by Strava ID.
    pub async fn get_athlete(&self, athlete_id: u64) -> Result<Option<Athlete>, AppError> {
        let row = sqlx::query_as::<_, AthleteRow>(
            "SELECT id, firstname, lastname FROM athletes WHERE id = ?",
        )
        .bind(to_db_id(athlete_id)?)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Athlete::from))
    }

    /// Get the first stored athlete (single-user database).
    pub async fn first_athlete(&self) -> Result<Option<Athlete>, AppError> {
        let row = sqlx::query_as::<_, AthleteRow>(
            "SELECT id, firstname, lastname FROM athletes ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Athlete::from))
    }

    /// Insert an athlete unless one with the same ID exists.
    ///
    /// Existing rows are left untouched. Returns `true` if a row was created.
    pub async fn insert_athlete_if_absent(&self, athlete: &Athlete) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT INTO athletes (id, firstname, lastname) VALUES (?, ?, ?) \
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(to_db_id(athlete.id)?)
        .bind(&athlete.firstname)
        .bind(&athlete.lastname)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // ─── Activity Operations ─────────────────────────────────────

    /// Get an activity by Strava ID.
    pub async fn get_activity(&self, strava_id: u64) -> Result<Option<Activity>, AppError> {
        let mut conn = self.pool.acquire().await?;
        fetch_activity(&mut conn, strava_id).await
    }

    /// All activities of an athlete, ordered by local start date.
    pub async fn list_activities(
        &self,
        athlete_id: u64,
        order: SortOrder,
    ) -> Result<Vec<Activity>, AppError> {
        let sql = format!(
            "SELECT {} FROM activities WHERE athlete_id = ? \
             ORDER BY start_date_local {}, strava_id {}",
            ACTIVITY_COLUMNS,
            order.sql(),
            order.sql()
        );

        sqlx::query_as::<_, ActivityRow>(&sql)
            .bind(to_db_id(athlete_id)?)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Activity::try_from)
            .collect()
    }

    /// Number of stored activities.
    pub async fn count_activities(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activities")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Latest stored `start_date` for an athlete.
    pub async fn max_start_date(&self, athlete_id: u64) -> Result<Option<DateTime<Utc>>, AppError> {
        let mut conn = self.pool.acquire().await?;
        fetch_max_start_date(&mut conn, athlete_id).await
    }

    // ─── Credential Operations ───────────────────────────────────

    /// Load the stored OAuth credential.
    pub async fn load_credential(&self) -> Result<Option<TokenCredential>, AppError> {
        let row: Option<(String, String, String)> = sqlx::query_as(
            "SELECT access_token, refresh_token, expires_at FROM auth WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(
            |(access_token, refresh_token, expires_at)| -> Result<TokenCredential, AppError> {
                let expires_at = parse_utc_rfc3339(&expires_at).ok_or_else(|| {
                    AppError::Database(format!("Invalid credential expiry: {}", expires_at))
                })?;
                Ok(TokenCredential {
                    access_token,
                    refresh_token,
                    expires_at,
                })
            },
        )
        .transpose()
    }

    /// Store (replace) the OAuth credential.
    pub async fn save_credential(&self, credential: &TokenCredential) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO auth (id, access_token, refresh_token, expires_at) VALUES (1, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
                 access_token = excluded.access_token, \
                 refresh_token = excluded.refresh_token, \
                 expires_at = excluded.expires_at",
        )
        .bind(&credential.access_token)
        .bind(&credential.refresh_token)
        .bind(format_utc_rfc3339(credential.expires_at))
        .execute(&self.pool)
        .await?;

        tracing::debug!("Stored OAuth credential");
        Ok(())
    }
}

/// Pending writes of one sync pass.
///
/// Dropping the transaction without calling [`StoreTransaction::commit`]
/// rolls every write back.
pub struct StoreTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl StoreTransaction {
    /// Get an activity by Strava ID, seeing this transaction's writes.
    pub async fn get_activity(&mut self, strava_id: u64) -> Result<Option<Activity>, AppError> {
        fetch_activity(&mut self.tx, strava_id).await
    }

    /// Latest stored `start_date` for an athlete, seeing this transaction's writes.
    pub async fn max_start_date(
        &mut self,
        athlete_id: u64,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        fetch_max_start_date(&mut self.tx, athlete_id).await
    }

    /// Delete all activities of all athletes. Returns the number of rows removed.
    pub async fn clear_activities(&mut self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM activities")
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    /// Insert an activity, or overwrite every field of the existing row with the same Strava ID.
    pub async fn upsert_activity(&mut self, activity: &Activity) -> Result<(), AppError> {
        let track = activity
            .track
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode track: {}", e)))?;

        let sql = format!(
            "INSERT INTO activities ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(strava_id) DO UPDATE SET \
                 athlete_id = excluded.athlete_id, \
                 name = excluded.name, \
                 distance = excluded.distance, \
                 moving_time = excluded.moving_time, \
                 elapsed_time = excluded.elapsed_time, \
                 total_elevation_gain = excluded.total_elevation_gain, \
                 type = excluded.type, \
                 start_date = excluded.start_date, \
                 start_date_local = excluded.start_date_local, \
                 location_country = excluded.location_country, \
                 summary_polyline = excluded.summary_polyline, \
                 track = excluded.track, \
                 average_heartrate = excluded.average_heartrate, \
                 average_speed = excluded.average_speed",
            ACTIVITY_COLUMNS
        );

        sqlx::query(&sql)
            .bind(to_db_id(activity.strava_id)?)
            .bind(to_db_id(activity.athlete_id)?)
            .bind(&activity.name)
            .bind(activity.distance)
            .bind(activity.moving_time)
            .bind(activity.elapsed_time)
            .bind(activity.total_elevation_gain)
            .bind(&activity.activity_type)
            .bind(format_utc_rfc3339(activity.start_date))
            .bind(format_local(activity.start_date_local))
            .bind(&activity.location_country)
            .bind(&activity.summary_polyline)
            .bind(track)
            .bind(activity.average_heartrate)
            .bind(activity.average_speed)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    /// Commit all pending writes atomically.
    pub async fn commit(self) -> Result<(), AppError> {
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))
    }
}

// ─── Helper Functions ──────────────────────────────────────────

async fn fetch_activity(
    conn: &mut SqliteConnection,
    strava_id: u64,
) -> Result<Option<Activity>, AppError> {
    let sql = format!("SELECT {} FROM activities WHERE strava_id = ?", ACTIVITY_COLUMNS);
    sqlx::query_as::<_, ActivityRow>(&sql)
        .bind(to_db_id(strava_id)?)
        .fetch_optional(conn)
        .await?
        .map(Activity::try_from)
        .transpose()
}

async fn fetch_max_start_date(
    conn: &mut SqliteConnection,
    athlete_id: u64,
) -> Result<Option<DateTime<Utc>>, AppError> {
    // All rows use the same RFC3339 `Z` format, so the text maximum is the latest date.
    let max: Option<String> =
        sqlx::query_scalar("SELECT MAX(start_date) FROM activities WHERE athlete_id = ?")
            .bind(to_db_id(athlete_id)?)
            .fetch_one(conn)
            .await?;

    max.map(|value| {
        parse_utc_rfc3339(&value)
            .ok_or_else(|| AppError::Database(format!("Invalid stored start_date: {}", value)))
    })
    .transpose()
}

/// SQLite integers are signed; Strava IDs fit comfortably.
fn to_db_id(id: u64) -> Result<i64, AppError> {
    i64::try_from(id).map_err(|_| AppError::BadRequest(format!("ID out of range: {}", id)))
}

fn from_db_id(id: i64) -> Result<u64, AppError> {
    u64::try_from(id).map_err(|_| AppError::Database(format!("Negative ID in database: {}", id)))
}

#[derive(FromRow)]
struct AthleteRow {
    id: i64,
    firstname: String,
    lastname: String,
}

impl From<AthleteRow> for Athlete {
    fn from(row: AthleteRow) -> Self {
        Self {
            id: row.id as u64,
            firstname: row.firstname,
            lastname: row.lastname,
        }
    }
}

#[derive(FromRow)]
struct ActivityRow {
    strava_id: i64,
    athlete_id: i64,
    name: String,
    distance: f64,
    moving_time: i64,
    elapsed_time: i64,
    total_elevation_gain: f64,
    #[sqlx(rename = "type")]
    activity_type: String,
    start_date: String,
    start_date_local: String,
    location_country: Option<String>,
    summary_polyline: Option<String>,
    track: Option<String>,
    average_heartrate: Option<f64>,
    average_speed: Option<f64>,
}

impl TryFrom<ActivityRow> for Activity {
    type Error = AppError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        let start_date = parse_utc_rfc3339(&row.start_date).ok_or_else(|| {
            AppError::Database(format!("Invalid stored start_date: {}", row.start_date))
        })?;
        let start_date_local = parse_local(&row.start_date_local).ok_or_else(|| {
            AppError::Database(format!(
                "Invalid stored start_date_local: {}",
                row.start_date_local
            ))
        })?;

        // A track that no longer parses is dropped rather than failing the whole load.
        let track = row
            .track
            .as_deref()
            .and_then(|json| serde_json::from_str::<Track>(json).ok())
            .filter(|track| !track.is_empty());

        Ok(Self {
            strava_id: from_db_id(row.strava_id)?,
            athlete_id: from_db_id(row.athlete_id)?,
            name: row.name,
            distance: row.distance,
            moving_time: row.moving_time,
            elapsed_time: row.elapsed_time,
            total_elevation_gain: row.total_elevation_gain,
            activity_type: row.activity_type,
            start_date,
            start_date_local,
            location_country: row.location_country,
            summary_polyline: row.summary_polyline,
            track,
            average_heartrate: row.average_heartrate,
            average_speed: row.average_speed,
        })
    }
}
