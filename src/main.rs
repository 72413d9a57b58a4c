// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activities command line tool
//!
//! Syncs Strava activities into a local database and exports them,
//! annotated with visited points of interest, for the static web page.

use activities::{
    config::{self, Config, DEFAULT_AUTH_PORT},
    db::ActivityStore,
    export,
    routes::{self, auth::authorize_url},
    services::{
        streak::DEFAULT_STREAK_TYPE, Annotator, GeoMatcher, StravaClient, SyncEngine, SyncMode,
        SyncOptions, TokenManager,
    },
    AppState,
};
use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "activities", about = "Sync and export Strava activities", version)]
struct Cli {
    /// Strava app configuration (falls back to STRAVA_CLIENT_ID/STRAVA_CLIENT_SECRET)
    #[arg(short, long, value_name = "JSON_FILE", default_value = "config.json")]
    config: PathBuf,

    /// Local activity database
    #[arg(short, long, value_name = "DATA_FILE", default_value = "data.db")]
    data: PathBuf,

    /// Points of interest to match against activity tracks
    #[arg(short, long, value_name = "JSON_FILE")]
    pois: Option<PathBuf>,

    /// Generated script for the web page
    #[arg(short, long, value_name = "JS_FILE", default_value = "web/activities.js")]
    output: PathBuf,

    /// Sync activities from Strava before exporting
    #[arg(short, long)]
    sync: bool,

    /// Discard stored activities and sync the full history
    #[arg(short, long)]
    force: bool,

    /// Run the local server to register a Strava account
    #[arg(short, long)]
    register: bool,

    /// Port of the registration server
    #[arg(long, default_value_t = DEFAULT_AUTH_PORT)]
    port: u16,

    /// Activity type used for the consecutive-day streak
    #[arg(long, default_value = DEFAULT_STREAK_TYPE)]
    streak_type: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(&cli.config)?;
    config.port = cli.port;

    let data = cli.data.to_str().context("Database path is not valid UTF-8")?;
    let store = ActivityStore::open(data).await?;

    let client = StravaClient::new(
        config.strava_client_id.clone(),
        config.strava_client_secret.clone(),
    );

    if cli.register {
        return serve_registration(config, store, client).await;
    }

    let Some(credential) = store.load_credential().await? else {
        bail!(
            "No Strava credential stored in {}; run with --register first",
            cli.data.display()
        );
    };

    if cli.sync {
        let mut tokens = TokenManager::new(credential);
        let options = SyncOptions {
            show_progress: true,
            ..SyncOptions::default()
        };
        let mode = if cli.force {
            SyncMode::Force
        } else {
            SyncMode::Normal
        };

        let result = SyncEngine::with_options(&client, &store, options)
            .sync(&mut tokens, mode, chrono::Utc::now())
            .await;

        // A refreshed credential is kept even when the pass itself failed
        if tokens.changed() {
            store.save_credential(tokens.credential()).await?;
        }

        let report = result.inspect_err(|e| {
            if e.is_strava_token_error() {
                tracing::warn!("Strava rejected the credential; run with --register to authorize again");
            }
        })?;
        tracing::info!(
            created = report.created,
            updated = report.updated,
            cleared = report.cleared,
            "Synced activities"
        );
    }

    let pois = match &cli.pois {
        Some(path) => config::load_points_of_interest(path)?,
        None => Vec::new(),
    };
    tracing::info!(count = pois.len(), "Points of interest loaded");

    let annotator = Annotator::new(GeoMatcher::default(), &pois, &cli.streak_type);
    let (athlete, activities) = annotator.load(&store).await?;

    export::write_activities_js(
        &cli.output,
        chrono::Local::now().naive_local(),
        &athlete,
        &activities,
        &pois,
    )?;
    Ok(())
}

/// Read the Strava app configuration from `path`, or from the environment if it is absent.
fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = if path.exists() {
        Config::from_json_file(path)?
    } else {
        tracing::debug!(path = %path.display(), "No config file, using environment");
        Config::from_env()?
    };
    Ok(config)
}

async fn serve_registration(
    config: Config,
    store: ActivityStore,
    client: StravaClient,
) -> anyhow::Result<()> {
    let addr = format!("127.0.0.1:{}", config.port);
    let url = format!("http://localhost:{}/", config.port);
    tracing::debug!(
        authorize_url = %authorize_url(&config.strava_client_id, config.port),
        "Registration configured"
    );

    let state = Arc::new(AppState {
        config,
        store,
        strava: client,
    });
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Registration server listening");
    println!("Open {} in a browser to register your Strava account", url);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize logging to stderr; JSON lines when `LOG_FORMAT=json`.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("activities=debug,info"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    if json {
        let format = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_current_span(true)
            .flatten_event(true);
        tracing_subscriber::registry().with(filter).with(format).init();
    } else {
        let format = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        tracing_subscriber::registry().with(filter).with(format).init();
    }
}
