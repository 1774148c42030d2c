//! survey-web - Deepfake or Real image survey
//!
//! Serves a single-page survey that shows each participant ten images (real
//! photographs and AI-generated faces), collects a Real/Deepfake choice plus a
//! confidence rating per image, and reports individual and cross-participant
//! accuracy. Every submission is appended to a SQLite results store that can
//! be downloaded as CSV.

use anyhow::{Context, Result};
use chrono::Duration;
use clap::Parser;
use std::path::PathBuf;
use survey_common::config::{ConfigOverrides, SurveyConfig};
use survey_common::db::ResultStore;
use survey_common::images::ImageLibrary;
use survey_web::{
    build_router, AppState, DEFAULT_SESSION_IDLE_MINUTES, SESSION_SWEEP_INTERVAL,
};
use tracing::{info, warn};

/// Command-line arguments (highest configuration priority)
#[derive(Debug, Parser)]
#[command(name = "survey-web", version, about = "Deepfake or Real image survey")]
struct Args {
    /// Folder holding the results store
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// Folder containing real_images/ and fake_images/
    #[arg(long, env = "SURVEY_IMAGES_ROOT")]
    images_root: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on
    #[arg(long, env = "SURVEY_PORT")]
    port: Option<u16>,

    /// Minutes of inactivity after which a session is discarded
    #[arg(long, env = "SURVEY_SESSION_IDLE_MINUTES", default_value_t = DEFAULT_SESSION_IDLE_MINUTES)]
    session_idle_minutes: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Build identification first, before any slow startup work
    info!(
        "Starting Deepfake Survey (survey-web) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let session_idle = Duration::minutes(args.session_idle_minutes.max(1));
    let config = SurveyConfig::resolve(ConfigOverrides {
        root_folder: args.root_folder,
        images_root: args.images_root,
        bind: args.bind,
        port: args.port,
    });

    info!("Root folder: {}", config.root_folder.display());
    info!("Images root: {}", config.images_root.display());

    // Report folder problems at startup; sessions re-scan on creation
    let images_root = config.images_root.clone();
    let library = tokio::task::spawn_blocking(move || ImageLibrary::load(&images_root)).await?;
    for message in library.errors() {
        warn!("{}", message);
    }

    let db_path = config.results_db_path();
    let store = ResultStore::open(&db_path)
        .await
        .with_context(|| format!("Failed to open results store {}", db_path.display()))?;
    info!(
        "✓ Results store ready: {} ({} rows)",
        db_path.display(),
        store.row_count().await?
    );

    let state = AppState::new(store, config.images_root.clone());
    state
        .sessions
        .spawn_sweeper(session_idle, SESSION_SWEEP_INTERVAL);
    info!(
        "Idle sessions discarded after {} minutes",
        session_idle.num_minutes()
    );
    let app = build_router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("survey-web listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
