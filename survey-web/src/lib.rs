//! survey-web library - Deepfake or Real survey service
//!
//! Exposes the router and state for the binary and integration tests.

use axum::Router;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use survey_common::db::ResultStore;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod session;

pub use crate::error::{ApiError, ApiResult};
pub use crate::session::{SessionStore, SurveySession};

/// Minutes without activity before a session is discarded
pub const DEFAULT_SESSION_IDLE_MINUTES: i64 = 120;

/// How often idle sessions are swept
pub const SESSION_SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Durable results store shared by every participant
    pub store: ResultStore,
    /// Folder containing `real_images/` and `fake_images/`
    pub images_root: PathBuf,
    /// Live participant sessions
    pub sessions: SessionStore,
    /// Service startup timestamp
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(store: ResultStore, images_root: PathBuf) -> Self {
        Self {
            store,
            images_root,
            sessions: SessionStore::new(),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post, put};

    let survey = Router::new()
        .route("/api/sessions", post(api::create_session))
        .route(
            "/api/sessions/:id",
            get(api::get_session).delete(api::delete_session),
        )
        .route("/api/sessions/:id/navigate", post(api::navigate))
        .route("/api/sessions/:id/trials/:index", get(api::get_trial))
        .route(
            "/api/sessions/:id/trials/:index/image",
            get(api::get_trial_image),
        )
        .route(
            "/api/sessions/:id/trials/:index/response",
            put(api::put_response),
        )
        .route("/api/sessions/:id/submit", post(api::submit_session))
        .route("/api/sessions/:id/results", get(api::get_results))
        .route("/api/results/download", get(api::download_results));

    let public = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/static/survey.css", get(api::serve_survey_css))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes());

    Router::new()
        .merge(survey)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
