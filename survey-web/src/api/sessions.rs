//! Session lifecycle and paging endpoints
//!
//! A session is created when the participant opens the survey and is the
//! only place their trial set and answers live until submission.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use survey_common::images::ImageLibrary;
use survey_common::trials::build_trial_set;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::session::{Progress, SurveySession};
use crate::AppState;

/// Session state for the page shell
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub progress: Progress,
    pub completed: bool,
    /// Folder problems that did not stop the survey
    pub load_errors: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl SessionView {
    pub fn from_session(session: &SurveySession) -> Self {
        Self {
            id: session.id(),
            progress: session.progress(),
            completed: session.is_completed(),
            load_errors: session.load_errors().to_vec(),
            created_at: session.created_at(),
        }
    }
}

/// Paging request
#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub index: usize,
}

/// POST /api/sessions
///
/// Loads both image folders, builds and caches the trial set for a new
/// session. Too few images is fatal for the survey and answers 503 with the
/// counts found plus any folder errors.
pub async fn create_session(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<SessionView>)> {
    let images_root = state.images_root.clone();
    let library = tokio::task::spawn_blocking(move || ImageLibrary::load(&images_root))
        .await
        .map_err(|e| ApiError::Internal(format!("Image loading task failed: {}", e)))?;

    let load_errors = library.errors();
    let built = build_trial_set(
        &library.real.images,
        &library.fake.images,
        &mut rand::thread_rng(),
    );

    let trials = match built {
        Ok(trials) => trials,
        Err(e @ survey_common::Error::InsufficientData { .. }) => {
            warn!("Cannot start survey: {}", e);
            return Err(ApiError::Unavailable {
                message: e.to_string(),
                details: load_errors,
            });
        }
        Err(e) => return Err(e.into()),
    };

    let session = SurveySession::new(trials, load_errors);
    let view = SessionView::from_session(&session);
    let id = state.sessions.insert(session).await;
    info!("Started survey session {}", id);

    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let session = state.sessions.get(id).await?;
    let session = session.lock().await;
    Ok(Json(SessionView::from_session(&session)))
}

/// DELETE /api/sessions/:id
///
/// Ends the session and drops its state.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.sessions.remove(id).await {
        info!("Discarded survey session {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Session {}", id)))
    }
}

/// POST /api/sessions/:id/navigate
///
/// Moves the page cursor; responses already captured are kept.
pub async fn navigate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<NavigateRequest>, JsonRejection>,
) -> ApiResult<Json<Progress>> {
    let Json(request) = payload?;
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    Ok(Json(session.go_to(request.index)?))
}
