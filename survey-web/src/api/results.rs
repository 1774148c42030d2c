//! Submission, results view and download

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Local;
use serde::Serialize;
use survey_common::db::{format_timestamp, DOWNLOAD_FILE_NAME};
use survey_common::scoring::SessionResults;
use survey_common::stats::{aggregate, ParticipantSummary};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::session::{Completion, SessionError};
use crate::AppState;

/// Everything the results page shows
#[derive(Debug, Serialize)]
pub struct ResultsView {
    pub session_id: Uuid,
    pub timestamp: String,
    pub results: SessionResults,
    pub participants: ParticipantSummary,
    pub download_url: String,
}

/// POST /api/sessions/:id/submit
///
/// Scores the session, appends its rows to the store under one timestamp and
/// returns the results view. Runs once; repeating the call returns the
/// stored outcome without writing again.
pub async fn submit_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ResultsView>> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;

    let completion = match session.completion() {
        Some(completion) => completion.clone(),
        None => {
            let results = session.score()?;
            let timestamp = format_timestamp(Local::now());
            state.store.append_session(&results.rows, &timestamp).await?;
            info!(
                "Session {} submitted: {}/{} correct ({:.1}%)",
                id, results.correct, results.total, results.accuracy
            );
            session.complete(timestamp, results)?.clone()
        }
    };
    drop(session);

    Ok(Json(results_view(&state, id, completion).await?))
}

/// GET /api/sessions/:id/results
pub async fn get_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ResultsView>> {
    let completion = {
        let session = state.sessions.get(id).await?;
        let session = session.lock().await;
        session
            .completion()
            .cloned()
            .ok_or(SessionError::NotCompleted)?
    };

    Ok(Json(results_view(&state, id, completion).await?))
}

/// GET /api/results/download
///
/// The full store, every participant, as a CSV attachment.
pub async fn download_results(State(state): State<AppState>) -> ApiResult<Response> {
    let csv = state.store.export_csv().await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", DOWNLOAD_FILE_NAME),
            ),
        ],
        csv,
    )
        .into_response())
}

/// Re-read the whole store so the statistics include every participant
async fn results_view(
    state: &AppState,
    id: Uuid,
    completion: Completion,
) -> ApiResult<ResultsView> {
    let all_rows = state.store.load_all().await?;

    Ok(ResultsView {
        session_id: id,
        timestamp: completion.timestamp,
        results: completion.results,
        participants: aggregate(&all_rows),
        download_url: "/api/results/download".to_string(),
    })
}
