//! Trial presentation and response capture

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response as HttpResponse},
    Json,
};
use serde::{Deserialize, Serialize};
use survey_common::model::{Response, Selection};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::session::SessionError;
use crate::AppState;

/// One page of the survey
#[derive(Debug, Serialize)]
pub struct TrialView {
    pub index: usize,
    pub caption: String,
    pub image_url: String,
    pub width: u32,
    pub height: u32,
    pub is_last: bool,
    pub response: Response,
}

/// Widget values sent by the page; absent fields are left unchanged
#[derive(Debug, Deserialize)]
pub struct ResponseUpdate {
    pub selection: Option<Selection>,
    pub confidence: Option<i64>,
}

/// GET /api/sessions/:id/trials/:index
///
/// Ground truth is never part of the view.
pub async fn get_trial(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> ApiResult<Json<TrialView>> {
    let session = state.sessions.get(id).await?;
    let session = session.lock().await;
    let trial = session.trial(index)?;

    Ok(Json(TrialView {
        index,
        caption: format!("Image {}", index + 1),
        image_url: format!("/api/sessions/{}/trials/{}/image", id, index),
        width: trial.image.width,
        height: trial.image.height,
        is_last: index == session.last_index(),
        response: session.response(index)?,
    }))
}

/// GET /api/sessions/:id/trials/:index/image
///
/// Streams the image file with its MIME type. The URL carries no hint of
/// which folder the image came from.
pub async fn get_trial_image(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> ApiResult<HttpResponse> {
    let (path, mime) = {
        let session = state.sessions.get(id).await?;
        let session = session.lock().await;
        let trial = session.trial(index)?;
        (trial.image.path.clone(), trial.image.mime_type())
    };

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(survey_common::Error::from)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime),
            (header::CACHE_CONTROL, "private, max-age=3600"),
        ],
        bytes,
    )
        .into_response())
}

/// PUT /api/sessions/:id/trials/:index/response
///
/// Called on every widget change so partial progress survives paging.
pub async fn put_response(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
    payload: Result<Json<ResponseUpdate>, JsonRejection>,
) -> ApiResult<Json<Response>> {
    let Json(update) = payload?;
    let confidence = update
        .confidence
        .map(|value| u8::try_from(value).map_err(|_| SessionError::InvalidConfidence(value)))
        .transpose()?;

    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    let response = session.record_response(index, update.selection, confidence)?;
    Ok(Json(response))
}
