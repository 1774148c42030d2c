//! Survey page assets
//!
//! The page, its driver script and stylesheet are compiled into the binary,
//! so the service needs only the image folders and the results store on disk.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

const INDEX_HTML: &str = include_str!("../ui/index.html");
const APP_JS: &str = include_str!("../ui/app.js");
const SURVEY_CSS: &str = include_str!("../ui/survey.css");

/// GET /
///
/// Intro text, the image pager and the results view; all state comes from
/// the session API.
pub async fn serve_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /static/app.js
pub async fn serve_app_js() -> Response {
    (
        StatusCode::OK,
        [("content-type", "application/javascript")],
        APP_JS,
    )
        .into_response()
}

/// GET /static/survey.css
pub async fn serve_survey_css() -> Response {
    (StatusCode::OK, [("content-type", "text/css")], SURVEY_CSS).into_response()
}
