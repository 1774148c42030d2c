//! HTTP API handlers for survey-web

pub mod buildinfo;
pub mod health;
pub mod results;
pub mod sessions;
pub mod trials;
pub mod ui;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use results::{download_results, get_results, submit_session};
pub use sessions::{create_session, delete_session, get_session, navigate};
pub use trials::{get_trial, get_trial_image, put_response};
pub use ui::{serve_app_js, serve_index, serve_survey_css};
