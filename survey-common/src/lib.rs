//! # Survey Common Library
//!
//! Core of the deepfake image survey:
//! - Image set loading and trial set construction
//! - Response model and session scoring
//! - Durable results store and cross-participant statistics
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod images;
pub mod model;
pub mod scoring;
pub mod stats;
pub mod trials;

pub use error::{Error, Result};
pub use model::{ImageType, Response, ResultRow, Selection, TRIALS_PER_SESSION};
