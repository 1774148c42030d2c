//! Common error types for the survey

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for survey operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the survey crates
#[derive(Error, Debug)]
pub enum Error {
    /// An expected image directory does not exist
    #[error("Directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    /// Image directory exists but holds no png/jpg/jpeg files
    #[error("No images found in: {}", .0.display())]
    NoImages(PathBuf),

    /// A file in an image set could not be opened or decoded
    #[error("Error loading images from {set}: {detail}")]
    ImageLoad { set: String, detail: String },

    /// Not enough real/fake pairs to fill a session
    #[error("Need at least 5 real and 5 fake images to run the survey. Found {real} real and {fake} fake images.")]
    InsufficientData { real: usize, fake: usize },

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_message_names_counts() {
        let err = Error::InsufficientData { real: 4, fake: 10 };
        assert_eq!(
            err.to_string(),
            "Need at least 5 real and 5 fake images to run the survey. Found 4 real and 10 fake images."
        );
    }

    #[test]
    fn test_missing_directory_message() {
        let err = Error::MissingDirectory(PathBuf::from("images/real_images"));
        assert_eq!(err.to_string(), "Directory not found: images/real_images");
    }
}
