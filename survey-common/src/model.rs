//! Survey data model
//!
//! Ground-truth labels, participant responses and result rows shared by the
//! scoring, storage and HTTP layers.

use serde::{Deserialize, Serialize};

/// Number of trials every session presents
pub const TRIALS_PER_SESSION: usize = 10;

/// Slider value used when a participant never touched the confidence control
pub const DEFAULT_CONFIDENCE: u8 = 50;

/// Upper bound of the confidence slider
pub const MAX_CONFIDENCE: u8 = 100;

/// Label recorded for a trial the participant never answered
pub const UNKNOWN_SELECTION: &str = "Unknown";

/// Ground truth for an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Real,
    Fake,
}

impl ImageType {
    /// Folder under the images root holding this image type
    pub fn dir_name(self) -> &'static str {
        match self {
            ImageType::Real => "real_images",
            ImageType::Fake => "fake_images",
        }
    }

    /// Label shown to participants and written to the results store
    pub fn label(self) -> &'static str {
        match self {
            ImageType::Real => "Real",
            ImageType::Fake => "Deepfake",
        }
    }

    /// Whether `selection` names this image type
    pub fn matches(self, selection: Selection) -> bool {
        matches!(
            (self, selection),
            (ImageType::Real, Selection::Real) | (ImageType::Fake, Selection::Deepfake)
        )
    }
}

/// Participant's classification of one image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    Real,
    Deepfake,
}

impl Selection {
    pub fn label(self) -> &'static str {
        match self {
            Selection::Real => "Real",
            Selection::Deepfake => "Deepfake",
        }
    }
}

/// Answer slot for one trial
///
/// Every trial starts with no selection and the slider at its midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub selection: Option<Selection>,
    pub confidence: u8,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            selection: None,
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

/// Scored outcome of one trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// 1-based position in the session
    pub image_number: u32,
    /// `Real`, `Deepfake` or `Unknown`
    pub user_selection: String,
    pub confidence: u8,
    /// `Real` or `Deepfake`
    pub actual_type: String,
    pub is_correct: bool,
    /// `images/<real_images|fake_images>/<file name>`
    pub image_path: String,
}

/// Result row as read back from the durable store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedResultRow {
    /// Store row id, monotonically increasing in append order
    pub id: i64,
    /// Submission time shared by every row of one session
    pub timestamp: String,
    #[serde(flatten)]
    pub row: ResultRow,
}
