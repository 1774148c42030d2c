//! Image set loading
//!
//! Scans `<images_root>/real_images` and `<images_root>/fake_images` for
//! png/jpg/jpeg files and opens each one. Failures are reported per folder
//! and never abort the process; the caller decides whether the remaining
//! images are enough to run a session.

use crate::model::ImageType;
use crate::{Error, Result};
use image::ImageFormat;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File extensions accepted as survey images (compared lower-cased)
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// An image that opened successfully
#[derive(Debug, Clone, Serialize)]
pub struct SurveyImage {
    pub image_type: ImageType,
    /// Location on disk
    #[serde(skip)]
    pub path: PathBuf,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub format: ImageFormat,
}

impl SurveyImage {
    /// MIME type used when serving the image bytes
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Path recorded in the results store
    pub fn display_path(&self) -> String {
        format!("images/{}/{}", self.image_type.dir_name(), self.file_name)
    }
}

/// Outcome of loading one folder
#[derive(Debug)]
pub struct ImageSetLoad {
    pub image_type: ImageType,
    pub images: Vec<SurveyImage>,
    /// Set when the folder contributed nothing because of a problem
    pub error: Option<Error>,
}

/// Both image sets, loaded together at session start
#[derive(Debug)]
pub struct ImageLibrary {
    pub real: ImageSetLoad,
    pub fake: ImageSetLoad,
}

impl ImageLibrary {
    /// Load the real and fake folders under `images_root`
    pub fn load(images_root: &Path) -> Self {
        let real = load_image_set(images_root, ImageType::Real);
        let fake = load_image_set(images_root, ImageType::Fake);
        info!(
            "Loaded {} real and {} fake images from {}",
            real.images.len(),
            fake.images.len(),
            images_root.display()
        );
        Self { real, fake }
    }

    /// Inline messages for every folder that failed to load
    pub fn errors(&self) -> Vec<String> {
        [&self.real, &self.fake]
            .into_iter()
            .filter_map(|set| set.error.as_ref().map(|e| e.to_string()))
            .collect()
    }
}

/// Load one image folder
///
/// Missing folder, empty folder and any unreadable file all yield an empty
/// set with the error attached. A single bad file empties the whole set.
pub fn load_image_set(images_root: &Path, image_type: ImageType) -> ImageSetLoad {
    let set_path = images_root.join(image_type.dir_name());

    let result = list_image_files(&set_path, image_type).and_then(|files| {
        files
            .iter()
            .map(|path| load_image(path, image_type))
            .collect::<Result<Vec<_>>>()
    });

    match result {
        Ok(images) => ImageSetLoad {
            image_type,
            images,
            error: None,
        },
        Err(e) => {
            warn!("{}", e);
            ImageSetLoad {
                image_type,
                images: Vec::new(),
                error: Some(e),
            }
        }
    }
}

/// List image files directly inside `dir`, sorted by file name
pub fn list_image_files(dir: &Path, image_type: ImageType) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::MissingDirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| Error::ImageLoad {
            set: image_type.dir_name().to_string(),
            detail: e.to_string(),
        })?;

        if entry.file_type().is_file() && has_image_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(Error::NoImages(dir.to_path_buf()));
    }

    debug!("{} candidate images in {}", files.len(), dir.display());
    Ok(files)
}

/// Open one image and read its dimensions
pub fn load_image(path: &Path, image_type: ImageType) -> Result<SurveyImage> {
    let load_error = |detail: String| Error::ImageLoad {
        set: image_type.dir_name().to_string(),
        detail,
    };

    let format = ImageFormat::from_path(path)
        .map_err(|e| load_error(format!("{}: {}", path.display(), e)))?;
    let (width, height) = image::image_dimensions(path)
        .map_err(|e| load_error(format!("{}: {}", path.display(), e)))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(SurveyImage {
        image_type,
        path: path.to_path_buf(),
        file_name,
        width,
        height,
        format,
    })
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
