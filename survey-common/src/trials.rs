//! Trial set construction
//!
//! Pairs real and fake images, shuffles the pairs once and fixes the first
//! [`TRIALS_PER_SESSION`] as a session's trials.

use crate::images::SurveyImage;
use crate::model::{ImageType, TRIALS_PER_SESSION};
use crate::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Each folder must contribute at least this many images
pub const MIN_IMAGES_PER_SET: usize = TRIALS_PER_SESSION / 2;

/// One image with its ground truth, at a fixed position in the session
#[derive(Debug, Clone, Serialize)]
pub struct Trial {
    pub index: usize,
    pub image: SurveyImage,
}

impl Trial {
    /// Ground-truth label, fixed when the set was built
    pub fn image_type(&self) -> ImageType {
        self.image.image_type
    }
}

/// The immutable trials of one session
///
/// Always holds exactly [`TRIALS_PER_SESSION`] entries.
#[derive(Debug, Clone)]
pub struct TrialSet {
    trials: Vec<Trial>,
}

impl TrialSet {
    pub fn get(&self, index: usize) -> Option<&Trial> {
        self.trials.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trial> {
        self.trials.iter()
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Build directly from images already in presentation order
    ///
    /// Only the first [`TRIALS_PER_SESSION`] images are used.
    pub fn from_ordered(images: Vec<SurveyImage>) -> Result<Self> {
        if images.len() < TRIALS_PER_SESSION {
            let real = count_of(&images, ImageType::Real);
            let fake = count_of(&images, ImageType::Fake);
            return Err(Error::InsufficientData { real, fake });
        }

        let trials = images
            .into_iter()
            .take(TRIALS_PER_SESSION)
            .enumerate()
            .map(|(index, image)| Trial { index, image })
            .collect();

        Ok(Self { trials })
    }
}

/// Alternate real and fake images: `2 * min(real, fake)` entries
pub fn interleave(real: &[SurveyImage], fake: &[SurveyImage]) -> Vec<SurveyImage> {
    real.iter()
        .zip(fake.iter())
        .flat_map(|(r, f)| [r.clone(), f.clone()])
        .collect()
}

/// Pair, shuffle and select the trials for a new session
///
/// Fails with [`Error::InsufficientData`] naming the folder counts when fewer
/// than [`MIN_IMAGES_PER_SET`] pairs can be formed.
pub fn build_trial_set<R: Rng + ?Sized>(
    real: &[SurveyImage],
    fake: &[SurveyImage],
    rng: &mut R,
) -> Result<TrialSet> {
    if real.len().min(fake.len()) < MIN_IMAGES_PER_SET {
        return Err(Error::InsufficientData {
            real: real.len(),
            fake: fake.len(),
        });
    }

    let mut pool = interleave(real, fake);
    pool.shuffle(rng);
    TrialSet::from_ordered(pool)
}

fn count_of(images: &[SurveyImage], image_type: ImageType) -> usize {
    images.iter().filter(|i| i.image_type == image_type).count()
}
