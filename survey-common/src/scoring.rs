//! Session scoring
//!
//! Joins a session's responses against the ground truth of its trials.

use crate::model::{Response, ResultRow, UNKNOWN_SELECTION};
use crate::trials::{Trial, TrialSet};
use serde::{Deserialize, Serialize};

/// Scored session, computed once at submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResults {
    pub rows: Vec<ResultRow>,
    pub correct: usize,
    pub total: usize,
    /// Percentage rounded to one decimal
    pub accuracy: f64,
}

/// Score one trial; an absent response counts as unanswered
pub fn score_trial(trial: &Trial, response: Option<&Response>) -> ResultRow {
    let response = response.copied().unwrap_or_default();
    let actual = trial.image_type();

    let (user_selection, is_correct) = match response.selection {
        Some(selection) => (selection.label().to_string(), actual.matches(selection)),
        None => (UNKNOWN_SELECTION.to_string(), false),
    };

    ResultRow {
        image_number: trial.index as u32 + 1,
        user_selection,
        confidence: response.confidence,
        actual_type: actual.label().to_string(),
        is_correct,
        image_path: trial.image.display_path(),
    }
}

/// Score every trial in order; `responses` is indexed by trial index
pub fn score_session(trials: &TrialSet, responses: &[Response]) -> SessionResults {
    let rows: Vec<ResultRow> = trials
        .iter()
        .map(|trial| score_trial(trial, responses.get(trial.index)))
        .collect();

    let correct = rows.iter().filter(|r| r.is_correct).count();
    let total = rows.len();

    SessionResults {
        rows,
        correct,
        total,
        accuracy: round_one_decimal(accuracy_percent(correct, total)),
    }
}

/// `correct / total` as a percentage; zero when there is nothing to score
pub fn accuracy_percent(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImageType, Selection, DEFAULT_CONFIDENCE, TRIALS_PER_SESSION};
    use crate::trials::build_trial_set;
    use crate::trials::tests::sample_images;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn trial_set() -> TrialSet {
        let real = sample_images(ImageType::Real, 6);
        let fake = sample_images(ImageType::Fake, 6);
        build_trial_set(&real, &fake, &mut StdRng::seed_from_u64(3)).unwrap()
    }

    fn correct_answer(image_type: ImageType) -> Selection {
        match image_type {
            ImageType::Real => Selection::Real,
            ImageType::Fake => Selection::Deepfake,
        }
    }

    #[test]
    fn test_all_correct_is_full_accuracy() {
        let trials = trial_set();
        let responses: Vec<Response> = trials
            .iter()
            .map(|t| Response {
                selection: Some(correct_answer(t.image_type())),
                confidence: 80,
            })
            .collect();

        let results = score_session(&trials, &responses);
        assert_eq!(results.total, TRIALS_PER_SESSION);
        assert_eq!(results.correct, TRIALS_PER_SESSION);
        assert_eq!(results.accuracy, 100.0);
        assert!(results.rows.iter().all(|r| r.is_correct));
    }

    #[test]
    fn test_unanswered_trials_score_unknown_and_incorrect() {
        let trials = trial_set();

        let results = score_session(&trials, &[]);
        assert_eq!(results.correct, 0);
        assert_eq!(results.accuracy, 0.0);
        for row in &results.rows {
            assert_eq!(row.user_selection, "Unknown");
            assert_eq!(row.confidence, DEFAULT_CONFIDENCE);
            assert!(!row.is_correct);
        }
    }

    #[test]
    fn test_row_fields_follow_trial() {
        let trials = trial_set();
        let trial = trials.get(3).unwrap();
        let wrong = match trial.image_type() {
            ImageType::Real => Selection::Deepfake,
            ImageType::Fake => Selection::Real,
        };

        let row = score_trial(
            trial,
            Some(&Response {
                selection: Some(wrong),
                confidence: 12,
            }),
        );
        assert_eq!(row.image_number, 4);
        assert_eq!(row.user_selection, wrong.label());
        assert_eq!(row.confidence, 12);
        assert_eq!(row.actual_type, trial.image_type().label());
        assert!(!row.is_correct);
        assert_eq!(row.image_path, trial.image.display_path());
    }

    #[test]
    fn test_partial_answers() {
        let trials = trial_set();
        let mut responses = vec![Response::default(); TRIALS_PER_SESSION];
        for trial in trials.iter().take(7) {
            responses[trial.index].selection = Some(correct_answer(trial.image_type()));
        }

        let results = score_session(&trials, &responses);
        assert_eq!(results.correct, 7);
        assert_eq!(results.accuracy, 70.0);
    }

    #[test]
    fn test_round_one_decimal() {
        assert_eq!(round_one_decimal(66.666), 66.7);
        assert_eq!(round_one_decimal(accuracy_percent(1, 3)), 33.3);
        assert_eq!(accuracy_percent(0, 0), 0.0);
    }
}
