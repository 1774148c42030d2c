//! Per-participant survey sessions
//!
//! A session owns its trial set, its response slots and the paging cursor.
//! Nothing here is shared between participants; the registry only maps ids
//! to independently locked sessions.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use survey_common::model::{Response, Selection, MAX_CONFIDENCE, TRIALS_PER_SESSION};
use survey_common::scoring::{score_session, SessionResults};
use survey_common::trials::{Trial, TrialSet};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

/// Session state errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(Uuid),

    #[error("Trial index {0} is out of range (0-{})", TRIALS_PER_SESSION - 1)]
    InvalidIndex(usize),

    #[error("Confidence {0} is out of range (0-100)")]
    InvalidConfidence(i64),

    #[error("Survey already submitted")]
    AlreadyCompleted,

    #[error("Survey can only be submitted from the last image")]
    NotOnLastPage,

    #[error("Survey has not been submitted yet")]
    NotCompleted,
}

/// Progress indicator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub answered: usize,
}

/// Outcome fixed when the session is submitted
#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    pub timestamp: String,
    pub results: SessionResults,
}

/// One participant's run through the survey
#[derive(Debug)]
pub struct SurveySession {
    id: Uuid,
    trials: TrialSet,
    responses: [Response; TRIALS_PER_SESSION],
    current: usize,
    load_errors: Vec<String>,
    completion: Option<Completion>,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

impl SurveySession {
    /// Start a session over an already-built trial set
    ///
    /// `load_errors` are folder problems that did not prevent the session
    /// from starting; they are shown to the participant.
    pub fn new(trials: TrialSet, load_errors: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            trials,
            responses: [Response::default(); TRIALS_PER_SESSION],
            current: 0,
            load_errors,
            completion: None,
            created_at: now,
            last_active: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time of the last paging, answer or submission
    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    pub fn load_errors(&self) -> &[String] {
        &self.load_errors
    }

    pub fn trials(&self) -> &TrialSet {
        &self.trials
    }

    pub fn trial(&self, index: usize) -> Result<&Trial, SessionError> {
        self.trials.get(index).ok_or(SessionError::InvalidIndex(index))
    }

    pub fn response(&self, index: usize) -> Result<Response, SessionError> {
        self.responses
            .get(index)
            .copied()
            .ok_or(SessionError::InvalidIndex(index))
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn last_index(&self) -> usize {
        self.trials.len().saturating_sub(1)
    }

    pub fn is_last_page(&self) -> bool {
        self.current == self.last_index()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            current: self.current,
            total: self.trials.len(),
            answered: self
                .responses
                .iter()
                .filter(|r| r.selection.is_some())
                .count(),
        }
    }

    /// Move the paging cursor
    pub fn go_to(&mut self, index: usize) -> Result<Progress, SessionError> {
        self.ensure_open()?;
        if index > self.last_index() {
            return Err(SessionError::InvalidIndex(index));
        }
        self.current = index;
        self.last_active = Utc::now();
        Ok(self.progress())
    }

    pub fn next(&mut self) -> Result<Progress, SessionError> {
        let target = (self.current + 1).min(self.last_index());
        self.go_to(target)
    }

    pub fn previous(&mut self) -> Result<Progress, SessionError> {
        let target = self.current.saturating_sub(1);
        self.go_to(target)
    }

    /// Write widget values for one trial; `None` leaves a value unchanged
    pub fn record_response(
        &mut self,
        index: usize,
        selection: Option<Selection>,
        confidence: Option<u8>,
    ) -> Result<Response, SessionError> {
        self.ensure_open()?;
        if let Some(value) = confidence {
            if value > MAX_CONFIDENCE {
                return Err(SessionError::InvalidConfidence(value.into()));
            }
        }

        let slot = self
            .responses
            .get_mut(index)
            .ok_or(SessionError::InvalidIndex(index))?;

        if selection.is_some() {
            slot.selection = selection;
        }
        if let Some(value) = confidence {
            slot.confidence = value;
        }
        let response = *slot;
        self.last_active = Utc::now();

        Ok(response)
    }

    pub fn is_completed(&self) -> bool {
        self.completion.is_some()
    }

    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }

    /// Score the responses captured so far
    ///
    /// Only allowed from the last page of an open session.
    pub fn score(&self) -> Result<SessionResults, SessionError> {
        self.ensure_open()?;
        if !self.is_last_page() {
            return Err(SessionError::NotOnLastPage);
        }
        Ok(score_session(&self.trials, &self.responses))
    }

    /// Record the submission; later edits and submissions are refused
    pub fn complete(
        &mut self,
        timestamp: String,
        results: SessionResults,
    ) -> Result<&Completion, SessionError> {
        self.ensure_open()?;
        self.last_active = Utc::now();
        Ok(self.completion.insert(Completion { timestamp, results }))
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.is_completed() {
            Err(SessionError::AlreadyCompleted)
        } else {
            Ok(())
        }
    }
}

/// Registry of live sessions
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<SurveySession>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and return its id
    pub async fn insert(&self, session: SurveySession) -> Uuid {
        let id = session.id();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        id
    }

    pub async fn get(&self, id: Uuid) -> Result<Arc<Mutex<SurveySession>>, SessionError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound(id))
    }

    /// Discard a session; returns whether it existed
    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    /// Drop sessions idle for at least `max_idle` as of `now`
    ///
    /// Completed sessions are kept until they too go idle, so the results
    /// page can still fetch its images. Sessions locked by a request in
    /// flight are in use and skipped. Returns the number dropped.
    pub async fn prune_idle(&self, max_idle: Duration, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(session) => now - session.last_active() < max_idle,
            Err(_) => true,
        });
        before - sessions.len()
    }

    /// Background task pruning idle sessions every `period`
    pub fn spawn_sweeper(
        &self,
        max_idle: Duration,
        period: std::time::Duration,
    ) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            loop {
                tick.tick().await;
                let dropped = store.prune_idle(max_idle, Utc::now()).await;
                if dropped > 0 {
                    info!("Discarded {} idle survey sessions", dropped);
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use std::path::PathBuf;
    use survey_common::images::SurveyImage;
    use survey_common::model::ImageType;

    fn trial_set() -> TrialSet {
        let images = (0..TRIALS_PER_SESSION)
            .map(|i| {
                let image_type = if i % 3 == 0 {
                    ImageType::Real
                } else {
                    ImageType::Fake
                };
                let file_name = format!("{}.png", i);
                SurveyImage {
                    image_type,
                    path: PathBuf::from("images")
                        .join(image_type.dir_name())
                        .join(&file_name),
                    file_name,
                    width: 8,
                    height: 8,
                    format: ImageFormat::Png,
                }
            })
            .collect();
        TrialSet::from_ordered(images).unwrap()
    }

    fn correct_answer(image_type: ImageType) -> Selection {
        match image_type {
            ImageType::Real => Selection::Real,
            ImageType::Fake => Selection::Deepfake,
        }
    }

    #[test]
    fn test_new_session_defaults() {
        let session = SurveySession::new(trial_set(), Vec::new());
        assert_eq!(session.current(), 0);
        assert_eq!(session.trials().len(), TRIALS_PER_SESSION);
        assert_eq!(session.response(4).unwrap(), Response::default());
        assert_eq!(
            session.progress(),
            Progress {
                current: 0,
                total: 10,
                answered: 0
            }
        );
        assert!(!session.is_completed());
    }

    #[test]
    fn test_paging_clamps_and_validates() {
        let mut session = SurveySession::new(trial_set(), Vec::new());

        assert_eq!(session.previous().unwrap().current, 0);
        assert_eq!(session.next().unwrap().current, 1);
        assert_eq!(session.go_to(9).unwrap().current, 9);
        assert_eq!(session.next().unwrap().current, 9);
        assert_eq!(session.go_to(10), Err(SessionError::InvalidIndex(10)));
        assert!(session.is_last_page());
    }

    #[test]
    fn test_responses_persist_across_pages() {
        let mut session = SurveySession::new(trial_set(), Vec::new());

        session
            .record_response(2, Some(Selection::Deepfake), None)
            .unwrap();
        session.go_to(5).unwrap();
        session.record_response(2, None, Some(90)).unwrap();
        session.go_to(2).unwrap();

        let response = session.response(2).unwrap();
        assert_eq!(response.selection, Some(Selection::Deepfake));
        assert_eq!(response.confidence, 90);
        assert_eq!(session.progress().answered, 1);
    }

    #[test]
    fn test_response_validation() {
        let mut session = SurveySession::new(trial_set(), Vec::new());
        assert_eq!(
            session.record_response(0, None, Some(101)),
            Err(SessionError::InvalidConfidence(101))
        );
        assert_eq!(
            session.record_response(10, Some(Selection::Real), None),
            Err(SessionError::InvalidIndex(10))
        );
    }

    #[test]
    fn test_submit_requires_last_page() {
        let session = SurveySession::new(trial_set(), Vec::new());
        assert_eq!(session.score().unwrap_err(), SessionError::NotOnLastPage);
    }

    #[test]
    fn test_all_correct_answers_score_full_marks() {
        let mut session = SurveySession::new(trial_set(), Vec::new());
        let answers: Vec<(usize, ImageType)> = session
            .trials()
            .iter()
            .map(|t| (t.index, t.image_type()))
            .collect();
        for (index, image_type) in answers {
            session
                .record_response(index, Some(correct_answer(image_type)), Some(70))
                .unwrap();
        }
        session.go_to(9).unwrap();

        let results = session.score().unwrap();
        assert_eq!(results.correct, 10);
        assert_eq!(results.accuracy, 100.0);
        assert!(results.rows.iter().all(|r| r.is_correct && r.confidence == 70));
    }

    #[test]
    fn test_completed_session_is_frozen() {
        let mut session = SurveySession::new(trial_set(), Vec::new());
        session.go_to(9).unwrap();
        let results = session.score().unwrap();
        session
            .complete("2025-03-01 10:00:00".to_string(), results)
            .unwrap();

        assert!(session.is_completed());
        assert_eq!(
            session.completion().unwrap().timestamp,
            "2025-03-01 10:00:00"
        );
        assert_eq!(
            session.record_response(0, Some(Selection::Real), None),
            Err(SessionError::AlreadyCompleted)
        );
        assert_eq!(session.go_to(0), Err(SessionError::AlreadyCompleted));
        assert_eq!(session.score().unwrap_err(), SessionError::AlreadyCompleted);
    }

    #[test]
    fn test_activity_moves_last_active() {
        let mut session = SurveySession::new(trial_set(), Vec::new());
        let started = session.last_active();
        assert_eq!(started, session.created_at());

        session.record_response(0, Some(Selection::Real), None).unwrap();
        assert!(session.last_active() >= started);
    }

    #[tokio::test]
    async fn test_prune_drops_only_idle_sessions() {
        let store = SessionStore::new();
        let id = store.insert(SurveySession::new(trial_set(), Vec::new())).await;
        let idle = Duration::minutes(30);

        assert_eq!(store.prune_idle(idle, Utc::now()).await, 0);
        assert_eq!(store.len().await, 1);

        let later = Utc::now() + Duration::minutes(31);
        assert_eq!(store.prune_idle(idle, later).await, 1);
        assert!(store.is_empty().await);
        assert_eq!(store.get(id).await.unwrap_err(), SessionError::NotFound(id));
    }

    #[tokio::test]
    async fn test_prune_keeps_recently_completed_and_busy_sessions() {
        let store = SessionStore::new();
        let mut done = SurveySession::new(trial_set(), Vec::new());
        done.go_to(9).unwrap();
        let results = done.score().unwrap();
        done.complete("2025-03-01 10:00:00".to_string(), results).unwrap();
        let done_id = store.insert(done).await;
        let busy_id = store.insert(SurveySession::new(trial_set(), Vec::new())).await;

        let busy = store.get(busy_id).await.unwrap();
        let _guard = busy.lock().await;

        assert_eq!(store.prune_idle(Duration::minutes(30), Utc::now()).await, 0);
        assert!(store.get(done_id).await.is_ok());

        let later = Utc::now() + Duration::hours(1);
        assert_eq!(store.prune_idle(Duration::minutes(30), later).await, 1);
        assert!(store.get(done_id).await.is_err());
        assert!(store.get(busy_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_session_store_lifecycle() {
        let store = SessionStore::new();
        let id = store.insert(SurveySession::new(trial_set(), Vec::new())).await;

        assert_eq!(store.len().await, 1);
        let session = store.get(id).await.unwrap();
        assert_eq!(session.lock().await.id(), id);

        assert!(store.remove(id).await);
        assert!(!store.remove(id).await);
        assert!(store.is_empty().await);
        assert_eq!(store.get(id).await.unwrap_err(), SessionError::NotFound(id));
    }
}
