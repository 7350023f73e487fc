use tracing::info;

use crate::engine::progress_store::ProgressStore;
use crate::engine::record::{ItemId, ItemStatus, ProgressRecord, validate_category, validate_item_id};
use crate::error::{EngineError, Result};
use crate::navigation::{Navigator, QUIZ_ROUTE, RESULT_ROUTE, RouteParams};
use crate::session::quiz::{AnswerFeedback, QuizSession};
use crate::session::result::QuizResult;
use crate::speech::{PlaybackGate, Speaker};
use crate::store::kv::KeyValueStore;

/// What a lesson screen binds to: one quiz session for one item of a category,
/// reported to the progress store when it ends.
pub struct LessonFlow<'a, S: KeyValueStore, N: Navigator> {
    store: &'a ProgressStore<S>,
    navigator: N,
    playback: PlaybackGate,
    category: String,
    item_id: ItemId,
    session: QuizSession,
    pass_percentage: u32,
    last_result: Option<QuizResult>,
    /// Outcome whose save failed and can be retried.
    unsaved: Option<ItemStatus>,
}

impl<'a, S: KeyValueStore, N: Navigator> LessonFlow<'a, S, N> {
    pub fn new(
        store: &'a ProgressStore<S>,
        navigator: N,
        category: &str,
        item_id: ItemId,
        session: QuizSession,
    ) -> Result<Self> {
        validate_category(category)?;
        validate_item_id(item_id)?;
        Ok(Self {
            store,
            navigator,
            playback: PlaybackGate::new(),
            category: category.to_string(),
            item_id,
            session,
            pass_percentage: 100,
            last_result: None,
            unsaved: None,
        })
    }

    pub fn with_pass_percentage(mut self, pass_percentage: u32) -> Self {
        self.pass_percentage = pass_percentage.min(100);
        self
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn playback(&self) -> &PlaybackGate {
        &self.playback
    }

    pub fn last_result(&self) -> Option<&QuizResult> {
        self.last_result.as_ref()
    }

    pub fn has_unsaved_result(&self) -> bool {
        self.unsaved.is_some()
    }

    fn route_params(&self) -> RouteParams {
        RouteParams::from([
            ("category".to_string(), self.category.clone()),
            ("item".to_string(), self.item_id.to_string()),
        ])
    }

    /// Submits an answer. When it finishes the quiz, the outcome is saved and
    /// the result screen opened; a failed save is returned as the error and can
    /// be retried with `retry_save`.
    pub fn answer(&mut self, choice: &str) -> Result<AnswerFeedback> {
        let feedback = self.session.submit_answer(choice)?;
        if self.session.is_complete() {
            let result = QuizResult::from_session(&self.session)?;
            let status = result.status(self.pass_percentage);
            let mut params = self.route_params();
            params.insert("score".to_string(), result.score.to_string());
            params.insert("total".to_string(), result.total.to_string());
            self.last_result = Some(result);
            self.unsaved = Some(status);
            self.save()?;
            self.navigator.go_to(RESULT_ROUTE, params);
        }
        Ok(feedback)
    }

    fn save(&mut self) -> Result<ProgressRecord> {
        let Some(status) = self.unsaved else {
            return Err(EngineError::InvalidState("no result waiting to be saved".to_string()));
        };
        let record = self.store.record_status(&self.category, self.item_id, status)?;
        self.unsaved = None;
        info!(category = %self.category, item = self.item_id, %status, "lesson outcome saved");
        Ok(record)
    }

    /// Retries a save that failed at the end of the quiz.
    pub fn retry_save(&mut self) -> Result<ProgressRecord> {
        let record = self.save()?;
        let mut params = self.route_params();
        if let Some(result) = &self.last_result {
            params.insert("score".to_string(), result.score.to_string());
            params.insert("total".to_string(), result.total.to_string());
        }
        self.navigator.go_to(RESULT_ROUTE, params);
        Ok(record)
    }

    /// Marks the item skipped and leaves the lesson.
    pub fn skip(&mut self) -> Result<ProgressRecord> {
        self.ensure_idle()?;
        let record = self
            .store
            .record_status(&self.category, self.item_id, ItemStatus::Skipped)?;
        self.navigator.go_back();
        Ok(record)
    }

    /// "Try Again": same questions, same order.
    pub fn try_again(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.session.reset();
        self.last_result = None;
        self.navigator.go_to(QUIZ_ROUTE, self.route_params());
        Ok(())
    }

    pub fn go_back(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.navigator.go_back();
        Ok(())
    }

    pub fn speak_prompt<P: Speaker + ?Sized>(&self, speaker: &P) -> Result<()> {
        let question = self.session.current_question()?;
        self.playback.speak(speaker, question.prompt());
        Ok(())
    }

    pub fn speak<P: Speaker + ?Sized>(&self, speaker: &P, text: &str) {
        self.playback.speak(speaker, text);
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.playback.is_playing() {
            return Err(EngineError::InvalidState(
                "audio playback in progress".to_string(),
            ));
        }
        if self.unsaved.is_some() {
            return Err(EngineError::InvalidState(
                "lesson result has not been saved".to_string(),
            ));
        }
        Ok(())
    }
}
