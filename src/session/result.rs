use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::record::ItemStatus;
use crate::engine::summary::completion_percentage;
use crate::error::{EngineError, Result};
use crate::session::quiz::QuizSession;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuizResult {
    pub score: usize,
    pub total: usize,
    pub accuracy: f64,
    /// Chosen option per question, in question order.
    pub answers: Vec<String>,
    /// Indices of questions answered wrong.
    #[serde(default)]
    pub missed: Vec<usize>,
    pub timestamp: DateTime<Utc>,
}

impl QuizResult {
    pub fn from_session(session: &QuizSession) -> Result<Self> {
        if !session.is_complete() {
            return Err(EngineError::InvalidState(format!(
                "quiz still in progress at question {}",
                session.current_index() + 1
            )));
        }

        let mut answers = Vec::with_capacity(session.len());
        let mut missed = Vec::new();
        for (i, question) in session.questions().iter().enumerate() {
            let chosen = session.answer_for(i).unwrap_or_default();
            if !question.is_correct(chosen) {
                missed.push(i);
            }
            answers.push(chosen.to_string());
        }

        let total = session.len();
        let score = session.score();
        Ok(Self {
            score,
            total,
            accuracy: (score as f64 / total as f64 * 100.0).clamp(0.0, 100.0),
            answers,
            missed,
            timestamp: Utc::now(),
        })
    }

    pub fn is_perfect(&self) -> bool {
        self.score == self.total
    }

    /// Status to record for the lesson item this quiz belongs to.
    pub fn status(&self, pass_percentage: u32) -> ItemStatus {
        let pct = completion_percentage(self.score as u32, self.total as u32);
        if pct >= pass_percentage {
            ItemStatus::Completed
        } else {
            ItemStatus::Wrong
        }
    }
}
