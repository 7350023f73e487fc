use std::collections::BTreeMap;

use crate::error::{EngineError, Result};
use crate::session::question::QuizQuestion;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizState {
    InProgress(usize),
    Completed(usize),
}

/// Outcome of one accepted answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_answer: String,
    pub state: QuizState,
}

/// One run through a fixed, ordered list of questions.
///
/// `score <= current_index` always holds; `reset` replays the same questions
/// in the same order.
#[derive(Clone, Debug)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    current_index: usize,
    score: usize,
    answers: BTreeMap<usize, String>,
}

impl QuizSession {
    pub fn new(questions: Vec<QuizQuestion>) -> Result<Self> {
        if questions.is_empty() {
            return Err(EngineError::InvalidArgument(
                "a quiz needs at least one question".to_string(),
            ));
        }
        Ok(Self {
            questions,
            current_index: 0,
            score: 0,
            answers: BTreeMap::new(),
        })
    }

    pub fn state(&self) -> QuizState {
        if self.is_complete() {
            QuizState::Completed(self.score)
        } else {
            QuizState::InProgress(self.current_index)
        }
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.questions.len()
    }

    pub fn current_question(&self) -> Result<&QuizQuestion> {
        self.questions
            .get(self.current_index)
            .ok_or_else(|| EngineError::InvalidState("quiz is already completed".to_string()))
    }

    /// Scores `choice` against the current question and advances. Answering a
    /// finished quiz or picking a choice that is not one of the current
    /// options fails with `InvalidState`; rejected calls leave score and
    /// answers untouched.
    pub fn submit_answer(&mut self, choice: &str) -> Result<AnswerFeedback> {
        let question = self.current_question()?;
        if !question.has_option(choice) {
            return Err(EngineError::InvalidState(format!(
                "`{choice}` is not an option for question {}",
                self.current_index + 1
            )));
        }

        let correct = question.is_correct(choice);
        let correct_answer = question.correct_answer().to_string();

        self.answers.insert(self.current_index, choice.to_string());
        if correct {
            self.score += 1;
        }
        self.current_index += 1;

        Ok(AnswerFeedback {
            correct,
            correct_answer,
            state: self.state(),
        })
    }

    pub fn reset(&mut self) {
        self.current_index = 0;
        self.score = 0;
        self.answers.clear();
    }

    pub fn progress_fraction(&self) -> f64 {
        self.current_index as f64 / self.questions.len() as f64
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn answer_for(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    pub fn answers(&self) -> &BTreeMap<usize, String> {
        &self.answers
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
