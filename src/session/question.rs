use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// One multiple-choice question. `options` holds `correct_answer` exactly once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionDef")]
pub struct QuizQuestion {
    prompt: String,
    options: Vec<String>,
    correct_answer: String,
}

#[derive(Deserialize)]
struct QuestionDef {
    prompt: String,
    options: Vec<String>,
    correct_answer: String,
}

impl TryFrom<QuestionDef> for QuizQuestion {
    type Error = EngineError;

    fn try_from(def: QuestionDef) -> Result<Self, Self::Error> {
        QuizQuestion::new(def.prompt, def.options, def.correct_answer)
    }
}

impl QuizQuestion {
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, EngineError> {
        let prompt = prompt.into();
        let correct_answer = correct_answer.into();
        let occurrences = options.iter().filter(|o| **o == correct_answer).count();
        if occurrences != 1 {
            return Err(EngineError::InvalidArgument(format!(
                "question `{prompt}`: correct answer `{correct_answer}` appears {occurrences} times in options"
            )));
        }
        Ok(Self {
            prompt,
            options,
            correct_answer,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// Exact, case- and whitespace-sensitive comparison.
    pub fn is_correct(&self, choice: &str) -> bool {
        self.correct_answer == choice
    }

    pub fn has_option(&self, choice: &str) -> bool {
        self.options.iter().any(|o| o == choice)
    }

    pub(crate) fn options_mut(&mut self) -> &mut Vec<String> {
        &mut self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_valid_question() {
        let q = QuizQuestion::new("The cat is ___ the box.", opts(&["in", "at", "on"]), "in").unwrap();
        assert!(q.is_correct("in"));
        assert!(!q.is_correct("In"));
        assert!(!q.is_correct(" in"));
        assert!(q.has_option("at"));
        assert!(!q.has_option("under"));
    }

    #[test]
    fn test_correct_answer_must_be_an_option() {
        let err = QuizQuestion::new("?", opts(&["a", "b"]), "c").unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
    }

    #[test]
    fn test_correct_answer_must_appear_once() {
        assert!(QuizQuestion::new("?", opts(&["a", "a", "b"]), "a").is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: QuizQuestion = toml::from_str(
            r#"
prompt = "I ___ a student."
options = ["am", "is", "are"]
correct_answer = "am"
"#,
        )
        .unwrap();
        assert_eq!(ok.correct_answer(), "am");

        let bad = toml::from_str::<QuizQuestion>(
            r#"
prompt = "I ___ a student."
options = ["is", "are"]
correct_answer = "am"
"#,
        );
        assert!(bad.is_err());
    }
}
