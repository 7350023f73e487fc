use std::fs;

use rand::Rng;
use rand::seq::SliceRandom;
use rust_embed::Embed;
use serde::Deserialize;
use tracing::warn;

use crate::error::{EngineError, Result};
use crate::session::question::QuizQuestion;
use crate::session::quiz::QuizSession;

#[derive(Embed)]
#[folder = "assets/quizzes/"]
struct QuizAssets;

/// A named list of questions for one lesson category.
#[derive(Clone, Debug, Deserialize)]
pub struct QuestionBank {
    pub name: String,
    pub category: String,
    /// Permute question order and options once, before the session is built.
    #[serde(default)]
    pub shuffle: bool,
    pub questions: Vec<QuizQuestion>,
}

impl QuestionBank {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| EngineError::InvalidArgument(format!("invalid question bank: {e}")))
    }

    /// User override in `<config_dir>/lingo/quizzes/<name>.toml`, then the bundled bank.
    pub fn load(name: &str) -> Result<Self> {
        if let Some(config_dir) = dirs::config_dir() {
            let user_path = config_dir
                .join("lingo")
                .join("quizzes")
                .join(format!("{name}.toml"));
            if let Ok(content) = fs::read_to_string(&user_path) {
                match Self::from_toml(&content) {
                    Ok(bank) => return Ok(bank),
                    Err(e) => warn!(path = %user_path.display(), error = %e, "ignoring user question bank"),
                }
            }
        }
        Self::bundled(name)
    }

    pub fn bundled(name: &str) -> Result<Self> {
        let file = QuizAssets::get(&format!("{name}.toml"))
            .ok_or_else(|| EngineError::InvalidArgument(format!("unknown question bank `{name}`")))?;
        let content = std::str::from_utf8(file.data.as_ref())
            .map_err(|e| EngineError::InvalidArgument(format!("bank `{name}` is not UTF-8: {e}")))?;
        Self::from_toml(content)
    }

    pub fn bundled_names() -> Vec<String> {
        let mut names: Vec<String> = QuizAssets::iter()
            .filter_map(|file| file.strip_suffix(".toml").map(str::to_string))
            .collect();
        names.sort();
        names
    }

    /// Final question list; shuffled here once when the bank asks for it.
    pub fn questions<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<QuizQuestion> {
        let mut questions = self.questions.clone();
        if self.shuffle {
            questions.shuffle(rng);
            for question in &mut questions {
                question.options_mut().shuffle(rng);
            }
        }
        questions
    }

    pub fn session<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<QuizSession> {
        QuizSession::new(self.questions(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    const TILES: &str = r#"
name = "Word Tiles"
category = "WordTiles"
shuffle = true

[[questions]]
prompt = "She ___ to school every day."
options = ["go", "goes", "going", "gone"]
correct_answer = "goes"

[[questions]]
prompt = "They ___ football on Sundays."
options = ["play", "plays", "playing", "played"]
correct_answer = "play"

[[questions]]
prompt = "He ___ coffee."
options = ["drink", "drinks", "drinking", "drunk"]
correct_answer = "drinks"
"#;

    #[test]
    fn test_all_bundled_banks_parse() {
        let names = QuestionBank::bundled_names();
        assert!(!names.is_empty());
        for name in names {
            let bank = QuestionBank::bundled(&name).unwrap();
            assert!(!bank.questions.is_empty(), "bank {name} has no questions");
            assert!(!bank.category.is_empty());
        }
    }

    #[test]
    fn test_unknown_bank() {
        assert!(matches!(
            QuestionBank::bundled("klingon"),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_invalid_question_fails_bank() {
        let bad = r#"
name = "Broken"
category = "Broken"
[[questions]]
prompt = "?"
options = ["a", "b"]
correct_answer = "c"
"#;
        assert!(QuestionBank::from_toml(bad).is_err());
    }

    #[test]
    fn test_unshuffled_bank_keeps_order() {
        let mut bank = QuestionBank::from_toml(TILES).unwrap();
        bank.shuffle = false;
        let mut rng = SmallRng::seed_from_u64(7);
        let questions = bank.questions(&mut rng);
        assert_eq!(questions, bank.questions);
    }

    #[test]
    fn test_shuffle_is_a_permutation_and_seed_deterministic() {
        let bank = QuestionBank::from_toml(TILES).unwrap();
        let a = bank.questions(&mut SmallRng::seed_from_u64(42));
        let b = bank.questions(&mut SmallRng::seed_from_u64(42));
        assert_eq!(a, b);

        let mut prompts: Vec<&str> = a.iter().map(|q| q.prompt()).collect();
        prompts.sort();
        let mut original: Vec<&str> = bank.questions.iter().map(|q| q.prompt()).collect();
        original.sort();
        assert_eq!(prompts, original);

        for q in &a {
            assert!(q.has_option(q.correct_answer()));
            assert_eq!(q.options().len(), 4);
        }
    }

    #[test]
    fn test_session_from_bank_does_not_reshuffle_on_reset() {
        let bank = QuestionBank::from_toml(TILES).unwrap();
        let mut session = bank.session(&mut SmallRng::seed_from_u64(3)).unwrap();
        let before: Vec<QuizQuestion> = session.questions().to_vec();
        let first = session.current_question().unwrap().correct_answer().to_string();
        session.submit_answer(&first).unwrap();
        session.reset();
        assert_eq!(session.questions(), before.as_slice());
    }
}
