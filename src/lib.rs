//! Progress tracking and quiz engine for a language-learning app.
//!
//! [`engine`] keeps per-category item statuses on top of a [`store::KeyValueStore`]
//! and summarizes them; [`session`] drives multiple-choice quizzes; [`flow`]
//! ties one quiz to one lesson item the way a lesson screen uses them.

pub mod config;
pub mod dictionary;
pub mod engine;
pub mod error;
pub mod flow;
pub mod navigation;
pub mod session;
pub mod speech;
pub mod store;

pub use error::{EngineError, PersistenceError};
