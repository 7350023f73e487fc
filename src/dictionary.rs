use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_DICTIONARY_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("`{0}` is not a word that can be looked up")]
    InvalidWord(String),
    #[error("no definitions found for `{0}`")]
    NotFound(String),
    #[error("dictionary request failed: {0}")]
    Network(String),
    #[error("unexpected dictionary response: {0}")]
    Malformed(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Entry {
    pub word: String,
    #[serde(default)]
    pub phonetic: Option<String>,
    #[serde(default)]
    pub phonetics: Vec<Phonetic>,
    #[serde(default)]
    pub meanings: Vec<Meaning>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Phonetic {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub audio: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    pub part_of_speech: String,
    #[serde(default)]
    pub definitions: Vec<Definition>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Definition {
    pub definition: String,
    #[serde(default)]
    pub example: Option<String>,
}

impl Entry {
    /// First non-empty phonetic spelling, if any.
    pub fn phonetic_text(&self) -> Option<&str> {
        self.phonetic
            .as_deref()
            .filter(|p| !p.is_empty())
            .or_else(|| {
                self.phonetics
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .find(|t| !t.is_empty())
            })
    }
}

pub trait Dictionary {
    fn lookup(&self, word: &str) -> Result<Vec<Entry>, LookupError>;
}

/// Single word made of letters, digits, hyphens and apostrophes. The result is
/// used verbatim as a URL path segment.
fn normalize_word(word: &str) -> Result<String, LookupError> {
    let trimmed = word.trim();
    let allowed = |c: char| c.is_alphanumeric() || c == '-' || c == '\'';
    if !trimmed.chars().any(char::is_alphanumeric) || !trimmed.chars().all(allowed) {
        return Err(LookupError::InvalidWord(word.to_string()));
    }
    Ok(trimmed.to_lowercase())
}

/// Parses a dictionaryapi.dev response body.
pub fn parse_entries(word: &str, body: &str) -> Result<Vec<Entry>, LookupError> {
    let entries: Vec<Entry> =
        serde_json::from_str(body).map_err(|e| LookupError::Malformed(e.to_string()))?;
    if entries.is_empty() {
        return Err(LookupError::NotFound(word.to_string()));
    }
    Ok(entries)
}

/// HTTP dictionary client. Without the `network` feature every lookup fails
/// with `LookupError::Network`.
pub struct RemoteDictionary {
    base_url: String,
}

impl RemoteDictionary {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, word: &str) -> String {
        format!("{}/{}", self.base_url, word)
    }
}

impl Default for RemoteDictionary {
    fn default() -> Self {
        Self::new(DEFAULT_DICTIONARY_URL)
    }
}

impl Dictionary for RemoteDictionary {
    #[cfg(feature = "network")]
    fn lookup(&self, word: &str) -> Result<Vec<Entry>, LookupError> {
        let word = normalize_word(word)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| LookupError::Network(e.to_string()))?;
        let response = client
            .get(self.url_for(&word))
            .send()
            .map_err(|e| LookupError::Network(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(word));
        }
        if !response.status().is_success() {
            return Err(LookupError::Network(format!("HTTP {}", response.status())));
        }
        let body = response
            .text()
            .map_err(|e| LookupError::Network(e.to_string()))?;
        parse_entries(&word, &body)
    }

    #[cfg(not(feature = "network"))]
    fn lookup(&self, word: &str) -> Result<Vec<Entry>, LookupError> {
        normalize_word(word)?;
        Err(LookupError::Network(
            "built without network support".to_string(),
        ))
    }
}
