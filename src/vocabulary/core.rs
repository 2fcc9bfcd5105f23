use include_dir::{include_dir, Dir};
use serde::Deserialize;
use serde_json::from_str;

use crate::error::{GameError, Result};

static VOCAB_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/vocab");

/// A word list bundled with the binary
#[derive(Deserialize, Clone, Debug)]
pub struct Vocabulary {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl Vocabulary {
    pub fn load(name: &str) -> Result<Self> {
        read_vocabulary_from_file(&format!("{name}.json"))
            .map_err(|_| GameError::VocabularyNotFound(name.to_string()))
    }

    /// Uppercased, letters-only words; entries with anything outside A-Z are skipped.
    pub fn playable_words(&self) -> Vec<String> {
        self.words
            .iter()
            .map(|w| w.trim().to_uppercase())
            .filter(|w| !w.is_empty() && w.chars().all(|c| c.is_ascii_uppercase()))
            .collect()
    }
}

fn read_vocabulary_from_file(file_name: &str) -> Result<Vocabulary> {
    let file = VOCAB_DIR
        .get_file(file_name)
        .ok_or_else(|| GameError::VocabularyNotFound(file_name.to_string()))?;

    let contents = file
        .contents_utf8()
        .ok_or_else(|| GameError::VocabularyNotFound(file_name.to_string()))?;

    let vocab: Vocabulary = from_str(contents)?;
    if vocab.playable_words().is_empty() {
        return Err(GameError::EmptyVocabulary(vocab.name));
    }

    Ok(vocab)
}
