pub mod core;

pub use core::Vocabulary;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Word lists shipped with the game
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum SupportedVocabulary {
    English,
    Space,
}

impl SupportedVocabulary {
    /// Lowercase name, used for the embedded file and the stored word pool
    pub fn name(&self) -> String {
        self.to_string().to_lowercase()
    }

    pub fn as_vocabulary(&self) -> crate::error::Result<Vocabulary> {
        Vocabulary::load(&self.name())
    }
}

impl Default for SupportedVocabulary {
    fn default() -> Self {
        Self::English
    }
}
