use chrono::{DateTime, Local};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::game_state::GameState;
use crate::util::mean;
use crate::vocabulary::Vocabulary;
use crate::word_task::Word;

/// One played game, from start to game over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub started_at: DateTime<Local>,
    pub duration_secs: f64,
    pub score: u32,
    pub words_completed: u32,
    pub best_streak: u32,
}

impl GameSession {
    pub fn new() -> Self {
        Self::started_at(Local::now())
    }

    pub fn started_at(started_at: DateTime<Local>) -> Self {
        Self {
            started_at,
            duration_secs: 0.0,
            score: 0,
            words_completed: 0,
            best_streak: 0,
        }
    }

    pub fn finish(&mut self, state: &GameState) {
        self.finish_at(state, Local::now());
    }

    pub fn finish_at(&mut self, state: &GameState, ended_at: DateTime<Local>) {
        self.duration_secs = (ended_at - self.started_at).num_milliseconds().max(0) as f64 / 1000.0;
        self.score = state.score;
        self.words_completed = state.words_completed;
        self.best_streak = state.best_streak;
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GameStats {
    pub total_games: u32,
    pub best_score: u32,
    pub average_score: f64,
}

/// Where words come from and where finished games go
pub trait WordSource {
    /// An unused word, marked used on the way out. `None` once every word was handed out.
    fn get_random_word(&mut self) -> Result<Option<Word>>;
    fn reset_word_usage(&mut self) -> Result<()>;
    fn save_game_session(&mut self, session: &GameSession) -> Result<()>;
    fn get_game_stats(&self) -> Result<GameStats>;
}

/// In-memory word source over a bundled vocabulary; nothing survives the process
pub struct VocabularySource {
    words: Vec<Word>,
    sessions: Vec<GameSession>,
    rng: StdRng,
}

impl VocabularySource {
    pub fn new(vocab: &Vocabulary) -> Self {
        Self::from_words(vocab.playable_words())
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Word::new).collect(),
            sessions: Vec::new(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn sessions(&self) -> &[GameSession] {
        &self.sessions
    }

    pub fn unused_count(&self) -> usize {
        self.words.iter().filter(|w| !w.used).count()
    }
}

impl WordSource for VocabularySource {
    fn get_random_word(&mut self) -> Result<Option<Word>> {
        let unused: Vec<usize> = self
            .words
            .iter()
            .enumerate()
            .filter(|(_, w)| !w.used)
            .map(|(i, _)| i)
            .collect();

        Ok(unused.choose(&mut self.rng).map(|&i| {
            self.words[i].used = true;
            self.words[i].clone()
        }))
    }

    fn reset_word_usage(&mut self) -> Result<()> {
        for word in &mut self.words {
            word.used = false;
        }
        Ok(())
    }

    fn save_game_session(&mut self, session: &GameSession) -> Result<()> {
        self.sessions.push(session.clone());
        Ok(())
    }

    fn get_game_stats(&self) -> Result<GameStats> {
        let scores: Vec<f64> = self.sessions.iter().map(|s| s.score as f64).collect();
        Ok(GameStats {
            total_games: self.sessions.len() as u32,
            best_score: self.sessions.iter().map(|s| s.score).max().unwrap_or(0),
            average_score: mean(&scores).unwrap_or(0.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_words_are_handed_out_once() {
        let mut source = VocabularySource::from_words(["CAT", "DOG"]).with_seed(1);

        let first = source.get_random_word().unwrap().unwrap();
        let second = source.get_random_word().unwrap().unwrap();

        assert_ne!(first.text, second.text);
        assert!(first.used && second.used);
        assert_eq!(source.get_random_word().unwrap(), None);
    }

    #[test]
    fn test_reset_word_usage_makes_words_available() {
        let mut source = VocabularySource::from_words(["SUN"]).with_seed(2);

        assert!(source.get_random_word().unwrap().is_some());
        assert!(source.get_random_word().unwrap().is_none());

        source.reset_word_usage().unwrap();
        assert_eq!(source.unused_count(), 1);
        assert_eq!(source.get_random_word().unwrap().unwrap().text, "SUN");
    }

    #[test]
    fn test_stats_from_sessions() {
        let mut source = VocabularySource::from_words(["A"]);
        assert_eq!(source.get_game_stats().unwrap(), GameStats::default());

        for score in [100, 50, 0] {
            let mut session = GameSession::new();
            session.score = score;
            source.save_game_session(&session).unwrap();
        }

        let stats = source.get_game_stats().unwrap();
        assert_eq!(stats.total_games, 3);
        assert_eq!(stats.best_score, 100);
        assert_eq!(stats.average_score, 50.0);
    }

    #[test]
    fn test_session_finish_records_state() {
        let start = Local::now();
        let mut session = GameSession::started_at(start);
        let mut state = GameState::default();
        state.award(150);
        state.words_completed = 3;
        state.bump_streak();

        session.finish_at(&state, start + Duration::milliseconds(12_500));

        assert_eq!(session.duration_secs, 12.5);
        assert_eq!(session.score, 150);
        assert_eq!(session.words_completed, 3);
        assert_eq!(session.best_streak, 1);
    }

    #[test]
    fn test_vocabulary_source_from_bundled_words() {
        let vocab = Vocabulary::load("space").unwrap();
        let mut source = VocabularySource::new(&vocab);
        let word = source.get_random_word().unwrap().unwrap();
        assert!(word.text.chars().all(|c| c.is_ascii_uppercase()));
    }
}
