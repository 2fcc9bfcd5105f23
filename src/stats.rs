use chrono::{DateTime, Local};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::Result;
use crate::leaderboard::{Leaderboard, PERSONAL_BEST_KEY};
use crate::word_source::{GameSession, GameStats, WordSource};
use crate::word_task::Word;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS words (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        vocabulary TEXT NOT NULL,
        text TEXT NOT NULL,
        used BOOLEAN NOT NULL DEFAULT 0,
        UNIQUE (vocabulary, text)
    );

    CREATE INDEX IF NOT EXISTS idx_words_vocabulary_used ON words(vocabulary, used);

    CREATE TABLE IF NOT EXISTS game_sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        started_at TEXT NOT NULL,
        duration_secs REAL NOT NULL,
        score INTEGER NOT NULL,
        words_completed INTEGER NOT NULL,
        best_streak INTEGER NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_game_sessions_started_at ON game_sessions(started_at);

    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS achievements (
        id TEXT PRIMARY KEY,
        reported_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS leaderboard_scores (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        board_id TEXT NOT NULL,
        score INTEGER NOT NULL,
        submitted_at TEXT NOT NULL
    );
"#;

/// Pool used when no vocabulary has been selected
pub const DEFAULT_POOL: &str = "default";

/// SQLite-backed word pool, game history and local leaderboard.
///
/// Words are stored per vocabulary; seeding and drawing only touch the pool
/// selected with [`StatsDb::with_vocabulary`].
#[derive(Debug)]
pub struct StatsDb {
    conn: Connection,
    vocabulary: String,
}

impl StatsDb {
    /// Open the database at the default state location, creating tables if needed
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("wordinvader_stats.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path.as_ref())?;
        debug!("opened stats database at {}", path.as_ref().display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        drop_unscoped_words(&conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(StatsDb {
            conn,
            vocabulary: DEFAULT_POOL.to_string(),
        })
    }

    /// Select the word pool that seeding, drawing and usage resets operate on
    pub fn with_vocabulary<S: Into<String>>(mut self, vocabulary: S) -> Self {
        self.vocabulary = vocabulary.into();
        self
    }

    /// Add words to the pool; words already present keep their usage flag.
    /// Returns how many were new.
    pub fn seed_words<S: AsRef<str>>(&mut self, words: &[S]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO words (vocabulary, text, used) VALUES (?1, ?2, 0)",
            )?;
            for word in words {
                inserted += stmt.execute(params![self.vocabulary, word.as_ref().to_uppercase()])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    pub fn word_count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM words WHERE vocabulary = ?1",
            [&self.vocabulary],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn unused_word_count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM words WHERE vocabulary = ?1 AND used = 0",
            [&self.vocabulary],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Finished games, newest first
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<GameSession>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT started_at, duration_secs, score, words_completed, best_streak
            FROM game_sessions
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )?;

        let session_iter = stmt.query_map([limit as i64], |row| {
            let started_str: String = row.get(0)?;
            let started_at = DateTime::parse_from_rfc3339(&started_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        0,
                        "started_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(GameSession {
                started_at,
                duration_secs: row.get(1)?,
                score: row.get(2)?,
                words_completed: row.get(3)?,
                best_streak: row.get(4)?,
            })
        })?;

        let mut sessions = Vec::new();
        for session in session_iter {
            sessions.push(session?);
        }

        Ok(sessions)
    }

    pub fn all_sessions(&self) -> Result<Vec<GameSession>> {
        let mut sessions = self.recent_sessions(i64::MAX as usize)?;
        sessions.reverse();
        Ok(sessions)
    }

    pub fn achievements(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM achievements ORDER BY reported_at, id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    pub fn top_scores(&self, board_id: &str, limit: usize) -> Result<Vec<u32>> {
        let mut stmt = self.conn.prepare(
            "SELECT score FROM leaderboard_scores WHERE board_id = ?1 ORDER BY score DESC LIMIT ?2",
        )?;
        let scores = stmt
            .query_map(params![board_id, limit as i64], |row| row.get(0))?
            .collect::<std::result::Result<Vec<u32>, _>>()?;
        Ok(scores)
    }

    fn get_setting(&self, key: &str) -> Result<Option<i64>> {
        let value = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Forget games, achievements, scores and word usage (the word pools stay)
    pub fn clear_all_stats(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            DELETE FROM game_sessions;
            DELETE FROM achievements;
            DELETE FROM leaderboard_scores;
            DELETE FROM settings;
            UPDATE words SET used = 0;
            "#,
        )?;
        Ok(())
    }

}

// Databases from before per-vocabulary pools keep every word in one list; the
// pool is rebuilt from the embedded vocabularies on the next seed.
fn drop_unscoped_words(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('words')")?;
    let columns = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    drop(stmt);

    if !columns.is_empty() && !columns.iter().any(|c| c == "vocabulary") {
        debug!("dropping word pool without vocabulary column");
        conn.execute_batch("DROP TABLE words;")?;
    }
    Ok(())
}

impl WordSource for StatsDb {
    fn get_random_word(&mut self) -> Result<Option<Word>> {
        let picked: Option<(i64, String)> = self
            .conn
            .query_row(
                r#"
                SELECT id, text FROM words
                WHERE vocabulary = ?1 AND used = 0
                ORDER BY RANDOM()
                LIMIT 1
                "#,
                [&self.vocabulary],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match picked {
            Some((id, text)) => {
                self.conn
                    .execute("UPDATE words SET used = 1 WHERE id = ?1", [id])?;
                Ok(Some(Word { text, used: true }))
            }
            None => Ok(None),
        }
    }

    fn reset_word_usage(&mut self) -> Result<()> {
        let reset = self.conn.execute(
            "UPDATE words SET used = 0 WHERE vocabulary = ?1",
            [&self.vocabulary],
        )?;
        debug!("reset usage of {reset} {} words", self.vocabulary);
        Ok(())
    }

    fn save_game_session(&mut self, session: &GameSession) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO game_sessions
            (started_at, duration_secs, score, words_completed, best_streak)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                session.started_at.to_rfc3339(),
                session.duration_secs,
                session.score,
                session.words_completed,
                session.best_streak,
            ],
        )?;
        Ok(())
    }

    fn get_game_stats(&self) -> Result<GameStats> {
        let stats = self.conn.query_row(
            r#"
            SELECT
                COUNT(*),
                COALESCE(MAX(score), 0),
                COALESCE(AVG(score), 0.0)
            FROM game_sessions
            "#,
            [],
            |row| {
                Ok(GameStats {
                    total_games: row.get(0)?,
                    best_score: row.get(1)?,
                    average_score: row.get(2)?,
                })
            },
        )?;
        Ok(stats)
    }
}

impl Leaderboard for StatsDb {
    fn submit_score(&mut self, value: u32, board_id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO leaderboard_scores (board_id, score, submitted_at) VALUES (?1, ?2, ?3)",
            params![board_id, value, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn report_achievement(&mut self, id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO achievements (id, reported_at) VALUES (?1, ?2)",
            params![id, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn personal_best(&self) -> Result<u32> {
        Ok(self
            .get_setting(PERSONAL_BEST_KEY)?
            .map(|v| v.max(0) as u32)
            .unwrap_or(0))
    }

    fn set_personal_best(&mut self, value: u32) -> Result<()> {
        self.set_setting(PERSONAL_BEST_KEY, value as i64)
    }
}

/// Write sessions as CSV with a header row; returns the number of rows written.
pub fn export_sessions_csv<W: Write>(sessions: &[GameSession], writer: W) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    for session in sessions {
        wtr.serialize(session)?;
    }
    wtr.flush()?;
    Ok(sessions.len())
}
