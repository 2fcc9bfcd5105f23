use log::info;

use crate::error::Result;

pub const LEADERBOARD_ID: &str = "fill_in_the_blank_leaderboard";
pub const ACHIEVEMENT_SCORE_100: &str = "100_score_fill_in_the_blank";
pub const ACHIEVEMENT_SCORE_1000: &str = "1000_score_fill_in_the_blank";
pub const ACHIEVEMENT_PERSONAL_RECORD: &str = "new_personal_record_fill_in_the_blank";

/// Key under which the personal best is persisted
pub const PERSONAL_BEST_KEY: &str = "personalHighScore_FITB";

/// Score thresholds that unlock an achievement
pub const SCORE_ACHIEVEMENTS: &[(u32, &str)] = &[
    (100, ACHIEVEMENT_SCORE_100),
    (1000, ACHIEVEMENT_SCORE_1000),
];

/// Score board, achievements and the locally stored personal best
pub trait Leaderboard {
    fn submit_score(&mut self, value: u32, board_id: &str) -> Result<()>;
    fn report_achievement(&mut self, id: &str) -> Result<()>;
    fn personal_best(&self) -> Result<u32>;
    fn set_personal_best(&mut self, value: u32) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScoreReport {
    pub achievements: Vec<&'static str>,
    pub new_personal_best: bool,
}

/// Submit the final score, unlock threshold achievements and record a new personal best.
pub fn check_achievements_and_submit_score(
    board: &mut dyn Leaderboard,
    final_score: u32,
) -> Result<ScoreReport> {
    board.submit_score(final_score, LEADERBOARD_ID)?;

    let mut report = ScoreReport::default();
    for &(threshold, id) in SCORE_ACHIEVEMENTS {
        if final_score >= threshold {
            board.report_achievement(id)?;
            report.achievements.push(id);
        }
    }

    if final_score > board.personal_best()? {
        board.report_achievement(ACHIEVEMENT_PERSONAL_RECORD)?;
        report.achievements.push(ACHIEVEMENT_PERSONAL_RECORD);
        board.set_personal_best(final_score)?;
        report.new_personal_best = true;
        info!("new personal high score: {final_score}");
    }

    Ok(report)
}

/// Unlock threshold achievements mid-game; `unlocked` remembers what was already reported.
pub fn check_realtime_achievements(
    board: &mut dyn Leaderboard,
    score: u32,
    unlocked: &mut Vec<&'static str>,
) -> Result<Vec<&'static str>> {
    let mut fresh = Vec::new();
    for &(threshold, id) in SCORE_ACHIEVEMENTS {
        if score >= threshold && !unlocked.contains(&id) {
            board.report_achievement(id)?;
            unlocked.push(id);
            fresh.push(id);
        }
    }
    Ok(fresh)
}

/// Leaderboard that only lives in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryLeaderboard {
    pub submissions: Vec<(String, u32)>,
    pub achievements: Vec<String>,
    pub best: u32,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Leaderboard for MemoryLeaderboard {
    fn submit_score(&mut self, value: u32, board_id: &str) -> Result<()> {
        self.submissions.push((board_id.to_string(), value));
        Ok(())
    }

    fn report_achievement(&mut self, id: &str) -> Result<()> {
        if !self.achievements.iter().any(|a| a == id) {
            self.achievements.push(id.to_string());
        }
        Ok(())
    }

    fn personal_best(&self) -> Result<u32> {
        Ok(self.best)
    }

    fn set_personal_best(&mut self, value: u32) -> Result<()> {
        self.best = value;
        Ok(())
    }
}
