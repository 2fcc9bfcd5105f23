pub const TASK_COMPLETE_POINTS: u32 = 50;
pub const WRONG_LETTER_PENALTY: u32 = 10;
pub const FLOOR_MISS_PENALTY: u32 = 25;
pub const PLAYER_HIT_DAMAGE: i32 = 10;
pub const DEFAULT_HEALTH: i32 = 5;

/// Score, health and streak bookkeeping for one scene.
///
/// Owned by the scene and passed by reference to the rules that mutate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub score: u32,
    pub health: i32,
    pub max_health: i32,
    pub streak: u32,
    pub best_streak: u32,
    pub words_completed: u32,
    /// Text shown above the playfield: the current task, "Good Job", "Game Over!"
    pub task_text: String,
}

impl GameState {
    pub fn new(max_health: i32) -> Self {
        Self {
            score: 0,
            health: max_health,
            max_health,
            streak: 0,
            best_streak: 0,
            words_completed: 0,
            task_text: String::new(),
        }
    }

    pub fn award(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    /// Subtract points, never going below zero
    pub fn penalize(&mut self, points: u32) {
        self.score = self.score.saturating_sub(points);
    }

    /// Apply damage and report whether the ship is out of health
    pub fn damage(&mut self, amount: i32) -> bool {
        self.health = (self.health - amount).max(0);
        self.health == 0
    }

    pub fn restore_health(&mut self) {
        self.health = self.max_health;
    }

    pub fn bump_streak(&mut self) {
        self.streak += 1;
        self.best_streak = self.best_streak.max(self.streak);
    }

    pub fn break_streak(&mut self) {
        self.streak = 0;
    }

    /// Back to a fresh game: score, streak and counters cleared, full health
    pub fn reset(&mut self) {
        *self = Self::new(self.max_health);
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(DEFAULT_HEALTH)
    }
}
