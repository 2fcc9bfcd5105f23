use log::{debug, error, info, warn};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::config::Config;
use crate::game_state::{
    GameState, FLOOR_MISS_PENALTY, PLAYER_HIT_DAMAGE, TASK_COMPLETE_POINTS, WRONG_LETTER_PENALTY,
};
use crate::leaderboard::{
    check_achievements_and_submit_score, check_realtime_achievements, Leaderboard, ScoreReport,
};
use crate::notify::{Notifier, SceneNotice};
use crate::obstacles::{build_obstacle_set, next_obstacle_duration, slot_x};
use crate::playfield::{BulletId, Contact, ContactKind, Playfield};
use crate::scheduler::{CancelToken, Scheduler, TaskId};
use crate::word_source::{GameSession, GameStats, WordSource};
use crate::word_task::{create_new_task, Word, WordTask};

/// Delay before re-checking whether the field is clear for the next wave
pub const SPAWN_RETRY_SECS: f64 = 0.5;
pub const SOFT_RESET_SECS: f64 = 0.5;
pub const GAME_OVER_RECOVERY_SECS: f64 = 2.0;
pub const COUNTDOWN_STEP_SECS: f64 = 1.0;
pub const COUNTDOWN_GO_HOLD_SECS: f64 = 0.5;

pub const GOOD_JOB_TEXT: &str = "Good Job";
pub const GAME_OVER_TEXT: &str = "Game Over!";

const MOTIVATION_MESSAGES: &[&str] = &[
    "Keep practicing and beat your high score!",
    "You got this, Captain!",
    "Never give up, pilot! Try again!",
    "Your spaceship needs you!",
    "One more try! Show them who's boss!",
];

pub fn random_motivation<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    MOTIVATION_MESSAGES.choose(rng).copied().unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ScenePhase {
    Playing,
    Paused,
    CountingDown,
    Resetting,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum CountdownLabel {
    #[strum(serialize = "3")]
    Three,
    #[strum(serialize = "2")]
    Two,
    #[strum(serialize = "1")]
    One,
    #[strum(serialize = "GO!")]
    Go,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Haptic {
    Light,
    Medium,
    Error,
}

/// Requests for sound, haptics and one-shot visuals, drained by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cue {
    Shoot,
    Explosion { x: f64, y: f64 },
    Wrong { x: f64, y: f64 },
    BrokenHeart { x: f64, y: f64 },
    Haptic(Haptic),
    PlayMusic,
    StopMusic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScheduledAction {
    SpawnCheck,
    FinishSoftReset,
    RecoverAfterGameOver,
    Countdown(CountdownLabel),
    FinishCountdown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneSettings {
    pub width: f64,
    pub height: f64,
    pub starting_health: i32,
    pub initial_obstacle_duration: f64,
    pub restart_obstacle_duration: f64,
    pub min_obstacle_duration: f64,
    pub auto_restart: bool,
}

impl From<&Config> for SceneSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            width: cfg.field_width,
            height: cfg.field_height,
            starting_health: cfg.starting_health.max(1),
            initial_obstacle_duration: cfg.initial_obstacle_duration,
            restart_obstacle_duration: cfg.restart_obstacle_duration,
            min_obstacle_duration: cfg.min_obstacle_duration,
            auto_restart: cfg.auto_restart,
        }
    }
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// The game scene: word tasks, spawn waves, scoring and the pause/reset state machine.
///
/// The host drives it with [`Scene::update`] and player input, and drains [`Cue`]s
/// to render effects.
pub struct Scene {
    settings: SceneSettings,
    state: GameState,
    phase: ScenePhase,
    countdown: Option<CountdownLabel>,
    task: Option<WordTask>,
    session: GameSession,
    field: Playfield,
    obstacle_duration: f64,
    scheduler: Scheduler<ScheduledAction>,
    lifecycle: CancelToken,
    pending_spawn_check: Option<TaskId>,
    words: Box<dyn WordSource>,
    leaderboard: Box<dyn Leaderboard>,
    notifier: Notifier,
    cues: Vec<Cue>,
    personal_best: u32,
    unlocked: Vec<&'static str>,
    last_report: Option<ScoreReport>,
    last_stats: Option<GameStats>,
    motivation: &'static str,
    out_of_words: bool,
    rng: StdRng,
}

impl Scene {
    pub fn new(
        settings: SceneSettings,
        words: Box<dyn WordSource>,
        leaderboard: Box<dyn Leaderboard>,
    ) -> Self {
        let personal_best = leaderboard.personal_best().unwrap_or_else(|e| {
            warn!("could not read personal best: {e}");
            0
        });

        Self {
            field: Playfield::new(settings.width, settings.height),
            state: GameState::new(settings.starting_health),
            obstacle_duration: settings.initial_obstacle_duration,
            settings,
            phase: ScenePhase::Playing,
            countdown: None,
            task: None,
            session: GameSession::new(),
            scheduler: Scheduler::new(),
            lifecycle: CancelToken::new(),
            pending_spawn_check: None,
            words,
            leaderboard,
            notifier: Notifier::new(),
            cues: Vec::new(),
            personal_best,
            unlocked: Vec::new(),
            last_report: None,
            last_stats: None,
            motivation: MOTIVATION_MESSAGES[0],
            out_of_words: false,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Put the first wave on the field
    pub fn start(&mut self) {
        self.cues.push(Cue::PlayMusic);
        self.spawn_obstacle_row();
    }

    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    pub fn countdown(&self) -> Option<CountdownLabel> {
        self.countdown
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn task(&self) -> Option<&WordTask> {
        self.task.as_ref()
    }

    pub fn field(&self) -> &Playfield {
        &self.field
    }

    pub fn obstacle_duration(&self) -> f64 {
        self.obstacle_duration
    }

    pub fn personal_best(&self) -> u32 {
        self.personal_best
    }

    pub fn last_report(&self) -> Option<&ScoreReport> {
        self.last_report.as_ref()
    }

    pub fn last_stats(&self) -> Option<GameStats> {
        self.last_stats
    }

    pub fn motivation(&self) -> &'static str {
        self.motivation
    }

    /// True when the last wave was skipped because no word could be drawn
    pub fn is_out_of_words(&self) -> bool {
        self.out_of_words
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.len()
    }

    pub fn subscribe(&mut self) -> std::sync::mpsc::Receiver<SceneNotice> {
        self.notifier.subscribe()
    }

    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    /// Replace the current task, e.g. with a scripted word
    pub fn assign_task(&mut self, task: WordTask) {
        self.state.task_text = task.display();
        self.task = Some(task);
    }

    /// Advance timers, and while playing, the falling letters and bullets.
    pub fn update(&mut self, dt: f64) {
        let lifecycle = self.lifecycle.clone();
        for (id, action) in self.scheduler.advance(dt) {
            // a restart inside this batch voids whatever else came due with it
            if lifecycle.is_cancelled() {
                break;
            }
            if self.pending_spawn_check == Some(id) {
                self.pending_spawn_check = None;
            }
            self.run_action(action);
        }

        if self.phase == ScenePhase::Playing {
            for contact in self.field.step(dt) {
                self.handle_contact(contact);
            }
        }
    }

    fn run_action(&mut self, action: ScheduledAction) {
        debug!("timer fired: {action:?} in phase {}", self.phase);
        match action {
            ScheduledAction::SpawnCheck => self.try_spawn_if_clear(),
            ScheduledAction::FinishSoftReset => {
                if self.phase == ScenePhase::Resetting {
                    self.phase = ScenePhase::Playing;
                    self.spawn_obstacle_row();
                }
            }
            ScheduledAction::RecoverAfterGameOver => {
                self.cues.push(Cue::StopMusic);
                self.state.restore_health();
                if self.settings.auto_restart && self.phase == ScenePhase::GameOver {
                    self.start_new_game();
                }
            }
            ScheduledAction::Countdown(label) => {
                if self.phase == ScenePhase::CountingDown {
                    self.countdown = Some(label);
                }
            }
            ScheduledAction::FinishCountdown => {
                if self.phase == ScenePhase::CountingDown {
                    self.phase = ScenePhase::Playing;
                    self.countdown = None;
                }
            }
        }
    }

    /// Resolve a contact reported by the playfield
    pub fn handle_contact(&mut self, contact: Contact) {
        if matches!(self.phase, ScenePhase::Resetting | ScenePhase::GameOver) {
            return;
        }

        match contact.kind {
            ContactKind::Floor => self.on_floor_contact(contact),
            ContactKind::Ship => self.on_ship_hit(contact),
            ContactKind::Shot(bullet) => self.on_letter_shot(contact, bullet),
            ContactKind::FallComplete => self.on_fall_complete(),
        }
    }

    fn on_floor_contact(&mut self, contact: Contact) {
        if self.field.remove_obstacle(contact.obstacle).is_none() {
            return;
        }

        if self.task.as_ref().is_some_and(|t| !t.is_complete()) {
            self.state.penalize(FLOOR_MISS_PENALTY);
            self.state.break_streak();
            debug!("letter {} missed, score now {}", contact.letter, self.state.score);
        }

        self.task = None;
        self.try_spawn_if_clear();
    }

    fn on_ship_hit(&mut self, contact: Contact) {
        if self.field.remove_obstacle(contact.obstacle).is_none() {
            return;
        }

        self.cues.push(Cue::Explosion {
            x: contact.x,
            y: contact.y,
        });
        self.cues.push(Cue::Haptic(Haptic::Error));
        self.cues.push(Cue::BrokenHeart {
            x: contact.x,
            y: contact.y,
        });

        if self.state.damage(PLAYER_HIT_DAMAGE) {
            self.reset(true);
        }
    }

    fn on_letter_shot(&mut self, contact: Contact, bullet: BulletId) {
        if self.field.obstacle(contact.obstacle).is_none() {
            return;
        }
        self.field.remove_bullet(bullet);

        let letter = contact.letter;
        let Some(task) = self.task.as_mut().filter(|t| t.awaits(letter)) else {
            self.cues.push(Cue::Wrong {
                x: contact.x,
                y: contact.y,
            });
            self.cues.push(Cue::BrokenHeart {
                x: contact.x,
                y: contact.y,
            });
            self.cues.push(Cue::Haptic(Haptic::Error));
            self.state.penalize(WRONG_LETTER_PENALTY);
            return;
        };

        task.fill(letter);
        let still_awaited = task.awaits(letter);
        let complete = task.is_complete();
        let display = task.display();
        let word = task.text();

        self.state.bump_streak();
        self.cues.push(Cue::Explosion {
            x: contact.x,
            y: contact.y,
        });
        self.cues.push(Cue::Haptic(Haptic::Medium));
        if !still_awaited {
            self.field.remove_obstacle(contact.obstacle);
        }
        self.state.task_text = display;

        if complete {
            self.state.award(TASK_COMPLETE_POINTS);
            self.state.words_completed += 1;
            info!("completed {word}, score {}", self.state.score);

            match check_realtime_achievements(
                self.leaderboard.as_mut(),
                self.state.score,
                &mut self.unlocked,
            ) {
                Ok(fresh) if !fresh.is_empty() => info!("achievements unlocked: {fresh:?}"),
                Ok(_) => {}
                Err(e) => warn!("could not report achievements: {e}"),
            }

            self.notifier.broadcast(SceneNotice::WordCompleted { word });
            self.task = None;
            self.state.task_text = GOOD_JOB_TEXT.to_string();
            self.request_spawn_check(SPAWN_RETRY_SECS);
        }
    }

    fn on_fall_complete(&mut self) {
        let incomplete = self.task.as_ref().is_some_and(|t| !t.is_complete());
        if incomplete && self.phase != ScenePhase::Resetting {
            info!("wave fell through with the word unfinished, resetting");
            self.reset(false);
        }
    }

    /// Spawn the next wave once the field is empty, otherwise look again shortly
    pub fn try_spawn_if_clear(&mut self) {
        if matches!(self.phase, ScenePhase::Resetting | ScenePhase::GameOver) {
            return;
        }

        if self.field.has_obstacles() {
            self.request_spawn_check(SPAWN_RETRY_SECS);
        } else {
            self.spawn_obstacle_row();
        }
    }

    fn request_spawn_check(&mut self, delay: f64) {
        if let Some(id) = self.pending_spawn_check {
            if self.scheduler.is_pending(id) {
                return;
            }
        }
        let id = self
            .scheduler
            .schedule(delay, ScheduledAction::SpawnCheck, &self.lifecycle);
        self.pending_spawn_check = Some(id);
    }

    /// Draw a new task if needed and drop five letters. Returns false when no word was available.
    pub fn spawn_obstacle_row(&mut self) -> bool {
        if self.task.as_ref().map_or(true, |t| t.is_complete()) {
            match self.draw_word() {
                Some(word) => {
                    self.task = Some(create_new_task(word, &mut self.rng));
                }
                None => {
                    warn!("no words found even after reset");
                    self.out_of_words = true;
                    self.notifier.broadcast(SceneNotice::VocabularyExhausted);
                    return false;
                }
            }
        }
        self.out_of_words = false;

        let Some(task) = self.task.as_ref() else {
            return false;
        };
        let letters = build_obstacle_set(task, &mut self.rng);
        let display = task.display();

        self.obstacle_duration = next_obstacle_duration(
            self.obstacle_duration,
            self.state.score,
            self.settings.min_obstacle_duration,
        );

        let count = letters.len();
        for (i, letter) in letters.iter().enumerate() {
            let x = slot_x(self.settings.width, count, i + 1);
            self.field.spawn_obstacle(*letter, x, self.obstacle_duration);
        }

        info!(
            "wave {:?} for {display}, falling over {:.1}s",
            letters, self.obstacle_duration
        );
        self.state.task_text = display;
        true
    }

    fn draw_word(&mut self) -> Option<Word> {
        if let Some(word) = self.fetch_word() {
            return Some(word);
        }

        if let Err(e) = self.words.reset_word_usage() {
            warn!("could not reset word usage: {e}");
        }
        self.fetch_word()
    }

    fn fetch_word(&mut self) -> Option<Word> {
        match self.words.get_random_word() {
            Ok(word) => word,
            Err(e) => {
                warn!("word source failed: {e}");
                None
            }
        }
    }

    /// Clear the field. A soft reset costs the score and starts a new wave shortly;
    /// a game-over reset records the session and waits for a restart.
    pub fn reset(&mut self, game_over: bool) {
        if matches!(self.phase, ScenePhase::Resetting | ScenePhase::GameOver) {
            return;
        }
        self.phase = ScenePhase::Resetting;
        self.countdown = None;
        if let Some(id) = self.pending_spawn_check.take() {
            self.scheduler.cancel(id);
        }

        self.field.clear();
        self.task = None;

        if game_over {
            self.finish_game();
            self.phase = ScenePhase::GameOver;
            self.notifier.broadcast(SceneNotice::GameOver {
                final_score: self.state.score,
            });
            self.scheduler.schedule(
                GAME_OVER_RECOVERY_SECS,
                ScheduledAction::RecoverAfterGameOver,
                &self.lifecycle,
            );
        } else {
            self.state.task_text.clear();
            self.state.score = 0;
            self.state.break_streak();
            self.state.restore_health();
            self.scheduler.schedule(
                SOFT_RESET_SECS,
                ScheduledAction::FinishSoftReset,
                &self.lifecycle,
            );
        }
    }

    fn finish_game(&mut self) {
        let final_score = self.state.score;
        self.session.finish(&self.state);
        if let Err(e) = self.words.save_game_session(&self.session) {
            error!("could not save game session: {e}");
        }

        self.state.task_text = GAME_OVER_TEXT.to_string();

        match self.words.get_game_stats() {
            Ok(stats) => {
                info!(
                    "game stats - total games: {}, best score: {}, average: {:.1}",
                    stats.total_games, stats.best_score, stats.average_score
                );
                self.last_stats = Some(stats);
            }
            Err(e) => warn!("could not load game stats: {e}"),
        }

        match check_achievements_and_submit_score(self.leaderboard.as_mut(), final_score) {
            Ok(report) => {
                if report.new_personal_best {
                    self.personal_best = final_score;
                    self.notifier
                        .broadcast(SceneNotice::NewHighScore { score: final_score });
                }
                self.last_report = Some(report);
            }
            Err(e) => warn!("could not submit score: {e}"),
        }

        self.motivation = random_motivation(&mut self.rng);
        info!("game over with {final_score} points");
    }

    /// Throw away the current session and start over with full health
    pub fn start_new_game(&mut self) {
        self.lifecycle.cancel();
        self.lifecycle = CancelToken::new();
        self.pending_spawn_check = None;

        self.field.clear();
        self.cues.push(Cue::PlayMusic);
        self.obstacle_duration = self.settings.restart_obstacle_duration;
        self.state.reset();
        self.session = GameSession::new();
        self.task = None;
        self.countdown = None;
        self.unlocked.clear();
        self.last_report = None;
        self.phase = ScenePhase::Playing;
        info!("new game started");
        self.spawn_obstacle_row();
    }

    /// Freeze the field. Ignored unless playing.
    pub fn pause(&mut self) -> bool {
        if self.phase != ScenePhase::Playing {
            return false;
        }
        self.phase = ScenePhase::Paused;
        true
    }

    /// Leave the pause through a 3-2-1-GO countdown
    pub fn resume(&mut self) -> bool {
        if self.phase != ScenePhase::Paused {
            return false;
        }
        self.phase = ScenePhase::CountingDown;
        self.countdown = Some(CountdownLabel::Three);

        let steps = [
            (COUNTDOWN_STEP_SECS, CountdownLabel::Two),
            (COUNTDOWN_STEP_SECS * 2.0, CountdownLabel::One),
            (COUNTDOWN_STEP_SECS * 3.0, CountdownLabel::Go),
        ];
        for (delay, label) in steps {
            self.scheduler
                .schedule(delay, ScheduledAction::Countdown(label), &self.lifecycle);
        }
        self.scheduler.schedule(
            COUNTDOWN_STEP_SECS * 3.0 + COUNTDOWN_GO_HOLD_SECS,
            ScheduledAction::FinishCountdown,
            &self.lifecycle,
        );
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        match self.phase {
            ScenePhase::Paused => self.resume(),
            _ => self.pause(),
        }
    }

    fn accepts_input(&self) -> bool {
        matches!(self.phase, ScenePhase::Playing | ScenePhase::Resetting)
    }

    pub fn move_ship(&mut self, dx: f64) {
        if self.accepts_input() {
            self.field.move_ship(dx);
        }
    }

    pub fn fire(&mut self) -> bool {
        if !self.accepts_input() {
            return false;
        }
        self.field.settle_ship();
        self.field.fire_bullet();
        self.cues.push(Cue::Shoot);
        self.cues.push(Cue::Haptic(Haptic::Light));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::MemoryLeaderboard;
    use crate::playfield::ObstacleId;
    use crate::word_source::VocabularySource;
    use assert_matches::assert_matches;

    fn scene_with_words(words: &[&str]) -> Scene {
        let source = VocabularySource::from_words(words.iter().copied()).with_seed(5);
        Scene::new(
            SceneSettings::default(),
            Box::new(source),
            Box::new(MemoryLeaderboard::new()),
        )
        .with_seed(5)
    }

    /// Scene with "CAT" waiting for its middle letter and a wave on the field
    fn cat_scene() -> Scene {
        let mut scene = scene_with_words(&["DOG"]);
        scene.assign_task(WordTask::new(Word::new("CAT"), &[1]));
        assert!(scene.spawn_obstacle_row());
        scene
    }

    fn obstacle_for(scene: &Scene, letter: char) -> Option<ObstacleId> {
        scene
            .field()
            .obstacles()
            .iter()
            .find(|o| o.letter == letter)
            .map(|o| o.id)
    }

    fn decoy(scene: &Scene) -> ObstacleId {
        scene
            .field()
            .obstacles()
            .iter()
            .find(|o| o.letter != 'A')
            .map(|o| o.id)
            .unwrap()
    }

    fn contact(scene: &Scene, id: ObstacleId, kind: ContactKind) -> Contact {
        let o = scene.field().obstacle(id).unwrap();
        Contact {
            kind,
            obstacle: id,
            letter: o.letter,
            x: o.x,
            y: o.y,
        }
    }

    fn shot(scene: &Scene, id: ObstacleId) -> Contact {
        contact(scene, id, ContactKind::Shot(BulletId(999)))
    }

    #[test]
    fn test_start_spawns_first_wave() {
        let mut scene = scene_with_words(&["ROCKET"]);
        scene.start();

        assert_eq!(scene.field().obstacles().len(), 5);
        let task = scene.task().unwrap();
        assert_eq!(task.text(), "ROCKET");
        assert_eq!(scene.state().task_text, task.display());
        for letter in task.remaining_letters() {
            assert!(obstacle_for(&scene, letter).is_some());
        }
    }

    #[test]
    fn test_wave_slots_are_evenly_spaced() {
        let scene = cat_scene();
        let mut xs: Vec<f64> = scene.field().obstacles().iter().map(|o| o.x).collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let spacing = scene.settings.width / 6.0;
        for (i, x) in xs.iter().enumerate() {
            assert!((x - spacing * (i + 1) as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn test_correct_letter_completes_task() {
        let mut scene = cat_scene();
        let a = obstacle_for(&scene, 'A').unwrap();

        scene.handle_contact(shot(&scene, a));

        assert_eq!(scene.state().score, 50);
        assert_eq!(scene.state().streak, 1);
        assert_eq!(scene.state().words_completed, 1);
        assert!(scene.task().is_none());
        assert_eq!(scene.state().task_text, GOOD_JOB_TEXT);
        assert!(scene.field().obstacle(a).is_none());
        assert!(scene.drain_cues().contains(&Cue::Haptic(Haptic::Medium)));
    }

    #[test]
    fn test_repeated_letter_stays_until_last_blank() {
        let mut scene = scene_with_words(&["DOG"]);
        scene.assign_task(WordTask::new(Word::new("LETTER"), &[2, 3]));
        assert!(scene.spawn_obstacle_row());
        let t = obstacle_for(&scene, 'T').unwrap();

        scene.handle_contact(shot(&scene, t));

        assert_eq!(scene.state().score, 0);
        assert_eq!(scene.state().streak, 1);
        assert!(scene.field().obstacle(t).is_some());
        assert_eq!(scene.state().task_text, "LET_ER");

        scene.handle_contact(shot(&scene, t));

        assert_eq!(scene.state().score, 50);
        assert_eq!(scene.state().words_completed, 1);
        assert!(scene.field().obstacle(t).is_none());
        assert!(scene.task().is_none());
    }

    #[test]
    fn test_wrong_letter_costs_ten() {
        let mut scene = cat_scene();
        scene.state.award(30);
        let z = decoy(&scene);

        scene.handle_contact(shot(&scene, z));

        assert_eq!(scene.state().score, 20);
        assert!(!scene.task().unwrap().is_complete());
        // decoy keeps falling
        assert!(scene.field().obstacle(z).is_some());
        assert_matches!(scene.drain_cues().first(), Some(Cue::Wrong { .. }));
    }

    #[test]
    fn test_wrong_letter_never_below_zero() {
        let mut scene = cat_scene();
        let z = decoy(&scene);

        scene.handle_contact(shot(&scene, z));
        scene.handle_contact(shot(&scene, z));

        assert_eq!(scene.state().score, 0);
    }

    #[test]
    fn test_floor_miss_with_incomplete_task() {
        let mut scene = cat_scene();
        scene.state.award(100);
        scene.state.bump_streak();
        let z = decoy(&scene);

        scene.handle_contact(contact(&scene, z, ContactKind::Floor));

        assert_eq!(scene.state().score, 75);
        assert_eq!(scene.state().streak, 0);
        assert!(scene.task().is_none());
        assert!(scene.field().obstacle(z).is_none());
        // letters remain, so the next wave waits
        assert_eq!(scene.pending_timers(), 1);
    }

    #[test]
    fn test_floor_miss_after_completion_is_free() {
        let mut scene = cat_scene();
        let a = obstacle_for(&scene, 'A').unwrap();
        scene.handle_contact(shot(&scene, a));
        let z = decoy(&scene);

        scene.handle_contact(contact(&scene, z, ContactKind::Floor));

        assert_eq!(scene.state().score, 50);
        assert_eq!(scene.state().streak, 1);
    }

    #[test]
    fn test_only_one_spawn_check_pending() {
        let mut scene = cat_scene();
        let a = obstacle_for(&scene, 'A').unwrap();
        scene.handle_contact(shot(&scene, a));

        let decoys: Vec<ObstacleId> = scene.field().obstacles().iter().map(|o| o.id).collect();
        for id in decoys.iter().take(3) {
            scene.handle_contact(contact(&scene, *id, ContactKind::Floor));
        }
        assert_eq!(scene.pending_timers(), 1);
    }

    #[test]
    fn test_field_clear_spawns_next_wave_immediately() {
        let mut scene = cat_scene();
        let ids: Vec<ObstacleId> = scene.field().obstacles().iter().map(|o| o.id).collect();

        for id in ids {
            scene.handle_contact(contact(&scene, id, ContactKind::Floor));
        }

        assert_eq!(scene.field().obstacles().len(), 5);
        assert_eq!(scene.task().unwrap().text(), "DOG");
    }

    #[test]
    fn test_spawn_after_completion_waits_for_clear_field() {
        let mut scene = cat_scene();
        let a = obstacle_for(&scene, 'A').unwrap();
        scene.handle_contact(shot(&scene, a));

        scene.update(SPAWN_RETRY_SECS);
        assert!(scene.task().is_none());

        scene.field.clear();
        scene.update(SPAWN_RETRY_SECS);
        assert_eq!(scene.task().unwrap().text(), "DOG");
    }

    #[test]
    fn test_ship_hit_ends_game_with_default_health() {
        let mut scene = cat_scene();
        let ids: Vec<ObstacleId> = scene.field().obstacles().iter().map(|o| o.id).collect();

        for id in ids.iter().take(3) {
            if let Some(o) = scene.field().obstacle(*id) {
                let c = Contact {
                    kind: ContactKind::Ship,
                    obstacle: *id,
                    letter: o.letter,
                    x: o.x,
                    y: o.y,
                };
                scene.handle_contact(c);
            }
        }

        assert_eq!(scene.phase(), ScenePhase::GameOver);
        assert_eq!(scene.state().health, 0);
        assert_eq!(scene.state().task_text, GAME_OVER_TEXT);
        assert!(!scene.field().has_obstacles());
    }

    #[test]
    fn test_game_over_persists_and_broadcasts() {
        let mut scene = cat_scene();
        let rx = scene.subscribe();
        scene.state.award(120);
        let id = decoy(&scene);

        scene.handle_contact(contact(&scene, id, ContactKind::Ship));

        assert_eq!(scene.last_stats().unwrap().total_games, 1);
        assert_eq!(scene.last_stats().unwrap().best_score, 120);
        assert!(scene.last_report().unwrap().new_personal_best);
        assert_eq!(scene.personal_best(), 120);

        let notices: Vec<SceneNotice> = rx.try_iter().collect();
        assert!(notices.contains(&SceneNotice::NewHighScore { score: 120 }));
        assert!(notices.contains(&SceneNotice::GameOver { final_score: 120 }));
    }

    #[test]
    fn test_game_over_recovers_health_but_stays_over() {
        let mut scene = cat_scene();
        let id = decoy(&scene);
        scene.handle_contact(contact(&scene, id, ContactKind::Ship));

        scene.update(GAME_OVER_RECOVERY_SECS);

        assert_eq!(scene.phase(), ScenePhase::GameOver);
        assert_eq!(scene.state().health, scene.state().max_health);
        assert!(scene.drain_cues().contains(&Cue::StopMusic));
        assert!(!scene.fire());
    }

    #[test]
    fn test_auto_restart_after_game_over() {
        let source = VocabularySource::from_words(["DOG", "CAT"]).with_seed(1);
        let settings = SceneSettings {
            auto_restart: true,
            ..SceneSettings::default()
        };
        let mut scene = Scene::new(settings, Box::new(source), Box::new(MemoryLeaderboard::new()));
        scene.start();
        scene.reset(true);

        scene.update(GAME_OVER_RECOVERY_SECS);

        assert_eq!(scene.phase(), ScenePhase::Playing);
        assert!(scene.field().has_obstacles());
    }

    #[test]
    fn test_fall_complete_triggers_soft_reset() {
        let mut scene = cat_scene();
        scene.state.award(200);
        scene.state.damage(3);

        scene.handle_contact(Contact {
            kind: ContactKind::FallComplete,
            obstacle: ObstacleId(1234),
            letter: 'A',
            x: 0.0,
            y: -40.0,
        });

        assert_eq!(scene.phase(), ScenePhase::Resetting);
        assert_eq!(scene.state().score, 0);
        assert_eq!(scene.state().health, scene.state().max_health);
        assert!(!scene.field().has_obstacles());

        scene.update(SOFT_RESET_SECS);
        assert_eq!(scene.phase(), ScenePhase::Playing);
        assert_eq!(scene.field().obstacles().len(), 5);
        assert_eq!(scene.task().unwrap().text(), "DOG");
    }

    #[test]
    fn test_fall_complete_without_task_does_nothing() {
        let mut scene = cat_scene();
        let a = obstacle_for(&scene, 'A').unwrap();
        scene.handle_contact(shot(&scene, a));

        scene.handle_contact(Contact {
            kind: ContactKind::FallComplete,
            obstacle: ObstacleId(1234),
            letter: 'Q',
            x: 0.0,
            y: -40.0,
        });

        assert_eq!(scene.phase(), ScenePhase::Playing);
    }

    #[test]
    fn test_contacts_ignored_while_resetting() {
        let mut scene = cat_scene();
        let a = obstacle_for(&scene, 'A').unwrap();
        let hit = shot(&scene, a);
        scene.reset(false);

        scene.handle_contact(hit);
        assert_eq!(scene.state().score, 0);
        assert_eq!(scene.state().words_completed, 0);
    }

    #[test]
    fn test_reset_is_not_reentrant() {
        let mut scene = cat_scene();
        scene.reset(false);
        let timers = scene.pending_timers();
        scene.reset(false);
        scene.reset(true);

        assert_eq!(scene.phase(), ScenePhase::Resetting);
        assert_eq!(scene.pending_timers(), timers);
    }

    #[test]
    fn test_pause_and_countdown_sequence() {
        let mut scene = cat_scene();

        assert!(scene.pause());
        assert_eq!(scene.phase(), ScenePhase::Paused);
        assert!(!scene.fire());

        assert!(scene.resume());
        assert_eq!(scene.phase(), ScenePhase::CountingDown);
        assert_eq!(scene.countdown(), Some(CountdownLabel::Three));
        assert!(!scene.pause());

        scene.update(1.0);
        assert_eq!(scene.countdown(), Some(CountdownLabel::Two));
        scene.update(1.0);
        assert_eq!(scene.countdown(), Some(CountdownLabel::One));
        scene.update(1.0);
        assert_eq!(scene.countdown(), Some(CountdownLabel::Go));
        assert_eq!(scene.phase(), ScenePhase::CountingDown);
        scene.update(0.5);
        assert_eq!(scene.phase(), ScenePhase::Playing);
        assert_eq!(scene.countdown(), None);
    }

    #[test]
    fn test_paused_field_does_not_move() {
        let mut scene = cat_scene();
        let before: Vec<f64> = scene.field().obstacles().iter().map(|o| o.y).collect();

        scene.pause();
        scene.update(2.0);

        let after: Vec<f64> = scene.field().obstacles().iter().map(|o| o.y).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_resume_requires_pause() {
        let mut scene = cat_scene();
        assert!(!scene.resume());
        assert!(scene.toggle_pause());
        assert_eq!(scene.phase(), ScenePhase::Paused);
        assert!(scene.toggle_pause());
        assert_eq!(scene.phase(), ScenePhase::CountingDown);
    }

    #[test]
    fn test_new_game_cancels_old_timers() {
        let mut scene = cat_scene();
        scene.pause();
        scene.resume();
        assert!(scene.pending_timers() > 0);

        scene.start_new_game();

        assert_eq!(scene.pending_timers(), 0);
        assert_eq!(scene.phase(), ScenePhase::Playing);
        assert_eq!(scene.obstacle_duration(), 8.0);
        assert_eq!(scene.state().score, 0);
        assert!(scene.field().has_obstacles());
    }

    #[test]
    fn test_obstacle_duration_decays_with_score() {
        let mut scene = cat_scene();
        let mut last = scene.obstacle_duration();
        for _ in 0..20 {
            scene.state.award(100);
            scene.field.clear();
            scene.task = None;
            scene.spawn_obstacle_row();
            assert!(scene.obstacle_duration() <= last);
            assert!(scene.obstacle_duration() >= 4.5);
            last = scene.obstacle_duration();
        }
        assert_eq!(last, 4.5);
    }

    #[test]
    fn test_vocabulary_exhaustion_resets_usage_once() {
        let mut scene = scene_with_words(&["SUN"]);
        scene.start();
        assert_eq!(scene.task().unwrap().text(), "SUN");

        scene.task = None;
        scene.field.clear();
        assert!(scene.spawn_obstacle_row());
        assert_eq!(scene.task().unwrap().text(), "SUN");
    }

    #[test]
    fn test_empty_vocabulary_leaves_scene_idle() {
        let mut scene = scene_with_words(&[]);
        let rx = scene.subscribe();

        scene.start();

        assert!(scene.task().is_none());
        assert!(!scene.field().has_obstacles());
        assert!(scene.is_out_of_words());
        assert_eq!(rx.try_recv().unwrap(), SceneNotice::VocabularyExhausted);
        scene.update(1.0);
        assert_eq!(scene.phase(), ScenePhase::Playing);
    }

    #[test]
    fn test_fire_and_move() {
        let mut scene = cat_scene();
        let x = scene.field().ship.x;

        scene.move_ship(20.0);
        assert_eq!(scene.field().ship.x, x + 20.0);
        assert!(scene.fire());
        assert_eq!(scene.field().bullets().len(), 1);
        let cues = scene.drain_cues();
        assert!(cues.contains(&Cue::Shoot));
        assert!(scene.drain_cues().is_empty());
    }

    #[test]
    fn test_leaderboard_submission_on_game_over() {
        let mut scene = cat_scene();
        scene.state.award(1000);
        scene.reset(true);
        let report = scene.last_report().unwrap();
        assert_eq!(report.achievements.len(), 3);
        assert!(report.new_personal_best);
    }

    #[test]
    fn test_countdown_labels() {
        assert_eq!(CountdownLabel::Three.to_string(), "3");
        assert_eq!(CountdownLabel::Go.to_string(), "GO!");
        assert_eq!(ScenePhase::GameOver.to_string(), "GameOver");
    }

    #[test]
    fn test_random_motivation_is_known() {
        let mut rng = StdRng::seed_from_u64(3);
        let msg = random_motivation(&mut rng);
        assert!(MOTIVATION_MESSAGES.contains(&msg));
    }
}
