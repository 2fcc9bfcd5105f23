mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{debug, info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin, Write},
    path::{Path, PathBuf},
    sync::mpsc::Receiver,
};

use wordinvader::{
    config::{Config, ConfigStore, FileConfigStore},
    leaderboard::{Leaderboard, MemoryLeaderboard, LEADERBOARD_ID},
    logging,
    notify::SceneNotice,
    runtime::{CrosstermEventSource, EventSource, FixedTicker, GameEvent, Runner, Ticker},
    scene::{Cue, Scene, SceneSettings},
    stats::{export_sessions_csv, StatsDb},
    vocabulary::SupportedVocabulary,
    word_source::{GameSession, GameStats, VocabularySource, WordSource},
};

/// Longest frame the scene is advanced by in one go, e.g. after the terminal was suspended
const MAX_FRAME_SECS: f64 = 0.25;
const FLASH_SECS: f64 = 0.6;
const BANNER_SECS: f64 = 2.5;
const HISTORY_ROWS: usize = 50;

/// fill-in-the-blank letter shooter for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Shoot the falling letters that complete the word. \
                  Wrong letters, missed letters and letters that reach your ship cost you."
)]
pub struct Cli {
    /// word list to draw tasks from
    #[clap(short = 'v', long, value_enum)]
    vocabulary: Option<SupportedVocabulary>,

    /// health at the start of a game; a letter hitting the ship costs 10
    #[clap(long)]
    health: Option<i32>,

    /// milliseconds between frames
    #[clap(long)]
    tick_rate: Option<u64>,

    /// start the next game by itself after a game over
    #[clap(long)]
    auto_restart: bool,

    /// write the effective settings to the config file and exit
    #[clap(long)]
    save_config: bool,

    /// print stored game statistics and exit
    #[clap(long)]
    stats: bool,

    /// forget stored games, scores, achievements and the personal best, then exit
    #[clap(long)]
    clear_stats: bool,

    /// write every stored game to a CSV file and exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// seed for a reproducible task and wave order
    #[clap(long)]
    seed: Option<u64>,
}

impl Cli {
    /// Layer command line flags over the stored config
    fn apply(&self, mut config: Config) -> Config {
        if let Some(vocabulary) = self.vocabulary {
            config.vocabulary = vocabulary;
        }
        if let Some(health) = self.health {
            config.starting_health = health.max(1);
        }
        if let Some(ms) = self.tick_rate {
            config.tick_rate_ms = ms.max(1);
        }
        if self.auto_restart {
            config.auto_restart = true;
        }
        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Playing,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Explosion,
    Wrong,
    BrokenHeart,
}

/// Short-lived effect drawn at a playfield position
#[derive(Debug, Clone, PartialEq)]
pub struct Flash {
    pub kind: FlashKind,
    pub x: f64,
    pub y: f64,
    pub ttl: f64,
}

#[derive(Debug, Default)]
pub struct HistoryView {
    pub sessions: Vec<GameSession>,
    pub stats: GameStats,
    pub top_scores: Vec<u32>,
    pub scroll_offset: usize,
    /// the scene was paused by opening this screen and resumes on the way back
    pub resume_on_back: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Quit,
}

pub struct App {
    pub scene: Scene,
    pub state: AppState,
    pub config: Config,
    pub flashes: Vec<Flash>,
    pub banner: Option<(String, f64)>,
    pub history: HistoryView,
    notices: Receiver<SceneNotice>,
    history_db: Option<StatsDb>,
}

impl App {
    /// Game backed by the stats database, or an in-memory fallback if it cannot be opened
    pub fn new(config: Config, seed: Option<u64>) -> Self {
        let (words, leaderboard, history_db) = open_backends(&config);
        Self::with_backends(config, words, leaderboard, history_db, seed)
    }

    pub fn with_backends(
        config: Config,
        words: Box<dyn WordSource>,
        leaderboard: Box<dyn Leaderboard>,
        history_db: Option<StatsDb>,
        seed: Option<u64>,
    ) -> Self {
        let mut scene = Scene::new(SceneSettings::from(&config), words, leaderboard);
        if let Some(seed) = seed {
            scene = scene.with_seed(seed);
        }
        let notices = scene.subscribe();
        scene.start();

        let mut app = Self {
            scene,
            state: AppState::Playing,
            config,
            flashes: Vec::new(),
            banner: None,
            history: HistoryView::default(),
            notices,
            history_db,
        };
        app.absorb_scene_output();
        app
    }

    fn on_tick(&mut self, dt: f64) {
        let dt = dt.clamp(0.0, MAX_FRAME_SECS);
        self.scene.update(dt);
        self.absorb_scene_output();

        for flash in &mut self.flashes {
            flash.ttl -= dt;
        }
        self.flashes.retain(|f| f.ttl > 0.0);

        if let Some((_, ttl)) = &mut self.banner {
            *ttl -= dt;
            if *ttl <= 0.0 {
                self.banner = None;
            }
        }
    }

    fn absorb_scene_output(&mut self) {
        for cue in self.scene.drain_cues() {
            let flash = |kind, x, y| Flash {
                kind,
                x,
                y,
                ttl: FLASH_SECS,
            };
            match cue {
                Cue::Explosion { x, y } => self.flashes.push(flash(FlashKind::Explosion, x, y)),
                Cue::Wrong { x, y } => self.flashes.push(flash(FlashKind::Wrong, x, y)),
                Cue::BrokenHeart { x, y } => {
                    self.flashes.push(flash(FlashKind::BrokenHeart, x, y))
                }
                // no audio or haptics in a terminal
                other => debug!("cue {other:?}"),
            }
        }

        let notices: Vec<SceneNotice> = self.notices.try_iter().collect();
        for notice in notices {
            match notice {
                SceneNotice::NewHighScore { score } => {
                    self.banner = Some((format!("New personal best: {score}!"), BANNER_SECS));
                }
                SceneNotice::WordCompleted { word } => {
                    self.banner = Some((word, BANNER_SECS / 2.0));
                }
                SceneNotice::VocabularyExhausted => {
                    self.banner = Some(("No words available".to_string(), BANNER_SECS));
                }
                SceneNotice::GameOver { final_score } => {
                    info!("game over screen for {final_score} points");
                    self.refresh_history();
                }
            }
        }
    }

    pub fn refresh_history(&mut self) {
        let Some(db) = &self.history_db else {
            if let Some(stats) = self.scene.last_stats() {
                self.history.stats = stats;
            }
            return;
        };

        let loaded = db.recent_sessions(HISTORY_ROWS).and_then(|sessions| {
            Ok((
                sessions,
                db.get_game_stats()?,
                db.top_scores(LEADERBOARD_ID, 5)?,
            ))
        });
        match loaded {
            Ok((sessions, stats, top_scores)) => {
                self.history.sessions = sessions;
                self.history.stats = stats;
                self.history.top_scores = top_scores;
            }
            Err(e) => warn!("could not load game history: {e}"),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return KeyOutcome::Quit;
        }

        match self.state {
            AppState::Playing => match key.code {
                KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('h') => {
                    self.scene.move_ship(-self.config.ship_step);
                }
                KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('l') => {
                    self.scene.move_ship(self.config.ship_step);
                }
                KeyCode::Char(' ') | KeyCode::Up | KeyCode::Char('k') => {
                    self.scene.fire();
                }
                KeyCode::Char('p') => {
                    self.scene.toggle_pause();
                }
                KeyCode::Char('r') => {
                    self.flashes.clear();
                    self.banner = None;
                    self.scene.start_new_game();
                }
                KeyCode::Char('s') => {
                    self.history.resume_on_back = self.scene.pause();
                    self.refresh_history();
                    self.history.scroll_offset = 0;
                    self.state = AppState::History;
                }
                _ => {}
            },
            AppState::History => match key.code {
                KeyCode::Char('b') | KeyCode::Backspace => {
                    if std::mem::take(&mut self.history.resume_on_back) {
                        self.scene.resume();
                    }
                    self.state = AppState::Playing;
                }
                KeyCode::Char('r') => {
                    self.history.resume_on_back = false;
                    self.scene.start_new_game();
                    self.state = AppState::Playing;
                }
                KeyCode::Up => {
                    self.history.scroll_offset = self.history.scroll_offset.saturating_sub(1);
                }
                KeyCode::Down => {
                    // clamped while rendering
                    self.history.scroll_offset += 1;
                }
                KeyCode::Home => {
                    self.history.scroll_offset = 0;
                }
                _ => {}
            },
        }

        self.absorb_scene_output();
        KeyOutcome::Continue
    }
}

/// Words and leaderboard from SQLite, seeded with the chosen vocabulary
fn open_backends(config: &Config) -> (Box<dyn WordSource>, Box<dyn Leaderboard>, Option<StatsDb>) {
    let vocabulary = config
        .vocabulary
        .as_vocabulary()
        .map(|v| v.playable_words())
        .unwrap_or_else(|e| {
            warn!("could not load vocabulary {}: {e}", config.vocabulary);
            Vec::new()
        });

    let pool = config.vocabulary.name();
    let opened = StatsDb::new().and_then(|db| {
        let mut words = db.with_vocabulary(pool.as_str());
        let added = words.seed_words(&vocabulary)?;
        debug!("seeded {added} new {pool} words");
        Ok((words, StatsDb::new()?, StatsDb::new()?))
    });

    match opened {
        Ok((words, leaderboard, history)) => {
            (Box::new(words), Box::new(leaderboard), Some(history))
        }
        Err(e) => {
            warn!("stats database unavailable, nothing will be saved: {e}");
            (
                Box::new(VocabularySource::from_words(vocabulary)),
                Box::new(MemoryLeaderboard::new()),
                None,
            )
        }
    }
}

fn print_stats<W: Write>(db: &StatsDb, out: &mut W) -> Result<(), Box<dyn Error>> {
    let stats = db.get_game_stats()?;
    writeln!(out, "games played:   {}", stats.total_games)?;
    writeln!(out, "best score:     {}", stats.best_score)?;
    writeln!(out, "average score:  {:.1}", stats.average_score)?;
    writeln!(out, "personal best:  {}", db.personal_best()?)?;

    let top = db.top_scores(LEADERBOARD_ID, 5)?;
    if !top.is_empty() {
        let listed: Vec<String> = top.iter().map(u32::to_string).collect();
        writeln!(out, "top scores:     {}", listed.join(", "))?;
    }

    let achievements = db.achievements()?;
    if !achievements.is_empty() {
        writeln!(out, "achievements:   {}", achievements.join(", "))?;
    }
    Ok(())
}

fn export_history(db: &StatsDb, path: &Path) -> Result<usize, Box<dyn Error>> {
    let file = File::create(path)?;
    Ok(export_sessions_csv(&db.all_sessions()?, file)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init();

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());

    if cli.save_config {
        store.save(&config)?;
        println!("settings saved to {}", store.path().display());
        return Ok(());
    }

    if cli.stats {
        print_stats(&StatsDb::new()?, &mut io::stdout())?;
        return Ok(());
    }

    if cli.clear_stats {
        StatsDb::new()?.clear_all_stats()?;
        println!("game statistics cleared");
        return Ok(());
    }

    if let Some(path) = &cli.export {
        let rows = export_history(&StatsDb::new()?, path)?;
        println!("exported {rows} games to {}", path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    info!("starting with {config:?}");
    let mut app = App::new(config, cli.seed);
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::from_millis(app.config.tick_rate_ms),
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui(app, f))?;

        match runner.step() {
            GameEvent::Tick(dt) => app.on_tick(dt.as_secs_f64()),
            GameEvent::Resize => {}
            GameEvent::Key(key) => {
                if app.handle_key(key) == KeyOutcome::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn ui(app: &mut App, f: &mut Frame) {
    let screen = ui::screen::current_screen(&app.state);
    screen.render(app, f);
}
