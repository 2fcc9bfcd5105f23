// Library surface for the game logic; the terminal front end lives in main.rs and ui/.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod game_state;
pub mod leaderboard;
pub mod logging;
pub mod notify;
pub mod obstacles;
pub mod playfield;
pub mod runtime;
pub mod scene;
pub mod scheduler;
pub mod stats;
pub mod util;
pub mod vocabulary;
pub mod word_source;
pub mod word_task;

pub use error::{GameError, Result};
pub use scene::{Scene, SceneSettings};
