use ratatui::Frame;

use crate::{ui::history::render_history, App, AppState};

/// A UI screen boundary
pub trait Screen {
    fn render(&self, app: &mut App, f: &mut Frame);
}

/// The game itself, drawn by the `App` widget
pub struct PlayScreen;

impl Screen for PlayScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

/// Past games and the local leaderboard
pub struct HistoryScreen;

impl Screen for HistoryScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        render_history(app, f);
    }
}

pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Playing => Box::new(PlayScreen),
        AppState::History => Box::new(HistoryScreen),
    }
}
