pub mod charting;
pub mod history;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use wordinvader::playfield::{Playfield, ShipPose};
use wordinvader::scene::{Scene, ScenePhase};

use crate::{App, FlashKind};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

const LEGEND: &str = "(←/→) move  (space) fire  (p)ause  (r)estart  (s)tats  (esc)ape";

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let scene = &self.scene;
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // hud
                Constraint::Length(3), // task
                Constraint::Length(1), // banner
                Constraint::Min(3),    // playfield
                Constraint::Length(1), // legend
            ])
            .split(area);

        render_hud(scene, chunks[0], buf);

        let task = Paragraph::new(Span::styled(
            scene.state().task_text.clone(),
            bold_style.fg(Color::Green),
        ))
        .block(Block::default().borders(Borders::ALL).title("Word"))
        .alignment(Alignment::Center);
        task.render(chunks[1], buf);

        if let Some((text, _)) = &self.banner {
            Paragraph::new(Span::styled(text.clone(), italic_style.fg(Color::Cyan)))
                .alignment(Alignment::Center)
                .render(chunks[2], buf);
        }

        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(chunks[3]);
        block.render(chunks[3], buf);
        render_field(self, inner, buf);
        render_overlay(scene, inner, buf);

        Paragraph::new(Span::styled(LEGEND, italic_style))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }
}

fn render_hud(scene: &Scene, area: Rect, buf: &mut Buffer) {
    let state = scene.state();
    let label = Style::default().add_modifier(Modifier::DIM);
    let value = Style::default().add_modifier(Modifier::BOLD);
    let health_color = if state.health * 2 > state.max_health {
        Color::Green
    } else {
        Color::Red
    };

    let line = Line::from(vec![
        Span::styled("Score ", label),
        Span::styled(state.score.to_string(), value),
        Span::styled("   Best ", label),
        Span::styled(scene.personal_best().max(state.score).to_string(), value),
        Span::styled("   Streak ", label),
        Span::styled(state.streak.to_string(), value),
        Span::styled("   Health ", label),
        Span::styled(
            format!("{}/{}", state.health, state.max_health),
            value.fg(health_color),
        ),
    ]);
    Paragraph::new(line)
        .alignment(Alignment::Center)
        .render(area, buf);
}

/// Map a playfield position (origin bottom-left, y up) onto a cell of `area`
pub fn project(field: &Playfield, x: f64, y: f64, area: Rect) -> Option<(u16, u16)> {
    if area.width == 0 || area.height == 0 || field.width <= 0.0 || field.height <= 0.0 {
        return None;
    }
    if !(0.0..=field.height).contains(&y) || !(0.0..=field.width).contains(&x) {
        return None;
    }

    let col = (x / field.width * f64::from(area.width - 1)).round() as u16;
    let row = ((1.0 - y / field.height) * f64::from(area.height - 1)).round() as u16;
    Some((area.x + col, area.y + row))
}

/// Write `text` centred on `col`, clipped to `area`
fn put(buf: &mut Buffer, area: Rect, col: u16, row: u16, text: &str, style: Style) {
    let start = col.saturating_sub(text.width() as u16 / 2);
    for (i, ch) in text.chars().enumerate() {
        let x = start + i as u16;
        if x < area.x || x >= area.right() || row < area.y || row >= area.bottom() {
            continue;
        }
        if let Some(cell) = buf.cell_mut((x, row)) {
            cell.set_symbol(&ch.to_string());
            cell.set_style(style);
        }
    }
}

fn render_field(app: &App, area: Rect, buf: &mut Buffer) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let field = app.scene.field();

    let floor = "─".repeat(area.width as usize);
    put(
        buf,
        area,
        area.x + area.width / 2,
        area.bottom() - 1,
        &floor,
        Style::default().fg(Color::DarkGray),
    );

    for obstacle in field.obstacles() {
        if let Some((col, row)) = project(field, obstacle.x, obstacle.y, area) {
            put(
                buf,
                area,
                col,
                row,
                &format!("[{}]", obstacle.letter),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        }
    }

    for bullet in field.bullets() {
        if let Some((col, row)) = project(field, bullet.x, bullet.y, area) {
            put(buf, area, col, row, "|", Style::default().fg(Color::Cyan));
        }
    }

    let ship = match field.ship.pose {
        ShipPose::Idle => "/^\\",
        ShipPose::Left => "<^|",
        ShipPose::Right => "|^>",
    };
    if let Some((col, row)) = project(field, field.ship.x, field.ship.y, area) {
        put(
            buf,
            area,
            col,
            row,
            ship,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    }

    for flash in &app.flashes {
        let Some((col, row)) = project(field, flash.x, flash.y, area) else {
            continue;
        };
        let (symbol, style, row) = match flash.kind {
            FlashKind::Explosion => ("*", Style::default().fg(Color::LightRed), row),
            FlashKind::Wrong => ("✗", Style::default().fg(Color::Red), row),
            FlashKind::BrokenHeart => (
                "♡",
                Style::default().fg(Color::Magenta),
                row.saturating_sub(1),
            ),
        };
        put(buf, area, col, row, symbol, style.add_modifier(Modifier::BOLD));
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn render_overlay(scene: &Scene, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);

    match scene.phase() {
        ScenePhase::Paused => {
            let rect = centered(area, 30, 3);
            Clear.render(rect, buf);
            Paragraph::new("(p) to resume")
                .block(Block::default().borders(Borders::ALL).title("Paused"))
                .style(bold_style.fg(Color::Yellow))
                .alignment(Alignment::Center)
                .render(rect, buf);
        }
        ScenePhase::CountingDown => {
            if let Some(label) = scene.countdown() {
                let rect = centered(area, 9, 3);
                Clear.render(rect, buf);
                Paragraph::new(label.to_string())
                    .block(Block::default().borders(Borders::ALL))
                    .style(bold_style.fg(Color::Yellow))
                    .alignment(Alignment::Center)
                    .render(rect, buf);
            }
        }
        ScenePhase::GameOver => {
            let state = scene.state();
            let mut lines = vec![
                Line::from(Span::styled(
                    format!("Final score: {}", state.score),
                    bold_style,
                )),
                Line::from(format!("Personal best: {}", scene.personal_best())),
                Line::from(format!(
                    "Words: {}   Best streak: {}",
                    state.words_completed, state.best_streak
                )),
            ];
            if let Some(stats) = scene.last_stats() {
                lines.push(Line::from(format!(
                    "Games: {}   Average: {:.0}",
                    stats.total_games, stats.average_score
                )));
            }
            if scene.last_report().is_some_and(|r| r.new_personal_best) {
                lines.push(Line::from(Span::styled(
                    "New personal record!",
                    bold_style.fg(Color::Magenta),
                )));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                scene.motivation(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::ITALIC),
            )));
            lines.push(Line::from(Span::styled(
                "(r)estart / (s)tats / (esc)ape",
                Style::default().add_modifier(Modifier::ITALIC),
            )));

            let rect = centered(area, 46, lines.len() as u16 + 2);
            Clear.render(rect, buf);
            Paragraph::new(lines)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Game Over")
                        .border_style(Style::default().fg(Color::Red)),
                )
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .render(rect, buf);
        }
        ScenePhase::Playing | ScenePhase::Resetting => {
            if scene.is_out_of_words() {
                Paragraph::new(Span::styled(
                    "No words available",
                    bold_style.fg(Color::Red),
                ))
                .alignment(Alignment::Center)
                .render(centered(area, area.width, 1), buf);
            }
        }
    }
}
