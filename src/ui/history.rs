use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table},
    Frame,
};

use wordinvader::util::format_duration;
use wordinvader::word_source::GameSession;

use crate::ui::charting::{compute_chart_params, format_label, score_points};
use crate::App;

/// Pure presenter for one past game
pub fn present_row(session: &GameSession, personal_best: u32) -> Row<'static> {
    let score_style = if session.score > 0 && session.score >= personal_best {
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD)
    } else if session.score >= 100 {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    Row::new(vec![
        Cell::from(session.started_at.format("%Y-%m-%d %H:%M").to_string()),
        Cell::from(format_duration(session.duration_secs)),
        Cell::from(session.score.to_string()).style(score_style),
        Cell::from(session.words_completed.to_string()),
        Cell::from(session.best_streak.to_string()),
    ])
}

pub fn render_history(app: &mut App, f: &mut Frame) {
    let area = f.area();
    let bold_style = Style::default().add_modifier(Modifier::BOLD);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),      // summary
            Constraint::Percentage(40), // chart
            Constraint::Min(4),         // table
            Constraint::Length(3),      // instructions
        ])
        .split(area);

    let stats = app.history.stats;
    let mut summary = format!(
        "Games: {}   Best: {}   Average: {:.1}   Personal best: {}",
        stats.total_games,
        stats.best_score,
        stats.average_score,
        app.scene.personal_best()
    );
    if !app.history.top_scores.is_empty() {
        let top: Vec<String> = app.history.top_scores.iter().map(u32::to_string).collect();
        summary.push_str(&format!("   Top: {}", top.join(", ")));
    }
    f.render_widget(
        Paragraph::new(summary)
            .block(Block::default().borders(Borders::ALL).title("Statistics"))
            .style(bold_style.fg(Color::Cyan))
            .alignment(Alignment::Center),
        chunks[0],
    );

    let points = score_points(&app.history.sessions);
    let (games, highest) = compute_chart_params(&points);
    let datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&points)];
    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("Scores"))
        .x_axis(
            Axis::default()
                .title("game")
                .bounds([1.0, games])
                .labels(vec![
                    Span::styled("1", bold_style),
                    Span::styled(format_label(games), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("score")
                .bounds([0.0, highest])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(format_label(highest), bold_style),
                ]),
        );
    f.render_widget(chart, chunks[1]);

    if app.history.sessions.is_empty() {
        let no_data = Paragraph::new("No games recorded yet.\nFinish a game to see it here!")
            .block(Block::default().borders(Borders::ALL).title("Recent games"))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(no_data, chunks[2]);
    } else {
        let table_height = chunks[2].height.saturating_sub(3) as usize;
        let total_rows = app.history.sessions.len();
        let max_scroll = total_rows.saturating_sub(table_height);
        app.history.scroll_offset = app.history.scroll_offset.min(max_scroll);

        let best = app.scene.personal_best();
        let rows: Vec<Row> = app
            .history
            .sessions
            .iter()
            .skip(app.history.scroll_offset)
            .take(table_height)
            .map(|s| present_row(s, best))
            .collect();

        let header = Row::new(vec!["Started", "Time", "Score", "Words", "Streak"]).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let table = Table::new(
            rows,
            &[
                Constraint::Length(18),
                Constraint::Length(8),
                Constraint::Length(8),
                Constraint::Length(8),
                Constraint::Length(8),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Recent games ({}/{})",
            (app.history.scroll_offset + table_height).min(total_rows),
            total_rows
        )));
        f.render_widget(table, chunks[2]);
    }

    let instructions = Paragraph::new("↑/↓ scroll | (r)estart | (b)ack | (esc)ape")
        .block(Block::default().borders(Borders::ALL))
        .style(
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )
        .alignment(Alignment::Center);
    f.render_widget(instructions, chunks[3]);
}
