use wordinvader::word_source::GameSession;

/// Chart points for `sessions` (newest first), oldest game at x = 1
pub fn score_points(sessions: &[GameSession]) -> Vec<(f64, f64)> {
    sessions
        .iter()
        .rev()
        .enumerate()
        .map(|(i, s)| ((i + 1) as f64, f64::from(s.score)))
        .collect()
}

/// Compute X (game number) and Y (score) bounds for the history chart
pub fn compute_chart_params(points: &[(f64, f64)]) -> (f64, f64) {
    let highest_score = points.iter().map(|&(_, score)| score).fold(0.0, f64::max);
    let games = points.last().map_or(1.0, |p| p.0).max(1.0);

    // keep the y axis from collapsing before the first points are scored
    (games, highest_score.max(50.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(score: u32) -> GameSession {
        let mut s = GameSession::new();
        s.score = score;
        s
    }

    #[test]
    fn test_compute_chart_params_empty() {
        assert_eq!(compute_chart_params(&[]), (1.0, 50.0));
    }

    #[test]
    fn test_score_points_oldest_first() {
        let points = score_points(&[session(300), session(120), session(40)]);
        assert_eq!(points, vec![(1.0, 40.0), (2.0, 120.0), (3.0, 300.0)]);
        assert_eq!(compute_chart_params(&points), (3.0, 300.0));
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
