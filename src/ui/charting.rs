/// Bounds for the score-per-round chart: (last round, lowest score, highest score).
/// The y range always includes zero so the sign of the score reads at a glance.
pub fn compute_chart_params(score_timeline: &[i64]) -> (f64, f64, f64) {
    let rounds = (score_timeline.len() as f64).max(1.0);
    let lowest = score_timeline.iter().copied().min().unwrap_or(0).min(0);
    let highest = score_timeline.iter().copied().max().unwrap_or(0).max(0);

    if lowest == highest {
        // flat line at zero still needs a visible range
        return (rounds, -1.0, 1.0);
    }

    (rounds, lowest as f64, highest as f64)
}

/// Chart points as (round number, score after that round)
pub fn timeline_points(score_timeline: &[i64]) -> Vec<(f64, f64)> {
    score_timeline
        .iter()
        .enumerate()
        .map(|(i, &score)| ((i + 1) as f64, score as f64))
        .collect()
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
