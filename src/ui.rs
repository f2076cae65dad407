pub mod charting;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};
use speedy_words::{
    engine::ROUND_CHOICES, session::RoundOutcome, util::signed, GameStatus, GameView,
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

const DARK_TEAL: Color = Color::Rgb(38, 70, 83);
const TEAL: Color = Color::Rgb(42, 157, 143);
const YELLOW: Color = Color::Rgb(233, 196, 106);
const ORANGE: Color = Color::Rgb(244, 162, 97);
const CORAL: Color = Color::Rgb(231, 111, 81);

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.engine.status() {
            GameStatus::NotStarted => render_menu(self, area, buf),
            GameStatus::Playing => render_playing(&self.engine.view(), area, buf),
            GameStatus::Finished => render_finished(self, area, buf),
        }
    }
}

/// Rows left over above a block of `content` rows when centering it vertically
fn centered_padding(area: Rect, content: u16) -> u16 {
    area.height.saturating_sub(content) / 2
}

fn render_menu(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2), // title
            Constraint::Min(1),
            Constraint::Length(1), // round selector
            Constraint::Length(1),
            Constraint::Length(1), // start hint
            Constraint::Min(1),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let title = Paragraph::new(vec![
        Line::from(Span::styled("Speedy Words!", bold_style.fg(YELLOW))),
        Line::from(Span::styled("A Wacky Reaction Game", Style::default().fg(TEAL))),
    ])
    .alignment(Alignment::Center);
    title.render(chunks[0], buf);

    let selected = app.engine.total_rounds();
    let mut spans = vec![Span::styled("Number of Rounds:  ", bold_style)];
    for choice in ROUND_CHOICES {
        if choice == selected {
            spans.push(Span::styled(
                format!("[{choice}]"),
                bold_style.fg(Color::White).bg(CORAL),
            ));
        } else {
            spans.push(Span::styled(
                format!(" {choice} "),
                Style::default().add_modifier(Modifier::DIM),
            ));
        }
        spans.push(Span::raw("  "));
    }
    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        "Start Game: press (enter)",
        bold_style.fg(Color::White).bg(DARK_TEAL),
    ))
    .alignment(Alignment::Center)
    .render(chunks[4], buf);

    Paragraph::new(Span::styled(
        "(←/→) rounds / (enter) start / (esc)ape",
        italic_style,
    ))
    .render(chunks[6], buf);
}

fn time_left_color(time_left: u8) -> Color {
    match time_left {
        3 => TEAL,
        2 => ORANGE,
        _ => CORAL,
    }
}

fn outcome_span(outcome: Option<RoundOutcome>) -> Span<'static> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    match outcome {
        Some(RoundOutcome::Hit {
            reaction_ms,
            points,
        }) => Span::styled(
            format!("{}  ({} ms)", signed(points), reaction_ms),
            bold_style.fg(Color::Green),
        ),
        Some(outcome @ RoundOutcome::Miss) => Span::styled(
            format!("{}  wrong key", signed(outcome.delta())),
            bold_style.fg(Color::Red),
        ),
        Some(outcome @ RoundOutcome::Timeout) => Span::styled(
            format!("{}  too slow", signed(outcome.delta())),
            bold_style.fg(Color::Red),
        ),
        None => Span::raw(""),
    }
}

fn render_playing(view: &GameView, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_bold_style = bold_style.add_modifier(Modifier::DIM);

    const CONTENT_ROWS: u16 = 9;
    let padding = centered_padding(area, CONTENT_ROWS + 1);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(padding),
            Constraint::Length(1), // word
            Constraint::Length(1),
            Constraint::Length(1), // time left + score
            Constraint::Length(1),
            Constraint::Length(1), // required key
            Constraint::Length(1),
            Constraint::Length(1), // round counter
            Constraint::Length(1), // last outcome
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let word = view.word.unwrap_or_default();
    Paragraph::new(Span::styled(
        word.to_uppercase(),
        bold_style.fg(YELLOW).add_modifier(Modifier::UNDERLINED),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Line::from(vec![
        Span::styled("Time Left: ", dim_bold_style),
        Span::styled(
            format!("{}s", view.time_left),
            bold_style.fg(time_left_color(view.time_left)),
        ),
        Span::raw("     "),
        Span::styled("Score: ", dim_bold_style),
        Span::styled(view.score.to_string(), bold_style),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    let key = view.required_key.map(String::from).unwrap_or_default();
    Paragraph::new(Span::styled(
        format!(" Press Key: {key} "),
        bold_style.fg(DARK_TEAL).bg(ORANGE),
    ))
    .alignment(Alignment::Center)
    .render(chunks[5], buf);

    Paragraph::new(Span::styled(
        format!("Round {} / {}", view.round_index, view.total_rounds),
        Style::default().fg(TEAL),
    ))
    .alignment(Alignment::Center)
    .render(chunks[7], buf);

    Paragraph::new(outcome_span(view.last_outcome))
        .alignment(Alignment::Center)
        .render(chunks[8], buf);

    Paragraph::new(Span::styled(
        "(esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[10], buf);
}

fn render_finished(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let magenta_style = Style::default().fg(Color::Magenta);

    let summary = app.engine.summary();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // game over
            Constraint::Length(1), // final score
            Constraint::Length(1),
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled("Game Over!", bold_style.fg(YELLOW)))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        format!("Final Score: {}", summary.score),
        bold_style.fg(CORAL),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let (rounds, lowest, highest) = charting::compute_chart_params(&summary.score_timeline);
    let points = charting::timeline_points(&summary.score_timeline);
    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(magenta_style)
        .graph_type(GraphType::Line)
        .data(&points)];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("round")
                .bounds([0.0, rounds])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(rounds), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("score")
                .bounds([lowest, highest])
                .labels(vec![
                    Span::styled(charting::format_label(lowest), bold_style),
                    Span::styled(charting::format_label(highest), bold_style),
                ]),
        );
    chart.render(chunks[3], buf);

    let reaction = match (summary.mean_reaction_ms, summary.best_reaction_ms) {
        (Some(mean), Some(best)) => format!(
            "   avg {:.0} ms   best {} ms   {:.1} sd",
            mean,
            best,
            summary.reaction_std_dev_ms.unwrap_or_default()
        ),
        _ => String::new(),
    };
    Paragraph::new(Span::styled(
        format!(
            "{} hits   {} misses   {} timeouts{}",
            summary.hits, summary.misses, summary.timeouts, reaction
        ),
        bold_style,
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[4], buf);

    Paragraph::new(Span::styled(
        "(p)lay again / (r)estart / (esc)ape",
        italic_style,
    ))
    .render(chunks[6], buf);
}
