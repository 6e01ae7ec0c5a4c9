use std::cmp::Ordering;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use mathdash::{
    history::{filter_by_operation, HistoryStats},
    summary::SessionSummary,
    util::format_secs,
};

use crate::{App, HistoryViewState, SortBy};

/// Entries after the operation filter, in the chosen order
pub fn visible_entries(state: &HistoryViewState) -> Vec<SessionSummary> {
    let mut entries = filter_by_operation(state.entries.clone(), state.filter);
    entries.sort_by(|a, b| {
        let cmp = match state.sort_by {
            SortBy::Date => a.timestamp.cmp(&b.timestamp),
            SortBy::Operation => a.operation.cmp(&b.operation),
            SortBy::Score => a
                .percentage
                .cmp(&b.percentage)
                .then(a.score.cmp(&b.score)),
            SortBy::Time => a.total_time_taken.cmp(&b.total_time_taken),
        };
        if state.sort_ascending {
            cmp
        } else {
            cmp.reverse()
        }
    });
    entries
}

/// Pure presenter for a single history row
pub fn present_row(entry: &SessionSummary) -> Row<'static> {
    let score_color = match entry.percentage {
        p if p >= 80 => Color::Green,
        p if p >= 50 => Color::Yellow,
        _ => Color::Red,
    };

    Row::new(vec![
        Cell::from(entry.timestamp.format("%Y-%m-%d %H:%M").to_string()),
        Cell::from(format!(
            "{} {}",
            entry.operation.symbol(),
            entry.operation
        )),
        Cell::from(format!(
            "{}/{} ({}%)",
            entry.score, entry.total_questions, entry.percentage
        ))
        .style(Style::default().fg(score_color)),
        Cell::from(format_secs(entry.total_time_taken)),
        Cell::from(entry.player_name.clone()),
    ])
}

/// Render the quiz history screen
pub fn render_history(app: &mut App, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(1), // Aggregate stats
            Constraint::Min(0),    // History table
            Constraint::Length(3), // Instructions
        ])
        .split(area);

    let state = &mut app.history_state;
    let sort_direction = if state.sort_ascending { "↑" } else { "↓" };
    let filter_text = state
        .filter
        .map(|op| op.to_string())
        .unwrap_or_else(|| "All".to_string());
    let title_text = format!(
        "Quiz History (Filter: {filter_text}, Sort: {} {sort_direction})",
        state.sort_by
    );

    let title = Paragraph::new(title_text)
        .block(Block::default().borders(Borders::ALL).title("History"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let entries = visible_entries(state);
    let stats = HistoryStats::from_entries(&entries);
    let favorite = stats
        .favorite_operation
        .map(|op| op.to_string())
        .unwrap_or_else(|| "—".to_string());
    let stats_text = format!(
        "Quizzes: {}   Average: {}%   Best: {}%   Favorite: {}   Time: {}",
        stats.total_quizzes,
        stats.average_percentage,
        stats.best_percentage,
        favorite,
        format_secs(stats.total_time_secs)
    );
    f.render_widget(
        Paragraph::new(stats_text).alignment(Alignment::Center),
        chunks[1],
    );

    if entries.is_empty() {
        let no_data = Paragraph::new("No quizzes recorded yet. Finish a quiz to see it here.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(no_data, chunks[2]);
    } else {
        let table_height = chunks[2].height.saturating_sub(3) as usize; // borders + header
        let max_scroll = entries.len().saturating_sub(table_height);
        if state.scroll_offset > max_scroll {
            state.scroll_offset = max_scroll;
        }

        let indicator = |column: SortBy| {
            if state.sort_by == column {
                sort_direction
            } else {
                ""
            }
        };
        let header = Row::new(vec![
            Cell::from(format!("Date {}", indicator(SortBy::Date))),
            Cell::from(format!("Operation {}", indicator(SortBy::Operation))),
            Cell::from(format!("Score {}", indicator(SortBy::Score))),
            Cell::from(format!("Time {}", indicator(SortBy::Time))),
            Cell::from("Player"),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = entries
            .iter()
            .skip(state.scroll_offset)
            .take(table_height)
            .map(present_row)
            .collect();

        let widths = [
            Constraint::Length(18),
            Constraint::Length(18),
            Constraint::Length(16),
            Constraint::Length(10),
            Constraint::Min(8),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Sessions"))
            .column_spacing(2);
        f.render_widget(table, chunks[2]);
    }

    let instructions = Paragraph::new(
        "(↑/↓) scroll  (PgUp/PgDn) page  (1-4) sort  (space) direction  (f) filter  (b) back  (esc) quit",
    )
    .alignment(Alignment::Center)
    .wrap(ratatui::widgets::Wrap { trim: true });
    f.render_widget(instructions, chunks[3]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Local, TimeZone};
    use mathdash::{
        operation::Operation,
        question::{Answer, AnswerRecord},
        session::QuizConfig,
        summary::build_at,
    };

    fn entry(op: Operation, correct: usize, total: usize, minutes: i64) -> SessionSummary {
        let log: Vec<_> = (0..total)
            .map(|i| AnswerRecord {
                question_index: i,
                prompt: format!("q{}", i),
                correct_answer: 1,
                user_answer: Answer::Choice(1),
                is_correct: i < correct,
                time_taken: 3,
            })
            .collect();
        let at = Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
            + ChronoDuration::minutes(minutes);
        build_at(&log, &QuizConfig::new(op), "Ada", at)
    }

    fn state_with(entries: Vec<SessionSummary>) -> HistoryViewState {
        HistoryViewState {
            entries,
            ..HistoryViewState::default()
        }
    }

    #[test]
    fn default_order_is_newest_first() {
        let state = state_with(vec![
            entry(Operation::Addition, 1, 2, 0),
            entry(Operation::Division, 2, 2, 10),
            entry(Operation::Addition, 0, 2, 5),
        ]);
        let minutes: Vec<_> = visible_entries(&state)
            .iter()
            .map(|e| e.timestamp)
            .collect();
        assert!(minutes.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn sort_by_score_ascending() {
        let mut state = state_with(vec![
            entry(Operation::Addition, 2, 2, 0),
            entry(Operation::Addition, 0, 2, 1),
            entry(Operation::Addition, 1, 2, 2),
        ]);
        state.sort_by = SortBy::Score;
        state.sort_ascending = true;
        let scores: Vec<_> = visible_entries(&state)
            .iter()
            .map(|e| e.percentage)
            .collect();
        assert_eq!(scores, vec![0, 50, 100]);
    }

    #[test]
    fn filter_limits_rows() {
        let mut state = state_with(vec![
            entry(Operation::Addition, 1, 2, 0),
            entry(Operation::Division, 2, 2, 1),
        ]);
        state.filter = Some(Operation::Division);
        let entries = visible_entries(&state);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, Operation::Division);
    }

    #[test]
    fn present_row_builds() {
        let _row = present_row(&entry(Operation::Multiplication, 3, 4, 0));
    }
}
