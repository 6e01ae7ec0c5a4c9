pub mod history;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, LineGauge, Paragraph, Row, Table, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use mathdash::{
    celebration::Celebration,
    question::{Answer, AnswerRecord},
    quiz::Quiz,
    summary::SessionSummary,
    util::format_secs,
};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

const CONFETTI_COLORS: [Color; 7] = [
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
    Color::Green,
    Color::Red,
    Color::Blue,
    Color::LightYellow,
];

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match (&self.state, self.engine.quiz(), self.engine.last_summary()) {
            (AppState::Results, _, Some(summary)) => {
                render_results(summary, area, buf);
                if self.celebration.is_active {
                    render_celebration(&self.celebration, area, buf);
                }
            }
            (_, Some(quiz), _) => render_quiz(quiz, area, buf),
            _ => {
                Paragraph::new("No quiz running. Press (esc) to quit.")
                    .alignment(Alignment::Center)
                    .render(area, buf);
            }
        }
    }
}

fn render_quiz(quiz: &Quiz, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let green_bold_style = bold_style.fg(Color::Green);
    let red_bold_style = bold_style.fg(Color::Red);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // progress
            Constraint::Length(1), // timer
            Constraint::Min(0),
            Constraint::Length(3), // prompt
            Constraint::Length(1),
            Constraint::Length(4), // choices
            Constraint::Length(1),
            Constraint::Length(1), // feedback
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let config = quiz.config();
    let progress = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(
                "Question {}/{}",
                quiz.current_index() + 1,
                quiz.total_questions()
            ),
            bold_style,
        ),
        Span::raw("   "),
        Span::styled(format!("Score {}", quiz.score()), green_bold_style),
        Span::raw("   "),
        Span::styled(config.operation.to_string(), dim_style),
    ]))
    .alignment(Alignment::Center);
    progress.render(chunks[0], buf);

    let ratio = match config.time_per_question {
        0 => 0.0,
        total => quiz.time_left() as f64 / total as f64,
    };
    let timer_color = if quiz.time_left() <= 3 {
        Color::Red
    } else {
        Color::Cyan
    };
    LineGauge::default()
        .filled_style(Style::default().fg(timer_color))
        .label(format!("{:>2}s", quiz.time_left()))
        .ratio(ratio.clamp(0.0, 1.0))
        .render(chunks[1], buf);

    let question = quiz.current_question();
    let prompt = format!("{} = ?", question.prompt);
    Paragraph::new(Span::styled(prompt, bold_style.fg(Color::Yellow)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .render(chunks[3], buf);

    let selected = quiz.selected();
    let choice_lines: Vec<Line> = question
        .choices
        .iter()
        .enumerate()
        .map(|(idx, &value)| {
            let text = format!("({}) {:>5}", idx + 1, value);
            let style = if !quiz.feedback_visible() {
                bold_style
            } else if value == question.correct_answer {
                green_bold_style
            } else if selected == Some(Answer::Choice(value)) {
                red_bold_style
            } else {
                dim_style
            };
            Line::from(Span::styled(text, style))
        })
        .collect();
    Paragraph::new(choice_lines)
        .alignment(Alignment::Center)
        .render(chunks[5], buf);

    let feedback = match selected {
        Some(Answer::Choice(v)) if question.is_correct(v) => {
            Span::styled("Correct!", green_bold_style)
        }
        Some(Answer::Choice(_)) => Span::styled(
            format!("Not quite. The answer is {}", question.correct_answer),
            red_bold_style,
        ),
        Some(Answer::TimedOut) => Span::styled(
            format!("Time's up! The answer is {}", question.correct_answer),
            red_bold_style,
        ),
        None => Span::raw(""),
    };
    Paragraph::new(feedback)
        .alignment(Alignment::Center)
        .render(chunks[7], buf);

    Paragraph::new(Span::styled(
        "(1-4) answer / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[9], buf);
}

fn render_results(summary: &SessionSummary, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Length(1), // score
            Constraint::Length(1), // breakdown
            Constraint::Length(1), // performance message
            Constraint::Length(1), // padding
            Constraint::Min(1),    // answer review
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(
        format!("Quiz complete, {}!", summary.player_name),
        bold_style.fg(Color::Cyan),
    ))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    let score_color = if summary.performance().celebrate() {
        Color::Green
    } else {
        Color::Yellow
    };
    Paragraph::new(Span::styled(
        format!(
            "{}/{} correct   {}%   {} {}   {}",
            summary.score,
            summary.total_questions,
            summary.percentage,
            summary.operation,
            summary.operation.symbol(),
            format_secs(summary.total_time_taken)
        ),
        bold_style.fg(score_color),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let certificate = summary.certificate();
    Paragraph::new(format!(
        "{} incorrect   {} timed out   {}",
        certificate.incorrect,
        certificate.timed_out,
        certificate.date.format("%Y-%m-%d %H:%M")
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    Paragraph::new(Span::styled(summary.performance().message(), italic_style))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[3], buf);

    let prompt_width = summary
        .answer_log
        .iter()
        .map(|r| r.prompt.width())
        .max()
        .unwrap_or(8)
        .max(8) as u16;

    let rows: Vec<Row> = summary.answer_log.iter().map(review_row).collect();
    let header = Row::new(vec!["#", "Question", "Yours", "Answer", "Time"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );
    Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(prompt_width + 2),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Min(5),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title("Answers"))
    .column_spacing(2)
    .render(chunks[5], buf);

    Paragraph::new(Span::styled(
        "(r)eplay / (h)istory / (esc)ape",
        italic_style,
    ))
    .render(chunks[7], buf);
}

fn review_row(record: &AnswerRecord) -> Row<'static> {
    let (yours, style) = match record.user_answer {
        Answer::Choice(v) if record.is_correct => {
            (format!("{} ✓", v), Style::default().fg(Color::Green))
        }
        Answer::Choice(v) => (format!("{} ✗", v), Style::default().fg(Color::Red)),
        Answer::TimedOut => ("—".to_string(), Style::default().fg(Color::Red)),
    };
    Row::new(vec![
        Cell::from((record.question_index + 1).to_string()),
        Cell::from(record.prompt.clone()),
        Cell::from(yours).style(style),
        Cell::from(record.correct_answer.to_string())
            .style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(format_secs(record.time_taken)),
    ])
}

/// Confetti and headline on top of the results screen
fn render_celebration(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    for particle in celebration.visible() {
        let (x, y) = (particle.x as u16, particle.y as u16);
        if x >= area.width || y >= area.height {
            continue;
        }
        let color = CONFETTI_COLORS[particle.color_index % CONFETTI_COLORS.len()];
        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_symbol(&particle.symbol.to_string());
            cell.set_style(Style::default().fg(color).add_modifier(Modifier::BOLD));
        }
    }

    let headline = celebration.headline;
    let width = headline.width() as u16;
    if width < area.width && area.height > 2 {
        let x = area.x + (area.width - width) / 2;
        buf.set_string(
            x,
            area.y + 1,
            headline,
            Style::default()
                .fg(Color::LightYellow)
                .add_modifier(Modifier::BOLD),
        );
    }
}
