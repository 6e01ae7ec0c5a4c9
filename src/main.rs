mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin, Write},
    path::PathBuf,
    time::{Duration, Instant},
};

use mathdash::{
    celebration::Celebration,
    config::{Config, ConfigStore, FileConfigStore},
    engine::Engine,
    error::QuizError,
    history::{export_csv, filter_by_operation, HistoryStats, HistoryStore, MemoryHistory, SqliteHistory},
    operation::Operation,
    runtime::{CrosstermEventSource, FixedTicker, QuizEvent, Runner},
    session::QuizConfig,
    summary::SessionSummary,
    tables::TimesTable,
    util::format_secs,
};

use crate::ui::screen::current_screen;

const TICK_RATE_MS: u64 = 100;

/// timed arithmetic quizzes for kids, with scored results and history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Timed multiple-choice arithmetic quizzes in the terminal. Settings given on the command line are remembered for the next run."
)]
pub struct Cli {
    /// arithmetic operation to practice
    #[clap(short = 'o', long, value_enum)]
    operation: Option<Operation>,

    /// digits per operand for addition and subtraction (1-4)
    #[clap(short = 'd', long)]
    digits: Option<u32>,

    /// number of questions in the quiz (1-100)
    #[clap(short = 'n', long)]
    questions: Option<usize>,

    /// seconds allowed per question (1-60)
    #[clap(short = 't', long = "time")]
    time_per_question: Option<u32>,

    /// tables to draw from for multiplication and division, e.g. 2,3,5
    #[clap(long, value_delimiter = ',')]
    tables: Option<Vec<u32>>,

    /// name shown on results and stored with history
    #[clap(long)]
    name: Option<String>,

    /// seed for reproducible question lists
    #[clap(long)]
    seed: Option<u64>,

    /// print quiz history and aggregate stats, then exit
    #[clap(long)]
    history: bool,

    /// only show history for this operation
    #[clap(long, value_enum, requires = "history")]
    filter: Option<Operation>,

    /// write quiz history as CSV to PATH, then exit
    #[clap(long, value_name = "PATH")]
    export_history: Option<PathBuf>,

    /// delete all stored quiz history, then exit
    #[clap(long)]
    clear_history: bool,

    /// print the multiplication table for N (1-20), then exit
    #[clap(long, value_name = "N")]
    times_table: Option<u32>,
}

impl Cli {
    /// Command line values override the remembered settings
    fn merge(&self, stored: Config) -> Config {
        let mut merged = stored;
        if let Some(op) = self.operation {
            merged.operation = op;
        }
        if let Some(digits) = self.digits {
            merged.digits = digits;
        }
        if let Some(questions) = self.questions {
            merged.questions = questions;
        }
        if let Some(secs) = self.time_per_question {
            merged.time_per_question = secs;
        }
        if let Some(tables) = &self.tables {
            merged.tables = tables.clone();
        }
        if let Some(name) = &self.name {
            merged.player_name = name.trim().to_string();
        }
        merged
    }

    fn is_one_shot(&self) -> bool {
        self.history
            || self.clear_history
            || self.export_history.is_some()
            || self.times_table.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Quiz,
    Results,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SortBy {
    Date,
    Operation,
    Score,
    Time,
}

#[derive(Debug)]
pub struct HistoryViewState {
    pub entries: Vec<SessionSummary>,
    pub scroll_offset: usize,
    pub sort_by: SortBy,
    pub sort_ascending: bool,
    pub filter: Option<Operation>,
}

impl Default for HistoryViewState {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            scroll_offset: 0,
            sort_by: SortBy::Date,
            sort_ascending: false,
            filter: None,
        }
    }
}

/// Cycle All -> Addition -> ... -> Division -> All
fn next_filter(filter: Option<Operation>) -> Option<Operation> {
    match filter {
        None => Some(Operation::ALL[0]),
        Some(op) if op == Operation::ALL[Operation::ALL.len() - 1] => None,
        Some(op) => Some(op.next()),
    }
}

pub struct App {
    pub engine: Engine<Box<dyn HistoryStore>>,
    pub state: AppState,
    pub history_state: HistoryViewState,
    pub celebration: Celebration,
}

impl App {
    pub fn new(engine: Engine<Box<dyn HistoryStore>>) -> Self {
        Self {
            engine,
            state: AppState::Quiz,
            history_state: HistoryViewState::default(),
            celebration: Celebration::new(),
        }
    }

    pub fn start(&mut self, config: QuizConfig, player: &str, now: Instant) -> Result<(), QuizError> {
        self.engine.start(config, player, now)?;
        self.state = AppState::Quiz;
        self.celebration.stop();
        Ok(())
    }

    /// Same settings, fresh questions
    pub fn replay(&mut self, now: Instant) -> Result<(), QuizError> {
        if let Some(started) = self.engine.replay(now) {
            started?;
            self.state = AppState::Quiz;
            self.celebration.stop();
        }
        Ok(())
    }

    pub fn choose(&mut self, index: usize, now: Instant, width: u16, height: u16) {
        if let Some(token) = self.engine.current_token() {
            self.engine.choose(token, index, now);
            self.sync_finished(width, height);
        }
    }

    pub fn on_tick(&mut self, now: Instant, width: u16, height: u16) {
        self.engine.pump(now);
        self.sync_finished(width, height);
        self.celebration.update(TICK_RATE_MS as f64 / 1000.0);
    }

    pub fn open_history(&mut self) {
        self.history_state.entries = match self.engine.history().recent() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("could not load quiz history: {}", e);
                Vec::new()
            }
        };
        self.history_state.scroll_offset = 0;
        self.state = AppState::History;
    }

    pub fn close_history(&mut self) {
        self.state = if self.engine.last_summary().is_some() {
            AppState::Results
        } else {
            AppState::Quiz
        };
    }

    fn sync_finished(&mut self, width: u16, height: u16) {
        if self.state != AppState::Quiz {
            return;
        }
        let finished = self.engine.quiz().map_or(false, |q| q.has_finished());
        if let (true, Some(summary)) = (finished, self.engine.last_summary()) {
            self.celebration.start_for(summary, width, height);
            self.state = AppState::Results;
        }
    }
}

#[derive(Debug, PartialEq)]
enum ExitType {
    Continue,
    Quit,
}

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    if cli.is_one_shot() {
        return run_one_shot(&cli);
    }

    let store = FileConfigStore::new();
    let settings = cli.merge(store.load());
    let config = settings.quiz_config();
    if let Err(e) = config.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, e).exit();
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Err(e) = store.save(&settings) {
        warn!("could not save settings: {}", e);
    }

    let history: Box<dyn HistoryStore> = match SqliteHistory::open_default() {
        Ok(db) => Box::new(db),
        Err(e) => {
            warn!("history unavailable, this session will not be saved: {}", e);
            Box::new(MemoryHistory::new())
        }
    };
    let engine = match cli.seed {
        Some(seed) => Engine::seeded(history, seed),
        None => Engine::new(history),
    };
    let mut app = App::new(engine);
    app.start(config, &settings.player_name, Instant::now())?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn run_one_shot(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let mut out = io::stdout().lock();

    if let Some(n) = cli.times_table {
        match TimesTable::new(n) {
            Ok(table) => write!(out, "{}", table)?,
            Err(e) => Cli::command().error(ErrorKind::ValueValidation, e).exit(),
        }
    }

    if !(cli.history || cli.clear_history || cli.export_history.is_some()) {
        return Ok(());
    }

    let mut history = SqliteHistory::open_default()?;

    if let Some(path) = &cli.export_history {
        let entries = history.recent()?;
        export_csv(&entries, File::create(path)?)?;
        writeln!(out, "exported {} quizzes to {}", entries.len(), path.display())?;
    }

    if cli.history {
        print_history(history.recent()?, cli.filter, &mut out)?;
    }

    if cli.clear_history {
        history.clear()?;
        info!("quiz history cleared");
        writeln!(out, "quiz history cleared")?;
    }

    Ok(())
}

fn print_history<W: Write>(
    entries: Vec<SessionSummary>,
    filter: Option<Operation>,
    out: &mut W,
) -> io::Result<()> {
    let entries = filter_by_operation(entries, filter);
    if entries.is_empty() {
        return writeln!(out, "No quizzes recorded yet.");
    }

    let stats = HistoryStats::from_entries(&entries);
    writeln!(
        out,
        "Quizzes: {}   Average: {}%   Best: {}%   Favorite: {}   Time: {}",
        stats.total_quizzes,
        stats.average_percentage,
        stats.best_percentage,
        stats
            .favorite_operation
            .map(|op| op.to_string())
            .unwrap_or_else(|| "-".to_string()),
        format_secs(stats.total_time_secs)
    )?;
    writeln!(out)?;

    for entry in &entries {
        writeln!(
            out,
            "{}  {} {:<15} {:>3}/{:<3} ({:>3}%)  {:>7}  {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.operation.symbol(),
            entry.operation.to_string(),
            entry.score,
            entry.total_questions,
            entry.percentage,
            format_secs(entry.total_time_taken),
            entry.player_name
        )?;
    }
    Ok(())
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| ui(app, f))?;

        let size = terminal.size().unwrap_or_default();
        match runner.step() {
            QuizEvent::Tick => app.on_tick(Instant::now(), size.width, size.height),
            QuizEvent::Resize => {}
            QuizEvent::Key(key) => {
                if handle_key(app, key, Instant::now(), size.width, size.height)? == ExitType::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn handle_key(
    app: &mut App,
    key: KeyEvent,
    now: Instant,
    width: u16,
    height: u16,
) -> Result<ExitType, QuizError> {
    if key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
    {
        return Ok(ExitType::Quit);
    }

    match app.state {
        AppState::Quiz => {
            if let KeyCode::Char(c @ '1'..='4') = key.code {
                let index = c as usize - '1' as usize;
                app.choose(index, now, width, height);
            }
        }
        AppState::Results => match key.code {
            KeyCode::Char('r') => app.replay(now)?,
            KeyCode::Char('h') => app.open_history(),
            _ => {}
        },
        AppState::History => {
            if matches!(key.code, KeyCode::Char('b') | KeyCode::Backspace) {
                app.close_history();
                return Ok(ExitType::Continue);
            }
            let view = &mut app.history_state;
            match key.code {
                KeyCode::Up => view.scroll_offset = view.scroll_offset.saturating_sub(1),
                // Will check max scroll in render function
                KeyCode::Down => view.scroll_offset += 1,
                KeyCode::PageUp => view.scroll_offset = view.scroll_offset.saturating_sub(10),
                KeyCode::PageDown => view.scroll_offset += 10,
                KeyCode::Home => view.scroll_offset = 0,
                KeyCode::Char(c @ '1'..='4') => {
                    view.sort_by = match c {
                        '1' => SortBy::Date,
                        '2' => SortBy::Operation,
                        '3' => SortBy::Score,
                        _ => SortBy::Time,
                    };
                    view.scroll_offset = 0;
                }
                KeyCode::Char(' ') => {
                    view.sort_ascending = !view.sort_ascending;
                    view.scroll_offset = 0;
                }
                KeyCode::Char('f') => {
                    view.filter = next_filter(view.filter);
                    view.scroll_offset = 0;
                }
                _ => {}
            }
        }
    }
    Ok(ExitType::Continue)
}

fn ui(app: &mut App, f: &mut Frame) {
    let screen = current_screen(&app.state);
    screen.render(app, f);
}
