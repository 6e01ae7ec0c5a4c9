use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use itertools::Itertools;
use log::debug;
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::app_dirs::AppDirs;
use crate::error::HistoryError;
use crate::operation::Operation;
use crate::question::AnswerRecord;
use crate::session::QuizConfig;
use crate::summary::SessionSummary;
use crate::util::mean;

/// Number of completed sessions kept; older ones are evicted first
pub const HISTORY_LIMIT: usize = 50;

/// Ordered store of completed quiz sessions
pub trait HistoryStore {
    fn append(&mut self, summary: &SessionSummary) -> Result<(), HistoryError>;
    /// All kept sessions, newest first
    fn recent(&self) -> Result<Vec<SessionSummary>, HistoryError>;
    fn clear(&mut self) -> Result<(), HistoryError>;
}

impl<H: HistoryStore + ?Sized> HistoryStore for Box<H> {
    fn append(&mut self, summary: &SessionSummary) -> Result<(), HistoryError> {
        (**self).append(summary)
    }

    fn recent(&self) -> Result<Vec<SessionSummary>, HistoryError> {
        (**self).recent()
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        (**self).clear()
    }
}

/// History kept in a SQLite database
#[derive(Debug)]
pub struct SqliteHistory {
    conn: Connection,
    limit: usize,
}

impl SqliteHistory {
    /// Open the history database at the default state location
    pub fn open_default() -> Result<Self, HistoryError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("mathdash_history.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HistoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!("opening history database at {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, HistoryError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, HistoryError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS quiz_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player_name TEXT NOT NULL,
                operation TEXT NOT NULL,
                score INTEGER NOT NULL,
                total_questions INTEGER NOT NULL,
                percentage INTEGER NOT NULL,
                total_time_secs INTEGER NOT NULL,
                answers TEXT NOT NULL,
                settings TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
            [],
        )?;

        Ok(Self {
            conn,
            limit: HISTORY_LIMIT,
        })
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn len(&self) -> Result<usize, HistoryError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM quiz_history", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, HistoryError> {
        Ok(self.len()? == 0)
    }
}

type HistoryRow = (String, String, u32, i64, u32, u32, String, String, String);

fn summary_from_row(row: HistoryRow) -> Result<SessionSummary, HistoryError> {
    let (player_name, operation, score, total, percentage, time, answers, settings, timestamp) =
        row;

    let operation = Operation::from_name(&operation)
        .ok_or_else(|| HistoryError::Corrupt(format!("unknown operation '{}'", operation)))?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|e| HistoryError::Corrupt(format!("bad timestamp '{}': {}", timestamp, e)))?
        .with_timezone(&Local);
    let answer_log: Vec<AnswerRecord> = serde_json::from_str(&answers)?;
    let config: QuizConfig = serde_json::from_str(&settings)?;

    Ok(SessionSummary {
        score,
        total_questions: total as usize,
        percentage,
        answer_log,
        total_time_taken: time,
        operation,
        player_name,
        timestamp,
        config,
    })
}

impl HistoryStore for SqliteHistory {
    fn append(&mut self, summary: &SessionSummary) -> Result<(), HistoryError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO quiz_history
            (player_name, operation, score, total_questions, percentage, total_time_secs,
             answers, settings, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                summary.player_name,
                summary.operation.name(),
                summary.score,
                summary.total_questions as i64,
                summary.percentage,
                summary.total_time_taken,
                serde_json::to_string(&summary.answer_log)?,
                serde_json::to_string(&summary.config)?,
                summary.timestamp.to_rfc3339(),
            ],
        )?;
        let evicted = tx.execute(
            r#"
            DELETE FROM quiz_history
            WHERE id NOT IN (SELECT id FROM quiz_history ORDER BY id DESC LIMIT ?1)
            "#,
            params![self.limit as i64],
        )?;
        tx.commit()?;

        if evicted > 0 {
            debug!("evicted {} old history entries", evicted);
        }
        Ok(())
    }

    fn recent(&self) -> Result<Vec<SessionSummary>, HistoryError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT player_name, operation, score, total_questions, percentage,
                   total_time_secs, answers, settings, timestamp
            FROM quiz_history
            ORDER BY id DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| -> rusqlite::Result<HistoryRow> {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(summary_from_row(row?)?);
        }
        Ok(entries)
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        self.conn.execute("DELETE FROM quiz_history", [])?;
        Ok(())
    }
}

/// History kept only for the lifetime of the process
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: VecDeque<SessionSummary>,
    limit: usize,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
            limit: HISTORY_LIMIT,
        }
    }
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HistoryStore for MemoryHistory {
    fn append(&mut self, summary: &SessionSummary) -> Result<(), HistoryError> {
        self.entries.push_front(summary.clone());
        self.entries.truncate(self.limit);
        Ok(())
    }

    fn recent(&self) -> Result<Vec<SessionSummary>, HistoryError> {
        Ok(self.entries.iter().cloned().collect())
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        self.entries.clear();
        Ok(())
    }
}

/// Aggregates shown on the history dashboard
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryStats {
    pub total_quizzes: usize,
    pub average_percentage: u32,
    pub best_percentage: u32,
    pub favorite_operation: Option<Operation>,
    pub total_time_secs: u32,
}

impl HistoryStats {
    /// Stats over `entries`, which are expected newest first
    pub fn from_entries(entries: &[SessionSummary]) -> Self {
        let percentages: Vec<f64> = entries.iter().map(|e| e.percentage as f64).collect();
        let counts: HashMap<Operation, usize> = entries.iter().map(|e| e.operation).counts();

        // ties go to the operation played most recently
        let favorite_operation = entries
            .iter()
            .map(|e| e.operation)
            .unique()
            .collect_vec()
            .into_iter()
            .rev()
            .max_by_key(|op| counts.get(op).copied().unwrap_or(0));

        Self {
            total_quizzes: entries.len(),
            average_percentage: mean(&percentages).map_or(0, |m| m.round() as u32),
            best_percentage: entries.iter().map(|e| e.percentage).max().unwrap_or(0),
            favorite_operation,
            total_time_secs: entries.iter().map(|e| e.total_time_taken).sum(),
        }
    }
}

/// Keep only entries for `operation`, or everything when `None`
pub fn filter_by_operation(
    entries: Vec<SessionSummary>,
    operation: Option<Operation>,
) -> Vec<SessionSummary> {
    match operation {
        Some(op) => entries.into_iter().filter(|e| e.operation == op).collect(),
        None => entries,
    }
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    date: String,
    player: &'a str,
    operation: &'static str,
    score: u32,
    total_questions: usize,
    percentage: u32,
    time_secs: u32,
    timed_out: usize,
}

/// Write one CSV row per session, with a header
pub fn export_csv<W: Write>(entries: &[SessionSummary], writer: W) -> Result<(), HistoryError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for entry in entries {
        wtr.serialize(CsvRow {
            date: entry.timestamp.to_rfc3339(),
            player: &entry.player_name,
            operation: entry.operation.name(),
            score: entry.score,
            total_questions: entry.total_questions,
            percentage: entry.percentage,
            time_secs: entry.total_time_taken,
            timed_out: entry.timed_out_count(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}
