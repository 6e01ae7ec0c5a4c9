use thiserror::Error;

use crate::operation::Operation;

/// A quiz setting outside the range the generator supports
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} needs at least one number selected")]
    EmptyOperandPool(Operation),
    #[error("table number {0} is out of range (1-20)")]
    OperandOutOfRange(u32),
    #[error("digit count {0} is out of range (1-4)")]
    DigitCountOutOfRange(u32),
    #[error("question count {0} is out of range (1-100)")]
    QuestionCountOutOfRange(usize),
    #[error("time per question {0}s is out of range (1-60)")]
    TimeOutOfRange(u32),
}

/// Errors raised before a quiz session can start
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
    #[error("could only generate {produced} unique questions out of {requested}")]
    GenerationExhausted { requested: usize, produced: usize },
}

/// Errors from the quiz history store
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("history encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("history export error: {0}")]
    Csv(#[from] csv::Error),
    #[error("history io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt history entry: {0}")]
    Corrupt(String),
}
