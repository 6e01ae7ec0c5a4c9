use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::operation::Operation;

pub const MIN_OPERAND: u32 = 1;
pub const MAX_OPERAND: u32 = 20;
pub const MAX_DIGITS: u32 = 4;
pub const MAX_QUESTIONS: usize = 100;
pub const MAX_SECS_PER_QUESTION: u32 = 60;

/// Settings for one quiz session.
///
/// A running quiz owns its own copy, so changing settings always means
/// starting a new session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizConfig {
    pub operation: Operation,
    /// Tables used as one operand for multiplication and division
    pub operand_pool: Vec<u32>,
    /// Operand magnitude for addition and subtraction
    pub digit_count: u32,
    pub question_count: usize,
    pub time_per_question: u32,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            operation: Operation::Addition,
            operand_pool: (1..=10).collect(),
            digit_count: 2,
            question_count: 10,
            time_per_question: 10,
        }
    }
}

impl QuizConfig {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            ..Self::default()
        }
    }

    /// Replace the operand pool; stored sorted and without duplicates
    pub fn with_operand_pool<I: IntoIterator<Item = u32>>(mut self, pool: I) -> Self {
        let mut pool: Vec<u32> = pool.into_iter().collect();
        pool.sort_unstable();
        pool.dedup();
        self.operand_pool = pool;
        self
    }

    pub fn with_digit_count(mut self, digit_count: u32) -> Self {
        self.digit_count = digit_count;
        self
    }

    pub fn with_question_count(mut self, question_count: usize) -> Self {
        self.question_count = question_count;
        self
    }

    pub fn with_time_per_question(mut self, secs: u32) -> Self {
        self.time_per_question = secs;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.operation.uses_operand_pool() {
            if self.operand_pool.is_empty() {
                return Err(ConfigError::EmptyOperandPool(self.operation));
            }
            if let Some(&bad) = self
                .operand_pool
                .iter()
                .find(|n| !(MIN_OPERAND..=MAX_OPERAND).contains(*n))
            {
                return Err(ConfigError::OperandOutOfRange(bad));
            }
        }
        if !(1..=MAX_DIGITS).contains(&self.digit_count) {
            return Err(ConfigError::DigitCountOutOfRange(self.digit_count));
        }
        if !(1..=MAX_QUESTIONS).contains(&self.question_count) {
            return Err(ConfigError::QuestionCountOutOfRange(self.question_count));
        }
        if !(1..=MAX_SECS_PER_QUESTION).contains(&self.time_per_question) {
            return Err(ConfigError::TimeOutOfRange(self.time_per_question));
        }
        Ok(())
    }
}
