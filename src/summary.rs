use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::operation::Operation;
use crate::question::AnswerRecord;
use crate::session::QuizConfig;
use crate::util::percentage;

/// Percentage from which the results screen celebrates
pub const CELEBRATION_THRESHOLD: u32 = 70;

/// Final, immutable record of a completed quiz session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub score: u32,
    pub total_questions: usize,
    pub percentage: u32,
    pub answer_log: Vec<AnswerRecord>,
    pub total_time_taken: u32,
    pub operation: Operation,
    pub player_name: String,
    pub timestamp: DateTime<Local>,
    pub config: QuizConfig,
}

pub fn build(answer_log: &[AnswerRecord], config: &QuizConfig, player_name: &str) -> SessionSummary {
    build_at(answer_log, config, player_name, Local::now())
}

pub fn build_at(
    answer_log: &[AnswerRecord],
    config: &QuizConfig,
    player_name: &str,
    timestamp: DateTime<Local>,
) -> SessionSummary {
    let score = answer_log.iter().filter(|r| r.is_correct).count() as u32;
    let total_questions = answer_log.len();

    SessionSummary {
        score,
        total_questions,
        percentage: percentage(score, total_questions),
        answer_log: answer_log.to_vec(),
        total_time_taken: answer_log.iter().map(|r| r.time_taken).sum(),
        operation: config.operation,
        player_name: player_name.to_string(),
        timestamp,
        config: config.clone(),
    }
}

impl SessionSummary {
    pub fn incorrect_count(&self) -> usize {
        self.answer_log
            .iter()
            .filter(|r| !r.is_correct && !r.timed_out())
            .count()
    }

    pub fn timed_out_count(&self) -> usize {
        self.answer_log.iter().filter(|r| r.timed_out()).count()
    }

    pub fn performance(&self) -> Performance {
        Performance::from_percentage(self.percentage)
    }

    pub fn certificate(&self) -> Certificate {
        Certificate {
            player_name: self.player_name.clone(),
            operation: self.operation,
            score: self.score,
            total_questions: self.total_questions,
            percentage: self.percentage,
            incorrect: self.incorrect_count(),
            timed_out: self.timed_out_count(),
            date: self.timestamp,
        }
    }
}

/// Read-only projection handed to certificate rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub player_name: String,
    pub operation: Operation,
    pub score: u32,
    pub total_questions: usize,
    pub percentage: u32,
    pub incorrect: usize,
    pub timed_out: usize,
    pub date: DateTime<Local>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Performance {
    KeepGoing,
    NiceTry,
    Good,
    Great,
    Excellent,
    Outstanding,
}

impl Performance {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            p if p >= 90 => Performance::Outstanding,
            80..=89 => Performance::Excellent,
            70..=79 => Performance::Great,
            60..=69 => Performance::Good,
            50..=59 => Performance::NiceTry,
            _ => Performance::KeepGoing,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Performance::Outstanding => "Outstanding! You're a math superstar!",
            Performance::Excellent => "Excellent work! Keep it up!",
            Performance::Great => "Great job! You're doing well!",
            Performance::Good => "Good effort! Practice makes perfect!",
            Performance::NiceTry => "Nice try! Keep practicing!",
            Performance::KeepGoing => "Don't give up! Every mistake helps you learn!",
        }
    }

    pub fn celebrate(&self) -> bool {
        *self >= Performance::Great
    }
}
