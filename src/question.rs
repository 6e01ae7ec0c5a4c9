use serde::{Deserialize, Serialize};

/// One multiple-choice arithmetic question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub correct_answer: u32,
    pub choices: [u32; 4],
}

impl Question {
    pub fn is_correct(&self, value: u32) -> bool {
        value == self.correct_answer
    }

    /// Position of the correct answer among the shuffled choices
    pub fn correct_choice_index(&self) -> Option<usize> {
        self.choices.iter().position(|&c| c == self.correct_answer)
    }
}

/// What the player did with a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Choice(u32),
    TimedOut,
}

impl Answer {
    pub fn value(&self) -> Option<u32> {
        match self {
            Answer::Choice(v) => Some(*v),
            Answer::TimedOut => None,
        }
    }
}

/// Outcome of a single question, appended once and never changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_index: usize,
    pub prompt: String,
    pub correct_answer: u32,
    pub user_answer: Answer,
    pub is_correct: bool,
    pub time_taken: u32,
}

impl AnswerRecord {
    pub fn timed_out(&self) -> bool {
        self.user_answer == Answer::TimedOut
    }
}
