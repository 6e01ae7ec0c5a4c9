use std::collections::HashSet;

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::QuizError;
use crate::operation::Operation;
use crate::question::Question;
use crate::session::QuizConfig;

/// Redraw budget per requested question before giving up
pub const ATTEMPTS_PER_QUESTION: usize = 20;

const CHOICE_COUNT: usize = 4;
const DISTRACTOR_ATTEMPTS: usize = 200;
const MAX_FACTOR: u32 = 10;

/// Builds question lists from a quiz configuration
pub struct QuestionGenerator<R: Rng> {
    rng: R,
}

impl QuestionGenerator<StdRng> {
    /// Reproducible generator: the same seed and config give the same list
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> QuestionGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Generate exactly `question_count` questions with distinct prompts
    pub fn generate(&mut self, config: &QuizConfig) -> Result<Vec<Question>, QuizError> {
        config.validate()?;

        let requested = config.question_count;
        let max_attempts = requested * ATTEMPTS_PER_QUESTION;
        let mut seen = HashSet::with_capacity(requested);
        let mut questions = Vec::with_capacity(requested);
        let mut attempts = 0;

        while questions.len() < requested && attempts < max_attempts {
            attempts += 1;
            let (prompt, answer) = self.draw(config);
            if !seen.insert(prompt.clone()) {
                continue;
            }
            let choices = self.choices_for(answer);
            questions.push(Question {
                prompt,
                correct_answer: answer,
                choices,
            });
        }

        if questions.len() < requested {
            return Err(QuizError::GenerationExhausted {
                requested,
                produced: questions.len(),
            });
        }

        debug!(
            "generated {} {} questions in {} attempts",
            requested, config.operation, attempts
        );
        Ok(questions)
    }

    fn draw(&mut self, config: &QuizConfig) -> (String, u32) {
        match config.operation {
            Operation::Addition => {
                let a = self.operand(config.digit_count);
                let b = self.operand(config.digit_count);
                (format!("{} + {}", a, b), a + b)
            }
            Operation::Subtraction => {
                let a = self.operand(config.digit_count);
                let b = self.operand(config.digit_count);
                let (larger, smaller) = (a.max(b), a.min(b));
                (format!("{} - {}", larger, smaller), larger - smaller)
            }
            Operation::Multiplication => {
                let base = self.pick_from_pool(&config.operand_pool);
                let multiplier = self.rng.gen_range(1..=MAX_FACTOR);
                (format!("{} × {}", base, multiplier), base * multiplier)
            }
            Operation::Division => {
                let divisor = self.pick_from_pool(&config.operand_pool);
                let quotient = self.rng.gen_range(1..=MAX_FACTOR);
                let dividend = divisor * quotient;
                (format!("{} ÷ {}", dividend, divisor), quotient)
            }
        }
    }

    /// Uniform operand with exactly `digits` digits
    fn operand(&mut self, digits: u32) -> u32 {
        let min = 10u32.pow(digits - 1);
        let max = 10u32.pow(digits) - 1;
        self.rng.gen_range(min..=max)
    }

    // pool is validated non-empty before drawing
    fn pick_from_pool(&mut self, pool: &[u32]) -> u32 {
        pool.choose(&mut self.rng).copied().unwrap_or(1)
    }

    /// Correct answer plus three plausible distractors, shuffled.
    ///
    /// Distractors fall within 30% of the answer (at least ±10) and are
    /// always strictly positive.
    pub fn choices_for(&mut self, correct: u32) -> [u32; 4] {
        let mut picked = vec![correct];
        let range = (((correct as f64) * 0.3).ceil() as i64).max(10);

        for _ in 0..DISTRACTOR_ATTEMPTS {
            if picked.len() == CHOICE_COUNT {
                break;
            }
            let candidate = correct as i64 + self.rng.gen_range(-range..=range);
            if candidate > 0 && !picked.contains(&(candidate as u32)) {
                picked.push(candidate as u32);
            }
        }

        // nearest unused neighbours if the random draws ran dry
        let mut offset = 1u32;
        while picked.len() < CHOICE_COUNT {
            for candidate in [correct.checked_add(offset), correct.checked_sub(offset)]
                .into_iter()
                .flatten()
            {
                if picked.len() < CHOICE_COUNT && candidate > 0 && !picked.contains(&candidate) {
                    picked.push(candidate);
                }
            }
            offset += 1;
        }

        picked.shuffle(&mut self.rng);
        [picked[0], picked[1], picked[2], picked[3]]
    }
}
