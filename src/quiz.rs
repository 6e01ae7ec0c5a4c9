use crate::error::QuizError;
use crate::question::{Answer, AnswerRecord, Question};
use crate::session::QuizConfig;

/// Identifies one quiz session; timers armed for an older session carry a
/// stale token and are discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Countdown running, waiting for an answer
    Active,
    /// Answered or timed out, showing which choice was right
    Feedback,
    Finished,
}

/// Result of feeding one event to the quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Event did not apply in the current phase
    Ignored,
    /// Countdown moved by one second
    Ticked,
    /// Current question closed, feedback is showing
    Answered { correct: bool },
    /// Moved on to the question at this index
    Next(usize),
    Finished,
}

/// Live state of one timed multiple-choice session
#[derive(Debug, Clone)]
pub struct Quiz {
    token: SessionToken,
    config: QuizConfig,
    questions: Vec<Question>,
    current_index: usize,
    time_left: u32,
    score: u32,
    selected: Option<Answer>,
    phase: Phase,
    answer_log: Vec<AnswerRecord>,
}

impl Quiz {
    pub fn new(
        token: SessionToken,
        config: QuizConfig,
        questions: Vec<Question>,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::GenerationExhausted {
                requested: config.question_count,
                produced: 0,
            });
        }
        let time_left = config.time_per_question;
        Ok(Self {
            token,
            config,
            questions,
            current_index: 0,
            time_left,
            score: 0,
            selected: None,
            phase: Phase::Active,
            answer_log: Vec::new(),
        })
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_index]
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn selected(&self) -> Option<Answer> {
        self.selected
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn feedback_visible(&self) -> bool {
        self.phase != Phase::Active
    }

    pub fn has_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn answer_log(&self) -> &[AnswerRecord] {
        &self.answer_log
    }

    /// One second of countdown. Reaching zero times the question out.
    pub fn on_tick(&mut self) -> Step {
        if self.phase != Phase::Active || self.time_left == 0 {
            return Step::Ignored;
        }
        self.time_left -= 1;
        if self.time_left == 0 {
            return self.record(Answer::TimedOut);
        }
        Step::Ticked
    }

    /// Submit a choice for the current question; only the first one counts
    pub fn answer(&mut self, value: u32) -> Step {
        self.record(Answer::Choice(value))
    }

    /// Expire the current question immediately
    pub fn time_out(&mut self) -> Step {
        if self.phase != Phase::Active {
            return Step::Ignored;
        }
        self.time_left = 0;
        self.record(Answer::TimedOut)
    }

    /// Leave the feedback phase: next question, or finish after the last
    pub fn advance(&mut self) -> Step {
        if self.phase != Phase::Feedback {
            return Step::Ignored;
        }
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.time_left = self.config.time_per_question;
            self.selected = None;
            self.phase = Phase::Active;
            Step::Next(self.current_index)
        } else {
            self.phase = Phase::Finished;
            Step::Finished
        }
    }

    fn record(&mut self, answer: Answer) -> Step {
        if self.phase != Phase::Active {
            return Step::Ignored;
        }
        let question = &self.questions[self.current_index];
        let is_correct = match answer {
            Answer::Choice(value) => question.is_correct(value),
            Answer::TimedOut => false,
        };

        self.answer_log.push(AnswerRecord {
            question_index: self.current_index,
            prompt: question.prompt.clone(),
            correct_answer: question.correct_answer,
            user_answer: answer,
            is_correct,
            time_taken: self.config.time_per_question - self.time_left,
        });
        if is_correct {
            self.score += 1;
        }
        self.selected = Some(answer);
        self.phase = Phase::Feedback;

        Step::Answered {
            correct: is_correct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Operation;
    use assert_matches::assert_matches;

    fn question(prompt: &str, answer: u32) -> Question {
        Question {
            prompt: prompt.to_string(),
            correct_answer: answer,
            choices: [answer, answer + 1, answer + 2, answer + 3],
        }
    }

    fn quiz(count: usize, secs: u32) -> Quiz {
        let config = QuizConfig::new(Operation::Addition)
            .with_question_count(count)
            .with_time_per_question(secs);
        let questions = (0..count)
            .map(|i| question(&format!("{} + 1", i + 1), i as u32 + 2))
            .collect();
        Quiz::new(SessionToken(1), config, questions).unwrap()
    }

    fn assert_score_consistent(q: &Quiz) {
        let correct = q.answer_log().iter().filter(|r| r.is_correct).count() as u32;
        assert_eq!(q.score(), correct);
    }

    #[test]
    fn test_initial_state() {
        let q = quiz(3, 10);
        assert_eq!(q.current_index(), 0);
        assert_eq!(q.time_left(), 10);
        assert_eq!(q.score(), 0);
        assert_eq!(q.selected(), None);
        assert!(!q.feedback_visible());
        assert!(q.answer_log().is_empty());
        assert_eq!(q.phase(), Phase::Active);
    }

    #[test]
    fn test_empty_question_list_refused() {
        let result = Quiz::new(SessionToken(1), QuizConfig::default(), vec![]);
        assert_matches!(
            result,
            Err(QuizError::GenerationExhausted {
                requested: 10,
                produced: 0
            })
        );
    }

    #[test]
    fn test_correct_answer_scores() {
        let mut q = quiz(3, 10);
        let correct = q.current_question().correct_answer;
        assert_eq!(q.answer(correct), Step::Answered { correct: true });
        assert_eq!(q.score(), 1);
        assert!(q.answer_log()[0].is_correct);
        assert!(q.feedback_visible());
        assert_eq!(q.selected(), Some(Answer::Choice(correct)));
        assert_score_consistent(&q);
    }

    #[test]
    fn test_wrong_answer_does_not_score() {
        let mut q = quiz(2, 10);
        let wrong = q.current_question().correct_answer + 1;
        assert_eq!(q.answer(wrong), Step::Answered { correct: false });
        assert_eq!(q.score(), 0);
        assert!(!q.answer_log()[0].is_correct);
        assert_score_consistent(&q);
    }

    #[test]
    fn test_second_answer_ignored() {
        let mut q = quiz(2, 10);
        let correct = q.current_question().correct_answer;
        q.answer(correct + 1);
        assert_eq!(q.answer(correct), Step::Ignored);
        assert_eq!(q.answer_log().len(), 1);
        assert_eq!(q.score(), 0);
    }

    #[test]
    fn test_time_taken_recorded() {
        let mut q = quiz(1, 10);
        for _ in 0..4 {
            assert_eq!(q.on_tick(), Step::Ticked);
        }
        q.answer(0);
        assert_eq!(q.answer_log()[0].time_taken, 4);
    }

    #[test]
    fn test_timeout_records_no_answer() {
        let mut q = quiz(2, 3);
        assert_eq!(q.on_tick(), Step::Ticked);
        assert_eq!(q.on_tick(), Step::Ticked);
        assert_eq!(q.on_tick(), Step::Answered { correct: false });

        let record = &q.answer_log()[0];
        assert_eq!(record.user_answer, Answer::TimedOut);
        assert!(!record.is_correct);
        assert!(record.timed_out());
        assert_eq!(record.time_taken, 3);
        assert_eq!(q.selected(), Some(Answer::TimedOut));
        assert!(q.feedback_visible());
    }

    #[test]
    fn test_no_ticks_during_feedback() {
        let mut q = quiz(2, 10);
        q.on_tick();
        q.answer(0);
        assert_eq!(q.on_tick(), Step::Ignored);
        assert_eq!(q.time_left(), 9);
    }

    #[test]
    fn test_explicit_time_out() {
        let mut q = quiz(1, 10);
        q.on_tick();
        assert_eq!(q.time_out(), Step::Answered { correct: false });
        assert_eq!(q.answer_log()[0].time_taken, 10);
        assert_eq!(q.time_out(), Step::Ignored);
    }

    #[test]
    fn test_advance_ignored_while_active() {
        let mut q = quiz(2, 10);
        assert_eq!(q.advance(), Step::Ignored);
        assert_eq!(q.current_index(), 0);
    }

    #[test]
    fn test_advance_resets_question_state() {
        let mut q = quiz(2, 10);
        q.on_tick();
        q.answer(q.current_question().correct_answer);
        assert_eq!(q.advance(), Step::Next(1));
        assert_eq!(q.current_index(), 1);
        assert_eq!(q.time_left(), 10);
        assert_eq!(q.selected(), None);
        assert!(!q.feedback_visible());
        assert_eq!(q.advance(), Step::Ignored);
    }

    #[test]
    fn test_finishes_after_last_question() {
        let mut q = quiz(1, 5);
        q.answer(q.current_question().correct_answer);
        assert_eq!(q.advance(), Step::Finished);
        assert!(q.has_finished());
        assert_eq!(q.answer(2), Step::Ignored);
        assert_eq!(q.on_tick(), Step::Ignored);
        assert_eq!(q.advance(), Step::Ignored);
    }

    #[test]
    fn test_score_consistent_through_session() {
        let mut q = quiz(4, 5);
        let answers = [true, false, true, true];
        for correct in answers {
            let answer = q.current_question().correct_answer;
            q.answer(if correct { answer } else { answer + 1 });
            assert_score_consistent(&q);
            q.advance();
            assert_score_consistent(&q);
        }
        assert!(q.has_finished());
        assert_eq!(q.score(), 3);
        assert_eq!(q.answer_log().len(), 4);
    }
}
