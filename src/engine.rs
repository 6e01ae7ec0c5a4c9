use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::rngs::StdRng;

use crate::error::QuizError;
use crate::generator::QuestionGenerator;
use crate::history::HistoryStore;
use crate::quiz::{Quiz, SessionToken, Step};
use crate::runtime::{Scheduler, Timer, TimerKind, COUNTDOWN_INTERVAL, FEEDBACK_DELAY};
use crate::session::QuizConfig;
use crate::summary::{self, SessionSummary};

/// Owns the live quiz, its timers and the history it reports to.
///
/// Every entry point takes the caller's `now`; nothing reads the clock
/// behind the caller's back, so sessions replay deterministically in tests.
pub struct Engine<H: HistoryStore> {
    history: H,
    generator: QuestionGenerator<StdRng>,
    scheduler: Scheduler,
    quiz: Option<Quiz>,
    next_token: u64,
    player_name: String,
    feedback_delay: Duration,
    last_summary: Option<SessionSummary>,
}

impl<H: HistoryStore> Engine<H> {
    pub fn new(history: H) -> Self {
        Self::with_generator(history, QuestionGenerator::from_entropy())
    }

    pub fn seeded(history: H, seed: u64) -> Self {
        Self::with_generator(history, QuestionGenerator::seeded(seed))
    }

    fn with_generator(history: H, generator: QuestionGenerator<StdRng>) -> Self {
        Self {
            history,
            generator,
            scheduler: Scheduler::new(COUNTDOWN_INTERVAL),
            quiz: None,
            next_token: 0,
            player_name: String::new(),
            feedback_delay: FEEDBACK_DELAY,
            last_summary: None,
        }
    }

    pub fn with_feedback_delay(mut self, delay: Duration) -> Self {
        self.feedback_delay = delay;
        self
    }

    /// Generate questions and begin a new session, abandoning any live one
    pub fn start(
        &mut self,
        config: QuizConfig,
        player_name: &str,
        now: Instant,
    ) -> Result<SessionToken, QuizError> {
        let questions = self.generator.generate(&config)?;

        self.scheduler.cancel_all();
        self.next_token += 1;
        let token = SessionToken(self.next_token);
        let quiz = Quiz::new(token, config, questions)?;

        info!(
            "starting session {} for {}: {} {} questions, {}s each",
            token.0,
            player_name,
            quiz.total_questions(),
            quiz.config().operation,
            quiz.config().time_per_question
        );

        self.player_name = player_name.to_string();
        self.last_summary = None;
        self.quiz = Some(quiz);
        self.scheduler.start_countdown(token, now);
        Ok(token)
    }

    /// Same settings and player as the last session, fresh questions
    pub fn replay(&mut self, now: Instant) -> Option<Result<SessionToken, QuizError>> {
        let config = self.quiz.as_ref().map(|q| q.config().clone())?;
        let player = self.player_name.clone();
        Some(self.start(config, &player, now))
    }

    /// Abandon the live session without recording it
    pub fn stop(&mut self) {
        self.scheduler.cancel_all();
        if let Some(quiz) = self.quiz.take() {
            debug!("session {} stopped", quiz.token().0);
        }
    }

    pub fn answer(&mut self, token: SessionToken, value: u32, now: Instant) -> Step {
        let Some(quiz) = self.live(token) else {
            return Step::Ignored;
        };
        let step = quiz.answer(value);
        self.after_step(token, step, now);
        step
    }

    /// Answer with the choice at `index` (0-3) of the current question
    pub fn choose(&mut self, token: SessionToken, index: usize, now: Instant) -> Step {
        let choice = self
            .quiz
            .as_ref()
            .filter(|q| q.token() == token && !q.has_finished())
            .and_then(|q| q.current_question().choices.get(index).copied());
        match choice {
            Some(value) => self.answer(token, value, now),
            None => Step::Ignored,
        }
    }

    pub fn tick(&mut self, token: SessionToken, now: Instant) -> Step {
        let Some(quiz) = self.live(token) else {
            return Step::Ignored;
        };
        let step = quiz.on_tick();
        self.after_step(token, step, now);
        step
    }

    pub fn advance(&mut self, token: SessionToken, now: Instant) -> Step {
        let Some(quiz) = self.live(token) else {
            return Step::Ignored;
        };
        let step = quiz.advance();
        self.after_step(token, step, now);
        step
    }

    /// Fire every timer due at `now`, oldest deadline first
    pub fn pump(&mut self, now: Instant) -> Vec<Step> {
        let mut steps = Vec::new();
        while let Some(Timer { token, kind, due }) = self.scheduler.pop_due(now) {
            let step = match kind {
                TimerKind::Countdown => self.tick(token, due),
                TimerKind::Advance => self.advance(token, due),
            };
            if step != Step::Ignored {
                steps.push(step);
            }
        }
        steps
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    pub fn current_token(&self) -> Option<SessionToken> {
        self.quiz.as_ref().map(Quiz::token)
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn last_summary(&self) -> Option<&SessionSummary> {
        self.last_summary.as_ref()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    fn live(&mut self, token: SessionToken) -> Option<&mut Quiz> {
        match self.quiz.as_mut() {
            Some(quiz) if quiz.token() == token => Some(quiz),
            _ => {
                debug!("discarding event for stale session {}", token.0);
                None
            }
        }
    }

    fn after_step(&mut self, token: SessionToken, step: Step, now: Instant) {
        match step {
            Step::Answered { .. } => {
                self.scheduler.cancel_countdown();
                self.scheduler
                    .schedule_advance(token, now + self.feedback_delay);
            }
            Step::Next(_) => self.scheduler.start_countdown(token, now),
            Step::Finished => {
                self.scheduler.cancel_all();
                self.finish();
            }
            Step::Ticked | Step::Ignored => {}
        }
    }

    fn finish(&mut self) {
        let Some(quiz) = self.quiz.as_ref() else {
            return;
        };
        let summary = summary::build(quiz.answer_log(), quiz.config(), &self.player_name);
        info!(
            "session {} finished: {}/{} ({}%)",
            quiz.token().0,
            summary.score,
            summary.total_questions,
            summary.percentage
        );
        if let Err(e) = self.history.append(&summary) {
            warn!("could not save quiz history: {}", e);
        }
        self.last_summary = Some(summary);
    }
}
