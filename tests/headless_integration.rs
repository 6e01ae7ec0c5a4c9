use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use mathdash::engine::Engine;
use mathdash::history::{HistoryStore, MemoryHistory};
use mathdash::operation::Operation;
use mathdash::question::Answer;
use mathdash::runtime::{FixedTicker, QuizEvent, Runner, TestEventSource};
use mathdash::session::QuizConfig;

fn key(c: char) -> QuizEvent {
    QuizEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

// Headless integration using the runtime + engine without a TTY.
// Each Tick advances a simulated clock by one second.
#[test]
fn headless_quiz_flow_completes() {
    let mut engine = Engine::seeded(MemoryHistory::new(), 1);
    let start = Instant::now();
    let config = QuizConfig::new(Operation::Addition)
        .with_digit_count(1)
        .with_question_count(3)
        .with_time_per_question(5);
    let token = engine.start(config, "Ada", start).unwrap();

    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let runner = Runner::new(es, ticker);

    let mut now = start;
    for _ in 0..200u32 {
        if engine.last_summary().is_some() {
            break;
        }
        match runner.step() {
            QuizEvent::Tick => {
                now += Duration::from_secs(1);
                engine.pump(now);
                // answer each fresh question with the right choice key
                let quiz = engine.quiz().unwrap();
                if !quiz.feedback_visible() && !quiz.has_finished() {
                    let idx = quiz.current_question().correct_choice_index().unwrap();
                    tx.send(key(char::from(b'1' + idx as u8))).unwrap();
                }
            }
            QuizEvent::Resize => {}
            QuizEvent::Key(k) => {
                if let KeyCode::Char(c @ '1'..='4') = k.code {
                    engine.choose(token, c as usize - '1' as usize, now);
                }
            }
        }
    }

    let summary = engine.last_summary().expect("quiz should have finished");
    assert_eq!(summary.score, 3);
    assert_eq!(summary.percentage, 100);
    assert_eq!(summary.total_questions, 3);
    assert!(summary.answer_log.iter().all(|r| r.time_taken <= 5));
    assert_eq!(engine.history().recent().unwrap().len(), 1);
}

#[test]
fn headless_silent_session_times_out() {
    let mut engine = Engine::seeded(MemoryHistory::new(), 2);
    let start = Instant::now();
    let config = QuizConfig::new(Operation::Subtraction)
        .with_digit_count(2)
        .with_question_count(2)
        .with_time_per_question(3);
    engine.start(config, "Ada", start).unwrap();

    let (_tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    let mut now = start;
    for _ in 0..50u32 {
        if let QuizEvent::Tick = runner.step() {
            now += Duration::from_secs(1);
            engine.pump(now);
        }
        if engine.last_summary().is_some() {
            break;
        }
    }

    let summary = engine.last_summary().expect("timed out session should finish");
    assert_eq!(summary.score, 0);
    assert_eq!(summary.timed_out_count(), 2);
    assert!(summary
        .answer_log
        .iter()
        .all(|r| r.user_answer == Answer::TimedOut && r.time_taken == 3));
    // 3s countdown + 2s feedback per question
    assert_eq!(now, start + Duration::from_secs(10));
}

#[test]
fn restart_discards_old_session_timers() {
    let mut engine = Engine::seeded(MemoryHistory::new(), 3);
    let start = Instant::now();
    let config = QuizConfig::new(Operation::Multiplication)
        .with_operand_pool([2, 5])
        .with_question_count(2)
        .with_time_per_question(2);

    let old = engine.start(config.clone(), "Ada", start).unwrap();
    engine.pump(start + Duration::from_secs(1));
    let new = engine
        .start(config, "Ada", start + Duration::from_secs(1))
        .unwrap();

    // the old session's feedback and countdown never touch the new one
    let value = engine.quiz().unwrap().current_question().correct_answer;
    assert_eq!(
        engine.answer(old, value, start + Duration::from_secs(1)),
        mathdash::quiz::Step::Ignored
    );
    engine.pump(start + Duration::from_secs(2));

    let quiz = engine.quiz().unwrap();
    assert_eq!(quiz.token(), new);
    assert_eq!(quiz.time_left(), 1);
    assert!(quiz.answer_log().is_empty());
    assert_eq!(engine.history().recent().unwrap().len(), 0);
}
