use std::fs;
use std::time::{Duration, Instant};

use mathdash::engine::Engine;
use mathdash::history::{export_csv, HistoryStats, HistoryStore, SqliteHistory};
use mathdash::operation::Operation;
use mathdash::runtime::FEEDBACK_DELAY;
use mathdash::session::QuizConfig;

/// Answer `pattern[i]` correctly or not, one question each
fn play<H: HistoryStore>(
    engine: &mut Engine<H>,
    config: QuizConfig,
    pattern: &[bool],
    start: Instant,
) -> Instant {
    let token = engine.start(config, "Mia", start).unwrap();
    let mut now = start;
    for &right in pattern {
        let question = engine.quiz().unwrap().current_question().clone();
        let value = if right {
            question.correct_answer
        } else {
            *question
                .choices
                .iter()
                .find(|&&c| c != question.correct_answer)
                .unwrap()
        };
        now += Duration::from_secs(1);
        engine.pump(now);
        engine.answer(token, value, now);
        now += FEEDBACK_DELAY;
        engine.pump(now);
    }
    now
}

#[test]
fn completed_sessions_persist_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.db");

    {
        let mut engine = Engine::seeded(SqliteHistory::open(&path).unwrap(), 10);
        let now = play(
            &mut engine,
            QuizConfig::new(Operation::Division)
                .with_operand_pool([3, 4])
                .with_question_count(4),
            &[true, true, false, true],
            Instant::now(),
        );
        play(
            &mut engine,
            QuizConfig::new(Operation::Addition).with_question_count(2),
            &[true, true],
            now,
        );
    }

    let db = SqliteHistory::open(&path).unwrap();
    let entries = db.recent().unwrap();
    assert_eq!(entries.len(), 2);

    // newest first
    assert_eq!(entries[0].operation, Operation::Addition);
    assert_eq!(entries[0].percentage, 100);
    assert_eq!(entries[1].operation, Operation::Division);
    assert_eq!(entries[1].score, 3);
    assert_eq!(entries[1].percentage, 75);
    assert_eq!(entries[1].incorrect_count(), 1);
    assert_eq!(entries[1].config.operand_pool, vec![3, 4]);
    assert!(entries.iter().all(|e| e.player_name == "Mia"));

    let stats = HistoryStats::from_entries(&entries);
    assert_eq!(stats.total_quizzes, 2);
    assert_eq!(stats.average_percentage, 88);
    assert_eq!(stats.best_percentage, 100);
}

#[test]
fn history_export_matches_entries() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = Engine::seeded(SqliteHistory::in_memory().unwrap(), 4);
    play(
        &mut engine,
        QuizConfig::new(Operation::Multiplication)
            .with_operand_pool([6])
            .with_question_count(3),
        &[true, false, false],
        Instant::now(),
    );

    let csv_path = dir.path().join("out.csv");
    let entries = engine.history().recent().unwrap();
    export_csv(&entries, fs::File::create(&csv_path).unwrap()).unwrap();

    let text = fs::read_to_string(&csv_path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("date,player,operation,score,total_questions,percentage,time_secs,timed_out")
    );
    let row = lines.next().unwrap();
    assert!(row.contains(",Mia,multiplication,1,3,33,"));
    assert!(lines.next().is_none());
}
