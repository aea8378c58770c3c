use std::sync::Arc;
use std::time::Duration;

use quiz_core::LevelTable;
use quiz_core::model::{GameResult, GameSettings, Level};
use quiz_core::time::fixed_clock;
use quiz_services::{
    GameSession, QuestionGenerator, SessionConfig, SessionEvent, SessionState, TokioScheduler,
};
use tokio::sync::mpsc::UnboundedReceiver;

fn session_for(table: LevelTable, config: SessionConfig) -> GameSession {
    GameSession::builder(Arc::new(table), Arc::new(TokioScheduler::current()))
        .with_question_source(Box::new(QuestionGenerator::from_seed(5)))
        .with_config(config)
        .with_clock(fixed_clock())
        .build()
}

async fn run_until_finished(
    events: &mut UnboundedReceiver<SessionEvent>,
) -> (Vec<u64>, GameResult) {
    let mut ticks = Vec::new();
    loop {
        match events.recv().await.expect("session event") {
            SessionEvent::Tick {
                remaining_millis, ..
            } => ticks.push(remaining_millis),
            SessionEvent::Finished(result) => return (ticks, result),
            _ => {}
        }
    }
}

#[tokio::test(start_paused = true)]
async fn timed_session_runs_to_result() {
    let session = session_for(LevelTable::standard().unwrap(), SessionConfig::default());
    let mut events = session.subscribe();
    session.start(Level::Test).unwrap();

    for _ in 0..4 {
        let question = session.current_question().unwrap();
        session.submit_answer(question.right_answer()).unwrap();
    }

    let (ticks, result) = run_until_finished(&mut events).await;
    assert_eq!(
        ticks,
        (0..=8).rev().map(|secs| secs * 1000).collect::<Vec<u64>>()
    );
    assert!(result.won());
    assert_eq!(result.correct_count(), 4);
    assert_eq!(result.total_count(), 4);
    assert_eq!(session.state(), SessionState::Finished);
    assert!(!session.is_clock_running());
    assert_eq!(session.formatted_time().as_deref(), Some("00:00"));
}

#[tokio::test(start_paused = true)]
async fn custom_tick_interval_is_honored() {
    let table =
        LevelTable::empty().with_level(Level::Easy, GameSettings::new(10, 0, 0, 2).unwrap());
    let config = SessionConfig::new().with_tick_interval(Duration::from_millis(500));
    let session = session_for(table, config);
    let mut events = session.subscribe();
    session.start(Level::Easy).unwrap();

    let (ticks, result) = run_until_finished(&mut events).await;
    assert_eq!(ticks, vec![2000, 1500, 1000, 500, 0]);
    assert!(result.won());
    assert_eq!(result.total_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn force_finish_stops_the_countdown() {
    let session = session_for(LevelTable::standard().unwrap(), SessionConfig::default());
    let mut events = session.subscribe();
    session.start(Level::Easy).unwrap();

    tokio::time::sleep(Duration::from_millis(2500)).await;
    let result = session.force_finish().unwrap();
    assert!(!result.won());

    tokio::time::sleep(Duration::from_secs(120)).await;
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    let ticks = seen
        .iter()
        .filter(|event| matches!(event, SessionEvent::Tick { .. }))
        .count();
    assert_eq!(ticks, 3);
    assert!(matches!(seen.last(), Some(SessionEvent::Finished(_))));
    assert!(!session.is_clock_running());
}

#[tokio::test(start_paused = true)]
async fn dropped_session_never_ticks_again() {
    let session = session_for(LevelTable::standard().unwrap(), SessionConfig::default());
    let mut events = session.subscribe();
    session.start(Level::Normal).unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    drop(session);
    tokio::time::sleep(Duration::from_secs(60)).await;

    let mut ticks = 0;
    while let Some(event) = events.recv().await {
        if matches!(event, SessionEvent::Tick { .. }) {
            ticks += 1;
        }
        assert!(!matches!(event, SessionEvent::Finished(_)));
    }
    assert_eq!(ticks, 2);
}

#[test]
fn events_serialize_with_type_tags() {
    let tick = SessionEvent::Tick {
        remaining_millis: 125_000,
        formatted: quiz_core::format_countdown(125_000),
    };
    let json = serde_json::to_value(&tick).unwrap();
    assert_eq!(json["type"], "tick");
    assert_eq!(json["remaining_millis"], 125_000);
    assert_eq!(json["formatted"], "02:05");

    let marker = serde_json::to_value(SessionEvent::MinPercent { percent: 60 }).unwrap();
    assert_eq!(marker["type"], "min-percent");
    assert_eq!(marker["percent"], 60);
}
