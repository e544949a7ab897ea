// End-to-end typing scenarios driven through the engine with real key events.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use typewise::engine::{Alert, Engine};
use typewise::keystroke::{TabPolicy, NEWLINE};
use typewise::session::{Phase, Rejection};
use typewise::stats::{ErrorStats, MemoryErrorStats, SqliteErrorStats};

fn engine(text: &str, limit: Option<u64>) -> Engine<MemoryErrorStats> {
    Engine::new(text, limit, TabPolicy::Bypass, MemoryErrorStats::new())
}

fn press<S: ErrorStats>(engine: &mut Engine<S>, code: KeyCode, now: Instant) {
    engine.handle_key(KeyEvent::new(code, KeyModifiers::NONE), now);
}

fn type_str<S: ErrorStats>(engine: &mut Engine<S>, s: &str, now: Instant) {
    for c in s.chars() {
        press(engine, KeyCode::Char(c), now);
    }
}

fn input<S: ErrorStats>(engine: &Engine<S>) -> String {
    engine.session().input().iter().collect()
}

#[test]
fn clean_run_on_cat() {
    let t0 = Instant::now();
    let mut engine = engine("cat", None);
    type_str(&mut engine, "cat", t0);

    assert_eq!(engine.session().accuracy(), 100);
    assert_eq!(engine.session().mistake_count(), 0);
}

#[test]
fn mistake_on_cat_locks_then_recovers() {
    let t0 = Instant::now();
    let mut engine = engine("cat", None);

    type_str(&mut engine, "cx", t0);
    assert_eq!(engine.session().error_map().get(&'a'), Some(&1));
    assert!(engine.session().is_locked());

    type_str(&mut engine, "t", t0);
    assert_eq!(input(&engine), "cx");
    assert_eq!(engine.alert(), Some(Alert::Rejected(Rejection::Locked)));

    press(&mut engine, KeyCode::Backspace, t0);
    assert_eq!(input(&engine), "c");
    assert!(!engine.session().is_locked());

    type_str(&mut engine, "at", t0);
    assert_eq!(engine.session().accuracy(), 75);
    assert_eq!(engine.stats().count('a'), 1);
}

#[test]
fn newline_scenarios() {
    let t0 = Instant::now();
    let mut engine = engine("ab\ncd", None);
    type_str(&mut engine, "ab", t0);

    // focused by typing, so Enter is content
    press(&mut engine, KeyCode::Enter, t0);
    assert_eq!(engine.session().mistake_count(), 0);
    assert_eq!(input(&engine), "ab\n");

    press(&mut engine, KeyCode::Enter, t0);
    assert_eq!(engine.session().error_map().get(&NEWLINE), Some(&1));
    assert_eq!(input(&engine), "ab\n\n");

    type_str(&mut engine, "c", t0);
    assert_eq!(input(&engine), "ab\n\n");

    press(&mut engine, KeyCode::Backspace, t0);
    type_str(&mut engine, "cd", t0);
    assert_eq!(input(&engine), "ab\ncd");
}

#[test]
fn time_limit_freezes_metrics() {
    let t0 = Instant::now();
    let mut engine = engine("one two three four five", Some(3));
    type_str(&mut engine, "one two", t0);
    engine.on_timers(t0 + Duration::from_secs(2));
    type_str(&mut engine, " three", t0 + Duration::from_secs(2));
    engine.on_timers(t0 + Duration::from_secs(3));

    assert_eq!(engine.session().phase(), Phase::Submitted);
    let result = engine.result().unwrap();
    // 3 words in 3 seconds
    assert_eq!(result.wpm, 60);
    assert_eq!(result.wpm_history, vec![120, 60, 60]);

    type_str(&mut engine, " four", t0 + Duration::from_secs(4));
    engine.on_timers(t0 + Duration::from_secs(9));
    assert_eq!(engine.result(), Some(result));
}

#[test]
fn infinite_practice_keeps_extending() {
    let t0 = Instant::now();
    let mut engine = engine("go", None);
    type_str(&mut engine, "gogogo", t0);

    assert!(!engine.session().is_submitted());
    assert_eq!(engine.session().target().iter().collect::<String>(), "gogogogo");
    assert_eq!(engine.session().accuracy(), 100);
}

#[test]
fn strict_tab_checks_indentation() {
    let t0 = Instant::now();
    let mut engine = Engine::new(
        "if x:\n  y",
        None,
        TabPolicy::Validate,
        MemoryErrorStats::new(),
    );
    type_str(&mut engine, "if x:", t0);
    press(&mut engine, KeyCode::Enter, t0);
    press(&mut engine, KeyCode::Tab, t0);

    assert_eq!(input(&engine), "if x:\n   ");
    assert_eq!(engine.session().error_map().get(&'y'), Some(&1));
    assert!(engine.session().is_locked());
}

#[test]
fn stale_tick_after_reset_is_harmless() {
    let t0 = Instant::now();
    let mut engine = engine("abc", Some(1));
    type_str(&mut engine, "a", t0);
    press(&mut engine, KeyCode::Esc, t0 + Duration::from_millis(999));

    // the old one-second deadline passes with nothing pending
    engine.on_timers(t0 + Duration::from_secs(1));
    assert_eq!(engine.session().phase(), Phase::Idle);
    assert_eq!(engine.session().elapsed_seconds(), 0);
    assert_eq!(engine.pending_timers(), 0);
}

#[test]
fn sqlite_store_collects_mistakes_across_sessions() {
    let t0 = Instant::now();
    let stats = SqliteErrorStats::open_in_memory().unwrap();
    let mut engine = Engine::new("ab", None, TabPolicy::Bypass, stats);

    type_str(&mut engine, "x", t0);
    press(&mut engine, KeyCode::Esc, t0);
    type_str(&mut engine, "ax", t0);
    engine.reload("ba");
    type_str(&mut engine, "x", t0);

    assert_eq!(engine.high_error_chars(5), vec![('b', 2), ('a', 1)]);
    engine.reset_stats().unwrap();
    assert!(engine.high_error_chars(5).is_empty());
}
