use midilatch::midi::MockBackend;
use midilatch::monitor::play_test_note;
use midilatch::{Engine, EngineConfig, RestFrame, RestStatus};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_rest_yields_until_elapsed() {
    let engine = Engine::start(&EngineConfig::default(), MockBackend::new()).unwrap();
    let handle = engine.handle();

    // 48 ticks at 120 BPM and 480 ticks per beat is 50 ms
    let started = Instant::now();
    let mut frame = RestFrame::new();
    let mut turns = 0;
    while handle.rest_ticks(48, &mut frame) == RestStatus::Waiting {
        turns += 1;
        thread::sleep(Duration::from_millis(5));
    }

    assert!(started.elapsed() >= Duration::from_millis(50));
    assert!(turns >= 2, "rest should yield several times, got {}", turns);
    assert!(frame.is_complete());
}

#[test]
fn test_rest_uses_tempo_at_entry() {
    let engine = Engine::start(&EngineConfig::default(), MockBackend::new()).unwrap();
    let handle = engine.handle();
    handle.poll_beat(240.0);

    let started = Instant::now();
    let mut frame = RestFrame::new();
    while handle.rest_ticks(96, &mut frame) == RestStatus::Waiting {
        thread::sleep(Duration::from_millis(2));
    }
    // 96 ticks at 240 BPM is 50 ms
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(1000));
}

#[test]
fn test_cancelled_rest_has_no_effect() {
    let backend = MockBackend::with_ports(&[], &["Synth"]);
    let engine = Engine::start(&EngineConfig::default(), backend.clone()).unwrap();
    let handle = engine.handle();

    let mut frame = RestFrame::new();
    assert_eq!(handle.rest_ticks(4800, &mut frame), RestStatus::Waiting);
    drop(frame);

    let _ = handle.session_info();
    assert!(backend.sent().is_empty());
}

#[test]
fn test_play_test_note() {
    let backend = MockBackend::with_ports(&[], &["Synth"]);
    let engine = Engine::start(&EngineConfig::default(), backend.clone()).unwrap();
    let handle = engine.handle();

    play_test_note(&handle, 24);
    let _ = handle.session_info();

    assert_eq!(backend.sent(), vec![vec![0x90, 60, 127], vec![0x80, 60, 0]]);
}
