use midilatch::midi::{EventKind, MidiError, MockBackend};
use midilatch::{Engine, EngineConfig};
use std::thread;
use std::time::{Duration, Instant};

fn start(backend: MockBackend) -> Engine {
    let engine = Engine::start(&EngineConfig::default(), backend).unwrap();
    // the session is opened on the engine thread; wait for it
    let _ = engine.handle().session_info();
    engine
}

#[test]
fn test_note_on_is_observed_once() {
    let backend = MockBackend::new();
    let engine = start(backend.clone());
    let handle = engine.handle();

    assert!(backend.inject(&[0x90, 60, 100]));
    assert!(handle.poll_edge(EventKind::NoteOn));
    assert!(!handle.poll_edge(EventKind::NoteOn));
    assert_eq!(handle.read_note(), 60);
    assert_eq!(handle.read_velocity(), 100);
}

#[test]
fn test_zero_velocity_note_on_is_recorded_as_note_off() {
    let engine = start(MockBackend::new());
    let handle = engine.handle();

    handle.feed(&[0x90, 64, 0]);
    assert!(!handle.poll_edge(EventKind::NoteOn));
    assert!(handle.poll_edge(EventKind::NoteOff));
    assert!(handle.poll_selector("key-of"));
    assert!(!handle.poll_key_down(64));
}

#[test]
fn test_edge_read_leaves_sticky_pending() {
    let engine = start(MockBackend::new());
    let handle = engine.handle();

    handle.feed(&[0xE0, 0, 100]);
    assert!(handle.poll_edge(EventKind::PitchBend));
    assert!(handle.poll_sticky(EventKind::PitchBend));
    assert!(!handle.poll_sticky(EventKind::PitchBend));
    assert_eq!(handle.read_pitch_bend(), 100);
}

#[test]
fn test_selector_polls() {
    let engine = start(MockBackend::new());
    let handle = engine.handle();

    handle.feed(&[0xC3, 12]);
    assert!(!handle.poll_selector("key-on"));
    assert!(!handle.poll_selector("not-a-kind"));
    assert!(handle.poll_selector("pg-chg"));
    assert!(!handle.poll_selector("pg-chg"));
    assert_eq!(handle.read_program(), 12);
}

#[test]
fn test_controller_values_are_isolated() {
    let engine = start(MockBackend::new());
    let handle = engine.handle();

    handle.feed(&[0xB0, 1, 64]);
    handle.feed(&[0xB2, 2, 5]);
    assert_eq!(handle.read_controller(1), 64);
    assert_eq!(handle.read_controller(2), 5);
    assert_eq!(handle.read_controller(3), 0);
    assert!(handle.poll_edge(EventKind::ControlChange));
    assert!(!handle.poll_edge(EventKind::ControlChange));
}

#[test]
fn test_key_down_sequence() {
    let engine = start(MockBackend::new());
    let handle = engine.handle();

    handle.feed(&[0x90, 60, 100]);
    assert!(handle.poll_key_down(60));
    assert!(!handle.poll_key_down(60));
    handle.feed(&[0x80, 60, 0]);
    assert!(!handle.poll_key_down(60));
}

#[test]
fn test_any_event_poll() {
    let engine = start(MockBackend::new());
    let handle = engine.handle();

    handle.feed(&[0xD0, 40]);
    assert!(!handle.poll_any_event());
    handle.feed(&[0xB0, 7, 1]);
    assert!(handle.poll_any_event());
    assert!(!handle.poll_any_event());
}

#[test]
fn test_send_reaches_outputs() {
    let backend = MockBackend::with_ports(&[], &["Synth"]);
    let engine = start(backend.clone());
    let handle = engine.handle();

    handle.send_note_on(1, 60, 127);
    handle.send_note_off(16, 60, 0);
    // queries are answered after earlier sends are handled
    let _ = handle.session_info();

    assert_eq!(backend.sent(), vec![vec![0x90, 60, 127], vec![0x8F, 60, 0]]);
}

#[test]
fn test_send_without_outputs_is_a_no_op() {
    let backend = MockBackend::with_ports(&["Keys"], &[]);
    let engine = start(backend.clone());
    let handle = engine.handle();

    handle.send_note_on(1, 60, 127);
    assert!(handle.session_info().outputs.is_empty());
    assert!(backend.sent().is_empty());
}

#[test]
fn test_session_failure_degrades_gracefully() {
    let backend = MockBackend::failing("MIDI access denied");
    let engine = start(backend.clone());
    let handle = engine.handle();

    let info = handle.session_info();
    assert!(info.failure.unwrap().contains("MIDI access denied"));
    assert!(!backend.inject(&[0x90, 60, 100]));

    handle.send_note_on(1, 60, 127);
    assert!(!handle.poll_edge(EventKind::NoteOn));
    assert_eq!(handle.read_pitch_bend(), 64);
    assert!(backend.sent().is_empty());
}

#[test]
fn test_handle_outlives_engine() {
    let mut engine = start(MockBackend::new());
    let handle = engine.handle();
    handle.feed(&[0x90, 60, 100]);
    engine.shutdown();

    assert!(!handle.poll_edge(EventKind::NoteOn));
    assert_eq!(handle.read_note(), 0);
    assert!(handle.session_info().failure.is_some());
}

#[test]
fn test_background_clock_produces_beats() {
    let config = EngineConfig {
        tick_period_ms: 2,
        ..EngineConfig::default()
    };
    let engine = Engine::start(&config, MockBackend::new()).unwrap();
    let handle = engine.handle();

    // 480 BPM gives a beat every 125 ms
    let deadline = Instant::now() + Duration::from_secs(3);
    let mut beats = 0;
    while beats < 2 && Instant::now() < deadline {
        if handle.poll_beat(480.0) {
            beats += 1;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(beats, 2);
    assert!(handle.read_ticks() < 480 * 4);
}

#[test]
fn test_start_rejects_invalid_settings() {
    let zero_period = EngineConfig {
        tick_period_ms: 0,
        ..EngineConfig::default()
    };
    let backend = MockBackend::new();
    assert!(matches!(
        Engine::start(&zero_period, backend.clone()),
        Err(MidiError::InvalidConfig(_))
    ));

    let zero_resolution = EngineConfig {
        resolution: 0,
        ..EngineConfig::default()
    };
    assert!(matches!(
        Engine::start(&zero_resolution, backend.clone()),
        Err(MidiError::InvalidConfig(_))
    ));

    let frozen = EngineConfig {
        default_tempo: 0.0,
        ..EngineConfig::default()
    };
    assert!(matches!(
        Engine::start(&frozen, backend.clone()),
        Err(MidiError::InvalidConfig(_))
    ));

    // nothing was opened, so injected input has nowhere to go
    assert!(!backend.inject(&[0x90, 60, 100]));
}
