//! Integration tests for the full dispatch -> router -> backend path.

use std::sync::Arc;

use soundfont_voicer::backend::{BackendCall, MockBackend};
use soundfont_voicer::bend::{bend_value, BEND_CENTER, BEND_MAX};
use soundfont_voicer::{args, Dispatcher, Error, Reply};

fn setup() -> (Arc<MockBackend>, Dispatcher) {
    let backend = Arc::new(MockBackend::new());
    let dispatcher = Dispatcher::new(backend.clone());
    (backend, dispatcher)
}

fn load_pitch_class(dispatcher: &Dispatcher) -> i64 {
    let reply = dispatcher
        .handle(
            "loadSoundfont",
            &args! {
                "path" => "piano.sf2",
                "bank" => 0,
                "program" => 0,
                "allocation" => "pitchClass",
            },
        )
        .unwrap();
    match reply {
        Reply::InstrumentId(id) => id as i64,
        other => panic!("expected instrument id, got {other:?}"),
    }
}

#[test]
fn pitch_class_tuning_scenario() {
    // The full lifecycle: load with pitch-class allocation, play, retune
    // while sounding, stop, then inherit the stored tuning in another octave.
    let (backend, dispatcher) = setup();
    let id = load_pitch_class(&dispatcher);
    backend.clear_calls();

    // Middle C routes to voice 60 % 12 = 0
    dispatcher
        .handle(
            "playNote",
            &args! { "instrumentId" => id, "key" => 60, "velocity" => 100 },
        )
        .unwrap();
    let voice = match backend.calls()[1] {
        BackendCall::StartNote { voice, note: 60, velocity: 100 } => voice,
        ref other => panic!("expected note-on, got {other:?}"),
    };

    // Retuning pitch class 0 while note 60 sounds retunes that voice
    dispatcher
        .handle(
            "tuneNotes",
            &args! { "instrumentId" => id, "key" => 0, "tune" => 1.0 },
        )
        .unwrap();
    assert_eq!(backend.bends_for(voice).last(), Some(&12287));

    // A second retune reaches the same voice without a new note-on
    dispatcher
        .handle(
            "tuneNotes",
            &args! { "instrumentId" => id, "key" => 0, "tune" => -1.0 },
        )
        .unwrap();
    assert_eq!(backend.bends_for(voice).last(), Some(&bend_value(-1.0)));

    // C in another octave lands on the same voice and inherits the tuning
    dispatcher
        .handle("stopNote", &args! { "instrumentId" => id, "key" => 60 })
        .unwrap();
    backend.clear_calls();
    dispatcher
        .handle(
            "playNote",
            &args! { "instrumentId" => id, "key" => 72, "velocity" => 100 },
        )
        .unwrap();
    let calls = backend.calls();
    assert_eq!(
        calls[0],
        BackendCall::PitchBend {
            voice,
            bend: bend_value(-1.0)
        }
    );
    assert_eq!(
        calls[1],
        BackendCall::StartNote {
            voice,
            note: 72,
            velocity: 100
        }
    );
}

#[test]
fn untuned_playback_is_centered() {
    let (backend, dispatcher) = setup();
    let id = load_pitch_class(&dispatcher);
    backend.clear_calls();

    dispatcher
        .handle(
            "playNote",
            &args! { "instrumentId" => id, "key" => 64, "velocity" => 80 },
        )
        .unwrap();
    assert!(matches!(
        backend.calls()[0],
        BackendCall::PitchBend {
            bend: BEND_CENTER,
            ..
        }
    ));
}

#[test]
fn extreme_offsets_saturate_the_bend_range() {
    let (backend, dispatcher) = setup();
    let id = load_pitch_class(&dispatcher);

    dispatcher
        .handle(
            "playNote",
            &args! { "instrumentId" => id, "key" => 60, "velocity" => 100 },
        )
        .unwrap();
    backend.clear_calls();

    dispatcher
        .handle(
            "tuneNotes",
            &args! { "instrumentId" => id, "key" => 0, "tune" => 12.0 },
        )
        .unwrap();
    assert!(matches!(
        backend.calls()[0],
        BackendCall::PitchBend { bend: BEND_MAX, .. }
    ));

    dispatcher
        .handle(
            "tuneNotes",
            &args! { "instrumentId" => id, "key" => 0, "tune" => -12.0 },
        )
        .unwrap();
    assert!(matches!(
        backend.calls()[1],
        BackendCall::PitchBend { bend: 0, .. }
    ));
}

#[test]
fn non_finite_tune_is_treated_as_center() {
    let (backend, dispatcher) = setup();
    let id = load_pitch_class(&dispatcher);
    dispatcher
        .handle(
            "playNote",
            &args! { "instrumentId" => id, "key" => 60, "velocity" => 100 },
        )
        .unwrap();
    backend.clear_calls();

    dispatcher
        .handle(
            "tuneNotes",
            &args! { "instrumentId" => id, "key" => 0, "tune" => f64::NAN },
        )
        .unwrap();
    assert!(matches!(
        backend.calls()[0],
        BackendCall::PitchBend {
            bend: BEND_CENTER,
            ..
        }
    ));
}

#[test]
fn stop_note_twice_matches_stopping_once() {
    let (backend, dispatcher) = setup();
    let id = load_pitch_class(&dispatcher);
    dispatcher
        .handle(
            "playNote",
            &args! { "instrumentId" => id, "key" => 60, "velocity" => 100 },
        )
        .unwrap();
    backend.clear_calls();

    dispatcher
        .handle("stopNote", &args! { "instrumentId" => id, "key" => 60 })
        .unwrap();
    let after_first = backend.calls();

    dispatcher
        .handle("stopNote", &args! { "instrumentId" => id, "key" => 60 })
        .unwrap();
    assert_eq!(backend.calls(), after_first);
}

#[test]
fn fixed_channel_instrument_honors_caller_channels() {
    let (backend, dispatcher) = setup();
    let reply = dispatcher
        .handle(
            "loadSoundfont",
            &args! { "path" => "organ.sf2", "bank" => 0, "program" => 19 },
        )
        .unwrap();
    let id = match reply {
        Reply::InstrumentId(id) => id as i64,
        other => panic!("expected instrument id, got {other:?}"),
    };
    backend.clear_calls();

    dispatcher
        .handle(
            "playNote",
            &args! { "instrumentId" => id, "channel" => 3, "key" => 60, "velocity" => 100 },
        )
        .unwrap();
    dispatcher
        .handle(
            "playNote",
            &args! { "instrumentId" => id, "channel" => 5, "key" => 62, "velocity" => 100 },
        )
        .unwrap();

    let voices: Vec<_> = backend
        .calls()
        .iter()
        .filter_map(|call| match call {
            BackendCall::StartNote { voice, .. } => Some(*voice),
            _ => None,
        })
        .collect();
    assert_eq!(voices.len(), 2);
    assert_ne!(voices[0], voices[1]);
}

#[test]
fn select_instrument_reprograms_one_voice() {
    let (backend, dispatcher) = setup();
    let reply = dispatcher
        .handle(
            "loadSoundfont",
            &args! { "path" => "gm.sf2", "bank" => 0, "program" => 0 },
        )
        .unwrap();
    let id = match reply {
        Reply::InstrumentId(id) => id as i64,
        other => panic!("expected instrument id, got {other:?}"),
    };
    backend.clear_calls();

    dispatcher
        .handle(
            "selectInstrument",
            &args! { "instrumentId" => id, "channel" => 9, "bank" => 128, "program" => 0 },
        )
        .unwrap();
    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(
        calls[0],
        BackendCall::LoadInstrument {
            bank: 128,
            program: 0,
            ..
        }
    ));
}

#[test]
fn load_failure_leaves_no_state_behind() {
    let (backend, dispatcher) = setup();
    backend.fail_loads_from(3);

    let err = dispatcher.handle(
        "loadSoundfont",
        &args! { "path" => "missing.sf2", "bank" => 0, "program" => 0 },
    );
    assert!(matches!(err, Err(Error::BackendLoadFailed(_))));
    assert!(backend.live_voices().is_empty());
    assert!(dispatcher.router().is_empty());
}

#[test]
fn unload_then_dispose_lifecycle() {
    let (backend, dispatcher) = setup();
    let first = load_pitch_class(&dispatcher);
    let second = load_pitch_class(&dispatcher);
    assert_eq!(dispatcher.router().instrument_count(), 2);

    dispatcher
        .handle("unloadSoundfont", &args! { "instrumentId" => first })
        .unwrap();
    let err = dispatcher.handle(
        "playNote",
        &args! { "instrumentId" => first, "key" => 60, "velocity" => 100 },
    );
    assert!(matches!(err, Err(Error::InstrumentNotFound(_))));

    dispatcher.handle("dispose", &args! {}).unwrap();
    assert!(backend.live_voices().is_empty());
    let err = dispatcher.handle(
        "playNote",
        &args! { "instrumentId" => second, "key" => 60, "velocity" => 100 },
    );
    assert!(matches!(err, Err(Error::InstrumentNotFound(_))));
}
