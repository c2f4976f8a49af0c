//! Save-state tests: raw serialize/unserialize forwarding plus the
//! black-box determinism property that restoring a state replays the same
//! output trajectory.

mod common;

use common::{
    loaded_session, reset_mock, world, CapturedFrame, SharedAudioSink, SharedVideoSink, TEST_LOCK,
};

use or_core::error::{CoreError, FrontendError};

#[test]
fn test_serialize_size_and_blob_contents() {
    let _guard = TEST_LOCK.lock();
    reset_mock();

    let mut session = loaded_session(SharedVideoSink::default(), SharedAudioSink::default());
    assert_eq!(session.serialize_size().unwrap(), 8);

    session.run_frame().unwrap();
    session.run_frame().unwrap();
    let state = session.serialize().unwrap();
    // The mock's whole state is its frame counter, little-endian.
    assert_eq!(state, 2u64.to_le_bytes());
}

#[test]
fn test_round_trip_replays_the_same_trajectory() {
    let _guard = TEST_LOCK.lock();
    reset_mock();

    let video = SharedVideoSink::default();
    let audio = SharedAudioSink::default();
    let mut session = loaded_session(video.clone(), audio.clone());

    // Land on counter 4, just past the mock's periodic null-buffer dupe,
    // so the comparison windows contain only freshly rendered frames.
    for _ in 0..4 {
        session.run_frame().unwrap();
    }
    let state = session.serialize().unwrap();

    let capture = |video: &SharedVideoSink,
                   audio: &SharedAudioSink,
                   session: &mut or_runtime::CoreSession|
     -> (Vec<CapturedFrame>, Vec<i16>) {
        video.frames.lock().clear();
        audio.samples.lock().clear();
        for _ in 0..3 {
            session.run_frame().unwrap();
        }
        (video.frames.lock().clone(), audio.samples.lock().clone())
    };

    let (frames_a, samples_a) = capture(&video, &audio, &mut session);

    session.unserialize(&state).unwrap();
    assert_eq!(world().counter, 4);

    let (frames_b, samples_b) = capture(&video, &audio, &mut session);

    assert_eq!(frames_a.len(), 3);
    assert_eq!(frames_a, frames_b);
    assert_eq!(samples_a.len(), 18);
    assert_eq!(samples_a, samples_b);
}

#[test]
fn test_core_rejects_foreign_buffers() {
    let _guard = TEST_LOCK.lock();
    reset_mock();

    let mut session = loaded_session(SharedVideoSink::default(), SharedAudioSink::default());
    session.run_frame().unwrap();

    // Wrong size: the core refuses, the session forwards the refusal.
    match session.unserialize(&[0u8; 4]) {
        Err(FrontendError::Core(CoreError::UnserializeRejected { size: 4 })) => {}
        other => panic!("expected UnserializeRejected, got {other:?}"),
    }
    // The refused restore changed nothing.
    assert_eq!(world().counter, 1);
    session.run_frame().unwrap();
    assert_eq!(world().counter, 2);
}

#[test]
fn test_serialize_failure_is_forwarded() {
    let _guard = TEST_LOCK.lock();
    reset_mock();

    let mut session = loaded_session(SharedVideoSink::default(), SharedAudioSink::default());
    world().reject_next_serialize = true;
    match session.serialize() {
        Err(FrontendError::Core(CoreError::SerializeFailed { size: 8 })) => {}
        other => panic!("expected SerializeFailed, got {other:?}"),
    }

    // The failure is transient; the next attempt succeeds.
    assert!(session.serialize().is_ok());
}

#[test]
fn test_zero_size_reads_as_unsupported() {
    let _guard = TEST_LOCK.lock();
    reset_mock();

    let mut session = loaded_session(SharedVideoSink::default(), SharedAudioSink::default());
    world().serialize_unsupported = true;

    assert_eq!(session.serialize_size().unwrap(), 0);
    match session.serialize() {
        Err(FrontendError::Core(CoreError::SaveStateUnsupported)) => {}
        other => panic!("expected SaveStateUnsupported, got {other:?}"),
    }
}
