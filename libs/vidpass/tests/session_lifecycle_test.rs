// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Session Lifecycle Integration Test
//!
//! Drives a `Session` over the synthetic backend and verifies:
//! 1. Ordering: annotate/persist are refused until a capture succeeds
//! 2. Capture always replaces the current frame
//! 3. Output dimensions and rate follow the input at open time
//! 4. Open failures report stable, distinct status codes
//! 5. Annotation leaves pixels outside the text region untouched
//! 6. End of stream, close and resource release behavior

use std::path::PathBuf;

use vidpass::backend::synthetic::text_region;
use vidpass::{
    FrameRateSource, OUTPUT_FOURCC, Rgba, Session, SessionConfig, SessionError, SessionState,
    Status, SyntheticBackend, SyntheticDevice, TextOverlay, TextStyle,
};

// =============================================================================
// Helpers
// =============================================================================

const TEXT_COLOR: Rgba = Rgba::new(200, 200, 250, 255);

fn camera() -> SyntheticDevice {
    SyntheticDevice::new(160, 120, 30.0)
}

fn open_session(backend: SyntheticBackend) -> (Session<SyntheticBackend>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(backend, SessionConfig::default());
    session.open(0, dir.path().join("out.mp4")).unwrap();
    (session, dir)
}

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn test_annotate_and_persist_require_capture_after_open() {
    let (mut session, _dir) = open_session(SyntheticBackend::new().with_device(0, camera()));

    let err = session.annotate(10, 20, "early", TEXT_COLOR).unwrap_err();
    assert!(matches!(err, SessionError::NoCurrentFrame));
    assert_eq!(err.status(), Status::NoCurrentFrame);

    let err = session.persist().unwrap_err();
    assert!(matches!(err, SessionError::NoCurrentFrame));

    session.capture().unwrap();
    session.annotate(10, 20, "ok", TEXT_COLOR).unwrap();
    session.persist().unwrap();
    assert_eq!(session.frames_written(), 1);
}

#[test]
fn test_operations_before_open_are_precondition_errors() {
    let mut session = Session::new(
        SyntheticBackend::new().with_device(0, camera()),
        SessionConfig::default(),
    );
    assert!(matches!(session.capture(), Err(SessionError::NotOpen)));
    assert!(matches!(
        session.annotate(0, 0, "x", TEXT_COLOR),
        Err(SessionError::NoCurrentFrame)
    ));
    assert!(matches!(session.persist(), Err(SessionError::OutputClosed)));
    assert_eq!(session.state(), SessionState::Closed);
}

// =============================================================================
// Capture overwrites
// =============================================================================

#[test]
fn test_capture_replaces_current_frame() {
    let (mut session, _dir) = open_session(SyntheticBackend::new().with_device(0, camera()));

    session.capture().unwrap();
    let first = session.current_frame().unwrap().clone();
    session.capture().unwrap();
    let second = session.current_frame().unwrap().clone();

    assert_eq!(first.index, 0);
    assert_eq!(second.index, 1);
    assert_ne!(first.data, second.data);

    session.persist().unwrap();
    let recording = session.backend().recording();
    let written = recording.frames();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].index, 1);
}

// =============================================================================
// Dimension and rate propagation
// =============================================================================

#[test]
fn test_output_matches_input_dimensions() {
    let backend = SyntheticBackend::new().with_device(2, SyntheticDevice::new(320, 180, 24.0));
    let recording = backend.recording();
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(backend, SessionConfig::default());
    session.open(2, dir.path().join("out.mp4")).unwrap();

    let input = session.input_properties().unwrap();
    let spec = recording.output_spec().unwrap();
    assert_eq!((spec.width, spec.height), (input.width, input.height));
    assert_eq!((spec.width, spec.height), (320, 180));
    assert_eq!(spec.fps, 24.0);
    assert_eq!(spec.fourcc, OUTPUT_FOURCC);
    assert!(spec.is_color);
}

#[test]
fn test_fixed_and_fallback_frame_rates() {
    let dir = tempfile::tempdir().unwrap();

    let backend = SyntheticBackend::new().with_device(0, SyntheticDevice::new(16, 16, 0.0));
    let recording = backend.recording();
    let mut session = Session::new(backend, SessionConfig::default());
    session.open(0, dir.path().join("fallback.mp4")).unwrap();
    assert_eq!(recording.output_spec().unwrap().fps, 30.0);
    session.close().unwrap();

    let backend = SyntheticBackend::new().with_device(0, SyntheticDevice::new(16, 16, 60.0));
    let recording = backend.recording();
    let config = SessionConfig::default().with_frame_rate(FrameRateSource::Fixed { fps: 15.0 });
    let mut session = Session::new(backend, config);
    session.open(0, dir.path().join("fixed.mp4")).unwrap();
    assert_eq!(recording.output_spec().unwrap().fps, 15.0);
}

// =============================================================================
// Status code stability
// =============================================================================

#[test]
fn test_open_failure_codes_are_stable_and_distinct() {
    let dir = tempfile::tempdir().unwrap();

    let mut missing_camera = Session::new(SyntheticBackend::new(), SessionConfig::default());
    let codes: Vec<Status> = (0..3)
        .map(|_| {
            missing_camera
                .open(0, dir.path().join("out.mp4"))
                .unwrap_err()
                .status()
        })
        .collect();
    assert!(codes.iter().all(|s| *s == Status::Unavailable));

    let mut bad_path = Session::new(
        SyntheticBackend::new().with_device(0, camera()),
        SessionConfig::default(),
    );
    let codes: Vec<Status> = (0..3)
        .map(|_| {
            bad_path
                .open(0, "/nonexistent-dir/out.mp4")
                .unwrap_err()
                .status()
        })
        .collect();
    assert!(codes.iter().all(|s| *s == Status::OutputCreate));
    assert_ne!(Status::Unavailable.code(), Status::OutputCreate.code());
}

// =============================================================================
// Annotation locality
// =============================================================================

#[test]
fn test_annotate_only_touches_text_region() {
    let (mut session, _dir) = open_session(SyntheticBackend::new().with_device(0, camera()));
    session.capture().unwrap();
    let before = session.current_frame().unwrap().clone();

    session.annotate(10, 20, "hello", TEXT_COLOR).unwrap();
    let after = session.current_frame().unwrap().clone();

    let (x0, y0, x1, y1) = text_region(&TextOverlay {
        x: 10,
        y: 20,
        text: "hello",
        bgra: TEXT_COLOR.to_bgra(),
        style: TextStyle::default(),
    });
    let mut changed = 0usize;
    for y in 0..after.height {
        for x in 0..after.width {
            if before.pixel(x, y) == after.pixel(x, y) {
                continue;
            }
            let (xi, yi) = (x as i64, y as i64);
            assert!(
                xi >= x0 && xi < x1 && yi >= y0 && yi < y1,
                "pixel ({}, {}) modified outside the text region",
                x,
                y
            );
            changed += 1;
        }
    }
    assert!(changed > 0, "annotation drew nothing");
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_missing_camera_creates_no_output() {
    let backend = SyntheticBackend::new();
    let recording = backend.recording();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.mp4");
    let mut session = Session::new(backend, SessionConfig::default());

    let err = session.open(0, &path).unwrap_err();
    assert!(matches!(err, SessionError::InputUnavailable { device: 0 }));
    assert_eq!(recording.outputs_opened(), 0);
    assert!(!path.exists());
}

#[test]
fn test_unwritable_output_path() {
    let backend = SyntheticBackend::new()
        .with_device(0, camera())
        .with_unwritable("/root/no-permission.mp4");
    let mut session = Session::new(backend, SessionConfig::default());
    let err = session.open(0, "/root/no-permission.mp4").unwrap_err();
    match err {
        SessionError::OutputCreate { path, .. } => {
            assert_eq!(path, PathBuf::from("/root/no-permission.mp4"))
        }
        other => panic!("expected OutputCreate, got {:?}", other),
    }
}

#[test]
fn test_single_annotated_frame_round_trip() {
    let backend = SyntheticBackend::new().with_device(0, camera());
    let recording = backend.recording();
    let (mut session, _dir) = open_session(backend);

    session.capture().unwrap();
    session.annotate(10, 20, "hello", TEXT_COLOR).unwrap();
    session.persist().unwrap();
    session.close().unwrap();

    assert!(recording.finalized());
    let frames = recording.frames();
    assert_eq!(frames.len(), 1);
    // BGR of (r=200, g=200, b=250) just above the anchor point.
    assert_eq!(frames[0].pixel(11, 18), Some([250, 200, 200]));
}

#[test]
fn test_capture_after_failed_open_is_refused() {
    let mut session = Session::new(SyntheticBackend::new(), SessionConfig::default());
    assert!(session.open(0, "out.mp4").is_err());
    let err = session.capture().unwrap_err();
    assert!(matches!(err, SessionError::NotOpen));
    assert!(err.status().code() < 0);
}

#[test]
fn test_end_of_recorded_stream() {
    let backend =
        SyntheticBackend::new().with_device(0, SyntheticDevice::new(8, 8, 30.0).with_frame_limit(2));
    let recording = backend.recording();
    let (mut session, _dir) = open_session(backend);

    session.capture().unwrap();
    session.persist().unwrap();
    session.capture().unwrap();
    session.persist().unwrap();

    let err = session.capture().unwrap_err();
    assert!(matches!(err, SessionError::EndOfStream));
    assert_eq!(err.status(), Status::Unavailable);
    assert_eq!(session.state(), SessionState::Open);
    assert!(!session.has_frame());

    session.close().unwrap();
    assert!(matches!(session.persist(), Err(SessionError::OutputClosed)));
    assert_eq!(recording.frames().len(), 2);
}

#[test]
fn test_persist_and_annotate_refused_after_end_of_stream() {
    let backend =
        SyntheticBackend::new().with_device(0, SyntheticDevice::new(8, 8, 30.0).with_frame_limit(1));
    let recording = backend.recording();
    let (mut session, _dir) = open_session(backend);

    session.capture().unwrap();
    session.persist().unwrap();
    assert!(matches!(session.capture(), Err(SessionError::EndOfStream)));

    let err = session.persist().unwrap_err();
    assert!(matches!(err, SessionError::NoCurrentFrame));
    assert_eq!(err.status(), Status::NoCurrentFrame);
    assert!(matches!(
        session.annotate(1, 7, "x", TEXT_COLOR),
        Err(SessionError::NoCurrentFrame)
    ));
    assert_eq!(recording.frames().len(), 1);

    // Still open, and the end of stream is sticky.
    assert_eq!(session.state(), SessionState::Open);
    assert!(matches!(session.capture(), Err(SessionError::EndOfStream)));
    session.close().unwrap();
    assert_eq!(recording.frames().len(), 1);
}

// =============================================================================
// Resource release
// =============================================================================

#[test]
fn test_close_releases_both_streams_even_when_one_fails() {
    let backend = SyntheticBackend::new()
        .with_device(0, camera())
        .with_failing_release();
    let recording = backend.recording();
    let (mut session, _dir) = open_session(backend);
    session.capture().unwrap();

    session.close().unwrap();
    assert_eq!(recording.output_releases(), 1);
    assert_eq!(recording.input_releases(), 1);
    assert_eq!(session.state(), SessionState::Closed);
    assert!(!session.has_frame());
}
