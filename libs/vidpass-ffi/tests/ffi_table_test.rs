// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! C function table tests.
//!
//! Calls the `vp_*` symbols the way a foreign host would: raw pointers,
//! NUL-terminated strings, integer status codes. Runs against the built-in
//! test-pattern camera, so it only applies to builds without OpenCV.

#![cfg(not(feature = "opencv"))]

use std::ffi::{CStr, CString};
use std::ptr;

use vidpass::Status;
use vidpass_ffi::*;

fn c_path(dir: &tempfile::TempDir, name: &str) -> CString {
    CString::new(dir.path().join(name).to_str().unwrap()).unwrap()
}

#[test]
fn test_abi_version() {
    assert_eq!(vp_abi_version(), vidpass::VIDPASS_ABI_VERSION);
}

#[test]
fn test_full_pass_through_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = c_path(&dir, "out.mp4");
    let text = CString::new("hello").unwrap();

    unsafe {
        let session = vp_session_create();
        assert!(!session.is_null());

        assert_eq!(vp_open(session, 0, path.as_ptr()), 0);
        assert_eq!(vp_capture(session), 0);
        assert_eq!(vp_annotate(session, 10, 20, text.as_ptr(), 200, 200, 250, 255), 0);
        assert_eq!(vp_persist(session), 0);
        assert_eq!(vp_close(session), 0);
        assert_eq!(vp_close(session), 0);

        vp_session_destroy(session);
    }
}

#[test]
fn test_open_failure_codes() {
    let dir = tempfile::tempdir().unwrap();
    let good = c_path(&dir, "out.mp4");
    let unwritable = CString::new("/nonexistent-dir/out.mp4").unwrap();

    unsafe {
        let session = vp_session_create();
        assert_eq!(vp_open(session, 7, good.as_ptr()), -1);
        assert_eq!(vp_open(session, 7, good.as_ptr()), -1);
        assert_eq!(vp_open(session, 0, unwritable.as_ptr()), -2);
        assert_eq!(vp_open(session, 0, unwritable.as_ptr()), -2);

        assert_eq!(vp_open(session, 0, good.as_ptr()), 0);
        assert_eq!(
            vp_open(session, 0, good.as_ptr()),
            Status::AlreadyOpen.code()
        );
        vp_session_destroy(session);
    }
}

#[test]
fn test_out_of_order_calls() {
    let dir = tempfile::tempdir().unwrap();
    let path = c_path(&dir, "out.mp4");
    let text = CString::new("x").unwrap();

    unsafe {
        let session = vp_session_create();
        assert_eq!(vp_capture(session), Status::NotOpen.code());
        assert_eq!(vp_persist(session), Status::OutputClosed.code());
        assert_eq!(
            vp_annotate(session, 0, 0, text.as_ptr(), 0, 0, 0, 0),
            Status::NoCurrentFrame.code()
        );

        assert_eq!(vp_open(session, 0, path.as_ptr()), 0);
        assert_eq!(vp_persist(session), Status::NoCurrentFrame.code());
        assert_eq!(vp_close(session), 0);
        assert_eq!(vp_persist(session), Status::OutputClosed.code());
        vp_session_destroy(session);
    }
}

#[test]
fn test_invalid_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let path = c_path(&dir, "out.mp4");
    let invalid = Status::InvalidArgument.code();

    unsafe {
        assert_eq!(vp_open(ptr::null_mut(), 0, path.as_ptr()), invalid);
        assert_eq!(vp_capture(ptr::null_mut()), invalid);
        assert_eq!(vp_persist(ptr::null_mut()), invalid);
        assert_eq!(vp_close(ptr::null_mut()), invalid);

        let session = vp_session_create();
        assert_eq!(vp_open(session, 0, ptr::null()), invalid);

        let not_utf8 = [0xffu8, 0xfe, 0x00];
        assert_eq!(vp_open(session, 0, not_utf8.as_ptr().cast()), invalid);

        assert_eq!(vp_open(session, 0, path.as_ptr()), 0);
        assert_eq!(vp_capture(session), 0);
        assert_eq!(
            vp_annotate(session, 0, 0, ptr::null(), 0, 0, 0, 0),
            invalid
        );
        vp_session_destroy(session);
        vp_session_destroy(ptr::null_mut());
    }
}

#[test]
fn test_session_config_from_toml() {
    let good = CString::new("channel_order = \"bgra\"\n[frame_rate]\nsource = \"fixed\"\nfps = 10.0\n")
        .unwrap();
    let bad = CString::new("[frame_rate]\nsource = \"fixed\"\nfps = -3.0\n").unwrap();
    let garbage = CString::new("this is not toml = = =").unwrap();

    unsafe {
        let session = vp_session_create_with_config(good.as_ptr());
        assert!(!session.is_null());
        vp_session_destroy(session);

        let session = vp_session_create_with_config(ptr::null());
        assert!(!session.is_null());
        vp_session_destroy(session);

        assert!(vp_session_create_with_config(bad.as_ptr()).is_null());
        assert!(vp_session_create_with_config(garbage.as_ptr()).is_null());
    }
}

#[test]
fn test_status_messages() {
    for status in Status::ALL {
        let msg = unsafe { CStr::from_ptr(vp_status_message(status.code())) };
        assert_eq!(msg, status.message());
    }
    let unknown = unsafe { CStr::from_ptr(vp_status_message(42)) };
    assert_eq!(unknown.to_str().unwrap(), "unknown status");
}

#[test]
fn test_header_matches_status_codes() {
    let header = include_str!("../include/vidpass.h");
    let defines: Vec<(String, i32)> = header
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            if parts.next()? != "#define" {
                return None;
            }
            let name = parts.next()?;
            let value = parts.next()?.parse::<i32>().ok()?;
            name.starts_with("VP_").then(|| (name.to_string(), value))
        })
        .collect();

    assert_eq!(defines.len(), Status::ALL.len());
    for (name, value) in &defines {
        assert!(
            Status::from_code(*value).is_some(),
            "{} = {} is not a known status",
            name,
            value
        );
    }
    assert!(header.contains(&format!(
        "#define VIDPASS_ABI_VERSION {}",
        vidpass::VIDPASS_ABI_VERSION
    )));
}
