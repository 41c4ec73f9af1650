// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

// FFI cdylib: all public functions are unsafe extern "C" called from a foreign host.
#![allow(clippy::missing_safety_doc)]

//! Flat C function table over a [`vidpass::Session`].
//!
//! Every `vp_*` function returns an `i32` status (see [`vidpass::Status`]);
//! `0` is success and failures are negative. The matching C declarations
//! are in `include/vidpass.h`.
//!
//! A `VpSession*` is single-owner: calling into the same handle from
//! several threads at once is unsupported. Different handles are
//! independent.

use std::ffi::{CStr, c_char};
use std::panic::AssertUnwindSafe;
use std::sync::Once;

use vidpass::{Session, SessionConfig, SessionError, Status, VIDPASS_ABI_VERSION};

#[cfg(feature = "opencv")]
type Backend = vidpass::OpenCvBackend;
#[cfg(not(feature = "opencv"))]
type Backend = vidpass::SyntheticBackend;

#[cfg(feature = "opencv")]
fn new_backend() -> Backend {
    vidpass::OpenCvBackend::new()
}

#[cfg(not(feature = "opencv"))]
fn new_backend() -> Backend {
    vidpass::SyntheticBackend::with_default_device()
}

// ============================================================================
// Handle
// ============================================================================

/// Opaque session handle handed to the host.
pub struct VpSession {
    session: Session<Backend>,
}

impl VpSession {
    fn new(config: SessionConfig) -> Self {
        Self {
            session: Session::new(new_backend(), config),
        }
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Environment variable holding the `tracing` filter for the library.
pub const LOG_ENV: &str = "VIDPASS_LOG";

/// Install a stderr subscriber once. A host that already installed a global
/// subscriber keeps it.
fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

// ============================================================================
// Call plumbing
// ============================================================================

/// Run one FFI operation: logging init, panic containment, status mapping.
fn call(op: &'static str, f: impl FnOnce() -> vidpass::Result<()>) -> i32 {
    init_logging();
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Status::Ok.code(),
        Ok(Err(e)) => {
            tracing::debug!(op, status = e.status().code(), error = %e, "vidpass call failed");
            e.status().code()
        }
        Err(_) => {
            tracing::error!(op, "Panic caught at FFI boundary");
            Status::Panic.code()
        }
    }
}

/// Drop a value without letting a panic in its destructor cross the boundary.
fn drop_contained<T>(op: &'static str, value: T) {
    if std::panic::catch_unwind(AssertUnwindSafe(move || drop(value))).is_err() {
        tracing::error!(op, "Panic caught at FFI boundary");
    }
}

unsafe fn session_mut<'a>(ptr: *mut VpSession) -> vidpass::Result<&'a mut Session<Backend>> {
    match unsafe { ptr.as_mut() } {
        Some(handle) => Ok(&mut handle.session),
        None => Err(SessionError::InvalidArgument("null session handle".into())),
    }
}

unsafe fn str_arg<'a>(ptr: *const c_char, name: &str) -> vidpass::Result<&'a str> {
    if ptr.is_null() {
        return Err(SessionError::InvalidArgument(format!("{} is null", name)));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| SessionError::InvalidArgument(format!("{} is not valid UTF-8", name)))
}

// ============================================================================
// C ABI: versioning and diagnostics
// ============================================================================

/// Version of this function table. Hosts should refuse a mismatch.
#[unsafe(no_mangle)]
pub extern "C" fn vp_abi_version() -> u32 {
    VIDPASS_ABI_VERSION
}

/// Static description of a status code. Never null; unknown codes get a
/// generic message.
#[unsafe(no_mangle)]
pub extern "C" fn vp_status_message(code: i32) -> *const c_char {
    Status::from_code(code)
        .map(Status::message)
        .unwrap_or(c"unknown status")
        .as_ptr()
}

// ============================================================================
// C ABI: Handle lifecycle
// ============================================================================

/// Create a session with the default configuration.
///
/// Caller must release it with `vp_session_destroy`.
#[unsafe(no_mangle)]
pub extern "C" fn vp_session_create() -> *mut VpSession {
    init_logging();
    Box::into_raw(Box::new(VpSession::new(SessionConfig::default())))
}

/// Create a session from a TOML configuration document.
///
/// A null `config_toml` selects the defaults. Returns null if the document
/// does not parse or fails validation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vp_session_create_with_config(
    config_toml: *const c_char,
) -> *mut VpSession {
    init_logging();
    if config_toml.is_null() {
        return vp_session_create();
    }
    let parsed = unsafe { str_arg(config_toml, "config_toml") }
        .map_err(|e| e.to_string())
        .and_then(|s| SessionConfig::from_toml_str(s).map_err(|e| e.to_string()));
    match parsed {
        Ok(config) => Box::into_raw(Box::new(VpSession::new(config))),
        Err(e) => {
            tracing::error!(error = %e, "Rejected session config");
            std::ptr::null_mut()
        }
    }
}

/// Close (if open) and free a session. Null is ignored.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vp_session_destroy(session: *mut VpSession) {
    if !session.is_null() {
        init_logging();
        // Session's Drop releases both streams.
        drop_contained("destroy", unsafe { Box::from_raw(session) });
    }
}

// ============================================================================
// C ABI: Session operations
// ============================================================================

/// Bind camera `camera` and create the MP4 file at `output_path`.
///
/// Returns 0, -1 (camera unavailable), -2 (output could not be created),
/// -6 (already open) or -7 (bad argument).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vp_open(
    session: *mut VpSession,
    camera: u32,
    output_path: *const c_char,
) -> i32 {
    call("open", || {
        let session = unsafe { session_mut(session) }?;
        let path = unsafe { str_arg(output_path, "output_path") }?;
        session.open(camera, path)
    })
}

/// Capture the next frame. Returns -1 at end of stream, -5 if not open.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vp_capture(session: *mut VpSession) -> i32 {
    call("capture", || unsafe { session_mut(session) }?.capture())
}

/// Draw `text` onto the current frame with its bottom-left corner at `(x, y)`.
///
/// The four color bytes are interpreted per the session's configured
/// channel order (RGBA unless configured otherwise).
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn vp_annotate(
    session: *mut VpSession,
    x: u32,
    y: u32,
    text: *const c_char,
    c0: u8,
    c1: u8,
    c2: u8,
    c3: u8,
) -> i32 {
    call("annotate", || {
        let session = unsafe { session_mut(session) }?;
        let text = unsafe { str_arg(text, "text") }?;
        session.annotate_bytes(x, y, text, [c0, c1, c2, c3])
    })
}

/// Append the current frame to the output.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vp_persist(session: *mut VpSession) -> i32 {
    call("persist", || unsafe { session_mut(session) }?.persist())
}

/// Finalize the output and release both streams. Safe to call twice.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vp_close(session: *mut VpSession) -> i32 {
    call("close", || unsafe { session_mut(session) }?.close())
}
