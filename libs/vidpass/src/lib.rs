// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Single-session video pass-through.
//!
//! A [`Session`] binds one input stream (a camera index) to one output file,
//! and moves frames between them one at a time:
//!
//! ```text
//! Closed --open--> Open --{capture, annotate, persist}*--> Open --close--> Closed
//! ```
//!
//! Capture, encode and text rasterization are not implemented here. They are
//! delegated to a [`MediaBackend`]: [`OpenCvBackend`] (feature `opencv`) for
//! real devices, or [`SyntheticBackend`] for tests and dry runs.
//!
//! # Example
//!
//! ```
//! use vidpass::{Rgba, Session, SessionConfig, SyntheticBackend, SyntheticDevice};
//!
//! let backend = SyntheticBackend::new().with_device(0, SyntheticDevice::new(320, 240, 30.0));
//! let recording = backend.recording();
//! let dir = tempfile::tempdir().unwrap();
//!
//! let mut session = Session::new(backend, SessionConfig::default());
//! session.open(0, dir.path().join("out.mp4")).unwrap();
//! session.capture().unwrap();
//! session.annotate(10, 20, "hello", Rgba::new(200, 200, 250, 255)).unwrap();
//! session.persist().unwrap();
//! session.close().unwrap();
//!
//! assert_eq!(recording.frames().len(), 1);
//! ```
//!
//! # Threading
//!
//! A session is single-owner and single-threaded. Every operation takes
//! `&mut self` and runs to completion on the caller's thread; there is no
//! internal locking.

pub mod backend;
pub mod config;
pub mod error;
pub mod session;
pub mod status;

pub use backend::synthetic::{Recording, SyntheticBackend, SyntheticDevice, SyntheticFrame};
#[cfg(feature = "opencv")]
pub use backend::opencv::OpenCvBackend;
pub use backend::{
    FourCc, MediaBackend, OUTPUT_FOURCC, OutputSpec, Rgba, StreamProperties, TextOverlay,
    VideoInput, VideoOutput,
};
pub use config::{ChannelOrder, FrameRateSource, SessionConfig, TextStyle};
pub use error::{BackendError, ConfigError, Result, SessionError};
pub use session::{Session, SessionState};
pub use status::Status;

/// Version of the flat C function table exported by `vidpass-ffi`.
///
/// Increment when a `vp_*` signature or a status code meaning changes.
pub const VIDPASS_ABI_VERSION: u32 = 1;
