// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Integer status codes returned across the C boundary.
//!
//! The set is closed: hosts may switch on these values. `0` is success and
//! every failure is negative. `-1` and `-2` keep the meanings existing
//! callers already rely on ("device or frame unavailable" and "output sink
//! could not be created").

use std::ffi::CStr;

/// Result of a `vp_*` call.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok = 0,
    /// Input device could not be opened, or the input produced no frame.
    Unavailable = -1,
    OutputCreate = -2,
    NoCurrentFrame = -3,
    OutputClosed = -4,
    NotOpen = -5,
    AlreadyOpen = -6,
    InvalidArgument = -7,
    Backend = -8,
    Panic = -9,
}

impl Status {
    pub const ALL: [Status; 10] = [
        Status::Ok,
        Status::Unavailable,
        Status::OutputCreate,
        Status::NoCurrentFrame,
        Status::OutputClosed,
        Status::NotOpen,
        Status::AlreadyOpen,
        Status::InvalidArgument,
        Status::Backend,
        Status::Panic,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Status> {
        Status::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    /// Static, NUL-terminated description of the status.
    pub fn message(self) -> &'static CStr {
        match self {
            Status::Ok => c"success",
            Status::Unavailable => c"input device or frame unavailable",
            Status::OutputCreate => c"output sink could not be created",
            Status::NoCurrentFrame => c"no frame has been captured",
            Status::OutputClosed => c"output stream is closed",
            Status::NotOpen => c"session is not open",
            Status::AlreadyOpen => c"session is already open",
            Status::InvalidArgument => c"invalid argument",
            Status::Backend => c"multimedia backend error",
            Status::Panic => c"internal panic",
        }
    }
}

impl<T> From<&crate::Result<T>> for Status {
    fn from(result: &crate::Result<T>) -> Self {
        match result {
            Ok(_) => Status::Ok,
            Err(e) => e.status(),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message().to_string_lossy(), self.code())
    }
}
