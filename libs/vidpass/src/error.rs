// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::path::PathBuf;

use thiserror::Error;

use crate::status::Status;

/// Failure of a session operation.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Input device {device} could not be opened")]
    InputUnavailable { device: u32 },

    #[error("Output sink {} could not be created: {reason}", path.display())]
    OutputCreate { path: PathBuf, reason: String },

    #[error("Input stream has no more frames")]
    EndOfStream,

    #[error("No frame has been captured")]
    NoCurrentFrame,

    #[error("Output stream is closed")]
    OutputClosed,

    #[error("Session is not open")]
    NotOpen,

    #[error("Session is already open")]
    AlreadyOpen,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl SessionError {
    /// Status code reported across the C boundary for this error.
    pub fn status(&self) -> Status {
        match self {
            SessionError::InputUnavailable { .. } | SessionError::EndOfStream => {
                Status::Unavailable
            }
            SessionError::OutputCreate { .. } => Status::OutputCreate,
            SessionError::NoCurrentFrame => Status::NoCurrentFrame,
            SessionError::OutputClosed => Status::OutputClosed,
            SessionError::NotOpen => Status::NotOpen,
            SessionError::AlreadyOpen => Status::AlreadyOpen,
            SessionError::InvalidArgument(_) => Status::InvalidArgument,
            SessionError::Backend(_) => Status::Backend,
        }
    }
}

/// Failure reported by a [`MediaBackend`](crate::MediaBackend) capability.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The device or sink does not exist or refused to open.
    #[error("Resource unavailable: {0}")]
    Unavailable(String),

    /// An operation on an open resource failed.
    #[error("Backend operation failed: {0}")]
    Operation(String),

    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),
}

/// Failure loading or validating a [`SessionConfig`](crate::SessionConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
