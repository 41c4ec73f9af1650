// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Capability interface the session requires from a multimedia library.
//!
//! A backend opens input streams by device index, opens output streams for a
//! path/codec/rate/size, rasterizes text into its own frame type, and hands
//! back input and output handles that read, write and release.

#[cfg(feature = "opencv")]
pub mod opencv;
pub mod synthetic;

use std::path::PathBuf;

use crate::config::{ChannelOrder, TextStyle};
use crate::error::BackendError;

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Codec every output stream is created with.
pub const OUTPUT_FOURCC: FourCc = FourCc(*b"MP4V");

/// Four-character codec tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    /// Build a tag from four printable ASCII characters.
    pub fn new(tag: &str) -> Option<Self> {
        let bytes: [u8; 4] = tag.as_bytes().try_into().ok()?;
        if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            Some(FourCc(bytes))
        } else {
            None
        }
    }

    pub fn chars(&self) -> [char; 4] {
        self.0.map(char::from)
    }

    /// Little-endian packed code, as used by `VideoWriter::fourcc`.
    pub fn code(&self) -> i32 {
        i32::from_le_bytes(self.0)
    }
}

impl std::fmt::Display for FourCc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for c in self.chars() {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// Native properties of an open input stream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamProperties {
    pub width: u32,
    pub height: u32,
    /// Frame rate the device reports. May be zero or NaN for devices that
    /// do not report one.
    pub fps: f64,
}

/// Everything needed to create an output stream.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputSpec {
    pub path: PathBuf,
    pub fourcc: FourCc,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub is_color: bool,
}

/// Text color as supplied by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Interpret four caller bytes according to `order`.
    pub fn from_bytes(bytes: [u8; 4], order: ChannelOrder) -> Self {
        match order {
            ChannelOrder::Rgba => Self::new(bytes[0], bytes[1], bytes[2], bytes[3]),
            ChannelOrder::Bgra => Self::new(bytes[2], bytes[1], bytes[0], bytes[3]),
        }
    }

    /// Frame-native channel order: `[b, g, r, a]`.
    pub fn to_bgra(self) -> [u8; 4] {
        [self.b, self.g, self.r, self.a]
    }
}

/// A text draw request, with the color already in frame-native `[b, g, r, a]`
/// order. Alpha only has an effect on four-channel frames.
#[derive(Clone, Debug, PartialEq)]
pub struct TextOverlay<'a> {
    pub x: u32,
    pub y: u32,
    pub text: &'a str,
    pub bgra: [u8; 4],
    pub style: TextStyle,
}

/// An open input stream.
pub trait VideoInput {
    type Frame;

    fn properties(&self) -> StreamProperties;

    /// Block until the next frame is available.
    ///
    /// Returns `Ok(None)` when the stream yields an empty frame (device
    /// disconnected or end of a recorded file).
    fn read(&mut self) -> BackendResult<Option<Self::Frame>>;

    fn release(&mut self) -> BackendResult<()>;
}

/// An open output stream.
pub trait VideoOutput {
    type Frame;

    fn write(&mut self, frame: &Self::Frame) -> BackendResult<()>;

    /// Flush the encoder and write the container trailer.
    fn release(&mut self) -> BackendResult<()>;
}

/// Factory for streams plus the text rasterizer.
pub trait MediaBackend {
    type Frame;
    type Input: VideoInput<Frame = Self::Frame>;
    type Output: VideoOutput<Frame = Self::Frame>;

    /// Open the input identified by `device`. Fails with
    /// [`BackendError::Unavailable`] if it cannot be opened.
    fn open_input(&mut self, device: u32) -> BackendResult<Self::Input>;

    /// Create an output sink. Fails if the sink does not report itself open.
    fn open_output(&mut self, spec: &OutputSpec) -> BackendResult<Self::Output>;

    /// Draw `overlay` into `frame` with its bottom-left corner at `(x, y)`.
    fn draw_text(&mut self, frame: &mut Self::Frame, overlay: &TextOverlay<'_>)
    -> BackendResult<()>;
}
