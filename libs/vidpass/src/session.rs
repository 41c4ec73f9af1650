// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Video pass-through session state machine.
//!
//! ```text
//! Closed --open(ok)--> Open
//! Closed --open(err)--> Closed
//! Open --capture/annotate/persist (ok|err)--> Open
//! Open --close--> Closed
//! ```
//!
//! No failure is terminal: after any error the session is in a well-defined
//! state from which the caller may retry or stop.

use std::path::Path;

use crate::backend::{
    MediaBackend, OUTPUT_FOURCC, OutputSpec, Rgba, StreamProperties, TextOverlay, VideoInput,
    VideoOutput,
};
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Open,
}

/// One input stream, one output stream and the frame in flight between them.
///
/// Single-owner: every operation takes `&mut self`. Sharing a session across
/// threads requires the caller to serialize access.
pub struct Session<B: MediaBackend> {
    backend: B,
    config: SessionConfig,
    input: Option<B::Input>,
    output: Option<B::Output>,
    frame: Option<B::Frame>,
    properties: Option<StreamProperties>,
    output_spec: Option<OutputSpec>,
    frames_written: u64,
}

impl<B: MediaBackend> Session<B> {
    pub fn new(backend: B, config: SessionConfig) -> Self {
        Self {
            backend,
            config,
            input: None,
            output: None,
            frame: None,
            properties: None,
            output_spec: None,
            frames_written: 0,
        }
    }

    /// Bind input device `device` and create the output file at `output_path`.
    ///
    /// The output takes the input's native frame size, the fixed `MP4V`
    /// codec, and the rate selected by [`SessionConfig::output_fps`]. If the
    /// output cannot be created the input is released again and the session
    /// stays closed.
    pub fn open(&mut self, device: u32, output_path: impl AsRef<Path>) -> Result<()> {
        if self.is_open() {
            return Err(SessionError::AlreadyOpen);
        }
        let output_path = output_path.as_ref();

        let mut input = self.backend.open_input(device).map_err(|e| {
            tracing::warn!(device, error = %e, "Input device unavailable");
            SessionError::InputUnavailable { device }
        })?;
        let properties = input.properties();

        let spec = OutputSpec {
            path: output_path.to_path_buf(),
            fourcc: OUTPUT_FOURCC,
            fps: self.config.output_fps(properties.fps),
            width: properties.width,
            height: properties.height,
            is_color: true,
        };

        let output = match self.backend.open_output(&spec) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(path = %output_path.display(), error = %e, "Failed to open video output file");
                if let Err(release_err) = input.release() {
                    tracing::warn!(device, error = %release_err, "Failed to release input after output error");
                }
                return Err(SessionError::OutputCreate {
                    path: spec.path,
                    reason: e.to_string(),
                });
            }
        };

        tracing::info!(
            device,
            path = %output_path.display(),
            width = spec.width,
            height = spec.height,
            fps = spec.fps,
            fourcc = %spec.fourcc,
            "Session opened"
        );

        self.input = Some(input);
        self.output = Some(output);
        self.frame = None;
        self.properties = Some(properties);
        self.output_spec = Some(spec);
        self.frames_written = 0;
        Ok(())
    }

    /// Pull the next frame from the input, replacing the current frame.
    ///
    /// Blocks until the input delivers a frame or signals end of stream. On
    /// [`SessionError::EndOfStream`] the current frame is dropped, so
    /// `annotate` and `persist` are refused until a later capture succeeds.
    pub fn capture(&mut self) -> Result<()> {
        let input = self.input.as_mut().ok_or(SessionError::NotOpen)?;
        match input.read()? {
            Some(frame) => {
                self.frame = Some(frame);
                Ok(())
            }
            None => {
                tracing::debug!("Input returned an empty frame");
                self.frame = None;
                Err(SessionError::EndOfStream)
            }
        }
    }

    /// Draw `text` onto the current frame with its bottom-left corner at `(x, y)`.
    ///
    /// Uses the configured [`TextStyle`](crate::TextStyle). Alpha only affects
    /// four-channel frames.
    pub fn annotate(&mut self, x: u32, y: u32, text: &str, color: Rgba) -> Result<()> {
        let frame = self.frame.as_mut().ok_or(SessionError::NoCurrentFrame)?;
        let overlay = TextOverlay {
            x,
            y,
            text,
            bgra: color.to_bgra(),
            style: self.config.text,
        };
        self.backend.draw_text(frame, &overlay)?;
        Ok(())
    }

    /// [`annotate`](Self::annotate) with four raw color bytes interpreted per
    /// the configured channel order.
    pub fn annotate_bytes(&mut self, x: u32, y: u32, text: &str, color: [u8; 4]) -> Result<()> {
        let color = Rgba::from_bytes(color, self.config.channel_order);
        self.annotate(x, y, text, color)
    }

    /// Append the current frame, as annotated so far, to the output.
    pub fn persist(&mut self) -> Result<()> {
        let output = self.output.as_mut().ok_or(SessionError::OutputClosed)?;
        let frame = self.frame.as_ref().ok_or(SessionError::NoCurrentFrame)?;
        output.write(frame)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Finalize the output and release both streams.
    ///
    /// Each handle is released independently: a failure releasing one is
    /// logged and does not prevent releasing the other. Closing a closed
    /// session does nothing.
    pub fn close(&mut self) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }

        if let Some(mut output) = self.output.take() {
            if let Err(e) = output.release() {
                tracing::warn!(error = %e, "Failed to finalize output stream");
            }
        }
        if let Some(mut input) = self.input.take() {
            if let Err(e) = input.release() {
                tracing::warn!(error = %e, "Failed to release input stream");
            }
        }
        self.frame = None;

        tracing::info!(frames_written = self.frames_written, "Session closed");
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        if self.is_open() {
            SessionState::Open
        } else {
            SessionState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.input.is_some() || self.output.is_some()
    }

    pub fn has_frame(&self) -> bool {
        self.frame.is_some()
    }

    pub fn current_frame(&self) -> Option<&B::Frame> {
        self.frame.as_ref()
    }

    /// Input properties captured at the last successful `open`.
    pub fn input_properties(&self) -> Option<StreamProperties> {
        self.properties
    }

    /// Output stream parameters from the last successful `open`.
    pub fn output_spec(&self) -> Option<&OutputSpec> {
        self.output_spec.as_ref()
    }

    /// Frames persisted since the last successful `open`.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: MediaBackend> Drop for Session<B> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
