// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! In-memory backend.
//!
//! Devices generate BGR test-pattern frames, outputs record what was written
//! into a shared [`Recording`], and text is rasterized as solid blocks, one
//! cell per non-space character. No file is ever written; `open_output`
//! only checks that the target's parent directory exists.
//!
//! Used by the test suites, by `vidpass record --synthetic`, and by the FFI
//! library when it is built without OpenCV.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{
    BackendResult, MediaBackend, OutputSpec, StreamProperties, TextOverlay, VideoInput,
    VideoOutput,
};
use crate::error::BackendError;

/// Glyph cell size at text scale 1.0.
pub const GLYPH_WIDTH: u32 = 8;
pub const GLYPH_HEIGHT: u32 = 12;

/// A test-pattern camera.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticDevice {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// `None` for a live device, `Some(n)` for a recording that ends after
    /// `n` frames.
    pub frame_limit: Option<u64>,
}

impl SyntheticDevice {
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        Self {
            width,
            height,
            fps,
            frame_limit: None,
        }
    }

    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }
}

/// Packed 8-bit BGR image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntheticFrame {
    pub width: u32,
    pub height: u32,
    /// Position of the frame in its input stream.
    pub index: u64,
    pub data: Vec<u8>,
}

impl SyntheticFrame {
    /// Gradient that shifts with `index`, so consecutive frames differ.
    pub fn test_pattern(width: u32, height: u32, index: u64) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height as u64 {
            for x in 0..width as u64 {
                data.push(((x + index) % 256) as u8);
                data.push((y % 256) as u8);
                data.push(((index * 7) % 256) as u8);
            }
        }
        Self {
            width,
            height,
            index,
            data,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        let offset = self.offset(x, y)?;
        Some([self.data[offset], self.data[offset + 1], self.data[offset + 2]])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, bgr: [u8; 3]) {
        if let Some(offset) = self.offset(x, y) {
            self.data[offset..offset + 3].copy_from_slice(&bgr);
        }
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 3)
    }
}

/// Pixel rectangle `[x0, x1) × [y0, y1)` that drawing `overlay` may touch,
/// before clipping to the frame.
pub fn text_region(overlay: &TextOverlay<'_>) -> (i64, i64, i64, i64) {
    let (cell_w, cell_h) = cell_size(overlay.style.scale);
    let chars = overlay.text.chars().count() as i64;
    let x0 = overlay.x as i64;
    let y1 = overlay.y as i64;
    (
        x0,
        y1 - cell_h,
        x0.saturating_add(chars.saturating_mul(cell_w)),
        y1,
    )
}

/// Cells are capped at `u32::MAX` so region arithmetic stays in range for
/// any positive scale.
fn cell_size(scale: f64) -> (i64, i64) {
    let cap = u32::MAX as f64;
    let w = (GLYPH_WIDTH as f64 * scale).round().clamp(2.0, cap) as i64;
    let h = (GLYPH_HEIGHT as f64 * scale).round().clamp(1.0, cap) as i64;
    (w, h)
}

#[derive(Debug, Default)]
struct RecordingState {
    output_spec: Option<OutputSpec>,
    frames: Vec<SyntheticFrame>,
    finalized: bool,
    inputs_opened: usize,
    input_releases: usize,
    outputs_opened: usize,
    output_releases: usize,
}

/// Shared view of everything the synthetic backend's outputs received.
#[derive(Clone, Debug, Default)]
pub struct Recording {
    state: Arc<Mutex<RecordingState>>,
}

impl Recording {
    /// Spec of the most recently opened output.
    pub fn output_spec(&self) -> Option<OutputSpec> {
        self.state.lock().output_spec.clone()
    }

    /// Frames written to the most recently opened output.
    pub fn frames(&self) -> Vec<SyntheticFrame> {
        self.state.lock().frames.clone()
    }

    /// Whether the most recently opened output has been released.
    pub fn finalized(&self) -> bool {
        self.state.lock().finalized
    }

    pub fn inputs_opened(&self) -> usize {
        self.state.lock().inputs_opened
    }

    /// Release attempts on inputs, successful or not.
    pub fn input_releases(&self) -> usize {
        self.state.lock().input_releases
    }

    pub fn outputs_opened(&self) -> usize {
        self.state.lock().outputs_opened
    }

    /// Release attempts on outputs, successful or not.
    pub fn output_releases(&self) -> usize {
        self.state.lock().output_releases
    }
}

/// In-memory [`MediaBackend`].
#[derive(Debug, Default)]
pub struct SyntheticBackend {
    devices: HashMap<u32, SyntheticDevice>,
    unwritable: HashSet<PathBuf>,
    failing_release: bool,
    recording: Recording,
}

impl SyntheticBackend {
    /// A backend with no devices.
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend with a 640×480 @ 30 live device at index 0.
    pub fn with_default_device() -> Self {
        Self::new().with_device(0, SyntheticDevice::new(640, 480, 30.0))
    }

    pub fn with_device(mut self, index: u32, device: SyntheticDevice) -> Self {
        self.devices.insert(index, device);
        self
    }

    /// Make `open_output` fail for `path`.
    pub fn with_unwritable(mut self, path: impl Into<PathBuf>) -> Self {
        self.unwritable.insert(path.into());
        self
    }

    /// Make every `release` report an error (after recording the attempt).
    pub fn with_failing_release(mut self) -> Self {
        self.failing_release = true;
        self
    }

    pub fn recording(&self) -> Recording {
        self.recording.clone()
    }

    fn writable(&self, path: &Path) -> bool {
        if self.unwritable.contains(path) {
            return false;
        }
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.is_dir(),
            _ => true,
        }
    }
}

impl MediaBackend for SyntheticBackend {
    type Frame = SyntheticFrame;
    type Input = SyntheticInput;
    type Output = SyntheticOutput;

    fn open_input(&mut self, device: u32) -> BackendResult<SyntheticInput> {
        let config = self
            .devices
            .get(&device)
            .cloned()
            .ok_or_else(|| BackendError::Unavailable(format!("no synthetic device {}", device)))?;
        self.recording.state.lock().inputs_opened += 1;
        Ok(SyntheticInput {
            device: config,
            next_index: 0,
            failing_release: self.failing_release,
            recording: self.recording.clone(),
        })
    }

    fn open_output(&mut self, spec: &OutputSpec) -> BackendResult<SyntheticOutput> {
        if spec.width == 0 || spec.height == 0 {
            return Err(BackendError::Unavailable(format!(
                "invalid frame size {}x{}",
                spec.width, spec.height
            )));
        }
        if !self.writable(&spec.path) {
            return Err(BackendError::Unavailable(format!(
                "{} is not writable",
                spec.path.display()
            )));
        }

        let mut state = self.recording.state.lock();
        state.output_spec = Some(spec.clone());
        state.frames.clear();
        state.finalized = false;
        state.outputs_opened += 1;
        drop(state);

        Ok(SyntheticOutput {
            width: spec.width,
            height: spec.height,
            failing_release: self.failing_release,
            recording: self.recording.clone(),
        })
    }

    fn draw_text(
        &mut self,
        frame: &mut SyntheticFrame,
        overlay: &TextOverlay<'_>,
    ) -> BackendResult<()> {
        let (cell_w, cell_h) = cell_size(overlay.style.scale);
        let (x0, y0, _, y1) = text_region(overlay);
        let bgr = [overlay.bgra[0], overlay.bgra[1], overlay.bgra[2]];

        for (i, c) in overlay.text.chars().enumerate() {
            if c.is_whitespace() {
                continue;
            }
            let cx = x0.saturating_add((i as i64).saturating_mul(cell_w));
            if cx >= frame.width as i64 {
                break;
            }
            // Rightmost column of each cell is left blank as letter spacing.
            for py in y0.max(0)..y1.min(frame.height as i64) {
                for px in cx.max(0)..(cx + cell_w - 1).min(frame.width as i64) {
                    frame.set_pixel(px as u32, py as u32, bgr);
                }
            }
        }
        Ok(())
    }
}

/// Input handle of the [`SyntheticBackend`].
#[derive(Debug)]
pub struct SyntheticInput {
    device: SyntheticDevice,
    next_index: u64,
    failing_release: bool,
    recording: Recording,
}

impl VideoInput for SyntheticInput {
    type Frame = SyntheticFrame;

    fn properties(&self) -> StreamProperties {
        StreamProperties {
            width: self.device.width,
            height: self.device.height,
            fps: self.device.fps,
        }
    }

    fn read(&mut self) -> BackendResult<Option<SyntheticFrame>> {
        if self.device.frame_limit.is_some_and(|limit| self.next_index >= limit) {
            return Ok(None);
        }
        let frame =
            SyntheticFrame::test_pattern(self.device.width, self.device.height, self.next_index);
        self.next_index += 1;
        Ok(Some(frame))
    }

    fn release(&mut self) -> BackendResult<()> {
        self.recording.state.lock().input_releases += 1;
        if self.failing_release {
            return Err(BackendError::Operation("input release failed".into()));
        }
        Ok(())
    }
}

/// Output handle of the [`SyntheticBackend`].
#[derive(Debug)]
pub struct SyntheticOutput {
    width: u32,
    height: u32,
    failing_release: bool,
    recording: Recording,
}

impl VideoOutput for SyntheticOutput {
    type Frame = SyntheticFrame;

    fn write(&mut self, frame: &SyntheticFrame) -> BackendResult<()> {
        if frame.width != self.width || frame.height != self.height {
            return Err(BackendError::Operation(format!(
                "frame is {}x{}, output expects {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }
        let mut state = self.recording.state.lock();
        if state.finalized {
            return Err(BackendError::Operation("output already finalized".into()));
        }
        state.frames.push(frame.clone());
        Ok(())
    }

    fn release(&mut self) -> BackendResult<()> {
        let mut state = self.recording.state.lock();
        state.output_releases += 1;
        state.finalized = true;
        if self.failing_release {
            return Err(BackendError::Operation("output release failed".into()));
        }
        Ok(())
    }
}
