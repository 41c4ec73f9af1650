// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! OpenCV backend: `VideoCapture` in, `VideoWriter` out, `put_text` overlay.

use opencv::core::{Mat, Point, Scalar, Size};
use opencv::prelude::*;
use opencv::{imgproc, videoio};

use super::{
    BackendResult, MediaBackend, OutputSpec, StreamProperties, TextOverlay, VideoInput,
    VideoOutput,
};
use crate::error::BackendError;

/// Small Hershey face used for every overlay.
const FONT_FACE: i32 = imgproc::FONT_HERSHEY_COMPLEX_SMALL;

/// [`MediaBackend`] over the `opencv` crate.
#[derive(Debug, Default)]
pub struct OpenCvBackend {
    api_preference: i32,
}

impl OpenCvBackend {
    /// Let OpenCV pick the capture API (`CAP_ANY`).
    pub fn new() -> Self {
        Self {
            api_preference: videoio::CAP_ANY,
        }
    }

    /// Force a capture API, e.g. `videoio::CAP_V4L2`.
    pub fn with_api_preference(api_preference: i32) -> Self {
        Self { api_preference }
    }
}

impl MediaBackend for OpenCvBackend {
    type Frame = Mat;
    type Input = OpenCvInput;
    type Output = OpenCvOutput;

    fn open_input(&mut self, device: u32) -> BackendResult<OpenCvInput> {
        let index = i32::try_from(device)
            .map_err(|_| BackendError::Unavailable(format!("device index {} out of range", device)))?;
        let capture = videoio::VideoCapture::new(index, self.api_preference)?;
        if !capture.is_opened()? {
            return Err(BackendError::Unavailable(format!(
                "camera {} could not be opened",
                device
            )));
        }

        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)?;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?;
        let fps = capture.get(videoio::CAP_PROP_FPS)?;
        tracing::debug!(device, width, height, fps, "OpenCV capture opened");

        Ok(OpenCvInput {
            capture,
            properties: StreamProperties {
                width: width.max(0.0) as u32,
                height: height.max(0.0) as u32,
                fps,
            },
        })
    }

    fn open_output(&mut self, spec: &OutputSpec) -> BackendResult<OpenCvOutput> {
        let path = spec.path.to_str().ok_or_else(|| {
            BackendError::Unavailable(format!("{} is not valid UTF-8", spec.path.display()))
        })?;
        let [c1, c2, c3, c4] = spec.fourcc.chars();
        let fourcc = videoio::VideoWriter::fourcc(c1, c2, c3, c4)?;
        let size = Size::new(spec.width as i32, spec.height as i32);

        let writer = videoio::VideoWriter::new(path, fourcc, spec.fps, size, spec.is_color)?;
        if !writer.is_opened()? {
            return Err(BackendError::Unavailable(format!(
                "failed to open video output file {}",
                spec.path.display()
            )));
        }
        Ok(OpenCvOutput { writer })
    }

    fn draw_text(&mut self, frame: &mut Mat, overlay: &TextOverlay<'_>) -> BackendResult<()> {
        let [b, g, r, a] = overlay.bgra;
        let color = Scalar::new(b as f64, g as f64, r as f64, a as f64);
        let line_type = if overlay.style.antialias {
            imgproc::LINE_AA
        } else {
            imgproc::LINE_8
        };
        let origin = Point::new(
            i32::try_from(overlay.x).unwrap_or(i32::MAX),
            i32::try_from(overlay.y).unwrap_or(i32::MAX),
        );
        imgproc::put_text(
            frame,
            overlay.text,
            origin,
            FONT_FACE,
            overlay.style.scale,
            color,
            overlay.style.thickness,
            line_type,
            false,
        )?;
        Ok(())
    }
}

/// Open `VideoCapture`.
pub struct OpenCvInput {
    capture: videoio::VideoCapture,
    properties: StreamProperties,
}

impl VideoInput for OpenCvInput {
    type Frame = Mat;

    fn properties(&self) -> StreamProperties {
        self.properties
    }

    fn read(&mut self) -> BackendResult<Option<Mat>> {
        let mut frame = Mat::default();
        let grabbed = self.capture.read(&mut frame)?;
        if !grabbed || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }

    fn release(&mut self) -> BackendResult<()> {
        self.capture.release()?;
        Ok(())
    }
}

/// Open `VideoWriter`.
pub struct OpenCvOutput {
    writer: videoio::VideoWriter,
}

impl VideoOutput for OpenCvOutput {
    type Frame = Mat;

    fn write(&mut self, frame: &Mat) -> BackendResult<()> {
        self.writer.write(frame)?;
        Ok(())
    }

    fn release(&mut self) -> BackendResult<()> {
        self.writer.release()?;
        Ok(())
    }
}
