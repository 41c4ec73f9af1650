// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! `vidpass record`: capture → overlay → encode loop.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use vidpass::{MediaBackend, Rgba, Session, SessionConfig, SessionError, SyntheticBackend};

const OVERLAY_COLOR: Rgba = Rgba::new(250, 200, 200, 255);

pub struct RecordArgs {
    pub camera: u32,
    pub output: PathBuf,
    pub frames: u64,
    pub config: Option<PathBuf>,
    pub synthetic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSummary {
    pub frames_written: u64,
    /// The input ran out before the requested frame count.
    pub end_of_stream: bool,
}

pub fn run(args: RecordArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SessionConfig::default(),
    };

    let summary = if args.synthetic {
        let session = Session::new(SyntheticBackend::with_default_device(), config);
        record(session, args.camera, &args.output, args.frames)?
    } else {
        record_device(config, &args)?
    };

    println!("{}", summary_message(&summary, &args.output, args.synthetic));
    Ok(())
}

/// One-line report printed after a recording.
fn summary_message(summary: &RecordSummary, output: &Path, synthetic: bool) -> String {
    let ended = if summary.end_of_stream {
        " (input ended)"
    } else {
        ""
    };
    if synthetic {
        format!(
            "Recorded {} synthetic frames in memory{}; no file written to {}",
            summary.frames_written,
            ended,
            output.display()
        )
    } else {
        format!(
            "Wrote {} frames to {}{}",
            summary.frames_written,
            output.display(),
            ended
        )
    }
}

#[cfg(feature = "opencv")]
fn record_device(config: SessionConfig, args: &RecordArgs) -> Result<RecordSummary> {
    let session = Session::new(vidpass::OpenCvBackend::new(), config);
    record(session, args.camera, &args.output, args.frames)
}

#[cfg(not(feature = "opencv"))]
fn record_device(_config: SessionConfig, _args: &RecordArgs) -> Result<RecordSummary> {
    anyhow::bail!("vidpass was built without OpenCV support; rebuild with --features opencv or pass --synthetic")
}

/// Record up to `frames` frames from `camera` into `output`.
pub fn record<B: MediaBackend>(
    mut session: Session<B>,
    camera: u32,
    output: &Path,
    frames: u64,
) -> Result<RecordSummary> {
    session
        .open(camera, output)
        .with_context(|| format!("Failed to open camera {} -> {}", camera, output.display()))?;
    tracing::info!("Writing video to {}", output.display());

    let start = Instant::now();
    let mut end_of_stream = false;

    for i in 0..frames {
        match session.capture() {
            Ok(()) => {}
            Err(SessionError::EndOfStream) => {
                tracing::warn!(frame = i, "Input ended before the requested frame count");
                end_of_stream = true;
                break;
            }
            Err(e) => return Err(e).context("Capture failed"),
        }

        let elapsed = start.elapsed().as_secs_f64();
        for (y, line) in overlay_lines(i, elapsed).iter().enumerate() {
            session.annotate(30, 30 + 20 * y as u32, line, OVERLAY_COLOR)?;
        }
        session.persist().context("Failed to write frame")?;
    }

    let frames_written = session.frames_written();
    session.close()?;
    Ok(RecordSummary {
        frames_written,
        end_of_stream,
    })
}

/// Overlay text for frame `index`, `elapsed` seconds into the recording.
fn overlay_lines(index: u64, elapsed: f64) -> Vec<String> {
    if elapsed >= 1.0 {
        let rendered = index + 1;
        vec![
            format!("Rendered {} frames in {:.1} s", rendered, elapsed),
            format!("FPS: {:.1}", rendered as f64 / elapsed),
        ]
    } else {
        vec![format!("Frame: {}", index)]
    }
}
