// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Session configuration.
//!
//! Two behaviors differ between deployments of the pass-through and are
//! therefore explicit here rather than inherited from the video library:
//! where the output frame rate comes from, and how caller-supplied color
//! bytes are ordered.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Rate used when the input does not report a usable frame rate.
pub const DEFAULT_FALLBACK_FPS: f64 = 30.0;

/// Largest accepted `text.scale`.
pub const MAX_TEXT_SCALE: f64 = 100.0;

/// Where the output stream's frame rate comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FrameRateSource {
    /// The rate the input device reports at `open` time.
    #[default]
    Input,
    /// A fixed rate, regardless of what the input reports.
    Fixed { fps: f64 },
}

/// Interpretation of the four color bytes passed to `annotate`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelOrder {
    /// `[r, g, b, a]`
    #[default]
    Rgba,
    /// `[b, g, r, a]`
    Bgra,
}

/// Text rendering parameters. The font face itself is fixed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub scale: f64,
    pub thickness: i32,
    pub antialias: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            scale: 0.8,
            thickness: 1,
            antialias: true,
        }
    }
}

/// Configuration for a [`Session`](crate::Session).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub frame_rate: FrameRateSource,
    /// Used with [`FrameRateSource::Input`] when the device reports a
    /// non-positive or non-finite rate (common for V4L2 webcams).
    pub fallback_fps: f64,
    pub channel_order: ChannelOrder,
    pub text: TextStyle,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_rate: FrameRateSource::Input,
            fallback_fps: DEFAULT_FALLBACK_FPS,
            channel_order: ChannelOrder::Rgba,
            text: TextStyle::default(),
        }
    }
}

impl SessionConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn with_frame_rate(mut self, frame_rate: FrameRateSource) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn with_channel_order(mut self, channel_order: ChannelOrder) -> Self {
        self.channel_order = channel_order;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let FrameRateSource::Fixed { fps } = self.frame_rate {
            if !usable_fps(fps) {
                return Err(ConfigError::Invalid(format!(
                    "frame_rate.fps must be a positive number, got {}",
                    fps
                )));
            }
        }
        if !usable_fps(self.fallback_fps) {
            return Err(ConfigError::Invalid(format!(
                "fallback_fps must be a positive number, got {}",
                self.fallback_fps
            )));
        }
        if !(self.text.scale > 0.0 && self.text.scale <= MAX_TEXT_SCALE) {
            return Err(ConfigError::Invalid(format!(
                "text.scale must be in (0, {}], got {}",
                MAX_TEXT_SCALE, self.text.scale
            )));
        }
        if self.text.thickness < 1 {
            return Err(ConfigError::Invalid(format!(
                "text.thickness must be at least 1, got {}",
                self.text.thickness
            )));
        }
        Ok(())
    }

    /// Frame rate to declare on the output, given what the input reported.
    pub fn output_fps(&self, reported: f64) -> f64 {
        match self.frame_rate {
            FrameRateSource::Fixed { fps } => fps,
            FrameRateSource::Input if usable_fps(reported) => reported,
            FrameRateSource::Input => self.fallback_fps,
        }
    }
}

fn usable_fps(fps: f64) -> bool {
    fps.is_finite() && fps > 0.0
}
