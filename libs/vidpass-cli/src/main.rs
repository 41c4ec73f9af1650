// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! vidpass CLI
//!
//! Records a camera to an MP4 file through a pass-through session, stamping
//! each frame with a counter / FPS overlay.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vidpass")]
#[command(author, version, about = "Camera to MP4 pass-through recorder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture frames, overlay a counter, and encode them to a file
    Record {
        /// Camera index to open
        #[arg(short, long, default_value = "0")]
        camera: u32,

        /// Output file
        #[arg(short, long, default_value = "out.mp4")]
        output: PathBuf,

        /// Number of frames to record (stops earlier at end of stream)
        #[arg(short = 'n', long, default_value = "100")]
        frames: u64,

        /// Session config file (TOML)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Use the built-in test-pattern camera instead of a real device
        #[arg(long)]
        synthetic: bool,
    },

    /// Print the default session config as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Record {
            camera,
            output,
            frames,
            config,
            synthetic,
        } => commands::record::run(commands::record::RecordArgs {
            camera,
            output,
            frames,
            config,
            synthetic,
        }),
        Commands::Config => commands::config::run(),
    }
}
