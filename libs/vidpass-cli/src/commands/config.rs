// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use anyhow::Result;
use vidpass::SessionConfig;

/// Print the default configuration, ready to be edited and passed back with `--config`.
pub fn run() -> Result<()> {
    print!("{}", SessionConfig::default().to_toml_string()?);
    Ok(())
}
