//
//  bitbucket-ingest
//  config/file.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Configuration File I/O
//!
//! Low-level reads of the TOML configuration file.
//!
//! ## Error Handling
//!
//! All I/O operations use `anyhow::Result`, with the path attached as
//! context so the operator sees which file failed.

use std::path::Path;

use anyhow::{Context, Result};

/// Reads the configuration file at `path`.
///
/// # Errors
///
/// Returns an error naming the path if the file cannot be read.
pub fn read_config_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))
}

/// Checks if a configuration file exists at `path`.
pub fn config_exists(path: &Path) -> bool {
    path.is_file()
}
