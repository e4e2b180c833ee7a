//
//  bitbucket-ingest
//  output/json.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! JSON serialization helpers.
//!
//! Records are written one per line (JSON Lines) so downstream tools can
//! stream them without buffering the whole run.

use serde::Serialize;
use std::io::Write;

/// Writes `value` as a single compact JSON line.
pub fn write_json_line<W: Write, T: Serialize>(writer: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// Writes `value` as pretty-printed JSON followed by a newline.
pub fn write_json_pretty<W: Write, T: Serialize>(writer: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}
