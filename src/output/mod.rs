//
//  bitbucket-ingest
//  output/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Output
//!
//! Ingested entities are emitted as JSON Lines records:
//!
//! ```json
//! {"kind":"repository","workspace":"acme","data":{...}}
//! ```
//!
//! `kind` names the entity type, `workspace` and `repository` give the scope
//! the entity was read from, and `data` is the entity itself.

mod json;

pub use json::*;

use serde::Serialize;
use std::io::Write;

/// One emitted entity.
#[derive(Debug, Serialize)]
pub struct Record<'a, T: Serialize> {
    /// Entity type.
    pub kind: &'a str,

    /// Workspace the entity belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<&'a str>,

    /// Repository the entity belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<&'a str>,

    /// The entity.
    pub data: T,
}

/// Writes records to a sink and counts them.
pub struct RecordWriter<W: Write> {
    writer: W,
    written: u64,
}

impl<W: Write> RecordWriter<W> {
    /// Creates a writer over `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Emits one record.
    pub fn emit<T: Serialize>(
        &mut self,
        kind: &str,
        workspace: Option<&str>,
        repository: Option<&str>,
        data: T,
    ) -> anyhow::Result<()> {
        let record = Record {
            kind,
            workspace,
            repository,
            data,
        };
        write_json_line(&mut self.writer, &record)?;
        self.written += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flushes and returns the sink.
    pub fn into_inner(mut self) -> anyhow::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
