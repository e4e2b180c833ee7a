//
//  bitbucket-ingest
//  cli/verify.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Verify command
//!
//! Exchanges every configured OAuth consumer for a token, checks the granted
//! scopes, and fetches each configured workspace. Nothing else is read.

use anyhow::Result;
use clap::Args;
use std::io::{self, BufWriter};

use crate::ingest::IngestClient;
use crate::output::RecordWriter;

use super::GlobalOptions;

/// Check credentials, scopes and workspaces
#[derive(Args, Debug)]
pub struct VerifyCommand {
    /// Also require the pull request scope
    #[arg(long)]
    pub pull_requests: bool,
}

impl VerifyCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let mut config = global.load_config()?;
        config.ingest_pull_requests |= self.pull_requests;

        let client = IngestClient::connect(config).await?;
        let mut out = RecordWriter::new(BufWriter::new(io::stdout().lock()));

        client
            .iterate_workspaces(|workspace| out.emit("workspace", None, None, &workspace))
            .await?;

        let verified = out.written();
        out.into_inner()?;

        eprintln!(
            "Verified {} credential(s) and {} workspace(s)",
            client.config().credentials()?.len(),
            verified
        );
        Ok(())
    }
}
