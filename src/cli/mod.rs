//
//  bitbucket-ingest
//  cli/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Command-Line Interface
//!
//! Command definitions using clap's derive API.
//!
//! ## Commands
//!
//! - `verify`: Authenticate every credential and check each workspace exists
//! - `run`: Ingest everything and write JSON Lines to stdout
//! - `version`: Print the version
//!
//! ## Global Options
//!
//! Every option can also come from the environment:
//!
//! | Flag | Environment |
//! |------|-------------|
//! | `--config` | `BB_INGEST_CONFIG` |
//! | `--workspace` | `BB_WORKSPACE` |
//! | `--oauth-key` | `BB_OAUTH_KEY` |
//! | `--oauth-secret` | `BB_OAUTH_SECRET` |
//!
//! Flags override the configuration file.

mod run;
mod verify;

pub use run::RunCommand;
pub use verify::VerifyCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::IngestConfig;

/// Root CLI structure
#[derive(Parser, Debug)]
#[command(
    name = "bb-ingest",
    version,
    about = "Ingest workspaces, repositories and pull requests from Bitbucket Cloud",
    long_about = "bb-ingest reads Bitbucket Cloud through one or more OAuth consumers and\n\
                  writes what it finds as JSON Lines, including which commits of each\n\
                  pull request were approved.",
    propagate_version = true,
    after_help = "Use 'bb-ingest <command> --help' for more information about a command."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOptions,
}

/// Options shared by every command
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Path to the configuration file
    #[arg(long, short = 'c', global = true, env = "BB_INGEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Workspaces to ingest, replacing the configured list
    #[arg(
        long,
        short = 'w',
        global = true,
        env = "BB_WORKSPACE",
        value_delimiter = ','
    )]
    pub workspace: Vec<String>,

    /// Comma-delimited OAuth consumer keys
    #[arg(long, global = true, env = "BB_OAUTH_KEY", hide_env_values = true)]
    pub oauth_key: Option<String>,

    /// Comma-delimited OAuth consumer secrets
    #[arg(long, global = true, env = "BB_OAUTH_SECRET", hide_env_values = true)]
    pub oauth_secret: Option<String>,
}

impl GlobalOptions {
    /// Loads the configuration file and applies flag overrides.
    pub fn load_config(&self) -> Result<IngestConfig> {
        let mut config = IngestConfig::load(self.config.as_deref())?;

        if !self.workspace.is_empty() {
            config.workspaces = self.workspace.clone();
        }
        if let Some(key) = &self.oauth_key {
            config.oauth_key = key.clone();
        }
        if let Some(secret) = &self.oauth_secret {
            config.oauth_secret = secret.clone();
        }

        Ok(config)
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check credentials, scopes and workspaces
    Verify(VerifyCommand),

    /// Ingest all configured workspaces
    Run(RunCommand),

    /// Show version information
    Version,
}
