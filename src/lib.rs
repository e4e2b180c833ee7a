//
//  bitbucket-ingest
//  lib.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Bitbucket Ingest Library
//!
//! A read-only ingestion client for Bitbucket Cloud: workspaces, members,
//! groups, projects, repositories, repository permissions, branch
//! restrictions and pull requests, with per-commit approval tracking.
//!
//! ## Features
//!
//! - **Credential Rotation**: Several OAuth consumers share the work; a rate
//!   limited consumer hands over to the next one mid-walk
//! - **Both API Generations**: 2.0 endpoints plus the legacy 1.0 group API
//! - **Approval Tracking**: Which commits each approver actually approved,
//!   and whether a later push invalidated an approval
//! - **Empty Merge Detection**: Merge commits that only bring in the
//!   destination branch can be left out of review tracking
//! - **Call Accounting**: Per-resource API call counts for budgeting
//!
//! ## Module Structure
//!
//! - [`cli`]: Command-line interface definitions using clap
//! - [`api`]: HTTP client, page walker, resource accessors and types
//! - [`auth`]: OAuth client credentials and the credential pool
//! - [`approval`]: Pull request approval reconciliation
//! - [`ingest`]: Resource walks with caller-supplied handlers
//! - [`config`]: Configuration file management
//! - [`output`]: JSON Lines output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bitbucket_ingest::config::IngestConfig;
//! use bitbucket_ingest::ingest::IngestClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = IngestClient::connect(IngestConfig::load(None)?).await?;
//!
//! client
//!     .iterate_repositories("acme", |repo| {
//!         println!("{}", repo.full_name);
//!         Ok(())
//!     })
//!     .await?;
//!
//! println!("{} API calls", client.calls().total());
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The binary logs to stderr through `tracing`. Set `BB_INGEST_DEBUG` to an
//! `EnvFilter` directive (e.g. `debug` or `bitbucket_ingest=trace`) to see
//! more than warnings.

/// Command-line interface definitions.
pub mod cli;

/// Bitbucket Cloud API access.
///
/// The client handles authentication headers, rate-limit rotation and error
/// mapping; the gateway exposes one accessor per resource.
pub mod api;

/// Authentication and credential management.
pub mod auth;

/// Pull request approval tracking.
pub mod approval;

/// Configuration file management.
///
/// Manages the configuration stored in platform-specific locations:
/// - Linux: `~/.config/bb-ingest/config.toml`
/// - macOS: `~/Library/Application Support/bb-ingest/config.toml`
/// - Windows: `%APPDATA%\bb-ingest\config.toml`
pub mod config;

/// Resource walks over the configured workspaces.
pub mod ingest;

/// JSON Lines output.
pub mod output;

pub use cli::Cli;

pub use config::IngestConfig;

/// Application name constant.
///
/// Used for the User-Agent header and the configuration directory.
pub const APP_NAME: &str = "bb-ingest";

/// Application version constant.
///
/// The current version, derived from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit codes for the CLI.
///
/// # Exit Code Ranges
///
/// - `0`: Success
/// - `1-3`: General errors
/// - `4-7`: Authentication-related issues
/// - `8-15`: Resource-related issues
/// - `32+`: External service issues
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;

    /// General error. Check stderr for details.
    pub const ERROR: i32 = 1;

    /// Token exchange failed or a credential lacks a required scope.
    pub const AUTH_ERROR: i32 = 4;

    /// A configured workspace does not exist.
    pub const NOT_FOUND: i32 = 8;

    /// Every configured credential has been rate limited.
    pub const RATE_LIMIT: i32 = 32;
}
