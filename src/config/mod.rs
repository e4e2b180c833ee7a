//
//  bitbucket-ingest
//  config/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Configuration
//!
//! Ingestion settings live in a TOML file at a platform-specific location:
//!
//! - Linux: `~/.config/bb-ingest/config.toml`
//! - macOS: `~/Library/Application Support/bb-ingest/config.toml`
//! - Windows: `%APPDATA%\bb-ingest\config.toml`
//!
//! ## Example
//!
//! ```toml
//! oauth_key = "key1, key2"
//! oauth_secret = "secret1, secret2"
//! workspaces = ["acme"]
//! ingest_pull_requests = true
//! enriched_prs = false
//! exclude_empty_merge_commits = true
//! pull_requests_updated_since = "2024-01-01T00:00:00Z"
//!
//! [api]
//! base_url = "https://bitbucket.org/api/2.0/"
//! ```
//!
//! Several OAuth consumers are configured as comma-delimited lists in the
//! same order; each key pairs with the secret at the same position.

mod file;

pub use file::*;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::client::{ApiEndpoints, DEFAULT_BASE_URL, DEFAULT_LEGACY_BASE_URL};
use crate::api::cloud::PullRequestQuery;
use crate::api::ApiError;
use crate::auth::{CredentialPool, ScopeRequirements, DEFAULT_TOKEN_URL};

/// Top-level ingestion configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Comma-delimited OAuth consumer keys.
    #[serde(default)]
    pub oauth_key: String,

    /// Comma-delimited OAuth consumer secrets, in the same order as the keys.
    #[serde(default)]
    pub oauth_secret: String,

    /// Workspaces to ingest.
    #[serde(default)]
    pub workspaces: Vec<String>,

    /// Ingest pull requests, their commits and approvals.
    #[serde(default)]
    pub ingest_pull_requests: bool,

    /// Fetch each pull request individually for reviewers and participants.
    #[serde(default)]
    pub enriched_prs: bool,

    /// Leave merge commits that introduce no changes out of approval tracking.
    #[serde(default)]
    pub exclude_empty_merge_commits: bool,

    /// Only ingest pull requests updated after this instant.
    #[serde(default)]
    pub pull_requests_updated_since: Option<DateTime<Utc>>,

    /// Endpoint overrides.
    #[serde(default)]
    pub api: ApiConfig,
}

/// The `[api]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the 2.0 API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL of the legacy 1.0 API.
    #[serde(default = "default_legacy_base_url")]
    pub legacy_base_url: String,

    /// OAuth token endpoint.
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_legacy_base_url() -> String {
    DEFAULT_LEGACY_BASE_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            legacy_base_url: default_legacy_base_url(),
            token_url: default_token_url(),
        }
    }
}

impl IngestConfig {
    /// Loads the configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used and a missing file yields the default (empty) configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = Self::config_path()?;
                if !config_exists(&path) {
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = read_config_file(&path)?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Default configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", crate::APP_NAME)
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Checks that everything needed for a run is present.
    pub fn validate(&self) -> Result<()> {
        if self.oauth_key.trim().is_empty() || self.oauth_secret.trim().is_empty() {
            bail!("OAuth key and secret are required (set oauth_key/oauth_secret or BB_OAUTH_KEY/BB_OAUTH_SECRET)");
        }
        if self.workspaces.iter().all(|w| w.trim().is_empty()) {
            bail!("At least one workspace is required (set workspaces or BB_WORKSPACE)");
        }
        self.endpoints()?;
        Ok(())
    }

    /// Builds the credential pool from the configured key and secret lists.
    pub fn credentials(&self) -> Result<CredentialPool, ApiError> {
        CredentialPool::from_config_strings(&self.oauth_key, &self.oauth_secret)
    }

    /// The configured endpoints, checked to be absolute HTTP(S) URLs.
    pub fn endpoints(&self) -> Result<ApiEndpoints> {
        for (name, value) in [
            ("api.base_url", &self.api.base_url),
            ("api.legacy_base_url", &self.api.legacy_base_url),
            ("api.token_url", &self.api.token_url),
        ] {
            let url = Url::parse(value).with_context(|| format!("Invalid {}: '{}'", name, value))?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!("Invalid {}: '{}' is not an http(s) URL", name, value);
            }
        }

        Ok(ApiEndpoints {
            base_url: self.api.base_url.clone(),
            legacy_base_url: self.api.legacy_base_url.clone(),
            token_url: self.api.token_url.clone(),
        })
    }

    /// Scopes the credentials must carry for this configuration.
    pub fn scope_requirements(&self) -> ScopeRequirements {
        ScopeRequirements {
            pull_requests: self.ingest_pull_requests,
            workspace_hint: self.workspaces.first().cloned(),
        }
    }

    /// Filter for listing pull requests.
    pub fn pull_request_query(&self) -> PullRequestQuery {
        match self.pull_requests_updated_since {
            Some(cutoff) => PullRequestQuery::updated_since(cutoff),
            None => PullRequestQuery::default(),
        }
    }
}
