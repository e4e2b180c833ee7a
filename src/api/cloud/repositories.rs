//
//  bitbucket-ingest
//  api/cloud/repositories.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Cloud repository API types.
//!
//! # Notes
//!
//! - Repository slugs are URL-safe versions of repository names
//! - The `full_name` field follows the format `{workspace}/{repo_slug}`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::projects::ProjectRef;

/// Represents a Bitbucket Cloud repository.
///
/// # Example
///
/// ```rust
/// use bitbucket_ingest::api::cloud::Repository;
///
/// let json = r#"{
///     "uuid": "{r1}",
///     "name": "Backend",
///     "slug": "backend",
///     "full_name": "acme/backend",
///     "project": {"key": "CORE"}
/// }"#;
/// let repo: Repository = serde_json::from_str(json).unwrap();
/// assert_eq!(repo.repo_slug(), "backend");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    /// Unique identifier for the repository (e.g., `{123e4567-e89b-...}`).
    pub uuid: String,

    /// Human-readable name of the repository.
    #[serde(default)]
    pub name: String,

    /// URL-safe identifier, when the provider sends it.
    #[serde(default)]
    pub slug: Option<String>,

    /// Full path in format `{workspace_slug}/{repo_slug}`.
    pub full_name: String,

    /// Optional description of the repository.
    #[serde(default)]
    pub description: Option<String>,

    /// Whether the repository is private.
    #[serde(default)]
    pub is_private: bool,

    /// Project containing the repository.
    #[serde(default)]
    pub project: Option<ProjectRef>,

    /// When the repository was created.
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,

    /// When the repository was last updated.
    #[serde(default)]
    pub updated_on: Option<DateTime<Utc>>,
}

impl Repository {
    /// The repository slug used in API paths.
    ///
    /// Falls back to the part of `full_name` after the workspace.
    pub fn repo_slug(&self) -> &str {
        if let Some(slug) = self.slug.as_deref() {
            return slug;
        }
        self.full_name
            .split_once('/')
            .map(|(_, slug)| slug)
            .unwrap_or(&self.full_name)
    }
}
