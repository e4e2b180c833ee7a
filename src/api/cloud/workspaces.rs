//
//  bitbucket-ingest
//  api/cloud/workspaces.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Cloud workspace API types.
//!
//! Workspaces are the top-level organizational unit in Bitbucket Cloud and
//! the root of every ingestion walk.
//!
//! # Workspace Hierarchy
//!
//! ```text
//! Workspace
//! ├── Projects
//! │   └── Repositories
//! │       ├── Permissions (groups, users)
//! │       ├── Branch restrictions
//! │       └── Pull requests
//! ├── Groups (legacy 1.0 API)
//! └── Members (users with access)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::common::UserRef;

/// Represents a Bitbucket Cloud workspace.
///
/// # Example
///
/// ```rust
/// use bitbucket_ingest::api::cloud::Workspace;
///
/// let json = r#"{"uuid": "{ws-1}", "slug": "acme", "name": "Acme", "is_private": true}"#;
/// let workspace: Workspace = serde_json::from_str(json).unwrap();
/// assert_eq!(workspace.slug, "acme");
/// ```
///
/// # Notes
///
/// - The slug is used in API paths: `repositories/{slug}`
/// - Workspace names can contain spaces; slugs cannot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    /// Unique identifier for the workspace (includes curly braces).
    pub uuid: String,

    /// URL-safe identifier used in API paths and repository URLs.
    pub slug: String,

    /// Human-readable name of the workspace.
    #[serde(default)]
    pub name: String,

    /// Whether the workspace is private.
    #[serde(default)]
    pub is_private: bool,

    /// When the workspace was created.
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,

    /// When the workspace was last updated.
    #[serde(default)]
    pub updated_on: Option<DateTime<Utc>>,
}

/// A membership record from `workspaces/{workspace}/members`.
///
/// Only the user is kept; the gateway unwraps it before handing it out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceMembership {
    /// The member.
    pub user: UserRef,
}
