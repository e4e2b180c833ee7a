//
//  bitbucket-ingest
//  api/cloud/projects.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Cloud project API types.
//!
//! Projects group repositories inside a workspace. Every repository created
//! since 2020 belongs to exactly one project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a project within a workspace.
///
/// # Example
///
/// ```rust
/// use bitbucket_ingest::api::cloud::Project;
///
/// let json = r#"{"uuid": "{p1}", "key": "CORE", "name": "Core services"}"#;
/// let project: Project = serde_json::from_str(json).unwrap();
/// assert_eq!(project.key, "CORE");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier for the project (includes curly braces).
    pub uuid: String,

    /// Short uppercase key, unique within the workspace.
    pub key: String,

    /// Display name of the project.
    #[serde(default)]
    pub name: String,

    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,

    /// Whether the project is private.
    #[serde(default)]
    pub is_private: bool,

    /// When the project was created.
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,

    /// When the project was last updated.
    #[serde(default)]
    pub updated_on: Option<DateTime<Utc>>,
}

/// Reference to a project as embedded in a repository payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRef {
    /// Project UUID.
    #[serde(default)]
    pub uuid: Option<String>,

    /// Project key.
    pub key: String,

    /// Project name.
    #[serde(default)]
    pub name: Option<String>,
}
