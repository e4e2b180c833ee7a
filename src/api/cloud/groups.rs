//
//  bitbucket-ingest
//  api/cloud/groups.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Workspace groups from the legacy 1.0 API.
//!
//! The 2.0 API has no group listing, so groups are read from
//! `1.0/groups/{workspace}`, which answers with a bare JSON array.

use serde::{Deserialize, Serialize};

use crate::api::common::UserRef;

/// A user group of a workspace.
///
/// # Example
///
/// ```rust
/// use bitbucket_ingest::api::cloud::Group;
///
/// let json = r#"{"name": "Developers", "slug": "developers", "permission": "write", "members": []}"#;
/// let group: Group = serde_json::from_str(json).unwrap();
/// assert_eq!(group.slug, "developers");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Display name.
    pub name: String,

    /// Slug, unique within the workspace.
    pub slug: String,

    /// Default repository permission (`read`, `write`, `admin`), if any.
    #[serde(default)]
    pub permission: Option<String>,

    /// Whether new repositories grant this group access automatically.
    #[serde(default)]
    pub auto_add: bool,

    /// Group members.
    #[serde(default)]
    pub members: Vec<UserRef>,

    /// The account owning the group.
    #[serde(default)]
    pub owner: Option<UserRef>,
}
