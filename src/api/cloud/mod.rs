//
//  bitbucket-ingest
//  api/cloud/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Bitbucket Cloud API types.
//!
//! Serde bindings for every resource the ingestion walk reads, organized by
//! resource type:
//!
//! - [`workspaces`] - Workspaces and memberships
//! - [`projects`] - Projects
//! - [`repositories`] - Repositories
//! - [`groups`] - Groups (legacy 1.0 API)
//! - [`permissions`] - Repository permissions and branch restrictions
//! - [`pullrequests`] - Pull requests, activity and list filters
//! - [`commits`] - Commits
//!
//! # Notes
//!
//! - Timestamps are ISO 8601 with offsets and parse into `DateTime<Utc>`
//! - UUIDs are returned with curly braces (e.g., `{123e4567-e89b-...}`)
//! - Unknown fields are ignored so provider additions do not break decoding

pub mod commits;
pub mod groups;
pub mod permissions;
pub mod projects;
pub mod pullrequests;
pub mod repositories;
pub mod workspaces;

pub use commits::*;
pub use groups::*;
pub use permissions::*;
pub use projects::*;
pub use pullrequests::*;
pub use repositories::*;
pub use workspaces::*;
