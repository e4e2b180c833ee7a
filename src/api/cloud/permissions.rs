//
//  bitbucket-ingest
//  api/cloud/permissions.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Repository permission and branch restriction types.
//!
//! All three endpoints require the OAuth consumer to hold repository admin
//! permission; without it Bitbucket answers 403.

use serde::{Deserialize, Serialize};

use crate::api::common::UserRef;

/// Group reference inside a permission or restriction payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRef {
    /// Group name.
    #[serde(default)]
    pub name: String,

    /// Group slug.
    pub slug: String,
}

/// Explicit permission granted to a group on a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPermission {
    /// The group.
    pub group: GroupRef,

    /// `read`, `write`, `create-repo` or `admin`.
    pub permission: String,
}

/// Explicit permission granted to a user on a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPermission {
    /// The user.
    pub user: UserRef,

    /// `read`, `write` or `admin`.
    pub permission: String,
}

/// A branch restriction (branch permission) rule.
///
/// # Example
///
/// ```rust
/// use bitbucket_ingest::api::cloud::BranchRestriction;
///
/// let json = r#"{
///     "id": 7,
///     "kind": "require_approvals_to_merge",
///     "value": 2,
///     "branch_match_kind": "glob",
///     "pattern": "main"
/// }"#;
/// let rule: BranchRestriction = serde_json::from_str(json).unwrap();
/// assert_eq!(rule.value, Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchRestriction {
    /// Rule identifier.
    pub id: u64,

    /// Restriction kind, e.g. `push` or `require_approvals_to_merge`.
    pub kind: String,

    /// Numeric parameter of the rule, when it has one.
    #[serde(default)]
    pub value: Option<u64>,

    /// `glob` or `branching_model`.
    #[serde(default)]
    pub branch_match_kind: Option<String>,

    /// Branch pattern for `glob` rules.
    #[serde(default)]
    pub pattern: Option<String>,

    /// Users exempt from the restriction.
    #[serde(default)]
    pub users: Vec<UserRef>,

    /// Groups exempt from the restriction.
    #[serde(default)]
    pub groups: Vec<GroupRef>,
}
