//
//  bitbucket-ingest
//  api/cloud/commits.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Commit types.
//!
//! `commits/{source}?exclude={destination}` lists the commits a pull request
//! adds, newest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::common::UserRef;

/// A commit on a pull request branch.
///
/// # Example
///
/// ```rust
/// use bitbucket_ingest::api::cloud::Commit;
///
/// let json = r#"{
///     "hash": "b2",
///     "parents": [{"hash": "a1"}, {"hash": "f9"}],
///     "author": {"raw": "Jane <jane@example.com>", "user": {"uuid": "{u1}"}}
/// }"#;
/// let commit: Commit = serde_json::from_str(json).unwrap();
/// assert!(commit.is_merge());
/// assert_eq!(commit.author_id(), Some("{u1}"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Full commit hash.
    pub hash: String,

    /// Parent commits. Two for merge commits.
    #[serde(default)]
    pub parents: Vec<ParentRef>,

    /// Author as recorded in git, plus the matched Bitbucket user.
    #[serde(default)]
    pub author: CommitAuthor,

    /// Commit message.
    #[serde(default)]
    pub message: String,

    /// Author date.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl Commit {
    /// Hashes of the parent commits, first parent first.
    pub fn parent_hashes(&self) -> Vec<&str> {
        self.parents.iter().map(|p| p.hash.as_str()).collect()
    }

    /// Checks if the commit has exactly two parents.
    pub fn is_merge(&self) -> bool {
        self.parents.len() == 2
    }

    /// Identifier of the Bitbucket user the author was matched to.
    pub fn author_id(&self) -> Option<&str> {
        self.author.user.as_ref().and_then(UserRef::id)
    }
}

/// A parent commit reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    /// Parent hash.
    pub hash: String,
}

/// Commit author.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitAuthor {
    /// Raw `Name <email>` string from git.
    #[serde(default)]
    pub raw: String,

    /// Bitbucket user matched by email, if any.
    #[serde(default)]
    pub user: Option<UserRef>,
}
