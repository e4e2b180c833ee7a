//
//  bitbucket-ingest
//  approval/diff.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Empty merge commit detection.
//!
//! Merging the destination branch into a pull request branch creates a
//! commit nobody needs to review when it brings in nothing but the
//! destination's own changes. Such commits can be excluded from approval
//! tracking.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::api::cloud::Commit;
use crate::api::ApiError;

/// Anything that can produce the textual diff between two commits.
#[async_trait]
pub trait DiffSource: Send + Sync {
    /// Diff from `from` to `to` in a repository.
    async fn diff(&self, workspace: &str, repo: &str, from: &str, to: &str) -> Result<String, ApiError>;
}

/// Classifies merge commits of one repository, caching results per hash.
///
/// # Example
///
/// ```rust,no_run
/// use bitbucket_ingest::api::BitbucketGateway;
/// use bitbucket_ingest::api::cloud::Commit;
/// use bitbucket_ingest::approval::MergeCommitClassifier;
///
/// # async fn example(gateway: &BitbucketGateway, commit: &Commit) -> Result<(), bitbucket_ingest::api::ApiError> {
/// let mut classifier = MergeCommitClassifier::new(gateway, "acme", "backend");
/// if classifier.is_empty_merge_commit(commit).await? {
///     println!("{} only merges in the destination", commit.hash);
/// }
/// # Ok(())
/// # }
/// ```
pub struct MergeCommitClassifier<'a, D: DiffSource + ?Sized> {
    source: &'a D,
    workspace: String,
    repo: String,
    cache: HashMap<String, bool>,
}

impl<'a, D: DiffSource + ?Sized> MergeCommitClassifier<'a, D> {
    /// Creates a classifier for one repository.
    pub fn new(source: &'a D, workspace: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            source,
            workspace: workspace.into(),
            repo: repo.into(),
            cache: HashMap::new(),
        }
    }

    /// Checks whether a merge commit introduces no changes of its own.
    ///
    /// True when the merge is identical to its second parent, or when its
    /// diff against the first parent equals the second parent's diff against
    /// the first parent. Commits without exactly two parents are never empty
    /// merges and cost no requests.
    pub async fn is_empty_merge_commit(&mut self, commit: &Commit) -> Result<bool, ApiError> {
        let [first, second] = commit.parent_hashes()[..] else {
            return Ok(false);
        };

        if let Some(cached) = self.cache.get(&commit.hash) {
            return Ok(*cached);
        }

        let (ws, repo) = (self.workspace.as_str(), self.repo.as_str());

        let against_second = self.source.diff(ws, repo, &commit.hash, second).await?;
        let empty = if against_second.trim().is_empty() {
            true
        } else {
            let merge_diff = self.source.diff(ws, repo, &commit.hash, first).await?;
            let incoming_diff = self.source.diff(ws, repo, second, first).await?;
            merge_diff == incoming_diff
        };

        debug!(commit = %commit.hash, empty, "Classified merge commit");
        self.cache.insert(commit.hash.clone(), empty);
        Ok(empty)
    }

    /// Hashes of every empty merge commit among `commits`.
    pub async fn empty_merge_commits(&mut self, commits: &[Commit]) -> Result<HashSet<String>, ApiError> {
        let mut empty = HashSet::new();
        for commit in commits {
            if self.is_empty_merge_commit(commit).await? {
                empty.insert(commit.hash.clone());
            }
        }
        Ok(empty)
    }
}
