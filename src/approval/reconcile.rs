//
//  bitbucket-ingest
//  approval/reconcile.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Approval Reconciliation
//!
//! Replays a pull request's activity against its commit graph.
//!
//! An approval covers the approved commit and every ancestor of it on the
//! branch. When the source branch moves to a tip that does not descend from
//! an approved commit (a force push, a rebase), that approval no longer
//! describes what would be merged and is dropped.
//!
//! Pull request payloads carry abbreviated hashes while the commits endpoint
//! returns full ones, so hashes are matched by prefix.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::activity::ActivityEvent;
use crate::api::cloud::Commit;

/// One approver's surviving approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Approval {
    /// Identifier of the approver.
    pub approver_id: String,

    /// The hash the approval was given at.
    pub approved_hash: String,

    /// Branch commits covered by the approval, oldest first.
    pub commits: Vec<String>,
}

/// Approval state of a pull request.
///
/// `approved_commits` and `commits_by_unknown_author` are subsets of
/// `all_commits` and keep its order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrApprovalResult {
    /// Commits on the branch, oldest first.
    pub all_commits: Vec<Commit>,

    /// Commits covered by at least one surviving approval.
    pub approved_commits: Vec<Commit>,

    /// Commits whose author is not a known identity.
    pub commits_by_unknown_author: Vec<Commit>,

    /// Surviving approvals, in order of each approver's first approval.
    pub approvals: Vec<Approval>,

    /// Whether a push invalidated at least one approval.
    pub approved_commits_removed: bool,
}

impl PrApprovalResult {
    /// Identifiers of everyone with a surviving approval.
    pub fn approver_ids(&self) -> Vec<&str> {
        self.approvals.iter().map(|a| a.approver_id.as_str()).collect()
    }

    /// Commits no surviving approval covers.
    pub fn commits_not_approved(&self) -> Vec<&Commit> {
        let approved: HashSet<&str> = self.approved_commits.iter().map(|c| c.hash.as_str()).collect();
        self.all_commits
            .iter()
            .filter(|c| !approved.contains(c.hash.as_str()))
            .collect()
    }
}

/// Reconciles commits and activity against a set of known identities.
///
/// # Example
///
/// ```rust
/// use std::collections::HashSet;
/// use bitbucket_ingest::approval::PrApprovalReconciler;
///
/// let known: HashSet<String> = ["{u1}".to_string()].into_iter().collect();
/// let excluded: HashSet<String> = HashSet::new();
///
/// let result = PrApprovalReconciler::new(&known)
///     .with_excluded_commits(&excluded)
///     .reconcile(&[], &[]);
/// assert!(result.all_commits.is_empty());
/// ```
pub struct PrApprovalReconciler<'a> {
    known_identities: &'a HashSet<String>,
    excluded: Option<&'a HashSet<String>>,
}

impl<'a> PrApprovalReconciler<'a> {
    /// Creates a reconciler resolving authors against `known_identities`.
    pub fn new(known_identities: &'a HashSet<String>) -> Self {
        Self {
            known_identities,
            excluded: None,
        }
    }

    /// Drops these hashes from every result set.
    ///
    /// They still connect the commit graph, so approvals reach past them.
    pub fn with_excluded_commits(mut self, excluded: &'a HashSet<String>) -> Self {
        self.excluded = Some(excluded);
        self
    }

    /// Computes the approval state.
    ///
    /// `commits` must be in branch order, oldest first; `activity` in
    /// chronological order.
    pub fn reconcile(&self, commits: &[Commit], activity: &[ActivityEvent]) -> PrApprovalResult {
        if commits.is_empty() {
            return PrApprovalResult::default();
        }

        let graph = CommitGraph::new(commits);

        let mut live: Vec<(String, String)> = Vec::new();
        let mut current_source: Option<&str> = None;
        let mut removed = false;

        for (idx, event) in activity.iter().enumerate() {
            match event {
                ActivityEvent::Approval { approver, hash, .. } => {
                    let Some(approver_id) = approver.id() else {
                        debug!(approver = %approver.display_name, "Skipping approval without an identifier");
                        continue;
                    };
                    match live.iter_mut().find(|(id, _)| id == approver_id) {
                        Some(entry) => entry.1 = hash.clone(),
                        None => live.push((approver_id.to_string(), hash.clone())),
                    }
                }
                ActivityEvent::Update { new_source, .. } => {
                    if current_source.is_some_and(|prev| same_commit(prev, new_source)) {
                        continue;
                    }
                    current_source = Some(new_source.as_str());

                    // A tip rewritten by a later push is no longer on the branch,
                    // so judge against the next tip that is.
                    let Some(tip) = graph
                        .canonical(new_source)
                        .or_else(|| graph.known_tip_after(&activity[idx + 1..]))
                        .or_else(|| graph.tip())
                    else {
                        continue;
                    };

                    let reachable = graph.ancestors_or_self(tip);
                    let before = live.len();
                    live.retain(|(_, hash)| graph.is_in(hash, &reachable));
                    if live.len() < before {
                        debug!(
                            dropped = before - live.len(),
                            tip = %new_source,
                            "Source moved away from approved commits"
                        );
                        removed = true;
                    }
                }
            }
        }

        let is_kept = |commit: &&Commit| {
            self.excluded
                .map_or(true, |excluded| !excluded.contains(&commit.hash))
        };

        let all_commits: Vec<Commit> = commits.iter().filter(is_kept).cloned().collect();

        let mut approved: HashSet<String> = HashSet::new();
        let approvals = live
            .into_iter()
            .map(|(approver_id, approved_hash)| {
                let covered = graph.ancestors_or_self(&approved_hash);
                let commits: Vec<String> = all_commits
                    .iter()
                    .filter(|c| covered.contains(c.hash.as_str()))
                    .map(|c| c.hash.clone())
                    .collect();
                approved.extend(commits.iter().cloned());
                Approval {
                    approver_id,
                    approved_hash,
                    commits,
                }
            })
            .collect();

        let approved_commits = all_commits
            .iter()
            .filter(|c| approved.contains(&c.hash))
            .cloned()
            .collect();

        let commits_by_unknown_author = all_commits
            .iter()
            .filter(|c| {
                c.author_id()
                    .map_or(true, |id| !self.known_identities.contains(id))
            })
            .cloned()
            .collect();

        PrApprovalResult {
            all_commits,
            approved_commits,
            commits_by_unknown_author,
            approvals,
            approved_commits_removed: removed,
        }
    }
}

/// Reconciles with no excluded commits.
pub fn reconcile(
    commits: &[Commit],
    activity: &[ActivityEvent],
    known_identities: &HashSet<String>,
) -> PrApprovalResult {
    PrApprovalReconciler::new(known_identities).reconcile(commits, activity)
}

/// Abbreviated and full hashes of the same commit compare equal.
fn same_commit(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.starts_with(b) || b.starts_with(a))
}

/// Parent links between the branch commits.
struct CommitGraph<'c> {
    parents: HashMap<&'c str, Vec<&'c str>>,
    hashes: Vec<&'c str>,
}

impl<'c> CommitGraph<'c> {
    fn new(commits: &'c [Commit]) -> Self {
        Self {
            parents: commits
                .iter()
                .map(|c| (c.hash.as_str(), c.parent_hashes()))
                .collect(),
            hashes: commits.iter().map(|c| c.hash.as_str()).collect(),
        }
    }

    /// Full hash of a branch commit, given any prefix-compatible form.
    fn canonical(&self, hash: &str) -> Option<&'c str> {
        if let Some((full, _)) = self.parents.get_key_value(hash) {
            return Some(*full);
        }
        self.hashes.iter().copied().find(|full| same_commit(full, hash))
    }

    /// The commit and all its ancestors, as full hashes.
    ///
    /// A hash that is not on the branch yields only itself.
    fn ancestors_or_self(&self, hash: &str) -> HashSet<&'c str> {
        let mut seen = HashSet::new();
        let Some(start) = self.canonical(hash) else {
            return seen;
        };

        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            for parent in self.parents.get(current).into_iter().flatten() {
                if let Some(parent) = self.canonical(parent) {
                    stack.push(parent);
                }
            }
        }
        seen
    }

    /// Newest commit of the branch.
    fn tip(&self) -> Option<&'c str> {
        self.hashes.last().copied()
    }

    /// First update source among `later` that is still on the branch.
    fn known_tip_after(&self, later: &[ActivityEvent]) -> Option<&'c str> {
        later.iter().find_map(|event| match event {
            ActivityEvent::Update { new_source, .. } => self.canonical(new_source),
            ActivityEvent::Approval { .. } => None,
        })
    }

    fn is_in(&self, hash: &str, set: &HashSet<&'c str>) -> bool {
        self.canonical(hash).is_some_and(|full| set.contains(full))
    }
}
