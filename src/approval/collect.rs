//
//  bitbucket-ingest
//  approval/collect.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Per pull request collection: commits, activity, classification and
//! reconciliation in one call.

use std::collections::HashSet;
use tracing::{debug, info};

use super::activity::timeline;
use super::diff::MergeCommitClassifier;
use super::reconcile::{PrApprovalReconciler, PrApprovalResult};
use crate::api::cloud::PullRequest;
use crate::api::{ApiError, BitbucketGateway};

/// Fetches and reconciles the approval state of one pull request.
///
/// A pull request whose source or destination commit is unknown (for
/// example, a deleted source branch) has no commits to inspect and yields an
/// empty result without further requests.
///
/// # Parameters
///
/// - `known_identities`: user identifiers of the workspace members
/// - `exclude_empty_merges`: drop merge commits that introduce no changes
pub async fn collect_for_pull_request(
    gateway: &BitbucketGateway,
    workspace: &str,
    repo: &str,
    pr: &PullRequest,
    known_identities: &HashSet<String>,
    exclude_empty_merges: bool,
) -> Result<PrApprovalResult, ApiError> {
    let (Some(source), Some(destination)) = (pr.source_hash(), pr.destination_hash()) else {
        debug!(pr = pr.id, "Pull request has no source or destination commit");
        return Ok(PrApprovalResult::default());
    };

    let mut commits = gateway.commits(workspace, repo, source, destination).await?;
    commits.reverse();

    let activity = gateway.pull_request_activity(workspace, repo, pr.id).await?;
    let events = timeline(activity, Some(source));

    let excluded = if exclude_empty_merges {
        MergeCommitClassifier::new(gateway, workspace, repo)
            .empty_merge_commits(&commits)
            .await?
    } else {
        HashSet::new()
    };

    let result = PrApprovalReconciler::new(known_identities)
        .with_excluded_commits(&excluded)
        .reconcile(&commits, &events);

    info!(
        pr = pr.id,
        commits = result.all_commits.len(),
        approved = result.approved_commits.len(),
        excluded = excluded.len(),
        removed = result.approved_commits_removed,
        "Reconciled pull request approvals"
    );
    Ok(result)
}
