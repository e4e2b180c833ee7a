//
//  bitbucket-ingest
//  api/cloud/pullrequests.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Cloud pull request API types.
//!
//! # Pull Request Lifecycle
//!
//! 1. **OPEN** - Initial state when created
//! 2. **MERGED** - Successfully merged into the destination branch
//! 3. **DECLINED** - Rejected and closed without merging
//! 4. **SUPERSEDED** - Replaced by another pull request
//!
//! The list endpoint omits reviewers and participants; fetching each pull
//! request individually ("enrichment") fills them in.
//!
//! # Activity
//!
//! `pullrequests/{id}/activity` returns a newest-first feed whose entries are
//! approvals, updates (pushes, state changes) or comments. Only approvals and
//! updates matter for approval tracking; everything else is skipped when the
//! feed is turned into [`ActivityEvent`](crate::approval::ActivityEvent)s.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::common::UserRef;

/// State of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestState {
    /// Open for review.
    Open,
    /// Merged into the destination.
    Merged,
    /// Closed without merging.
    Declined,
    /// Replaced by another pull request.
    Superseded,
}

impl PullRequestState {
    /// Every state, in the order the provider documents them.
    pub const ALL: [PullRequestState; 4] = [
        PullRequestState::Open,
        PullRequestState::Merged,
        PullRequestState::Declined,
        PullRequestState::Superseded,
    ];

    /// The wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
            Self::Declined => "DECLINED",
            Self::Superseded => "SUPERSEDED",
        }
    }
}

impl fmt::Display for PullRequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a pull request in Bitbucket Cloud.
///
/// # Example
///
/// ```rust
/// use bitbucket_ingest::api::cloud::{PullRequest, PullRequestState};
///
/// let json = r#"{
///     "id": 12,
///     "title": "Add login",
///     "state": "OPEN",
///     "source": {"branch": {"name": "feature"}, "commit": {"hash": "abc123"}},
///     "destination": {"branch": {"name": "main"}, "commit": {"hash": "def456"}}
/// }"#;
/// let pr: PullRequest = serde_json::from_str(json).unwrap();
/// assert_eq!(pr.state, PullRequestState::Open);
/// assert_eq!(pr.source_hash(), Some("abc123"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Unique numeric identifier within the repository.
    pub id: u64,

    /// Short summary of the changes.
    #[serde(default)]
    pub title: String,

    /// Optional detailed description.
    #[serde(default)]
    pub description: Option<String>,

    /// Current state of the pull request.
    pub state: PullRequestState,

    /// The user who created the pull request. May be a team for automated PRs.
    #[serde(default)]
    pub author: Option<UserRef>,

    /// Branch containing the changes.
    pub source: PrEndpoint,

    /// Branch to merge into.
    pub destination: PrEndpoint,

    /// Users assigned to review. Only populated on individually fetched PRs.
    #[serde(default)]
    pub reviewers: Vec<UserRef>,

    /// Everyone who took part. Only populated on individually fetched PRs.
    #[serde(default)]
    pub participants: Vec<Participant>,

    /// Whether the source branch is deleted on merge.
    #[serde(default)]
    pub close_source_branch: bool,

    /// User who merged or declined the pull request.
    #[serde(default)]
    pub closed_by: Option<UserRef>,

    /// The merge commit, once merged.
    #[serde(default)]
    pub merge_commit: Option<CommitRef>,

    /// Number of comments.
    #[serde(default)]
    pub comment_count: u64,

    /// Number of open tasks.
    #[serde(default)]
    pub task_count: u64,

    /// When the pull request was created.
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,

    /// When the pull request was last updated.
    #[serde(default)]
    pub updated_on: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Tip commit of the source branch.
    pub fn source_hash(&self) -> Option<&str> {
        self.source.hash()
    }

    /// Commit the destination branch pointed at.
    pub fn destination_hash(&self) -> Option<&str> {
        self.destination.hash()
    }

    /// Identifiers of the assigned reviewers.
    pub fn reviewer_ids(&self) -> Vec<&str> {
        self.reviewers.iter().filter_map(UserRef::id).collect()
    }
}

/// Source or destination of a pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrEndpoint {
    /// The branch.
    pub branch: BranchName,

    /// Commit the branch pointed at. Absent for deleted branches.
    #[serde(default)]
    pub commit: Option<CommitRef>,

    /// Repository holding the branch; differs from the target for forks.
    #[serde(default)]
    pub repository: Option<RepositoryRef>,
}

impl PrEndpoint {
    /// The commit hash, if known.
    pub fn hash(&self) -> Option<&str> {
        self.commit.as_ref().map(|c| c.hash.as_str())
    }
}

/// A branch name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchName {
    /// Name of the branch.
    pub name: String,
}

/// A commit reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRef {
    /// The commit hash. Pull request payloads carry the short form.
    pub hash: String,
}

/// A repository reference embedded in a pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRef {
    /// Repository UUID.
    #[serde(default)]
    pub uuid: Option<String>,

    /// `{workspace}/{repo_slug}`.
    pub full_name: String,
}

/// A participant of a pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// The participating user.
    pub user: UserRef,

    /// `PARTICIPANT` or `REVIEWER`.
    #[serde(default)]
    pub role: Option<String>,

    /// Whether the participant currently approves.
    #[serde(default)]
    pub approved: bool,

    /// When the participant last took part.
    #[serde(default)]
    pub participated_on: Option<DateTime<Utc>>,
}

/// One entry of the pull request activity feed.
///
/// Exactly one of the fields is set for the entries that matter; comment
/// entries leave both empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullRequestActivity {
    /// An approval.
    #[serde(default)]
    pub approval: Option<ActivityApproval>,

    /// A push or state change.
    #[serde(default)]
    pub update: Option<ActivityUpdate>,
}

/// Approval entry of the activity feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityApproval {
    /// When the approval was given.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,

    /// The approver.
    pub user: UserRef,

    /// The pull request as it was when approved.
    #[serde(default)]
    pub pullrequest: Option<ApprovedPullRequest>,
}

/// Pull request snapshot inside an approval entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovedPullRequest {
    /// Pull request id.
    #[serde(default)]
    pub id: Option<u64>,

    /// Source branch at approval time, when the provider includes it.
    #[serde(default)]
    pub source: Option<PrEndpoint>,
}

/// Update entry of the activity feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityUpdate {
    /// When the update happened.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,

    /// Source after the update.
    pub source: PrEndpoint,

    /// Destination after the update.
    pub destination: PrEndpoint,

    /// State after the update.
    pub state: PullRequestState,

    /// Who made the update.
    #[serde(default)]
    pub author: Option<UserRef>,
}

/// Filter for listing pull requests.
///
/// Renders as a BBQL `q=` expression. All four states are requested by
/// default, since the list endpoint otherwise returns only open pull requests.
///
/// # Example
///
/// ```rust
/// use bitbucket_ingest::api::cloud::PullRequestQuery;
///
/// let query = PullRequestQuery::default();
/// assert_eq!(
///     query.to_bbql(),
///     r#"(state="OPEN" OR state="MERGED" OR state="DECLINED" OR state="SUPERSEDED")"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestQuery {
    /// States to include.
    pub states: Vec<PullRequestState>,

    /// Only pull requests updated after this instant.
    pub updated_since: Option<DateTime<Utc>>,
}

impl Default for PullRequestQuery {
    fn default() -> Self {
        Self {
            states: PullRequestState::ALL.to_vec(),
            updated_since: None,
        }
    }
}

impl PullRequestQuery {
    /// Query for pull requests updated after `cutoff`, in any state.
    pub fn updated_since(cutoff: DateTime<Utc>) -> Self {
        Self {
            updated_since: Some(cutoff),
            ..Self::default()
        }
    }

    /// Renders the BBQL filter expression.
    pub fn to_bbql(&self) -> String {
        let mut clauses = Vec::new();

        if !self.states.is_empty() {
            let states: Vec<String> = self
                .states
                .iter()
                .map(|s| format!("state=\"{}\"", s))
                .collect();
            clauses.push(format!("({})", states.join(" OR ")));
        }

        if let Some(cutoff) = self.updated_since {
            clauses.push(format!(
                "updated_on > {}",
                cutoff.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }

        clauses.join(" AND ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_incremental_query() {
        let cutoff = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let query = PullRequestQuery {
            states: vec![PullRequestState::Open, PullRequestState::Merged],
            updated_since: Some(cutoff),
        };
        assert_eq!(
            query.to_bbql(),
            r#"(state="OPEN" OR state="MERGED") AND updated_on > 2024-05-01T12:00:00Z"#
        );
    }

    #[test]
    fn test_query_without_states() {
        let cutoff = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let query = PullRequestQuery {
            states: vec![],
            updated_since: Some(cutoff),
        };
        assert_eq!(query.to_bbql(), "updated_on > 2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_activity_entries() {
        let json = r#"[
            {"comment": {"id": 1}},
            {"approval": {
                "date": "2024-05-02T10:00:00+00:00",
                "user": {"uuid": "{u1}", "display_name": "Jane"},
                "pullrequest": {"id": 3, "source": {"branch": {"name": "f"}, "commit": {"hash": "c3"}}}
            }},
            {"update": {
                "date": "2024-05-01T10:00:00+00:00",
                "state": "OPEN",
                "source": {"branch": {"name": "f"}, "commit": {"hash": "c2"}},
                "destination": {"branch": {"name": "main"}, "commit": {"hash": "m1"}}
            }}
        ]"#;
        let entries: Vec<PullRequestActivity> = serde_json::from_str(json).unwrap();
        assert!(entries[0].approval.is_none() && entries[0].update.is_none());

        let approval = entries[1].approval.as_ref().unwrap();
        let source = approval.pullrequest.as_ref().and_then(|p| p.source.as_ref());
        assert_eq!(source.and_then(PrEndpoint::hash), Some("c3"));

        let update = entries[2].update.as_ref().unwrap();
        assert_eq!(update.source.hash(), Some("c2"));
        assert_eq!(update.state, PullRequestState::Open);
    }
}
