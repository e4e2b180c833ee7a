//
//  bitbucket-ingest
//  api/gateway.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Resource Accessors
//!
//! [`BitbucketGateway`] maps each Bitbucket Cloud resource to its endpoint
//! and counts how many calls every resource kind costs. The counts matter
//! because repository, pull request and pull request detail calls share an
//! hourly budget per OAuth consumer.
//!
//! ## Endpoints
//!
//! | Accessor | Endpoint | Paged |
//! |----------|----------|-------|
//! | `workspace` | `workspaces/{ws}` | No |
//! | `workspaces` | `workspaces` | Yes |
//! | `user` | `users/{uuid}` | No |
//! | `workspace_members` | `workspaces/{ws}/members` | Yes |
//! | `groups` | `1.0/groups/{ws}` | Legacy |
//! | `project` | `workspaces/{ws}/projects/{key}` | No |
//! | `projects` | `workspaces/{ws}/projects/` | Yes |
//! | `repository` | `repositories/{ws}/{repo}` | No |
//! | `repositories` | `repositories/{ws}` | Yes |
//! | `pull_request` | `repositories/{ws}/{repo}/pullrequests/{id}` | No |
//! | `pull_requests` | `repositories/{ws}/{repo}/pullrequests?q=...` | Yes |
//! | `pull_request_activity` | `repositories/{ws}/{repo}/pullrequests/{id}/activity` | Yes |
//! | `commits` | `repositories/{ws}/{repo}/commits/{source}?exclude={dest}` | Yes |
//! | `repository_group_permissions` | `repositories/{ws}/{repo}/permissions-config/groups` | Yes |
//! | `repository_user_permissions` | `repositories/{ws}/{repo}/permissions-config/users` | Yes |
//! | `branch_restrictions` | `repositories/{ws}/{repo}/branch-restrictions` | Yes |
//! | `diff` | `repositories/{ws}/{repo}/diff/{from}..{to}` | No |

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use url::form_urlencoded;

use super::client::{BitbucketClient, RequestOptions};
use super::cloud::{
    BranchRestriction, Commit, Group, GroupPermission, Project, PullRequest, PullRequestActivity,
    PullRequestQuery, Repository, UserPermission, Workspace, WorkspaceMembership,
};
use super::common::{Page, UserRef};
use super::ApiError;
use crate::approval::DiffSource;

/// Number of API calls made per resource kind.
///
/// Paged resources count one call per page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCalls {
    pub workspace: u64,
    pub workspaces: u64,
    pub workspace_members: u64,
    pub user: u64,
    pub groups: u64,
    pub project: u64,
    pub projects: u64,
    pub repository: u64,
    pub repositories: u64,
    pub repository_group_permissions: u64,
    pub repository_user_permissions: u64,
    pub repository_branch_restrictions: u64,
    pub pull_request: u64,
    pub pull_requests: u64,
    pub pull_request_activity: u64,
    pub commits: u64,
    pub diff: u64,
}

impl ApiCalls {
    /// Sum over all resource kinds.
    pub fn total(&self) -> u64 {
        self.workspace
            + self.workspaces
            + self.workspace_members
            + self.user
            + self.groups
            + self.project
            + self.projects
            + self.repository
            + self.repositories
            + self.repository_group_permissions
            + self.repository_user_permissions
            + self.repository_branch_restrictions
            + self.pull_request
            + self.pull_requests
            + self.pull_request_activity
            + self.commits
            + self.diff
    }
}

/// Typed accessors over a [`BitbucketClient`], with call accounting.
///
/// # Example
///
/// ```rust,no_run
/// use bitbucket_ingest::api::{BitbucketClient, BitbucketGateway};
/// use bitbucket_ingest::auth::CredentialPool;
///
/// # async fn example() -> Result<(), bitbucket_ingest::api::ApiError> {
/// let pool = CredentialPool::from_tokens(vec!["token".to_string()])?;
/// let gateway = BitbucketGateway::new(BitbucketClient::cloud(pool)?);
///
/// for repo in gateway.repositories("acme").await? {
///     println!("{}", repo.full_name);
/// }
/// println!("{} calls", gateway.calls().total());
/// # Ok(())
/// # }
/// ```
pub struct BitbucketGateway {
    client: BitbucketClient,
    calls: Mutex<ApiCalls>,
}

impl BitbucketGateway {
    /// Wraps an authenticated client.
    pub fn new(client: BitbucketClient) -> Self {
        Self {
            client,
            calls: Mutex::new(ApiCalls::default()),
        }
    }

    /// The underlying client.
    pub fn client(&self) -> &BitbucketClient {
        &self.client
    }

    /// Snapshot of the call counters.
    pub fn calls(&self) -> ApiCalls {
        *self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, count: u64, counter: impl FnOnce(&mut ApiCalls) -> &mut u64) {
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        *counter(&mut calls) += count;
    }

    async fn fetch_one<T: DeserializeOwned>(
        &self,
        uri: &str,
        counter: impl FnOnce(&mut ApiCalls) -> &mut u64,
    ) -> Result<T, ApiError> {
        let value = self.client.get(uri, RequestOptions::default()).await?;
        self.record(1, counter);
        value.ok_or_else(|| ApiError::ResourceNotFound(uri.to_string()))
    }

    async fn fetch_all<T: DeserializeOwned>(
        &self,
        uri: &str,
        options: RequestOptions,
        counter: impl Fn(&mut ApiCalls) -> &mut u64,
    ) -> Result<Vec<T>, ApiError> {
        // Every fetched page counts, even when a later page fails
        let mut items = Vec::new();
        self.client
            .for_each_page(uri, options, |page: Page<T>| {
                self.record(1, &counter);
                items.extend(page.values);
            })
            .await?;
        Ok(items)
    }

    /// Fetches a workspace by slug or UUID.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ResourceNotFound`] if the workspace does not exist.
    pub async fn workspace(&self, workspace: &str) -> Result<Workspace, ApiError> {
        let uri = format!("workspaces/{}", workspace);
        let found = self
            .client
            .get::<Workspace>(&uri, RequestOptions::ignoring_not_found())
            .await?;
        self.record(1, |c| &mut c.workspace);

        found.ok_or_else(|| {
            ApiError::ResourceNotFound(format!(
                "Workspace '{}' was not found. Please verify the workspace in the configuration.",
                workspace
            ))
        })
    }

    /// Lists the workspaces the credentials can access.
    pub async fn workspaces(&self) -> Result<Vec<Workspace>, ApiError> {
        self.fetch_all("workspaces", RequestOptions::default(), |c| {
            &mut c.workspaces
        })
        .await
    }

    /// Fetches a user by UUID.
    pub async fn user(&self, uuid: &str) -> Result<UserRef, ApiError> {
        self.fetch_one(&format!("users/{}", uuid), |c| &mut c.user)
            .await
    }

    /// Lists the members of a workspace.
    pub async fn workspace_members(&self, workspace: &str) -> Result<Vec<UserRef>, ApiError> {
        let memberships: Vec<WorkspaceMembership> = self
            .fetch_all(
                &format!("workspaces/{}/members", workspace),
                RequestOptions::default(),
                |c| &mut c.workspace_members,
            )
            .await?;
        Ok(memberships.into_iter().map(|m| m.user).collect())
    }

    /// Lists the groups of a workspace through the legacy API.
    pub async fn groups(&self, workspace: &str) -> Result<Vec<Group>, ApiError> {
        self.fetch_all(
            &format!("groups/{}", workspace),
            RequestOptions::legacy(),
            |c| &mut c.groups,
        )
        .await
    }

    /// Fetches a project by key.
    pub async fn project(&self, workspace: &str, key: &str) -> Result<Project, ApiError> {
        self.fetch_one(&format!("workspaces/{}/projects/{}", workspace, key), |c| {
            &mut c.project
        })
        .await
    }

    /// Lists the projects of a workspace.
    pub async fn projects(&self, workspace: &str) -> Result<Vec<Project>, ApiError> {
        self.fetch_all(
            &format!("workspaces/{}/projects/", workspace),
            RequestOptions::default(),
            |c| &mut c.projects,
        )
        .await
    }

    /// Fetches a repository.
    pub async fn repository(&self, workspace: &str, repo: &str) -> Result<Repository, ApiError> {
        self.fetch_one(&format!("repositories/{}/{}", workspace, repo), |c| {
            &mut c.repository
        })
        .await
    }

    /// Lists the repositories of a workspace.
    pub async fn repositories(&self, workspace: &str) -> Result<Vec<Repository>, ApiError> {
        self.fetch_all(
            &format!("repositories/{}", workspace),
            RequestOptions::default(),
            |c| &mut c.repositories,
        )
        .await
    }

    /// Fetches a single pull request, including reviewers and participants.
    pub async fn pull_request(
        &self,
        workspace: &str,
        repo: &str,
        id: u64,
    ) -> Result<PullRequest, ApiError> {
        self.fetch_one(
            &format!("repositories/{}/{}/pullrequests/{}", workspace, repo, id),
            |c| &mut c.pull_request,
        )
        .await
    }

    /// Lists pull requests matching `query`.
    ///
    /// A repository without pull requests enabled answers 404, which yields
    /// an empty list.
    pub async fn pull_requests(
        &self,
        workspace: &str,
        repo: &str,
        query: &PullRequestQuery,
    ) -> Result<Vec<PullRequest>, ApiError> {
        let filter: String = form_urlencoded::byte_serialize(query.to_bbql().as_bytes()).collect();
        self.fetch_all(
            &format!("repositories/{}/{}/pullrequests?q={}", workspace, repo, filter),
            RequestOptions::ignoring_not_found(),
            |c| &mut c.pull_requests,
        )
        .await
    }

    /// Lists the activity feed of a pull request, newest first.
    pub async fn pull_request_activity(
        &self,
        workspace: &str,
        repo: &str,
        id: u64,
    ) -> Result<Vec<PullRequestActivity>, ApiError> {
        self.fetch_all(
            &format!(
                "repositories/{}/{}/pullrequests/{}/activity",
                workspace, repo, id
            ),
            RequestOptions::default(),
            |c| &mut c.pull_request_activity,
        )
        .await
    }

    /// Lists commits reachable from `source` but not from `destination`,
    /// newest first.
    pub async fn commits(
        &self,
        workspace: &str,
        repo: &str,
        source: &str,
        destination: &str,
    ) -> Result<Vec<Commit>, ApiError> {
        self.fetch_all(
            &format!(
                "repositories/{}/{}/commits/{}?exclude={}",
                workspace, repo, source, destination
            ),
            RequestOptions::default(),
            |c| &mut c.commits,
        )
        .await
    }

    /// Lists explicit group permissions on a repository.
    pub async fn repository_group_permissions(
        &self,
        workspace: &str,
        repo: &str,
    ) -> Result<Vec<GroupPermission>, ApiError> {
        self.fetch_all(
            &format!("repositories/{}/{}/permissions-config/groups", workspace, repo),
            RequestOptions::default(),
            |c| &mut c.repository_group_permissions,
        )
        .await
    }

    /// Lists explicit user permissions on a repository.
    pub async fn repository_user_permissions(
        &self,
        workspace: &str,
        repo: &str,
    ) -> Result<Vec<UserPermission>, ApiError> {
        self.fetch_all(
            &format!("repositories/{}/{}/permissions-config/users", workspace, repo),
            RequestOptions::default(),
            |c| &mut c.repository_user_permissions,
        )
        .await
    }

    /// Lists the branch restrictions of a repository.
    pub async fn branch_restrictions(
        &self,
        workspace: &str,
        repo: &str,
    ) -> Result<Vec<BranchRestriction>, ApiError> {
        self.fetch_all(
            &format!("repositories/{}/{}/branch-restrictions", workspace, repo),
            RequestOptions::default(),
            |c| &mut c.repository_branch_restrictions,
        )
        .await
    }

    /// Fetches the raw diff between two commits.
    pub async fn diff(
        &self,
        workspace: &str,
        repo: &str,
        from: &str,
        to: &str,
    ) -> Result<String, ApiError> {
        let range: String = form_urlencoded::byte_serialize(format!("{}..{}", from, to).as_bytes())
            .collect();
        let uri = format!("repositories/{}/{}/diff/{}", workspace, repo, range);
        let body = self.client.get_text(&uri, RequestOptions::default()).await?;
        self.record(1, |c| &mut c.diff);
        body.ok_or_else(|| ApiError::ResourceNotFound(uri))
    }
}

#[async_trait]
impl DiffSource for BitbucketGateway {
    async fn diff(
        &self,
        workspace: &str,
        repo: &str,
        from: &str,
        to: &str,
    ) -> Result<String, ApiError> {
        BitbucketGateway::diff(self, workspace, repo, from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calls_serialize_by_name() {
        let calls = ApiCalls {
            repositories: 3,
            diff: 2,
            ..ApiCalls::default()
        };
        let json = serde_json::to_value(calls).unwrap();
        assert_eq!(json["repositories"], 3);
        assert_eq!(json["pull_request_activity"], 0);
        assert_eq!(calls.total(), 5);
    }
}
