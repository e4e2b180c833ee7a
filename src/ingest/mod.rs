//
//  bitbucket-ingest
//  ingest/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Ingestion
//!
//! [`IngestClient`] walks the resources of the configured workspaces and
//! hands each entity to a caller-supplied handler. Every `iterate_*` call
//! completes only after all pages have been fetched and handled.
//!
//! Handlers return `anyhow::Result<()>`; the first handler error stops the
//! walk and is returned to the caller.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bitbucket_ingest::config::IngestConfig;
//! use bitbucket_ingest::ingest::IngestClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = IngestConfig::load(None)?;
//! let client = IngestClient::connect(config).await?;
//!
//! client
//!     .iterate_workspaces(|workspace| {
//!         println!("{}", workspace.slug);
//!         Ok(())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::future::Future;
use tracing::{info, warn};

use crate::api::cloud::{
    BranchRestriction, Group, GroupPermission, Project, PullRequest, Repository, UserPermission,
    Workspace,
};
use crate::api::common::UserRef;
use crate::api::{ApiCalls, ApiError, BitbucketClient, BitbucketGateway};
use crate::approval::{collect_for_pull_request, PrApprovalResult};
use crate::config::IngestConfig;

/// Entry point for walking Bitbucket Cloud resources.
pub struct IngestClient {
    gateway: BitbucketGateway,
    config: IngestConfig,
}

impl IngestClient {
    /// Wraps an authenticated gateway.
    pub fn new(gateway: BitbucketGateway, config: IngestConfig) -> Self {
        Self { gateway, config }
    }

    /// Validates the configuration, authenticates every credential and
    /// returns a ready client.
    pub async fn connect(config: IngestConfig) -> Result<Self> {
        config.validate()?;

        let pool = config.credentials()?;
        let client = BitbucketClient::new(config.endpoints()?, pool)?;
        client
            .authenticate(&config.scope_requirements())
            .await
            .context("Failed to authenticate OAuth credentials")?;

        Ok(Self::new(BitbucketGateway::new(client), config))
    }

    /// The underlying gateway.
    pub fn gateway(&self) -> &BitbucketGateway {
        &self.gateway
    }

    /// The configuration in use.
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Snapshot of the API call counters.
    pub fn calls(&self) -> ApiCalls {
        self.gateway.calls()
    }

    /// Fetches each configured workspace.
    ///
    /// # Errors
    ///
    /// Fails with [`ApiError::ResourceNotFound`] on the first workspace that
    /// does not exist.
    pub async fn iterate_workspaces<F>(&self, mut handler: F) -> Result<()>
    where
        F: FnMut(Workspace) -> Result<()>,
    {
        for slug in self.workspaces() {
            let workspace = self.gateway.workspace(slug).await?;
            handler(workspace)?;
        }
        Ok(())
    }

    /// Members of a workspace.
    pub async fn iterate_users<F>(&self, workspace: &str, handler: F) -> Result<()>
    where
        F: FnMut(UserRef) -> Result<()>,
    {
        let users = self.gateway.workspace_members(workspace).await?;
        each(users, handler)
    }

    /// Identifiers of a workspace's members, for commit author resolution.
    pub async fn known_identities(&self, workspace: &str) -> Result<HashSet<String>> {
        let users = self.gateway.workspace_members(workspace).await?;
        Ok(users
            .iter()
            .filter_map(UserRef::id)
            .map(String::from)
            .collect())
    }

    /// Groups of a workspace.
    pub async fn iterate_groups<F>(&self, workspace: &str, handler: F) -> Result<()>
    where
        F: FnMut(Group) -> Result<()>,
    {
        let groups = self.gateway.groups(workspace).await?;
        each(groups, handler)
    }

    /// Projects of a workspace.
    pub async fn iterate_projects<F>(&self, workspace: &str, handler: F) -> Result<()>
    where
        F: FnMut(Project) -> Result<()>,
    {
        let projects = self.gateway.projects(workspace).await?;
        each(projects, handler)
    }

    /// Repositories of a workspace.
    pub async fn iterate_repositories<F>(&self, workspace: &str, handler: F) -> Result<()>
    where
        F: FnMut(Repository) -> Result<()>,
    {
        let repositories = self.gateway.repositories(workspace).await?;
        each(repositories, handler)
    }

    /// Pull requests of a repository with their approval state.
    ///
    /// Pull requests are listed with the configured filter; with
    /// `enriched_prs` each one is fetched again individually.
    pub async fn iterate_pull_requests<F>(
        &self,
        workspace: &str,
        repo: &str,
        known_identities: &HashSet<String>,
        mut handler: F,
    ) -> Result<()>
    where
        F: FnMut(PullRequest, PrApprovalResult) -> Result<()>,
    {
        let query = self.config.pull_request_query();
        let pull_requests = self.gateway.pull_requests(workspace, repo, &query).await?;
        info!(workspace, repo, count = pull_requests.len(), "Listed pull requests");

        for listed in pull_requests {
            let pr = if self.config.enriched_prs {
                self.gateway.pull_request(workspace, repo, listed.id).await?
            } else {
                listed
            };

            let approvals = collect_for_pull_request(
                &self.gateway,
                workspace,
                repo,
                &pr,
                known_identities,
                self.config.exclude_empty_merge_commits,
            )
            .await?;

            handler(pr, approvals)?;
        }
        Ok(())
    }

    /// Explicit group permissions of a repository.
    ///
    /// Without repository admin permission this logs a warning and handles
    /// nothing.
    pub async fn iterate_repository_group_permissions<F>(
        &self,
        workspace: &str,
        repo: &str,
        handler: F,
    ) -> Result<()>
    where
        F: FnMut(GroupPermission) -> Result<()>,
    {
        permission_scoped(
            "repository group permissions",
            workspace,
            repo,
            self.gateway.repository_group_permissions(workspace, repo),
            handler,
        )
        .await
    }

    /// Explicit user permissions of a repository.
    pub async fn iterate_repository_user_permissions<F>(
        &self,
        workspace: &str,
        repo: &str,
        handler: F,
    ) -> Result<()>
    where
        F: FnMut(UserPermission) -> Result<()>,
    {
        permission_scoped(
            "repository user permissions",
            workspace,
            repo,
            self.gateway.repository_user_permissions(workspace, repo),
            handler,
        )
        .await
    }

    /// Branch restrictions of a repository.
    pub async fn iterate_branch_restrictions<F>(
        &self,
        workspace: &str,
        repo: &str,
        handler: F,
    ) -> Result<()>
    where
        F: FnMut(BranchRestriction) -> Result<()>,
    {
        permission_scoped(
            "branch restrictions",
            workspace,
            repo,
            self.gateway.branch_restrictions(workspace, repo),
            handler,
        )
        .await
    }

    fn workspaces(&self) -> impl Iterator<Item = &str> {
        self.config
            .workspaces
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
    }
}

fn each<T, F>(items: Vec<T>, mut handler: F) -> Result<()>
where
    F: FnMut(T) -> Result<()>,
{
    for item in items {
        handler(item)?;
    }
    Ok(())
}

/// Runs a fetch that needs repository admin permission.
async fn permission_scoped<T, F>(
    resource: &str,
    workspace: &str,
    repo: &str,
    fetch: impl Future<Output = Result<Vec<T>, ApiError>>,
    handler: F,
) -> Result<()>
where
    F: FnMut(T) -> Result<()>,
{
    match fetch.await {
        Ok(items) => each(items, handler),
        Err(e) if e.is_forbidden() => {
            warn!(
                event = "missing_permission",
                workspace,
                repo,
                resource,
                "Could not fetch {}. Please add Repositories Admin permission to the OAuth consumer.",
                resource
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
