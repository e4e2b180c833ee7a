//
//  bitbucket-ingest
//  cli/run.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Run command
//!
//! Walks every configured workspace and writes one JSON line per entity:
//!
//! ```text
//! workspace
//! ├── user*
//! ├── group*
//! ├── project*
//! └── repository*
//!     ├── group_permission*
//!     ├── user_permission*
//!     ├── branch_restriction*
//!     └── pull_request*        (when pull requests are ingested)
//! api_calls
//! ```

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use std::collections::HashSet;
use std::io::{self, BufWriter, Write};
use tracing::{debug, info};

use crate::api::cloud::{PullRequest, Repository, Workspace};
use crate::api::common::UserRef;
use crate::approval::PrApprovalResult;
use crate::ingest::IngestClient;
use crate::output::RecordWriter;

use super::GlobalOptions;

/// Ingest all configured workspaces
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Ingest pull requests, commits and approvals
    #[arg(long)]
    pub pull_requests: bool,

    /// Fetch each pull request individually for reviewers and participants
    #[arg(long)]
    pub enriched: bool,

    /// Leave merge commits that change nothing out of approval tracking
    #[arg(long)]
    pub exclude_empty_merges: bool,

    /// Only pull requests updated after this RFC 3339 timestamp
    #[arg(long, value_name = "TIMESTAMP")]
    pub since: Option<DateTime<Utc>>,
}

/// A pull request with its approval state.
#[derive(Serialize)]
struct PullRequestRecord<'a> {
    pull_request: &'a PullRequest,
    approvals: &'a PrApprovalResult,
    approver_ids: Vec<&'a str>,
    reviewer_ids: Vec<&'a str>,
}

impl RunCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let mut config = global.load_config()?;
        config.ingest_pull_requests |= self.pull_requests;
        config.enriched_prs |= self.enriched;
        config.exclude_empty_merge_commits |= self.exclude_empty_merges;
        if self.since.is_some() {
            config.pull_requests_updated_since = self.since;
        }

        let client = IngestClient::connect(config).await?;
        let mut out = RecordWriter::new(BufWriter::new(io::stdout().lock()));

        let mut workspaces = Vec::new();
        client
            .iterate_workspaces(|workspace| {
                workspaces.push(workspace);
                Ok(())
            })
            .await?;

        let mut emitted_users: HashSet<String> = HashSet::new();
        for workspace in &workspaces {
            ingest_workspace(&client, workspace, &mut emitted_users, &mut out).await?;
        }

        out.emit("api_calls", None, None, client.calls())?;
        let written = out.written();
        out.into_inner()?;

        info!(records = written, calls = client.calls().total(), "Ingestion finished");
        Ok(())
    }
}

async fn ingest_workspace<W: Write>(
    client: &IngestClient,
    workspace: &Workspace,
    emitted_users: &mut HashSet<String>,
    out: &mut RecordWriter<W>,
) -> Result<()> {
    let ws = workspace.slug.as_str();
    out.emit("workspace", None, None, workspace)?;

    let mut known: HashSet<String> = HashSet::new();
    client
        .iterate_users(ws, |user: UserRef| {
            // A user is written once per run, whatever workspaces they share
            if let Some(id) = user.id() {
                known.insert(id.to_string());
                if !emitted_users.insert(id.to_string()) {
                    debug!(user = id, workspace = ws, "Skipping duplicate user");
                    return Ok(());
                }
            }
            out.emit("user", Some(ws), None, &user)
        })
        .await?;

    client
        .iterate_groups(ws, |group| out.emit("group", Some(ws), None, &group))
        .await?;

    client
        .iterate_projects(ws, |project| out.emit("project", Some(ws), None, &project))
        .await?;

    let mut repositories: Vec<Repository> = Vec::new();
    client
        .iterate_repositories(ws, |repo| {
            out.emit("repository", Some(ws), None, &repo)?;
            repositories.push(repo);
            Ok(())
        })
        .await?;

    for repo in &repositories {
        let slug = repo.repo_slug();

        client
            .iterate_repository_group_permissions(ws, slug, |permission| {
                out.emit("group_permission", Some(ws), Some(slug), &permission)
            })
            .await?;

        client
            .iterate_repository_user_permissions(ws, slug, |permission| {
                out.emit("user_permission", Some(ws), Some(slug), &permission)
            })
            .await?;

        client
            .iterate_branch_restrictions(ws, slug, |restriction| {
                out.emit("branch_restriction", Some(ws), Some(slug), &restriction)
            })
            .await?;

        if client.config().ingest_pull_requests {
            client
                .iterate_pull_requests(ws, slug, &known, |pr, approvals| {
                    let record = PullRequestRecord {
                        pull_request: &pr,
                        approvals: &approvals,
                        approver_ids: approvals.approver_ids(),
                        reviewer_ids: pr.reviewer_ids(),
                    };
                    out.emit("pull_request", Some(ws), Some(slug), &record)
                })
                .await?;
        }
    }

    info!(workspace = ws, repositories = repositories.len(), "Workspace ingested");
    Ok(())
}
