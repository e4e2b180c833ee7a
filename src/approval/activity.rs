//
//  bitbucket-ingest
//  approval/activity.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Activity feed to event timeline.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::api::cloud::{PrEndpoint, PullRequestActivity, PullRequestState};
use crate::api::common::UserRef;

/// An activity entry relevant to approval tracking.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityEvent {
    /// A user approved the pull request at `hash`.
    Approval {
        approver: UserRef,
        hash: String,
        at: Option<DateTime<Utc>>,
    },

    /// The source or destination moved, or the state changed.
    Update {
        new_source: String,
        new_destination: Option<String>,
        state: PullRequestState,
        at: Option<DateTime<Utc>>,
    },
}

impl ActivityEvent {
    /// When the event happened, if the provider said so.
    pub fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Approval { at, .. } | Self::Update { at, .. } => *at,
        }
    }
}

/// Builds the chronological event list from a newest-first activity feed.
///
/// The approved hash is the source tip recorded in the approval entry. When
/// the entry lacks it, the source of the latest preceding update is used,
/// and failing that `fallback_source` (the pull request's current tip).
/// Entries that are neither approvals nor updates are dropped, as are
/// approvals whose hash cannot be derived.
pub fn timeline(entries: Vec<PullRequestActivity>, fallback_source: Option<&str>) -> Vec<ActivityEvent> {
    let mut events = Vec::new();
    let mut last_source: Option<String> = None;

    for entry in entries.into_iter().rev() {
        if let Some(update) = entry.update {
            let Some(new_source) = update.source.hash().map(String::from) else {
                debug!("Skipping update without a source commit");
                continue;
            };
            last_source = Some(new_source.clone());
            events.push(ActivityEvent::Update {
                new_source,
                new_destination: update.destination.hash().map(String::from),
                state: update.state,
                at: update.date,
            });
        } else if let Some(approval) = entry.approval {
            let recorded = approval
                .pullrequest
                .as_ref()
                .and_then(|pr| pr.source.as_ref())
                .and_then(PrEndpoint::hash);

            let hash = recorded
                .map(String::from)
                .or_else(|| last_source.clone())
                .or_else(|| fallback_source.map(String::from));

            match hash {
                Some(hash) => events.push(ActivityEvent::Approval {
                    approver: approval.user,
                    hash,
                    at: approval.date,
                }),
                None => debug!(
                    approver = %approval.user.display_name,
                    "Skipping approval without a derivable commit"
                ),
            }
        }
    }

    events
}
