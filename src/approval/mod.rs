//
//  bitbucket-ingest
//  approval/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Pull Request Approval Tracking
//!
//! Determines which commits of a pull request were approved, by whom, and
//! whether a later push invalidated an approval.
//!
//! ## Module Structure
//!
//! - [`activity`]: turns the activity feed into a chronological event list
//! - [`reconcile`]: replays events against the commit graph
//! - [`diff`]: detects merge commits that introduce no changes
//! - [`collect`]: fetches everything for one pull request and reconciles it
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashSet;
//! use bitbucket_ingest::approval::reconcile;
//!
//! let known: HashSet<String> = HashSet::new();
//! let result = reconcile(&[], &[], &known);
//! assert!(result.approved_commits.is_empty());
//! assert!(!result.approved_commits_removed);
//! ```

pub mod activity;
pub mod collect;
pub mod diff;
pub mod reconcile;

pub use activity::{timeline, ActivityEvent};
pub use collect::collect_for_pull_request;
pub use diff::{DiffSource, MergeCommitClassifier};
pub use reconcile::{reconcile, Approval, PrApprovalReconciler, PrApprovalResult};
