//
//  bitbucket-ingest
//  api/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # API Client Layer
//!
//! This module provides the HTTP layer for reading Bitbucket Cloud.
//!
//! ## Architecture
//!
//! - [`client`]: GET requests with bearer auth, rate-limit rotation and
//!   the "not found" sentinel
//! - `walker`: pagination over 2.0 `next` links and legacy bare arrays
//! - [`gateway`]: one accessor per resource, with call accounting
//! - [`cloud`]: serde types for Bitbucket Cloud resources
//! - [`common`]: errors, pagination envelopes, user references
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bitbucket_ingest::api::{BitbucketClient, BitbucketGateway};
//! use bitbucket_ingest::auth::{CredentialPool, ScopeRequirements};
//!
//! # async fn example() -> Result<(), bitbucket_ingest::api::ApiError> {
//! let pool = CredentialPool::from_config_strings("key1,key2", "secret1,secret2")?;
//! let client = BitbucketClient::cloud(pool)?;
//! client.authenticate(&ScopeRequirements::default()).await?;
//!
//! let gateway = BitbucketGateway::new(client);
//! let workspace = gateway.workspace("acme").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`ApiError`]. Only HTTP 429 is recovered, by
//! moving to the next credential; the last credential being rate limited
//! surfaces as `RetriesExceeded`.

pub mod client;

pub mod cloud;

pub mod common;

pub mod gateway;

mod walker;

pub use client::BitbucketClient;
pub use common::ApiError;
pub use gateway::{ApiCalls, BitbucketGateway};
