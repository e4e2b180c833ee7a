//
//  bitbucket-ingest
//  api/common/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Common API Types for the Bitbucket Cloud ingestion client
//!
//! This module provides the types shared by every layer of the client: the
//! error taxonomy, the lightweight user reference embedded in most payloads,
//! and the pagination envelopes (re-exported from [`pagination`]).
//!
//! # Overview
//!
//! - [`ApiError`] - Unified error type for all API operations
//! - [`UserRef`] - Lightweight user reference used across resources
//! - Pagination types (re-exported from [`pagination`] submodule)
//!
//! # Example
//!
//! ```rust
//! use bitbucket_ingest::api::common::ApiError;
//!
//! fn handle_result<T>(result: Result<T, ApiError>) {
//!     match result {
//!         Ok(_) => println!("Success!"),
//!         Err(ApiError::RetriesExceeded { .. }) => println!("Add another OAuth consumer"),
//!         Err(ApiError::ResourceNotFound(resource)) => println!("Not found: {}", resource),
//!         Err(e) => println!("Error: {}", e),
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod pagination;

pub use pagination::*;

/// Unified error type for all Bitbucket API operations.
///
/// Every variant carries enough context (endpoint, status, credential
/// ordinal) to diagnose the failure without re-running the request.
///
/// # Variants
///
/// | Variant | Raised when | Retried by the client |
/// |---------|-------------|-----------------------|
/// | `Configuration` | Credential configuration is malformed or missing | No |
/// | `Authentication` | Token exchange failed or scopes are missing | No |
/// | `ResourceNotFound` | A configured workspace does not exist | No |
/// | `RetriesExceeded` | Every credential has been rate limited | No |
/// | `Provider` | Any other non-2xx response or transport failure | No |
/// | `Protocol` | A pagination link has an unexpected shape | No |
/// | `IllegalState` | The client was used before authentication | No |
/// | `CredentialsExhausted` | The pool cannot advance past its last credential | No |
/// | `Decode` | A response body does not match the expected type | No |
///
/// Only HTTP 429 is recovered from, and only by rotating credentials.
///
/// # Example
///
/// ```rust
/// use bitbucket_ingest::api::common::ApiError;
///
/// let err = ApiError::Provider {
///     endpoint: "https://bitbucket.org/api/2.0/repositories/acme".to_string(),
///     status: Some(403),
///     status_text: "Forbidden".to_string(),
/// };
///
/// assert!(err.is_forbidden());
/// assert_eq!(err.status(), Some(403));
/// ```
#[derive(Error, Debug)]
pub enum ApiError {
    /// Credential configuration is malformed or missing.
    ///
    /// Fatal: the configuration has to be fixed before anything can run.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A credential could not be exchanged for a token, or the granted token
    /// lacks a required scope.
    ///
    /// # Fields
    ///
    /// - `ordinal` - Zero-based position of the offending credential
    /// - `endpoint` - The token endpoint that was called
    /// - `message` - Operator-facing explanation
    #[error("Authentication failed for credential #{ordinal} ({endpoint}): {message}")]
    Authentication {
        /// Zero-based position of the credential in the configured list.
        ordinal: usize,
        /// The token endpoint that was called.
        endpoint: String,
        /// Operator-facing explanation.
        message: String,
    },

    /// The requested top-level resource does not exist.
    ///
    /// Distinguishable from transient failures: retrying will not help.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Rate limiting exhausted every configured credential.
    #[error("Retries exceeded requesting '{endpoint}': {message}")]
    RetriesExceeded {
        /// The endpoint whose request was rate limited.
        endpoint: String,
        /// Operator-facing explanation.
        message: String,
    },

    /// A non-2xx response (other than a recovered 429) or a transport failure.
    ///
    /// `status` is `None` when the request never produced a response.
    #[error(
        "Provider API error requesting '{endpoint}' (status {}): {status_text}",
        .status.map(|s| s.to_string()).unwrap_or_else(|| "n/a".to_string())
    )]
    Provider {
        /// The fully resolved URL that was requested.
        endpoint: String,
        /// HTTP status code, when a response was received.
        status: Option<u16>,
        /// Status reason plus any message the provider returned.
        status_text: String,
    },

    /// The provider returned a pagination link that does not start with the
    /// expected versioned base URL.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The client was used out of order, e.g. requesting before authenticating.
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// The credential pool has no credential after the active one.
    ///
    /// # Parameters
    ///
    /// - `0` - Number of credentials in the pool
    #[error("All {0} credential(s) have been exhausted")]
    CredentialsExhausted(usize),

    /// A successful response body could not be deserialized.
    #[error("Failed to decode response from '{endpoint}': {source}")]
    Decode {
        /// The URL whose body failed to decode.
        endpoint: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Returns the HTTP status carried by a [`ApiError::Provider`] error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => *status,
            _ => None,
        }
    }

    /// Checks whether this error is a 403 from the provider.
    ///
    /// Used by permission-scoped fetches, where a 403 means the OAuth consumer
    /// lacks repository admin permission rather than a hard failure.
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }
}

/// Lightweight user reference embedded in Bitbucket Cloud payloads.
///
/// The same shape appears as a workspace member, a pull request author,
/// an approver, a commit author, and a group member.
///
/// # Example
///
/// ```rust
/// use bitbucket_ingest::api::common::UserRef;
///
/// let json = r#"{
///     "uuid": "{109cd504-f55e-48a0-8e7a-d04f0b10f016}",
///     "display_name": "Jane Doe",
///     "nickname": "janed",
///     "account_id": "557058:1234"
/// }"#;
///
/// let user: UserRef = serde_json::from_str(json).unwrap();
/// assert_eq!(user.id(), Some("{109cd504-f55e-48a0-8e7a-d04f0b10f016}"));
/// ```
///
/// # Notes
///
/// - `uuid` may be absent for deleted or system users
/// - Teams (deprecated) deserialize into the same shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// UUID identifier for the user, including curly braces.
    #[serde(default)]
    pub uuid: Option<String>,

    /// Display name of the user.
    #[serde(default)]
    pub display_name: String,

    /// Username or nickname of the user.
    #[serde(default)]
    pub nickname: Option<String>,

    /// Atlassian account identifier.
    #[serde(default)]
    pub account_id: Option<String>,
}

impl UserRef {
    /// The identifier used to match this user against known identities.
    pub fn id(&self) -> Option<&str> {
        self.uuid.as_deref()
    }
}
