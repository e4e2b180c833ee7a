//
//  bitbucket-ingest
//  auth/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Authentication Module
//!
//! Bitbucket Cloud limits repository, pull request and pull request detail
//! calls to roughly 1000 per hour per OAuth consumer. Large workspaces get
//! around that by configuring several consumers; this module turns those
//! key/secret pairs into bearer tokens and hands them out one at a time.
//!
//! ## Module Structure
//!
//! - [`oauth`]: client-credentials token exchange and scope verification
//! - [`pool`]: the ordered, forward-only credential pool
//!
//! ## Example
//!
//! ```rust
//! use bitbucket_ingest::auth::CredentialPool;
//!
//! // Keys and secrets come from comma-delimited configuration strings
//! let pool = CredentialPool::from_config_strings("key1, key2", "secret1,secret2")?;
//! assert_eq!(pool.len(), 2);
//! # Ok::<(), bitbucket_ingest::api::ApiError>(())
//! ```

mod oauth;
mod pool;

pub use oauth::*;
pub use pool::*;

use std::collections::BTreeSet;
use std::fmt;

/// One OAuth consumer key/secret pair and the token issued for it.
///
/// Created from configuration at startup. The token and scopes are filled in
/// by the client-credentials exchange and never change afterward.
///
/// # Example
///
/// ```rust
/// use bitbucket_ingest::auth::Credential;
///
/// let credential = Credential::new("key", "secret");
/// assert!(credential.token().is_none());
/// ```
///
/// # Notes
///
/// - `Debug` output redacts the secret and the token
#[derive(Clone)]
pub struct Credential {
    key: String,
    secret: String,
    token: Option<String>,
    granted_scopes: BTreeSet<String>,
}

impl Credential {
    /// Creates a credential that still needs to be exchanged for a token.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
            token: None,
            granted_scopes: BTreeSet::new(),
        }
    }

    /// Creates a credential around a bearer token issued out of band.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            key: String::new(),
            secret: String::new(),
            token: Some(token.into()),
            granted_scopes: BTreeSet::new(),
        }
    }

    /// The OAuth consumer key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The OAuth consumer secret.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// The bearer token, once granted.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Scopes reported by the token endpoint.
    pub fn granted_scopes(&self) -> &BTreeSet<String> {
        &self.granted_scopes
    }

    pub(crate) fn grant(&mut self, grant: TokenGrant) {
        self.token = Some(grant.access_token);
        self.granted_scopes = grant.scopes.into_iter().collect();
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("granted_scopes", &self.granted_scopes)
            .finish()
    }
}

/// Scopes a token must carry before the pool accepts it.
///
/// Account and project access are always required; pull request access only
/// when pull requests are ingested.
#[derive(Debug, Clone, Default)]
pub struct ScopeRequirements {
    /// Require the `pullrequest` scope.
    pub pull_requests: bool,

    /// Workspace used to point the operator at the consumer settings page.
    pub workspace_hint: Option<String>,
}
