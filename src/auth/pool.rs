//
//  bitbucket-ingest
//  auth/pool.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Credential Pool
//!
//! An ordered list of credentials with a cursor naming the active one.
//!
//! Rotation is strictly forward. A consumer burns through its hourly budget in
//! five to seven minutes, by which point an earlier consumer has only
//! recovered a hundred calls or so; rotating back would mostly buy more 429s.
//! Once the last credential is rate limited the pool stays exhausted for the
//! rest of the run.

use reqwest::Client;
use tracing::{info, warn};

use super::{exchange_client_credentials, verify_scopes, Credential, ScopeRequirements};
use crate::api::ApiError;

/// Ordered credentials plus a monotonically non-decreasing cursor.
///
/// # Example
///
/// ```rust
/// use bitbucket_ingest::auth::CredentialPool;
///
/// let mut pool = CredentialPool::from_tokens(vec!["a".into(), "b".into()])?;
/// assert_eq!(pool.current_token()?, "a");
///
/// pool.advance()?;
/// assert_eq!(pool.current_token()?, "b");
///
/// // There is nothing after the last credential
/// assert!(pool.advance().is_err());
/// # Ok::<(), bitbucket_ingest::api::ApiError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
    cursor: usize,
    authenticated: bool,
}

impl CredentialPool {
    /// Builds a pool from parallel key and secret lists.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if either list is empty or the
    /// lists differ in length.
    pub fn initialize(keys: Vec<String>, secrets: Vec<String>) -> Result<Self, ApiError> {
        if keys.is_empty() || secrets.is_empty() {
            return Err(ApiError::Configuration(
                "\"oauth_key(s)\" and \"oauth_secret(s)\" are required".to_string(),
            ));
        }
        if keys.len() != secrets.len() {
            return Err(ApiError::Configuration(format!(
                "Number of comma-delimited OAuth keys ({}) and secrets ({}) differ in the config",
                keys.len(),
                secrets.len()
            )));
        }

        let credentials = keys
            .into_iter()
            .zip(secrets)
            .map(|(key, secret)| Credential::new(key, secret))
            .collect();

        Ok(Self {
            credentials,
            cursor: 0,
            authenticated: false,
        })
    }

    /// Builds a pool from comma-delimited key and secret strings.
    ///
    /// All whitespace is ignored, so `"key1, key2"` and `"key1,key2"` are
    /// equivalent.
    pub fn from_config_strings(keys: &str, secrets: &str) -> Result<Self, ApiError> {
        Self::initialize(split_credential_list(keys)?, split_credential_list(secrets)?)
    }

    /// Builds an already-authenticated pool from pre-issued bearer tokens.
    pub fn from_tokens(tokens: Vec<String>) -> Result<Self, ApiError> {
        if tokens.is_empty() {
            return Err(ApiError::Configuration(
                "At least one access token is required".to_string(),
            ));
        }

        Ok(Self {
            credentials: tokens.into_iter().map(Credential::with_token).collect(),
            cursor: 0,
            authenticated: true,
        })
    }

    /// Exchanges every credential for a token and verifies its scopes.
    ///
    /// Resets the cursor to the first credential on success.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Authentication`] for the first credential whose
    /// exchange fails or whose scopes are insufficient.
    pub async fn authenticate_all(
        &mut self,
        http: &Client,
        token_url: &str,
        requirements: &ScopeRequirements,
    ) -> Result<(), ApiError> {
        for (ordinal, credential) in self.credentials.iter_mut().enumerate() {
            let grant = exchange_client_credentials(
                http,
                token_url,
                ordinal,
                credential.key(),
                credential.secret(),
            )
            .await?;
            verify_scopes(&grant.scopes, ordinal, token_url, requirements)?;
            credential.grant(grant);
        }

        self.cursor = 0;
        self.authenticated = true;
        info!(credentials = self.credentials.len(), "Authenticated all credentials");
        Ok(())
    }

    /// Returns the active credential's token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::IllegalState`] before [`authenticate_all`](Self::authenticate_all).
    pub fn current_token(&self) -> Result<&str, ApiError> {
        if !self.authenticated {
            return Err(ApiError::IllegalState(
                "Credentials must be authenticated before making requests".to_string(),
            ));
        }

        self.credentials
            .get(self.cursor)
            .and_then(Credential::token)
            .ok_or_else(|| {
                ApiError::IllegalState(format!("Credential #{} has no access token", self.cursor))
            })
    }

    /// Moves to the next credential.
    ///
    /// # Returns
    ///
    /// The ordinal of the newly active credential.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::CredentialsExhausted`] if the active credential is
    /// the last one. The cursor does not move in that case.
    pub fn advance(&mut self) -> Result<usize, ApiError> {
        if self.cursor + 1 >= self.credentials.len() {
            return Err(ApiError::CredentialsExhausted(self.credentials.len()));
        }

        warn!(
            "Rate limiting encountered on credential #{}. Going to credential #{}.",
            self.cursor,
            self.cursor + 1
        );
        self.cursor += 1;
        Ok(self.cursor)
    }

    /// Advances past `ordinal` unless another request already did.
    ///
    /// A request that was rate limited on credential `ordinal` calls this
    /// under the pool lock. If the cursor has already moved beyond `ordinal`
    /// the request simply retries on the current credential.
    pub fn advance_past(&mut self, ordinal: usize) -> Result<usize, ApiError> {
        if self.cursor > ordinal {
            return Ok(self.cursor);
        }
        self.advance()
    }

    /// Ordinal of the active credential.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of credentials in the pool.
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Checks if the pool holds no credentials.
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Checks if every credential has a token.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

/// Splits a comma-delimited credential string, ignoring all whitespace.
fn split_credential_list(raw: &str) -> Result<Vec<String>, ApiError> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Ok(Vec::new());
    }

    let parts: Vec<String> = compact.split(',').map(String::from).collect();
    if parts.iter().any(String::is_empty) {
        return Err(ApiError::Configuration(format!(
            "Malformed comma-delimited credential list: '{}'",
            raw.trim()
        )));
    }
    Ok(parts)
}
