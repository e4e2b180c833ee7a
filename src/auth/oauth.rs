//
//  bitbucket-ingest
//  auth/oauth.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # OAuth 2.0 Client Credentials
//!
//! Each configured OAuth consumer is exchanged for an access token with the
//! `client_credentials` grant: the key and secret go in an HTTP Basic header
//! and the form body only carries the grant type.
//!
//! Bitbucket answers with the granted scopes as a single space-separated
//! string, which [`verify_scopes`] checks against the scopes ingestion needs.
//!
//! ## Scopes
//!
//! | Marker | Needed for | Required |
//! |--------|------------|----------|
//! | `account` | Workspaces, members, groups | Always |
//! | `project` | Projects | Always |
//! | `pullrequest` | Pull requests, activity, commits | When pull requests are ingested |

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::ScopeRequirements;
use crate::api::ApiError;

/// Default token endpoint for Bitbucket Cloud.
pub const DEFAULT_TOKEN_URL: &str = "https://bitbucket.org/site/oauth2/access_token";

/// Tokens and scopes returned by a successful exchange.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    /// The bearer token for API requests.
    pub access_token: String,

    /// Scopes actually granted to the consumer.
    pub scopes: Vec<String>,
}

/// Internal struct for deserializing token responses from Bitbucket.
#[derive(Deserialize)]
struct TokenResponseRaw {
    access_token: String,
    #[serde(default)]
    scopes: Option<String>,
}

impl From<TokenResponseRaw> for TokenGrant {
    fn from(raw: TokenResponseRaw) -> Self {
        let scopes = raw
            .scopes
            .map(|s| s.split_whitespace().map(String::from).collect())
            .unwrap_or_default();

        Self {
            access_token: raw.access_token,
            scopes,
        }
    }
}

/// Exchanges one consumer key/secret for an access token.
///
/// # Parameters
///
/// - `http`: The HTTP client to send the request with.
/// - `token_url`: The OAuth token endpoint.
/// - `ordinal`: Position of the credential, reported in errors.
/// - `key` / `secret`: The OAuth consumer pair.
///
/// # Errors
///
/// Returns [`ApiError::Authentication`] when the request cannot be sent,
/// the endpoint answers with a non-2xx status, or the body is not a token
/// response.
pub async fn exchange_client_credentials(
    http: &Client,
    token_url: &str,
    ordinal: usize,
    key: &str,
    secret: &str,
) -> Result<TokenGrant, ApiError> {
    let auth_error = |message: String| ApiError::Authentication {
        ordinal,
        endpoint: token_url.to_string(),
        message,
    };

    debug!(ordinal, "Requesting access token");

    let response = http
        .post(token_url)
        .basic_auth(key, Some(secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await
        .map_err(|e| auth_error(format!("Failed to request token for OAuth key {}: {}", key, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(auth_error(format!(
            "Failure requesting token for OAuth key {}. Response status: {}",
            key,
            status.as_u16()
        )));
    }

    let raw: TokenResponseRaw = response
        .json()
        .await
        .map_err(|e| auth_error(format!("Failed to parse token response: {}", e)))?;

    Ok(raw.into())
}

/// Checks that a granted scope list covers what ingestion needs.
///
/// # Errors
///
/// Returns [`ApiError::Authentication`] listing every missing scope and,
/// when a workspace is known, the settings page of its OAuth consumers.
///
/// # Example
///
/// ```rust
/// use bitbucket_ingest::auth::{verify_scopes, ScopeRequirements};
///
/// let needs_prs = ScopeRequirements { pull_requests: true, workspace_hint: None };
/// let granted = vec!["account".to_string(), "project".to_string()];
///
/// let err = verify_scopes(&granted, 0, "https://bitbucket.org/site/oauth2/access_token", &needs_prs)
///     .unwrap_err();
/// assert!(err.to_string().contains("Pull requests"));
/// ```
pub fn verify_scopes(
    granted: &[String],
    ordinal: usize,
    token_url: &str,
    requirements: &ScopeRequirements,
) -> Result<(), ApiError> {
    let has = |marker: &str| granted.iter().any(|scope| scope.contains(marker));

    let mut missing = Vec::new();
    if !has("account") {
        missing.push("Account");
    }
    if !has("project") {
        missing.push("Projects");
    }
    if requirements.pull_requests && !has("pullrequest") {
        missing.push("Pull requests");
    }

    if missing.is_empty() {
        return Ok(());
    }

    let mut message = format!(
        "Required scope(s) \"{}\" not set for OAuth key #{}. Check permissions for the OAuth consumer under Workspace settings",
        missing.join(", "),
        ordinal
    );
    match &requirements.workspace_hint {
        Some(workspace) => message.push_str(&format!(
            " at https://bitbucket.org/{}/workspace/settings/api",
            workspace
        )),
        None => message.push('.'),
    }

    Err(ApiError::Authentication {
        ordinal,
        endpoint: token_url.to_string(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scopes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_token_response_splits_scopes() {
        let raw: TokenResponseRaw = serde_json::from_str(
            r#"{"access_token": "abc", "scopes": "account project:write pullrequest"}"#,
        )
        .unwrap();
        let grant = TokenGrant::from(raw);
        assert_eq!(grant.access_token, "abc");
        assert_eq!(grant.scopes, scopes(&["account", "project:write", "pullrequest"]));
    }

    #[test]
    fn test_verify_scopes_accepts_markers() {
        let requirements = ScopeRequirements {
            pull_requests: true,
            workspace_hint: None,
        };
        let granted = scopes(&["account", "project:write", "pullrequest:write"]);
        assert!(verify_scopes(&granted, 0, DEFAULT_TOKEN_URL, &requirements).is_ok());
    }

    #[test]
    fn test_pull_request_scope_only_required_when_enabled() {
        let granted = scopes(&["account", "project"]);
        let without = ScopeRequirements::default();
        assert!(verify_scopes(&granted, 0, DEFAULT_TOKEN_URL, &without).is_ok());
    }

    #[test]
    fn test_verify_scopes_lists_missing_and_hint() {
        let requirements = ScopeRequirements {
            pull_requests: true,
            workspace_hint: Some("acme".to_string()),
        };
        let err = verify_scopes(&[], 2, DEFAULT_TOKEN_URL, &requirements).unwrap_err();

        match err {
            ApiError::Authentication { ordinal, message, .. } => {
                assert_eq!(ordinal, 2);
                assert!(message.contains("Account, Projects, Pull requests"));
                assert!(message.contains("https://bitbucket.org/acme/workspace/settings/api"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
