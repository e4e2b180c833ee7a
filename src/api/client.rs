//
//  bitbucket-ingest
//  api/client.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # HTTP Client for the Bitbucket Cloud API
//!
//! This module provides the core HTTP client used by every accessor. It owns
//! the credential pool and performs GET requests that survive rate limiting by
//! rotating to the next credential.
//!
//! ## Features
//!
//! - Relative paths resolved against the 2.0 or the legacy 1.0 base
//! - Bearer token of the active credential on every request
//! - HTTP 429 recovered by advancing the pool and retrying the same request
//! - Optional "not found" sentinel for endpoints where 404 means "nothing"
//! - Provider error messages extracted from JSON error bodies
//! - 10 second timeout and a custom User-Agent header

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::ApiError;
use crate::auth::{CredentialPool, ScopeRequirements, DEFAULT_TOKEN_URL};

/// Default base URL of the Bitbucket Cloud 2.0 API.
pub const DEFAULT_BASE_URL: &str = "https://bitbucket.org/api/2.0/";

/// Default base URL of the legacy 1.0 API, still needed for groups.
pub const DEFAULT_LEGACY_BASE_URL: &str = "https://bitbucket.org/api/1.0/";

/// Timeout applied to every request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Extracts the provider's message from an error body.
///
/// Bitbucket Cloud returns errors in the format:
/// ```json
/// {"type": "error", "error": {"message": "Human readable message"}}
/// ```
///
/// Returns the status reason alone when the body carries no message, and the
/// reason followed by the message otherwise.
pub fn format_status_text(status: StatusCode, body: &str) -> String {
    let reason = status.canonical_reason().unwrap_or("Unknown status").to_string();

    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|e| e.get("message").or_else(|| e.get("detail")))
                .or_else(|| json.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        });

    match message {
        Some(message) if !message.is_empty() => format!("{}: {}", reason, message),
        _ => reason,
    }
}

/// Where the client sends its requests.
///
/// # Example
///
/// ```rust
/// use bitbucket_ingest::api::client::ApiEndpoints;
///
/// let endpoints = ApiEndpoints::default();
/// assert_eq!(endpoints.base_url, "https://bitbucket.org/api/2.0/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    /// Base URL of the 2.0 API.
    pub base_url: String,

    /// Base URL of the legacy 1.0 API.
    pub legacy_base_url: String,

    /// OAuth token endpoint.
    pub token_url: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            legacy_base_url: DEFAULT_LEGACY_BASE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

impl ApiEndpoints {
    /// Endpoints rooted at a single server, as used by local test servers.
    ///
    /// ```rust
    /// use bitbucket_ingest::api::client::ApiEndpoints;
    ///
    /// let endpoints = ApiEndpoints::rooted_at("http://127.0.0.1:1234/");
    /// assert_eq!(endpoints.legacy_base_url, "http://127.0.0.1:1234/api/1.0/");
    /// ```
    pub fn rooted_at(root: &str) -> Self {
        let root = root.trim_end_matches('/');
        Self {
            base_url: format!("{}/api/2.0/", root),
            legacy_base_url: format!("{}/api/1.0/", root),
            token_url: format!("{}/site/oauth2/access_token", root),
        }
    }

    /// Base URL for the requested API version, without a trailing slash.
    pub fn base_for(&self, use_legacy_api: bool) -> &str {
        let base = if use_legacy_api {
            &self.legacy_base_url
        } else {
            &self.base_url
        };
        base.trim_end_matches('/')
    }
}

/// Per-request behavior switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Treat 404 as "no result" instead of an error.
    pub ignore_not_found: bool,

    /// Resolve relative paths against the legacy 1.0 base.
    pub use_legacy_api: bool,
}

impl RequestOptions {
    /// Options for a 2.0 request that tolerates 404.
    pub fn ignoring_not_found() -> Self {
        Self {
            ignore_not_found: true,
            use_legacy_api: false,
        }
    }

    /// Options for a legacy 1.0 request.
    pub fn legacy() -> Self {
        Self {
            ignore_not_found: false,
            use_legacy_api: true,
        }
    }
}

/// The HTTP client for the Bitbucket Cloud API.
///
/// The client is shared by reference; the credential pool behind it is
/// guarded by an async mutex, so concurrent requests see one cursor.
///
/// # Example
///
/// ```rust,no_run
/// use bitbucket_ingest::api::BitbucketClient;
/// use bitbucket_ingest::api::client::{ApiEndpoints, RequestOptions};
/// use bitbucket_ingest::auth::{CredentialPool, ScopeRequirements};
///
/// # async fn example() -> Result<(), bitbucket_ingest::api::ApiError> {
/// let pool = CredentialPool::from_config_strings("key1,key2", "secret1,secret2")?;
/// let client = BitbucketClient::new(ApiEndpoints::default(), pool)?;
/// client.authenticate(&ScopeRequirements::default()).await?;
///
/// let body = client.get_text("workspaces/acme", RequestOptions::default()).await?;
/// # Ok(())
/// # }
/// ```
pub struct BitbucketClient {
    /// The underlying HTTP client
    http: Client,
    /// Base URLs and token endpoint
    endpoints: ApiEndpoints,
    /// Credentials, rotated forward on rate limiting
    credentials: Mutex<CredentialPool>,
}

impl BitbucketClient {
    /// Creates a client over the given endpoints and credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the HTTP client cannot be built.
    pub fn new(endpoints: ApiEndpoints, credentials: CredentialPool) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoints,
            credentials: Mutex::new(credentials),
        })
    }

    /// Creates a client for Bitbucket Cloud at its default endpoints.
    pub fn cloud(credentials: CredentialPool) -> Result<Self, ApiError> {
        Self::new(ApiEndpoints::default(), credentials)
    }

    /// The endpoints this client talks to.
    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    /// Exchanges every credential for a token and checks its scopes.
    pub async fn authenticate(&self, requirements: &ScopeRequirements) -> Result<(), ApiError> {
        let mut pool = self.credentials.lock().await;
        pool.authenticate_all(&self.http, &self.endpoints.token_url, requirements)
            .await
    }

    /// Ordinal of the credential currently used for requests.
    pub async fn active_credential(&self) -> usize {
        self.credentials.lock().await.cursor()
    }

    /// Resolves a request URI to an absolute URL.
    ///
    /// Absolute `http://` and `https://` URIs are returned verbatim; anything
    /// else is joined onto the 2.0 or 1.0 base.
    pub fn resolve(&self, uri: &str, use_legacy_api: bool) -> String {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return uri.to_string();
        }
        format!(
            "{}/{}",
            self.endpoints.base_for(use_legacy_api),
            uri.trim_start_matches('/')
        )
    }

    /// Performs a GET request and returns the raw response body.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the response is 404 and `ignore_not_found` is set,
    /// `Ok(Some(body))` for any 2xx response.
    ///
    /// # Errors
    ///
    /// - [`ApiError::RetriesExceeded`] when the last credential is rate limited
    /// - [`ApiError::Provider`] for any other non-2xx status or a transport failure
    /// - [`ApiError::IllegalState`] before [`authenticate`](Self::authenticate)
    pub async fn get_text(
        &self,
        uri: &str,
        options: RequestOptions,
    ) -> Result<Option<String>, ApiError> {
        let url = self.resolve(uri, options.use_legacy_api);

        // Ordinals strictly increase between iterations, so this ends after at
        // most one attempt per credential.
        loop {
            let (ordinal, token) = {
                let pool = self.credentials.lock().await;
                (pool.cursor(), pool.current_token()?.to_string())
            };

            debug!(url = %url, credential = ordinal, "GET");

            let response = self
                .http
                .get(&url)
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|e| transport_failure(&url, e))?;

            let status = response.status();
            debug!(url = %url, status = status.as_u16(), "Response");

            if status == StatusCode::TOO_MANY_REQUESTS {
                let mut pool = self.credentials.lock().await;
                match pool.advance_past(ordinal) {
                    Ok(_) => continue,
                    Err(ApiError::CredentialsExhausted(count)) => {
                        return Err(ApiError::RetriesExceeded {
                            endpoint: url,
                            message: format!(
                                "Rate limited on all {} credential(s). Please add another set of key/secret credentials.",
                                count
                            ),
                        });
                    }
                    Err(e) => return Err(e),
                }
            }

            if status == StatusCode::NOT_FOUND && options.ignore_not_found {
                debug!(url = %url, "Ignoring 404");
                return Ok(None);
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::Provider {
                    endpoint: url,
                    status: Some(status.as_u16()),
                    status_text: format_status_text(status, &body),
                });
            }

            let body = response
                .text()
                .await
                .map_err(|e| transport_failure(&url, e))?;
            return Ok(Some(body));
        }
    }

    /// Performs a GET request and deserializes the JSON response.
    ///
    /// Same semantics as [`get_text`](Self::get_text).
    ///
    /// # Errors
    ///
    /// Additionally returns [`ApiError::Decode`] if the body does not match `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        uri: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, ApiError> {
        let Some(body) = self.get_text(uri, options).await? else {
            return Ok(None);
        };

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|source| ApiError::Decode {
                endpoint: self.resolve(uri, options.use_legacy_api),
                source,
            })
    }
}

/// Reports a request that produced no usable response.
fn transport_failure(url: &str, error: reqwest::Error) -> ApiError {
    warn!(
        event = "incomplete_data",
        url = %url,
        error = %error,
        "Request failed, data may be incomplete"
    );

    let status = error.status().map(|s| s.as_u16());
    let status_text = if error.is_timeout() {
        format!("Request timed out after {}s", REQUEST_TIMEOUT.as_secs())
    } else {
        format!("Transport failure: {}", error)
    };

    ApiError::Provider {
        endpoint: url.to_string(),
        status,
        status_text,
    }
}
