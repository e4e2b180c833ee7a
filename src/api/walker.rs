//
//  bitbucket-ingest
//  api/walker.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Page walking over paginated endpoints.
//!
//! The 2.0 API links pages with a fully qualified `next` URL. The walker only
//! follows links that stay on the expected versioned base, so a response can
//! never redirect credentials to another host.

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::client::{BitbucketClient, RequestOptions};
use super::common::{Collected, Page, PaginatedResponse};
use super::ApiError;

/// Decodes one page body in the shape the API generation returns.
///
/// The legacy API answers with a bare array, the 2.0 API with a paginated
/// object. Each is decoded strictly as its own shape.
fn decode_page<T: DeserializeOwned>(body: &str, legacy: bool) -> serde_json::Result<Page<T>> {
    if legacy {
        serde_json::from_str::<Vec<T>>(body).map(Page::from_legacy)
    } else {
        serde_json::from_str::<PaginatedResponse<T>>(body).map(Page::from)
    }
}

impl BitbucketClient {
    /// Fetches every page starting at `first_uri`, calling `on_page` for each.
    ///
    /// # Returns
    ///
    /// The number of pages emitted.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Protocol`] if a `next` link leaves the expected base
    /// - [`ApiError::Decode`] if a page has neither envelope shape
    /// - Any error from [`get_text`](Self::get_text)
    pub async fn for_each_page<T, F>(
        &self,
        first_uri: &str,
        options: RequestOptions,
        mut on_page: F,
    ) -> Result<u64, ApiError>
    where
        T: DeserializeOwned,
        F: FnMut(Page<T>),
    {
        let base = self.endpoints().base_for(options.use_legacy_api).to_string();
        let mut uri = first_uri.to_string();
        let mut pages = 0u64;

        loop {
            let Some(body) = self.get_text(&uri, options).await? else {
                break;
            };

            let page: Page<T> =
                decode_page(&body, options.use_legacy_api).map_err(|source| ApiError::Decode {
                    endpoint: self.resolve(&uri, options.use_legacy_api),
                    source,
                })?;
            let next = page.next.clone();

            pages += 1;
            debug!(uri = %uri, page = pages, items = page.values.len(), "Fetched page");
            on_page(page);

            match next {
                None => break,
                Some(next) if next.starts_with(&base) => {
                    uri = next[base.len()..].to_string();
                }
                Some(next) => {
                    return Err(ApiError::Protocol(format!(
                        "Next page link '{}' does not start with '{}'",
                        next, base
                    )));
                }
            }
        }

        info!(uri = %first_uri, pages, "Finished walking pages");
        Ok(pages)
    }

    /// Collects the items of every page starting at `first_uri`.
    pub async fn collect_all_pages<T: DeserializeOwned>(
        &self,
        first_uri: &str,
        options: RequestOptions,
    ) -> Result<Collected<T>, ApiError> {
        let mut items = Vec::new();
        let pages = self
            .for_each_page(first_uri, options, |page: Page<T>| {
                items.extend(page.values)
            })
            .await?;

        Ok(Collected { items, pages })
    }
}
